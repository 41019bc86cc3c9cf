//! Refresh cycle tying the tariff tables, the Tempo calendar, and the clock together.

use chrono::{DateTime, Local, TimeDelta};
use reqwest::Url;
use thiserror::Error;

use crate::{
    api::{Fetch, TransportError},
    core::{
        contract::{ContractConfig, ContractType},
        continuity::{TempoForecast, resolve_today},
        snapshot::{EngineResult, TempoSnapshot},
        tariff::{self, Rates},
        tempo::{TempoCache, TempoColor, TempoSchedule},
    },
    prelude::*,
    quantity::rate::KilowattHourRate,
};

/// Failure of a whole cycle: the caller should keep its previous snapshot.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("failed to fetch the tariff table")]
    Transport(#[from] TransportError),

    #[error("failed to read the tariff table")]
    Table(#[from] csv::Error),
}

/// Where to fetch the tariff tables and the Tempo calendar.
#[derive(Clone, Debug)]
pub struct Endpoints {
    pub base_table: Url,
    pub hphc_table: Url,
    pub tempo_table: Url,
    pub tempo_colors: Url,
}

impl Endpoints {
    pub const DEFAULT_BASE_TABLE: &str =
        "https://www.data.gouv.fr/fr/datasets/r/c13d05e5-9e55-4d03-bf7e-042a2ade7e49";
    pub const DEFAULT_HPHC_TABLE: &str =
        "https://www.data.gouv.fr/fr/datasets/r/f7303b3a-93c7-4242-813d-84919034c416";
    pub const DEFAULT_TEMPO_TABLE: &str =
        "https://www.data.gouv.fr/fr/datasets/r/0c3d1d36-c412-4620-8566-e5cbb4fa2b5a";
    pub const DEFAULT_TEMPO_COLORS: &str = "https://www.api-couleur-tempo.fr/api/jourTempo";

    pub const fn table(&self, contract_type: ContractType) -> &Url {
        match contract_type {
            ContractType::Base => &self.base_table,
            ContractType::Hphc => &self.hphc_table,
            ContractType::Tempo => &self.tempo_table,
        }
    }
}

/// Tariff engine of a single installation.
///
/// Owns the Tempo calendar cache, while the snapshot is threaded through the cycles.
pub struct Engine<F> {
    fetcher: F,
    endpoints: Endpoints,
    tempo_schedule: TempoSchedule,
    tempo_cache: TempoCache,
}

impl<F: Fetch> Engine<F> {
    pub fn new(fetcher: F, endpoints: Endpoints, tempo_schedule: TempoSchedule) -> Self {
        Self { fetcher, endpoints, tempo_schedule, tempo_cache: TempoCache::default() }
    }

    pub async fn run_cycle(
        &mut self,
        config: &ContractConfig,
        previous: Option<EngineResult>,
    ) -> Result<EngineResult, CycleError> {
        self.run_cycle_at(config, previous, Local::now()).await
    }

    #[instrument(skip_all, fields(contract = %config, now = %now))]
    pub async fn run_cycle_at(
        &mut self,
        config: &ContractConfig,
        previous: Option<EngineResult>,
        now: DateTime<Local>,
    ) -> Result<EngineResult, CycleError> {
        let mut result = match previous {
            Some(previous) if previous.is_for(config) => previous,
            Some(_) => {
                warn!("discarding the snapshot of another contract");
                EngineResult::new(config)
            }
            None => EngineResult::new(config),
        };

        self.refresh_rates(config, &mut result, now).await?;

        if config.contract_type() == ContractType::Tempo {
            match self.resolve_tempo(&result, now).await {
                Ok(tempo) => {
                    result.tempo = Some(tempo);
                }
                Err(error) => {
                    error!("failed to resolve the Tempo colors: {error:#}");
                    result.tempo.get_or_insert_with(TempoSnapshot::default);
                }
            }
        }

        let (current_rate, is_off_peak) = Self::current_rate(config, &result, now);
        result.current_rate = current_rate;
        result.is_off_peak = is_off_peak;
        info!(current_rate = ?result.current_rate, result.is_off_peak, "cycle completed");
        Ok(result)
    }

    /// Re-resolve the tariff table when the rates are older than the refresh interval.
    ///
    /// Stale rates are kept when the table has no row in effect.
    async fn refresh_rates(
        &self,
        config: &ContractConfig,
        result: &mut EngineResult,
        now: DateTime<Local>,
    ) -> Result<(), CycleError> {
        let refresh_interval = TimeDelta::days(i64::from(config.refresh_interval_days()));
        // An interval reaching beyond the calendar never expires:
        let stale_before = now.checked_sub_signed(refresh_interval);
        let needs_refresh = match (result.last_refresh_at, stale_before) {
            (None, _) => true,
            (Some(refreshed_at), Some(stale_before)) => refreshed_at < stale_before,
            (Some(_), None) => false,
        };
        debug!(needs_refresh, last_refresh_at = ?result.last_refresh_at);
        if !needs_refresh {
            return Ok(());
        }

        let url = self.endpoints.table(config.contract_type());
        let table = self.fetcher.fetch_bytes(url.as_str()).await?;
        let today = now.date_naive();
        match tariff::resolve(&table, config.contract_type(), config.contract_power(), today)? {
            Some(rates) => {
                info!(?rates, "refreshed the rates");
                result.rates = Some(rates);
                result.last_refresh_at = Some(now);
            }
            None => {
                warn!(
                    power = config.contract_power(),
                    "no tariff in effect for the subscribed power",
                );
            }
        }
        Ok(())
    }

    /// Resolve yesterday's, today's, and tomorrow's colors, and the current color's rates.
    async fn resolve_tempo(
        &mut self,
        result: &EngineResult,
        now: DateTime<Local>,
    ) -> Result<TempoSnapshot> {
        let today = now.date_naive();
        let yesterday = today.pred_opt().context("no day before today")?;
        let tomorrow = today.succ_opt().context("no day after today")?;
        let time = now.time();

        let mut colors = [TempoColor::Unknown; 3];
        let (url, schedule) = (&self.endpoints.tempo_colors, &self.tempo_schedule);
        for (color, on) in colors.iter_mut().zip([yesterday, today, tomorrow]) {
            *color = self.tempo_cache.get_day(&self.fetcher, url, on, time, schedule).await.color;
        }
        let [yesterday_color, fetched_today_color, tomorrow_color] = colors;

        let previous = result.tempo.unwrap_or_default();
        let today_color = resolve_today(today, fetched_today_color, previous.forecast);
        let forecast = TempoForecast::observe(tomorrow, tomorrow_color).or(previous.forecast);

        let current = if time >= self.tempo_schedule.day_starts_at {
            today_color
        } else {
            yesterday_color
        };
        let current_rates = match &result.rates {
            Some(Rates::Tempo(rates)) => rates.for_color(current),
            _ => None,
        };
        debug!(%yesterday_color, %today_color, %tomorrow_color, %current, ?current_rates);

        Ok(TempoSnapshot {
            current,
            yesterday: yesterday_color,
            today: today_color,
            tomorrow: tomorrow_color,
            peak: current_rates.map(|rates| rates.peak).or(previous.peak),
            off_peak: current_rates.map(|rates| rates.off_peak).or(previous.off_peak),
            forecast,
        })
    }

    /// Rate applicable at the moment, and whether it is an off-peak one.
    fn current_rate(
        config: &ContractConfig,
        result: &EngineResult,
        now: DateTime<Local>,
    ) -> (Option<KilowattHourRate>, bool) {
        let (peak, off_peak) = match (&result.rates, &result.tempo) {
            (Some(Rates::Base(rates)), _) => return (Some(rates.variable), false),
            (Some(Rates::Hphc(rates)), _) => (Some(rates.peak), Some(rates.off_peak)),
            (_, Some(tempo)) if config.contract_type() == ContractType::Tempo => {
                (tempo.peak, tempo.off_peak)
            }
            _ => (None, None),
        };
        if !config.contract_type().has_off_peak() {
            return (peak, false);
        }
        match config.off_peak_schedule().find(now.time()) {
            Some(range) => {
                debug!(%range, "off-peak hours");
                (off_peak, true)
            }
            None => (peak, false),
        }
    }
}
