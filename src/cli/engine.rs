use std::path::PathBuf;

use chrono::NaiveTime;
use clap::Parser;
use reqwest::Url;

use crate::{
    api::Client,
    core::{
        contract::{ContractConfig, ContractType},
        engine::{Endpoints, Engine},
        tempo::TempoSchedule,
        time::parse_time,
    },
    prelude::*,
};

#[derive(Parser)]
pub struct ContractArgs {
    #[clap(long, env = "CONTRACT_TYPE")]
    contract_type: ContractType,

    /// Subscribed power in kVA.
    #[clap(long, env = "CONTRACT_POWER")]
    contract_power: String,

    /// Comma-separated off-peak ranges. For example: `01:30-07:30,12:30-14:00`.
    ///
    /// Tempo contracts default to `22:00-06:00`.
    #[clap(long, env = "OFF_PEAK_HOURS_RANGES")]
    off_peak_hours: Option<String>,

    /// Re-read the tariff table when the rates get older than this.
    #[clap(
        long,
        env = "REFRESH_INTERVAL_DAYS",
        default_value_t = ContractConfig::DEFAULT_REFRESH_INTERVAL_DAYS,
    )]
    refresh_interval_days: u32,
}

impl ContractArgs {
    pub fn to_config(&self) -> Result<ContractConfig> {
        let config = ContractConfig::try_new(
            self.contract_type,
            &self.contract_power,
            self.off_peak_hours.clone(),
            self.refresh_interval_days,
        )?;
        if config.contract_type().has_off_peak() {
            let schedule = config.off_peak_schedule();
            if schedule.is_empty() {
                warn!("no valid off-peak hours, the peak rate applies all day long");
            } else {
                info!(%config, off_peak_hours = %schedule, "configured");
            }
        }
        Ok(config)
    }
}

#[derive(Parser)]
pub struct EndpointArgs {
    #[clap(long, env = "BASE_TABLE_URL", default_value = Endpoints::DEFAULT_BASE_TABLE)]
    base_table_url: Url,

    #[clap(long, env = "HPHC_TABLE_URL", default_value = Endpoints::DEFAULT_HPHC_TABLE)]
    hphc_table_url: Url,

    #[clap(long, env = "TEMPO_TABLE_URL", default_value = Endpoints::DEFAULT_TEMPO_TABLE)]
    tempo_table_url: Url,

    /// Tempo calendar API, the ISO date gets appended to the path.
    #[clap(long, env = "TEMPO_COLORS_URL", default_value = Endpoints::DEFAULT_TEMPO_COLORS)]
    tempo_colors_url: Url,
}

impl From<EndpointArgs> for Endpoints {
    fn from(args: EndpointArgs) -> Self {
        Self {
            base_table: args.base_table_url,
            hphc_table: args.hphc_table_url,
            tempo_table: args.tempo_table_url,
            tempo_colors: args.tempo_colors_url,
        }
    }
}

#[derive(Copy, Clone, Parser)]
pub struct TempoScheduleArgs {
    /// The previous day's color applies before this time.
    #[clap(long, env = "TEMPO_DAY_STARTS_AT", default_value = "06:00", value_parser = parse_time)]
    tempo_day_starts_at: NaiveTime,

    /// Tomorrow's color gets published by this time.
    #[clap(
        long,
        env = "TEMPO_TOMORROW_AVAILABLE_AT",
        default_value = "11:00",
        value_parser = parse_time
    )]
    tempo_tomorrow_available_at: NaiveTime,
}

impl From<TempoScheduleArgs> for TempoSchedule {
    fn from(args: TempoScheduleArgs) -> Self {
        Self {
            day_starts_at: args.tempo_day_starts_at,
            tomorrow_available_at: args.tempo_tomorrow_available_at,
        }
    }
}

#[derive(Parser)]
pub struct EngineArgs {
    #[clap(flatten)]
    pub contract: ContractArgs,

    #[clap(flatten)]
    pub endpoints: EndpointArgs,

    #[clap(flatten)]
    pub tempo_schedule: TempoScheduleArgs,

    /// Where to keep the snapshot between the runs.
    #[clap(long, env = "STATE_PATH", default_value = "tarif-edf.json")]
    pub state_path: PathBuf,
}

impl EngineArgs {
    pub fn into_engine(self) -> Result<(ContractConfig, Engine<Client>, PathBuf)> {
        let config = self.contract.to_config()?;
        let engine =
            Engine::new(Client::try_new()?, self.endpoints.into(), self.tempo_schedule.into());
        Ok((config, engine, self.state_path))
    }
}
