use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    core::{
        contract::{ContractConfig, ContractType},
        continuity::TempoForecast,
        tariff::Rates,
        tempo::TempoColor,
    },
    prelude::*,
    quantity::rate::KilowattHourRate,
};

/// Result of a refresh cycle, also carried over into the next cycle.
///
/// Serializes into a flat key-value mapping.
#[must_use]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineResult {
    pub contract_type: ContractType,

    /// Subscribed power in kVA.
    pub contract_power: String,

    /// Last time the tariff table was successfully resolved.
    pub last_refresh_at: Option<DateTime<Local>>,

    #[serde(flatten)]
    pub rates: Option<Rates>,

    #[serde(flatten)]
    pub tempo: Option<TempoSnapshot>,

    /// Rate applicable right now.
    #[serde(rename = "tarif_actuel_ttc")]
    pub current_rate: Option<KilowattHourRate>,

    pub is_off_peak: bool,
}

impl EngineResult {
    pub fn new(config: &ContractConfig) -> Self {
        Self {
            contract_type: config.contract_type(),
            contract_power: config.contract_power().to_owned(),
            last_refresh_at: None,
            rates: None,
            tempo: None,
            current_rate: None,
            is_off_peak: false,
        }
    }

    /// Whether the snapshot was produced for the same contract.
    pub fn is_for(&self, config: &ContractConfig) -> bool {
        self.contract_type == config.contract_type()
            && self.contract_power == config.contract_power()
            && self.rates.as_ref().is_none_or(|rates| rates.contract_type() == self.contract_type)
    }

    pub fn forecast(&self) -> Option<TempoForecast> {
        self.tempo.as_ref().and_then(|tempo| tempo.forecast)
    }

    pub fn to_flat_map(&self) -> Result<Map<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => bail!("unexpected snapshot representation: `{other}`"),
        }
    }
}

/// Tempo day colors and the rates of the current color.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TempoSnapshot {
    /// Color in effect right now.
    #[serde(rename = "tempo_couleur")]
    pub current: TempoColor,

    #[serde(rename = "tempo_couleur_hier")]
    pub yesterday: TempoColor,

    #[serde(rename = "tempo_couleur_aujourdhui")]
    pub today: TempoColor,

    #[serde(rename = "tempo_couleur_demain")]
    pub tomorrow: TempoColor,

    /// Peak rate of the current color.
    #[serde(rename = "tempo_variable_hp_ttc")]
    pub peak: Option<KilowattHourRate>,

    /// Off-peak rate of the current color.
    #[serde(rename = "tempo_variable_hc_ttc")]
    pub off_peak: Option<KilowattHourRate>,

    /// Tomorrow's color seen by the latest cycle, used when the calendar does not know today's.
    #[serde(flatten)]
    pub forecast: Option<TempoForecast>,
}
