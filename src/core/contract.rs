use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::core::{error::ConfigError, time::OffPeakSchedule};

/// EDF residential pricing option.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractType {
    /// Single flat rate.
    Base,

    /// Peak and off-peak rates («heures pleines / heures creuses»).
    Hphc,

    /// Peak and off-peak rates for each of the blue, white, and red days.
    Tempo,
}

impl ContractType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Hphc => "hphc",
            Self::Tempo => "tempo",
        }
    }

    /// Subscribed power levels offered for the contract, in kVA.
    pub const fn allowed_powers(self) -> &'static [&'static str] {
        match self {
            Self::Base => &["3", "6", "9", "12", "15"],
            Self::Hphc | Self::Tempo => &["6", "9", "12", "15", "18", "30", "36"],
        }
    }

    /// Off-peak hours applied when none are configured.
    pub const fn default_off_peak_hours(self) -> Option<&'static str> {
        match self {
            Self::Tempo => Some("22:00-06:00"),
            Self::Base | Self::Hphc => None,
        }
    }

    /// Whether the contract distinguishes peak and off-peak hours.
    pub const fn has_off_peak(self) -> bool {
        !matches!(self, Self::Base)
    }
}

impl Display for ContractType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContractType {
    type Err = ConfigError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text.trim().to_ascii_lowercase().as_str() {
            "base" => Ok(Self::Base),
            "hphc" => Ok(Self::Hphc),
            "tempo" => Ok(Self::Tempo),
            _ => Err(ConfigError::UnknownContractType(text.to_owned())),
        }
    }
}

/// Validated installation configuration.
#[must_use]
#[derive(Clone, Debug)]
pub struct ContractConfig {
    contract_type: ContractType,
    contract_power: String,
    off_peak_hours: Option<String>,
    refresh_interval_days: u32,
}

impl ContractConfig {
    pub const DEFAULT_REFRESH_INTERVAL_DAYS: u32 = 1;

    pub fn try_new(
        contract_type: ContractType,
        contract_power: &str,
        off_peak_hours: Option<String>,
        refresh_interval_days: u32,
    ) -> Result<Self, ConfigError> {
        let contract_power = contract_power.trim();
        if !contract_type.allowed_powers().contains(&contract_power) {
            return Err(ConfigError::UnsupportedPower {
                contract_type,
                power: contract_power.to_owned(),
            });
        }
        if refresh_interval_days == 0 {
            return Err(ConfigError::RefreshInterval);
        }
        Ok(Self {
            contract_type,
            contract_power: contract_power.to_owned(),
            off_peak_hours: off_peak_hours.filter(|hours| !hours.trim().is_empty()),
            refresh_interval_days,
        })
    }

    pub const fn contract_type(&self) -> ContractType {
        self.contract_type
    }

    pub fn contract_power(&self) -> &str {
        &self.contract_power
    }

    pub const fn refresh_interval_days(&self) -> u32 {
        self.refresh_interval_days
    }

    /// Configured off-peak hours, or the contract's built-in ones.
    pub fn off_peak_schedule(&self) -> OffPeakSchedule {
        self.off_peak_hours
            .as_deref()
            .or_else(|| self.contract_type.default_off_peak_hours())
            .map(OffPeakSchedule::parse)
            .unwrap_or_default()
    }
}

impl Display for ContractConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Option {}, {}kVA",
            self.contract_type.as_str().to_ascii_uppercase(),
            self.contract_power
        )
    }
}
