use thiserror::Error;

use crate::core::contract::ContractType;

/// Malformed value in a tariff row, a schedule, or a timestamp.
///
/// Always local to the value: callers skip the row or the entry and carry on.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid time `{0}`, expected `HH:MM`")]
    Time(String),

    #[error("invalid date `{0}`, expected `DD/MM/YYYY`")]
    Date(String),

    #[error("invalid decimal number `{0}`")]
    Number(String),

    #[error("invalid time range `{0}`, expected `HH:MM-HH:MM`")]
    TimeRange(String),
}

/// Invalid installation configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown contract type `{0}`")]
    UnknownContractType(String),

    #[error("power `{power}` kVA is not available for the `{contract_type}` contract")]
    UnsupportedPower { contract_type: ContractType, power: String },

    #[error("the refresh interval must be at least one day")]
    RefreshInterval,
}
