pub mod continuity;
pub mod contract;
pub mod engine;
pub mod error;
pub mod snapshot;
pub mod tariff;
pub mod tempo;
#[cfg(test)]
mod testing;
pub mod time;
