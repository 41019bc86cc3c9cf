#[macro_use]
mod macros;

pub mod fee;
pub mod rate;
