use clap::Parser;

use crate::{
    cli::engine::EngineArgs,
    core::snapshot::EngineResult,
    prelude::*,
    state,
    tables::build_snapshot_table,
};

#[derive(Parser)]
pub struct CycleArgs {
    #[clap(flatten)]
    engine: EngineArgs,
}

impl CycleArgs {
    pub async fn run(self) -> Result {
        let (config, mut engine, state_path) = self.engine.into_engine()?;
        let previous = state::read_from(&state_path);
        let snapshot =
            engine.run_cycle(&config, previous).await.context("data source unavailable")?;
        state::write_to(&state_path, &snapshot);
        report(&snapshot);
        println!("{}", build_snapshot_table(&snapshot)?);
        Ok(())
    }
}

pub fn report(snapshot: &EngineResult) {
    if let Some(rates) = &snapshot.rates {
        info!(
            subscription = %rates.subscription(),
            current_rate = ?snapshot.current_rate,
            snapshot.is_off_peak,
            "gotcha",
        );
    } else {
        warn!("no tariff has been resolved yet");
    }
}
