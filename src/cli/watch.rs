use std::{path::PathBuf, time::Duration};

use bon::Builder;
use clap::Parser;
use tokio::time::{MissedTickBehavior, interval};

use crate::{
    api::Client,
    cli::{cycle::report, engine::EngineArgs},
    core::{contract::ContractConfig, engine::Engine},
    prelude::*,
    state,
};

#[derive(Parser)]
pub struct WatchArgs {
    #[clap(long, env = "POLLING_INTERVAL", default_value = "1min")]
    polling_interval: humantime::Duration,

    #[clap(flatten)]
    engine: EngineArgs,
}

impl WatchArgs {
    pub async fn run(self) -> Result {
        let (config, engine, state_path) = self.engine.into_engine()?;
        Watcher::builder()
            .config(config)
            .engine(engine)
            .state_path(state_path)
            .interval(self.polling_interval)
            .build()
            .run()
            .await
    }
}

#[derive(Builder)]
struct Watcher {
    config: ContractConfig,
    engine: Engine<Client>,
    state_path: PathBuf,

    #[builder(into)]
    interval: Duration,
}

impl Watcher {
    async fn run(mut self) -> Result {
        let mut interval = interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut previous = state::read_from(&self.state_path);

        loop {
            interval.tick().await;
            match self.engine.run_cycle(&self.config, previous.clone()).await {
                Ok(snapshot) => {
                    state::write_to(&self.state_path, &snapshot);
                    report(&snapshot);
                    previous = Some(snapshot);
                }
                Err(error) => {
                    error!("data source unavailable: {:#}", Error::from(error));
                }
            }
        }
    }
}
