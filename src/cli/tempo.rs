use chrono::{Local, NaiveDate};
use clap::Parser;

use crate::{
    api::Client,
    cli::engine::{EndpointArgs, TempoScheduleArgs},
    core::{
        engine::Endpoints,
        tempo::{TempoCache, TempoSchedule},
    },
    prelude::*,
    tables::build_tempo_days_table,
};

#[derive(Parser)]
pub struct TempoArgs {
    /// Show the specific day instead of yesterday, today, and tomorrow.
    #[clap(long)]
    date: Option<NaiveDate>,

    #[clap(flatten)]
    endpoints: EndpointArgs,

    #[clap(flatten)]
    tempo_schedule: TempoScheduleArgs,
}

impl TempoArgs {
    pub async fn run(self) -> Result {
        let now = Local::now();
        let dates = match self.date {
            Some(date) => vec![date],
            None => {
                let today = now.date_naive();
                vec![
                    today.pred_opt().context("no day before today")?,
                    today,
                    today.succ_opt().context("no day after today")?,
                ]
            }
        };

        let client = Client::try_new()?;
        let endpoints = Endpoints::from(self.endpoints);
        let schedule = TempoSchedule::from(self.tempo_schedule);
        let mut cache = TempoCache::default();
        let mut days = Vec::with_capacity(dates.len());
        for date in dates {
            let day =
                cache.get_day(&client, &endpoints.tempo_colors, date, now.time(), &schedule).await;
            days.push(day);
        }
        println!("{}", build_tempo_days_table(&days));
        Ok(())
    }
}
