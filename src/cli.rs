mod cycle;
mod engine;
mod tempo;
mod watch;

use clap::{Parser, Subcommand};

pub use self::{cycle::CycleArgs, tempo::TempoArgs, watch::WatchArgs};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
#[must_use]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run a single refresh cycle from the stored state, and print the snapshot.
    #[clap(name = "cycle")]
    Cycle(Box<CycleArgs>),

    /// Run the refresh cycles periodically.
    #[clap(name = "watch")]
    Watch(Box<WatchArgs>),

    /// Show the Tempo calendar colors.
    #[clap(name = "tempo")]
    Tempo(Box<TempoArgs>),
}
