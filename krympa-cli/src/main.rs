//! ## krympa-cli
//! **Operational interface for the squash harness**
//!
//! Deterministic scenario replay with hash validation, and randomized fuzz
//! runs that cross-check the squashed stream against an unsquashed reference.

use clap::Parser;
use krympa_config::KrympaConfig;
use krympa_telemetry::logging::EventLogger;
use krympa_telemetry::metrics::MetricsRecorder;

mod commands;

use commands::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    let config = KrympaConfig::load()?;
    EventLogger::init_with_level(&config.telemetry.log_level);
    let metrics = config.telemetry.metrics_enabled.then(MetricsRecorder::new);
    let cli = Cli::parse();

    match cli.command {
        Commands::Replay(args) => commands::run_replay_mode(args, metrics),
        Commands::Fuzz(args) => commands::run_fuzz_mode(args, metrics),
    }
}
