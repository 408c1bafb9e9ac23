use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use krympa_config::EngineConfig;
use krympa_engine::{
    differential_check, replay_scenario, validate_hash, Scenario, ScenarioCycle, ScenarioEvent,
};
use krympa_telemetry::metrics::MetricsRecorder;

#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Replay a recorded scenario through the squash engine
    Replay(ReplayArgs),
    /// Run continuous fuzz testing with generated scenarios
    Fuzz(FuzzArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ReplayArgs {
    /// Scenario file (YAML) to replay
    #[arg(short, long)]
    pub scenario: PathBuf,
    /// Expected emitted-stream hash; replay fails if the digest differs
    #[arg(long)]
    pub validate_hash: Option<String>,
    /// Also replay without squashing and cross-check the emitted registers
    #[arg(long, default_value_t = false)]
    pub differential: bool,
    /// Print the prometheus text exposition after the replay
    #[arg(long, default_value_t = false)]
    pub dump_metrics: bool,
}

#[derive(Args, Debug, Clone)]
pub struct FuzzArgs {
    /// Initial seed for fuzzing (will auto-increment)
    #[arg(long, default_value_t = 1)]
    pub seed: u64,
    /// Number of fuzzing iterations (0 for unlimited)
    #[arg(long, default_value_t = 0)]
    pub iterations: usize,
    /// Maximum cycles per generated scenario
    #[arg(long, default_value_t = 1000)]
    pub max_cycles: usize,
}

pub fn run_replay_mode(args: ReplayArgs, metrics: Option<MetricsRecorder>) -> anyhow::Result<()> {
    let text = fs::read_to_string(&args.scenario)
        .with_context(|| format!("reading scenario {}", args.scenario.display()))?;
    let scenario: Scenario = serde_yaml::from_str(&text)?;

    let outcome = replay_scenario(&scenario, metrics.clone())?;
    println!("cycles:  {}", outcome.cycles);
    println!("emitted: {}", outcome.emitted_frames);
    println!("hash:    {}", outcome.state_hash);

    if let Some(expected) = args.validate_hash.as_deref() {
        validate_hash(&outcome, expected)?;
        println!("hash validated");
    }
    if args.differential {
        differential_check(&scenario)?;
        println!("differential check passed");
    }
    if args.dump_metrics {
        if let Some(metrics) = &metrics {
            print!("{}", metrics.gather_metrics()?);
        }
    }
    Ok(())
}

pub fn run_fuzz_mode(args: FuzzArgs, metrics: Option<MetricsRecorder>) -> anyhow::Result<()> {
    let mut seed = args.seed;
    let mut count = 0usize;
    loop {
        let scenario = generate_scenario(seed, args.max_cycles);

        let first = replay_scenario(&scenario, metrics.clone())?;
        let second = replay_scenario(&scenario, None)?;
        anyhow::ensure!(
            first.state_hash == second.state_hash,
            "seed {seed}: replay is not deterministic ({} vs {})",
            first.state_hash,
            second.state_hash
        );
        differential_check(&scenario)
            .with_context(|| format!("seed {seed}: differential check failed"))?;

        info!(seed, cycles = first.cycles, hash = %first.state_hash, "fuzz iteration ok");

        count += 1;
        if args.iterations > 0 && count >= args.iterations {
            break;
        }
        seed += 1;
    }
    Ok(())
}

/// Generate a random single-core scenario: commits (some skipped), writebacks
/// into a small register window, and scalar probe events, with quiet cycles
/// interleaved so squash windows actually open.
fn generate_scenario(seed: u64, max_cycles: usize) -> Scenario {
    const REGISTER_WINDOW: u16 = 32;

    let mut rng = StdRng::seed_from_u64(seed);
    let cycle_count = rng.random_range(1..=max_cycles.max(1));
    let mut cycles = Vec::with_capacity(cycle_count);

    for _ in 0..cycle_count {
        let mut events = Vec::new();
        if rng.random_bool(0.4) {
            let skip = rng.random_bool(0.2);
            let wpdest = rng.random_range(0..REGISTER_WINDOW);
            events.push(ScenarioEvent::Commit {
                core: 0,
                skip,
                wpdest,
            });
            if !skip {
                events.push(ScenarioEvent::Writeback {
                    core: 0,
                    address: wpdest,
                    data: rng.random::<u64>(),
                });
            }
        }
        if rng.random_bool(0.3) {
            events.push(ScenarioEvent::Scalar {
                core: 0,
                value: rng.random::<u64>(),
            });
        }
        cycles.push(ScenarioCycle { events });
    }

    Scenario {
        engine: EngineConfig::default(),
        cycles,
    }
}
