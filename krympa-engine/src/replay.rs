//! Deterministic scenario replay.
//!
//! Feeds a scenario through the engine cycle by cycle, folds every emitted
//! bundle into a blake3 hasher, and finishes with a terminal flush so no open
//! accumulation window is lost. The final hex digest identifies the emitted
//! stream; two replays of the same scenario must produce the same digest.
//!
//! `differential_check` is the no-corruption property of squashing: every
//! register value the squashed stream reports (synthesized skip writebacks
//! included) must also be produced by an unsquashed reference run of the same
//! scenario. Squashing may drop intermediate writebacks by policy, but it
//! must never invent one.

use std::collections::{HashMap, HashSet};

use opentelemetry::KeyValue;
use tracing::info;

use krympa_config::EngineConfig;
use krympa_core::events::{CycleFrame, Payload};
use krympa_telemetry::{EventLogger, MetricsRecorder};

use crate::engine::{EngineError, SquashEngine};
use crate::scenario::{frame_for_cycle, standard_registry, Scenario, StandardKinds};

pub struct ReplayOutcome {
    /// Cycles ticked, terminal flush excluded.
    pub cycles: u64,
    /// Frames that carried at least one valid bundle.
    pub emitted_frames: u64,
    /// Hex blake3 digest over the emitted bundle stream.
    pub state_hash: String,
}

fn build_engine(
    config: &EngineConfig,
    metrics: Option<MetricsRecorder>,
) -> Result<(SquashEngine, StandardKinds), EngineError> {
    config.ensure_valid()?;
    let (registry, kinds) = standard_registry()?;
    let mut builder = SquashEngine::builder(registry)
        .cores(config.cores)
        .disable_after(config.disable_after_cycles);
    if config.coalesce_writebacks {
        builder = builder.coalesce_writebacks(kinds.commit, kinds.writeback, config.register_slots);
    }
    if let Some(metrics) = metrics {
        builder = builder.metrics(metrics);
    }
    Ok((builder.build()?, kinds))
}

fn hash_frame(hasher: &mut blake3::Hasher, frame: &CycleFrame) -> bool {
    let mut any = false;
    let mut buf = Vec::with_capacity(16);
    for (kind, core, bundle) in frame.iter() {
        if !bundle.valid {
            continue;
        }
        any = true;
        buf.clear();
        buf.extend_from_slice(&(kind.index() as u32).to_le_bytes());
        buf.extend_from_slice(&(core as u32).to_le_bytes());
        bundle.payload.encode_into(&mut buf);
        hasher.update(&buf);
    }
    any
}

/// Collect the writeback emissions of one frame as (core, slot, value).
fn fold_registers(
    emissions: &mut Vec<(u32, u16, u64)>,
    frame: &CycleFrame,
    kinds: &StandardKinds,
) {
    for core in 0..frame.cores() {
        let bundle = frame.get(kinds.writeback, core);
        if !bundle.valid {
            continue;
        }
        if let Payload::Writeback { address, data } = bundle.payload {
            emissions.push((core as u32, address, data));
        }
    }
}

fn run(
    scenario: &Scenario,
    config: &EngineConfig,
    metrics: Option<MetricsRecorder>,
) -> Result<(ReplayOutcome, Vec<(u32, u16, u64)>), EngineError> {
    let (mut engine, kinds) = build_engine(config, metrics)?;

    let mut hasher = blake3::Hasher::new();
    let mut emissions = Vec::new();
    let mut emitted = 0u64;

    for cycle in &scenario.cycles {
        let input = frame_for_cycle(cycle, &kinds, engine.kinds(), engine.cores())?;
        let output = engine.tick(&input)?;
        if hash_frame(&mut hasher, &output) {
            emitted += 1;
        }
        fold_registers(&mut emissions, &output, &kinds);
    }

    let tail = engine.finish()?;
    if hash_frame(&mut hasher, &tail) {
        emitted += 1;
    }
    fold_registers(&mut emissions, &tail, &kinds);

    let outcome = ReplayOutcome {
        cycles: engine.cycle(),
        emitted_frames: emitted,
        state_hash: hex::encode(hasher.finalize().as_bytes()),
    };
    Ok((outcome, emissions))
}

/// Replay a scenario and return the emitted-stream digest.
pub fn replay_scenario(
    scenario: &Scenario,
    metrics: Option<MetricsRecorder>,
) -> Result<ReplayOutcome, EngineError> {
    let (outcome, _) = run(scenario, &scenario.engine, metrics)?;
    info!(
        cycles = outcome.cycles,
        emitted = outcome.emitted_frames,
        hash = %outcome.state_hash,
        "replay complete"
    );
    EventLogger::log_event(
        "replay_complete",
        vec![
            KeyValue::new("cycles", outcome.cycles as i64),
            KeyValue::new("emitted_frames", outcome.emitted_frames as i64),
            KeyValue::new("state_hash", outcome.state_hash.clone()),
        ],
    );
    Ok(outcome)
}

/// Replay with squashing and against an unsquashed reference, and verify the
/// squashed stream never reports a register value the reference did not.
pub fn differential_check(scenario: &Scenario) -> Result<(), EngineError> {
    let (_, squashed) = run(scenario, &scenario.engine, None)?;

    let reference_config = scenario.engine.clone();
    let (mut reference_engine, kinds) = build_engine(&reference_config, None)?;
    // The reference flushes every cycle: disable squashing before the first
    // tick boundary.
    reference_engine.control_handle().disable();

    let mut reference: HashMap<(u32, u16), HashSet<u64>> = HashMap::new();
    let mut emissions = Vec::new();
    for cycle in &scenario.cycles {
        let input = frame_for_cycle(
            cycle,
            &kinds,
            reference_engine.kinds(),
            reference_engine.cores(),
        )?;
        let output = reference_engine.tick(&input)?;
        fold_registers(&mut emissions, &output, &kinds);
    }
    let tail = reference_engine.finish()?;
    fold_registers(&mut emissions, &tail, &kinds);
    for (core, slot, value) in emissions {
        reference.entry((core, slot)).or_default().insert(value);
    }

    for (core, slot, value) in squashed {
        let known = reference
            .get(&(core, slot))
            .is_some_and(|values| values.contains(&value));
        if !known {
            return Err(EngineError::Divergence { core, slot, value });
        }
    }
    Ok(())
}

/// Compare a replay digest against an expected one.
pub fn validate_hash(outcome: &ReplayOutcome, expected: &str) -> Result<(), EngineError> {
    if outcome.state_hash != expected {
        return Err(EngineError::HashMismatch {
            expected: expected.to_string(),
            actual: outcome.state_hash.clone(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::{ScenarioCycle, ScenarioEvent};

    fn commit(skip: bool, wpdest: u16) -> ScenarioEvent {
        ScenarioEvent::Commit {
            core: 0,
            skip,
            wpdest,
        }
    }

    fn writeback(address: u16, data: u64) -> ScenarioEvent {
        ScenarioEvent::Writeback {
            core: 0,
            address,
            data,
        }
    }

    fn scenario(cycles: Vec<Vec<ScenarioEvent>>) -> Scenario {
        Scenario {
            engine: EngineConfig::default(),
            cycles: cycles
                .into_iter()
                .map(|events| ScenarioCycle { events })
                .collect(),
        }
    }

    #[test]
    fn replay_is_deterministic() {
        let scenario = scenario(vec![
            vec![commit(false, 1), writeback(1, 0x11)],
            vec![],
            vec![commit(false, 2), writeback(2, 0x22)],
            vec![commit(true, 2)],
        ]);
        let first = replay_scenario(&scenario, None).unwrap();
        let second = replay_scenario(&scenario, None).unwrap();
        assert_eq!(first.state_hash, second.state_hash);
        assert_eq!(first.cycles, 4);
    }

    #[test]
    fn squashed_stream_never_invents_register_values() {
        let scenario = scenario(vec![
            vec![commit(false, 5), writeback(5, 0xABCD)],
            vec![],
            vec![commit(true, 5)],
            vec![commit(false, 3), writeback(3, 0x33)],
            vec![],
        ]);
        differential_check(&scenario).unwrap();
    }

    #[test]
    fn disable_budget_increases_emissions_only() {
        let mut merged = scenario(vec![
            vec![commit(false, 1), writeback(1, 0x1)],
            vec![commit(false, 2), writeback(2, 0x2)],
            vec![commit(false, 3), writeback(3, 0x3)],
            vec![commit(false, 4), writeback(4, 0x4)],
        ]);
        let merged_outcome = replay_scenario(&merged, None).unwrap();

        merged.engine.disable_after_cycles = Some(1);
        let flushed_outcome = replay_scenario(&merged, None).unwrap();

        assert!(flushed_outcome.emitted_frames >= merged_outcome.emitted_frames);
        differential_check(&merged).unwrap();
    }

    #[test]
    fn hash_validation_reports_mismatch() {
        let scenario = scenario(vec![vec![commit(false, 1)]]);
        let outcome = replay_scenario(&scenario, None).unwrap();
        assert!(validate_hash(&outcome, &outcome.state_hash).is_ok());
        assert!(matches!(
            validate_hash(&outcome, "deadbeef"),
            Err(EngineError::HashMismatch { .. })
        ));
    }
}
