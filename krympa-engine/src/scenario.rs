//! Scenario model: a recorded (or generated) stream of per-cycle trace
//! events, serialized as YAML, replayable deterministically.

use serde::{Deserialize, Serialize};

use krympa_config::EngineConfig;
use krympa_core::events::{CycleFrame, EventBundle, EventClass, EventRegistry, KindId};

use crate::engine::EngineError;

/// Kind ids of the standard event-class set every scenario replay uses.
#[derive(Clone, Copy, Debug)]
pub struct StandardKinds {
    pub commit: KindId,
    pub writeback: KindId,
    pub scalar: KindId,
}

/// The standard registry: commit, commit-gated register-writeback, and a
/// dependency-free scalar probe kind.
pub fn standard_registry() -> Result<(EventRegistry, StandardKinds), EngineError> {
    let mut registry = EventRegistry::new();
    let commit = registry.register(EventClass::commit())?;
    let writeback = registry.register(EventClass::writeback(commit))?;
    let scalar = registry.register(EventClass::new("scalar"))?;
    Ok((
        registry,
        StandardKinds {
            commit,
            writeback,
            scalar,
        },
    ))
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub engine: EngineConfig,
    pub cycles: Vec<ScenarioCycle>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ScenarioCycle {
    #[serde(default)]
    pub events: Vec<ScenarioEvent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScenarioEvent {
    Commit {
        #[serde(default)]
        core: u32,
        #[serde(default)]
        skip: bool,
        #[serde(default)]
        wpdest: u16,
    },
    Writeback {
        #[serde(default)]
        core: u32,
        address: u16,
        data: u64,
    },
    Scalar {
        #[serde(default)]
        core: u32,
        value: u64,
    },
}

impl ScenarioEvent {
    fn core(&self) -> u32 {
        match *self {
            ScenarioEvent::Commit { core, .. }
            | ScenarioEvent::Writeback { core, .. }
            | ScenarioEvent::Scalar { core, .. } => core,
        }
    }
}

/// Turn one scenario cycle into the engine's input frame.
pub fn frame_for_cycle(
    cycle: &ScenarioCycle,
    kinds: &StandardKinds,
    kind_count: usize,
    cores: usize,
) -> Result<CycleFrame, EngineError> {
    let mut frame = CycleFrame::empty(kind_count, cores);
    for event in &cycle.events {
        let core = event.core() as usize;
        if core >= cores {
            return Err(EngineError::Validation(format!(
                "scenario event targets core {core}, only {cores} configured"
            )));
        }
        let (kind, bundle) = match *event {
            ScenarioEvent::Commit { core, skip, wpdest } => {
                (kinds.commit, EventBundle::commit(core, skip, wpdest))
            }
            ScenarioEvent::Writeback {
                core,
                address,
                data,
            } => (kinds.writeback, EventBundle::writeback(core, address, data)),
            ScenarioEvent::Scalar { core, value } => {
                (kinds.scalar, EventBundle::scalar(core, value))
            }
        };
        frame.set(kind, core, bundle);
    }
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO_YAML: &str = r#"
engine:
  cores: 1
  disable_after_cycles: 10
cycles:
  - events:
      - kind: commit
        wpdest: 5
      - kind: writeback
        address: 5
        data: 43981
  - events: []
  - events:
      - kind: scalar
        value: 9
"#;

    #[test]
    fn yaml_round_trips() {
        let scenario: Scenario = serde_yaml::from_str(SCENARIO_YAML).unwrap();
        assert_eq!(scenario.cycles.len(), 3);
        assert_eq!(scenario.engine.disable_after_cycles, Some(10));

        let text = serde_yaml::to_string(&scenario).unwrap();
        let again: Scenario = serde_yaml::from_str(&text).unwrap();
        assert_eq!(again.cycles.len(), 3);
    }

    #[test]
    fn frames_carry_scenario_events() {
        let scenario: Scenario = serde_yaml::from_str(SCENARIO_YAML).unwrap();
        let (registry, kinds) = standard_registry().unwrap();
        let frame = frame_for_cycle(&scenario.cycles[0], &kinds, registry.len(), 1).unwrap();
        assert!(frame.get(kinds.commit, 0).valid);
        assert!(frame.get(kinds.writeback, 0).valid);
        assert!(!frame.get(kinds.scalar, 0).valid);
    }

    #[test]
    fn out_of_range_core_is_rejected() {
        let cycle = ScenarioCycle {
            events: vec![ScenarioEvent::Scalar { core: 2, value: 1 }],
        };
        let (registry, kinds) = standard_registry().unwrap();
        assert!(matches!(
            frame_for_cycle(&cycle, &kinds, registry.len(), 1),
            Err(EngineError::Validation(_))
        ));
    }
}
