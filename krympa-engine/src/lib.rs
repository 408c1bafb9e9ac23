//! # krympa-engine
//!
//! The trace-event squash engine for hardware co-simulation differential
//! testing, plus the deterministic scenario replay that drives it.
//!
//! The engine reduces how many per-clock-cycle trace events cross the
//! simulation-to-checker boundary by merging consecutive cycles' bundles
//! whenever every registered event kind agrees the merge is lossless. The
//! decision is all-or-nothing per cycle; anything that cannot merge flushes,
//! which is expected steady-state behavior and never an error.
//!
//! ## Key Components:
//! - `engine`: builder, per-cycle tick driver, squash decision logic
//! - `scenario`: YAML scenario model and the standard event-class set
//! - `replay`: deterministic replay with blake3 state hashing and a
//!   differential self-check against an unsquashed reference engine

pub mod engine;
pub mod replay;
pub mod scenario;

pub use engine::{EngineBuilder, EngineError, SquashEngine};
pub use replay::{differential_check, replay_scenario, validate_hash, ReplayOutcome};
pub use scenario::{standard_registry, Scenario, ScenarioCycle, ScenarioEvent, StandardKinds};
