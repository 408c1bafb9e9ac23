//! # krympa-core
//!
//! Foundation layer for the trace-event squash engine used in hardware
//! co-simulation differential testing.
//! Built with determinism, safety, and testability as primary design constraints.
//!
//! ### Key Submodules:
//! - `events`: bundle model, per-kind class registry and merge functions
//! - `accum`: per-(kind, core) accumulator lanes with synchronous-register semantics
//! - `control`: enable/disable channel with a cycle budget
//! - `wback`: register-writeback coalescer for skipped commits
//!
//! The crate is pure state-machine code: no I/O, no clocks, no threads. One
//! `tick` of the surrounding engine mutates everything here exactly once per
//! simulated clock cycle.

pub mod accum;
pub mod control;
pub mod error;
pub mod events;
pub mod wback;

pub mod prelude {
    pub use crate::accum::*;
    pub use crate::control::*;
    pub use crate::error::*;
    pub use crate::events::*;
    pub use crate::wback::*;
}

pub use error::CoreError;
