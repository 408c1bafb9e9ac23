//! Trace-event model: bundles, cycle frames, and the event-class registry.

pub mod bundle;
pub mod registry;

pub use bundle::{CycleFrame, EventBundle, Payload};
pub use registry::{merge_last_write_wins, EventClass, EventRegistry, KindId, MergeFn};
