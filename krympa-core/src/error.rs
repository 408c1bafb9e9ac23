use thiserror::Error;

/// Errors raised by the core state machine.
///
/// Everything here is a logic or configuration bug in the caller: the engine
/// is a pure per-tick function of state and input, so nothing is transient
/// and nothing is retried.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("duplicate event class name: {0}")]
    DuplicateClass(String),

    #[error("frame shape mismatch: expected {expected_kinds}x{expected_cores}, got {kinds}x{cores}")]
    FrameShape {
        expected_kinds: usize,
        expected_cores: usize,
        kinds: usize,
        cores: usize,
    },

    #[error("bundle for unique-core class '{class}' carries core {found}, lane is {lane}")]
    CoreIdMismatch {
        class: String,
        found: u32,
        lane: u32,
    },

    #[error("register slot {slot} out of range (table holds {slots} slots)")]
    RegisterOutOfRange { slot: u16, slots: usize },

    #[error("multiple skipped commits in one flush at cycle {cycle}")]
    MultipleSkippedCommits { cycle: u64 },
}
