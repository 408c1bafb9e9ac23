//! Squash enable/disable channel.
//!
//! Two states, ENABLED and DISABLED, starting ENABLED. Disabling is terminal:
//! an external request (via `ControlHandle`) or an exhausted cycle budget
//! turns squashing off for the rest of the run, forcing a flush every cycle.
//! External requests are latched through an atomic and only take effect at
//! the next tick boundary, never mid-tick.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::debug;

/// Cloneable handle the simulation driver uses to disable squashing from
/// outside the tick path.
#[derive(Clone)]
pub struct ControlHandle {
    requested: Arc<AtomicBool>,
}

impl ControlHandle {
    /// Request DISABLED; applied at the next tick boundary.
    pub fn disable(&self) {
        self.requested.store(true, Ordering::Release);
    }
}

pub struct ControlChannel {
    enabled: bool,
    /// Disable once the cycle counter reaches this value. Zero means unset.
    disable_after: Option<u64>,
    requested: Arc<AtomicBool>,
}

impl ControlChannel {
    pub fn new(disable_after: Option<u64>) -> Self {
        Self {
            enabled: true,
            disable_after: disable_after.filter(|&n| n > 0),
            requested: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn handle(&self) -> ControlHandle {
        ControlHandle {
            requested: Arc::clone(&self.requested),
        }
    }

    /// Apply pending transitions at a tick boundary and report the state the
    /// current cycle runs under.
    pub fn poll(&mut self, cycle: u64) -> bool {
        if self.enabled {
            let budget_spent = self.disable_after.is_some_and(|n| cycle >= n);
            if budget_spent || self.requested.load(Ordering::Acquire) {
                debug!(cycle, budget_spent, "squash channel disabled");
                self.enabled = false;
            }
        }
        self.enabled
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}
