//! Register-writeback coalescer.
//!
//! Tracks the latest value written to every register slot, continuously and
//! outside the squash-governed state, and re-synthesizes the writeback a
//! skipped commit suppressed. Only defined for single-core configurations;
//! the builder rejects anything else.

use crate::error::CoreError;
use crate::events::{CycleFrame, EventBundle, KindId, Payload};

pub struct WritebackCoalescer {
    latest: Vec<u64>,
}

impl WritebackCoalescer {
    pub fn new(register_slots: usize) -> Self {
        Self {
            latest: vec![0; register_slots],
        }
    }

    #[inline]
    pub fn slots(&self) -> usize {
        self.latest.len()
    }

    /// Record a writeback into the side table. Called for every valid
    /// writeback bundle every cycle, regardless of the flush/merge decision.
    pub fn observe(&mut self, bundle: &EventBundle) -> Result<(), CoreError> {
        if !bundle.valid {
            return Ok(());
        }
        if let Payload::Writeback { address, data } = bundle.payload {
            let slots = self.latest.len();
            let slot = self
                .latest
                .get_mut(address as usize)
                .ok_or(CoreError::RegisterOutOfRange {
                    slot: address,
                    slots,
                })?;
            *slot = data;
        }
        Ok(())
    }

    /// Scan all valid writebacks in an input frame into the table.
    pub fn observe_frame(&mut self, frame: &CycleFrame, writeback: KindId) -> Result<(), CoreError> {
        for core in 0..frame.cores() {
            self.observe(frame.get(writeback, core))?;
        }
        Ok(())
    }

    /// Patch a flushed frame: every commit reporting `skip` gets its
    /// suppressed writeback re-synthesized from the side table and
    /// substituted into the outgoing writeback lane.
    ///
    /// More than one skipped commit in one flush is a fatal invariant
    /// violation, reported with the violating cycle, never merged best-effort.
    pub fn patch_frame(
        &self,
        frame: &mut CycleFrame,
        commit: KindId,
        writeback: KindId,
        cycle: u64,
    ) -> Result<(), CoreError> {
        let mut skipped: Option<(usize, u16)> = None;
        for core in 0..frame.cores() {
            let bundle = frame.get(commit, core);
            if !bundle.valid {
                continue;
            }
            if let Payload::Commit { skip: true, wpdest } = bundle.payload {
                if skipped.is_some() {
                    return Err(CoreError::MultipleSkippedCommits { cycle });
                }
                skipped = Some((core, wpdest));
            }
        }

        if let Some((core, wpdest)) = skipped {
            let data = *self
                .latest
                .get(wpdest as usize)
                .ok_or(CoreError::RegisterOutOfRange {
                    slot: wpdest,
                    slots: self.latest.len(),
                })?;
            frame.set(writeback, core, EventBundle::writeback(core as u32, wpdest, data));
        }
        Ok(())
    }
}
