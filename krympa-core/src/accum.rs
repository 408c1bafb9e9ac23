//! Per-(kind, core) accumulator lanes.
//!
//! One persistent `EventBundle` per lane, holding "events merged so far, not
//! yet emitted". Lanes follow synchronous-register semantics: the decision
//! phase of a tick only reads them, the commit phase mutates them exactly
//! once.

use crate::events::{CycleFrame, EventBundle, KindId, MergeFn};

pub struct AccumulatorLanes {
    frame: CycleFrame,
}

impl AccumulatorLanes {
    pub fn new(kinds: usize, cores: usize) -> Self {
        Self {
            frame: CycleFrame::empty(kinds, cores),
        }
    }

    /// Read the in-progress bundle for one lane.
    #[inline]
    pub fn current(&self, kind: KindId, core: usize) -> &EventBundle {
        self.frame.get(kind, core)
    }

    /// Overwrite a lane, discarding whatever was accumulated there. Used for
    /// dependency-forced overwrites; emits nothing by itself.
    pub fn replace(&mut self, kind: KindId, core: usize, bundle: EventBundle) {
        self.frame.set(kind, core, bundle);
    }

    /// Fold a candidate bundle into a lane through the kind's merge function.
    pub fn merge_into(&mut self, merge: MergeFn, kind: KindId, core: usize, bundle: &EventBundle) {
        merge(self.frame.get_mut(kind, core), bundle);
    }

    /// Flush: hand out the accumulated frame and seed every lane with the
    /// incoming one. The flushed frame becomes the engine's output, the seed
    /// starts the next accumulation window.
    pub fn swap_frame(&mut self, seed: CycleFrame) -> CycleFrame {
        std::mem::replace(&mut self.frame, seed)
    }

    #[inline]
    pub fn kinds(&self) -> usize {
        self.frame.kinds()
    }

    #[inline]
    pub fn cores(&self) -> usize {
        self.frame.cores()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{merge_last_write_wins, Payload};

    #[test]
    fn starts_all_invalid() {
        let lanes = AccumulatorLanes::new(2, 1);
        assert!(!lanes.current(KindId::from_index(0), 0).valid);
        assert!(!lanes.current(KindId::from_index(1), 0).valid);
    }

    #[test]
    fn merge_then_swap_emits_merged_state() {
        let kind = KindId::from_index(0);
        let mut lanes = AccumulatorLanes::new(1, 1);
        for value in [5u64, 7, 9] {
            lanes.merge_into(merge_last_write_wins, kind, 0, &EventBundle::scalar(0, value));
        }

        let flushed = lanes.swap_frame(CycleFrame::empty(1, 1));
        assert_eq!(flushed.get(kind, 0).payload, Payload::Scalar(9));
        assert!(!lanes.current(kind, 0).valid);
    }

    #[test]
    fn replace_discards_accumulated_bundle() {
        let kind = KindId::from_index(0);
        let mut lanes = AccumulatorLanes::new(1, 1);
        lanes.merge_into(merge_last_write_wins, kind, 0, &EventBundle::scalar(0, 1));
        lanes.replace(kind, 0, EventBundle::scalar(0, 42));
        assert_eq!(lanes.current(kind, 0).payload, Payload::Scalar(42));
    }
}
