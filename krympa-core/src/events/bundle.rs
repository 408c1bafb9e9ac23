//! Event bundle types and the per-cycle frame container.

use bytes::Bytes;

use crate::error::CoreError;
use crate::events::registry::KindId;

/// Type-specific payload of a trace event.
///
/// The set of variants is closed and known at setup time; dispatch over it is
/// a plain `match`, never dynamic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Payload {
    /// Instruction retirement. `skip` marks a commit whose own writeback was
    /// suppressed by the design; `wpdest` names the destination register slot.
    Commit { skip: bool, wpdest: u16 },

    /// A value written to a named register slot.
    Writeback { address: u16, data: u64 },

    /// Harness-defined scalar payload (counters, probes, ...).
    Scalar(u64),

    /// Opaque payload carried through unchanged.
    Blob(Bytes),
}

impl Payload {
    /// Stable byte encoding used for replay state hashing.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        match self {
            Payload::Commit { skip, wpdest } => {
                out.push(0);
                out.push(u8::from(*skip));
                out.extend_from_slice(&wpdest.to_le_bytes());
            }
            Payload::Writeback { address, data } => {
                out.push(1);
                out.extend_from_slice(&address.to_le_bytes());
                out.extend_from_slice(&data.to_le_bytes());
            }
            Payload::Scalar(value) => {
                out.push(2);
                out.extend_from_slice(&value.to_le_bytes());
            }
            Payload::Blob(bytes) => {
                out.push(3);
                out.extend_from_slice(bytes);
            }
        }
    }
}

/// One trace event instance: one per event kind, per core, per cycle.
///
/// An invalid bundle is a placeholder that carries no checker-visible
/// information; merging it into an accumulator is always a no-op.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventBundle {
    pub valid: bool,
    pub core: u32,
    pub payload: Payload,
}

impl EventBundle {
    /// Placeholder bundle for a lane with nothing to report this cycle.
    pub fn invalid(core: u32) -> Self {
        Self {
            valid: false,
            core,
            payload: Payload::Scalar(0),
        }
    }

    pub fn commit(core: u32, skip: bool, wpdest: u16) -> Self {
        Self {
            valid: true,
            core,
            payload: Payload::Commit { skip, wpdest },
        }
    }

    pub fn writeback(core: u32, address: u16, data: u64) -> Self {
        Self {
            valid: true,
            core,
            payload: Payload::Writeback { address, data },
        }
    }

    pub fn scalar(core: u32, value: u64) -> Self {
        Self {
            valid: true,
            core,
            payload: Payload::Scalar(value),
        }
    }
}

/// One `EventBundle` per registered kind per core: the per-cycle I/O unit of
/// the engine, and the storage layout of the accumulator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CycleFrame {
    kinds: usize,
    cores: usize,
    bundles: Vec<EventBundle>,
}

impl CycleFrame {
    /// All-invalid frame; emitted on cycles where nothing flushes.
    pub fn empty(kinds: usize, cores: usize) -> Self {
        let bundles = (0..kinds * cores)
            .map(|i| EventBundle::invalid((i % cores) as u32))
            .collect();
        Self {
            kinds,
            cores,
            bundles,
        }
    }

    #[inline]
    fn index(&self, kind: KindId, core: usize) -> usize {
        kind.index() * self.cores + core
    }

    #[inline]
    pub fn kinds(&self) -> usize {
        self.kinds
    }

    #[inline]
    pub fn cores(&self) -> usize {
        self.cores
    }

    #[inline]
    pub fn get(&self, kind: KindId, core: usize) -> &EventBundle {
        &self.bundles[self.index(kind, core)]
    }

    pub fn set(&mut self, kind: KindId, core: usize, bundle: EventBundle) {
        let idx = self.index(kind, core);
        self.bundles[idx] = bundle;
    }

    pub(crate) fn get_mut(&mut self, kind: KindId, core: usize) -> &mut EventBundle {
        let idx = self.index(kind, core);
        &mut self.bundles[idx]
    }

    /// Iterate lanes in (kind, core) order.
    pub fn iter(&self) -> impl Iterator<Item = (KindId, usize, &EventBundle)> {
        let cores = self.cores;
        self.bundles
            .iter()
            .enumerate()
            .map(move |(i, b)| (KindId::from_index(i / cores), i % cores, b))
    }

    /// True if no lane carries a valid event.
    pub fn is_all_invalid(&self) -> bool {
        self.bundles.iter().all(|b| !b.valid)
    }

    /// Reject frames whose shape does not match the registered lane grid.
    pub fn check_shape(&self, kinds: usize, cores: usize) -> Result<(), CoreError> {
        if self.kinds != kinds || self.cores != cores {
            return Err(CoreError::FrameShape {
                expected_kinds: kinds,
                expected_cores: cores,
                kinds: self.kinds,
                cores: self.cores,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_frame_is_all_invalid() {
        let frame = CycleFrame::empty(3, 2);
        assert!(frame.is_all_invalid());
        assert_eq!(frame.iter().count(), 6);
    }

    #[test]
    fn empty_frame_lanes_carry_their_core() {
        let frame = CycleFrame::empty(2, 2);
        for (_, core, bundle) in frame.iter() {
            assert_eq!(bundle.core, core as u32);
        }
    }

    #[test]
    fn set_then_get_round_trips() {
        let mut frame = CycleFrame::empty(2, 1);
        let kind = KindId::from_index(1);
        frame.set(kind, 0, EventBundle::writeback(0, 5, 0xABCD));
        let bundle = frame.get(kind, 0);
        assert!(bundle.valid);
        assert_eq!(
            bundle.payload,
            Payload::Writeback {
                address: 5,
                data: 0xABCD
            }
        );
    }

    #[test]
    fn shape_check_rejects_mismatch() {
        let frame = CycleFrame::empty(2, 1);
        assert!(frame.check_shape(2, 1).is_ok());
        assert!(matches!(
            frame.check_shape(3, 1),
            Err(CoreError::FrameShape { .. })
        ));
    }

    #[test]
    fn payload_encodings_are_distinct() {
        let mut a = Vec::new();
        let mut b = Vec::new();
        Payload::Scalar(5).encode_into(&mut a);
        Payload::Writeback { address: 0, data: 5 }.encode_into(&mut b);
        assert_ne!(a, b);
    }

    #[test]
    fn blob_payload_is_carried_opaquely() {
        let payload = Payload::Blob(Bytes::from_static(b"\x05\x00"));
        let mut encoded = Vec::new();
        payload.encode_into(&mut encoded);
        assert_eq!(encoded, vec![3, 0x05, 0x00]);
        assert_eq!(payload.clone(), payload);
    }
}
