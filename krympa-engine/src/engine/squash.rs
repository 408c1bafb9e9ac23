//! Squash decision logic and the cycle-synchronous tick driver.
//!
//! One tick per simulated clock cycle. Each tick runs in two phases,
//! mirroring synchronous-register semantics: a decision phase that only reads
//! the accumulator and the incoming frame, and a commit phase that mutates
//! the accumulator exactly once. The global flush decision is all-or-nothing
//! across every registered kind; per-kind dependency overrides are a purely
//! local accumulation choice and never emit anything by themselves.

use tracing::{debug, trace};

use krympa_core::accum::AccumulatorLanes;
use krympa_core::control::{ControlChannel, ControlHandle};
use krympa_core::events::{CycleFrame, EventRegistry, KindId};
use krympa_core::wback::WritebackCoalescer;
use krympa_core::CoreError;
use krympa_telemetry::MetricsRecorder;

use crate::engine::builder::EngineBuilder;
use crate::engine::error::EngineError;

/// Coalescer wiring: which kinds carry commits and writebacks, plus the
/// continuously-updated latest-value table.
pub(crate) struct CoalesceUnit {
    pub(crate) commit: KindId,
    pub(crate) writeback: KindId,
    pub(crate) table: WritebackCoalescer,
}

pub struct SquashEngine {
    registry: EventRegistry,
    cores: usize,
    lanes: AccumulatorLanes,
    control: ControlChannel,
    coalesce: Option<CoalesceUnit>,
    commit_anchor: Option<KindId>,
    /// True until the first valid commit bundle is seen; that cycle always
    /// flushes so the checker gets an unmerged initial synchronization point.
    awaiting_first_commit: bool,
    cycle: u64,
    /// Input cycles folded into the current accumulation window.
    window: u64,
    metrics: Option<MetricsRecorder>,
}

impl SquashEngine {
    pub fn builder(registry: EventRegistry) -> EngineBuilder {
        EngineBuilder::new(registry)
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn assemble(
        registry: EventRegistry,
        cores: usize,
        lanes: AccumulatorLanes,
        control: ControlChannel,
        coalesce: Option<CoalesceUnit>,
        commit_anchor: Option<KindId>,
        metrics: Option<MetricsRecorder>,
    ) -> Self {
        Self {
            registry,
            cores,
            lanes,
            control,
            coalesce,
            commit_anchor,
            awaiting_first_commit: true,
            cycle: 0,
            window: 0,
            metrics,
        }
    }

    #[inline]
    pub fn cores(&self) -> usize {
        self.cores
    }

    #[inline]
    pub fn kinds(&self) -> usize {
        self.registry.len()
    }

    /// Cycles ticked so far.
    #[inline]
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Handle for disabling squash from outside the tick path; takes effect
    /// at the next tick boundary.
    pub fn control_handle(&self) -> ControlHandle {
        self.control.handle()
    }

    /// Process one cycle of input bundles.
    ///
    /// Returns the bundle set emitted this cycle: the flushed accumulator
    /// contents when the cycle flushes, an all-invalid frame otherwise.
    pub fn tick(&mut self, input: &CycleFrame) -> Result<CycleFrame, EngineError> {
        let cycle = self.cycle;
        input.check_shape(self.registry.len(), self.cores)?;
        self.check_core_identity(input)?;

        let enabled = self.control.poll(cycle);

        // The latest-value table is a side index, updated from every valid
        // writeback regardless of what the squash decision turns out to be.
        if let Some(unit) = self.coalesce.as_mut() {
            unit.table.observe_frame(input, unit.writeback)?;
        }

        // Decision phase: read-only snapshot of lanes + input.
        let mut all_squashable = true;
        for (kind, class) in self.registry.iter() {
            for core in 0..self.cores {
                let accumulated = self.lanes.current(kind, core);
                let candidate = input.get(kind, core);
                if !(class.supports_squash)(candidate, accumulated)
                    || !(class.supports_squash_base)(accumulated)
                {
                    all_squashable = false;
                }
            }
        }

        let commit_seen = self.commit_anchor.is_some_and(|anchor| {
            (0..self.cores).any(|core| input.get(anchor, core).valid)
        });
        let initial_commit_edge = self.awaiting_first_commit && commit_seen;

        let should_flush = !enabled || !all_squashable || initial_commit_edge;

        // Per-kind dependency gating, also from the read-only snapshot. A
        // lane whose dependency set is unsatisfied this cycle is forced to
        // overwrite instead of merge; this is local and emits nothing.
        let mut forced_replace = vec![false; self.registry.len() * self.cores];
        for (kind, class) in self.registry.iter() {
            if class.depends_on.is_empty() {
                continue;
            }
            for core in 0..self.cores {
                let satisfied = class.depends_on.iter().any(|&dep| {
                    let dep_bundle = input.get(dep, core);
                    dep_bundle.valid && dep_bundle.core == core as u32
                });
                forced_replace[kind.index() * self.cores + core] = !satisfied;
            }
        }

        // Commit phase: mutate lanes once, then emit.
        let output = if should_flush {
            let mut flushed = self.lanes.swap_frame(input.clone());
            if let Some(unit) = &self.coalesce {
                unit.table
                    .patch_frame(&mut flushed, unit.commit, unit.writeback, cycle)?;
            }
            debug!(
                cycle,
                window = self.window,
                enabled,
                all_squashable,
                initial_commit_edge,
                "flush"
            );
            if let Some(metrics) = &self.metrics {
                metrics.on_flush(self.window);
            }
            self.window = 1;
            flushed
        } else {
            for (kind, class) in self.registry.iter() {
                for core in 0..self.cores {
                    let bundle = input.get(kind, core);
                    if forced_replace[kind.index() * self.cores + core] {
                        self.lanes.replace(kind, core, bundle.clone());
                    } else {
                        self.lanes.merge_into(class.merge, kind, core, bundle);
                    }
                }
            }
            trace!(cycle, "merge");
            if let Some(metrics) = &self.metrics {
                metrics.on_merge();
            }
            self.window += 1;
            CycleFrame::empty(self.registry.len(), self.cores)
        };

        if commit_seen {
            self.awaiting_first_commit = false;
        }
        if let Some(metrics) = &self.metrics {
            metrics.on_tick();
        }
        self.cycle += 1;
        Ok(output)
    }

    /// Terminal flush: emit whatever the accumulator still holds. Used by the
    /// driver at the end of a run so no merged window is lost.
    pub fn finish(&mut self) -> Result<CycleFrame, EngineError> {
        let seed = CycleFrame::empty(self.registry.len(), self.cores);
        let mut flushed = self.lanes.swap_frame(seed);
        if let Some(unit) = &self.coalesce {
            unit.table
                .patch_frame(&mut flushed, unit.commit, unit.writeback, self.cycle)?;
        }
        if let Some(metrics) = &self.metrics {
            metrics.on_flush(self.window);
        }
        self.window = 0;
        Ok(flushed)
    }

    /// Bundles of unique-identifier kinds must sit in the lane matching their
    /// core field; anything else breaks the single-context assumptions the
    /// coalescer and the checker rely on.
    fn check_core_identity(&self, input: &CycleFrame) -> Result<(), EngineError> {
        for (kind, class) in self.registry.iter() {
            if !class.unique_core_id {
                continue;
            }
            for core in 0..self.cores {
                let bundle = input.get(kind, core);
                if bundle.valid && bundle.core != core as u32 {
                    return Err(CoreError::CoreIdMismatch {
                        class: class.name.clone(),
                        found: bundle.core,
                        lane: core as u32,
                    }
                    .into());
                }
            }
        }
        Ok(())
    }
}
