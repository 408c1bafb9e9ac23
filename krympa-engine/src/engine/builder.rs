//! Engine setup: registration-time configuration, validated before the first
//! tick. Configuration errors here are fatal and prevent the engine from
//! starting at all.

use krympa_core::accum::AccumulatorLanes;
use krympa_core::control::ControlChannel;
use krympa_core::events::{EventRegistry, KindId};
use krympa_core::wback::WritebackCoalescer;
use krympa_telemetry::MetricsRecorder;

use crate::engine::error::EngineError;
use crate::engine::squash::{CoalesceUnit, SquashEngine};

pub struct EngineBuilder {
    registry: EventRegistry,
    cores: usize,
    disable_after: Option<u64>,
    coalesce: Option<(KindId, KindId, usize)>,
    commit_anchor: Option<KindId>,
    metrics: Option<MetricsRecorder>,
}

impl EngineBuilder {
    pub(crate) fn new(registry: EventRegistry) -> Self {
        Self {
            registry,
            cores: 1,
            disable_after: None,
            coalesce: None,
            commit_anchor: None,
            metrics: None,
        }
    }

    /// Number of execution contexts driven per cycle.
    pub fn cores(mut self, cores: usize) -> Self {
        self.cores = cores;
        self
    }

    /// Disable squashing once the cycle counter reaches `n` (zero or `None`
    /// means never). The transition is terminal.
    pub fn disable_after(mut self, n: Option<u64>) -> Self {
        self.disable_after = n;
        self
    }

    /// Enable the register-writeback coalescer over the given commit and
    /// writeback kinds. Only valid for single-core configurations.
    pub fn coalesce_writebacks(
        mut self,
        commit: KindId,
        writeback: KindId,
        register_slots: usize,
    ) -> Self {
        self.coalesce = Some((commit, writeback, register_slots));
        self
    }

    /// Kind whose first valid bundle anchors the initial flush. Defaults to
    /// the coalescer's commit kind, or the class named "commit".
    pub fn commit_anchor(mut self, kind: KindId) -> Self {
        self.commit_anchor = Some(kind);
        self
    }

    pub fn metrics(mut self, metrics: MetricsRecorder) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn build(self) -> Result<SquashEngine, EngineError> {
        if self.registry.is_empty() {
            return Err(EngineError::EmptyRegistry);
        }
        if self.cores == 0 {
            return Err(EngineError::Validation(
                "at least one core must be configured".into(),
            ));
        }
        if self.coalesce.is_some() && self.cores != 1 {
            return Err(EngineError::CoalesceRequiresSingleCore(self.cores));
        }

        let coalesce = self.coalesce.map(|(commit, writeback, slots)| CoalesceUnit {
            commit,
            writeback,
            table: WritebackCoalescer::new(slots),
        });

        let commit_anchor = self
            .commit_anchor
            .or_else(|| coalesce.as_ref().map(|u| u.commit))
            .or_else(|| self.registry.lookup("commit"));

        let kinds = self.registry.len();
        Ok(SquashEngine::assemble(
            self.registry,
            self.cores,
            AccumulatorLanes::new(kinds, self.cores),
            ControlChannel::new(self.disable_after),
            coalesce,
            commit_anchor,
            self.metrics,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use krympa_core::events::EventClass;

    fn registry() -> (EventRegistry, KindId, KindId) {
        let mut registry = EventRegistry::new();
        let commit = registry.register(EventClass::commit()).unwrap();
        let wback = registry.register(EventClass::writeback(commit)).unwrap();
        (registry, commit, wback)
    }

    #[test]
    fn rejects_empty_registry() {
        let result = SquashEngine::builder(EventRegistry::new()).build();
        assert!(matches!(result, Err(EngineError::EmptyRegistry)));
    }

    #[test]
    fn rejects_zero_cores() {
        let (registry, _, _) = registry();
        let result = SquashEngine::builder(registry).cores(0).build();
        assert!(matches!(result, Err(EngineError::Validation(_))));
    }

    #[test]
    fn rejects_multi_core_coalescing() {
        let (registry, commit, wback) = registry();
        let result = SquashEngine::builder(registry)
            .cores(2)
            .coalesce_writebacks(commit, wback, 32)
            .build();
        assert!(matches!(
            result,
            Err(EngineError::CoalesceRequiresSingleCore(2))
        ));
    }

    #[test]
    fn builds_single_core_with_coalescing() {
        let (registry, commit, wback) = registry();
        let engine = SquashEngine::builder(registry)
            .coalesce_writebacks(commit, wback, 32)
            .build()
            .unwrap();
        assert_eq!(engine.cores(), 1);
        assert_eq!(engine.cycle(), 0);
    }
}
