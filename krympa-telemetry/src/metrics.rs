//! ## krympa-telemetry::metrics
//! **Prometheus recorder for squash-window statistics**
//!
//! Counters for ticks, flushes, and merged cycles, plus a histogram of how
//! many cycles each accumulation window absorbed before flushing.

use prometheus::{Counter, Histogram, HistogramOpts, Registry};

#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    pub registry: Registry,
    pub cycles: Counter,
    pub flushes: Counter,
    pub merged_cycles: Counter,
    pub window_cycles: Histogram,
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRecorder {
    pub fn new() -> Self {
        let registry = Registry::new();
        let cycles = Counter::new("krympa_cycles_total", "Total ticks processed").unwrap();
        let flushes = Counter::new("krympa_flushes_total", "Total flush emissions").unwrap();
        let merged_cycles = Counter::new(
            "krympa_merged_cycles_total",
            "Cycles absorbed into an accumulation window without emission",
        )
        .unwrap();

        let window_cycles = Histogram::with_opts(
            HistogramOpts::new(
                "krympa_squash_window_cycles",
                "Cycles merged per flushed window",
            )
            .buckets(vec![1.0, 2.0, 4.0, 8.0, 16.0, 64.0, 256.0]),
        )
        .unwrap();

        registry.register(Box::new(cycles.clone())).unwrap();
        registry.register(Box::new(flushes.clone())).unwrap();
        registry.register(Box::new(merged_cycles.clone())).unwrap();
        registry.register(Box::new(window_cycles.clone())).unwrap();

        Self {
            registry,
            cycles,
            flushes,
            merged_cycles,
            window_cycles,
        }
    }

    pub fn gather_metrics(&self) -> Result<String, prometheus::Error> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::<u8>::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer).unwrap())
    }

    pub fn on_tick(&self) {
        self.cycles.inc();
    }

    pub fn on_flush(&self, window_cycles: u64) {
        self.flushes.inc();
        self.window_cycles.observe(window_cycles as f64);
    }

    pub fn on_merge(&self) {
        self.merged_cycles.inc();
    }
}
