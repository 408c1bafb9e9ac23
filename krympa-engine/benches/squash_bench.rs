use criterion::{black_box, criterion_group, criterion_main, Criterion};

use krympa_core::events::EventBundle;
use krympa_engine::scenario::{frame_for_cycle, standard_registry, ScenarioCycle};
use krympa_engine::SquashEngine;

fn bench_tick(c: &mut Criterion) {
    c.bench_function("tick_merge_heavy", |b| {
        let (registry, kinds) = standard_registry().unwrap();
        let kind_count = registry.len();
        let mut engine = SquashEngine::builder(registry)
            .coalesce_writebacks(kinds.commit, kinds.writeback, 32)
            .build()
            .unwrap();

        let mut input = frame_for_cycle(&ScenarioCycle::default(), &kinds, kind_count, 1).unwrap();
        input.set(kinds.commit, 0, EventBundle::commit(0, false, 1));
        input.set(kinds.writeback, 0, EventBundle::writeback(0, 1, 0x11));

        b.iter(|| {
            let out = engine.tick(black_box(&input)).unwrap();
            black_box(out);
        });
    });
}

criterion_group!(benches, bench_tick);
criterion_main!(benches);
