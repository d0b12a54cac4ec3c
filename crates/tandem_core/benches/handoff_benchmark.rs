//! # Handoff Benchmark
//!
//! Measures one full front end / renderer cycle:
//! `front_end_sleep` → `wake_renderer` → renderer resumes → renderer sleeps.
//!
//! Target: well under 100µs per cycle so the handoff never shows up in a
//! 16ms frame budget.

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tandem_core::{DetachedContext, HandoffCoordinator, OsThreadSpawner};

const STOP: u64 = u64::MAX;

fn bench_handoff_cycle(c: &mut Criterion) {
    let handoff = HandoffCoordinator::<_, u64>::with_default_config(DetachedContext);
    let renderer = handoff
        .spawn_render_thread(&OsThreadSpawner, |h| loop {
            match h.renderer_sleep() {
                Ok(STOP) => break,
                Ok(frame) => {
                    black_box(frame);
                }
                Err(_) => continue,
            }
        })
        .expect("spawn render thread");

    let mut frame = 0_u64;
    handoff.wake_renderer(frame).expect("first wake");

    c.bench_function("handoff_cycle", |b| {
        b.iter(|| {
            frame += 1;
            handoff.front_end_sleep().expect("front end sleep");
            handoff.wake_renderer(black_box(frame)).expect("wake");
        });
    });

    handoff.front_end_sleep().expect("front end sleep");
    handoff.wake_renderer(STOP).expect("stop");
    renderer.join().expect("join render thread");
}

criterion_group!(benches, bench_handoff_cycle);
criterion_main!(benches);
