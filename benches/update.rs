//! Tick throughput on the standard roster.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use quadball::{Match, MatchConfig, PlayerId, Vec2};

fn standard_match() -> Match {
    let mut m = Match::from_config(&MatchConfig::default()).expect("default config is valid");
    let ids: Vec<PlayerId> = m.state().players.keys().copied().collect();
    for id in ids {
        let angle = id.0 as f64 * 0.7;
        m.set_direction(id, Vec2::new(angle.cos(), angle.sin())).expect("player exists");
    }
    // Spread the roster out so contacts and possession are exercised
    for _ in 0..40 {
        m.update(0.15);
    }
    m
}

fn bench_update(c: &mut Criterion) {
    let base = standard_match();

    c.bench_function("match_update", |b| {
        let mut m = base.clone();
        b.iter(|| black_box(m.update(black_box(0.15))))
    });

    c.bench_function("match_clone_and_advance_20", |b| {
        b.iter(|| {
            let mut fork = base.clone();
            for _ in 0..20 {
                fork.update(0.15);
            }
            black_box(fork.compute_hash())
        })
    });
}

criterion_group!(benches, bench_update);
criterion_main!(benches);
