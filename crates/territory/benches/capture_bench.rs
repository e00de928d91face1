//! Criterion benchmarks for the per-fix capture path and polygon queries.
//! Focus sizes: loop side in {50, 200, 800} m (roughly 14 to 215 fixes).
//! Results: by default under target/criterion.

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use territory::api::*;

const CENTER: GeoPoint = GeoPoint::new(31.2304, 121.4737);

fn track(side_m: f64) -> Vec<LocationFix> {
    square_loop(CENTER, side_m, TrackCfg::default(), TrackReplay::new(41, 0))
}

fn bench_capture(c: &mut Criterion) {
    let cfg = GameConfig::default();
    let mut group = c.benchmark_group("capture");
    for &side in &[50.0f64, 200.0, 800.0] {
        let fixes = track(side);
        group.bench_with_input(
            BenchmarkId::new("replay_and_finalize", side as u64),
            &fixes,
            |b, fixes| {
                b.iter_batched(
                    || TerritoryCaptureEngine::new(&cfg, "bench"),
                    |mut engine| {
                        let (first, rest) = fixes.split_first().expect("non-empty track");
                        engine.start_from_fix(*first).expect("accurate first fix");
                        for f in rest {
                            if let FixOutcome::LoopClosed { .. } = engine.push_fix(*f) {
                                break;
                            }
                        }
                        let _res = engine.finalize();
                    },
                    BatchSize::SmallInput,
                )
            },
        );

        let filter = SampleFilter::new(&cfg);
        group.bench_with_input(BenchmarkId::new("filter_only", side as u64), &fixes, |b, fixes| {
            b.iter(|| {
                let mut prev: Option<PathPoint> = None;
                for f in fixes {
                    if let Verdict::Accepted(p) = filter.accept(f, prev.as_ref()) {
                        prev = Some(p);
                    }
                }
                prev
            })
        });
    }
    group.finish();
}

fn bench_contains(c: &mut Criterion) {
    let mut group = c.benchmark_group("point_in_polygon");
    for &n in &[8usize, 64, 512] {
        let ring: Vec<GeoPoint> = (0..n)
            .map(|k| {
                let theta = std::f64::consts::TAU * k as f64 / n as f64;
                CENTER.offset_m(100.0 * theta.cos(), 100.0 * theta.sin())
            })
            .collect();
        group.bench_with_input(BenchmarkId::new("ray_cast", n), &ring, |b, ring| {
            b.iter(|| point_in_polygon(CENTER.offset_m(30.0, -20.0), ring))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_capture, bench_contains);
criterion_main!(benches);
