//! Synthetic walking tracks (noisy closed loops + replay tokens).
//!
//! Purpose
//! - Produce realistic fix streams for tests, benches and the CLI `simulate`
//!   command without a device in hand.
//!
//! Model
//! - A closed outline in local metres (east, north) around `center` is walked at
//!   constant speed. Fixes are taken at equal arc-length steps, starting and
//!   ending at the first corner, with uniform positional jitter and a reported
//!   accuracy near `accuracy_m`.
//! - Determinism uses a replay token `(seed, index)` mixed into a single RNG, so
//!   track `index` of a seeded batch can be regenerated on its own.
//!
//! Code cross-refs: `geo::LocalFrame`, `sampling::LocationFix`.

use nalgebra::Vector2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::geo::{GeoPoint, LocalFrame};
use crate::sampling::{LocationFix, Timestamp};

/// Upper bound on steps per outline; longer outlines get wider spacing.
pub const MAX_STEPS: usize = 10_000;

/// Replay token to make tracks reproducible and indexable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReplayToken {
    pub seed: u64,
    pub index: u64,
}

impl ReplayToken {
    pub fn new(seed: u64, index: u64) -> Self {
        Self { seed, index }
    }

    #[inline]
    fn to_std_rng(self) -> StdRng {
        // SplitMix64 finalizer.
        fn mix(mut x: u64) -> u64 {
            x ^= x >> 30;
            x = x.wrapping_mul(0xbf58476d1ce4e5b9);
            x ^= x >> 27;
            x = x.wrapping_mul(0x94d049bb133111eb);
            x ^ (x >> 31)
        }
        let k = mix(self.seed ^ mix(self.index.wrapping_add(0x9e3779b97f4a7c15)));
        StdRng::seed_from_u64(k)
    }
}

/// Walker and sensor model.
#[derive(Clone, Copy, Debug)]
pub struct TrackCfg {
    /// Typical reported horizontal accuracy; each fix draws from ±20 % of it.
    pub accuracy_m: f64,
    /// Max positional noise per axis, uniform in `[-jitter_m, jitter_m]`.
    pub jitter_m: f64,
    /// Walking speed; also reported as the device speed.
    pub speed_mps: f64,
    /// Target distance between fixes along the outline.
    pub spacing_m: f64,
    pub start: Timestamp,
}

impl Default for TrackCfg {
    fn default() -> Self {
        Self {
            accuracy_m: 10.0,
            jitter_m: 1.5,
            speed_mps: 1.4,
            spacing_m: 15.0,
            start: Timestamp::from_secs(0.0),
        }
    }
}

/// Walk a square of side `side_m` centred on `center`, counter-clockwise from
/// its south-west corner.
pub fn square_loop(
    center: GeoPoint,
    side_m: f64,
    cfg: TrackCfg,
    tok: ReplayToken,
) -> Vec<LocationFix> {
    let h = side_m.abs() / 2.0;
    let corners = [
        Vector2::new(-h, -h),
        Vector2::new(h, -h),
        Vector2::new(h, h),
        Vector2::new(-h, h),
    ];
    polygon_loop(center, &corners, cfg, tok)
}

/// Walk an irregular star-shaped outline: `vertices` corners at equally spaced
/// bearings, radii `radius_m * (1 + u)` with `u` in `[-radial_jitter, radial_jitter]`.
pub fn radial_loop(
    center: GeoPoint,
    vertices: usize,
    radius_m: f64,
    radial_jitter: f64,
    cfg: TrackCfg,
    tok: ReplayToken,
) -> Vec<LocationFix> {
    // Outline shape and walk noise come from separate streams of the same seed.
    let mut rng = ReplayToken::new(tok.seed, tok.index ^ 0x5eed).to_std_rng();
    let n = vertices.max(3);
    let rj = radial_jitter.clamp(0.0, 0.9);
    let corners: Vec<Vector2<f64>> = (0..n)
        .map(|k| {
            let theta = std::f64::consts::TAU * (k as f64) / (n as f64);
            let r = radius_m.abs() * (1.0 + (rng.gen::<f64>() * 2.0 - 1.0) * rj);
            Vector2::new(r * theta.cos(), r * theta.sin())
        })
        .collect();
    polygon_loop(center, &corners, cfg, tok)
}

/// Walk the closed outline `corners` (local metres around `center`).
///
/// Returns an empty track for fewer than 3 corners or a zero-length outline.
/// The last fix is taken back at the first corner. At most `MAX_STEPS + 1`
/// fixes are produced.
pub fn polygon_loop(
    center: GeoPoint,
    corners: &[Vector2<f64>],
    cfg: TrackCfg,
    tok: ReplayToken,
) -> Vec<LocationFix> {
    if corners.len() < 3 {
        return Vec::new();
    }
    let edges: Vec<(Vector2<f64>, Vector2<f64>)> = corners
        .iter()
        .zip(corners.iter().cycle().skip(1))
        .map(|(a, b)| (*a, *b))
        .collect();
    let perimeter: f64 = edges.iter().map(|(a, b)| (b - a).norm()).sum();
    if !perimeter.is_finite() || perimeter <= 0.0 {
        return Vec::new();
    }

    let steps = ((perimeter / cfg.spacing_m.max(1e-3)).floor() as usize).clamp(3, MAX_STEPS);
    let step = perimeter / steps as f64;
    let dt = step / cfg.speed_mps.max(1e-3);
    let jitter = cfg.jitter_m.max(0.0);
    let frame = LocalFrame::at(center);
    let mut rng = tok.to_std_rng();

    (0..=steps)
        .map(|k| {
            let along = walk(&edges, (k as f64) * step);
            let noise = Vector2::new(
                rng.gen_range(-1.0..=1.0) * jitter,
                rng.gen_range(-1.0..=1.0) * jitter,
            );
            let accuracy = cfg.accuracy_m * rng.gen_range(0.8..=1.2);
            LocationFix::new(
                frame.unproject(along + noise),
                accuracy,
                cfg.start.plus_secs((k as f64) * dt),
            )
            .with_speed(cfg.speed_mps)
        })
        .collect()
}

/// Position at arc length `s` along the closed outline.
fn walk(edges: &[(Vector2<f64>, Vector2<f64>)], mut s: f64) -> Vector2<f64> {
    for (a, b) in edges {
        let len = (b - a).norm();
        if s <= len {
            return if len > 0.0 { a + (b - a) * (s / len) } else { *a };
        }
        s -= len;
    }
    // Rounding past the end lands back on the first corner.
    edges.first().map(|(a, _)| *a).unwrap_or_else(Vector2::zeros)
}
