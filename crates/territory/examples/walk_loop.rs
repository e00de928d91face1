//! Walk a synthetic loop through the capture engine and print each step.
//!
//! Usage:
//!   cargo run -p territory --example walk_loop -- [side_m] [seed]

use territory::api::*;

fn main() {
    let mut args = std::env::args().skip(1);
    let side_m: f64 = args.next().and_then(|s| s.parse().ok()).unwrap_or(60.0);
    let seed: u64 = args.next().and_then(|s| s.parse().ok()).unwrap_or(2025);

    let center = GeoPoint::new(30.5728, 104.0668);
    let fixes = square_loop(center, side_m, TrackCfg::default(), TrackReplay::new(seed, 0));
    let Some((first, rest)) = fixes.split_first() else {
        eprintln!("empty track for side {side_m} m");
        return;
    };

    let mut engine = TerritoryCaptureEngine::new(&GameConfig::default(), "demo");
    if let Err(e) = engine.start_from_fix(*first) {
        eprintln!("cannot start: {e}");
        return;
    }
    for (i, f) in rest.iter().enumerate() {
        let outcome = engine.push_fix(*f);
        let snap = engine.snapshots().load();
        println!(
            "fix {i:>3}: {outcome:?}  walked={:.1} m  area~{:.0} m²",
            snap.walked_m, snap.estimated_area_m2
        );
        if matches!(outcome, FixOutcome::LoopClosed { .. }) {
            break;
        }
    }

    if engine.phase() != Phase::Closing {
        println!("loop never closed ({:?})", engine.phase());
        return;
    }
    match engine.finalize() {
        Ok(t) => println!(
            "committed {}: {} points, {:.0} m², perimeter {:.0} m",
            t.id(),
            t.point_count(),
            t.area_m2(),
            t.perimeter_m()
        ),
        Err(e) => println!("rejected: {e}"),
    }
}
