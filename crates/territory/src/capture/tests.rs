use super::*;
use crate::config::GameConfig;
use crate::geo::GeoPoint;
use crate::sampling::{LocationFix, PathPoint, RejectReason, Timestamp};
use proptest::prelude::*;
use uuid::Uuid;

const ORIGIN: GeoPoint = GeoPoint::new(22.543, 114.058);
const T0: f64 = 1_700_000_000.0;

/// Fix `e`/`n` metres from the origin, `k` steps of 30 s after start.
fn fix(e: f64, n: f64, k: usize) -> LocationFix {
    LocationFix::new(
        ORIGIN.offset_m(e, n),
        10.0,
        Timestamp::from_secs(T0 + 30.0 * k as f64),
    )
}

fn engine() -> TerritoryCaptureEngine {
    TerritoryCaptureEngine::new(&GameConfig::default(), "player-1")
}

fn started() -> TerritoryCaptureEngine {
    let mut e = engine();
    e.start(ORIGIN, Timestamp::from_secs(T0)).unwrap();
    e
}

/// Push `steps` in order, numbering timestamps after the origin.
fn walk(e: &mut TerritoryCaptureEngine, steps: &[(f64, f64)], k0: usize) -> Vec<FixOutcome> {
    steps
        .iter()
        .enumerate()
        .map(|(i, (x, y))| e.push_fix(fix(*x, *y, k0 + i + 1)))
        .collect()
}

const SQUARE: [(f64, f64); 5] = [
    (25.0, 0.0),
    (50.0, 0.0),
    (50.0, 50.0),
    (0.0, 50.0),
    (0.0, 20.0),
];
const SLIVER: [(f64, f64); 4] = [(20.0, 20.0), (40.0, 40.0), (25.0, 27.0), (10.0, 12.0)];

fn session_with(points: &[(f64, f64)]) -> CaptureSession {
    let d = LoopDetector::new(&GameConfig::default());
    let mut s = CaptureSession::new(PathPoint::new(ORIGIN, Timestamp::from_secs(T0)));
    for (k, (e, n)) in points.iter().enumerate() {
        s.append(fix(*e, *n, k + 1).to_path_point());
        d.observe(&mut s);
    }
    s
}

// ---------- LoopDetector ----------

#[test]
fn closure_needs_enough_points_even_at_the_origin() {
    let d = LoopDetector::new(&GameConfig::default());
    // Four points, newest right next to the origin.
    let s = session_with(&[(30.0, 0.0), (30.0, 30.0), (0.0, 5.0)]);
    assert_eq!(d.check_closure(&s), Closure::Open);
    let s = session_with(&[(30.0, 0.0), (30.0, 30.0), (0.0, 30.0), (0.0, 5.0)]);
    assert!(matches!(
        d.check_closure(&s),
        Closure::Closed { distance_to_origin_m } if (distance_to_origin_m - 5.0).abs() < 0.01
    ));
}

#[test]
fn closure_distance_threshold() {
    let d = LoopDetector::new(&GameConfig::default());
    let far = session_with(&[(30.0, 0.0), (30.0, 30.0), (0.0, 30.0), (0.0, 25.5)]);
    assert_eq!(d.check_closure(&far), Closure::Open);
    let open = d.close(far.clone()).unwrap_err();
    assert_eq!(open, far);
    let near = session_with(&[(30.0, 0.0), (30.0, 30.0), (0.0, 30.0), (0.0, 24.9)]);
    let closed = d.close(near).unwrap();
    assert!(closed.distance_to_origin_m() <= 25.0);
}

#[test]
fn closure_waits_for_the_path_to_leave_the_origin() {
    let d = LoopDetector::new(&GameConfig::default());
    // Five points shuffling around inside the close radius.
    let s = session_with(&[(12.0, 0.0), (12.0, 12.0), (0.0, 12.0), (-10.0, 5.0)]);
    assert!(!s.is_armed());
    assert_eq!(d.check_closure(&s), Closure::Open);

    let s = session_with(&[(12.0, 0.0), (30.0, 12.0), (0.0, 12.0), (-10.0, 5.0)]);
    assert!(s.is_armed());
    assert!(matches!(d.check_closure(&s), Closure::Closed { .. }));
}

#[test]
fn reopened_session_is_disarmed() {
    let d = LoopDetector::new(&GameConfig::default());
    let closed = d.close(session_with(&SLIVER)).unwrap();
    let reopened = closed.reopen();
    assert!(!reopened.is_armed());
    assert_eq!(d.check_closure(&reopened), Closure::Open);
    assert_eq!(reopened.path().count(), 5);
}

// ---------- PolygonFinalizer ----------

#[test]
fn measure_reports_rules_in_order() {
    let f = PolygonFinalizer::new(&GameConfig::default());
    let pts = |xs: &[(f64, f64)]| -> Vec<GeoPoint> {
        xs.iter().map(|(e, n)| ORIGIN.offset_m(*e, *n)).collect()
    };
    assert!(matches!(
        f.measure(&pts(&[(0.0, 0.0), (10.0, 0.0)])),
        Err(ValidationError::TooFewPoints { count: 2, required: 5 })
    ));
    // 100 m long, 4 m wide: thin beats tiny.
    let thin = pts(&[(0.0, 0.0), (50.0, 0.0), (100.0, 0.0), (100.0, 4.0), (0.0, 4.0)]);
    assert!(matches!(f.measure(&thin), Err(ValidationError::SpanTooThin { .. })));
    let small = pts(&[(0.0, 0.0), (9.0, 0.0), (9.0, 9.0), (0.0, 9.0), (0.0, 4.0)]);
    assert!(matches!(f.measure(&small), Err(ValidationError::AreaTooSmall { .. })));

    let capped = GameConfig {
        territory_max_area_m2: 1_000.0,
        ..GameConfig::default()
    };
    let square = pts(&[(0.0, 0.0), (50.0, 0.0), (50.0, 50.0), (0.0, 50.0), (0.0, 20.0)]);
    assert!(matches!(
        PolygonFinalizer::new(&capped).measure(&square),
        Err(ValidationError::AreaTooLarge { .. })
    ));
    let m = f.measure(&square).unwrap();
    assert!((m.area_m2 - 2_500.0).abs() < 2.5);
    assert!((m.span_m - 50.0).abs() < 0.1);
}

#[test]
fn stored_territory_is_revalidated() {
    let mut e = started();
    walk(&mut e, &SQUARE, 0);
    let t = e.finalize().unwrap();
    let f = PolygonFinalizer::new(&GameConfig::default());
    let stored = serde_json::to_value(&t).unwrap();
    let back: Territory = serde_json::from_value(stored.clone()).unwrap();
    assert_eq!(f.revalidate(&back), Ok(()));

    let edit = |key: &str, value: serde_json::Value| -> Territory {
        let mut v = stored.clone();
        v[key] = value;
        serde_json::from_value(v).unwrap()
    };
    let two = serde_json::json!([stored["polygon"][0], stored["polygon"][1]]);
    assert!(matches!(
        f.revalidate(&edit("polygon", two)),
        Err(ValidationError::TooFewPoints { count: 2, .. })
    ));
    assert_eq!(
        f.revalidate(&edit("area_m2", serde_json::json!(9_999.0))),
        Err(ValidationError::Mismatch { field: "area_m2" })
    );
    assert_eq!(
        f.revalidate(&edit("point_count", serde_json::json!(40))),
        Err(ValidationError::Mismatch { field: "point_count" })
    );
    let mut wide = stored["bbox"].clone();
    wide["max_lat"] = serde_json::json!(80.0);
    assert_eq!(
        f.revalidate(&edit("bbox", wide)),
        Err(ValidationError::Mismatch { field: "bbox" })
    );
}

// ---------- TerritoryCaptureEngine ----------

#[test]
fn start_rejects_active_session_and_bad_origin() {
    let mut e = engine();
    assert_eq!(
        e.start(GeoPoint::new(91.0, 0.0), Timestamp::from_secs(T0)),
        Err(CaptureError::InvalidOrigin)
    );
    assert_eq!(
        e.start(ORIGIN, Timestamp::from_secs(f64::NAN)),
        Err(CaptureError::InvalidOrigin)
    );
    assert_eq!(e.phase(), Phase::Idle);

    e.start(ORIGIN, Timestamp::from_secs(T0)).unwrap();
    assert_eq!(e.phase(), Phase::Sampling);
    assert_eq!(
        e.start(ORIGIN, Timestamp::from_secs(T0)),
        Err(CaptureError::SessionActive)
    );
    assert_eq!(e.state().session().unwrap().path().count(), 1);
}

#[test]
fn origin_fix_goes_through_the_filter() {
    let mut e = engine();
    let blurry = LocationFix::new(ORIGIN, 500.0, Timestamp::from_secs(T0));
    assert!(matches!(
        e.start_from_fix(blurry),
        Err(CaptureError::OriginRejected(RejectReason::LowAccuracy { accuracy_m, limit_m }))
            if accuracy_m == 500.0 && limit_m == 25.0
    ));
    let broken = LocationFix::new(ORIGIN, 0.0, Timestamp::from_secs(T0));
    assert!(matches!(
        e.start_from_fix(broken),
        Err(CaptureError::OriginRejected(RejectReason::Malformed(_)))
    ));
    assert_eq!(e.phase(), Phase::Idle);
    assert_eq!(e.snapshots().load().phase, Phase::Idle);

    e.start_from_fix(fix(0.0, 0.0, 0)).unwrap();
    assert_eq!(e.phase(), Phase::Sampling);
    assert_eq!(e.state().session().unwrap().origin(), ORIGIN);
    assert_eq!(
        e.start_from_fix(fix(0.0, 0.0, 1)),
        Err(CaptureError::SessionActive)
    );
}

#[test]
fn fixes_without_session_are_ignored() {
    let mut e = engine();
    assert_eq!(e.push_fix(fix(20.0, 0.0, 1)), FixOutcome::Inactive);
    assert_eq!(e.cancel(), Err(CaptureError::NoActiveSession));
    assert_eq!(e.phase(), Phase::Idle);
}

#[test]
fn square_walk_closes_and_commits() {
    let mut e = started();
    let outcomes = walk(&mut e, &SQUARE, 0);
    assert_eq!(outcomes[0], FixOutcome::Appended { count: 2 });
    assert_eq!(outcomes[3], FixOutcome::Appended { count: 5 });
    assert!(matches!(outcomes[4], FixOutcome::LoopClosed { count: 6, .. }));
    assert_eq!(e.phase(), Phase::Closing);

    // Closing holds the session still.
    assert_eq!(e.push_fix(fix(0.0, 5.0, 6)), FixOutcome::Inactive);

    let t = e.finalize().unwrap();
    assert_eq!(e.phase(), Phase::Committed);
    assert_eq!(e.committed(), Some(&t));
    assert_eq!(t.owner_id(), "player-1");
    assert_eq!(t.point_count(), 6);
    assert_eq!(t.polygon().len(), 6);
    assert!((t.area_m2() - 2_500.0).abs() < 2.5);
    assert_eq!(t.started_at(), Timestamp::from_secs(T0));
    assert_eq!(t.completed_at(), Timestamp::from_secs(T0 + 150.0));
    assert!(t.contains(ORIGIN.offset_m(25.0, 25.0)));
    assert!(!t.contains(ORIGIN.offset_m(75.0, 25.0)));
    assert!((t.perimeter_m() - 200.0).abs() < 0.5);
    assert!((t.walked_m() - 180.0).abs() < 0.5);
}

#[test]
fn rejected_loop_reopens_and_can_grow() {
    let mut e = started();
    let outcomes = walk(&mut e, &SLIVER, 0);
    assert!(matches!(outcomes[3], FixOutcome::LoopClosed { count: 5, .. }));

    let err = e.finalize().unwrap_err();
    assert!(matches!(err, ValidationError::AreaTooSmall { area_m2, .. } if area_m2 < 100.0));
    assert_eq!(e.phase(), Phase::Sampling);
    assert_eq!(e.state().session().unwrap().path().count(), 5);
    assert_eq!(e.state().session().unwrap().origin(), ORIGIN);

    let more = [(0.0, 40.0), (-40.0, 40.0), (-40.0, 0.0), (-15.0, 0.0)];
    let outcomes = walk(&mut e, &more, SLIVER.len());
    assert!(matches!(outcomes[3], FixOutcome::LoopClosed { count: 9, .. }));
    let t = e.finalize().unwrap();
    assert!(t.area_m2() > 1_500.0);
}

#[test]
fn rejected_loop_does_not_close_again_inside_the_radius() {
    let mut e = started();
    walk(&mut e, &SLIVER, 0);
    assert!(e.finalize().is_err());

    // 13 m from the last point, still 18 m from the origin.
    assert_eq!(
        e.push_fix(fix(-2.0, 18.0, SLIVER.len() + 1)),
        FixOutcome::Appended { count: 6 }
    );
    assert_eq!(e.phase(), Phase::Sampling);

    // Leaving the radius and coming back closes it.
    let back = [(-20.0, 30.0), (-10.0, 8.0)];
    let outcomes = walk(&mut e, &back, SLIVER.len() + 1);
    assert_eq!(outcomes[0], FixOutcome::Appended { count: 7 });
    assert!(matches!(outcomes[1], FixOutcome::LoopClosed { count: 8, .. }));
}

#[test]
fn rejections_leave_path_unchanged() {
    let mut e = started();
    let before = e.state().session().unwrap().path().clone();
    let outcome = e.push_fix(fix(0.0, 80.1, 1));
    assert!(matches!(
        outcome,
        FixOutcome::Rejected(RejectReason::ImplausibleJump { .. })
    ));
    let outcome = e.push_fix(fix(3.0, 0.0, 1));
    assert!(matches!(outcome, FixOutcome::Rejected(RejectReason::TooSoon { .. })));
    let stale = LocationFix::new(
        ORIGIN.offset_m(20.0, 0.0),
        10.0,
        Timestamp::from_secs(T0 - 1.0),
    );
    assert!(matches!(
        e.push_fix(stale),
        FixOutcome::Rejected(RejectReason::Malformed(_))
    ));
    assert_eq!(e.state().session().unwrap().path(), &before);
}

#[test]
#[should_panic(expected = "only a Closing session can be finalized")]
fn finalize_while_sampling_panics() {
    let mut e = started();
    let _ = e.finalize();
}

#[test]
fn cancel_aborts_and_allows_restart() {
    let mut e = started();
    walk(&mut e, &SQUARE[..2], 0);
    e.cancel().unwrap();
    assert_eq!(e.phase(), Phase::Aborted);
    assert!(e.state().session().is_none());
    assert_eq!(e.cancel(), Err(CaptureError::NoActiveSession));

    e.start(ORIGIN, Timestamp::from_secs(T0 + 600.0)).unwrap();
    assert_eq!(e.phase(), Phase::Sampling);
    assert_eq!(e.state().session().unwrap().path().count(), 1);
}

#[test]
fn cancel_from_closing() {
    let mut e = started();
    walk(&mut e, &SQUARE, 0);
    assert_eq!(e.phase(), Phase::Closing);
    e.cancel().unwrap();
    assert_eq!(e.phase(), Phase::Aborted);
}

#[test]
fn restart_after_commit_starts_fresh() {
    let mut e = started();
    walk(&mut e, &SQUARE, 0);
    let first = e.finalize().unwrap();
    e.start(ORIGIN.offset_m(500.0, 0.0), Timestamp::from_secs(T0 + 3_600.0))
        .unwrap();
    assert!(e.committed().is_none());
    assert_eq!(e.state().session().unwrap().path().count(), 1);
    assert_ne!(first.id(), Uuid::nil());
}

#[test]
fn snapshots_follow_every_mutation() {
    let mut e = engine();
    let handle = e.snapshots();
    assert_eq!(handle.load().phase, Phase::Idle);

    e.start(ORIGIN, Timestamp::from_secs(T0)).unwrap();
    walk(&mut e, &SQUARE[..3], 0);
    let snap = handle.load();
    assert_eq!(snap.phase, Phase::Sampling);
    assert_eq!(snap.points.len(), 4);
    assert!((snap.walked_m - 100.0).abs() < 0.5);
    assert!((snap.estimated_area_m2 - 1_250.0).abs() < 2.0);
    assert!(snap.distance_to_origin_m.is_some());

    // Readers on other threads see the same immutable value.
    let reader = handle.clone();
    let seen = std::thread::spawn(move || reader.load().points.len())
        .join()
        .unwrap();
    assert_eq!(seen, 4);

    walk(&mut e, &SQUARE[3..], 3);
    assert_eq!(handle.load().phase, Phase::Closing);
    e.finalize().unwrap();
    let done = handle.load();
    assert_eq!(done.phase, Phase::Committed);
    assert!(done.points.is_empty());
    assert!(done.distance_to_origin_m.is_none());
    // Snapshots taken earlier stay as they were.
    assert_eq!(snap.points.len(), 4);
}

#[test]
fn concurrent_readers_see_whole_snapshots() {
    let mut e = started();
    let handle = e.snapshots();
    let reader = std::thread::spawn(move || {
        let mut seen = Vec::new();
        for _ in 0..200 {
            let s = handle.load();
            seen.push((s.phase, s.points.len(), s.distance_to_origin_m.is_some()));
            std::thread::yield_now();
        }
        seen
    });
    walk(&mut e, &SQUARE, 0);
    e.finalize().unwrap();
    for (phase, len, live) in reader.join().unwrap() {
        match phase {
            Phase::Sampling | Phase::Closing => assert!(live && (1..=6).contains(&len)),
            Phase::Committed => assert!(!live && len == 0),
            other => panic!("unexpected phase {other:?}"),
        }
    }
}

proptest! {
    // LoopClosed only ever fires with enough points near the origin, and the
    // path grows by exactly one per accepted fix.
    #[test]
    fn closure_respects_density_and_radius(
        steps in proptest::collection::vec((-60.0f64..60.0, -60.0f64..60.0), 1..30)
    ) {
        let cfg = GameConfig::default();
        let mut e = started();
        let mut count = 1usize;
        for (k, (x, y)) in steps.iter().enumerate() {
            match e.push_fix(fix(*x, *y, k + 1)) {
                FixOutcome::Appended { count: c } => {
                    count += 1;
                    prop_assert_eq!(c, count);
                }
                FixOutcome::LoopClosed { count: c, distance_to_origin_m } => {
                    count += 1;
                    prop_assert_eq!(c, count);
                    prop_assert!(c >= cfg.sampling_min_points);
                    prop_assert!(distance_to_origin_m <= cfg.territory_close_distance_m);
                    prop_assert_eq!(e.phase(), Phase::Closing);
                }
                FixOutcome::Rejected(_) => {}
                FixOutcome::Inactive => prop_assert_eq!(e.phase(), Phase::Closing),
            }
        }
        let n = e.state().session().map(|s| s.path().count()).unwrap_or(0);
        prop_assert_eq!(n, count);
    }
}
