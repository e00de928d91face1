use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use territory::capture::{FixOutcome, PolygonFinalizer, Territory, TerritoryCaptureEngine};
use territory::poi::{Poi, PoiCooldownTracker};
use territory::trace::{square_loop, ReplayToken, TrackCfg, MAX_STEPS};
use territory::{GameConfig, GeoPoint, Timestamp};
use tracing_subscriber::fmt::SubscriberBuilder;
use tracing_subscriber::EnvFilter;

mod report;
mod track;

/// Largest square `simulate` will lay out.
const MAX_SIDE_M: f64 = 10_000.0;

use report::ReplaySummary;

#[derive(Parser)]
#[command(name = "territory-cli")]
#[command(about = "Replay GPS tracks through the territory capture engine")]
struct Cmd {
    /// JSON file overriding GameConfig thresholds
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Replay a fix track and write the committed territory as JSON
    Capture {
        /// CSV or Parquet with columns t,lat,lon,accuracy_m[,speed_mps]
        #[arg(long)]
        track: PathBuf,
        #[arg(long, default_value = "local")]
        owner: String,
        #[arg(long)]
        out: PathBuf,
    },
    /// Write a synthetic square walking loop
    Simulate {
        #[arg(long, default_value_t = 0)]
        seed: u64,
        #[arg(long, default_value_t = 0)]
        index: u64,
        #[arg(long)]
        side_m: f64,
        /// Number of steps around the loop (default: one every 15 m)
        #[arg(long)]
        points: Option<usize>,
        #[arg(long, default_value_t = 30.5728)]
        lat: f64,
        #[arg(long, default_value_t = 104.0668)]
        lon: f64,
        #[arg(long)]
        out: PathBuf,
    },
    /// Test whether a point lies inside a committed territory
    Contains {
        #[arg(long)]
        territory: PathBuf,
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
    },
    /// Report POI lootability at a given time
    Poi {
        /// Seconds timestamp of the last scavenge; omit for never
        #[arg(long)]
        last_scavenged: Option<f64>,
        #[arg(long)]
        now: f64,
    },
}

fn main() -> Result<()> {
    SubscriberBuilder::default()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let cmd = Cmd::parse();
    let cfg = load_config(cmd.config.as_deref())?;
    match cmd.action {
        Action::Capture { track, owner, out } => {
            let territory = capture(&cfg, &track, &owner, &out)?;
            println!("{}", serde_json::to_string_pretty(&territory)?);
            Ok(())
        }
        Action::Simulate {
            seed,
            index,
            side_m,
            points,
            lat,
            lon,
            out,
        } => simulate(GeoPoint::new(lat, lon), side_m, points, seed, index, &out),
        Action::Contains {
            territory,
            lat,
            lon,
        } => {
            let inside = contains(&cfg, &territory, GeoPoint::new(lat, lon))?;
            println!("{}", serde_json::json!({ "inside": inside }));
            Ok(())
        }
        Action::Poi {
            last_scavenged,
            now,
        } => {
            println!("{}", poi_status(&cfg, last_scavenged, now));
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<GameConfig> {
    let cfg = match path {
        Some(p) => GameConfig::from_file(p)?,
        None => GameConfig::default(),
    };
    cfg.validate()?;
    Ok(cfg)
}

/// Replay `track`, anchoring the loop on its first fix that passes the sample
/// filter; stops at the first committed loop.
fn capture(cfg: &GameConfig, track: &Path, owner: &str, out: &Path) -> Result<Territory> {
    let fixes = track::load_fixes(track)?;
    if fixes.is_empty() {
        bail!("track {} has no fixes", track.display());
    }
    tracing::info!(track = %track.display(), owner, fixes = fixes.len(), "capture");
    let params = serde_json::json!({
        "track": track.to_string_lossy(),
        "owner": owner,
        "config": cfg,
    });

    let mut engine = TerritoryCaptureEngine::new(cfg, owner);
    let mut summary = ReplaySummary::default();
    let mut remaining = fixes.iter();
    for fix in remaining.by_ref() {
        match engine.start_from_fix(*fix) {
            Ok(()) => break,
            Err(reason) => {
                tracing::debug!(%reason, t = fix.timestamp.secs(), "origin candidate skipped");
                summary.origin_skipped += 1;
            }
        }
    }
    if !engine.phase().is_active() {
        report::write_sidecar(out, params, serde_json::to_value(&summary)?)?;
        bail!(
            "no fix in {} qualifies as a capture origin ({} skipped)",
            track.display(),
            summary.origin_skipped
        );
    }

    let mut committed = None;
    for fix in remaining {
        let outcome = engine.push_fix(*fix);
        summary.record(&outcome);
        if let FixOutcome::LoopClosed { .. } = outcome {
            match engine.finalize() {
                Ok(t) => {
                    committed = Some(t);
                    break;
                }
                Err(reason) => summary.validation_failures.push(reason.to_string()),
            }
        }
    }
    summary.final_phase = engine.phase();
    tracing::info!(
        accepted = summary.accepted,
        closures = summary.closures,
        phase = ?summary.final_phase,
        "replay done"
    );

    let summary_json = serde_json::to_value(&summary)?;
    let Some(territory) = committed else {
        report::write_sidecar(out, params, summary_json)?;
        bail!(
            "no territory committed (final phase {:?}, {} closed loop(s) rejected)",
            summary.final_phase,
            summary.validation_failures.len()
        );
    };

    if let Some(parent) = out.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(out, serde_json::to_vec_pretty(&territory)?)
        .with_context(|| format!("writing {}", out.display()))?;
    let report_path = report::write_sidecar(out, params, summary_json)?;
    tracing::info!(
        out = %out.display(),
        report = %report_path.display(),
        area_m2 = territory.area_m2(),
        "territory written"
    );
    Ok(territory)
}

fn simulate(
    center: GeoPoint,
    side_m: f64,
    points: Option<usize>,
    seed: u64,
    index: u64,
    out: &Path,
) -> Result<()> {
    if !side_m.is_finite() || side_m <= 0.0 || side_m > MAX_SIDE_M {
        bail!("--side-m must be in (0, {MAX_SIDE_M}] metres, got {side_m}");
    }
    let mut cfg = TrackCfg::default();
    if let Some(n) = points {
        if !(3..=MAX_STEPS).contains(&n) {
            bail!("--points must be between 3 and {MAX_STEPS}, got {n}");
        }
        cfg.spacing_m = 4.0 * side_m / n as f64;
    }
    let fixes = square_loop(center, side_m, cfg, ReplayToken::new(seed, index));
    track::write_fixes(out, &fixes)?;
    tracing::info!(out = %out.display(), fixes = fixes.len(), seed, index, "simulate");
    Ok(())
}

fn contains(cfg: &GameConfig, territory: &Path, point: GeoPoint) -> Result<bool> {
    let raw = std::fs::read_to_string(territory)
        .with_context(|| format!("reading {}", territory.display()))?;
    let t: Territory = serde_json::from_str(&raw)
        .with_context(|| format!("parsing territory {}", territory.display()))?;
    PolygonFinalizer::new(cfg)
        .revalidate(&t)
        .with_context(|| format!("territory {} is not a valid claim", territory.display()))?;
    Ok(t.contains(point))
}

fn poi_status(cfg: &GameConfig, last_scavenged: Option<f64>, now: f64) -> serde_json::Value {
    let tracker = PoiCooldownTracker::new(cfg);
    let poi = Poi {
        last_scavenged_at: last_scavenged.map(Timestamp::from_secs),
        ..Poi::new(Default::default(), GeoPoint::new(0.0, 0.0))
    };
    let now = Timestamp::from_secs(now);
    serde_json::json!({
        "lootable": tracker.is_lootable(&poi, now),
        "respawn_remaining_s": tracker.respawn_remaining_s(&poi, now),
    })
}
