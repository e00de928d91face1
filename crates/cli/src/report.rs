use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fs;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::process::Command;
use territory::capture::{FixOutcome, Phase};

/// Per-verdict tally of one replayed track.
#[derive(Debug, Default, Serialize)]
pub struct ReplaySummary {
    /// Leading fixes that could not anchor a session.
    pub origin_skipped: usize,
    pub fixes: usize,
    pub accepted: usize,
    pub rejected: BTreeMap<&'static str, usize>,
    /// Fixes that arrived while no session was sampling.
    pub ignored: usize,
    pub closures: usize,
    /// Reasons of loops that closed but failed validation.
    pub validation_failures: Vec<String>,
    pub final_phase: Phase,
}

impl ReplaySummary {
    pub fn record(&mut self, outcome: &FixOutcome) {
        self.fixes += 1;
        match outcome {
            FixOutcome::Appended { .. } => self.accepted += 1,
            FixOutcome::LoopClosed { .. } => {
                self.accepted += 1;
                self.closures += 1;
            }
            FixOutcome::Rejected(reason) => {
                *self.rejected.entry(reason.kind()).or_default() += 1;
            }
            FixOutcome::Inactive => self.ignored += 1,
        }
    }
}

/// Write `<artifact>.report.json` containing the git commit, callsite, params and summary.
#[track_caller]
pub fn write_sidecar<P: AsRef<Path>>(
    artifact: P,
    params: Value,
    summary: Value,
) -> Result<PathBuf> {
    let artifact = artifact.as_ref();
    let report_path = artifact.with_extension("report.json");
    if let Some(parent) = report_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating report dir {}", parent.display()))?;
        }
    }

    let callsite = Location::caller();
    let doc = json!({
        "code_rev": code_rev(),
        "engine_version": territory::VERSION,
        "callsite": {
            "file": callsite.file(),
            "line": callsite.line()
        },
        "params": params,
        "summary": summary,
        "outputs": [artifact.to_string_lossy()]
    });
    fs::write(&report_path, serde_json::to_vec_pretty(&doc)?)
        .with_context(|| format!("writing {}", report_path.display()))?;
    Ok(report_path)
}

/// Commit the engine was built from: `GIT_COMMIT` at build or run time, else
/// the checkout's `HEAD`.
fn code_rev() -> String {
    option_env!("GIT_COMMIT")
        .map(str::to_owned)
        .or_else(|| std::env::var("GIT_COMMIT").ok())
        .filter(|rev| !rev.is_empty())
        .or_else(git_head)
        .unwrap_or_else(|| "unknown".to_owned())
}

fn git_head() -> Option<String> {
    let out = Command::new("git").args(["rev-parse", "HEAD"]).output().ok()?;
    if !out.status.success() {
        return None;
    }
    let rev = String::from_utf8(out.stdout).ok()?;
    Some(rev.trim().to_owned())
}
