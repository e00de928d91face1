//! Fix tracks on disk: CSV or Parquet with columns `t,lat,lon,accuracy_m[,speed_mps]`.

use anyhow::{Context, Result};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use territory::{GeoPoint, LocationFix, Timestamp};

const REQUIRED: [&str; 4] = ["t", "lat", "lon", "accuracy_m"];
const SPEED: &str = "speed_mps";

fn is_parquet(path: &Path) -> bool {
    path.extension().is_some_and(|e| e.eq_ignore_ascii_case("parquet"))
}

fn scan(path: &Path) -> Result<LazyFrame> {
    let lf = if is_parquet(path) {
        LazyFrame::scan_parquet(path, ScanArgsParquet::default())?
    } else {
        LazyCsvReader::new(path)
            .with_has_header(true)
            .with_infer_schema_length(Some(100))
            .finish()?
    };
    Ok(lf)
}

fn float_column(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let s = df
        .column(name)
        .with_context(|| format!("track is missing column `{name}`"))?
        .cast(&DataType::Float64)?;
    // Nulls become NaN so the engine screens them out as malformed.
    Ok(s.f64()?.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
}

/// Load a track in file order. Rows are not sorted; out-of-order rows reach the
/// engine as-is.
pub fn load_fixes(path: &Path) -> Result<Vec<LocationFix>> {
    let df = scan(path)?
        .collect()
        .with_context(|| format!("reading track {}", path.display()))?;
    let [t, lat, lon, acc] = REQUIRED.map(|c| float_column(&df, c));
    let (t, lat, lon, acc) = (t?, lat?, lon?, acc?);
    let speed = match df.column(SPEED) {
        Ok(_) => Some(float_column(&df, SPEED)?),
        Err(_) => None,
    };
    tracing::info!(rows = df.height(), speed = speed.is_some(), "track loaded");

    let fixes = (0..df.height())
        .map(|i| {
            let fix = LocationFix::new(
                GeoPoint::new(lat[i], lon[i]),
                acc[i],
                Timestamp::from_secs(t[i]),
            );
            match speed.as_ref().map(|s| s[i]) {
                Some(v) if !v.is_nan() => fix.with_speed(v),
                _ => fix,
            }
        })
        .collect();
    Ok(fixes)
}

/// Write fixes to CSV, or Parquet when `path` ends in `.parquet`.
pub fn write_fixes(path: &Path, fixes: &[LocationFix]) -> Result<()> {
    let mut df = df!(
        "t" => fixes.iter().map(|f| f.timestamp.secs()).collect::<Vec<_>>(),
        "lat" => fixes.iter().map(|f| f.point.latitude).collect::<Vec<_>>(),
        "lon" => fixes.iter().map(|f| f.point.longitude).collect::<Vec<_>>(),
        "accuracy_m" => fixes.iter().map(|f| f.horizontal_accuracy_m).collect::<Vec<_>>(),
        SPEED => fixes.iter().map(|f| f.speed_mps).collect::<Vec<_>>(),
    )?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut file =
        File::create(path).with_context(|| format!("creating {}", path.display()))?;
    if is_parquet(path) {
        ParquetWriter::new(&mut file).finish(&mut df)?;
    } else {
        CsvWriter::new(&mut file).include_header(true).finish(&mut df)?;
    }
    Ok(())
}
