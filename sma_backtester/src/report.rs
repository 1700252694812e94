//! Result files written by the binary.

use crate::backtester::Backtester;
use crate::error::StateError;
use crate::optimizer::OptimizationResult;
use anyhow::Context;
use backtesting::{generate_json_report, generate_text_report};
use serde::Serialize;
use smalab::core::io::ensure_parent_dir;
use std::path::{Path, PathBuf};
use tracing::info;

/// One row of the optimisation overview table.
#[derive(Debug, Serialize)]
struct OverviewRow {
    short: usize,
    long: usize,
    performance: f64,
    outperformance: f64,
}

fn round6(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}

/// Write every grid point as `short,long,performance,outperformance`, in sweep order.
pub fn write_overview_csv<P: AsRef<Path>>(result: &OptimizationResult, path: P) -> anyhow::Result<()> {
    let path = path.as_ref();
    ensure_parent_dir(path)?;
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;

    for point in &result.grid {
        writer.serialize(OverviewRow {
            short: point.parameters.short,
            long: point.parameters.long,
            performance: round6(point.performance),
            outperformance: round6(point.outperformance),
        })?;
    }
    writer.flush()?;

    info!(path = %path.display(), rows = result.len(), "overview written");
    Ok(())
}

/// Write `metrics.txt` and `metrics.json` for the latest run into `dir`.
pub fn write_run_reports<P: AsRef<Path>>(backtester: &Backtester, dir: P) -> anyhow::Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let run = backtester
        .state()
        .last_run()
        .ok_or(StateError::NoResults)?;
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let text_path = dir.join("metrics.txt");
    let title = format!("{} | {}", backtester.config().table.symbol, run.parameters);
    generate_text_report(&title, &run.metrics, &text_path)?;

    let json_path = dir.join("metrics.json");
    generate_json_report(
        &serde_json::json!({
            "symbol": backtester.config().table.symbol,
            "parameters": run.parameters,
            "metrics": run.metrics,
        }),
        &json_path,
    )?;

    Ok(vec![text_path, json_path])
}
