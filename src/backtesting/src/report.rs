use crate::models::PerformanceMetrics;
use anyhow::Result;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Generate a text report
pub fn generate_text_report<P: AsRef<Path>>(
    title: &str,
    metrics: &PerformanceMetrics,
    path: P,
) -> Result<()> {
    let mut file = File::create(path)?;

    writeln!(file, "{}", title)?;
    writeln!(file, "{}", "=".repeat(title.len().max(15)))?;
    writeln!(file)?;

    writeln!(file, "Performance Metrics:")?;
    writeln!(file, "--------------------")?;
    writeln!(file, "{}", metrics)?;

    Ok(())
}

/// Generate a JSON report. NaN values are written as `null`.
pub fn generate_json_report<T: Serialize, P: AsRef<Path>>(value: &T, path: P) -> Result<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, value)?;
    Ok(())
}
