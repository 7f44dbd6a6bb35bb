use crate::{report::Report, util::ensure_dir};
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub fn report_path(report_dir: &Path, report: &Report) -> PathBuf {
    report_dir.join(format!("report_{}.json", report.start_time))
}

/// JSON with four-space indentation, the layout existing reports use.
pub fn to_json(report: &Report) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let fmt = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, fmt);
    report
        .serialize(&mut ser)
        .with_context(|| "serializing report")?;
    Ok(buf)
}

/// Writes `report_<start_time>.json` under `report_dir`, replacing any
/// earlier report for the same period.
pub fn export(report: &Report, report_dir: &Path) -> Result<PathBuf> {
    let bytes = to_json(report)?;
    ensure_dir(report_dir)?;

    let path = report_path(report_dir, report);
    if path.exists() {
        debug!("removing existing report {}", path.display());
        std::fs::remove_file(&path)
            .with_context(|| format!("removing existing report: {}", path.display()))?;
    }

    std::fs::write(&path, bytes).with_context(|| format!("writing report: {}", path.display()))?;
    info!("report saved: {}", path.display());
    Ok(path)
}
