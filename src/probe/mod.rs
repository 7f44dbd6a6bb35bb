pub mod ffprobe;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub use ffprobe::Ffprobe;

/// Measures how long a recording runs.
pub trait DurationProbe {
    /// Whole seconds, truncated from the probe's fractional value.
    fn duration_seconds(&self, path: &Path) -> Result<i64>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeDiag {
    pub ffprobe_exe: String,
    pub version: Option<String>,
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// Parses ffprobe's bare `format=duration` output. Empty output means zero.
pub fn parse_duration_output(raw: &str) -> Result<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    let secs: f64 = trimmed
        .parse()
        .with_context(|| format!("probe output is not a duration: {trimmed:?}"))?;
    if !secs.is_finite() {
        anyhow::bail!("probe reported non-finite duration: {trimmed}");
    }
    Ok(secs.trunc() as i64)
}
