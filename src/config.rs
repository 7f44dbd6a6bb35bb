use crate::timestamp;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub global: Global,
    #[serde(default)]
    pub paths: Paths,
    #[serde(default)]
    pub audit: Audit,
    #[serde(default)]
    pub probe: Probe,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub periods: Vec<Period>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        let cfg: Config = toml::from_str(&raw).with_context(|| "parsing TOML")?;
        Ok(cfg)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Global {
    /// Abort the whole run on the first file that cannot be probed or parsed.
    pub strict: bool,
    pub print_summary: bool,
}
impl Default for Global {
    fn default() -> Self {
        Self {
            strict: false,
            print_summary: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Paths {
    pub source_dir: String,
    pub report_dir: String,
}
impl Default for Paths {
    fn default() -> Self {
        Self {
            source_dir: "record".into(),
            report_dir: "report".into(),
        }
    }
}

/// How `error_time` is derived for a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorTimeMode {
    /// Everything in the period not covered by a complete recording.
    Uncovered,
    /// Sum of the durations of under-threshold recordings.
    ErrorSum,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Audit {
    pub extension: String,
    pub error_threshold_seconds: i64,
    pub total_time_seconds: i64,
    pub error_time: ErrorTimeMode,
}
impl Default for Audit {
    fn default() -> Self {
        Self {
            extension: "mp4".into(),
            error_threshold_seconds: 300,
            total_time_seconds: 24 * 60 * 60,
            error_time: ErrorTimeMode::Uncovered,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Probe {
    pub ffprobe_exe: String,
    /// 0 waits for ffprobe indefinitely.
    pub timeout_seconds: u64,
}
impl Default for Probe {
    fn default() -> Self {
        Self {
            ffprobe_exe: "ffprobe".into(),
            timeout_seconds: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Logging {
    pub level: String,
    pub json: bool,
    pub write_to_file: bool,
    pub file_path: String,
}
impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
            write_to_file: false,
            file_path: "".into(),
        }
    }
}

/// One audited window. Timestamps use the `YYYY-MM-DD HH-MM-SS` layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub start: String,
    pub end: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_dir: Option<String>,
}

impl Period {
    /// A period beginning at `start`; without `end` it covers the following day.
    pub fn starting_at(start: &str, end: Option<&str>) -> Result<Self> {
        let start = start.trim();
        let end = match end {
            Some(end) => end.trim().to_string(),
            None => {
                let start_ts = timestamp::parse_period(start)?;
                timestamp::format_period(timestamp::add_seconds(start_ts, 24 * 60 * 60)?)?
            }
        };
        Ok(Self {
            start: start.to_string(),
            end,
            source_dir: None,
        })
    }

    pub fn source_dir<'a>(&'a self, cfg: &'a Config) -> &'a str {
        self.source_dir.as_deref().unwrap_or(&cfg.paths.source_dir)
    }
}
