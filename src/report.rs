use crate::config::{Audit, ErrorTimeMode};
use serde::{Deserialize, Serialize};

/// Coverage audit for one period. Field order matches the on-disk JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub start_time: String,
    pub end_time: String,
    pub result: ReportResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportResult {
    pub error_percentage: f64,
    pub error_time: i64,
    pub record_percentage: f64,
    pub record_time: i64,
    pub total_error: usize,
    pub total_recording: usize,
    pub total_time: i64,
    pub error: Vec<ErrorDetail>,
    pub recording_file: Vec<RecordingFile>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unprocessable_file: Vec<UnprocessableFile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub duration: i64,
    pub filename: String,
    pub time_error: TimeError,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeError {
    pub end_time: String,
    pub start_time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingFile {
    pub duration: i64,
    pub filename: String,
}

/// A matched file that could not be measured or placed in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnprocessableFile {
    pub filename: String,
    pub reason: String,
}

impl ReportResult {
    /// Aggregates per-file outcomes into period totals.
    ///
    /// `error_time + record_time == total_time` always holds; which side is
    /// summed from the files depends on `audit.error_time`.
    pub fn aggregate(
        audit: &Audit,
        recording_file: Vec<RecordingFile>,
        error: Vec<ErrorDetail>,
        unprocessable_file: Vec<UnprocessableFile>,
    ) -> Self {
        let total_time = audit.total_time_seconds;

        let (error_time, record_time) = match audit.error_time {
            ErrorTimeMode::Uncovered => {
                let record_time: i64 = recording_file
                    .iter()
                    .filter(|f| f.duration >= audit.error_threshold_seconds)
                    .map(|f| f.duration)
                    .sum();
                (total_time - record_time, record_time)
            }
            ErrorTimeMode::ErrorSum => {
                let error_time: i64 = error.iter().map(|e| e.duration).sum();
                (error_time, total_time - error_time)
            }
        };

        Self {
            error_percentage: percentage(error_time, total_time),
            error_time,
            record_percentage: percentage(record_time, total_time),
            record_time,
            total_error: error.len(),
            total_recording: recording_file.len(),
            total_time,
            error,
            recording_file,
            unprocessable_file,
        }
    }
}

fn percentage(part: i64, total: i64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    part as f64 / total as f64 * 100.0
}
