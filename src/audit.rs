use crate::{
    config::{Config, Period},
    discover,
    probe::DurationProbe,
    report::{ErrorDetail, RecordingFile, Report, ReportResult, TimeError, UnprocessableFile},
    timestamp,
};
use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info, warn};

/// Builds coverage reports by probing every recording of a period's day.
pub struct Auditor<P: DurationProbe> {
    cfg: Config,
    probe: P,
}

enum FileOutcome {
    Complete(RecordingFile),
    Short(RecordingFile, ErrorDetail),
}

impl<P: DurationProbe> Auditor<P> {
    pub fn new(cfg: &Config, probe: P) -> Self {
        Self {
            cfg: cfg.clone(),
            probe,
        }
    }

    pub fn audit_period(&self, period: &Period) -> Result<Report> {
        let dir = period.source_dir(&self.cfg);
        self.generate_report(&period.start, &period.end, Path::new(dir))
    }

    /// Audits the calendar day of `start_date` against the files in `dir`.
    ///
    /// Per-file failures land in `unprocessable_file` unless `global.strict`
    /// is set, in which case the first one aborts the report.
    pub fn generate_report(&self, start_date: &str, end_date: &str, dir: &Path) -> Result<Report> {
        let (start_date, end_date) = (start_date.trim(), end_date.trim());
        let start = timestamp::parse_period(start_date)?;
        timestamp::parse_period(end_date)?;
        let day = timestamp::format_date(start.date())?;

        let files = discover::list_recordings(dir, &day, &self.cfg.audit.extension)?;
        info!("auditing {day}: {} recordings in {}", files.len(), dir.display());

        let mut recording_file = Vec::with_capacity(files.len());
        let mut error = Vec::new();
        let mut unprocessable_file = Vec::new();

        for filename in files {
            match self.inspect(dir, &filename) {
                Ok(FileOutcome::Complete(rec)) => recording_file.push(rec),
                Ok(FileOutcome::Short(rec, detail)) => {
                    recording_file.push(rec);
                    error.push(detail);
                }
                Err(err) if !self.cfg.global.strict => {
                    warn!("unprocessable recording {filename}: {err:#}");
                    unprocessable_file.push(UnprocessableFile {
                        filename,
                        reason: format!("{err:#}"),
                    });
                }
                Err(err) => return Err(err.context(format!("auditing {filename}"))),
            }
        }

        let result =
            ReportResult::aggregate(&self.cfg.audit, recording_file, error, unprocessable_file);
        info!(
            "period {start_date}: recordings={} errors={} unprocessable={} record={:.2}% error={:.2}%",
            result.total_recording,
            result.total_error,
            result.unprocessable_file.len(),
            result.record_percentage,
            result.error_percentage
        );

        Ok(Report {
            start_time: start_date.to_string(),
            end_time: end_date.to_string(),
            result,
        })
    }

    fn inspect(&self, dir: &Path, filename: &str) -> Result<FileOutcome> {
        let duration = self
            .probe
            .duration_seconds(&dir.join(filename))
            .with_context(|| "measuring duration")?;
        debug!("{filename} duration={duration}s");

        let rec = RecordingFile {
            duration,
            filename: filename.to_string(),
        };
        if duration >= self.cfg.audit.error_threshold_seconds {
            return Ok(FileOutcome::Complete(rec));
        }

        let started = timestamp::parse_filename_start(filename)?;
        let ended = timestamp::add_seconds(started, duration)?;
        let detail = ErrorDetail {
            duration,
            filename: filename.to_string(),
            time_error: TimeError {
                end_time: timestamp::format_period(ended)?,
                start_time: timestamp::format_period(started)?,
            },
        };
        Ok(FileOutcome::Short(rec, detail))
    }
}
