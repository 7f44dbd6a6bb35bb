use anyhow::{anyhow, Result};
use coverage_audit::{
    audit::Auditor,
    config::{Config, ErrorTimeMode, Period},
    probe::DurationProbe,
};
use std::collections::HashMap;
use std::path::Path;

struct FixedProbe(HashMap<String, i64>);

impl DurationProbe for FixedProbe {
    fn duration_seconds(&self, path: &Path) -> Result<i64> {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        self.0
            .get(name)
            .copied()
            .ok_or_else(|| anyhow!("moov atom not found"))
    }
}

fn recordings(files: &[(&str, i64)]) -> (tempfile::TempDir, FixedProbe) {
    let dir = tempfile::tempdir().unwrap();
    let mut durations = HashMap::new();
    for (name, secs) in files {
        std::fs::write(dir.path().join(name), b"").unwrap();
        if *secs >= 0 {
            durations.insert(name.to_string(), *secs);
        }
    }
    (dir, FixedProbe(durations))
}

const START: &str = "2024-01-09 00-00-00";
const END: &str = "2024-01-10 00-00-00";

#[test]
fn short_recording_is_an_error_with_time_window() {
    let (dir, probe) = recordings(&[("2024-01-09T10-00-00.001.mp4", 120)]);
    let cfg = Config::default();
    let report = Auditor::new(&cfg, probe)
        .generate_report(START, END, dir.path())
        .unwrap();

    let r = &report.result;
    assert_eq!(report.start_time, START);
    assert_eq!(report.end_time, END);
    assert_eq!(r.total_error, 1);
    assert_eq!(r.total_recording, 1);
    assert_eq!(r.error[0].duration, 120);
    assert_eq!(r.error[0].filename, "2024-01-09T10-00-00.001.mp4");
    assert_eq!(r.error[0].time_error.start_time, "2024-01-09 10-00-00");
    assert_eq!(r.error[0].time_error.end_time, "2024-01-09 10-02-00");
    assert_eq!(r.recording_file[0].duration, 120);
    assert_eq!(r.recording_file[0].filename, r.error[0].filename);
    assert!(r.error_time >= 120);
    assert_eq!(r.error_time + r.record_time, r.total_time);
}

#[test]
fn complete_recordings_are_not_errors() {
    let (dir, probe) = recordings(&[
        ("2024-01-09T00-00-00.001.mp4", 3600),
        ("2024-01-09T01-00-00.002.mp4", 300),
        ("2024-01-09T02-00-00.003.mp4", 299),
    ]);
    let cfg = Config::default();
    let r = Auditor::new(&cfg, probe)
        .generate_report(START, END, dir.path())
        .unwrap()
        .result;

    assert_eq!(r.total_recording, 3);
    assert_eq!(r.total_error, 1);
    assert_eq!(r.error[0].filename, "2024-01-09T02-00-00.003.mp4");
    assert_eq!(r.record_time, 3900);
    assert_eq!(r.error_time, 86400 - 3900);
    assert_eq!(r.total_time, 86400);
    assert!((r.error_percentage + r.record_percentage - 100.0).abs() < 1e-9);
}

#[test]
fn only_matching_day_and_extension_in_sorted_order() {
    let (dir, probe) = recordings(&[
        ("2024-01-09T12-00-00.002.mp4", 600),
        ("2024-01-09T08-00-00.001.mp4", 600),
        ("2024-01-10T08-00-00.001.mp4", 600),
        ("2024-01-09T09-00-00.001.mkv", 600),
        ("2024-01-09T09-00-00.001.mp4.part", 600),
    ]);
    let cfg = Config::default();
    let r = Auditor::new(&cfg, probe)
        .generate_report(START, END, dir.path())
        .unwrap()
        .result;

    let names: Vec<_> = r.recording_file.iter().map(|f| f.filename.as_str()).collect();
    assert_eq!(
        names,
        vec!["2024-01-09T08-00-00.001.mp4", "2024-01-09T12-00-00.002.mp4"]
    );
}

#[test]
fn empty_day_is_entirely_error_time() {
    let (dir, probe) = recordings(&[("2024-01-08T08-00-00.001.mp4", 600)]);
    let cfg = Config::default();
    let r = Auditor::new(&cfg, probe)
        .generate_report(START, END, dir.path())
        .unwrap()
        .result;

    assert_eq!(r.total_recording, 0);
    assert_eq!(r.total_error, 0);
    assert_eq!(r.record_time, 0);
    assert_eq!(r.error_time, r.total_time);
    assert_eq!(r.error_percentage, 100.0);
    assert!(r.error.is_empty());
    assert!(r.recording_file.is_empty());
}

#[test]
fn error_sum_mode_counts_only_short_recordings() {
    let (dir, probe) = recordings(&[
        ("2024-01-09T10-00-00.001.mp4", 120),
        ("2024-01-09T11-00-00.002.mp4", 3600),
    ]);
    let mut cfg = Config::default();
    cfg.audit.error_time = ErrorTimeMode::ErrorSum;
    let r = Auditor::new(&cfg, probe)
        .generate_report(START, END, dir.path())
        .unwrap()
        .result;

    assert_eq!(r.error_time, 120);
    assert_eq!(r.record_time, 86400 - 120);
    assert_eq!(r.error_time + r.record_time, r.total_time);
}

#[test]
fn error_window_crosses_midnight() {
    let (dir, probe) = recordings(&[("2024-01-09T23-59-00.001.mp4", 90)]);
    let cfg = Config::default();
    let r = Auditor::new(&cfg, probe)
        .generate_report(START, END, dir.path())
        .unwrap()
        .result;

    assert_eq!(r.error[0].time_error.start_time, "2024-01-09 23-59-00");
    assert_eq!(r.error[0].time_error.end_time, "2024-01-10 00-00-30");
}

#[test]
fn unprobeable_file_is_collected_not_fatal() {
    let (dir, probe) = recordings(&[
        ("2024-01-09T08-00-00.001.mp4", -1),
        ("2024-01-09T09-00-00.002.mp4", 600),
    ]);
    let cfg = Config::default();
    let r = Auditor::new(&cfg, probe)
        .generate_report(START, END, dir.path())
        .unwrap()
        .result;

    assert_eq!(r.total_recording, 1);
    assert_eq!(r.unprocessable_file.len(), 1);
    assert_eq!(r.unprocessable_file[0].filename, "2024-01-09T08-00-00.001.mp4");
    assert!(r.unprocessable_file[0].reason.contains("moov atom"));
}

#[test]
fn short_file_without_stamp_is_unprocessable() {
    let (dir, probe) = recordings(&[("cam-2024-01-09.mp4", 30)]);
    let cfg = Config::default();
    let r = Auditor::new(&cfg, probe)
        .generate_report(START, END, dir.path())
        .unwrap()
        .result;

    assert_eq!(r.total_error, 0);
    assert_eq!(r.unprocessable_file.len(), 1);
}

#[test]
fn strict_mode_aborts_on_first_failure() {
    let (dir, probe) = recordings(&[("2024-01-09T08-00-00.001.mp4", -1)]);
    let mut cfg = Config::default();
    cfg.global.strict = true;
    let err = Auditor::new(&cfg, probe)
        .generate_report(START, END, dir.path())
        .unwrap_err();
    assert!(format!("{err:#}").contains("2024-01-09T08-00-00.001.mp4"));
}

#[test]
fn missing_directory_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = Config::default();
    let probe = FixedProbe(HashMap::new());
    assert!(Auditor::new(&cfg, probe)
        .generate_report(START, END, &dir.path().join("absent"))
        .is_err());
}

#[test]
fn period_source_dir_overrides_default() {
    let (dir, probe) = recordings(&[("2024-01-09T08-00-00.001.mp4", 600)]);
    let cfg = Config::default();
    let period = Period {
        start: START.into(),
        end: END.into(),
        source_dir: Some(dir.path().display().to_string()),
    };
    let r = Auditor::new(&cfg, probe).audit_period(&period).unwrap().result;
    assert_eq!(r.total_recording, 1);
}

#[test]
fn padded_period_bounds_are_stored_trimmed() {
    let (dir, probe) = recordings(&[("2024-01-09T08-00-00.001.mp4", 600)]);
    let cfg = Config::default();
    let report = Auditor::new(&cfg, probe)
        .generate_report(" 2024-01-09 00-00-00", "2024-01-10 00-00-00 ", dir.path())
        .unwrap();

    assert_eq!(report.start_time, START);
    assert_eq!(report.end_time, END);
    let path = coverage_audit::export::report_path(dir.path(), &report);
    assert_eq!(
        path.file_name().and_then(|n| n.to_str()),
        Some("report_2024-01-09 00-00-00.json")
    );
}
