use anyhow::{Context, Result};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, Duration, PrimitiveDateTime};

/// Period boundaries and error windows: `2024-01-09 10-00-00`.
pub const PERIOD_LAYOUT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]-[minute]-[second]");

/// Start stamp embedded in recording filenames: `2024-01-09T10-00-00`.
pub const FILENAME_LAYOUT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]-[minute]-[second]");

pub const DATE_LAYOUT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

pub fn parse_period(raw: &str) -> Result<PrimitiveDateTime> {
    PrimitiveDateTime::parse(raw.trim(), PERIOD_LAYOUT)
        .with_context(|| format!("invalid period timestamp (want YYYY-MM-DD HH-MM-SS): {raw:?}"))
}

pub fn format_period(ts: PrimitiveDateTime) -> Result<String> {
    ts.format(PERIOD_LAYOUT).with_context(|| "formatting timestamp")
}

pub fn format_date(date: Date) -> Result<String> {
    date.format(DATE_LAYOUT).with_context(|| "formatting date")
}

/// Parses the start time from everything before the first `.` of a filename.
pub fn parse_filename_start(filename: &str) -> Result<PrimitiveDateTime> {
    let stem = filename.split('.').next().unwrap_or(filename);
    PrimitiveDateTime::parse(stem, FILENAME_LAYOUT)
        .with_context(|| format!("filename has no leading YYYY-MM-DDTHH-MM-SS stamp: {filename}"))
}

pub fn add_seconds(ts: PrimitiveDateTime, seconds: i64) -> Result<PrimitiveDateTime> {
    ts.checked_add(Duration::seconds(seconds))
        .with_context(|| format!("timestamp overflow adding {seconds}s"))
}
