//! Shared naming, timestamp and formatting helpers.

use chrono::{DateTime, Local, NaiveDateTime, Timelike};
use std::path::Path;
use std::time::SystemTime;

/// Suffix appended to a held name to form its provenance stream file.
pub const LOG_STREAM_SUFFIX: &str = ".backup";

/// Deletion date format stored in every log record.
pub const DELETION_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Timestamp format used for held-name and archive suffixes.
pub const COMPACT_TIME_FORMAT: &str = "%Y%m%d%H%M%S";

/// File name prefix of archives produced by backup and clear.
pub const ARCHIVE_PREFIX: &str = "transh-back-";

/// Returns a user-safe, trimmed path string that can be used in logs and messages.
pub fn sanitize_user_path(path: &Path) -> String {
    path.display().to_string().trim().to_string()
}

/// Builds a namespaced filename: `<base>.<suffix>`.
pub fn build_unique_basename(file_name: &str, suffix: &str) -> String {
    let base = Path::new(file_name)
        .file_name()
        .and_then(|v| v.to_str())
        .unwrap_or("item");
    format!("{base}.{suffix}")
}

/// Truncates a wall-clock time to whole seconds in the local timezone.
pub fn local_seconds(time: SystemTime) -> NaiveDateTime {
    let dt = DateTime::<Local>::from(time).naive_local();
    dt.with_nanosecond(0).unwrap_or(dt)
}

/// Compact `YYYYmmddHHMMSS` rendering used in generated names.
pub fn compact_timestamp(time: SystemTime) -> String {
    local_seconds(time).format(COMPACT_TIME_FORMAT).to_string()
}

/// Archive file name for a backup taken at `time`. A non-zero `sequence`
/// distinguishes archives taken within the same second.
pub fn archive_file_name(time: SystemTime, sequence: u32) -> String {
    let stamp = compact_timestamp(time);
    match sequence {
        0 => format!("{ARCHIVE_PREFIX}{stamp}.tar.gz"),
        n => format!("{ARCHIVE_PREFIX}{stamp}.{n}.tar.gz"),
    }
}

/// Parses a deletion date as stored in log records.
pub fn parse_deletion_date(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, DELETION_DATE_FORMAT).ok()
}

/// Human readable size rendering for listings.
pub fn print_size(bytes: u64) -> String {
    const SUFFIXES: [&str; 5] = ["B", "K", "M", "G", "T"];
    let mut value = bytes as f64;
    let mut idx = 0usize;

    while value >= 1024.0 && idx < SUFFIXES.len() - 1 {
        value /= 1024.0;
        idx += 1;
    }

    if idx == 0 {
        format!("{:.0} {}", value, SUFFIXES[idx])
    } else {
        format!("{:.1} {}", value, SUFFIXES[idx])
    }
}

/// Treats `y`, `Y` and `yes` as consent; anything else, including empty input, declines.
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim(), "y" | "Y") || answer.trim().eq_ignore_ascii_case("yes")
}
