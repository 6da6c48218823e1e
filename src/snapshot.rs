//! Snapshot text format
//!
//! The acquisition daemon rewrites its status file on every poll:
//!
//! ```text
//! [2024-06-01 14:03:27.412]
//! 4101:662
//! 4102:2019
//! --
//! ```
//!
//! The first line carries the local wall-clock time of the poll in square
//! brackets. Every further line is `register:value`; blank lines and lines
//! starting with `[` or `-` are skipped.

use crate::error::{ClassicError, Result};
use crate::registers::RegisterSnapshot;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::path::Path;
use tracing::debug;

const TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"];

/// Parse snapshot text; the header time is read as wall-clock time in `tz`
pub fn parse_snapshot(text: &str, tz: Tz) -> Result<RegisterSnapshot> {
    let mut lines = text.lines().enumerate();

    let header = lines
        .next()
        .map(|(_, l)| l.trim())
        .ok_or_else(|| ClassicError::snapshot(1, "empty snapshot"))?;
    let timestamp = parse_header(header, tz)?;

    let mut registers = Vec::new();
    for (i, raw) in lines {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('[') || line.starts_with('-') {
            continue;
        }
        registers.push(parse_register_line(line, i + 1)?);
    }

    debug!(
        "Parsed snapshot taken at {} with {} registers",
        timestamp,
        registers.len()
    );
    Ok(RegisterSnapshot::new(timestamp, registers))
}

/// Read and parse a snapshot file
pub fn read_snapshot_file<P: AsRef<Path>>(path: P, tz: Tz) -> Result<RegisterSnapshot> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| {
        ClassicError::io(format!(
            "Failed to read data file {}: {}",
            path.display(),
            e
        ))
    })?;
    parse_snapshot(&text, tz)
}

fn parse_header(line: &str, tz: Tz) -> Result<DateTime<Utc>> {
    let inner = line
        .strip_prefix('[')
        .and_then(|l| l.strip_suffix(']'))
        .map(str::trim)
        .ok_or_else(|| ClassicError::snapshot(1, "missing or invalid date/time"))?;

    let naive = TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(inner, fmt).ok())
        .ok_or_else(|| ClassicError::snapshot(1, format!("unrecognised timestamp '{}'", inner)))?;

    // On a DST fold take the earlier instant; in a gap there is no such local time
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| {
            ClassicError::snapshot(1, format!("'{}' does not exist in {}", inner, tz.name()))
        })
}

fn parse_register_line(line: &str, line_no: usize) -> Result<(u16, u16)> {
    let (register, value) = line
        .split_once(':')
        .ok_or_else(|| ClassicError::snapshot(line_no, format!("expected register:value, got '{}'", line)))?;

    let register = register.trim().parse::<u16>().map_err(|e| {
        ClassicError::snapshot(line_no, format!("invalid register '{}': {}", register.trim(), e))
    })?;
    let value = value.trim().parse::<u16>().map_err(|e| {
        ClassicError::snapshot(line_no, format!("invalid value for register {}: {}", register, e))
    })?;
    Ok((register, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "[2024-06-01 14:03:27.412]\n4101:662\n4102:2019\n\n--\n4373:87\n";

    #[test]
    fn test_parse_sample() {
        let snap = parse_snapshot(SAMPLE, Tz::UTC).unwrap();
        assert_eq!(snap.len(), 3);
        assert_eq!(snap.get_raw(4101).unwrap(), 662);
        assert_eq!(snap.get_raw(4373).unwrap(), 87);
        assert_eq!(
            snap.timestamp(),
            Utc.with_ymd_and_hms(2024, 6, 1, 14, 3, 27).unwrap()
                + chrono::Duration::milliseconds(412)
        );
    }

    #[test]
    fn test_header_without_fraction_in_local_zone() {
        let snap = parse_snapshot("[2024-01-15 08:00:00]\n", chrono_tz::Europe::Amsterdam).unwrap();
        assert_eq!(
            snap.timestamp(),
            Utc.with_ymd_and_hms(2024, 1, 15, 7, 0, 0).unwrap()
        );
        assert!(snap.is_empty());
    }

    #[test]
    fn test_rejects_missing_header() {
        let err = parse_snapshot("4101:662\n", Tz::UTC).unwrap_err();
        assert!(matches!(err, ClassicError::Snapshot { line: 1, .. }));
        assert!(parse_snapshot("", Tz::UTC).is_err());
    }

    #[test]
    fn test_reports_line_of_bad_entry() {
        let err = parse_snapshot("[2024-06-01 14:03:27]\n4101:662\n4102:x\n", Tz::UTC).unwrap_err();
        assert!(matches!(err, ClassicError::Snapshot { line: 3, .. }));

        let err = parse_snapshot("[2024-06-01 14:03:27]\n4101:70000\n", Tz::UTC).unwrap_err();
        assert!(matches!(err, ClassicError::Snapshot { line: 2, .. }));

        let err = parse_snapshot("[2024-06-01 14:03:27]\n4101 662\n", Tz::UTC).unwrap_err();
        assert!(matches!(err, ClassicError::Snapshot { line: 2, .. }));
    }

    #[test]
    fn test_tolerates_crlf() {
        let snap = parse_snapshot("[2024-06-01 14:03:27.000]\r\n4101:662\r\n", Tz::UTC).unwrap();
        assert_eq!(snap.get_raw(4101).unwrap(), 662);
    }
}
