use crate::error::{Result, TixError};
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stop-field literal marking an entry that is still running.
pub const OPEN_PLACEHOLDER: &str = "????-??-?? ??:??:??";

/// Second-precision stamp used throughout the work log.
pub const STAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Entries below this span are merge candidates (an accidentally split
/// short interruption).
pub const MERGE_THRESHOLD_MIN: f64 = 15.0;

// ---------------------------------------------------------------------------
// WorkEntry
// ---------------------------------------------------------------------------

/// One contiguous recorded interval of work time, optionally still open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkEntry {
    pub code: String,
    pub start: NaiveDateTime,
    pub stop: Option<NaiveDateTime>,
    #[serde(default)]
    pub text: String,
}

impl WorkEntry {
    pub fn open(code: impl Into<String>, start: NaiveDateTime) -> Self {
        Self {
            code: code.into(),
            start,
            stop: None,
            text: String::new(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.stop.is_none()
    }

    pub fn date(&self) -> NaiveDate {
        self.start.date()
    }

    // -----------------------------------------------------------------------
    // Line encoding
    // -----------------------------------------------------------------------

    /// One-line encoding: `<start> - <stop-or-placeholder> <text>`. The
    /// ticket code is implied by the record the line lives in.
    pub fn to_line(&self) -> String {
        let stop = match self.stop {
            Some(t) => t.format(STAMP_FORMAT).to_string(),
            None => OPEN_PLACEHOLDER.to_string(),
        };
        let start = self.start.format(STAMP_FORMAT);
        if self.text.is_empty() {
            format!("{start} - {stop}")
        } else {
            format!("{start} - {stop} {}", self.text)
        }
    }

    pub fn parse_line(code: &str, line: &str) -> Result<Self> {
        let malformed = || TixError::InvalidTime(line.to_string());
        if line.get(19..22) != Some(" - ") {
            return Err(malformed());
        }
        let start_str = line.get(0..19).ok_or_else(malformed)?;
        let start =
            NaiveDateTime::parse_from_str(start_str, STAMP_FORMAT).map_err(|_| malformed())?;
        let stop_str = line.get(22..41).ok_or_else(malformed)?;
        let stop = if stop_str == OPEN_PLACEHOLDER {
            None
        } else {
            Some(NaiveDateTime::parse_from_str(stop_str, STAMP_FORMAT).map_err(|_| malformed())?)
        };
        let text = line.get(42..).unwrap_or("").to_string();
        Ok(Self {
            code: code.to_string(),
            start,
            stop,
            text,
        })
    }

    // -----------------------------------------------------------------------
    // Durations
    // -----------------------------------------------------------------------

    /// Elapsed seconds. Open entries measure against the wall clock, so
    /// repeated calls keep growing; this is the live elapsed-time display
    /// and is deliberately not memoized.
    pub fn seconds(&self) -> f64 {
        self.seconds_at(Local::now().naive_local())
    }

    pub fn seconds_at(&self, now: NaiveDateTime) -> f64 {
        let end = self.stop.unwrap_or(now);
        (end - self.start).num_seconds() as f64
    }

    pub fn minutes(&self) -> f64 {
        self.seconds() / 60.0
    }

    pub fn minutes_at(&self, now: NaiveDateTime) -> f64 {
        self.seconds_at(now) / 60.0
    }

    /// Human readable period length, e.g. `1h 5min`.
    pub fn human(&self) -> String {
        let mut m = self.minutes();
        let mut ret = String::new();
        if m >= 60.0 {
            let h = (m / 60.0) as u64;
            ret.push_str(&format!("{h}h "));
            m -= 60.0 * h as f64;
        }
        ret.push_str(&format!("{}min", m as u64));
        ret
    }

    // -----------------------------------------------------------------------
    // Merging
    // -----------------------------------------------------------------------

    /// Two entries can merge when they belong to the same ticket on the same
    /// calendar date and at least one of them is shorter than the merge
    /// threshold.
    pub fn can_merge(&self, other: &WorkEntry) -> bool {
        self.code == other.code
            && self.date() == other.date()
            && (self.minutes() < MERGE_THRESHOLD_MIN || other.minutes() < MERGE_THRESHOLD_MIN)
    }

    /// One entry spanning both source entries. Open if either was open; text
    /// is the space-joined concatenation of the non-empty texts.
    pub fn merge(&self, other: &WorkEntry) -> WorkEntry {
        let start = self.start.min(other.start);
        let stop = match (self.stop, other.stop) {
            (Some(a), Some(b)) => Some(a.max(b)),
            _ => None,
        };
        let text = [self.text.as_str(), other.text.as_str()]
            .iter()
            .filter(|t| !t.is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join(" ");
        WorkEntry {
            code: self.code.clone(),
            start,
            stop,
            text,
        }
    }
}

impl fmt::Display for WorkEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_line())
    }
}

// ---------------------------------------------------------------------------
// Timestamp input parsing
// ---------------------------------------------------------------------------

/// Parse user-supplied timing input: bare `HH:MM` or `HH:MM:SS` anchored to
/// `today`, or a full `YYYY-MM-DD HH:MM:SS` stamp.
pub fn parse_stamp(input: &str, today: NaiveDate) -> Result<NaiveDateTime> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(input, STAMP_FORMAT) {
        return Ok(dt);
    }
    if let Ok(t) = NaiveTime::parse_from_str(input, "%H:%M:%S") {
        return Ok(today.and_time(t));
    }
    if let Ok(t) = NaiveTime::parse_from_str(input, "%H:%M") {
        return Ok(today.and_time(t));
    }
    Err(TixError::InvalidTime(input.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn stamp(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, STAMP_FORMAT).unwrap()
    }

    fn closed(code: &str, start: &str, stop: &str, text: &str) -> WorkEntry {
        WorkEntry {
            code: code.to_string(),
            start: stamp(start),
            stop: Some(stamp(stop)),
            text: text.to_string(),
        }
    }

    #[test]
    fn line_roundtrip_closed() {
        let entry = closed("1234", "2026-08-31 09:00:00", "2026-08-31 09:40:00", "tests");
        let line = entry.to_line();
        assert_eq!(line, "2026-08-31 09:00:00 - 2026-08-31 09:40:00 tests");
        let parsed = WorkEntry::parse_line("1234", &line).unwrap();
        assert_eq!(parsed, entry);
    }

    #[test]
    fn line_roundtrip_open() {
        let entry = WorkEntry::open("1234", stamp("2026-08-31 09:00:00"));
        let line = entry.to_line();
        assert_eq!(line, "2026-08-31 09:00:00 - ????-??-?? ??:??:??");
        let parsed = WorkEntry::parse_line("1234", &line).unwrap();
        assert_eq!(parsed, entry);
    }

    #[test]
    fn line_roundtrip_open_with_text() {
        let mut entry = WorkEntry::open("1234", stamp("2026-08-31 09:00:00"));
        entry.text = "debugging flaky build".to_string();
        let parsed = WorkEntry::parse_line("1234", &entry.to_line()).unwrap();
        assert_eq!(parsed, entry);
    }

    #[test]
    fn malformed_line_rejected() {
        assert!(WorkEntry::parse_line("1", "not a work entry").is_err());
        assert!(WorkEntry::parse_line("1", "2026-08-31 09:00:00").is_err());
        assert!(WorkEntry::parse_line("1", "2026-13-99 09:00:00 - ????-??-?? ??:??:??").is_err());
    }

    #[test]
    fn closed_duration() {
        let entry = closed("1", "2026-08-31 09:00:00", "2026-08-31 09:10:00", "");
        assert_eq!(entry.seconds(), 600.0);
        assert_eq!(entry.minutes(), 10.0);
    }

    #[test]
    fn open_duration_measures_against_now() {
        let entry = WorkEntry::open("1", stamp("2026-08-31 09:00:00"));
        let now = stamp("2026-08-31 10:30:00");
        assert_eq!(entry.minutes_at(now), 90.0);
        let later = stamp("2026-08-31 10:31:00");
        assert_eq!(entry.minutes_at(later), 91.0);
    }

    #[test]
    fn human_rendering() {
        let short = closed("1", "2026-08-31 09:00:00", "2026-08-31 09:10:00", "");
        assert_eq!(short.human(), "10min");
        let long = closed("1", "2026-08-31 09:00:00", "2026-08-31 10:05:00", "");
        assert_eq!(long.human(), "1h 5min");
    }

    #[test]
    fn merge_adjacent_short_entries() {
        let a = closed("1", "2026-08-31 09:00:00", "2026-08-31 09:10:00", "fix bug");
        let b = closed("1", "2026-08-31 09:10:00", "2026-08-31 09:40:00", "tests");
        assert!(a.can_merge(&b));
        let merged = a.merge(&b);
        assert_eq!(merged.start, stamp("2026-08-31 09:00:00"));
        assert_eq!(merged.stop, Some(stamp("2026-08-31 09:40:00")));
        assert_eq!(merged.text, "fix bug tests");
    }

    #[test]
    fn merge_keeps_open_end() {
        let a = closed("1", "2026-08-31 09:00:00", "2026-08-31 09:05:00", "");
        let b = WorkEntry::open("1", stamp("2026-08-31 09:05:00"));
        assert!(a.merge(&b).is_open());
    }

    #[test]
    fn cannot_merge_across_tickets_or_days() {
        let a = closed("1", "2026-08-31 09:00:00", "2026-08-31 09:10:00", "");
        let b = closed("2", "2026-08-31 09:10:00", "2026-08-31 09:20:00", "");
        assert!(!a.can_merge(&b));
        let c = closed("1", "2026-09-01 09:10:00", "2026-09-01 09:20:00", "");
        assert!(!a.can_merge(&c));
    }

    #[test]
    fn long_entries_do_not_merge() {
        let a = closed("1", "2026-08-31 08:00:00", "2026-08-31 09:00:00", "");
        let b = closed("1", "2026-08-31 09:00:00", "2026-08-31 10:00:00", "");
        assert!(!a.can_merge(&b));
    }

    #[test]
    fn parse_stamp_forms() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 31).unwrap();
        assert_eq!(
            parse_stamp("09:15", today).unwrap(),
            stamp("2026-08-31 09:15:00")
        );
        assert_eq!(
            parse_stamp("9:15", today).unwrap(),
            stamp("2026-08-31 09:15:00")
        );
        assert_eq!(
            parse_stamp("09:15:30", today).unwrap(),
            stamp("2026-08-31 09:15:30")
        );
        assert_eq!(
            parse_stamp("2026-01-02 03:04:05", today).unwrap(),
            stamp("2026-01-02 03:04:05")
        );
    }

    #[test]
    fn parse_stamp_rejects_garbage() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 31).unwrap();
        for bad in ["", "noon", "25:99", "2026-01-02"] {
            assert!(
                matches!(parse_stamp(bad, today), Err(TixError::InvalidTime(_))),
                "expected invalid: {bad}"
            );
        }
    }
}
