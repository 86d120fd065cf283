use crate::error::{Result, TixError};
use crate::store::TicketStore;
use crate::ticket::Ticket;
use crate::work::WorkEntry;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

// ---------------------------------------------------------------------------
// Per-ticket log operations
// ---------------------------------------------------------------------------

impl Ticket {
    /// Start timing work on this ticket. The switch protocol guarantees no
    /// other entry is running; this method does not re-check.
    pub fn work_timing_on(&mut self, start: NaiveDateTime) {
        debug!(code = %self.code, %start, "work timer on");
        self.work.push(WorkEntry::open(&self.code, start));
    }

    /// Stop timing work. The last entry must still be open.
    pub fn work_timing_off(&mut self, stop: NaiveDateTime) -> Result<()> {
        match self.work.last_mut() {
            Some(entry) if entry.is_open() => {
                debug!(code = %self.code, %stop, "work timer off");
                entry.stop = Some(stop);
                Ok(())
            }
            _ => Err(TixError::NoOpenEntry),
        }
    }

    /// Append text to the latest entry, space-joined with what is there.
    pub fn comment_latest(&mut self, text: &str) -> Result<()> {
        let text = text.trim();
        if text.is_empty() {
            return Err(TixError::EmptyComment);
        }
        let entry = self.work.last_mut().ok_or(TixError::NoEntries)?;
        if entry.text.is_empty() {
            entry.text = text.to_string();
        } else {
            entry.text.push(' ');
            entry.text.push_str(text);
        }
        Ok(())
    }

    /// Replace the two most recent entries with their merge.
    pub fn merge_latest_two(&mut self) -> Result<()> {
        if self.work.len() < 2 {
            return Err(TixError::NoEntries);
        }
        let b = self.work.remove(self.work.len() - 1);
        let a = self.work.remove(self.work.len() - 1);
        debug!(code = %self.code, "merging latest two work entries");
        self.work.push(a.merge(&b));
        Ok(())
    }

    /// Remove the most recent entry unconditionally (undo a mis-recorded
    /// interval).
    pub fn drop_latest(&mut self) -> Result<()> {
        if self.work.pop().is_none() {
            return Err(TixError::NoEntries);
        }
        Ok(())
    }

    /// Entries recorded on the given date.
    pub fn work_on_date(&self, date: NaiveDate) -> Vec<&WorkEntry> {
        self.work.iter().filter(|e| e.date() == date).collect()
    }
}

// ---------------------------------------------------------------------------
// Timeline
// ---------------------------------------------------------------------------

/// Cross-ticket view of all work entries, sorted by start. Recomputable
/// from the ticket store; cached to a file with an explicit load/flush
/// lifecycle tied to the calling command.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Timeline {
    pub entries: Vec<WorkEntry>,
}

impl Timeline {
    /// Rebuild the merged view by reading every ticket in the store.
    pub fn collect(store: &dyn TicketStore) -> Result<Self> {
        let mut entries = Vec::new();
        for code in store.codes()? {
            let ticket = Ticket::from_fields(&code, &store.load(&code)?)?;
            entries.extend(ticket.work);
        }
        entries.sort_by_key(|e| e.start);
        Ok(Self { entries })
    }

    /// Load the cached timeline, falling back to a rebuild (which is then
    /// flushed) when the cache file is missing.
    pub fn load_or_collect(path: &Path, store: &dyn TicketStore) -> Result<Self> {
        if path.exists() {
            let data = std::fs::read_to_string(path)?;
            return Ok(serde_yaml::from_str(&data)?);
        }
        debug!(path = %path.display(), "timeline cache missing, rebuilding from tickets");
        let timeline = Self::collect(store)?;
        timeline.flush(path)?;
        Ok(timeline)
    }

    pub fn flush(&self, path: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(path, data.as_bytes())
    }

    /// The most recent entry regardless of ticket.
    pub fn latest(&self) -> Option<&WorkEntry> {
        self.entries.last()
    }

    pub fn on_date(&self, date: NaiveDate) -> Vec<&WorkEntry> {
        self.entries.iter().filter(|e| e.date() == date).collect()
    }

    /// Total recorded time in fractional hours.
    pub fn total_hours(&self) -> f64 {
        self.entries.iter().map(|e| e.minutes() / 60.0).sum()
    }
}

// ---------------------------------------------------------------------------
// Switch protocol
// ---------------------------------------------------------------------------

/// What a context switch must do to the work log: optionally close the open
/// entry on some ticket, then open a new entry on the target.
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchPlan {
    /// `(code, stop)` for the entry to close, if one is open.
    pub close: Option<(String, NaiveDateTime)>,
    /// Start stamp for the new entry on the target ticket.
    pub open_at: NaiveDateTime,
}

/// Plan a context switch given the latest entry across all tickets.
///
/// An open entry from today closes at `now` and the new entry starts at the
/// same stamp, preserving continuity (on the same ticket this creates a
/// fresh zero-length-boundary split). An open entry from an earlier day is
/// a stale session: it closes at that day's `day_end` and the new entry
/// starts at today's `day_start`. A closed entry resumes at its stop time
/// when that was today, otherwise the new entry starts at `day_start`.
pub fn plan_switch(
    latest: Option<&WorkEntry>,
    now: NaiveDateTime,
    day_start: NaiveTime,
    day_end: NaiveTime,
) -> SwitchPlan {
    let today = now.date();
    match latest {
        Some(entry) => match entry.stop {
            None if entry.date() == today => SwitchPlan {
                close: Some((entry.code.clone(), now)),
                open_at: now,
            },
            None => SwitchPlan {
                close: Some((entry.code.clone(), entry.date().and_time(day_end))),
                open_at: today.and_time(day_start),
            },
            Some(stop) if stop.date() == today => SwitchPlan {
                close: None,
                open_at: stop,
            },
            Some(_) => SwitchPlan {
                close: None,
                open_at: today.and_time(day_start),
            },
        },
        None => SwitchPlan {
            close: None,
            open_at: now,
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
