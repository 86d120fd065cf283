use crate::cache::StatusCache;
use crate::config::Config;
use crate::error::{Result, TixError};
use crate::ledger::{plan_switch, Timeline};
use crate::paths;
use crate::provider::Providers;
use crate::status::StatusChange;
use crate::store::{DirStore, TicketStore};
use crate::ticket::Ticket;
use crate::work::WorkEntry;
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One project's ticket state rooted at a `.tix` directory: configuration,
/// the ticket store, resolved providers, and the external-status cache.
/// Commands construct one, run their operation, and drop it.
pub struct Workspace {
    root: PathBuf,
    pub config: Config,
    pub store: DirStore,
    pub providers: Providers,
    pub cache: StatusCache,
}

impl Workspace {
    /// Open an initialized workspace.
    pub fn open(root: &Path) -> Result<Self> {
        let config = Config::load(root)?;
        let providers = Providers::from_config(&config.providers)?;
        let cache = StatusCache::new(
            paths::cache_path(root),
            config.caching_time_min,
            config.offline_mode,
        );
        Ok(Self {
            root: root.to_path_buf(),
            config,
            store: DirStore::new(root),
            providers,
            cache,
        })
    }

    /// Create the `.tix` layout with a default configuration. Opening an
    /// already-initialized root is not an error; the existing configuration
    /// is kept.
    pub fn init(root: &Path) -> Result<Self> {
        crate::io::ensure_dir(&paths::tickets_dir(root))?;
        if !paths::config_path(root).exists() {
            info!(root = %root.display(), "initializing workspace");
            Config::default().save(root)?;
        }
        Self::open(root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // -----------------------------------------------------------------------
    // Tickets
    // -----------------------------------------------------------------------

    pub fn ticket(&self, code: &str) -> Result<Ticket> {
        Ticket::from_fields(code, &self.store.load(code)?)
    }

    pub fn save_ticket(&self, ticket: &Ticket) -> Result<()> {
        self.store.save(&ticket.code, &ticket.to_fields())
    }

    pub fn codes(&self) -> Result<Vec<String>> {
        self.store.codes()
    }

    pub fn create(&self, code: &str, title: &str) -> Result<Ticket> {
        paths::validate_code(code)?;
        if self.store.exists(code) {
            return Err(TixError::TicketExists(code.to_string()));
        }
        let ticket = Ticket::new(code, title);
        self.save_ticket(&ticket)?;
        info!(code, "created ticket");
        Ok(ticket)
    }

    pub fn set_status(&self, code: &str, change: StatusChange) -> Result<Ticket> {
        let mut ticket = self.ticket(code)?;
        ticket.set_status(change)?;
        self.save_ticket(&ticket)?;
        Ok(ticket)
    }

    /// Reconcile one ticket against its providers, persisting only when the
    /// pass changed something.
    pub fn refresh_ticket(&mut self, code: &str) -> Result<Ticket> {
        let mut ticket = self.ticket(code)?;
        if ticket.refresh(&self.providers, &mut self.cache)? {
            self.save_ticket(&ticket)?;
        }
        Ok(ticket)
    }

    /// Reconcile every non-finished ticket in the store.
    pub fn refresh_all(&mut self) -> Result<Vec<Ticket>> {
        let mut out = Vec::new();
        for code in self.codes()? {
            out.push(self.refresh_ticket(&code)?);
        }
        Ok(out)
    }

    // -----------------------------------------------------------------------
    // Work timing
    // -----------------------------------------------------------------------

    pub fn timeline(&self) -> Result<Timeline> {
        Timeline::load_or_collect(&paths::timeline_path(&self.root), &self.store)
    }

    fn rebuild_timeline(&self) -> Result<Timeline> {
        let timeline = Timeline::collect(&self.store)?;
        timeline.flush(&paths::timeline_path(&self.root))?;
        Ok(timeline)
    }

    /// Switch active work to `code`: close whatever entry is running and
    /// open a new one on the target, with start/stop stamps chosen by the
    /// switch protocol.
    pub fn switch_to(&self, code: &str, now: NaiveDateTime) -> Result<Ticket> {
        let timeline = self.timeline()?;
        let plan = plan_switch(
            timeline.latest(),
            now,
            self.config.day_start()?,
            self.config.day_end()?,
        );
        debug!(code, ?plan, "switching work");

        let mut target = self.ticket(code)?;
        if let Some((open_code, stop)) = plan.close {
            if open_code == code {
                target.work_timing_off(stop)?;
            } else {
                let mut other = self.ticket(&open_code)?;
                other.work_timing_off(stop)?;
                self.save_ticket(&other)?;
            }
        }
        target.work_timing_on(plan.open_at);
        self.save_ticket(&target)?;
        self.rebuild_timeline()?;
        Ok(target)
    }

    /// Stop the currently running entry, wherever it is.
    pub fn stop_work(&self, stop: NaiveDateTime) -> Result<Ticket> {
        let mut ticket = self.latest_work_ticket()?;
        ticket.work_timing_off(stop)?;
        self.save_ticket(&ticket)?;
        self.rebuild_timeline()?;
        Ok(ticket)
    }

    /// Attach text to the most recent entry across all tickets.
    pub fn comment_work(&self, text: &str) -> Result<Ticket> {
        let mut ticket = self.latest_work_ticket()?;
        ticket.comment_latest(text)?;
        self.save_ticket(&ticket)?;
        self.rebuild_timeline()?;
        Ok(ticket)
    }

    /// Merge the two most recent entries of the ticket that was last worked
    /// on.
    pub fn merge_work(&self) -> Result<Ticket> {
        let mut ticket = self.latest_work_ticket()?;
        ticket.merge_latest_two()?;
        self.save_ticket(&ticket)?;
        self.rebuild_timeline()?;
        Ok(ticket)
    }

    /// Discard the most recent entry of the ticket that was last worked on.
    pub fn drop_work(&self) -> Result<Ticket> {
        let mut ticket = self.latest_work_ticket()?;
        ticket.drop_latest()?;
        self.save_ticket(&ticket)?;
        self.rebuild_timeline()?;
        Ok(ticket)
    }

    fn latest_work_ticket(&self) -> Result<Ticket> {
        let timeline = self.timeline()?;
        let latest = timeline.latest().ok_or(TixError::NoEntries)?;
        self.ticket(&latest.code)
    }

    /// The most recent entry across all tickets, if any.
    pub fn latest_work(&self) -> Result<Option<WorkEntry>> {
        Ok(self.timeline()?.latest().cloned())
    }

    // -----------------------------------------------------------------------
    // Offline mode
    // -----------------------------------------------------------------------

    /// Toggle offline mode and persist the configuration. Takes effect for
    /// subsequent invocations; the current cache keeps its mode.
    pub fn set_offline(&mut self, offline: bool) -> Result<()> {
        self.config.offline_mode = offline;
        self.config.save(&self.root)?;
        info!(offline, "offline mode changed");
        Ok(())
    }
}

/// Fallback workspace root for tickets not tied to any repository.
pub fn default_root() -> Result<PathBuf> {
    home::home_dir().ok_or(TixError::HomeNotFound)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::Status;
    use crate::work::STAMP_FORMAT;
    use tempfile::TempDir;

    fn stamp(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, STAMP_FORMAT).unwrap()
    }

    fn ws(dir: &TempDir) -> Workspace {
        Workspace::init(dir.path()).unwrap()
    }

    #[test]
    fn init_then_open() {
        let dir = TempDir::new().unwrap();
        ws(&dir);
        let ws = Workspace::open(dir.path()).unwrap();
        assert_eq!(ws.config.base_branch, "master");
        assert!(ws.codes().unwrap().is_empty());
    }

    #[test]
    fn open_uninitialized_fails() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Workspace::open(dir.path()),
            Err(TixError::NotInitialized)
        ));
    }

    #[test]
    fn init_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let mut first = ws(&dir);
        first.set_offline(true).unwrap();
        let again = Workspace::init(dir.path()).unwrap();
        assert!(again.config.offline_mode);
    }

    #[test]
    fn create_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let ws = ws(&dir);
        ws.create("1234", "Fix login").unwrap();
        let loaded = ws.ticket("1234").unwrap();
        assert_eq!(loaded.title, "Fix login");
        assert_eq!(loaded.status, None);
    }

    #[test]
    fn create_duplicate_fails() {
        let dir = TempDir::new().unwrap();
        let ws = ws(&dir);
        ws.create("1234", "A").unwrap();
        assert!(matches!(
            ws.create("1234", "B"),
            Err(TixError::TicketExists(_))
        ));
    }

    #[test]
    fn set_status_persists() {
        let dir = TempDir::new().unwrap();
        let ws = ws(&dir);
        ws.create("1234", "A").unwrap();
        ws.set_status("1234", StatusChange::To(Status::Started))
            .unwrap();
        let loaded = ws.ticket("1234").unwrap();
        assert_eq!(loaded.status, Some(Status::Started));
        assert!(loaded.started.is_some());
    }

    #[test]
    fn refresh_all_advances_ready_tickets() {
        let dir = TempDir::new().unwrap();
        let mut ws = ws(&dir);
        let mut ticket = ws.create("1234", "A").unwrap();
        ticket.status = Some(Status::Ready);
        ws.save_ticket(&ticket).unwrap();

        // Default release gate is skippable, so Ready advances to Done.
        let refreshed = ws.refresh_all().unwrap();
        assert_eq!(refreshed[0].status, Some(Status::Done));
        assert_eq!(ws.ticket("1234").unwrap().status, Some(Status::Done));
    }

    #[test]
    fn switch_opens_and_closes_across_tickets() {
        let dir = TempDir::new().unwrap();
        let ws = ws(&dir);
        ws.create("100", "A").unwrap();
        ws.create("200", "B").unwrap();

        ws.switch_to("100", stamp("2026-08-31 09:00:00")).unwrap();
        let latest = ws.latest_work().unwrap().unwrap();
        assert_eq!(latest.code, "100");
        assert!(latest.is_open());

        ws.switch_to("200", stamp("2026-08-31 10:00:00")).unwrap();
        let a = ws.ticket("100").unwrap();
        assert_eq!(a.work[0].stop, Some(stamp("2026-08-31 10:00:00")));
        let latest = ws.latest_work().unwrap().unwrap();
        assert_eq!(latest.code, "200");
        assert_eq!(latest.start, stamp("2026-08-31 10:00:00"));
    }

    #[test]
    fn switch_to_same_ticket_splits_entry() {
        let dir = TempDir::new().unwrap();
        let ws = ws(&dir);
        ws.create("100", "A").unwrap();
        ws.switch_to("100", stamp("2026-08-31 09:00:00")).unwrap();
        ws.switch_to("100", stamp("2026-08-31 09:10:00")).unwrap();

        let ticket = ws.ticket("100").unwrap();
        assert_eq!(ticket.work.len(), 2);
        assert_eq!(ticket.work[0].stop, Some(stamp("2026-08-31 09:10:00")));
        assert!(ticket.work[1].is_open());
        assert!(ticket.work[0].can_merge(&ticket.work[1]));
    }

    #[test]
    fn stop_comment_merge_drop_flow() {
        let dir = TempDir::new().unwrap();
        let ws = ws(&dir);
        ws.create("100", "A").unwrap();

        ws.switch_to("100", stamp("2026-08-31 09:00:00")).unwrap();
        ws.comment_work("fix bug").unwrap();
        ws.stop_work(stamp("2026-08-31 09:10:00")).unwrap();

        ws.switch_to("100", stamp("2026-08-31 09:10:00")).unwrap();
        ws.comment_work("tests").unwrap();
        ws.stop_work(stamp("2026-08-31 09:40:00")).unwrap();

        let merged = ws.merge_work().unwrap();
        assert_eq!(merged.work.len(), 1);
        assert_eq!(merged.work[0].text, "fix bug tests");
        assert_eq!(merged.work[0].start, stamp("2026-08-31 09:00:00"));
        assert_eq!(merged.work[0].stop, Some(stamp("2026-08-31 09:40:00")));

        let dropped = ws.drop_work().unwrap();
        assert!(dropped.work.is_empty());
    }

    #[test]
    fn stop_without_running_entry_fails() {
        let dir = TempDir::new().unwrap();
        let ws = ws(&dir);
        ws.create("100", "A").unwrap();
        assert!(matches!(
            ws.stop_work(stamp("2026-08-31 09:00:00")),
            Err(TixError::NoEntries)
        ));
    }

    #[test]
    fn timeline_cache_tracks_mutations() {
        let dir = TempDir::new().unwrap();
        let ws = ws(&dir);
        ws.create("100", "A").unwrap();
        ws.switch_to("100", stamp("2026-08-31 09:00:00")).unwrap();
        ws.stop_work(stamp("2026-08-31 09:30:00")).unwrap();

        // A fresh workspace reads the flushed cache, not stale data.
        let reopened = Workspace::open(dir.path()).unwrap();
        let latest = reopened.latest_work().unwrap().unwrap();
        assert_eq!(latest.stop, Some(stamp("2026-08-31 09:30:00")));
    }

    #[test]
    fn offline_toggle_persists() {
        let dir = TempDir::new().unwrap();
        let mut ws = ws(&dir);
        ws.set_offline(true).unwrap();
        assert!(Workspace::open(dir.path()).unwrap().config.offline_mode);
    }
}
