use crate::cache::StatusCache;
use crate::config::Config;
use crate::error::{Result, TixError};
use crate::provider::Providers;
use crate::status::{allowed_from, ExternalStatus, Status, StatusChange};
use crate::work::WorkEntry;
use chrono::{Local, NaiveDateTime, Timelike};
use tracing::debug;

/// Minute-precision stamp used for the `Started`/`Finished` fields.
pub const MINUTE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Officially supported record keys, in persistence order.
pub const ALL_KEYS: &[&str] = &[
    "Title",
    "Status",
    "Started",
    "Finished",
    "Base",
    "Branch",
    "URL",
    "Owner",
    "Build ID",
    "Build Result",
    "Build Info",
    "Review ID",
    "Review Result",
    "Review Info",
    "Tests",
    "Files",
    "Notes",
    "Work Log",
];

/// Ordered key/value pairs as exchanged with a `TicketStore`.
pub type FieldMap = Vec<(String, String)>;

// ---------------------------------------------------------------------------
// Ticket
// ---------------------------------------------------------------------------

/// A unit of work tracked by code, status, and metadata. Exclusively owned
/// by the caller that loaded it for the duration of one command invocation;
/// the persisted record is the source of truth between invocations.
#[derive(Debug, Clone, PartialEq)]
pub struct Ticket {
    pub code: String,
    pub title: String,
    pub status: Option<Status>,
    pub started: Option<NaiveDateTime>,
    pub finished: Option<NaiveDateTime>,
    pub base: Option<String>,
    pub branch: Option<String>,
    pub url: Option<String>,
    pub owner: Option<String>,
    pub build_id: Option<String>,
    pub build_result: Option<ExternalStatus>,
    pub build_info: Option<String>,
    pub review_id: Option<String>,
    pub review_result: Option<ExternalStatus>,
    pub review_info: Option<String>,
    pub tests: Vec<String>,
    pub files: Vec<String>,
    pub notes: Option<String>,
    pub work: Vec<WorkEntry>,
}

impl Ticket {
    pub fn new(code: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            title: title.into(),
            status: None,
            started: None,
            finished: None,
            base: None,
            branch: None,
            url: None,
            owner: None,
            build_id: None,
            build_result: None,
            build_info: None,
            review_id: None,
            review_result: None,
            review_info: None,
            tests: Vec::new(),
            files: Vec::new(),
            notes: None,
            work: Vec::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Status machine
    // -----------------------------------------------------------------------

    /// Verify and apply a status change. Pseudo-values resolve against the
    /// current status first; a resolved target equal to the current status
    /// is a silent no-op. Illegal transitions are rejected, never corrected.
    pub fn set_status(&mut self, change: StatusChange) -> Result<()> {
        let old = self.status;
        let target = change.resolve(old);
        if old == Some(target) {
            return Ok(());
        }
        if !allowed_from(old).contains(&target) {
            return Err(TixError::InvalidTransition {
                from: old.map_or_else(|| "None".to_string(), |s| s.to_string()),
                to: target.to_string(),
            });
        }
        debug!(code = %self.code, from = ?old, to = %target, "status change");
        self.status = Some(target);
        if target == Status::Started && self.started.is_none() {
            self.started = Some(minute_now());
        }
        if target == Status::Done {
            self.finished = Some(minute_now());
        }
        Ok(())
    }

    /// Whether this ticket counts as finished working.
    pub fn finished(&self) -> bool {
        self.status.is_some_and(Status::is_terminal)
    }

    // -----------------------------------------------------------------------
    // Reconciliation
    // -----------------------------------------------------------------------

    /// Reconcile local status against external build/review outcomes.
    ///
    /// A forward-chaining pass over ordered guards; each applied guard can
    /// enable the next. Idempotent: with no new external data a second pass
    /// applies nothing. Returns whether any guard mutated the ticket; the
    /// caller persists once at the end, so a provider error mid-pass aborts
    /// the whole pass without committing a partial write.
    pub fn refresh(&mut self, providers: &Providers, cache: &mut StatusCache) -> Result<bool> {
        if self.finished() {
            return Ok(false);
        }
        let mut dirty = false;

        // Poll outstanding build, rate-limited through the cache.
        if let Some(build_id) = self.build_id.clone() {
            if !self.build_result.is_some_and(ExternalStatus::is_settled) {
                let key = format!("build:{build_id}");
                let fetched =
                    cache.get_with(&key, || providers.build.status(self).map(|s| s.to_string()))?;
                if let Some(raw) = fetched {
                    let state: ExternalStatus = raw.parse()?;
                    if self.build_result != Some(state) {
                        debug!(code = %self.code, result = %state, "build result updated");
                        self.build_result = Some(state);
                        dirty = true;
                    }
                }
            }
        }

        // Poll outstanding review.
        if let Some(review_id) = self.review_id.clone() {
            if !self.review_result.is_some_and(ExternalStatus::is_settled) {
                let key = format!("review:{review_id}");
                let fetched = cache.get_with(&key, || {
                    providers.review.status(&review_id).map(|s| s.to_string())
                })?;
                if let Some(raw) = fetched {
                    let state: ExternalStatus = raw.parse()?;
                    if self.review_result != Some(state) {
                        debug!(code = %self.code, result = %state, "review result updated");
                        self.review_result = Some(state);
                        dirty = true;
                    }
                }
            }
        }

        // Collapse finished sub-processes out of composite statuses.
        if self.review_id.is_some()
            && self.review_result != Some(ExternalStatus::Pending)
            && self.status.is_some_and(Status::has_reviewing)
        {
            self.set_status(StatusChange::EndReviewing)?;
            dirty = true;
        }
        if self.build_id.is_some()
            && self.build_result != Some(ExternalStatus::Pending)
            && self.status.is_some_and(Status::has_building)
        {
            self.set_status(StatusChange::EndBuilding)?;
            dirty = true;
        }

        // Both axes green while still working: hand over to waiting.
        if self.status == Some(Status::Working)
            && self.build_result == Some(ExternalStatus::Success)
            && self.review_result == Some(ExternalStatus::Success)
        {
            self.set_status(StatusChange::To(Status::Waiting))?;
            dirty = true;
        }

        if self.status == Some(Status::Waiting) {
            if self.build_result == Some(ExternalStatus::Fail)
                || self.review_result == Some(ExternalStatus::Fail)
            {
                self.set_status(StatusChange::To(Status::Working))?;
                dirty = true;
            } else if self.build_result == Some(ExternalStatus::Success)
                && self.review_result == Some(ExternalStatus::Success)
            {
                self.set_status(StatusChange::To(Status::Ready))?;
                dirty = true;
            }
        }

        // Last so manual release flows are not short-circuited before
        // build/review settle.
        if self.status == Some(Status::Ready) && providers.release.can_be_skipped(self)? {
            self.set_status(StatusChange::To(Status::Done))?;
            dirty = true;
        }

        Ok(dirty)
    }

    // -----------------------------------------------------------------------
    // Branches
    // -----------------------------------------------------------------------

    /// The branch name, generated from the configured pattern if not set.
    pub fn branch_name(&self, cfg: &Config) -> String {
        if let Some(branch) = &self.branch {
            return branch.clone();
        }
        let user = cfg.user.as_deref().unwrap_or("dev");
        cfg.branch_naming
            .replace("%c", &self.code)
            .replace("%u", user)
            .replace("%t", &title_slug(&self.title))
    }

    /// The branch this ticket originates from.
    pub fn base_branch(&self, cfg: &Config) -> String {
        self.base
            .clone()
            .unwrap_or_else(|| cfg.base_branch.clone())
    }

    /// Short state summary including build/review results where relevant.
    pub fn flags(&self) -> String {
        let Some(status) = self.status else {
            return "-".to_string();
        };
        let mut ret = status.to_string();
        if status.is_terminal() || status == Status::Ready {
            return ret;
        }
        if self.build_id.is_some() {
            ret.push_str(&format!(" Build:{}", result_str(self.build_result)));
        }
        if self.review_id.is_some() {
            ret.push_str(&format!(" Review:{}", result_str(self.review_result)));
        }
        ret
    }

    // -----------------------------------------------------------------------
    // Record conversion
    // -----------------------------------------------------------------------

    /// Serialize to ordered key/value pairs, skipping absent fields. The key
    /// order follows `ALL_KEYS` for persistence compatibility.
    pub fn to_fields(&self) -> FieldMap {
        let mut out = FieldMap::new();
        let mut push = |key: &str, value: Option<String>| {
            if let Some(v) = value {
                if !v.is_empty() {
                    out.push((key.to_string(), v));
                }
            }
        };
        push("Title", Some(self.title.clone()));
        push("Status", self.status.map(|s| s.to_string()));
        push("Started", self.started.map(fmt_minute));
        push("Finished", self.finished.map(fmt_minute));
        push("Base", self.base.clone());
        push("Branch", self.branch.clone());
        push("URL", self.url.clone());
        push("Owner", self.owner.clone());
        push("Build ID", self.build_id.clone());
        push("Build Result", self.build_result.map(|r| r.to_string()));
        push("Build Info", self.build_info.clone());
        push("Review ID", self.review_id.clone());
        push("Review Result", self.review_result.map(|r| r.to_string()));
        push("Review Info", self.review_info.clone());
        push("Tests", join_lines(&self.tests));
        push("Files", join_lines(&self.files));
        push("Notes", self.notes.clone());
        push(
            "Work Log",
            join_lines(&self.work.iter().map(WorkEntry::to_line).collect::<Vec<_>>()),
        );
        out
    }

    /// Rebuild a ticket from a persisted field map. Unknown keys are
    /// ignored; malformed values in known keys are errors.
    pub fn from_fields(code: &str, fields: &FieldMap) -> Result<Self> {
        let mut ticket = Ticket::new(code, "");
        for (key, value) in fields {
            match key.as_str() {
                "Title" => ticket.title = value.clone(),
                "Status" => ticket.status = Some(value.parse()?),
                "Started" => ticket.started = Some(parse_minute(value)?),
                "Finished" => ticket.finished = Some(parse_minute(value)?),
                "Base" => ticket.base = Some(value.clone()),
                "Branch" => ticket.branch = Some(value.clone()),
                "URL" => ticket.url = Some(value.clone()),
                "Owner" => ticket.owner = Some(value.clone()),
                "Build ID" => ticket.build_id = Some(value.clone()),
                "Build Result" => ticket.build_result = Some(value.parse()?),
                "Build Info" => ticket.build_info = Some(value.clone()),
                "Review ID" => ticket.review_id = Some(value.clone()),
                "Review Result" => ticket.review_result = Some(value.parse()?),
                "Review Info" => ticket.review_info = Some(value.clone()),
                "Tests" => ticket.tests = split_lines(value),
                "Files" => ticket.files = split_lines(value),
                "Notes" => ticket.notes = Some(value.clone()),
                "Work Log" => {
                    ticket.work = value
                        .lines()
                        .filter(|l| !l.trim().is_empty())
                        .map(|l| WorkEntry::parse_line(code, l))
                        .collect::<Result<Vec<_>>>()?;
                }
                _ => {}
            }
        }
        Ok(ticket)
    }
}

fn result_str(result: Option<ExternalStatus>) -> String {
    result.map_or_else(|| "-".to_string(), |r| r.to_string())
}

fn fmt_minute(t: NaiveDateTime) -> String {
    t.format(MINUTE_FORMAT).to_string()
}

fn parse_minute(s: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, MINUTE_FORMAT)
        .map_err(|_| TixError::MalformedRecord(format!("bad timestamp '{s}'")))
}

/// Wall-clock now, truncated to minute precision.
pub fn minute_now() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_second(0).and_then(|t| t.with_nanosecond(0)).unwrap_or(now)
}

fn join_lines(items: &[String]) -> Option<String> {
    if items.is_empty() {
        None
    } else {
        Some(items.join("\n"))
    }
}

fn split_lines(value: &str) -> Vec<String> {
    value
        .lines()
        .map(str::trim_end)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Lowercased, underscore-separated slug of a ticket title for branch names.
fn title_slug(title: &str) -> String {
    let mut slug = String::new();
    for c in title.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if c == ':' {
            slug.push_str("__");
        } else if !slug.is_empty() && !slug.ends_with('_') {
            slug.push('_');
        }
    }
    slug.trim_end_matches('_').to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
