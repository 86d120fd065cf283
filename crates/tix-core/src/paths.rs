use crate::error::{Result, TixError};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const TIX_DIR: &str = ".tix";
pub const TICKETS_DIR: &str = ".tix/tickets";

pub const CONFIG_FILE: &str = ".tix/config.yaml";
pub const CACHE_FILE: &str = ".tix/cache.yaml";
pub const TIMELINE_FILE: &str = ".tix/timeline.yaml";

pub const RECORD_FILE: &str = "record";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn tix_dir(root: &Path) -> PathBuf {
    root.join(TIX_DIR)
}

pub fn tickets_dir(root: &Path) -> PathBuf {
    root.join(TICKETS_DIR)
}

pub fn ticket_dir(root: &Path, code: &str) -> PathBuf {
    root.join(TICKETS_DIR).join(code)
}

pub fn ticket_record(root: &Path, code: &str) -> PathBuf {
    ticket_dir(root, code).join(RECORD_FILE)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn cache_path(root: &Path) -> PathBuf {
    root.join(CACHE_FILE)
}

pub fn timeline_path(root: &Path) -> PathBuf {
    root.join(TIMELINE_FILE)
}

// ---------------------------------------------------------------------------
// Code validation
// ---------------------------------------------------------------------------

static CODE_RE: OnceLock<Regex> = OnceLock::new();

fn code_re() -> &'static Regex {
    CODE_RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_\-]*$").unwrap())
}

/// Ticket codes become directory names, so they are restricted to a safe
/// character set.
pub fn validate_code(code: &str) -> Result<()> {
    if code.is_empty() || code.len() > 64 || !code_re().is_match(code) {
        return Err(TixError::InvalidCode(code.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
