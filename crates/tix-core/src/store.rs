use crate::error::{Result, TixError};
use crate::paths;
use crate::ticket::FieldMap;
use std::path::{Path, PathBuf};
use tracing::debug;

// ---------------------------------------------------------------------------
// TicketStore
// ---------------------------------------------------------------------------

/// Opaque key/value record store for tickets. The core does not dictate the
/// on-disk encoding; `DirStore` below is the shipped implementation.
pub trait TicketStore {
    fn load(&self, code: &str) -> Result<FieldMap>;
    fn save(&self, code: &str, fields: &FieldMap) -> Result<()>;
    fn exists(&self, code: &str) -> bool;
    fn codes(&self) -> Result<Vec<String>>;
}

// ---------------------------------------------------------------------------
// Record format
// ---------------------------------------------------------------------------

/// Serialize a field map to the line-oriented record format: a `Key:` header
/// line followed by the value, every value line indented by two spaces.
/// Multiline values (work logs, file lists) keep one value line each.
pub fn format_record(fields: &FieldMap) -> String {
    let mut out = String::new();
    for (key, value) in fields {
        out.push_str(key);
        out.push_str(":\n");
        for line in value.split('\n') {
            out.push_str("  ");
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}

pub fn parse_record(data: &str) -> Result<FieldMap> {
    let mut fields = FieldMap::new();
    let mut current: Option<(String, Vec<String>)> = None;
    for line in data.lines() {
        if line.is_empty() {
            continue;
        }
        if let Some(rest) = line.strip_prefix("  ") {
            match current.as_mut() {
                Some((_, lines)) => lines.push(rest.trim_end().to_string()),
                None => {
                    return Err(TixError::MalformedRecord(format!(
                        "value line before any key: '{line}'"
                    )))
                }
            }
        } else {
            let key = line
                .strip_suffix(':')
                .ok_or_else(|| TixError::MalformedRecord(format!("bad key line: '{line}'")))?;
            if let Some((key, lines)) = current.take() {
                fields.push((key, lines.join("\n")));
            }
            current = Some((key.to_string(), Vec::new()));
        }
    }
    if let Some((key, lines)) = current.take() {
        fields.push((key, lines.join("\n")));
    }
    Ok(fields)
}

// ---------------------------------------------------------------------------
// DirStore
// ---------------------------------------------------------------------------

/// Directory-per-ticket store rooted at the project's `.tix/tickets`.
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    fn record_path(&self, code: &str) -> PathBuf {
        paths::ticket_record(&self.root, code)
    }
}

impl TicketStore for DirStore {
    fn load(&self, code: &str) -> Result<FieldMap> {
        let path = self.record_path(code);
        if !path.exists() {
            return Err(TixError::TicketNotFound(code.to_string()));
        }
        let data = std::fs::read_to_string(&path)?;
        parse_record(&data)
    }

    fn save(&self, code: &str, fields: &FieldMap) -> Result<()> {
        paths::validate_code(code)?;
        let path = self.record_path(code);
        debug!(code, path = %path.display(), "saving ticket record");
        crate::io::atomic_write(&path, format_record(fields).as_bytes())
    }

    fn exists(&self, code: &str) -> bool {
        self.record_path(code).exists()
    }

    fn codes(&self) -> Result<Vec<String>> {
        let dir = paths::tickets_dir(&self.root);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut codes = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let code = entry.file_name().to_string_lossy().into_owned();
            if entry.path().join(paths::RECORD_FILE).is_file() {
                codes.push(code);
            }
        }
        codes.sort();
        Ok(codes)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
