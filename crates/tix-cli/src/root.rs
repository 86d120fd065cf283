use std::path::{Path, PathBuf};

/// Resolve the workspace root for reading commands.
///
/// Priority:
/// 1. `--root` flag / `TIX_ROOT` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `.tix/`
/// 3. Walk upward from `cwd` looking for `.git/`
/// 4. Fall back to the home directory, where tickets not tied to any
///    repository live
pub fn resolve_root(explicit: Option<&Path>) -> anyhow::Result<PathBuf> {
    if let Some(p) = explicit {
        return Ok(p.to_path_buf());
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    // Walk upward looking for .tix/
    let mut dir = cwd.clone();
    loop {
        if dir.join(".tix").is_dir() {
            return Ok(dir);
        }
        match dir.parent() {
            Some(p) => dir = p.to_path_buf(),
            None => break,
        }
    }

    // Walk upward looking for .git/
    let mut dir = cwd;
    loop {
        if dir.join(".git").is_dir() {
            return Ok(dir);
        }
        match dir.parent() {
            Some(p) => dir = p.to_path_buf(),
            None => break,
        }
    }

    Ok(tix_core::workspace::default_root()?)
}

/// Root used by `tix init`: the explicit flag or the current directory,
/// never an inherited parent workspace.
pub fn init_root(explicit: Option<&Path>) -> anyhow::Result<PathBuf> {
    match explicit {
        Some(p) => Ok(p.to_path_buf()),
        None => Ok(std::env::current_dir()?),
    }
}
