use crate::output::print_json;
use anyhow::bail;
use std::path::Path;
use tix_core::workspace::Workspace;

pub fn run(root: &Path, state: Option<&str>, json: bool) -> anyhow::Result<()> {
    let mut ws = Workspace::open(root)?;

    match state {
        Some("on") => ws.set_offline(true)?,
        Some("off") => ws.set_offline(false)?,
        Some(other) => bail!("expected 'on' or 'off', got '{other}'"),
        None => {}
    }

    if json {
        #[derive(serde::Serialize)]
        struct OfflineOutput {
            offline: bool,
        }
        return print_json(&OfflineOutput {
            offline: ws.config.offline_mode,
        });
    }

    println!(
        "Offline mode: {}",
        if ws.config.offline_mode { "on" } else { "off" }
    );
    Ok(())
}
