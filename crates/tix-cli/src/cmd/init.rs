use crate::output::print_json;
use anyhow::Context;
use std::path::Path;
use tix_core::workspace::Workspace;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let ws = Workspace::init(root).context("failed to initialize workspace")?;

    if json {
        #[derive(serde::Serialize)]
        struct InitOutput {
            root: String,
        }
        return print_json(&InitOutput {
            root: ws.root().display().to_string(),
        });
    }

    println!("Initialized tix workspace in {}", ws.root().display());
    Ok(())
}
