use crate::output::print_json;
use anyhow::Context;
use std::path::Path;
use tix_core::workspace::Workspace;

pub fn run(root: &Path, code: &str, title: &str, json: bool) -> anyhow::Result<()> {
    let ws = Workspace::open(root)?;
    let ticket = ws
        .create(code, title)
        .with_context(|| format!("failed to create ticket {code}"))?;

    if json {
        #[derive(serde::Serialize)]
        struct NewOutput<'a> {
            code: &'a str,
            title: &'a str,
            branch: String,
        }
        return print_json(&NewOutput {
            code: &ticket.code,
            title: &ticket.title,
            branch: ticket.branch_name(&ws.config),
        });
    }

    println!("Created {}: {}", ticket.code, ticket.title);
    println!("Branch: {}", ticket.branch_name(&ws.config));
    Ok(())
}
