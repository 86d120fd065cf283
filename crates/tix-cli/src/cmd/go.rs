use crate::output::print_json;
use anyhow::Context;
use chrono::{Local, Timelike};
use std::path::Path;
use tix_core::workspace::Workspace;

pub fn run(root: &Path, code: &str, json: bool) -> anyhow::Result<()> {
    let ws = Workspace::open(root)?;
    let now = Local::now().naive_local();
    let now = now.with_nanosecond(0).unwrap_or(now);
    let ticket = ws
        .switch_to(code, now)
        .with_context(|| format!("failed to switch to {code}"))?;

    if json {
        #[derive(serde::Serialize)]
        struct GoOutput<'a> {
            code: &'a str,
            title: &'a str,
            since: String,
        }
        let since = ticket
            .work
            .last()
            .map(|e| e.start.to_string())
            .unwrap_or_default();
        return print_json(&GoOutput {
            code: &ticket.code,
            title: &ticket.title,
            since,
        });
    }

    println!("Working on {}: {}", ticket.code, ticket.title);
    if let Some(entry) = ticket.work.last() {
        println!("Since: {}", entry.start);
    }
    Ok(())
}
