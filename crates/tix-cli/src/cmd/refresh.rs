use crate::output::{print_json, print_table};
use anyhow::Context;
use std::path::Path;
use tix_core::ticket::Ticket;
use tix_core::workspace::Workspace;

pub fn run(root: &Path, code: Option<&str>, json: bool) -> anyhow::Result<()> {
    let mut ws = Workspace::open(root)?;
    let tickets = match code {
        Some(code) => vec![ws
            .refresh_ticket(code)
            .with_context(|| format!("failed to refresh {code}"))?],
        None => ws.refresh_all().context("failed to refresh tickets")?,
    };

    if json {
        #[derive(serde::Serialize)]
        struct RefreshRow<'a> {
            code: &'a str,
            flags: String,
        }
        let rows: Vec<RefreshRow> = tickets
            .iter()
            .map(|t| RefreshRow {
                code: &t.code,
                flags: t.flags(),
            })
            .collect();
        return print_json(&rows);
    }

    let rows: Vec<Vec<String>> = tickets
        .iter()
        .map(|t: &Ticket| vec![t.code.clone(), t.flags()])
        .collect();
    print_table(&["CODE", "STATE"], rows);
    Ok(())
}
