use crate::output::{print_json, print_table};
use anyhow::Context;
use std::path::Path;
use tix_core::workspace::Workspace;

pub fn run(root: &Path, all: bool, json: bool) -> anyhow::Result<()> {
    let mut ws = Workspace::open(root)?;
    let tickets = ws.refresh_all().context("failed to refresh tickets")?;
    let tickets: Vec<_> = tickets
        .into_iter()
        .filter(|t| all || !t.finished())
        .collect();

    if json {
        #[derive(serde::Serialize)]
        struct LsRow<'a> {
            code: &'a str,
            status: Option<String>,
            flags: String,
            title: &'a str,
        }
        let rows: Vec<LsRow> = tickets
            .iter()
            .map(|t| LsRow {
                code: &t.code,
                status: t.status.map(|s| s.to_string()),
                flags: t.flags(),
                title: &t.title,
            })
            .collect();
        return print_json(&rows);
    }

    if tickets.is_empty() {
        println!("No tickets. Run: tix new <code> <title>");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = tickets
        .iter()
        .map(|t| vec![t.code.clone(), t.flags(), t.title.clone()])
        .collect();
    print_table(&["CODE", "STATE", "TITLE"], rows);
    Ok(())
}
