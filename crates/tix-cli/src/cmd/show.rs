use crate::output::print_json;
use anyhow::Context;
use std::path::Path;
use tix_core::ticket::Ticket;
use tix_core::workspace::Workspace;

pub fn run(root: &Path, code: &str, json: bool) -> anyhow::Result<()> {
    let mut ws = Workspace::open(root)?;
    let ticket = ws
        .refresh_ticket(code)
        .with_context(|| format!("failed to load ticket {code}"))?;

    let total_min: u64 = ticket.work.iter().map(|e| e.minutes() as u64).sum();

    if json {
        #[derive(serde::Serialize)]
        struct WorkLine {
            line: String,
            minutes: u64,
        }

        #[derive(serde::Serialize)]
        struct ShowOutput<'a> {
            code: &'a str,
            title: &'a str,
            status: Option<String>,
            flags: String,
            started: Option<String>,
            finished: Option<String>,
            branch: String,
            base: String,
            url: Option<&'a str>,
            owner: Option<&'a str>,
            tests: &'a [String],
            files: &'a [String],
            notes: Option<&'a str>,
            work: Vec<WorkLine>,
            total_minutes: u64,
        }

        let output = ShowOutput {
            code: &ticket.code,
            title: &ticket.title,
            status: ticket.status.map(|s| s.to_string()),
            flags: ticket.flags(),
            started: ticket.started.map(fmt_minute),
            finished: ticket.finished.map(fmt_minute),
            branch: ticket.branch_name(&ws.config),
            base: ticket.base_branch(&ws.config),
            url: ticket.url.as_deref(),
            owner: ticket.owner.as_deref(),
            tests: &ticket.tests,
            files: &ticket.files,
            notes: ticket.notes.as_deref(),
            work: ticket
                .work
                .iter()
                .map(|e| WorkLine {
                    line: e.to_line(),
                    minutes: e.minutes() as u64,
                })
                .collect(),
            total_minutes: total_min,
        };
        return print_json(&output);
    }

    println!("{}: {}", ticket.code, ticket.title);
    println!("Status:  {}", ticket.flags());
    print_opt("Started", ticket.started.map(fmt_minute));
    print_opt("Finished", ticket.finished.map(fmt_minute));
    println!("Branch:  {} (from {})", ticket.branch_name(&ws.config), ticket.base_branch(&ws.config));
    print_opt("URL", ticket.url.clone());
    print_opt("Owner", ticket.owner.clone());
    print_external(&ticket);
    print_list("Tests", &ticket.tests);
    print_list("Files", &ticket.files);
    print_opt("Notes", ticket.notes.clone());

    if !ticket.work.is_empty() {
        println!("\nWork log:");
        for entry in &ticket.work {
            println!("  {}  ({})", entry.to_line(), entry.human());
        }
        println!("Total: {}", human_minutes(total_min));
    }
    Ok(())
}

fn print_opt(label: &str, value: Option<String>) {
    if let Some(v) = value {
        println!("{label}: {v}");
    }
}

fn print_list(label: &str, items: &[String]) {
    if !items.is_empty() {
        println!("{label}:");
        for item in items {
            println!("  {item}");
        }
    }
}

fn print_external(ticket: &Ticket) {
    if let Some(id) = &ticket.build_id {
        let result = ticket
            .build_result
            .map_or_else(|| "-".to_string(), |r| r.to_string());
        println!("Build:   {id} ({result})");
    }
    if let Some(id) = &ticket.review_id {
        let result = ticket
            .review_result
            .map_or_else(|| "-".to_string(), |r| r.to_string());
        println!("Review:  {id} ({result})");
    }
}

fn fmt_minute(t: chrono::NaiveDateTime) -> String {
    t.format(tix_core::ticket::MINUTE_FORMAT).to_string()
}

fn human_minutes(min: u64) -> String {
    if min >= 60 {
        format!("{}h {}min", min / 60, min % 60)
    } else {
        format!("{min}min")
    }
}
