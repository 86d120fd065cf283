use crate::output::{print_json, print_table};
use anyhow::Context;
use chrono::{Local, NaiveDate, NaiveDateTime, Timelike};
use clap::Subcommand;
use std::path::Path;
use tix_core::work;
use tix_core::workspace::Workspace;

#[derive(Subcommand)]
pub enum WorkSubcommand {
    /// Stop the running work entry
    Off {
        /// Stop time: HH:MM, HH:MM:SS, or a full YYYY-MM-DD HH:MM:SS stamp
        #[arg(long)]
        at: Option<String>,
    },

    /// Attach text to the most recent work entry
    Comment {
        #[arg(trailing_var_arg = true)]
        text: Vec<String>,
    },

    /// Merge the two most recent entries of the last-worked ticket
    Merge,

    /// Discard the most recent entry of the last-worked ticket
    Drop,

    /// Show work entries for a day
    Log {
        /// Day to show (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<String>,
    },
}

pub fn run(root: &Path, subcommand: WorkSubcommand, json: bool) -> anyhow::Result<()> {
    let ws = Workspace::open(root)?;
    match subcommand {
        WorkSubcommand::Off { at } => {
            let stop = parse_at(at.as_deref())?;
            let ticket = ws.stop_work(stop).context("failed to stop work timer")?;
            report(&ticket, json)
        }
        WorkSubcommand::Comment { text } => {
            let ticket = ws
                .comment_work(&text.join(" "))
                .context("failed to comment work entry")?;
            report(&ticket, json)
        }
        WorkSubcommand::Merge => {
            let ticket = ws.merge_work().context("failed to merge work entries")?;
            report(&ticket, json)
        }
        WorkSubcommand::Drop => {
            let ticket = ws.drop_work().context("failed to drop work entry")?;
            report(&ticket, json)
        }
        WorkSubcommand::Log { date } => log(&ws, date.as_deref(), json),
    }
}

fn report(ticket: &tix_core::ticket::Ticket, json: bool) -> anyhow::Result<()> {
    if json {
        #[derive(serde::Serialize)]
        struct WorkOutput<'a> {
            code: &'a str,
            work: Vec<String>,
        }
        return print_json(&WorkOutput {
            code: &ticket.code,
            work: ticket.work.iter().map(|e| e.to_line()).collect(),
        });
    }
    println!("{}:", ticket.code);
    for entry in &ticket.work {
        println!("  {}", entry.to_line());
    }
    Ok(())
}

fn log(ws: &Workspace, date: Option<&str>, json: bool) -> anyhow::Result<()> {
    let date = match date {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("invalid date '{s}'"))?,
        None => Local::now().date_naive(),
    };
    let timeline = ws.timeline()?;
    let entries = timeline.on_date(date);
    let total_min: u64 = entries.iter().map(|e| e.minutes() as u64).sum();

    if json {
        #[derive(serde::Serialize)]
        struct LogRow<'a> {
            code: &'a str,
            line: String,
            minutes: u64,
        }
        #[derive(serde::Serialize)]
        struct LogOutput<'a> {
            date: String,
            entries: Vec<LogRow<'a>>,
            total_minutes: u64,
        }
        let rows: Vec<LogRow> = entries
            .iter()
            .map(|e| LogRow {
                code: &e.code,
                line: e.to_line(),
                minutes: e.minutes() as u64,
            })
            .collect();
        return print_json(&LogOutput {
            date: date.to_string(),
            entries: rows,
            total_minutes: total_min,
        });
    }

    if entries.is_empty() {
        println!("No work recorded on {date}");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = entries
        .iter()
        .map(|e| vec![e.code.clone(), e.to_line(), e.human()])
        .collect();
    print_table(&["CODE", "ENTRY", "TIME"], rows);
    println!("Total: {}h {}min", total_min / 60, total_min % 60);
    Ok(())
}

fn parse_at(at: Option<&str>) -> anyhow::Result<NaiveDateTime> {
    let now = Local::now().naive_local();
    match at {
        Some(input) => Ok(work::parse_stamp(input, now.date())?),
        None => Ok(now.with_nanosecond(0).unwrap_or(now)),
    }
}
