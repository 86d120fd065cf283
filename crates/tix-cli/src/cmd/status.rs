use crate::output::print_json;
use anyhow::Context;
use std::path::Path;
use tix_core::status::{allowed_from, Status, StatusChange};
use tix_core::workspace::Workspace;
use tix_core::TixError;

pub fn run(root: &Path, code: &str, status: Option<&str>, json: bool) -> anyhow::Result<()> {
    let ws = Workspace::open(root)?;

    let Some(input) = status else {
        return show_current(&ws, code, json);
    };

    let change = parse_change(input)?;
    let ticket = ws
        .set_status(code, change)
        .with_context(|| format!("cannot change status of {code}"))?;

    if json {
        #[derive(serde::Serialize)]
        struct StatusOutput<'a> {
            code: &'a str,
            status: Option<String>,
        }
        return print_json(&StatusOutput {
            code: &ticket.code,
            status: ticket.status.map(|s| s.to_string()),
        });
    }

    println!("{}: {}", ticket.code, ticket.flags());
    Ok(())
}

fn show_current(ws: &Workspace, code: &str, json: bool) -> anyhow::Result<()> {
    let ticket = ws.ticket(code)?;
    let allowed: Vec<String> = allowed_from(ticket.status)
        .iter()
        .map(|s| s.to_string())
        .collect();

    if json {
        #[derive(serde::Serialize)]
        struct CurrentOutput<'a> {
            code: &'a str,
            status: Option<String>,
            allowed: Vec<String>,
        }
        return print_json(&CurrentOutput {
            code: &ticket.code,
            status: ticket.status.map(|s| s.to_string()),
            allowed,
        });
    }

    println!("{}: {}", ticket.code, ticket.flags());
    println!("Allowed: {}", allowed.join(", "));
    Ok(())
}

/// Accept any status name case-insensitively, plus the two pseudo-values
/// that finish one half of a composite status.
fn parse_change(input: &str) -> Result<StatusChange, TixError> {
    if input.eq_ignore_ascii_case("end-building") {
        return Ok(StatusChange::EndBuilding);
    }
    if input.eq_ignore_ascii_case("end-reviewing") {
        return Ok(StatusChange::EndReviewing);
    }
    for status in Status::all() {
        if input.eq_ignore_ascii_case(status.as_str()) {
            return Ok(StatusChange::To(*status));
        }
    }
    Err(TixError::InvalidStatus(input.to_string()))
}
