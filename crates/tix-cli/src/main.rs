mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::work::WorkSubcommand;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "tix",
    about = "Personal ticket tracker — statuses, external build/review state, and work timing",
    version,
    propagate_version = true
)]
struct Cli {
    /// Workspace root (default: auto-detect from .tix/ or .git/, else home)
    #[arg(long, global = true, env = "TIX_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a tix workspace in the current directory
    Init,

    /// Create a ticket
    New {
        code: String,

        /// Ticket title (remaining words are joined)
        #[arg(trailing_var_arg = true)]
        title: Vec<String>,
    },

    /// List tickets with their current flags
    Ls {
        /// Include finished tickets
        #[arg(long, short = 'a')]
        all: bool,
    },

    /// Show one ticket in full, including its work log
    Show { code: String },

    /// Show or change a ticket's status
    Status {
        code: String,

        /// New status (omit to show the current status and allowed moves)
        status: Option<String>,
    },

    /// Reconcile tickets against external build/review state
    Refresh {
        /// Ticket code (omit to refresh all)
        code: Option<String>,
    },

    /// Switch active work timing to a ticket
    Go { code: String },

    /// Manage the work log
    Work {
        #[command(subcommand)]
        subcommand: WorkSubcommand,
    },

    /// Show or toggle offline mode (on|off)
    Offline { state: Option<String> },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .init();

    let result = run(cli);
    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    if let Commands::Init = cli.command {
        let root = root::init_root(cli.root.as_deref())?;
        return cmd::init::run(&root, cli.json);
    }

    let root = root::resolve_root(cli.root.as_deref())?;
    match cli.command {
        Commands::Init => unreachable!(),
        Commands::New { code, title } => cmd::new::run(&root, &code, &title.join(" "), cli.json),
        Commands::Ls { all } => cmd::ls::run(&root, all, cli.json),
        Commands::Show { code } => cmd::show::run(&root, &code, cli.json),
        Commands::Status { code, status } => {
            cmd::status::run(&root, &code, status.as_deref(), cli.json)
        }
        Commands::Refresh { code } => cmd::refresh::run(&root, code.as_deref(), cli.json),
        Commands::Go { code } => cmd::go::run(&root, &code, cli.json),
        Commands::Work { subcommand } => cmd::work::run(&root, subcommand, cli.json),
        Commands::Offline { state } => cmd::offline::run(&root, state.as_deref(), cli.json),
    }
}
