//! Safeguard: human approval panel for the support assistant's sensitive actions.
//!
//! Quick start:
//!   safeguard                  # open the console
//!   safeguard list             # pending requests, no TUI
//!   safeguard deferred list    # actions waiting for their execution delay
//!
//! For more info: safeguard --help

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use safeguard::cli;
use safeguard::config::{Config, Overrides};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Safeguard: review, approve and cancel the support assistant's sensitive actions.
#[derive(Parser)]
#[command(
    name = "safeguard",
    version,
    about = "Approve or reject sensitive actions, and cancel them before they run",
    long_about = "Safeguard lists the actions the support assistant wants to run\n\
                  (password resets, account changes, ticket closures), lets an admin\n\
                  approve or reject them, and cancel approved ones during their delay.\n\n\
                  Quick start:\n  \
                  safeguard                # open the console\n  \
                  safeguard list           # pending requests\n  \
                  safeguard init           # write a starter .safeguard.yaml"
)]
struct Cli {
    /// Configuration file (default: .safeguard.yaml, walking up)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Base URL of the approval service
    #[arg(long, global = true, env = "SAFEGUARD_URL")]
    url: Option<String>,

    /// Bearer token of the admin session
    #[arg(long, global = true, env = "SAFEGUARD_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Operator identity recorded on cancellations
    #[arg(long, global = true, env = "SAFEGUARD_USER")]
    user: Option<String>,

    /// Write logs to this file while the console is open
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive console (default)
    Console {
        /// Use sample data instead of the approval service
        #[arg(long)]
        demo: bool,
    },

    /// List approval requests
    List {
        #[arg(
            short,
            long,
            default_value = "pending",
            help = "Filter: pending, approved, rejected, expired, executed, failed, scheduled"
        )]
        status: String,
    },

    /// Show one approval request
    Show {
        /// Approval id (APR-...)
        id: String,
    },

    /// Recently decided requests
    History {
        #[arg(short, long, help = "Max entries to show")]
        limit: Option<u32>,
    },

    /// Approve a pending request
    Approve {
        id: String,
        #[arg(short = 'm', long, help = "Comment recorded with the decision")]
        comment: Option<String>,
    },

    /// Reject a pending request
    Reject {
        id: String,
        #[arg(short = 'm', long, help = "Comment recorded with the decision")]
        comment: Option<String>,
    },

    /// Approved actions waiting for their execution delay
    Deferred {
        #[command(subcommand)]
        command: DeferredCommands,
    },

    /// Write a starter configuration file
    Init {
        #[arg(short, long, default_value = "standard")]
        template: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Validate and print the configuration in effect
    Check {
        /// Also make one request to the server
        #[arg(long)]
        ping: bool,
    },
}

#[derive(Subcommand)]
enum DeferredCommands {
    /// List scheduled actions
    List {
        #[arg(short, long)]
        limit: Option<u32>,
        /// Include cancelled, executed and failed actions
        #[arg(short, long)]
        all: bool,
    },

    /// Show one deferred action
    Show { id: String },

    /// Cancel a scheduled action before it runs
    Cancel {
        id: String,
        #[arg(short, long)]
        reason: Option<String>,
        /// Identity recorded as the canceller (default: the session user)
        #[arg(long)]
        by: Option<String>,
    },

    /// Counts per status and delay per security level
    Stats,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let is_console = matches!(cli.command, None | Some(Commands::Console { .. }));
    if let Err(e) = init_tracing(is_console, cli.log_file.as_deref()) {
        eprintln!("  {} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }

    if let Err(e) = run(cli).await {
        eprintln!();
        eprintln!("  {} {}", "✗".red().bold(), e);
        for cause in e.chain().skip(1) {
            eprintln!("  {} {}", "caused by:".dimmed(), cause);
        }
        eprintln!();
        std::process::exit(1);
    }
}

/// Logs go to stderr for one-shot commands. The console owns the terminal,
/// so there they go to `--log-file` or nowhere.
fn init_tracing(console: bool, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::from_default_env().add_directive(
        if log_file.is_some() {
            "safeguard=info"
        } else {
            "safeguard=warn"
        }
        .parse()?,
    );
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    match (console, log_file) {
        (_, Some(path)) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file: {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        (true, None) => builder.with_writer(std::io::sink).init(),
        (false, None) => builder.without_time().with_writer(std::io::stderr).init(),
    }
    Ok(())
}

fn load_config(cli: &Cli) -> Result<(Config, Option<PathBuf>)> {
    let (config, source) = Config::load(cli.config.as_deref())?;
    let config = config.apply(&Overrides {
        base_url: cli.url.clone(),
        token: cli.token.clone(),
        user: cli.user.clone(),
    })?;
    Ok((config, source))
}

async fn run(cli: Cli) -> Result<()> {
    // init must work even when the existing configuration is broken
    if let Some(Commands::Init {
        ref template,
        ref output,
        force,
    }) = cli.command
    {
        return cli::init::run_init(template, output.as_deref(), force);
    }

    let (config, source) = load_config(&cli)?;

    match cli.command {
        None => cli::console::run_console(&config, false).await,
        Some(Commands::Console { demo }) => cli::console::run_console(&config, demo).await,

        Some(Commands::List { status }) => cli::requests::run_list(&config, &status).await,
        Some(Commands::Show { id }) => cli::requests::run_show(&config, &id).await,
        Some(Commands::History { limit }) => cli::requests::run_history(&config, limit).await,
        Some(Commands::Approve { id, comment }) => {
            cli::requests::run_decide(&config, &id, comment.as_deref(), true).await
        }
        Some(Commands::Reject { id, comment }) => {
            cli::requests::run_decide(&config, &id, comment.as_deref(), false).await
        }

        Some(Commands::Deferred { command }) => match command {
            DeferredCommands::List { limit, all } => {
                cli::deferred::run_list(&config, limit, all).await
            }
            DeferredCommands::Show { id } => cli::deferred::run_show(&config, &id).await,
            DeferredCommands::Cancel { id, reason, by } => {
                cli::deferred::run_cancel(&config, &id, reason.as_deref(), by.as_deref()).await
            }
            DeferredCommands::Stats => cli::deferred::run_stats(&config).await,
        },

        Some(Commands::Check { ping }) => {
            cli::check::run_check(&config, source.as_deref(), ping).await
        }

        Some(Commands::Init { .. }) => Ok(()),
    }
}
