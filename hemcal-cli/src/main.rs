mod commands;
mod render;
mod utils;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hemcal")]
#[command(about = "Aggregate household calendar sources into one shared calendar")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch all sources and reconcile the event set
    Pull,
    /// List events waiting for a decision
    Inbox,
    /// Approve an inbox event onto the shared calendar
    Approve { uid: String },
    /// Reject an inbox event
    Reject { uid: String },
    /// Send a rejected or synced event back to the inbox
    Restore { uid: String },
    /// Create an event by hand
    New {
        title: String,

        /// Start date/time (e.g. "2025-03-20T15:00")
        #[arg(short, long)]
        start: String,

        /// End date/time
        #[arg(short, long)]
        end: Option<String>,

        #[arg(short, long)]
        location: Option<String>,

        /// Household members this event concerns (repeatable)
        #[arg(short, long)]
        assignee: Vec<String>,

        #[arg(short, long)]
        category: Option<String>,
    },
    /// Push the shared calendar to the remote service and reconcile
    Sync,
    /// Show the week grid
    Week {
        /// Any date inside the week to show (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Pull => commands::pull::run().await,
        Commands::Inbox => commands::inbox::run(),
        Commands::Approve { uid } => commands::decide::approve(&uid),
        Commands::Reject { uid } => commands::decide::reject(&uid),
        Commands::Restore { uid } => commands::decide::restore(&uid),
        Commands::New {
            title,
            start,
            end,
            location,
            assignee,
            category,
        } => commands::new::run(title, start, end, location, assignee, category),
        Commands::Sync => commands::sync::run().await,
        Commands::Week { date } => commands::week::run(date.as_deref()),
    }
}
