use anyhow::Result;
use clap::{Parser, Subcommand};
use replaydeck::{util, StatsRequest, StatsResponse, StatsWorker};
use std::fs::{self, OpenOptions};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "replaydeck", about = "Aggregate player stats from a local replay archive")]
struct Cli {
    /// Path to the replay store (defaults to ~/.replaydeck/replays.db)
    #[arg(long)]
    db: Option<PathBuf>,

    /// Print the raw response message as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Tally player display names across all replays
    Names,
    /// Tally player connect codes across all replays
    Codes,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging to file (~/.replaydeck/logs/replaydeck.log)
    fs::create_dir_all(util::logs_dir())?;

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(util::log_file_path())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(log_file)
        .with_ansi(false) // Disable ANSI colors in log file
        .init();

    let cli = Cli::parse();
    let db_path = cli.db.unwrap_or_else(util::database_path);

    let mut worker = StatsWorker::spawn(db_path)?;
    let request = match cli.command {
        Command::Names => StatsRequest::GetNames,
        Command::Codes => StatsRequest::GetConnectCodes,
    };
    let response = worker.request(request).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    match response {
        StatsResponse::Names { data } | StatsResponse::ConnectCodes { data } => {
            for tally in data {
                println!("{:>6}  {}", tally.total, tally.name);
            }
        }
        StatsResponse::Error { error } => anyhow::bail!("query failed: {error}"),
    }

    Ok(())
}
