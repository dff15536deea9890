mod commands;

use clap::{Parser, Subcommand};
use rps_core::RpsConfig;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "rps")]
#[command(about = "Rock-paper-scissors matchmaking over simulated SMS")]
#[command(version)]
struct Cli {
    /// Data directory for game state storage
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Skip the matchmaking lock (racy; kept for comparison runs)
    #[arg(long, global = true)]
    no_locking: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a throw as a player, like one inbound SMS
    Throw {
        /// Player phone number (opaque identifier)
        player: String,
        /// Message text: rock, paper or scissors
        message: String,
    },
    /// Show the pending throw and any live lock record
    Status,
    /// Clear the game state and lock tables
    Reset,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "rps={},rps_game={},rps_core={}",
            log_level, log_level, log_level
        )))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Get data directory
    let data_dir = cli.data_dir.unwrap_or_else(|| {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("rps")
    });

    tokio::fs::create_dir_all(&data_dir).await?;

    let config = RpsConfig {
        locking: !cli.no_locking,
        ..RpsConfig::default()
    };

    // Execute command
    let result = match cli.command {
        Commands::Throw { player, message } => {
            commands::send_throw(&data_dir, config, &player, &message).await
        }
        Commands::Status => commands::show_status(&data_dir, config).await,
        Commands::Reset => commands::reset(&data_dir, config).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
