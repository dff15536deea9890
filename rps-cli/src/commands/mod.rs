use async_trait::async_trait;
use comfy_table::{presets::UTF8_FULL, Table};
use rps_core::{
    now_ms, KeyValueStore, LockRecord, Notifier, Result as CoreResult, RpsConfig, SqliteStore,
};
use rps_game::{Matchmaker, ThrowOutcome, MATCHMAKING_LOCK};
use std::path::Path;
use std::sync::Arc;

/// Prints simulated SMS traffic to stdout in place of a real gateway.
struct ConsoleNotifier;

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn notify(&self, recipient: &str, message: &str) -> CoreResult<()> {
        println!("SMS to {}: {}", recipient, message);
        Ok(())
    }
}

async fn open_matchmaker(
    data_dir: &Path,
    config: RpsConfig,
) -> Result<(Arc<SqliteStore>, Matchmaker), Box<dyn std::error::Error>> {
    let store = Arc::new(SqliteStore::new(&data_dir.join("rps.db")).await?);
    let matchmaker = Matchmaker::new(store.clone(), Arc::new(ConsoleNotifier), config)?;
    Ok((store, matchmaker))
}

pub async fn send_throw(
    data_dir: &Path,
    config: RpsConfig,
    player: &str,
    message: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let (_store, matchmaker) = open_matchmaker(data_dir, config).await?;

    match matchmaker.handle_message(message, player).await? {
        ThrowOutcome::Waiting => {
            println!("Throw recorded. Waiting for the other player.");
        }
        ThrowOutcome::Played(outcome) => {
            println!("Round complete: {}", outcome.message());
        }
    }

    Ok(())
}

pub async fn show_status(
    data_dir: &Path,
    config: RpsConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let lock_table = config.lock_table.clone();
    let (store, matchmaker) = open_matchmaker(data_dir, config).await?;

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Record", "Details"]);

    match matchmaker.pending_throw().await? {
        Some(pending) => {
            table.add_row(vec![
                "Pending throw".to_string(),
                format!("{} by {}", pending.throw, pending.phone_number),
            ]);
        }
        None => {
            table.add_row(vec!["Pending throw".to_string(), "none".to_string()]);
        }
    }

    match store.get(&lock_table, MATCHMAKING_LOCK).await? {
        Some(item) => {
            let record: LockRecord = serde_json::from_value(item)?;
            table.add_row(vec![
                "Lock".to_string(),
                format!(
                    "held by {} for {}ms",
                    record.holder,
                    now_ms() - record.time_acquired
                ),
            ]);
        }
        None => {
            table.add_row(vec!["Lock".to_string(), "free".to_string()]);
        }
    }

    println!("{}", table);
    Ok(())
}

pub async fn reset(data_dir: &Path, config: RpsConfig) -> Result<(), Box<dyn std::error::Error>> {
    let confirmed = dialoguer::Confirm::new()
        .with_prompt("Clear all game state and locks?")
        .default(false)
        .interact()?;

    if !confirmed {
        println!("Aborted.");
        return Ok(());
    }

    let (_store, matchmaker) = open_matchmaker(data_dir, config).await?;
    matchmaker.reset().await?;
    println!("Game state cleared.");

    Ok(())
}
