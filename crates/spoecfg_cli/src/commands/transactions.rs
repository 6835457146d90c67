//! Transaction commands.

use super::{print_json, Format};
use serde::Serialize;
use spoecfg_core::{SpoeClient, TransactionId, TransactionInfo, Version};
use tracing::info;

#[derive(Debug, Serialize)]
struct TransactionList {
    in_progress: Vec<TransactionInfo>,
    failed: Vec<TransactionInfo>,
}

/// Lists staged and failed transactions.
pub fn list(client: &SpoeClient, format: Format) -> Result<(), Box<dyn std::error::Error>> {
    let result = TransactionList {
        in_progress: client.list_transactions(),
        failed: client.list_failed_transactions()?,
    };

    match format {
        Format::Json => print_json(&result)?,
        Format::Text => {
            if result.in_progress.is_empty() && result.failed.is_empty() {
                println!("No transactions");
            }
            for txn in result.in_progress.iter().chain(&result.failed) {
                let version = txn
                    .version
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!("{:<38} {:<12} {}", txn.id, txn.status, version);
            }
        }
    }
    Ok(())
}

/// Starts a transaction and prints its id.
pub fn begin(
    client: &mut SpoeClient,
    version: i64,
    format: Format,
) -> Result<(), Box<dyn std::error::Error>> {
    let id = client.begin_transaction(Version::new(version))?;
    info!("Started transaction {}", id);

    match format {
        Format::Json => print_json(&serde_json::json!({ "id": id, "version": version }))?,
        Format::Text => println!("{id}"),
    }
    Ok(())
}

/// Commits a transaction.
pub fn commit(
    client: &mut SpoeClient,
    id: &TransactionId,
    format: Format,
) -> Result<(), Box<dyn std::error::Error>> {
    let version = client.commit_transaction(id)?;

    match format {
        Format::Json => print_json(&serde_json::json!({ "id": id, "version": version }))?,
        Format::Text => println!("✓ Transaction {id} committed at version {version}"),
    }
    Ok(())
}

/// Aborts a transaction.
pub fn abort(client: &mut SpoeClient, id: &TransactionId) -> Result<(), Box<dyn std::error::Error>> {
    client.abort_transaction(id)?;
    println!("✓ Transaction {id} aborted");
    Ok(())
}
