//! First-match aggregation across secondary directories

use crate::identity::{ContactMatch, DirectoryHandle, DirectoryIdentityProvider};
use crate::number;
use log::{debug, warn};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Query every directory in parallel and return the first match reported
///
/// Each directory runs on its own task. Once a winner is known the receiver
/// is dropped: the remaining lookups still run to completion, but what they
/// report is discarded. Returns `None` once every directory has answered
/// without a match (immediately when `directories` is empty).
pub async fn first_match(
    provider: Arc<dyn DirectoryIdentityProvider>,
    directories: Vec<DirectoryHandle>,
    lookup_number: &str,
) -> Option<(DirectoryHandle, ContactMatch)> {
    if directories.is_empty() {
        return None;
    }

    let (tx, mut rx) = mpsc::channel(directories.len());
    for directory in directories {
        let tx = tx.clone();
        let provider = Arc::clone(&provider);
        let lookup_number = lookup_number.to_string();

        tokio::spawn(async move {
            let found = match provider.lookup(&lookup_number, &directory).await {
                Ok(found) => found,
                Err(e) => {
                    warn!("Directory {} lookup failed: {e}", directory.name);
                    None
                }
            };
            // Receiver is gone once a winner was chosen
            let _ = tx.send(found.map(|m| (directory, m))).await;
        });
    }
    drop(tx);

    while let Some(result) = rx.recv().await {
        if let Some((directory, found)) = result {
            debug!(
                "Directory {} matched {}",
                directory.name,
                number::log_safe(lookup_number)
            );
            return Some((directory, found));
        }
    }
    None
}
