//! Cart merge command.
//!
//! Submits the locally stored guest cart to the storefront merge endpoint,
//! exactly as the embedding client would on login.
//!
//! # Environment Variables
//!
//! - `MANGOSTEEN_BASE_URL` - Storefront base URL (required)
//! - `MANGOSTEEN_STORAGE_PATH` - Path of the JSON storage file (optional)

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use mangosteen_client::cart::GuestCartStore;
use mangosteen_client::config::{ClientConfig, ConfigError};
use mangosteen_client::merge::{MergeBridge, MergeClient, MergeOutcome};
use mangosteen_client::storage::JsonFileStore;
use mangosteen_client::ui::{HeadlessPage, LogNotifier};

/// Errors that can occur during the merge command.
#[derive(Debug, Error)]
pub enum MergeCommandError {
    /// Client configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Merge the guest cart into the signed-in shopper's server-side cart.
///
/// The storefront decides from its own session whether the request is
/// authenticated; an unauthenticated call comes back as a refusal and the
/// local cart stays put.
///
/// # Errors
///
/// Returns an error if client configuration could not be loaded. Merge
/// failures themselves are reported, not returned.
pub async fn run(page: &str) -> Result<(), MergeCommandError> {
    let config = ClientConfig::from_env()?;

    let cart = GuestCartStore::new(Arc::new(JsonFileStore::new(&config.storage_path)));
    let client = MergeClient::new(&config.base_url);
    info!("Merging guest cart via {}", client.endpoint());

    let bridge = MergeBridge::new(
        cart,
        client,
        Arc::new(LogNotifier),
        Arc::new(HeadlessPage::at(page)),
    );

    match bridge.merge().await {
        MergeOutcome::Merged { items_added: 0, .. } => {
            info!("Merge accepted, nothing new to add");
        }
        MergeOutcome::Merged { items_added, .. } => {
            info!("Merge accepted, {items_added} item(s) added to the server cart");
        }
        MergeOutcome::NothingToMerge => info!("Guest cart is empty, nothing to merge"),
        MergeOutcome::Rejected { message } => warn!("Merge rejected: {message}"),
        MergeOutcome::Unreachable(err) => warn!("Merge failed: {err}"),
        MergeOutcome::InFlight => info!("A merge is already running"),
    }
    Ok(())
}
