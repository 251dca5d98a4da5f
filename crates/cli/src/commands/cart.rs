//! Guest cart commands.
//!
//! These operate on the same JSON file store the embedding client uses, so
//! a cart built here is exactly what a later `merge` submits.

use std::sync::Arc;

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::info;

use mangosteen_client::cart::{CartError, GuestCartStore};
use mangosteen_client::storage::{JsonFileStore, StorageError};
use mangosteen_core::ProductId;

/// Errors that can occur during cart commands.
#[derive(Debug, Error)]
pub enum CartCommandError {
    /// The price argument is not a decimal number.
    #[error("invalid price: {0}")]
    InvalidPrice(String),

    /// No storage location could be determined.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The cart operation itself failed.
    #[error(transparent)]
    Cart(#[from] CartError),
}

/// Open the guest cart over the configured JSON file store.
///
/// Honors `MANGOSTEEN_STORAGE_PATH`, falling back to the per-user config
/// directory.
fn open_cart() -> Result<GuestCartStore, CartCommandError> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let store = match std::env::var("MANGOSTEEN_STORAGE_PATH") {
        Ok(path) => JsonFileStore::new(path),
        Err(_) => JsonFileStore::with_default_path()?,
    };
    Ok(GuestCartStore::new(Arc::new(store)))
}

/// Add units of a product to the guest cart.
///
/// # Errors
///
/// Returns an error if the price does not parse, the line fails validation,
/// or the cart cannot be persisted.
pub fn add(
    product_id: i64,
    quantity: u32,
    name: &str,
    price: &str,
) -> Result<(), CartCommandError> {
    let price: Decimal = price
        .parse()
        .map_err(|_| CartCommandError::InvalidPrice(price.to_owned()))?;

    let cart = open_cart()?;
    cart.add(ProductId::new(product_id), quantity, name, price)?;

    info!(
        "Added product {product_id} x{quantity}, cart now holds {} unit(s)",
        cart.count()
    );
    Ok(())
}

/// Remove a product's line from the guest cart.
///
/// # Errors
///
/// Returns an error if the cart cannot be persisted.
pub fn remove(product_id: i64) -> Result<(), CartCommandError> {
    let cart = open_cart()?;
    cart.remove(ProductId::new(product_id))?;

    info!(
        "Removed product {product_id}, cart now holds {} unit(s)",
        cart.count()
    );
    Ok(())
}

/// Set the exact quantity of a product's line. A quantity of 0 removes it.
///
/// # Errors
///
/// Returns an error if the product is not in the cart or the cart cannot be
/// persisted.
pub fn update(product_id: i64, quantity: u32) -> Result<(), CartCommandError> {
    let cart = open_cart()?;
    cart.update(ProductId::new(product_id), quantity)?;

    info!(
        "Updated product {product_id} to x{quantity}, cart now holds {} unit(s)",
        cart.count()
    );
    Ok(())
}

/// Print the guest cart lines.
///
/// # Errors
///
/// Returns an error if no storage location could be determined.
#[allow(clippy::print_stdout)]
pub fn list() -> Result<(), CartCommandError> {
    let cart = open_cart()?.read();

    if cart.is_empty() {
        println!("(empty cart)");
        return Ok(());
    }

    for line in cart.items() {
        println!(
            "{:>10}  x{:<5} {:<30} {}",
            line.product_id().to_string(),
            line.quantity(),
            line.product_name(),
            line.price()
        );
    }
    println!("total: {} unit(s)", cart.total_quantity());
    Ok(())
}

/// Print the total unit count.
///
/// # Errors
///
/// Returns an error if no storage location could be determined.
#[allow(clippy::print_stdout)]
pub fn count() -> Result<(), CartCommandError> {
    println!("{}", open_cart()?.count());
    Ok(())
}

/// Drop all guest cart state.
///
/// # Errors
///
/// Returns an error if the persisted keys cannot be removed.
pub fn clear() -> Result<(), CartCommandError> {
    open_cart()?.clear()?;

    info!("Guest cart cleared");
    Ok(())
}
