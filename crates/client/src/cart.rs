//! Guest cart persistence and badge upkeep.
//!
//! The guest cart exists before sign-in only. It lives entirely in the
//! injected key-value store; every operation re-reads the persisted blob,
//! applies the pure cart operation, and writes it back, so several store
//! instances over the same storage observe each other's writes.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, instrument, warn};

use mangosteen_core::{CartLineItem, GuestCart, LineItemError, ProductId};

use crate::storage::{KeyValueStore, StorageError};
use crate::ui::CartBadge;

/// Storage keys for guest cart state.
pub mod keys {
    /// JSON array of cart line items. The source of truth.
    pub const CART: &str = "mangosteen_cart";

    /// Derived total unit count, written so badge renderers can show a
    /// count without decoding the blob. Never read back by this crate.
    pub const CART_COUNT: &str = "mangosteen_cart_count";
}

/// Display name used when a product is added without one.
const FALLBACK_PRODUCT_NAME: &str = "Item";

/// Errors from guest cart operations.
#[derive(Debug, thiserror::Error)]
pub enum CartError {
    /// The line item failed validation.
    #[error(transparent)]
    Line(#[from] LineItemError),

    /// The product has no line in the cart.
    #[error("product {0} is not in the cart")]
    NotInCart(ProductId),

    /// The cart blob could not be written.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The cart could not be encoded for storage.
    #[error("cart encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Persistent guest cart bound to a key-value store and an optional badge.
///
/// Reads never fail: absent or malformed storage decodes to an empty cart
/// and the shopper keeps browsing. Mutations fail only when the cart blob
/// itself cannot be written; the derived count key and the badge are
/// best-effort on top.
#[derive(Clone)]
pub struct GuestCartStore {
    storage: Arc<dyn KeyValueStore>,
    badge: Option<Arc<dyn CartBadge>>,
}

impl GuestCartStore {
    /// Create a store over the given storage, with no badge attached.
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            storage,
            badge: None,
        }
    }

    /// Attach a cart count indicator, refreshed after every mutation.
    #[must_use]
    pub fn with_badge(mut self, badge: Arc<dyn CartBadge>) -> Self {
        self.badge = Some(badge);
        self
    }

    /// Read the persisted cart.
    ///
    /// Absent, unreadable, or unparsable storage reads as an empty cart,
    /// logged at warn.
    #[must_use]
    pub fn read(&self) -> GuestCart {
        let raw = match self.storage.get(keys::CART) {
            Ok(Some(raw)) => raw,
            Ok(None) => return GuestCart::new(),
            Err(err) => {
                warn!(error = %err, "guest cart storage unavailable, treating as empty");
                return GuestCart::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(cart) => cart,
            Err(err) => {
                warn!(error = %err, "guest cart blob is malformed, treating as empty");
                GuestCart::new()
            }
        }
    }

    /// Total units currently in the cart.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.read().total_quantity()
    }

    /// Add a product, folding into an existing line for the same product.
    ///
    /// An empty `product_name` falls back to a generic display name.
    ///
    /// # Errors
    ///
    /// Returns an error when the line fails validation or the cart blob
    /// cannot be written.
    #[instrument(skip(self, product_name, price), fields(product_id = %product_id))]
    pub fn add(
        &self,
        product_id: ProductId,
        quantity: u32,
        product_name: &str,
        price: Decimal,
    ) -> Result<(), CartError> {
        let name = if product_name.is_empty() {
            FALLBACK_PRODUCT_NAME
        } else {
            product_name
        };
        let line = CartLineItem::new(product_id, quantity, name, price)?;

        let mut cart = self.read();
        cart.add(line);
        self.persist(&cart)?;

        debug!(total = cart.total_quantity(), "added to guest cart");
        Ok(())
    }

    /// Set the exact quantity of a product's line. A quantity of 0 removes
    /// the line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotInCart`] (persisting nothing) when the
    /// product has no line, or a storage error when the blob cannot be
    /// written.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub fn update(&self, product_id: ProductId, quantity: u32) -> Result<(), CartError> {
        let mut cart = self.read();
        if !cart.set_quantity(product_id, quantity) {
            return Err(CartError::NotInCart(product_id));
        }
        self.persist(&cart)?;

        debug!(quantity, "guest cart line updated");
        Ok(())
    }

    /// Remove a product's line. Removing an absent product is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error when the cart blob cannot be written.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub fn remove(&self, product_id: ProductId) -> Result<(), CartError> {
        let mut cart = self.read();
        cart.remove(product_id);
        self.persist(&cart)?;

        debug!("guest cart line removed");
        Ok(())
    }

    /// Drop all guest cart state and hide the badge.
    ///
    /// # Errors
    ///
    /// Returns an error when the persisted keys cannot be removed.
    #[instrument(skip(self))]
    pub fn clear(&self) -> Result<(), CartError> {
        self.storage.remove(keys::CART)?;
        self.storage.remove(keys::CART_COUNT)?;
        self.push_badge(0);

        debug!("guest cart cleared");
        Ok(())
    }

    /// Recompute the count and push it to the badge.
    ///
    /// Call once when the hosting page becomes ready, so the badge reflects
    /// a cart persisted by an earlier visit.
    pub fn refresh_badge(&self) {
        self.push_badge(self.count());
    }

    fn persist(&self, cart: &GuestCart) -> Result<(), CartError> {
        let blob = serde_json::to_string(cart)?;
        self.storage.set(keys::CART, &blob)?;

        // The count key is derived state; losing it must not fail the
        // mutation that already landed. The badge is skipped so it never
        // shows a count the key contradicts.
        let count = cart.total_quantity();
        if let Err(err) = self.storage.set(keys::CART_COUNT, &count.to_string()) {
            warn!(error = %err, "could not persist cart count, leaving badge stale");
            return Ok(());
        }

        self.push_badge(count);
        Ok(())
    }

    fn push_badge(&self, count: u32) {
        if let Some(badge) = &self.badge {
            badge.refresh(count);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::storage::MemoryStore;

    /// Badge recording every refresh it receives.
    #[derive(Default)]
    struct RecordingBadge {
        counts: Mutex<Vec<u32>>,
    }

    impl RecordingBadge {
        fn seen(&self) -> Vec<u32> {
            self.counts.lock().unwrap().clone()
        }
    }

    impl CartBadge for RecordingBadge {
        fn refresh(&self, count: u32) {
            self.counts.lock().unwrap().push(count);
        }
    }

    /// Store that fails writes to one specific key.
    struct FailingStore {
        inner: MemoryStore,
        fail_key: &'static str,
    }

    impl FailingStore {
        fn new(fail_key: &'static str) -> Self {
            Self {
                inner: MemoryStore::new(),
                fail_key,
            }
        }
    }

    impl KeyValueStore for FailingStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            if key == self.fail_key {
                return Err(StorageError::Io(std::io::Error::other("disk full")));
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.inner.remove(key)
        }
    }

    fn store_with_badge() -> (GuestCartStore, Arc<RecordingBadge>, Arc<MemoryStore>) {
        let storage = Arc::new(MemoryStore::new());
        let badge = Arc::new(RecordingBadge::default());
        let cart = GuestCartStore::new(Arc::clone(&storage) as Arc<dyn KeyValueStore>)
            .with_badge(Arc::clone(&badge) as Arc<dyn CartBadge>);
        (cart, badge, storage)
    }

    fn price() -> Decimal {
        Decimal::new(999, 2)
    }

    #[test]
    fn test_add_then_read_back() {
        let (cart, _badge, _storage) = store_with_badge();

        cart.add(ProductId::new(7), 2, "Widget", price()).unwrap();

        let read = cart.read();
        assert_eq!(read.len(), 1);
        assert_eq!(read.get(ProductId::new(7)).unwrap().quantity(), 2);
    }

    #[test]
    fn test_add_same_product_folds_into_one_line() {
        let (cart, _badge, storage) = store_with_badge();

        cart.add(ProductId::new(7), 2, "Widget", price()).unwrap();
        cart.add(ProductId::new(7), 1, "Widget", price()).unwrap();

        assert_eq!(
            storage.get(keys::CART).unwrap().unwrap(),
            r#"[{"productId":7,"quantity":3,"productName":"Widget","price":"9.99"}]"#
        );
        assert_eq!(storage.get(keys::CART_COUNT).unwrap().unwrap(), "3");
    }

    #[test]
    fn test_add_empty_name_gets_fallback() {
        let (cart, _badge, _storage) = store_with_badge();

        cart.add(ProductId::new(7), 1, "", price()).unwrap();

        assert_eq!(
            cart.read().get(ProductId::new(7)).unwrap().product_name(),
            FALLBACK_PRODUCT_NAME
        );
    }

    #[test]
    fn test_add_invalid_line_persists_nothing() {
        let (cart, badge, storage) = store_with_badge();

        let result = cart.add(ProductId::new(0), 1, "Widget", price());

        assert!(matches!(result, Err(CartError::Line(_))));
        assert_eq!(storage.get(keys::CART).unwrap(), None);
        assert!(badge.seen().is_empty());
    }

    #[test]
    fn test_update_sets_exact_quantity() {
        let (cart, _badge, _storage) = store_with_badge();
        cart.add(ProductId::new(7), 2, "Widget", price()).unwrap();

        cart.update(ProductId::new(7), 5).unwrap();

        assert_eq!(cart.count(), 5);
    }

    #[test]
    fn test_update_to_zero_removes_line() {
        let (cart, _badge, storage) = store_with_badge();
        cart.add(ProductId::new(7), 2, "Widget", price()).unwrap();

        cart.update(ProductId::new(7), 0).unwrap();

        assert!(cart.read().is_empty());
        assert_eq!(storage.get(keys::CART).unwrap().unwrap(), "[]");
        assert_eq!(storage.get(keys::CART_COUNT).unwrap().unwrap(), "0");
    }

    #[test]
    fn test_update_absent_product_persists_nothing() {
        let (cart, _badge, storage) = store_with_badge();
        cart.add(ProductId::new(7), 2, "Widget", price()).unwrap();
        let blob_before = storage.get(keys::CART).unwrap();

        let result = cart.update(ProductId::new(99), 4);

        assert!(matches!(result, Err(CartError::NotInCart(id)) if id == ProductId::new(99)));
        assert_eq!(storage.get(keys::CART).unwrap(), blob_before);
    }

    #[test]
    fn test_remove_absent_product_is_noop() {
        let (cart, _badge, _storage) = store_with_badge();
        cart.add(ProductId::new(7), 2, "Widget", price()).unwrap();

        cart.remove(ProductId::new(99)).unwrap();
        assert_eq!(cart.count(), 2);

        cart.remove(ProductId::new(7)).unwrap();
        assert_eq!(cart.count(), 0);
    }

    #[test]
    fn test_clear_drops_both_keys_and_zeroes_badge() {
        let (cart, badge, storage) = store_with_badge();
        cart.add(ProductId::new(7), 2, "Widget", price()).unwrap();

        cart.clear().unwrap();

        assert_eq!(storage.get(keys::CART).unwrap(), None);
        assert_eq!(storage.get(keys::CART_COUNT).unwrap(), None);
        assert_eq!(badge.seen().last().copied(), Some(0));
        assert!(cart.read().is_empty());
    }

    #[test]
    fn test_count_tracks_mutation_sequence() {
        let (cart, badge, _storage) = store_with_badge();

        cart.add(ProductId::new(1), 2, "A", price()).unwrap();
        cart.add(ProductId::new(2), 3, "B", price()).unwrap();
        cart.update(ProductId::new(1), 1).unwrap();
        cart.remove(ProductId::new(2)).unwrap();

        assert_eq!(cart.count(), 1);
        assert_eq!(badge.seen(), vec![2, 5, 4, 1]);
    }

    #[test]
    fn test_read_malformed_blob_as_empty() {
        let (cart, _badge, storage) = store_with_badge();
        storage.set(keys::CART, "{ not a cart").unwrap();

        assert!(cart.read().is_empty());
        assert_eq!(cart.count(), 0);
    }

    #[test]
    fn test_refresh_badge_pushes_persisted_count() {
        let storage = Arc::new(MemoryStore::new());
        storage
            .set(
                keys::CART,
                r#"[{"productId":7,"quantity":4,"productName":"Widget","price":"9.99"}]"#,
            )
            .unwrap();

        let badge = Arc::new(RecordingBadge::default());
        let cart = GuestCartStore::new(storage as Arc<dyn KeyValueStore>)
            .with_badge(Arc::clone(&badge) as Arc<dyn CartBadge>);

        cart.refresh_badge();
        assert_eq!(badge.seen(), vec![4]);
    }

    #[test]
    fn test_blob_write_failure_fails_the_operation() {
        let storage = Arc::new(FailingStore::new(keys::CART));
        let cart = GuestCartStore::new(storage as Arc<dyn KeyValueStore>);

        let result = cart.add(ProductId::new(7), 1, "Widget", price());
        assert!(matches!(result, Err(CartError::Storage(_))));
    }

    #[test]
    fn test_count_write_failure_keeps_operation_and_skips_badge() {
        let storage = Arc::new(FailingStore::new(keys::CART_COUNT));
        let badge = Arc::new(RecordingBadge::default());
        let cart = GuestCartStore::new(storage as Arc<dyn KeyValueStore>)
            .with_badge(Arc::clone(&badge) as Arc<dyn CartBadge>);

        cart.add(ProductId::new(7), 1, "Widget", price()).unwrap();

        assert_eq!(cart.count(), 1);
        assert!(badge.seen().is_empty());
    }

    #[test]
    fn test_no_badge_is_fine() {
        let cart = GuestCartStore::new(Arc::new(MemoryStore::new()));

        cart.add(ProductId::new(7), 1, "Widget", price()).unwrap();
        cart.refresh_badge();
        cart.clear().unwrap();
    }
}
