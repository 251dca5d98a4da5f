//! Guest cart line items and the pure cart algebra.
//!
//! A guest cart is an ordered list of line items with at most one line per
//! product. All operations here are pure; persistence and UI effects live in
//! the client crate.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::id::ProductId;

/// Errors that can occur when constructing a [`CartLineItem`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum LineItemError {
    /// The product ID is zero or negative.
    #[error("product id must be positive, got {id}")]
    InvalidProductId {
        /// The rejected raw ID value.
        id: i64,
    },
    /// The quantity is zero.
    #[error("quantity must be at least 1")]
    ZeroQuantity,
    /// The price is negative.
    #[error("price cannot be negative, got {price}")]
    NegativePrice {
        /// The rejected price.
        price: Decimal,
    },
}

/// One line of a guest cart.
///
/// Serialized with the storefront's camelCase wire names. `productName` and
/// `price` are display-only and default when absent, so blobs written by
/// other producers that omit them still decode.
///
/// ## Constraints
///
/// - Product ID: strictly positive
/// - Quantity: at least 1 (a line that would reach 0 is removed instead)
/// - Price: non-negative, in the currency's standard unit
///
/// ## Examples
///
/// ```
/// use mangosteen_core::CartLineItem;
/// use rust_decimal::Decimal;
///
/// // Valid line items
/// assert!(CartLineItem::new(7, 2, "Widget", Decimal::new(999, 2)).is_ok());
///
/// // Invalid line items
/// assert!(CartLineItem::new(0, 1, "Widget", Decimal::ZERO).is_err());  // bad id
/// assert!(CartLineItem::new(7, 0, "Widget", Decimal::ZERO).is_err());  // zero quantity
/// assert!(CartLineItem::new(7, 1, "Widget", Decimal::new(-1, 0)).is_err()); // negative price
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    product_id: ProductId,
    quantity: u32,
    #[serde(default)]
    product_name: String,
    #[serde(default)]
    price: Decimal,
}

impl CartLineItem {
    /// Create a validated line item.
    ///
    /// # Errors
    ///
    /// Returns an error if the product ID is not strictly positive, the
    /// quantity is zero, or the price is negative.
    pub fn new(
        product_id: impl Into<ProductId>,
        quantity: u32,
        product_name: impl Into<String>,
        price: Decimal,
    ) -> Result<Self, LineItemError> {
        let product_id = product_id.into();

        if product_id.as_i64() <= 0 {
            return Err(LineItemError::InvalidProductId {
                id: product_id.as_i64(),
            });
        }

        if quantity == 0 {
            return Err(LineItemError::ZeroQuantity);
        }

        if price < Decimal::ZERO {
            return Err(LineItemError::NegativePrice { price });
        }

        Ok(Self {
            product_id,
            quantity,
            product_name: product_name.into(),
            price,
        })
    }

    /// The product this line refers to.
    #[must_use]
    pub const fn product_id(&self) -> ProductId {
        self.product_id
    }

    /// Units of the product in the cart.
    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Display name captured when the line was added.
    #[must_use]
    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    /// Unit price captured when the line was added.
    #[must_use]
    pub const fn price(&self) -> Decimal {
        self.price
    }
}

/// An ordered guest cart with at most one line per product.
///
/// Lines keep their first-add order; adding an existing product folds into
/// the existing line instead of appending. Serializes transparently as the
/// JSON array of its line items, which is exactly the persisted blob format.
///
/// ## Examples
///
/// ```
/// use mangosteen_core::{CartLineItem, GuestCart};
/// use rust_decimal::Decimal;
///
/// let mut cart = GuestCart::new();
/// cart.add(CartLineItem::new(7, 2, "Widget", Decimal::new(999, 2))?);
/// cart.add(CartLineItem::new(7, 1, "Widget", Decimal::new(999, 2))?);
///
/// assert_eq!(cart.len(), 1);
/// assert_eq!(cart.total_quantity(), 3);
/// # Ok::<(), mangosteen_core::LineItemError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuestCart {
    items: Vec<CartLineItem>,
}

impl GuestCart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Create a cart from existing line items.
    ///
    /// Lines are folded through [`add`](Self::add), so duplicate product IDs
    /// collapse into single lines.
    #[must_use]
    pub fn from_items(items: Vec<CartLineItem>) -> Self {
        let mut cart = Self::new();
        for item in items {
            cart.add(item);
        }
        cart
    }

    /// Add a line item, folding into an existing line for the same product.
    ///
    /// When the product is already in the cart, its quantity is increased by
    /// the new line's quantity (saturating) and the stored name and price are
    /// kept; otherwise the line is appended.
    pub fn add(&mut self, line: CartLineItem) {
        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|item| item.product_id == line.product_id)
        {
            existing.quantity = existing.quantity.saturating_add(line.quantity);
        } else {
            self.items.push(line);
        }
    }

    /// Set the exact quantity of a product's line.
    ///
    /// A quantity of 0 removes the line. Returns `false` (and changes
    /// nothing) when the product is not in the cart.
    pub fn set_quantity(&mut self, product_id: ProductId, quantity: u32) -> bool {
        let Some(pos) = self
            .items
            .iter()
            .position(|item| item.product_id == product_id)
        else {
            return false;
        };

        if quantity == 0 {
            self.items.remove(pos);
        } else if let Some(item) = self.items.get_mut(pos) {
            item.quantity = quantity;
        }
        true
    }

    /// Remove a product's line. Removing an absent product is a no-op.
    pub fn remove(&mut self, product_id: ProductId) {
        self.items.retain(|item| item.product_id != product_id);
    }

    /// Look up the line for a product.
    #[must_use]
    pub fn get(&self, product_id: ProductId) -> Option<&CartLineItem> {
        self.items.iter().find(|item| item.product_id == product_id)
    }

    /// Total units across all lines (saturating).
    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |total, item| total.saturating_add(item.quantity))
    }

    /// Number of distinct product lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The lines in first-add order.
    #[must_use]
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }
}
