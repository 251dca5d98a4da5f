//! Core types for Mangosteen.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod id;
pub mod merge;
pub mod theme;

pub use cart::{CartLineItem, GuestCart, LineItemError};
pub use id::ProductId;
pub use merge::MergeResponse;
pub use theme::Theme;
