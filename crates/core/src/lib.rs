//! Mangosteen Core - Shared types library.
//!
//! This crate provides common types used across all Mangosteen components:
//! - `client` - Guest cart, cart merge, and theme handling for storefront embedders
//! - `cli` - Command-line harness for local carts and merges
//!
//! # Architecture
//!
//! The core crate contains only types and pure operations - no I/O, no storage
//! access, no HTTP clients. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Guest cart line items and cart algebra, type-safe IDs, theme
//!   and merge-response types

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
