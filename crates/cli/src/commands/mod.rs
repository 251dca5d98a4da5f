//! CLI command implementations.

pub mod cart;
pub mod merge;
pub mod theme;
