//! Mangosteen Client - storefront companion library.
//!
//! Everything a storefront shell needs before and around sign-in: a
//! persistent guest cart with badge upkeep, a login-time merge of that cart
//! into the server-side cart, and light/dark theme handling.
//!
//! # Architecture
//!
//! Storage and UI surfaces are injected traits. A browser shell backs
//! [`storage::KeyValueStore`] with web storage and implements the [`ui`]
//! traits against the DOM; a desktop shell or test supplies the file-backed
//! and in-memory implementations shipped here. All flows run against the
//! traits, never against a concrete platform.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod config;
pub mod merge;
pub mod storage;
pub mod theme;
pub mod ui;
