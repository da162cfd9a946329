//! GoMarketplace Core - Shared cart types library.
//!
//! This crate provides the domain types used across all GoMarketplace components:
//! - `cart` - The cart store, its storage backends and the provider scope
//! - `cli` - Command-line tools for inspecting and editing a persisted cart
//!
//! # Architecture
//!
//! The core crate contains only types and pure state transitions - no I/O, no
//! storage access, no async runtime. This keeps it lightweight and allows it to
//! be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Product IDs, prices, cart items and the cart state machine

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
