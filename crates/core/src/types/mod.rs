//! Core types for GoMarketplace.
//!
//! This module provides type-safe wrappers for cart domain concepts.

pub mod cart;
pub mod id;
pub mod price;

pub use cart::{CartItem, CartItemError, CartState, MutationOutcome, NewCartItem, SkippedLine};
pub use id::*;
pub use price::Price;
