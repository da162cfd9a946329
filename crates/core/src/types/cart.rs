//! Cart line items and the in-memory cart state machine.
//!
//! `CartState` is an ordered list of [`CartItem`]s keyed by [`ProductId`].
//! Quantities are `NonZeroU32`, so an item can never sit in the cart at zero:
//! decrementing the last unit removes the line instead.
//!
//! The persisted form is a JSON array of items:
//!
//! ```json
//! [{"id":"p1","title":"Shirt","image_url":"u","price":10.0,"quantity":2}]
//! ```

use std::collections::HashSet;
use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::id::ProductId;
use super::price::Price;

/// Errors raised when building a cart from untrusted data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartItemError {
    /// The same product appears on more than one line.
    #[error("Duplicate cart line for product: {0}")]
    DuplicateId(ProductId),
}

/// A stored line that could not be restored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    /// Position of the line in the stored array.
    pub index: usize,
    pub reason: String,
}

/// Product descriptor passed to `add`, i.e. a cart line without a quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCartItem {
    pub id: ProductId,
    pub title: String,
    pub image_url: String,
    pub price: Price,
}

impl NewCartItem {
    /// Create a new product descriptor.
    #[must_use]
    pub fn new(
        id: impl Into<ProductId>,
        title: impl Into<String>,
        image_url: impl Into<String>,
        price: Price,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            image_url: image_url.into(),
            price,
        }
    }
}

/// One distinct product in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: ProductId,
    pub title: String,
    pub image_url: String,
    pub price: Price,
    pub quantity: NonZeroU32,
}

impl CartItem {
    /// Build a line from a product descriptor with a quantity of one.
    #[must_use]
    pub fn from_new(item: NewCartItem) -> Self {
        Self {
            id: item.id,
            title: item.title,
            image_url: item.image_url,
            price: item.price,
            quantity: NonZeroU32::MIN,
        }
    }

    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }
}

/// Result of applying a cart mutation.
///
/// Lets callers tell "updated" apart from "id not found" without diffing
/// the cart before and after.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    /// A new line was appended with a quantity of one.
    Added,
    /// An existing line's quantity went up.
    Incremented { quantity: NonZeroU32 },
    /// An existing line's quantity went down and the line stays.
    Decremented { quantity: NonZeroU32 },
    /// The line had a quantity of one and was removed.
    Removed,
    /// No line matched the id; the cart is unchanged.
    NotFound,
}

impl MutationOutcome {
    /// Whether the mutation changed the cart.
    #[must_use]
    pub const fn changed(&self) -> bool {
        !matches!(self, Self::NotFound)
    }
}

/// Ordered cart contents with unique product ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<CartItem>", into = "Vec<CartItem>")]
pub struct CartState {
    items: Vec<CartItem>,
}

impl CartState {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build a cart from existing lines, keeping their order.
    ///
    /// # Errors
    ///
    /// Returns `CartItemError::DuplicateId` if two lines share a product id.
    pub fn from_items(items: Vec<CartItem>) -> Result<Self, CartItemError> {
        let mut seen = HashSet::with_capacity(items.len());
        for item in &items {
            if !seen.insert(&item.id) {
                return Err(CartItemError::DuplicateId(item.id.clone()));
            }
        }
        Ok(Self { items })
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Look up a line by product id.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items
            .iter()
            .map(|item| u64::from(item.quantity.get()))
            .sum()
    }

    /// Sum of all line totals.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Add one unit of a product.
    ///
    /// An existing line is incremented in place; otherwise a new line is
    /// appended with a quantity of one. The descriptor's title, image and
    /// price are ignored when the line already exists.
    pub fn add(&mut self, item: NewCartItem) -> MutationOutcome {
        match self.increment(&item.id) {
            MutationOutcome::NotFound => {
                self.items.push(CartItem::from_new(item));
                MutationOutcome::Added
            }
            outcome => outcome,
        }
    }

    /// Add one unit to an existing line.
    pub fn increment(&mut self, id: &ProductId) -> MutationOutcome {
        let Some(item) = self.items.iter_mut().find(|item| &item.id == id) else {
            return MutationOutcome::NotFound;
        };
        item.quantity = item.quantity.saturating_add(1);
        MutationOutcome::Incremented {
            quantity: item.quantity,
        }
    }

    /// Remove one unit from an existing line, dropping the line at zero.
    pub fn decrement(&mut self, id: &ProductId) -> MutationOutcome {
        let Some(position) = self.items.iter().position(|item| &item.id == id) else {
            return MutationOutcome::NotFound;
        };
        let Some(item) = self.items.get_mut(position) else {
            return MutationOutcome::NotFound;
        };
        match NonZeroU32::new(item.quantity.get() - 1) {
            Some(quantity) => {
                item.quantity = quantity;
                MutationOutcome::Decremented { quantity }
            }
            None => {
                self.items.remove(position);
                MutationOutcome::Removed
            }
        }
    }

    /// Serialize to the JSON storage blob.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse a JSON storage blob.
    ///
    /// # Errors
    ///
    /// Returns an error if the blob is not a valid item array, contains a
    /// zero quantity, or repeats a product id.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Parse a JSON storage blob, keeping every line that is valid on its own.
    ///
    /// Lines that fail to decode (missing fields, a zero quantity, a price
    /// outside the supported range) are skipped, as is any repeat of a
    /// product id already restored.
    ///
    /// # Errors
    ///
    /// Returns an error only if the blob is not a JSON array.
    pub fn from_json_lossy(json: &str) -> Result<(Self, Vec<SkippedLine>), serde_json::Error> {
        let lines: Vec<serde_json::Value> = serde_json::from_str(json)?;
        let mut items: Vec<CartItem> = Vec::with_capacity(lines.len());
        let mut skipped = Vec::new();

        for (index, line) in lines.into_iter().enumerate() {
            match serde_json::from_value::<CartItem>(line) {
                Ok(item) if items.iter().any(|existing| existing.id == item.id) => {
                    skipped.push(SkippedLine {
                        index,
                        reason: CartItemError::DuplicateId(item.id).to_string(),
                    });
                }
                Ok(item) => items.push(item),
                Err(e) => skipped.push(SkippedLine {
                    index,
                    reason: e.to_string(),
                }),
            }
        }

        Ok((Self { items }, skipped))
    }
}

impl TryFrom<Vec<CartItem>> for CartState {
    type Error = CartItemError;

    fn try_from(items: Vec<CartItem>) -> Result<Self, Self::Error> {
        Self::from_items(items)
    }
}

impl From<CartState> for Vec<CartItem> {
    fn from(state: CartState) -> Self {
        state.items
    }
}

impl<'a> IntoIterator for &'a CartState {
    type Item = &'a CartItem;
    type IntoIter = std::slice::Iter<'a, CartItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
