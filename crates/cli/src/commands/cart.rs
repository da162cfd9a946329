//! Cart commands.
//!
//! Each command mounts a provider over the file backend in
//! `config.storage_dir`, waits for hydration, applies at most one mutation,
//! waits for the write and prints the cart.

use std::fmt::Write as _;

use gomarketplace_cart::{
    CartConfig, CartError, CartHandle, CartProvider, CartUpdate, ConfigError, FileStorage,
    HydrationReport, PersistenceMode, use_cart,
};
use gomarketplace_core::{CartState, MutationOutcome, NewCartItem, Price, ProductId};
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur during cart commands.
#[derive(Debug, Error)]
pub enum CartCommandError {
    /// Configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Cart store failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// No cart line matched the given product.
    #[error("No cart line for product: {0}")]
    NotInCart(ProductId),
}

/// Print the stored cart.
pub async fn list(config: &CartConfig) -> Result<(), CartCommandError> {
    let (_provider, cart) = open(config).await?;
    print_cart(&cart.state());
    Ok(())
}

/// Add one unit of a product.
pub async fn add(
    config: &CartConfig,
    id: String,
    title: String,
    image_url: String,
    price: Decimal,
) -> Result<(), CartCommandError> {
    let (_provider, cart) = open(config).await?;
    let item = NewCartItem::new(id, title, image_url, Price::new(price));
    let id = item.id.clone();
    apply(&cart, &id, cart.add_to_cart(item)).await
}

/// Add one unit to an existing line.
pub async fn increment(config: &CartConfig, id: &str) -> Result<(), CartCommandError> {
    let (_provider, cart) = open(config).await?;
    let id = ProductId::new(id);
    apply(&cart, &id, cart.increment(&id)).await
}

/// Remove one unit from a line.
pub async fn decrement(config: &CartConfig, id: &str) -> Result<(), CartCommandError> {
    let (_provider, cart) = open(config).await?;
    let id = ProductId::new(id);
    apply(&cart, &id, cart.decrement(&id)).await
}

type Provider = CartProvider<FileStorage>;

async fn open(
    config: &CartConfig,
) -> Result<(Provider, CartHandle<FileStorage>), CartCommandError> {
    let storage = FileStorage::new(&config.storage_dir);
    tracing::debug!(path = %storage.path_for(&config.storage_key).display(), "Opening cart");

    if config.persistence == PersistenceMode::Snapshot {
        tracing::warn!("Snapshot persistence writes the state before each change");
    }

    let provider = CartProvider::mount(storage, config);
    match provider.hydrated().await {
        HydrationReport::Failed => {
            tracing::warn!("Stored cart could not be loaded; continuing with an empty cart");
        }
        HydrationReport::Restored { skipped, .. } if skipped > 0 => {
            tracing::warn!("Dropped {skipped} unreadable line(s) from the stored cart");
        }
        HydrationReport::Restored { .. } | HydrationReport::Empty => {}
    }
    let cart = use_cart(&provider.scope())?;
    Ok((provider, cart))
}

async fn apply(
    cart: &CartHandle<FileStorage>,
    id: &ProductId,
    update: CartUpdate,
) -> Result<(), CartCommandError> {
    update.persist.wait().await?;

    match update.outcome {
        MutationOutcome::NotFound => return Err(CartCommandError::NotInCart(id.clone())),
        MutationOutcome::Removed => tracing::info!("Removed {id} from cart"),
        MutationOutcome::Added => tracing::info!("Added {id} to cart"),
        MutationOutcome::Incremented { quantity } | MutationOutcome::Decremented { quantity } => {
            tracing::info!("{id} quantity is now {quantity}");
        }
    }

    print_cart(&cart.state());
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_cart(cart: &CartState) {
    println!("{}", render_cart(cart));
}

fn render_cart(cart: &CartState) -> String {
    if cart.is_empty() {
        return "Cart is empty".to_string();
    }

    let mut out = String::new();
    for item in cart {
        let _ = writeln!(
            out,
            "{:>4} x {:<24} {:>10} {:>10}  [{}]",
            item.quantity,
            item.title,
            item.price.to_string(),
            item.line_total().to_string(),
            item.id
        );
    }
    let _ = write!(
        out,
        "{} item(s), subtotal {}",
        cart.item_count(),
        cart.subtotal()
    );
    out
}
