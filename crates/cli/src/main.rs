//! GoMarketplace CLI - Inspect and edit a persisted cart.
//!
//! # Usage
//!
//! ```bash
//! # Show the stored cart
//! gm-cli list
//!
//! # Add one unit of a product
//! gm-cli add --id p1 --title "Shirt" --image-url https://cdn.example/shirt.png --price 10
//!
//! # Change quantities
//! gm-cli increment p1
//! gm-cli decrement p1
//! ```
//!
//! Configuration comes from `GOMARKETPLACE_*` environment variables (see
//! `gomarketplace_cart::config`). Set `RUST_LOG=debug` for store tracing.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use gomarketplace_cart::CartConfig;
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "gm-cli")]
#[command(author, version, about = "GoMarketplace cart tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the stored cart
    List,
    /// Add one unit of a product
    Add {
        /// Product ID
        #[arg(long)]
        id: String,

        /// Display name
        #[arg(long)]
        title: String,

        /// Product image URL
        #[arg(long)]
        image_url: String,

        /// Unit price (e.g. 19.99)
        #[arg(long)]
        price: Decimal,
    },
    /// Add one unit to an existing line
    Increment {
        /// Product ID
        id: String,
    },
    /// Remove one unit from a line, dropping it at zero
    Decrement {
        /// Product ID
        id: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing on stderr so stdout stays clean for the cart listing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::cart::CartCommandError> {
    let config = CartConfig::from_env()?;

    match cli.command {
        Commands::List => commands::cart::list(&config).await,
        Commands::Add {
            id,
            title,
            image_url,
            price,
        } => commands::cart::add(&config, id, title, image_url, price).await,
        Commands::Increment { id } => commands::cart::increment(&config, &id).await,
        Commands::Decrement { id } => commands::cart::decrement(&config, &id).await,
    }
}
