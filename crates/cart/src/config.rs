//! Cart configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `GOMARKETPLACE_STORAGE_KEY` - Storage key holding the cart blob (default: `@GoMarketPlace`)
//! - `GOMARKETPLACE_STORAGE_DIR` - Directory for the file backend (default: `.gomarketplace`)
//! - `GOMARKETPLACE_PERSISTENCE` - `next-state` or `snapshot` (default: `next-state`)

use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

/// Storage key used by the original mobile app.
pub const DEFAULT_STORAGE_KEY: &str = "@GoMarketPlace";
const DEFAULT_STORAGE_DIR: &str = ".gomarketplace";

const STORAGE_KEY_VAR: &str = "GOMARKETPLACE_STORAGE_KEY";
const STORAGE_DIR_VAR: &str = "GOMARKETPLACE_STORAGE_DIR";
const PERSISTENCE_VAR: &str = "GOMARKETPLACE_PERSISTENCE";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Which state a mutation writes to storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PersistenceMode {
    /// Write the state produced by the mutation.
    #[default]
    NextState,
    /// Write the state as it was before the mutation.
    ///
    /// Storage lags one transition behind memory. Matches carts written by
    /// the legacy mobile client.
    Snapshot,
}

impl PersistenceMode {
    /// Canonical configuration value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NextState => "next-state",
            Self::Snapshot => "snapshot",
        }
    }
}

impl std::fmt::Display for PersistenceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PersistenceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "next-state" | "next_state" => Ok(Self::NextState),
            "snapshot" | "legacy" => Ok(Self::Snapshot),
            other => Err(format!(
                "unknown persistence mode '{other}' (expected next-state or snapshot)"
            )),
        }
    }
}

/// Cart store configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartConfig {
    /// Key under which the whole cart is stored
    pub storage_key: String,
    /// Directory used by the file storage backend
    pub storage_dir: PathBuf,
    /// Which state each mutation persists
    pub persistence: PersistenceMode,
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            persistence: PersistenceMode::default(),
        }
    }
}

impl CartConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let storage_key = lookup(STORAGE_KEY_VAR).unwrap_or_else(|| DEFAULT_STORAGE_KEY.to_string());
        if storage_key.trim().is_empty() {
            return Err(ConfigError::InvalidEnvVar(
                STORAGE_KEY_VAR.to_string(),
                "must not be empty".to_string(),
            ));
        }

        let storage_dir = lookup(STORAGE_DIR_VAR)
            .map_or_else(|| PathBuf::from(DEFAULT_STORAGE_DIR), PathBuf::from);

        let persistence = lookup(PERSISTENCE_VAR)
            .map(|value| value.parse::<PersistenceMode>())
            .transpose()
            .map_err(|e| ConfigError::InvalidEnvVar(PERSISTENCE_VAR.to_string(), e))?
            .unwrap_or_default();

        Ok(Self {
            storage_key,
            storage_dir,
            persistence,
        })
    }
}
