//! # Counter Configuration
//!
//! Configuration for one counter installation.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     TUCK_SHOP_NAME="Bright Bears"                                      │
//! │     TUCK_MAX_LINE_QUANTITY=50                                          │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/tuckshop/counter.toml (Linux)                            │
//! │     ~/Library/Application Support/org.tuckshop.counter/counter.toml    │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # counter.toml
//! [shop]
//! name = "Bright Bears Tuckshop"
//!
//! [store]
//! seed_path = "/srv/tuckshop/seed.json"
//! change_capacity = 256
//!
//! [limits]
//! max_line_quantity = 999
//! max_draft_lines = 100
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use tuck_core::{DraftLimits, MAX_DRAFT_LINES, MAX_LINE_QUANTITY};

use crate::error::{StoreError, StoreResult};
use crate::store::DEFAULT_CHANGE_CAPACITY;

// =============================================================================
// Sections
// =============================================================================

/// The shop this counter belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopConfig {
    #[serde(default = "default_shop_name")]
    pub name: String,
}

fn default_shop_name() -> String {
    "Tuckshop".to_string()
}

impl Default for ShopConfig {
    fn default() -> Self {
        ShopConfig {
            name: default_shop_name(),
        }
    }
}

/// Document store settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSettings {
    /// JSON seed loaded into a fresh store, if any.
    #[serde(default)]
    pub seed_path: Option<PathBuf>,

    /// Change events a subscriber may lag behind before missing some.
    #[serde(default = "default_change_capacity")]
    pub change_capacity: usize,
}

fn default_change_capacity() -> usize {
    DEFAULT_CHANGE_CAPACITY
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            seed_path: None,
            change_capacity: default_change_capacity(),
        }
    }
}

/// Order form limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitSettings {
    #[serde(default = "default_max_line_quantity")]
    pub max_line_quantity: i64,

    #[serde(default = "default_max_draft_lines")]
    pub max_draft_lines: usize,
}

fn default_max_line_quantity() -> i64 {
    MAX_LINE_QUANTITY
}

fn default_max_draft_lines() -> usize {
    MAX_DRAFT_LINES
}

impl Default for LimitSettings {
    fn default() -> Self {
        LimitSettings {
            max_line_quantity: default_max_line_quantity(),
            max_draft_lines: default_max_draft_lines(),
        }
    }
}

// =============================================================================
// Counter Configuration
// =============================================================================

/// Complete counter configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterConfig {
    #[serde(default)]
    pub shop: ShopConfig,

    #[serde(default)]
    pub store: StoreSettings,

    #[serde(default)]
    pub limits: LimitSettings,
}

impl CounterConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (counter.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> StoreResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading counter config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load counter config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Validates the configuration.
    pub fn validate(&self) -> StoreResult<()> {
        if self.shop.name.trim().is_empty() {
            return Err(StoreError::InvalidConfig("shop name must not be empty".into()));
        }

        if self.store.change_capacity == 0 {
            return Err(StoreError::InvalidConfig(
                "change_capacity must be greater than 0".into(),
            ));
        }

        if self.limits.max_line_quantity <= 0 {
            return Err(StoreError::InvalidConfig(
                "max_line_quantity must be greater than 0".into(),
            ));
        }

        if self.limits.max_draft_lines == 0 {
            return Err(StoreError::InvalidConfig(
                "max_draft_lines must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies `TUCK_*` overrides from any key lookup.
    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(name) = var("TUCK_SHOP_NAME") {
            self.shop.name = name;
        }

        if let Some(path) = var("TUCK_SEED_PATH") {
            debug!(path = %path, "Overriding seed path from environment");
            self.store.seed_path = Some(PathBuf::from(path));
        }

        if let Some(qty) = var("TUCK_MAX_LINE_QUANTITY") {
            match qty.parse::<i64>() {
                Ok(q) => self.limits.max_line_quantity = q,
                Err(_) => warn!(value = %qty, "Ignoring unparsable TUCK_MAX_LINE_QUANTITY"),
            }
        }

        if let Some(lines) = var("TUCK_MAX_DRAFT_LINES") {
            match lines.parse::<usize>() {
                Ok(n) => self.limits.max_draft_lines = n,
                Err(_) => warn!(value = %lines, "Ignoring unparsable TUCK_MAX_DRAFT_LINES"),
            }
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("org", "tuckshop", "counter")
            .map(|dirs| dirs.config_dir().join("counter.toml"))
    }

    /// Limits to hand to every new draft.
    pub fn draft_limits(&self) -> DraftLimits {
        DraftLimits {
            max_line_quantity: self.limits.max_line_quantity,
            max_lines: self.limits.max_draft_lines,
        }
    }
}
