//! # Store Error Types
//!
//! Error types for document store and configuration operations.
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Store Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │   Documents     │  │  Serialization  │  │    Configuration        │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  NotFound       │  │  Serialization  │  │  ConfigLoadFailed       │ │
//! │  │  InvalidDocument│  │  Io             │  │  InvalidConfig          │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Store error type.
#[derive(Debug, Error)]
pub enum StoreError {
    // =========================================================================
    // Document Errors
    // =========================================================================
    /// No document with this id in the collection.
    #[error("{collection}/{id} not found")]
    NotFound { collection: String, id: String },

    /// A write carried something other than a JSON object.
    #[error("Invalid {collection} document: {reason}")]
    InvalidDocument { collection: String, reason: String },

    // =========================================================================
    // Serialization / I/O
    // =========================================================================
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Failed to read or parse the config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Configuration parsed but holds unusable values.
    #[error("Invalid counter configuration: {0}")]
    InvalidConfig(String),
}

impl From<toml::de::Error> for StoreError {
    fn from(err: toml::de::Error) -> Self {
        StoreError::ConfigLoadFailed(err.to_string())
    }
}

impl StoreError {
    pub fn not_found(collection: impl Into<String>, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            collection: collection.into(),
            id: id.into(),
        }
    }

    pub fn invalid_document(collection: impl Into<String>, reason: impl Into<String>) -> Self {
        StoreError::InvalidDocument {
            collection: collection.into(),
            reason: reason.into(),
        }
    }
}
