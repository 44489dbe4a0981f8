//! # tuck-store: Document Store and Order Desk for the Tuckshop Counter
//!
//! This crate owns the three collections (items, preorders, extra orders),
//! publishes a fresh snapshot on every change, and implements the actions
//! behind the counter screens.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Tuckshop Counter Data Flow                         │
//! │                                                                         │
//! │  Front end action (save preorder)                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    tuck-store (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │  OrderDesk    │    │ DocumentStore │    │ CounterConfig│  │   │
//! │  │   │  (desk.rs)    │───►│  (store.rs)   │    │ (config.rs)  │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ drafts,       │    │ add           │    │ counter.toml │  │   │
//! │  │   │ submit,       │    │ set_merge     │    │ TUCK_* env   │  │   │
//! │  │   │ toggles       │    │ delete        │    │              │  │   │
//! │  │   └───────────────┘    └───────┬───────┘    └──────────────┘  │   │
//! │  └────────────────────────────────┼────────────────────────────────┘   │
//! │                                   │ watch<Arc<Snapshot>>               │
//! │                                   ▼                                     │
//! │                  tuck-core (ledger, stats) recomputes                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`store`] - Collections, change notification, seed loading
//! - [`desk`] - Catalog edits, order submission, flag toggles
//! - [`config`] - Counter configuration
//! - [`error`] - Store error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tuck_store::{CounterConfig, DocumentStore, OrderDesk};
//! use tuck_core::StockPool;
//!
//! let config = CounterConfig::load_or_default(None);
//! let desk = OrderDesk::from_config(DocumentStore::new(config.store.change_capacity), &config);
//!
//! let mut draft = desk.new_draft(StockPool::Preorder);
//! desk.add_line(&mut draft, &bun_id, "2")?;
//! let order_id = desk.submit_preorder(&draft, "Sam").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod desk;
pub mod error;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::CounterConfig;
pub use desk::{DeskError, DeskResult, ItemForm, OrderDesk};
pub use error::{StoreError, StoreResult};
pub use store::{ChangeEvent, ChangeKind, Collection, DocumentStore, Seed};
