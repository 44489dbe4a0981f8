//! # tuck-core: Pure Business Logic for the Tuckshop Counter
//!
//! This crate holds the stock ledger and everything the counter computes from
//! a store snapshot, as pure functions with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Tuckshop Counter Architecture                       │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Web front end                                │   │
//! │  │   Items table ─ Preorder dialog ─ Extra dialog ─ Dashboard      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               tuck-store (order desk + document store)          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ Snapshot                               │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tuck-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐  │   │
//! │  │   │ record  │ │ ledger  │ │  draft  │ │  stats  │ │  money  │  │   │
//! │  │   │ shapes  │ │ usage   │ │  lines  │ │dashboard│ │  cents  │  │   │
//! │  │   │ decode  │ │ checks  │ │ staging │ │  rows   │ │         │  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └─────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO STORE ACCESS • PURE FUNCTIONS                     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Items, line items, the two order kinds, stock pools
//! - [`record`] - Store document shapes and their normalization
//! - [`ledger`] - Committed usage, availability checks, remaining capacity
//! - [`draft`] - Multi-line orders under construction
//! - [`snapshot`] - One consistent view of all collections
//! - [`stats`] - Catalog table, order list summaries, dashboard
//! - [`money`] - Integer-cent money
//! - [`validation`] - Form input rules
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use tuck_core::ledger::{check_availability, usage_of, OrderContext};
//! use tuck_core::{Item, LineItem, Money, Preorder, StockPool};
//!
//! let bun = Item {
//!     id: "bun".into(),
//!     name: "Bun".into(),
//!     price: Money::from_cents(1250),
//!     preorder_stock: 10,
//!     extra_stock: 0,
//! };
//! let order = Preorder {
//!     id: "p1".into(),
//!     customer_name: "Sam".into(),
//!     lines: vec![LineItem::priced(&bun, 7)],
//!     total_cost: Money::from_cents(8750),
//!     coupon_given: false,
//!     coupon_redeemed: false,
//!     created_at: None,
//! };
//!
//! let usage = usage_of([&order]);
//! let check = check_availability(Some(&bun), 3, &usage, StockPool::Preorder, OrderContext::NONE);
//! assert!(check.ok);
//! assert_eq!(check.remaining_after, 0);
//! ```

pub mod draft;
pub mod error;
pub mod ledger;
pub mod money;
pub mod record;
pub mod snapshot;
pub mod stats;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use draft::{DraftLimits, DraftOrder, LineQuote, LineRejection};
pub use error::{CoreError, CoreResult, ValidationError};
pub use ledger::{RemainingCapacity, StockCheck, StockShortfall, Usage};
pub use money::Money;
pub use snapshot::Snapshot;
pub use stats::DashboardStats;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity on a single order line.
///
/// ## Business Reason
/// Catches a slipped finger (typing 100 instead of 10) before it eats a
/// whole pool.
pub const MAX_LINE_QUANTITY: i64 = 999;

/// Maximum number of lines in one order.
pub const MAX_DRAFT_LINES: usize = 100;

/// Maximum length of item and customer names.
pub const MAX_NAME_LENGTH: usize = 100;

/// Ceiling for quantities, stocks and amounts read back from store documents.
///
/// Documents can be written by other clients, so a stored number is clamped
/// here before the ledger sums it.
pub const MAX_STORED_NUMBER: i64 = 1_000_000_000_000;
