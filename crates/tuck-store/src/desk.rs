//! # Order Desk
//!
//! Everything the counter screens do to the store: catalog edits, order
//! drafting and submission, flag toggles and deletes.
//!
//! ## Submit Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Order Submission                                │
//! │                                                                         │
//! │  DraftOrder (caller-owned)                                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  latest Snapshot ──► rebase on the stored order (edits only)           │
//! │                  ──► reprice at current item prices                    │
//! │                  ──► revalidate every line                             │
//! │       │                                                                 │
//! │       ├── any line rejected ──► DeskError::StockRejected, no write     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  add (new order)  /  set_merge (edit)                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The final check reads the freshest snapshot but is not a transaction: two
//! tills submitting at the same instant can still both pass.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use tuck_core::record::{ItemRecord, OrderLinesRecord};
use tuck_core::stats::{item_stock_rows, ItemStockRow};
use tuck_core::validation::{
    parse_quantity, validate_customer_name, validate_item_name, validate_price_cents, validate_stock,
};
use tuck_core::{
    CoreError, DashboardStats, DraftLimits, DraftOrder, ExtraOrder, LineQuote, LineRejection, PaymentMethod,
    Preorder, Snapshot, StockCheck, StockOrder, StockPool, ValidationError,
};

use crate::config::CounterConfig;
use crate::error::StoreError;
use crate::store::{Collection, DocumentStore};

// =============================================================================
// Errors
// =============================================================================

/// Result type alias for desk operations.
pub type DeskResult<T> = Result<T, DeskError>;

/// What the counter screens see when an action fails.
///
/// On any error the caller's draft is left exactly as it was.
#[derive(Debug, Error)]
pub enum DeskError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// Lines that no longer fit against the latest snapshot.
    #[error("{} line(s) no longer fit the remaining stock", .0.len())]
    StockRejected(Vec<LineRejection>),

    /// Draft was started for the other order kind.
    #[error("Draft draws on {found} stock, expected {expected}")]
    PoolMismatch { expected: StockPool, found: StockPool },

    #[error("An order needs at least one line")]
    EmptyOrder,
}

// =============================================================================
// Stored Order Kinds
// =============================================================================

/// Ties each order kind to its collection and snapshot lookup.
trait StoredOrder: StockOrder {
    const COLLECTION: Collection;

    fn find<'s>(snapshot: &'s Snapshot, id: &str) -> Option<&'s Self>;
}

impl StoredOrder for Preorder {
    const COLLECTION: Collection = Collection::Preorders;

    fn find<'s>(snapshot: &'s Snapshot, id: &str) -> Option<&'s Self> {
        snapshot.find_preorder(id)
    }
}

impl StoredOrder for ExtraOrder {
    const COLLECTION: Collection = Collection::ExtraOrders;

    fn find<'s>(snapshot: &'s Snapshot, id: &str) -> Option<&'s Self> {
        snapshot.find_extra_order(id)
    }
}

// =============================================================================
// Item Form
// =============================================================================

/// Input of the item editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemForm {
    pub name: String,
    pub price_cents: i64,
    pub preorder_stock: i64,
    pub extra_stock: i64,
}

impl ItemForm {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_item_name(&self.name)?;
        validate_price_cents(self.price_cents)?;
        validate_stock("preorder stock", self.preorder_stock)?;
        validate_stock("extra stock", self.extra_stock)?;
        Ok(())
    }

    fn to_record(&self) -> ItemRecord {
        ItemRecord {
            name: self.name.trim().to_string(),
            price_cents: Some(self.price_cents),
            price: None,
            preorder_stock: self.preorder_stock,
            extra_stock: self.extra_stock,
        }
    }
}

// =============================================================================
// Order Desk
// =============================================================================

/// The counter's entry point for every store-changing action.
#[derive(Clone)]
pub struct OrderDesk {
    store: DocumentStore,
    limits: DraftLimits,
}

impl OrderDesk {
    pub fn new(store: DocumentStore, limits: DraftLimits) -> Self {
        OrderDesk { store, limits }
    }

    pub fn from_config(store: DocumentStore, config: &CounterConfig) -> Self {
        Self::new(store, config.draft_limits())
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.store.snapshot()
    }

    pub fn dashboard(&self) -> DashboardStats {
        DashboardStats::from_snapshot(&self.snapshot())
    }

    /// The catalog table with per-pool usage.
    pub fn item_rows(&self) -> Vec<ItemStockRow> {
        item_stock_rows(&self.snapshot())
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// Creates an item (`id == None`) or merges the form into an existing one.
    ///
    /// Returns the item's id.
    pub async fn save_item(&self, id: Option<&str>, form: &ItemForm) -> DeskResult<String> {
        form.validate()?;
        let doc = serde_json::to_value(form.to_record()).map_err(StoreError::from)?;

        let id = match id {
            Some(id) => {
                self.store.set_merge(Collection::Items, id, doc).await?;
                id.to_string()
            }
            None => self.store.add(Collection::Items, doc).await?,
        };

        info!(item_id = %id, name = %form.name.trim(), "Item saved");
        Ok(id)
    }

    /// Deletes an item. Orders that reference it are left alone.
    pub async fn delete_item(&self, id: &str) -> DeskResult<()> {
        self.store.delete(Collection::Items, id).await?;
        info!(item_id = %id, "Item deleted");
        Ok(())
    }

    // =========================================================================
    // Drafts
    // =========================================================================

    /// Starts an empty draft.
    pub fn new_draft(&self, pool: StockPool) -> DraftOrder {
        DraftOrder::new(pool).with_limits(self.limits)
    }

    /// Starts a draft prefilled from a stored preorder.
    pub fn edit_preorder(&self, id: &str) -> DeskResult<DraftOrder> {
        self.edit::<Preorder>(id)
    }

    /// Starts a draft prefilled from a stored extra order.
    pub fn edit_extra_order(&self, id: &str) -> DeskResult<DraftOrder> {
        self.edit::<ExtraOrder>(id)
    }

    fn edit<O: StoredOrder>(&self, id: &str) -> DeskResult<DraftOrder> {
        let snapshot = self.snapshot();
        let order = O::find(&snapshot, id).ok_or_else(|| CoreError::OrderNotFound(id.to_string()))?;
        Ok(DraftOrder::editing(order).with_limits(self.limits))
    }

    /// Live feedback for the item and quantity currently in the form.
    pub fn quote(&self, draft: &DraftOrder, item_id: &str, raw_quantity: &str) -> LineQuote {
        let snapshot = self.snapshot();
        draft.quote(
            snapshot.find_item(item_id),
            parse_quantity(raw_quantity),
            &snapshot.usage(draft.pool()),
        )
    }

    /// Adds the form's line to the draft if it fits.
    pub fn add_line(&self, draft: &mut DraftOrder, item_id: &str, raw_quantity: &str) -> DeskResult<StockCheck> {
        let snapshot = self.snapshot();
        let check = draft.add_line(
            snapshot.find_item(item_id),
            parse_quantity(raw_quantity),
            &snapshot.usage(draft.pool()),
        )?;

        if !check.ok {
            debug!(%item_id, reason = ?check.message(), "Line not added");
        }
        Ok(check)
    }

    // =========================================================================
    // Submission
    // =========================================================================

    /// Saves a preorder draft. Returns the order id.
    pub async fn submit_preorder(&self, draft: &DraftOrder, customer_name: &str) -> DeskResult<String> {
        validate_customer_name(customer_name)?;
        let settled = self.settle::<Preorder>(draft)?;

        let mut fields = Map::new();
        fields.insert("customerName".into(), json!(customer_name.trim()));
        if settled.editing_id().is_none() {
            fields.insert("couponGiven".into(), json!(false));
            fields.insert("couponRedeemed".into(), json!(false));
        }

        self.write_order::<Preorder>(&settled, fields).await
    }

    /// Saves an extra order draft. Returns the order id.
    pub async fn submit_extra_order(&self, draft: &DraftOrder, payment_method: PaymentMethod) -> DeskResult<String> {
        let settled = self.settle::<ExtraOrder>(draft)?;

        let mut fields = Map::new();
        fields.insert("paymentMethod".into(), json!(payment_method));
        if settled.editing_id().is_none() {
            fields.insert("paid".into(), json!(false));
        }

        self.write_order::<ExtraOrder>(&settled, fields).await
    }

    /// Re-checks a copy of the draft against the latest snapshot.
    fn settle<O: StoredOrder>(&self, draft: &DraftOrder) -> DeskResult<DraftOrder> {
        if draft.pool() != O::POOL {
            return Err(DeskError::PoolMismatch {
                expected: O::POOL,
                found: draft.pool(),
            });
        }
        if draft.is_empty() {
            return Err(DeskError::EmptyOrder);
        }

        let snapshot = self.snapshot();
        let mut settled = draft.clone();
        if let Some(id) = draft.editing_id() {
            let stored = O::find(&snapshot, id).ok_or_else(|| CoreError::OrderNotFound(id.to_string()))?;
            settled.rebase(stored);
        }
        settled.reprice(&snapshot.items);

        let rejections = settled.revalidate(&snapshot.items, &snapshot.usage(O::POOL));
        if !rejections.is_empty() {
            warn!(
                collection = %O::COLLECTION,
                rejected = rejections.len(),
                "Order no longer fits the remaining stock"
            );
            return Err(DeskError::StockRejected(rejections));
        }

        Ok(settled)
    }

    async fn write_order<O: StoredOrder>(&self, draft: &DraftOrder, mut fields: Map<String, Value>) -> DeskResult<String> {
        if let Value::Object(lines) =
            serde_json::to_value(OrderLinesRecord::from_lines(draft.lines())).map_err(StoreError::from)?
        {
            fields.extend(lines);
        }
        fields.insert("totalCostCents".into(), json!(draft.total_cost().cents()));

        let id = match draft.editing_id() {
            Some(id) => {
                self.store.set_merge(O::COLLECTION, id, Value::Object(fields)).await?;
                id.to_string()
            }
            None => self.store.add(O::COLLECTION, Value::Object(fields)).await?,
        };

        info!(
            collection = %O::COLLECTION,
            order_id = %id,
            lines = draft.lines().len(),
            total = %draft.total_cost(),
            "Order saved"
        );
        Ok(id)
    }

    // =========================================================================
    // Flags and Deletes
    // =========================================================================

    /// Flips `couponGiven` and returns the new value.
    pub async fn toggle_coupon_given(&self, id: &str) -> DeskResult<bool> {
        let current = self.find::<Preorder>(id)?.coupon_given;
        self.set_flag::<Preorder>(id, "couponGiven", !current).await
    }

    /// Flips `couponRedeemed` and returns the new value.
    pub async fn toggle_coupon_redeemed(&self, id: &str) -> DeskResult<bool> {
        let current = self.find::<Preorder>(id)?.coupon_redeemed;
        self.set_flag::<Preorder>(id, "couponRedeemed", !current).await
    }

    /// Flips `paid` and returns the new value.
    pub async fn toggle_paid(&self, id: &str) -> DeskResult<bool> {
        let current = self.find::<ExtraOrder>(id)?.paid;
        self.set_flag::<ExtraOrder>(id, "paid", !current).await
    }

    pub async fn delete_preorder(&self, id: &str) -> DeskResult<()> {
        self.delete_order::<Preorder>(id).await
    }

    pub async fn delete_extra_order(&self, id: &str) -> DeskResult<()> {
        self.delete_order::<ExtraOrder>(id).await
    }

    fn find<O: StoredOrder + Clone>(&self, id: &str) -> DeskResult<O> {
        O::find(&self.snapshot(), id)
            .cloned()
            .ok_or_else(|| CoreError::OrderNotFound(id.to_string()).into())
    }

    async fn set_flag<O: StoredOrder>(&self, id: &str, field: &str, value: bool) -> DeskResult<bool> {
        self.store.set_merge(O::COLLECTION, id, json!({ field: value })).await?;
        debug!(collection = %O::COLLECTION, order_id = %id, field, value, "Flag set");
        Ok(value)
    }

    async fn delete_order<O: StoredOrder>(&self, id: &str) -> DeskResult<()> {
        self.store.delete(O::COLLECTION, id).await?;
        info!(collection = %O::COLLECTION, order_id = %id, "Order deleted");
        Ok(())
    }
}
