//! # Statistics
//!
//! Read-only figures for the settings table, the order lists and the
//! dashboard.
//!
//! ## Dashboard Layout
//! ```text
//! ┌──────────────┬──────────────────┬──────────────────┬────────────────┐
//! │ Items        │ Preorders        │ Extra orders     │ Revenue        │
//! │ total_items  │ total_preorders  │ total_extra_...  │ total_revenue  │
//! ├──────────────┼──────────────────┼──────────────────┼────────────────┤
//! │ Preorder     │ Extra            │ Coupons given    │ Coupons        │
//! │ remaining    │ remaining        │                  │ redeemed       │
//! └──────────────┴──────────────────┴──────────────────┴────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::snapshot::Snapshot;
use crate::types::{StockOrder, StockPool};

// =============================================================================
// Per-Item Stock
// =============================================================================

/// Capacity, usage and what is left of one pool for one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PoolStock {
    pub capacity: i64,
    pub used: i64,
    /// Not floored: an oversold item shows a negative number here.
    pub remaining: i64,
}

/// One row of the catalog table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ItemStockRow {
    pub item_id: String,
    pub name: String,
    pub price: Money,
    pub preorder: PoolStock,
    pub extra: PoolStock,
}

/// Builds the catalog table in snapshot order.
pub fn item_stock_rows(snapshot: &Snapshot) -> Vec<ItemStockRow> {
    let preorder_usage = snapshot.usage(StockPool::Preorder);
    let extra_usage = snapshot.usage(StockPool::Extra);

    snapshot
        .items
        .iter()
        .map(|item| {
            let pool = |pool: StockPool, used: i64| PoolStock {
                capacity: item.capacity(pool),
                used,
                remaining: item.capacity(pool) - used,
            };
            ItemStockRow {
                item_id: item.id.clone(),
                name: item.name.clone(),
                price: item.price,
                preorder: pool(StockPool::Preorder, preorder_usage.get(&item.id)),
                extra: pool(StockPool::Extra, extra_usage.get(&item.id)),
            }
        })
        .collect()
}

// =============================================================================
// Order Lists
// =============================================================================

/// Count and value shown under an order list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub count: usize,
    pub total_value: Money,
}

pub fn order_summary<O: StockOrder>(orders: &[O]) -> OrderSummary {
    OrderSummary {
        count: orders.len(),
        total_value: orders.iter().map(StockOrder::total_cost).sum(),
    }
}

// =============================================================================
// Dashboard
// =============================================================================

/// Headline figures for the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_items: usize,
    pub total_preorders: usize,
    pub total_extra_orders: usize,
    pub preorder_remaining: i64,
    pub extra_remaining: i64,
    pub coupons_given: usize,
    pub coupons_redeemed: usize,
    pub total_revenue: Money,
}

impl DashboardStats {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let remaining = snapshot.remaining_capacity();
        let preorders = order_summary(&snapshot.preorders);
        let extras = order_summary(&snapshot.extra_orders);

        DashboardStats {
            total_items: snapshot.items.len(),
            total_preorders: preorders.count,
            total_extra_orders: extras.count,
            preorder_remaining: remaining.preorder_remaining,
            extra_remaining: remaining.extra_remaining,
            coupons_given: snapshot.preorders.iter().filter(|p| p.coupon_given).count(),
            coupons_redeemed: snapshot.preorders.iter().filter(|p| p.coupon_redeemed).count(),
            total_revenue: preorders.total_value + extras.total_value,
        }
    }
}
