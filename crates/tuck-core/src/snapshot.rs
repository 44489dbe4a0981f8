//! # Snapshot
//!
//! An immutable view of all three collections at one moment.
//!
//! The store builds a new `Snapshot` after every write and pushes it to
//! subscribers; the ledger and the statistics only ever read one. Nothing
//! holds a mutable mirror of store state.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ledger::{remaining_capacity, usage_of, RemainingCapacity, Usage};
use crate::types::{ExtraOrder, Item, Preorder, StockOrder, StockPool};

/// Items, preorders and extra orders as of one store change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub items: Vec<Item>,
    pub preorders: Vec<Preorder>,
    pub extra_orders: Vec<ExtraOrder>,
}

impl Snapshot {
    pub fn find_item(&self, id: &str) -> Option<&Item> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn find_preorder(&self, id: &str) -> Option<&Preorder> {
        self.preorders.iter().find(|o| o.id == id)
    }

    pub fn find_extra_order(&self, id: &str) -> Option<&ExtraOrder> {
        self.extra_orders.iter().find(|o| o.id == id)
    }

    /// Committed usage for one pool.
    pub fn usage(&self, pool: StockPool) -> Usage {
        match pool {
            StockPool::Preorder => usage_of(&self.preorders),
            StockPool::Extra => usage_of(&self.extra_orders),
        }
    }

    /// Floored remaining totals for the dashboard.
    pub fn remaining_capacity(&self) -> RemainingCapacity {
        remaining_capacity(&self.items, &self.preorders, &self.extra_orders)
    }

    /// Puts the collections in display order.
    ///
    /// Items sort by name; orders by creation time, with undated (legacy)
    /// orders first. Ties fall back to the id so the order is total.
    pub fn sort(&mut self) {
        self.items
            .sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        sort_orders(&mut self.preorders);
        sort_orders(&mut self.extra_orders);
    }
}

fn sort_orders<O: StockOrder>(orders: &mut [O]) {
    orders.sort_by(|a, b| {
        a.created_at()
            .cmp(&b.created_at())
            .then_with(|| a.id().cmp(b.id()))
    });
}
