//! # Domain Types
//!
//! Core domain types used throughout the tuckshop counter.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Item       │   │    Preorder     │   │   ExtraOrder    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id             │   │  id             │       │
//! │  │  name           │   │  customer_name  │   │  lines[]        │       │
//! │  │  price          │   │  lines[]        │   │  total_cost     │       │
//! │  │  preorder_stock │   │  total_cost     │   │  paid           │       │
//! │  │  extra_stock    │   │  coupon flags   │   │  payment_method │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │           ▲                     │                     │                 │
//! │           └──── LineItem.item_id ◄────────────────────┘                 │
//! │                                                                         │
//! │  StockPool::Preorder ──► preorder_stock   (Preorder lines draw here)    │
//! │  StockPool::Extra    ──► extra_stock      (ExtraOrder lines draw here)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Items have no back-reference to orders. The two pools are independent: a
//! unit of preorder stock never satisfies an extra order and vice versa.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Stock Pool
// =============================================================================

/// One of the two independently tracked stock pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum StockPool {
    /// Capacity set aside for preorders (redeemed later by coupon).
    Preorder,
    /// Capacity for walk-up orders.
    Extra,
}

impl fmt::Display for StockPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StockPool::Preorder => write!(f, "preorder"),
            StockPool::Extra => write!(f, "extra"),
        }
    }
}

// =============================================================================
// Item
// =============================================================================

/// A sellable catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Opaque store id.
    pub id: String,

    /// Display name shown on the order forms.
    pub name: String,

    /// Unit price.
    pub price: Money,

    /// Units reserved for preorders.
    pub preorder_stock: i64,

    /// Units available for walk-up orders.
    pub extra_stock: i64,
}

impl Item {
    /// Returns the capacity of the given pool.
    #[inline]
    pub fn capacity(&self, pool: StockPool) -> i64 {
        match pool {
            StockPool::Preorder => self.preorder_stock,
            StockPool::Extra => self.extra_stock,
        }
    }
}

// =============================================================================
// Line Item
// =============================================================================

/// One line of an order.
///
/// `cost` is frozen when the order is saved; a later price change on the
/// item does not touch existing orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub item_id: String,
    pub quantity: i64,
    pub cost: Money,
}

impl LineItem {
    /// Creates a line priced at the item's current price.
    pub fn priced(item: &Item, quantity: i64) -> Self {
        LineItem {
            item_id: item.id.clone(),
            quantity,
            cost: item.price.multiply_quantity(quantity),
        }
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// How a walk-up order was (or will be) paid.
///
/// Methods the counter does not know are kept verbatim so a round trip
/// through the store never loses them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    Other(String),
}

impl From<String> for PaymentMethod {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "cash" => PaymentMethod::Cash,
            "card" => PaymentMethod::Card,
            _ => PaymentMethod::Other(value),
        }
    }
}

impl From<PaymentMethod> for String {
    fn from(method: PaymentMethod) -> Self {
        method.to_string()
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMethod::Cash => write!(f, "cash"),
            PaymentMethod::Card => write!(f, "card"),
            PaymentMethod::Other(other) => write!(f, "{}", other),
        }
    }
}

// =============================================================================
// Orders
// =============================================================================

/// An order placed ahead of time and collected later with a coupon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Preorder {
    pub id: String,
    pub customer_name: String,
    pub lines: Vec<LineItem>,
    pub total_cost: Money,
    /// Coupon handed to the customer.
    pub coupon_given: bool,
    /// Coupon exchanged for the goods.
    pub coupon_redeemed: bool,
    #[ts(as = "Option<String>")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A walk-up order fulfilled at the counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ExtraOrder {
    pub id: String,
    pub lines: Vec<LineItem>,
    pub total_cost: Money,
    pub paid: bool,
    #[ts(type = "string")]
    pub payment_method: PaymentMethod,
    #[ts(as = "Option<String>")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Common view over both order kinds.
///
/// `POOL` ties each kind to the stock pool its lines draw from, so callers
/// cannot account a preorder against extra stock by accident.
pub trait StockOrder {
    const POOL: StockPool;

    fn id(&self) -> &str;
    fn lines(&self) -> &[LineItem];
    fn total_cost(&self) -> Money;
    fn created_at(&self) -> Option<DateTime<Utc>>;
}

impl StockOrder for Preorder {
    const POOL: StockPool = StockPool::Preorder;

    fn id(&self) -> &str {
        &self.id
    }

    fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    fn total_cost(&self) -> Money {
        self.total_cost
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }
}

impl StockOrder for ExtraOrder {
    const POOL: StockPool = StockPool::Extra;

    fn id(&self) -> &str {
        &self.id
    }

    fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    fn total_cost(&self) -> Money {
        self.total_cost
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bun() -> Item {
        Item {
            id: "bun".to_string(),
            name: "Bun".to_string(),
            price: Money::from_cents(1250),
            preorder_stock: 10,
            extra_stock: 4,
        }
    }

    #[test]
    fn test_capacity_per_pool() {
        let item = bun();
        assert_eq!(item.capacity(StockPool::Preorder), 10);
        assert_eq!(item.capacity(StockPool::Extra), 4);
    }

    #[test]
    fn test_priced_line_freezes_cost() {
        let mut item = bun();
        let line = LineItem::priced(&item, 3);
        item.price = Money::from_cents(9999);

        assert_eq!(line.item_id, "bun");
        assert_eq!(line.cost.cents(), 3750);
    }

    #[test]
    fn test_payment_method_round_trip() {
        assert_eq!(PaymentMethod::from("Cash".to_string()), PaymentMethod::Cash);
        assert_eq!(PaymentMethod::from("card".to_string()), PaymentMethod::Card);

        let snapscan = PaymentMethod::from("SnapScan".to_string());
        assert_eq!(snapscan, PaymentMethod::Other("SnapScan".to_string()));
        assert_eq!(String::from(snapscan), "SnapScan");

        let json = serde_json::to_string(&PaymentMethod::Card).unwrap();
        assert_eq!(json, "\"card\"");
    }

    #[test]
    fn test_order_kinds_map_to_pools() {
        assert_eq!(<Preorder as StockOrder>::POOL, StockPool::Preorder);
        assert_eq!(<ExtraOrder as StockOrder>::POOL, StockPool::Extra);
    }
}
