//! # Stock Ledger
//!
//! Committed-usage accounting and availability checks for the two stock
//! pools.
//!
//! ## How a Check is Computed
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Item "bun": preorder_stock = 10                                        │
//! │                                                                         │
//! │  Stored preorders:  P1 = 4 bun,  P2 = 3 bun                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  compute_usage ──────────────► usage[bun] = 7                           │
//! │                                                                         │
//! │  Editing P1 (released: 4), nothing staged yet:                          │
//! │       adjusted = 7 - 4 + 0 = 3                                          │
//! │       remaining_before = 10 - 3 = 7                                     │
//! │       request 6 ──► remaining_after = 1   ✅ ok                          │
//! │       request 8 ──► remaining_after = -1  ❌ "only 7 left"               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every function here is pure. Call them again on each new snapshot; there
//! is nothing to invalidate.

use std::borrow::Borrow;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use crate::types::{ExtraOrder, Item, LineItem, Preorder, StockOrder, StockPool};

// =============================================================================
// Usage
// =============================================================================

/// Committed quantity per item id for one pool.
///
/// Items that no order references have no entry; [`Usage::get`] reads them
/// as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Usage(HashMap<String, i64>);

impl Usage {
    /// Committed quantity for an item (zero when absent).
    #[inline]
    pub fn get(&self, item_id: &str) -> i64 {
        self.0.get(item_id).copied().unwrap_or(0)
    }

    /// Returns true if the item has an entry.
    pub fn contains(&self, item_id: &str) -> bool {
        self.0.contains_key(item_id)
    }

    /// Number of items with an entry.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Totals saturate at `i64::MAX` rather than wrapping.
    fn record(&mut self, item_id: &str, quantity: i64) {
        let total = self.0.entry(item_id.to_string()).or_insert(0);
        *total = total.saturating_add(quantity);
    }
}

/// Accumulates committed quantities per item across a set of orders.
///
/// `lines_of` extracts each order's normalized line sequence. Orders and
/// lines contribute independently, so the result does not depend on the
/// order of `orders`.
///
/// ## Example
/// ```rust
/// use tuck_core::ledger::compute_usage;
/// use tuck_core::{LineItem, Money};
///
/// let orders = vec![
///     vec![LineItem { item_id: "bun".into(), quantity: 4, cost: Money::zero() }],
///     vec![LineItem { item_id: "bun".into(), quantity: 3, cost: Money::zero() }],
/// ];
/// let usage = compute_usage(&orders, |lines| lines.iter());
/// assert_eq!(usage.get("bun"), 7);
/// assert_eq!(usage.get("pie"), 0);
/// ```
pub fn compute_usage<'a, O, F, I>(orders: impl IntoIterator<Item = &'a O>, lines_of: F) -> Usage
where
    O: 'a + ?Sized,
    F: Fn(&'a O) -> I,
    I: IntoIterator,
    I::Item: Borrow<LineItem>,
{
    let mut usage = Usage::default();
    for order in orders {
        for line in lines_of(order) {
            let line = line.borrow();
            usage.record(&line.item_id, line.quantity);
        }
    }
    usage
}

/// [`compute_usage`] over stored orders of one kind.
pub fn usage_of<'a, O>(orders: impl IntoIterator<Item = &'a O>) -> Usage
where
    O: StockOrder + 'a,
{
    compute_usage(orders, |order: &'a O| order.lines())
}

/// Sum of the quantities a set of lines holds for one item.
pub fn quantity_for(lines: &[LineItem], item_id: &str) -> i64 {
    lines
        .iter()
        .filter(|line| line.item_id == item_id)
        .fold(0i64, |total, line| total.saturating_add(line.quantity))
}

// =============================================================================
// Availability
// =============================================================================

/// Why a requested quantity does not fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StockShortfall {
    /// The item id did not resolve in the snapshot.
    #[error("item not found")]
    ItemNotFound,

    /// The pool is exhausted for this item.
    #[error("no stock left for this item")]
    NoStockLeft,

    /// Some stock remains, but less than requested.
    #[error("only {remaining} left")]
    OnlyLeft { remaining: i64 },
}

/// Outcome of an availability check.
///
/// `remaining_after` is reported on success too: the order form shows it as
/// "Stock after: N" while the user types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StockCheck {
    pub ok: bool,
    pub requested: i64,
    pub remaining_before: i64,
    pub remaining_after: i64,
    pub reason: Option<StockShortfall>,
}

impl StockCheck {
    fn item_not_found(requested: i64) -> Self {
        StockCheck {
            ok: false,
            requested,
            remaining_before: 0,
            remaining_after: 0,
            reason: Some(StockShortfall::ItemNotFound),
        }
    }

    /// User-facing reason text, if the check failed.
    pub fn message(&self) -> Option<String> {
        self.reason.map(|r| r.to_string())
    }
}

/// Lines whose usage is reconsidered for a check.
///
/// ## Fields
/// - `editing`: the stored lines of the order being edited. They are already
///   in the usage mapping and are released so an edit never counts against
///   itself. Every line for the item is released, including when the item is
///   split across several lines.
/// - `staged`: lines already added to the draft but not yet saved. They are
///   held as committed so the next line sees them.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderContext<'a> {
    pub editing: &'a [LineItem],
    pub staged: &'a [LineItem],
}

impl<'a> OrderContext<'a> {
    /// A brand-new order with nothing staged.
    pub const NONE: OrderContext<'static> = OrderContext {
        editing: &[],
        staged: &[],
    };

    /// Editing a stored order, nothing staged.
    pub fn editing(lines: &'a [LineItem]) -> Self {
        OrderContext {
            editing: lines,
            staged: &[],
        }
    }

    /// Usage for `item_id` after releasing edited lines and holding staged
    /// ones.
    pub fn adjust(&self, usage: &Usage, item_id: &str) -> i64 {
        usage
            .get(item_id)
            .saturating_sub(quantity_for(self.editing, item_id))
            .saturating_add(quantity_for(self.staged, item_id))
    }
}

/// Checks whether `requested` more units of `item` fit in `pool`.
///
/// ## Policy (first match wins)
/// ```text
/// item missing            ──► not ok, "item not found"
/// requested <= 0          ──► ok, nothing changes (no-op)
/// remaining_before <= 0   ──► not ok, "no stock left for this item"
/// remaining_after < 0     ──► not ok, "only {remaining_before} left"
/// otherwise               ──► ok
/// ```
pub fn check_availability(
    item: Option<&Item>,
    requested: i64,
    usage: &Usage,
    pool: StockPool,
    context: OrderContext<'_>,
) -> StockCheck {
    let Some(item) = item else {
        return StockCheck::item_not_found(requested.max(0));
    };

    let remaining_before = item.capacity(pool).saturating_sub(context.adjust(usage, &item.id));

    if requested <= 0 {
        return StockCheck {
            ok: true,
            requested: 0,
            remaining_before,
            remaining_after: remaining_before,
            reason: None,
        };
    }

    let remaining_after = remaining_before.saturating_sub(requested);

    let reason = if remaining_before <= 0 {
        Some(StockShortfall::NoStockLeft)
    } else if remaining_after < 0 {
        Some(StockShortfall::OnlyLeft {
            remaining: remaining_before,
        })
    } else {
        None
    };

    StockCheck {
        ok: reason.is_none(),
        requested,
        remaining_before,
        remaining_after,
        reason,
    }
}

// =============================================================================
// Remaining Capacity
// =============================================================================

/// Units still available across the whole catalog, per pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RemainingCapacity {
    pub preorder_remaining: i64,
    pub extra_remaining: i64,
}

/// Sums `max(capacity - usage, 0)` over all items for each pool.
///
/// An oversold item contributes zero, never a negative count.
pub fn remaining_capacity(
    items: &[Item],
    preorders: &[Preorder],
    extra_orders: &[ExtraOrder],
) -> RemainingCapacity {
    let preorder_usage = usage_of(preorders);
    let extra_usage = usage_of(extra_orders);

    items.iter().fold(RemainingCapacity::default(), |mut acc, item| {
        let left = |pool: StockPool, used: i64| item.capacity(pool).saturating_sub(used).max(0);
        acc.preorder_remaining = acc
            .preorder_remaining
            .saturating_add(left(StockPool::Preorder, preorder_usage.get(&item.id)));
        acc.extra_remaining = acc
            .extra_remaining
            .saturating_add(left(StockPool::Extra, extra_usage.get(&item.id)));
        acc
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::record::decode_preorder;
    use proptest::prelude::*;
    use serde_json::json;

    fn item(id: &str, preorder_stock: i64, extra_stock: i64) -> Item {
        Item {
            id: id.to_string(),
            name: id.to_string(),
            price: Money::from_cents(500),
            preorder_stock,
            extra_stock,
        }
    }

    fn line(item_id: &str, quantity: i64) -> LineItem {
        LineItem {
            item_id: item_id.to_string(),
            quantity,
            cost: Money::from_cents(500).multiply_quantity(quantity),
        }
    }

    fn preorder(id: &str, lines: Vec<LineItem>) -> Preorder {
        Preorder {
            id: id.to_string(),
            customer_name: "Sam".to_string(),
            total_cost: lines.iter().map(|l| l.cost).sum(),
            lines,
            coupon_given: false,
            coupon_redeemed: false,
            created_at: None,
        }
    }

    fn extra(id: &str, lines: Vec<LineItem>) -> ExtraOrder {
        ExtraOrder {
            id: id.to_string(),
            total_cost: lines.iter().map(|l| l.cost).sum(),
            lines,
            paid: false,
            payment_method: Default::default(),
            created_at: None,
        }
    }

    fn bun_state() -> (Item, Vec<Preorder>) {
        (
            item("bun", 10, 0),
            vec![
                preorder("p1", vec![line("bun", 4)]),
                preorder("p2", vec![line("bun", 3)]),
            ],
        )
    }

    #[test]
    fn test_usage_accumulates_across_orders_and_lines() {
        let orders = vec![
            preorder("p1", vec![line("bun", 2), line("pie", 1)]),
            preorder("p2", vec![line("bun", 1), line("bun", 5)]),
        ];
        let usage = usage_of(&orders);

        assert_eq!(usage.get("bun"), 8);
        assert_eq!(usage.get("pie"), 1);
        assert!(!usage.contains("cola"));
        assert_eq!(usage.len(), 2);
    }

    #[test]
    fn test_scenario_a_fits_exactly() {
        let (bun, orders) = bun_state();
        let usage = usage_of(&orders);
        assert_eq!(usage.get("bun"), 7);

        let check = check_availability(Some(&bun), 3, &usage, StockPool::Preorder, OrderContext::NONE);
        assert!(check.ok);
        assert_eq!(check.remaining_before, 3);
        assert_eq!(check.remaining_after, 0);
        assert_eq!(check.reason, None);
    }

    #[test]
    fn test_scenario_b_only_some_left() {
        let (bun, orders) = bun_state();
        let usage = usage_of(&orders);

        let check = check_availability(Some(&bun), 4, &usage, StockPool::Preorder, OrderContext::NONE);
        assert!(!check.ok);
        assert_eq!(check.remaining_before, 3);
        assert_eq!(check.remaining_after, -1);
        assert_eq!(check.message().as_deref(), Some("only 3 left"));
    }

    #[test]
    fn test_scenario_c_edit_releases_own_usage() {
        let (bun, orders) = bun_state();
        let usage = usage_of(&orders);

        let context = OrderContext::editing(&orders[0].lines);
        let check = check_availability(Some(&bun), 6, &usage, StockPool::Preorder, context);

        assert!(check.ok);
        assert_eq!(check.remaining_before, 7);
        assert_eq!(check.remaining_after, 1);
    }

    #[test]
    fn test_scenario_d_legacy_shape_contributes_identically() {
        let flat = decode_preorder("a", &json!({"itemId": "bun", "quantity": 2, "cost": 5})).unwrap();
        let lines = decode_preorder(
            "b",
            &json!({"items": [{"itemId": "bun", "quantity": 2, "cost": 5}]}),
        )
        .unwrap();

        assert_eq!(usage_of([&flat]), usage_of([&lines]));
        assert_eq!(usage_of([&flat]).get("bun"), 2);
        assert_eq!(flat.total_cost.cents(), 500);
        assert_eq!(flat.total_cost, lines.total_cost);
    }

    #[test]
    fn test_no_stock_left_wins_over_only_left() {
        let bun = item("bun", 5, 0);
        let orders = vec![preorder("p1", vec![line("bun", 5)])];
        let usage = usage_of(&orders);

        let check = check_availability(Some(&bun), 1, &usage, StockPool::Preorder, OrderContext::NONE);
        assert!(!check.ok);
        assert_eq!(check.reason, Some(StockShortfall::NoStockLeft));
        assert_eq!(check.message().as_deref(), Some("no stock left for this item"));
    }

    #[test]
    fn test_missing_item_is_distinct_reason() {
        let check = check_availability(None, 2, &Usage::default(), StockPool::Extra, OrderContext::NONE);
        assert!(!check.ok);
        assert_eq!(check.reason, Some(StockShortfall::ItemNotFound));
        assert_eq!(check.message().as_deref(), Some("item not found"));
    }

    #[test]
    fn test_zero_request_is_a_noop() {
        let bun = item("bun", 0, 0);
        let check = check_availability(Some(&bun), 0, &Usage::default(), StockPool::Preorder, OrderContext::NONE);

        assert!(check.ok);
        assert_eq!(check.requested, 0);
        assert_eq!(check.remaining_after, check.remaining_before);
        assert_eq!(check.reason, None);
    }

    #[test]
    fn test_pools_are_independent() {
        let bun = item("bun", 10, 2);
        let preorders = vec![preorder("p1", vec![line("bun", 9)])];
        let extras = vec![extra("e1", vec![line("bun", 1)])];

        let extra_usage = usage_of(&extras);
        let check = check_availability(Some(&bun), 1, &extra_usage, StockPool::Extra, OrderContext::NONE);
        assert!(check.ok);
        assert_eq!(check.remaining_after, 0);

        let preorder_usage = usage_of(&preorders);
        let check = check_availability(Some(&bun), 2, &preorder_usage, StockPool::Preorder, OrderContext::NONE);
        assert!(!check.ok);
    }

    #[test]
    fn test_staged_lines_count_as_committed() {
        let bun = item("bun", 10, 0);
        let orders = vec![preorder("p1", vec![line("bun", 4)])];
        let usage = usage_of(&orders);
        let staged = vec![line("bun", 5)];

        let context = OrderContext { editing: &[], staged: &staged };
        let check = check_availability(Some(&bun), 2, &usage, StockPool::Preorder, context);

        assert!(!check.ok);
        assert_eq!(check.remaining_before, 1);
    }

    #[test]
    fn test_edit_releases_every_split_line_for_the_item() {
        let bun = item("bun", 6, 0);
        let orders = vec![preorder("p1", vec![line("bun", 2), line("pie", 1), line("bun", 3)])];
        let usage = usage_of(&orders);

        let context = OrderContext::editing(&orders[0].lines);
        let check = check_availability(Some(&bun), 6, &usage, StockPool::Preorder, context);

        assert!(check.ok);
        assert_eq!(check.remaining_before, 6);
    }

    #[test]
    fn test_remaining_capacity_floors_oversold_items() {
        let items = vec![item("bun", 5, 3), item("pie", 4, 2)];
        let preorders = vec![preorder("p1", vec![line("bun", 8), line("pie", 1)])];
        let extras = vec![extra("e1", vec![line("pie", 2)])];

        let remaining = remaining_capacity(&items, &preorders, &extras);
        assert_eq!(remaining.preorder_remaining, 3);
        assert_eq!(remaining.extra_remaining, 3);
    }

    #[test]
    fn test_stock_check_serializes_for_front_end() {
        let check = StockCheck {
            ok: false,
            requested: 4,
            remaining_before: 3,
            remaining_after: -1,
            reason: Some(StockShortfall::OnlyLeft { remaining: 3 }),
        };
        let value = serde_json::to_value(check).unwrap();
        assert_eq!(value["remainingBefore"], 3);
        assert_eq!(value["reason"]["kind"], "only_left");
    }

    #[test]
    fn test_huge_quantities_saturate_instead_of_wrapping() {
        let bun = item("bun", 10, 0);
        let orders = vec![
            preorder("p1", vec![line("bun", i64::MAX)]),
            preorder("p2", vec![line("bun", 1)]),
        ];
        let usage = usage_of(&orders);
        assert_eq!(usage.get("bun"), i64::MAX);

        let check = check_availability(Some(&bun), 1, &usage, StockPool::Preorder, OrderContext::NONE);
        assert!(!check.ok);
        assert_eq!(check.reason, Some(StockShortfall::NoStockLeft));

        let staged = vec![line("bun", i64::MAX)];
        let context = OrderContext { editing: &[], staged: &staged };
        assert!(!check_availability(Some(&bun), i64::MAX, &usage, StockPool::Preorder, context).ok);

        let remaining = remaining_capacity(&[bun], &orders, &[]);
        assert_eq!(remaining.preorder_remaining, 0);
    }

    #[test]
    fn test_oversized_stored_quantity_still_commits_stock() {
        let bun = item("bun", 10, 0);
        let doc = json!({"itemId": "bun", "quantity": "9223372036854775807"});
        let orders = vec![decode_preorder("p1", &doc).unwrap(), preorder("p2", vec![line("bun", 1)])];

        let usage = usage_of(&orders);
        assert!(usage.get("bun") > 10);
        assert!(!check_availability(Some(&bun), 1, &usage, StockPool::Preorder, OrderContext::NONE).ok);
    }

    fn arb_orders() -> impl Strategy<Value = Vec<Preorder>> {
        let arb_line = (prop::sample::select(vec!["bun", "pie", "cola"]), 0i64..20)
            .prop_map(|(id, qty)| line(id, qty));
        prop::collection::vec(prop::collection::vec(arb_line, 0..4), 0..8).prop_map(|orders| {
            orders
                .into_iter()
                .enumerate()
                .map(|(i, lines)| preorder(&format!("p{}", i), lines))
                .collect()
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Permuting the orders never changes the per-item totals.
        #[test]
        fn usage_is_order_independent(
            (orders, shuffled) in arb_orders()
                .prop_flat_map(|orders| (Just(orders.clone()), Just(orders).prop_shuffle()))
        ) {
            prop_assert_eq!(usage_of(&orders), usage_of(&shuffled));
        }

        /// Re-running on an unchanged snapshot yields identical results.
        #[test]
        fn usage_and_capacity_are_idempotent(orders in arb_orders()) {
            let items = vec![item("bun", 10, 5), item("pie", 3, 3)];
            prop_assert_eq!(usage_of(&orders), usage_of(&orders));
            prop_assert_eq!(
                remaining_capacity(&items, &orders, &[]),
                remaining_capacity(&items, &orders, &[])
            );
        }

        /// The dashboard totals never go negative.
        #[test]
        fn remaining_capacity_is_never_negative(
            orders in arb_orders(),
            bun_stock in 0i64..15,
            pie_stock in 0i64..15,
        ) {
            let items = vec![item("bun", bun_stock, bun_stock), item("pie", pie_stock, 0)];
            let remaining = remaining_capacity(&items, &orders, &[]);
            prop_assert!(remaining.preorder_remaining >= 0);
            prop_assert!(remaining.extra_remaining >= 0);
        }

        /// Saving an order unchanged never rejects it against its own usage.
        #[test]
        fn unchanged_edit_never_self_rejects(
            others in 0i64..20,
            own in 1i64..20,
            slack in 0i64..10,
        ) {
            let capacity = others + own + slack;
            let bun = item("bun", capacity, 0);
            let orders = vec![
                preorder("other", vec![line("bun", others)]),
                preorder("mine", vec![line("bun", own)]),
            ];
            let usage = usage_of(&orders);

            let context = OrderContext::editing(&orders[1].lines);
            let check = check_availability(Some(&bun), own, &usage, StockPool::Preorder, context);

            prop_assert!(check.ok);
            prop_assert_eq!(check.remaining_before, capacity - others);
            prop_assert_eq!(check.remaining_after, check.remaining_before - own);
        }
    }
}
