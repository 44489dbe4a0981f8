//! # Draft Orders
//!
//! A multi-line order being assembled in the order dialog, before it is
//! written to the store.
//!
//! ## Draft Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Draft Order Operations                               │
//! │                                                                         │
//! │  Front end action         DraftOrder              Ledger involvement    │
//! │  ────────────────         ──────────              ──────────────────    │
//! │                                                                         │
//! │  Pick item / type qty ──► quote()        ──────► check, nothing kept    │
//! │                                                                         │
//! │  Click "Add line" ──────► add_line()     ──────► check with staged =    │
//! │                                                  current lines          │
//! │                                                                         │
//! │  Click remove ──────────► remove_line()  ──────► (none)                 │
//! │                                                                         │
//! │  Click save ────────────► revalidate()   ──────► every line again,      │
//! │                                                  against a fresh        │
//! │                                                  snapshot               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The draft is owned by the caller. Nothing here is shared or global; open
//! a second dialog and you get a second `DraftOrder`.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::ledger::{check_availability, OrderContext, StockCheck, Usage};
use crate::money::Money;
use crate::types::{Item, LineItem, StockOrder, StockPool};
use crate::validation::validate_quantity_within;
use crate::{MAX_DRAFT_LINES, MAX_LINE_QUANTITY};

/// Per-draft ceilings, normally taken from the counter configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DraftLimits {
    pub max_line_quantity: i64,
    pub max_lines: usize,
}

impl Default for DraftLimits {
    fn default() -> Self {
        DraftLimits {
            max_line_quantity: MAX_LINE_QUANTITY,
            max_lines: MAX_DRAFT_LINES,
        }
    }
}

/// Live feedback for the line the user is about to add.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineQuote {
    pub check: StockCheck,
    /// Price × quantity, zero when nothing valid is selected.
    pub cost: Money,
}

/// A draft line that no longer fits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineRejection {
    /// Position of the line in the draft.
    pub index: usize,
    pub item_id: String,
    pub check: StockCheck,
}

/// An order under construction.
///
/// ## Invariants
/// - Every line has a positive quantity no larger than the draft limit
/// - Line count never exceeds the draft limit
/// - `editing` holds the order's lines as stored when editing began and is
///   never modified afterwards
#[derive(Debug, Clone)]
pub struct DraftOrder {
    pool: StockPool,
    editing_id: Option<String>,
    editing: Vec<LineItem>,
    lines: Vec<LineItem>,
    limits: DraftLimits,
}

impl DraftOrder {
    /// Starts an empty draft for a new order.
    pub fn new(pool: StockPool) -> Self {
        DraftOrder {
            pool,
            editing_id: None,
            editing: Vec::new(),
            lines: Vec::new(),
            limits: DraftLimits::default(),
        }
    }

    /// Starts a draft that edits a stored order, prefilled with its lines.
    pub fn editing<O: StockOrder>(order: &O) -> Self {
        DraftOrder {
            pool: O::POOL,
            editing_id: Some(order.id().to_string()),
            editing: order.lines().to_vec(),
            lines: order.lines().to_vec(),
            limits: DraftLimits::default(),
        }
    }

    /// Replaces the default limits.
    pub fn with_limits(mut self, limits: DraftLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn pool(&self) -> StockPool {
        self.pool
    }

    /// Id of the stored order being edited, if any.
    pub fn editing_id(&self) -> Option<&str> {
        self.editing_id.as_deref()
    }

    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of the line costs.
    pub fn total_cost(&self) -> Money {
        self.lines.iter().map(|l| l.cost).sum()
    }

    fn context_with(&self, staged: usize) -> OrderContext<'_> {
        OrderContext {
            editing: &self.editing,
            staged: &self.lines[..staged],
        }
    }

    /// Checks the next line without adding it.
    pub fn quote(&self, item: Option<&Item>, quantity: i64, usage: &Usage) -> LineQuote {
        let check = check_availability(
            item,
            quantity,
            usage,
            self.pool,
            self.context_with(self.lines.len()),
        );
        let cost = match item {
            Some(item) if quantity > 0 => item.price.multiply_quantity(quantity),
            _ => Money::zero(),
        };
        LineQuote { check, cost }
    }

    /// Adds a line if it fits.
    ///
    /// Lines already in the draft count as committed. The returned check
    /// says whether the line was added (`ok`) or why not.
    ///
    /// ## Errors
    /// - `Validation` for a quantity outside `1..=max_line_quantity`
    /// - `TooManyLines` when the draft is full
    pub fn add_line(&mut self, item: Option<&Item>, quantity: i64, usage: &Usage) -> CoreResult<StockCheck> {
        validate_quantity_within(quantity, self.limits.max_line_quantity)?;

        if self.lines.len() >= self.limits.max_lines {
            return Err(CoreError::TooManyLines {
                max: self.limits.max_lines,
            });
        }

        let check = self.quote(item, quantity, usage).check;
        if let (true, Some(item)) = (check.ok, item) {
            self.lines.push(LineItem::priced(item, quantity));
        }
        Ok(check)
    }

    /// Removes and returns the line at `index`.
    pub fn remove_line(&mut self, index: usize) -> CoreResult<LineItem> {
        if index >= self.lines.len() {
            return Err(CoreError::NoSuchLine { index });
        }
        Ok(self.lines.remove(index))
    }

    /// Re-checks every line against a fresh snapshot.
    ///
    /// Line *i* is checked with lines *0..i* staged, exactly as if the
    /// lines were added again one by one. An empty result means the whole
    /// draft still fits.
    pub fn revalidate(&self, items: &[Item], usage: &Usage) -> Vec<LineRejection> {
        self.lines
            .iter()
            .enumerate()
            .filter_map(|(index, line)| {
                let item = items.iter().find(|i| i.id == line.item_id);
                let check = check_availability(item, line.quantity, usage, self.pool, self.context_with(index));
                (!check.ok).then(|| LineRejection {
                    index,
                    item_id: line.item_id.clone(),
                    check,
                })
            })
            .collect()
    }

    /// Points the draft at the order as currently stored.
    ///
    /// The draft's own lines are untouched; only the lines released on
    /// save change, so a concurrent edit to the same order is accounted
    /// against its latest version.
    pub fn rebase<O: StockOrder>(&mut self, order: &O) {
        self.editing_id = Some(order.id().to_string());
        self.editing = order.lines().to_vec();
    }

    /// Reprices every line at the items' current prices.
    ///
    /// Lines whose item has vanished keep their old cost; `revalidate`
    /// reports them.
    pub fn reprice(&mut self, items: &[Item]) {
        for line in &mut self.lines {
            if let Some(item) = items.iter().find(|i| i.id == line.item_id) {
                line.cost = item.price.multiply_quantity(line.quantity);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{usage_of, StockShortfall};
    use crate::types::Preorder;

    fn item(id: &str, price_cents: i64, preorder_stock: i64) -> Item {
        Item {
            id: id.to_string(),
            name: id.to_string(),
            price: Money::from_cents(price_cents),
            preorder_stock,
            extra_stock: 0,
        }
    }

    fn stored(id: &str, lines: Vec<LineItem>) -> Preorder {
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

    #[test]
    fn test_add_line_prices_and_stages() {
        let bun = item("bun", 1250, 10);
        let mut draft = DraftOrder::new(StockPool::Preorder);

        let check = draft.add_line(Some(&bun), 4, &Usage::default()).unwrap();
        assert!(check.ok);
        assert_eq!(check.remaining_after, 6);
        assert_eq!(draft.lines().len(), 1);
        assert_eq!(draft.total_cost().cents(), 5000);
    }

    #[test]
    fn test_staged_lines_limit_the_next_line() {
        let bun = item("bun", 1250, 10);
        let mut draft = DraftOrder::new(StockPool::Preorder);

        draft.add_line(Some(&bun), 7, &Usage::default()).unwrap();
        let check = draft.add_line(Some(&bun), 4, &Usage::default()).unwrap();

        assert!(!check.ok);
        assert_eq!(check.reason, Some(StockShortfall::OnlyLeft { remaining: 3 }));
        assert_eq!(draft.lines().len(), 1);
    }

    #[test]
    fn test_missing_item_is_reported_not_added() {
        let mut draft = DraftOrder::new(StockPool::Extra);
        let check = draft.add_line(None, 1, &Usage::default()).unwrap();

        assert_eq!(check.reason, Some(StockShortfall::ItemNotFound));
        assert!(draft.is_empty());
    }

    #[test]
    fn test_quantity_and_line_limits() {
        let bun = item("bun", 100, 1000);
        let mut draft = DraftOrder::new(StockPool::Preorder).with_limits(DraftLimits {
            max_line_quantity: 5,
            max_lines: 2,
        });

        assert!(matches!(
            draft.add_line(Some(&bun), 0, &Usage::default()),
            Err(CoreError::Validation(_))
        ));
        assert!(matches!(
            draft.add_line(Some(&bun), 6, &Usage::default()),
            Err(CoreError::Validation(_))
        ));

        draft.add_line(Some(&bun), 1, &Usage::default()).unwrap();
        draft.add_line(Some(&bun), 1, &Usage::default()).unwrap();
        assert!(matches!(
            draft.add_line(Some(&bun), 1, &Usage::default()),
            Err(CoreError::TooManyLines { max: 2 })
        ));
    }

    #[test]
    fn test_quote_reports_cost_and_stock_after() {
        let bun = item("bun", 1250, 10);
        let draft = DraftOrder::new(StockPool::Preorder);

        let quote = draft.quote(Some(&bun), 3, &Usage::default());
        assert_eq!(quote.cost.cents(), 3750);
        assert_eq!(quote.check.remaining_after, 7);

        let idle = draft.quote(Some(&bun), 0, &Usage::default());
        assert!(idle.cost.is_zero());
        assert!(idle.check.ok);
    }

    #[test]
    fn test_unchanged_edit_revalidates_clean() {
        let bun = item("bun", 1250, 7);
        let orders = vec![
            stored("p1", vec![LineItem::priced(&bun, 4)]),
            stored("p2", vec![LineItem::priced(&bun, 3)]),
        ];
        let usage = usage_of(&orders);

        let draft = DraftOrder::editing(&orders[0]);
        assert_eq!(draft.editing_id(), Some("p1"));
        assert!(draft.revalidate(&[bun], &usage).is_empty());
    }

    #[test]
    fn test_removing_a_line_frees_its_stock_for_readding() {
        let bun = item("bun", 1250, 7);
        let orders = vec![
            stored("p1", vec![LineItem::priced(&bun, 2), LineItem::priced(&bun, 2)]),
            stored("p2", vec![LineItem::priced(&bun, 3)]),
        ];
        let usage = usage_of(&orders);

        let mut draft = DraftOrder::editing(&orders[0]);
        draft.remove_line(1).unwrap();

        let check = draft.add_line(Some(&bun), 2, &usage).unwrap();
        assert!(check.ok);
        assert_eq!(check.remaining_after, 0);
    }

    #[test]
    fn test_revalidate_catches_concurrent_sales() {
        let bun = item("bun", 1250, 5);
        let mut draft = DraftOrder::new(StockPool::Preorder);
        draft.add_line(Some(&bun), 2, &Usage::default()).unwrap();
        draft.add_line(Some(&bun), 2, &Usage::default()).unwrap();

        // Another till sold 2 buns meanwhile.
        let others = vec![stored("other", vec![LineItem::priced(&bun, 2)])];
        let rejections = draft.revalidate(&[bun], &usage_of(&others));

        assert_eq!(rejections.len(), 1);
        assert_eq!(rejections[0].index, 1);
        assert_eq!(rejections[0].check.remaining_before, 1);
    }

    #[test]
    fn test_revalidate_flags_deleted_items() {
        let bun = item("bun", 1250, 5);
        let mut draft = DraftOrder::new(StockPool::Preorder);
        draft.add_line(Some(&bun), 1, &Usage::default()).unwrap();

        let rejections = draft.revalidate(&[], &Usage::default());
        assert_eq!(rejections[0].check.reason, Some(StockShortfall::ItemNotFound));
    }

    #[test]
    fn test_remove_line_out_of_bounds() {
        let mut draft = DraftOrder::new(StockPool::Extra);
        assert!(matches!(draft.remove_line(0), Err(CoreError::NoSuchLine { index: 0 })));
    }

    #[test]
    fn test_rebase_releases_the_latest_stored_lines() {
        let bun = item("bun", 1250, 6);
        let original = stored("p1", vec![LineItem::priced(&bun, 5)]);
        let draft = DraftOrder::editing(&original);

        // Meanwhile p1 was cut to 1 and another order took the other 5.
        let latest = vec![
            stored("p1", vec![LineItem::priced(&bun, 1)]),
            stored("p2", vec![LineItem::priced(&bun, 5)]),
        ];
        let usage = usage_of(&latest);

        assert!(draft.revalidate(&[bun.clone()], &usage).is_empty());

        let mut rebased = draft.clone();
        rebased.rebase(&latest[0]);
        let rejections = rebased.revalidate(&[bun], &usage);
        assert_eq!(rejections.len(), 1);
        assert_eq!(rejections[0].check.remaining_before, 1);
    }

    #[test]
    fn test_reprice_uses_current_prices() {
        let mut bun = item("bun", 1000, 5);
        let mut draft = DraftOrder::new(StockPool::Preorder);
        draft.add_line(Some(&bun), 2, &Usage::default()).unwrap();

        bun.price = Money::from_cents(1100);
        draft.reprice(&[bun]);
        assert_eq!(draft.total_cost().cents(), 2200);
    }
}
