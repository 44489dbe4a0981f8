//! # Store Records
//!
//! The JSON shapes documents take in the store, and their conversion into
//! domain types.
//!
//! ## Order Shapes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 Two shapes, one domain representation                   │
//! │                                                                         │
//! │  Current:  { "items": [ {itemId, quantity, costCents}, ... ], ... }     │
//! │  Legacy:   { "itemId": "bun", "quantity": 2, "cost": 25, ... }          │
//! │                 │                                                       │
//! │                 ▼  OrderLinesRecord (untagged) ──► normalize()          │
//! │                                                                         │
//! │  Vec<LineItem>  ← nothing past this module ever sees the legacy shape  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every field decodes tolerantly (see
//! [`lenient_quantity`](crate::validation::lenient_quantity)): a garbled
//! quantity reads as zero and commits no stock, a garbled flag reads as unset.
//! Any JSON object decodes, so an order is never lost to one bad field.
//! Within `items`, only the unusable elements are dropped.
//!
//! Older documents carry amounts in rands (`price`, `cost`). They are read as
//! a fallback when the cent fields are absent, and writes use cents only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::money::Money;
use crate::types::{ExtraOrder, Item, LineItem, PaymentMethod, Preorder};
use crate::validation::{lenient_bool, lenient_quantity, lenient_rands, lenient_string};

// =============================================================================
// Lenient Field Decoders
// =============================================================================

fn lenient_int<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(lenient_quantity(&value))
}

fn lenient_cents<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok((!value.is_null()).then(|| lenient_quantity(&value)))
}

fn lenient_rand_cents<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok((!value.is_null()).then(|| lenient_rands(&value)))
}

fn lenient_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(lenient_bool(&value))
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(lenient_string(&value))
}

fn lenient_optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_str().map(str::to_string))
}

/// Item ids are store keys, which are always strings.
fn lenient_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_str().map(str::to_string).unwrap_or_default())
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|ts| ts.with_timezone(&Utc)))
}

fn lenient_payment_method<'de, D>(deserializer: D) -> Result<PaymentMethod, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value
        .as_str()
        .map(|s| PaymentMethod::from(s.to_string()))
        .unwrap_or_default())
}

// =============================================================================
// Item Record
// =============================================================================

/// An item document. The id lives outside the document, as store keys do.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRecord {
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_cents", skip_serializing_if = "Option::is_none")]
    pub price_cents: Option<i64>,
    /// Legacy price in rands, read only when `priceCents` is absent.
    #[serde(default, deserialize_with = "lenient_rand_cents", skip_serializing_if = "Option::is_none")]
    pub price: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub preorder_stock: i64,
    #[serde(default, deserialize_with = "lenient_int")]
    pub extra_stock: i64,
}

impl ItemRecord {
    pub fn into_item(self, id: &str) -> Item {
        Item {
            id: id.to_string(),
            name: self.name,
            price: Money::from_cents(self.price_cents.or(self.price).unwrap_or(0)),
            preorder_stock: self.preorder_stock,
            extra_stock: self.extra_stock,
        }
    }
}

impl From<&Item> for ItemRecord {
    fn from(item: &Item) -> Self {
        ItemRecord {
            name: item.name.clone(),
            price_cents: Some(item.price.cents()),
            price: None,
            preorder_stock: item.preorder_stock,
            extra_stock: item.extra_stock,
        }
    }
}

// =============================================================================
// Line Records
// =============================================================================

/// One line as stored, either inside `items` or flattened into the order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineRecord {
    #[serde(default, deserialize_with = "lenient_id")]
    pub item_id: String,
    #[serde(default, deserialize_with = "lenient_int")]
    pub quantity: i64,
    #[serde(default, deserialize_with = "lenient_cents", skip_serializing_if = "Option::is_none")]
    pub cost_cents: Option<i64>,
    /// Legacy line cost in rands, read only when `costCents` is absent.
    #[serde(default, deserialize_with = "lenient_rand_cents", skip_serializing_if = "Option::is_none")]
    pub cost: Option<i64>,
}

impl LineRecord {
    /// A line without an item id cannot be charged to any item.
    fn is_usable(&self) -> bool {
        !self.item_id.is_empty()
    }
}

impl From<LineRecord> for LineItem {
    fn from(record: LineRecord) -> Self {
        LineItem {
            item_id: record.item_id,
            quantity: record.quantity,
            cost: Money::from_cents(record.cost_cents.or(record.cost).unwrap_or(0)),
        }
    }
}

impl From<&LineItem> for LineRecord {
    fn from(line: &LineItem) -> Self {
        LineRecord {
            item_id: line.item_id.clone(),
            quantity: line.quantity,
            cost_cents: Some(line.cost.cents()),
            cost: None,
        }
    }
}

/// One element of an `items` array.
///
/// Elements that are not objects are kept as raw values so the rest of the
/// array still decodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LineSlot {
    Line(LineRecord),
    Unusable(Value),
}

impl LineSlot {
    fn into_line(self) -> Option<LineItem> {
        match self {
            LineSlot::Line(line) if line.is_usable() => Some(LineItem::from(line)),
            _ => None,
        }
    }

    fn is_usable(&self) -> bool {
        matches!(self, LineSlot::Line(line) if line.is_usable())
    }
}

/// The two order shapes found in the store.
///
/// `Lines` is tried first, so a document carrying both shapes is read as a
/// line sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OrderLinesRecord {
    Lines { items: Vec<LineSlot> },
    Flat(LineRecord),
}

impl OrderLinesRecord {
    /// Normalizes either shape into a line sequence.
    ///
    /// Elements without an item id are dropped. A flat record with no item id
    /// carries no line at all.
    pub fn normalize(self) -> Vec<LineItem> {
        match self {
            OrderLinesRecord::Lines { items } => items.into_iter().filter_map(LineSlot::into_line).collect(),
            OrderLinesRecord::Flat(line) if !line.is_usable() => Vec::new(),
            OrderLinesRecord::Flat(line) => vec![LineItem::from(line)],
        }
    }

    /// Number of `items` elements that [`normalize`](Self::normalize) drops.
    pub fn unusable_count(&self) -> usize {
        match self {
            OrderLinesRecord::Lines { items } => items.iter().filter(|slot| !slot.is_usable()).count(),
            OrderLinesRecord::Flat(_) => 0,
        }
    }

    /// Builds the canonical (line sequence) shape for writing.
    pub fn from_lines(lines: &[LineItem]) -> Self {
        OrderLinesRecord::Lines {
            items: lines.iter().map(|line| LineSlot::Line(LineRecord::from(line))).collect(),
        }
    }
}

fn total_of(lines: &[LineItem]) -> Money {
    lines.iter().map(|l| l.cost).sum()
}

// =============================================================================
// Order Records
// =============================================================================

/// A preorder document.
///
/// The total is recomputed from the lines on read; whatever total the
/// document carries (`totalCostCents`, or `totalCost` in rands) is only there
/// for the front end's convenience.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreorderRecord {
    #[serde(default, deserialize_with = "lenient_optional_text")]
    pub customer_name: Option<String>,
    /// Legacy spelling of `customerName`.
    #[serde(default, deserialize_with = "lenient_optional_text")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub lines: OrderLinesRecord,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub coupon_given: bool,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub coupon_redeemed: bool,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

impl PreorderRecord {
    pub fn into_preorder(self, id: &str) -> Preorder {
        let lines = self.lines.normalize();
        Preorder {
            id: id.to_string(),
            customer_name: self.customer_name.or(self.name).unwrap_or_default(),
            total_cost: total_of(&lines),
            lines,
            coupon_given: self.coupon_given,
            coupon_redeemed: self.coupon_redeemed,
            created_at: self.created_at,
        }
    }
}

/// An extra (walk-up) order document.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraOrderRecord {
    #[serde(flatten)]
    pub lines: OrderLinesRecord,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub paid: bool,
    #[serde(default, deserialize_with = "lenient_payment_method")]
    pub payment_method: PaymentMethod,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

impl ExtraOrderRecord {
    pub fn into_extra_order(self, id: &str) -> ExtraOrder {
        let lines = self.lines.normalize();
        ExtraOrder {
            id: id.to_string(),
            total_cost: total_of(&lines),
            lines,
            paid: self.paid,
            payment_method: self.payment_method,
            created_at: self.created_at,
        }
    }
}

// =============================================================================
// Decoding Entry Points
// =============================================================================

/// Decodes an item document.
pub fn decode_item(id: &str, doc: &Value) -> serde_json::Result<Item> {
    Ok(ItemRecord::deserialize(doc)?.into_item(id))
}

/// Decodes a preorder document, normalizing its line shape.
pub fn decode_preorder(id: &str, doc: &Value) -> serde_json::Result<Preorder> {
    Ok(PreorderRecord::deserialize(doc)?.into_preorder(id))
}

/// Decodes an extra order document, normalizing its line shape.
pub fn decode_extra_order(id: &str, doc: &Value) -> serde_json::Result<ExtraOrder> {
    Ok(ExtraOrderRecord::deserialize(doc)?.into_extra_order(id))
}

/// Counts the `items` elements of an order document that decoding drops.
pub fn unusable_line_count(doc: &Value) -> usize {
    OrderLinesRecord::deserialize(doc)
        .map(|lines| lines.unusable_count())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_item_decodes_with_lenient_numbers() {
        let doc = json!({"name": "Bun", "priceCents": 1250, "preorderStock": "10", "extraStock": 4.0});
        let item = decode_item("bun", &doc).unwrap();

        assert_eq!(item.id, "bun");
        assert_eq!(item.price.cents(), 1250);
        assert_eq!(item.preorder_stock, 10);
        assert_eq!(item.extra_stock, 4);
    }

    #[test]
    fn test_item_reads_legacy_price_in_rands() {
        let item = decode_item("bun", &json!({"name": "Bun", "price": 12.5})).unwrap();
        assert_eq!(item.price.cents(), 1250);

        let item = decode_item("pie", &json!({"price": "9"})).unwrap();
        assert_eq!(item.price.cents(), 900);

        let both = json!({"priceCents": 1300, "price": 12.5});
        assert_eq!(decode_item("bun", &both).unwrap().price.cents(), 1300);
    }

    #[test]
    fn test_item_writes_cents_only() {
        let item = decode_item("bun", &json!({"name": "Bun", "price": 12.5, "preorderStock": 3})).unwrap();
        let value = serde_json::to_value(ItemRecord::from(&item)).unwrap();
        assert_eq!(
            value,
            json!({"name": "Bun", "priceCents": 1250, "preorderStock": 3, "extraStock": 0})
        );
    }

    #[test]
    fn test_item_missing_fields_default_to_zero() {
        let item = decode_item("x", &json!({})).unwrap();
        assert_eq!(item.name, "");
        assert_eq!(item.preorder_stock, 0);
        assert_eq!(item.extra_stock, 0);
    }

    #[test]
    fn test_flat_and_line_shapes_normalize_identically() {
        let flat = json!({"customerName": "Sam", "itemId": "bun", "quantity": 2, "cost": 5});
        let lines = json!({
            "customerName": "Sam",
            "items": [{"itemId": "bun", "quantity": 2, "costCents": 500}]
        });

        let a = decode_preorder("p1", &flat).unwrap();
        let b = decode_preorder("p1", &lines).unwrap();

        assert_eq!(a.lines, b.lines);
        assert_eq!(a.total_cost, b.total_cost);
        assert_eq!(a.lines.len(), 1);
        assert_eq!(a.total_cost.cents(), 500);
    }

    #[test]
    fn test_legacy_rand_cost_counts_toward_total() {
        let doc = json!({"itemId": "bun", "quantity": 2, "cost": 25.0, "totalCost": 25.0});
        let order = decode_extra_order("e1", &doc).unwrap();

        assert_eq!(order.lines[0].cost.cents(), 2500);
        assert_eq!(order.total_cost.cents(), 2500);
    }

    #[test]
    fn test_malformed_flags_keep_the_order() {
        let doc = json!({
            "customerName": "Sam",
            "items": [{"itemId": "bun", "quantity": 5, "costCents": 6250}],
            "couponGiven": "yes",
            "couponRedeemed": 1
        });
        let order = decode_preorder("p1", &doc).unwrap();

        assert_eq!(order.lines.len(), 1);
        assert_eq!(order.lines[0].quantity, 5);
        assert!(!order.coupon_given);
        assert!(!order.coupon_redeemed);

        let extra = decode_extra_order("e1", &json!({"itemId": "bun", "quantity": 2, "paid": "true"})).unwrap();
        assert_eq!(extra.lines.len(), 1);
        assert!(!extra.paid);
    }

    #[test]
    fn test_malformed_names_keep_the_order() {
        let order = decode_preorder("p1", &json!({"customerName": 42, "itemId": "bun", "quantity": 1})).unwrap();
        assert_eq!(order.customer_name, "");
        assert_eq!(order.lines.len(), 1);

        let both = json!({"customerName": "Sam", "name": "Samuel", "itemId": "bun", "quantity": 1});
        assert_eq!(decode_preorder("p2", &both).unwrap().customer_name, "Sam");
    }

    #[test]
    fn test_bad_line_elements_drop_only_themselves() {
        for bad in [json!(null), json!({"itemId": 7, "quantity": 3}), json!("bun"), json!({"quantity": 2})] {
            let doc = json!({
                "customerName": "Sam",
                "items": [{"itemId": "bun", "quantity": 4, "costCents": 5000}, bad]
            });
            let order = decode_preorder("p1", &doc).unwrap();

            assert_eq!(order.lines.len(), 1);
            assert_eq!(order.lines[0].item_id, "bun");
            assert_eq!(order.lines[0].quantity, 4);
            assert_eq!(unusable_line_count(&doc), 1);
        }
    }

    #[test]
    fn test_clean_orders_have_no_unusable_lines() {
        let lines = json!({"items": [{"itemId": "bun", "quantity": 1}]});
        let flat = json!({"itemId": "bun", "quantity": 1});

        assert_eq!(unusable_line_count(&lines), 0);
        assert_eq!(unusable_line_count(&flat), 0);
    }

    #[test]
    fn test_legacy_name_field_is_customer_name() {
        let doc = json!({"name": "Thandi", "itemId": "pie", "quantity": 1, "costCents": 900});
        let order = decode_preorder("p2", &doc).unwrap();
        assert_eq!(order.customer_name, "Thandi");
        assert!(!order.coupon_given);
        assert!(!order.coupon_redeemed);
    }

    #[test]
    fn test_total_is_recomputed_from_lines() {
        let doc = json!({
            "items": [
                {"itemId": "bun", "quantity": 2, "costCents": 2500},
                {"itemId": "pie", "quantity": 1, "costCents": 900}
            ],
            "totalCostCents": 1,
            "paymentMethod": "card"
        });
        let order = decode_extra_order("e1", &doc).unwrap();

        assert_eq!(order.total_cost.cents(), 3400);
        assert_eq!(order.payment_method, PaymentMethod::Card);
        assert!(!order.paid);
    }

    #[test]
    fn test_garbled_quantity_commits_nothing() {
        let doc = json!({"itemId": "bun", "quantity": "lots", "costCents": 0});
        let order = decode_extra_order("e2", &doc).unwrap();
        assert_eq!(order.lines[0].quantity, 0);
    }

    #[test]
    fn test_order_without_any_line_shape_has_no_lines() {
        let order = decode_extra_order("e3", &json!({"paid": true})).unwrap();
        assert!(order.lines.is_empty());
        assert!(order.total_cost.is_zero());
    }

    #[test]
    fn test_created_at_is_parsed_or_dropped() {
        let good = json!({"items": [], "createdAt": "2026-10-17T08:00:00Z"});
        let bad = json!({"items": [], "createdAt": {"seconds": 12}});

        assert!(decode_extra_order("a", &good).unwrap().created_at.is_some());
        assert!(decode_extra_order("b", &bad).unwrap().created_at.is_none());
    }

    #[test]
    fn test_canonical_shape_serializes_as_items() {
        let lines = vec![LineItem {
            item_id: "bun".to_string(),
            quantity: 2,
            cost: Money::from_cents(2500),
        }];
        let value = serde_json::to_value(OrderLinesRecord::from_lines(&lines)).unwrap();
        assert_eq!(
            value,
            json!({"items": [{"itemId": "bun", "quantity": 2, "costCents": 2500}]})
        );
    }
}
