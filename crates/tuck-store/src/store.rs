//! # Document Store
//!
//! Three collections of schemaless JSON documents (`items`, `preorders`,
//! `extraOrders`) keyed by opaque string ids, with change notification.
//!
//! ## Write Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Store Write Path                                │
//! │                                                                         │
//! │  add / set_merge / delete / load_seed                                  │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  RwLock<Collections>  (write guard held until publish completes)       │
//! │        │                                                                │
//! │        ├──► decode every document (tuck-core::record)                  │
//! │        │      undecodable documents are skipped with a warning         │
//! │        │                                                                │
//! │        ├──► watch::Sender<Arc<Snapshot>>   latest full view            │
//! │        │                                                                │
//! │        └──► broadcast::Sender<ChangeEvent> what changed                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Subscribers always recompute from the whole snapshot; events only say
//! that something changed and where.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::{broadcast, watch, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use tuck_core::record::{decode_extra_order, decode_item, decode_preorder, unusable_line_count};
use tuck_core::Snapshot;

use crate::error::{StoreError, StoreResult};

/// Default buffer of the change event channel.
pub const DEFAULT_CHANGE_CAPACITY: usize = 256;

// =============================================================================
// Collections
// =============================================================================

/// The three collections the counter works with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Collection {
    Items,
    Preorders,
    ExtraOrders,
}

impl Collection {
    /// Collection name as used in the store and in seed files.
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Items => "items",
            Collection::Preorders => "preorders",
            Collection::ExtraOrders => "extraOrders",
        }
    }

    /// Orders get a `createdAt` stamp when added; items do not.
    fn stamps_creation(&self) -> bool {
        !matches!(self, Collection::Items)
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Change Events
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Added,
    Updated,
    Deleted,
}

/// One document changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    pub collection: Collection,
    pub id: String,
    pub kind: ChangeKind,
}

// =============================================================================
// Seed Files
// =============================================================================

/// Documents to bulk-load into an empty store.
///
/// ## Format
/// ```json
/// {
///   "items":       { "bun": { "name": "Bun", "priceCents": 1250, ... } },
///   "preorders":   { "p1":  { "customerName": "Sam", "items": [ ... ] } },
///   "extraOrders": { }
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seed {
    #[serde(default)]
    pub items: BTreeMap<String, Value>,
    #[serde(default)]
    pub preorders: BTreeMap<String, Value>,
    #[serde(default)]
    pub extra_orders: BTreeMap<String, Value>,
}

impl Seed {
    /// Reads a seed file from disk.
    pub fn from_path(path: &Path) -> StoreResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    fn documents(self) -> impl Iterator<Item = (Collection, String, Value)> {
        let tag = |collection: Collection| move |(id, doc): (String, Value)| (collection, id, doc);
        self.items
            .into_iter()
            .map(tag(Collection::Items))
            .chain(self.preorders.into_iter().map(tag(Collection::Preorders)))
            .chain(self.extra_orders.into_iter().map(tag(Collection::ExtraOrders)))
    }
}

// =============================================================================
// Store State
// =============================================================================

#[derive(Debug, Default)]
struct Collections {
    items: BTreeMap<String, Value>,
    preorders: BTreeMap<String, Value>,
    extra_orders: BTreeMap<String, Value>,
}

impl Collections {
    fn of(&self, collection: Collection) -> &BTreeMap<String, Value> {
        match collection {
            Collection::Items => &self.items,
            Collection::Preorders => &self.preorders,
            Collection::ExtraOrders => &self.extra_orders,
        }
    }

    fn of_mut(&mut self, collection: Collection) -> &mut BTreeMap<String, Value> {
        match collection {
            Collection::Items => &mut self.items,
            Collection::Preorders => &mut self.preorders,
            Collection::ExtraOrders => &mut self.extra_orders,
        }
    }

    /// Decodes every document into a sorted snapshot.
    fn snapshot(&self) -> Snapshot {
        let mut snapshot = Snapshot {
            items: decode_all(Collection::Items, &self.items, decode_item),
            preorders: decode_all(Collection::Preorders, &self.preorders, decode_preorder),
            extra_orders: decode_all(Collection::ExtraOrders, &self.extra_orders, decode_extra_order),
        };
        snapshot.sort();
        snapshot
    }
}

fn decode_all<T>(
    collection: Collection,
    docs: &BTreeMap<String, Value>,
    decode: fn(&str, &Value) -> serde_json::Result<T>,
) -> Vec<T> {
    docs.iter()
        .filter_map(|(id, doc)| match decode(id, doc) {
            Ok(decoded) => {
                if collection != Collection::Items {
                    let dropped = unusable_line_count(doc);
                    if dropped > 0 {
                        warn!(%collection, %id, dropped, "Dropping unusable order lines");
                    }
                }
                Some(decoded)
            }
            Err(e) => {
                warn!(%collection, %id, error = %e, "Skipping undecodable document");
                None
            }
        })
        .collect()
}

/// Merges `patch` into `target`: objects merge key by key, recursively;
/// anything else (arrays included) replaces the old value.
fn merge(target: &mut Value, patch: Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (key, value) in patch {
                match target.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (target, patch) => *target = patch,
    }
}

fn expect_object(collection: Collection, doc: Value) -> StoreResult<Map<String, Value>> {
    match doc {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::invalid_document(
            collection.name(),
            format!("expected a JSON object, got {}", json_kind(&other)),
        )),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

struct Shared {
    docs: RwLock<Collections>,
    snapshot_tx: watch::Sender<Arc<Snapshot>>,
    change_tx: broadcast::Sender<ChangeEvent>,
}

// =============================================================================
// Document Store
// =============================================================================

/// In-process document store shared by every part of the counter.
///
/// Cloning is cheap; all clones see the same collections.
#[derive(Clone)]
pub struct DocumentStore {
    shared: Arc<Shared>,
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new(DEFAULT_CHANGE_CAPACITY)
    }
}

impl DocumentStore {
    /// Creates an empty store.
    ///
    /// `change_capacity` bounds how many change events a slow subscriber
    /// may fall behind before it starts missing some.
    pub fn new(change_capacity: usize) -> Self {
        let (snapshot_tx, _) = watch::channel(Arc::new(Snapshot::default()));
        let (change_tx, _) = broadcast::channel(change_capacity.max(1));
        DocumentStore {
            shared: Arc::new(Shared {
                docs: RwLock::new(Collections::default()),
                snapshot_tx,
                change_tx,
            }),
        }
    }

    /// Latest snapshot of all three collections.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.shared.snapshot_tx.borrow().clone()
    }

    /// Subscribes to snapshot updates.
    ///
    /// The receiver starts out holding the current snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.shared.snapshot_tx.subscribe()
    }

    /// Subscribes to per-document change events.
    pub fn changes(&self) -> broadcast::Receiver<ChangeEvent> {
        self.shared.change_tx.subscribe()
    }

    /// Returns the raw document, if present.
    pub async fn get(&self, collection: Collection, id: &str) -> Option<Value> {
        self.shared.docs.read().await.of(collection).get(id).cloned()
    }

    /// Adds a document under a fresh id and returns the id.
    ///
    /// Orders without a `createdAt` get one stamped with the current time.
    pub async fn add(&self, collection: Collection, doc: Value) -> StoreResult<String> {
        let mut doc = expect_object(collection, doc)?;
        if collection.stamps_creation() && !doc.contains_key("createdAt") {
            doc.insert("createdAt".to_string(), Value::String(Utc::now().to_rfc3339()));
        }

        let id = Uuid::new_v4().to_string();
        let mut docs = self.shared.docs.write().await;
        docs.of_mut(collection).insert(id.clone(), Value::Object(doc));
        debug!(%collection, %id, "Document added");

        self.publish(&docs, [ChangeEvent {
            collection,
            id: id.clone(),
            kind: ChangeKind::Added,
        }]);
        Ok(id)
    }

    /// Merges `patch` into the document, creating it when missing.
    pub async fn set_merge(&self, collection: Collection, id: &str, patch: Value) -> StoreResult<()> {
        let patch = Value::Object(expect_object(collection, patch)?);

        let mut docs = self.shared.docs.write().await;
        let kind = match docs.of_mut(collection).get_mut(id) {
            Some(existing) => {
                merge(existing, patch);
                ChangeKind::Updated
            }
            None => {
                docs.of_mut(collection).insert(id.to_string(), patch);
                ChangeKind::Added
            }
        };
        debug!(%collection, %id, ?kind, "Document merged");

        self.publish(&docs, [ChangeEvent {
            collection,
            id: id.to_string(),
            kind,
        }]);
        Ok(())
    }

    /// Deletes a document.
    pub async fn delete(&self, collection: Collection, id: &str) -> StoreResult<()> {
        let mut docs = self.shared.docs.write().await;
        if docs.of_mut(collection).remove(id).is_none() {
            return Err(StoreError::not_found(collection.name(), id));
        }
        debug!(%collection, %id, "Document deleted");

        self.publish(&docs, [ChangeEvent {
            collection,
            id: id.to_string(),
            kind: ChangeKind::Deleted,
        }]);
        Ok(())
    }

    /// Loads every document of a seed, keeping the seed's ids and shapes.
    ///
    /// All documents are checked before any is written; one bad document
    /// rejects the whole seed. Returns the number of documents loaded.
    pub async fn load_seed(&self, seed: Seed) -> StoreResult<usize> {
        let documents = seed
            .documents()
            .map(|(collection, id, doc)| Ok((collection, id, Value::Object(expect_object(collection, doc)?))))
            .collect::<StoreResult<Vec<_>>>()?;

        let mut docs = self.shared.docs.write().await;
        let mut events = Vec::with_capacity(documents.len());
        for (collection, id, doc) in documents {
            let kind = match docs.of_mut(collection).insert(id.clone(), doc) {
                Some(_) => ChangeKind::Updated,
                None => ChangeKind::Added,
            };
            events.push(ChangeEvent { collection, id, kind });
        }

        let loaded = events.len();
        info!(documents = loaded, "Seed loaded");
        self.publish(&docs, events);
        Ok(loaded)
    }

    /// Publishes a fresh snapshot, then the events that produced it.
    ///
    /// Called with the write guard held so snapshots go out in write order.
    fn publish(&self, docs: &Collections, events: impl IntoIterator<Item = ChangeEvent>) {
        self.shared.snapshot_tx.send_replace(Arc::new(docs.snapshot()));

        for event in events {
            // No subscribers is fine.
            let _ = self.shared.change_tx.send(event);
        }
    }
}
