//! In-memory gateways.
//!
//! `MemoryGateway` is the reference implementation of
//! `PersistenceGateway`: two maps protected by RwLock, scoped by the
//! configured partition key. `MemoryLocator` plays the cloud locate service:
//! tests "reveal" anchors and every open watch that asked for them receives
//! the result.
//!
//! ## Limitations
//!
//! - **No durability**: everything is lost on drop.
//! - **Scripted locating**: nothing is found unless it was revealed.
//!
//! Use these gateways for:
//! - Testing the navigator end to end without a cloud account
//! - Embedding the navigator where the map is built at runtime

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::config::NavigatorConfig;
use crate::model::*;
use crate::{Error, Result};
use super::{LocateGateway, LocateWatch, LocatedAnchor, PersistenceGateway};

// ============================================================================
// MemoryGateway
// ============================================================================

/// In-memory anchor/edge table store.
///
/// Clones share the same tables. [`MemoryGateway::with_partition`] gives a
/// view of the same tables scoped to another partition key.
#[derive(Clone)]
pub struct MemoryGateway {
    tables: Arc<MemoryTables>,
    anchor_table: String,
    edge_table: String,
    partition_key: String,
}

#[derive(Default)]
struct MemoryTables {
    /// (partition, row key) → anchor
    anchors: RwLock<HashMap<(String, String), Anchor>>,
    /// (partition, row key) → edge
    edges: RwLock<HashMap<(String, String), Edge>>,
    reject_writes: AtomicBool,
    unreachable: AtomicBool,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::with_config(&NavigatorConfig::default())
    }

    pub fn with_config(config: &NavigatorConfig) -> Self {
        Self {
            tables: Arc::new(MemoryTables::default()),
            anchor_table: config.anchor_table.clone(),
            edge_table: config.edge_table.clone(),
            partition_key: config.partition_key.clone(),
        }
    }

    /// The same tables, addressed through another partition key.
    pub fn with_partition(&self, partition_key: impl Into<String>) -> Self {
        Self {
            tables: Arc::clone(&self.tables),
            anchor_table: self.anchor_table.clone(),
            edge_table: self.edge_table.clone(),
            partition_key: partition_key.into(),
        }
    }

    /// Answer every upsert with `Ok(false)` while set.
    pub fn reject_writes(&self, reject: bool) {
        self.tables.reject_writes.store(reject, Ordering::Relaxed);
    }

    /// Fail every call with `CollaboratorFailure` while set.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.tables.unreachable.store(unreachable, Ordering::Relaxed);
    }

    /// Rows in this partition of the anchor table.
    pub fn anchor_count(&self) -> usize {
        self.tables.anchors.read().keys().filter(|(p, _)| *p == self.partition_key).count()
    }

    /// Rows in this partition of the edge table.
    pub fn edge_count(&self) -> usize {
        self.tables.edges.read().keys().filter(|(p, _)| *p == self.partition_key).count()
    }

    fn check_reachable(&self, table: &str) -> Result<()> {
        if self.tables.unreachable.load(Ordering::Relaxed) {
            return Err(Error::CollaboratorFailure(format!("table '{table}' is unreachable")));
        }
        Ok(())
    }

    fn row(&self, key: &str) -> (String, String) {
        (self.partition_key.clone(), key.to_string())
    }
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PersistenceGateway for MemoryGateway {
    async fn load_all_anchors(&self) -> Result<Vec<Anchor>> {
        self.check_reachable(&self.anchor_table)?;
        let anchors = self.tables.anchors.read();
        Ok(anchors
            .iter()
            .filter(|((partition, _), _)| *partition == self.partition_key)
            .map(|(_, a)| a.clone())
            .collect())
    }

    async fn load_all_edges(&self) -> Result<Vec<Edge>> {
        self.check_reachable(&self.edge_table)?;
        let edges = self.tables.edges.read();
        Ok(edges
            .iter()
            .filter(|((partition, _), _)| *partition == self.partition_key)
            .map(|(_, e)| e.clone())
            .collect())
    }

    async fn upsert_anchor(&self, anchor: &Anchor) -> Result<bool> {
        self.check_reachable(&self.anchor_table)?;
        if self.tables.reject_writes.load(Ordering::Relaxed) {
            warn!(table = %self.anchor_table, anchor = %anchor.name, "write rejected");
            return Ok(false);
        }
        self.tables.anchors.write().insert(self.row(&anchor.name), anchor.clone());
        debug!(table = %self.anchor_table, anchor = %anchor.name, "anchor upserted");
        Ok(true)
    }

    async fn upsert_edge(&self, edge: &Edge) -> Result<bool> {
        self.check_reachable(&self.edge_table)?;
        if self.tables.reject_writes.load(Ordering::Relaxed) {
            warn!(table = %self.edge_table, edge = %edge.id, "write rejected");
            return Ok(false);
        }
        // Keep one row per unordered pair: an existing reversed row is merged into.
        let mut edges = self.tables.edges.write();
        let reversed = self.row(edge.reversed_id().as_str());
        let key = if edges.contains_key(&reversed) { reversed } else { self.row(edge.id.as_str()) };
        edges.insert(key, edge.clone());
        debug!(table = %self.edge_table, edge = %edge.id, "edge upserted");
        Ok(true)
    }

    async fn find_anchor(&self, name: &str) -> Result<Option<Anchor>> {
        self.check_reachable(&self.anchor_table)?;
        Ok(self.tables.anchors.read().get(&self.row(name)).cloned())
    }
}

// ============================================================================
// MemoryLocator
// ============================================================================

/// Scripted anchor locator.
///
/// Anchors become "visible" through [`MemoryLocator::reveal`]. A watch
/// receives every visible anchor it asked for, immediately for anchors
/// revealed earlier and on reveal for the rest. Watches stay open until
/// [`MemoryLocator::stop_watchers`] is called.
#[derive(Clone, Default)]
pub struct MemoryLocator {
    inner: Arc<LocatorInner>,
}

#[derive(Default)]
struct LocatorInner {
    visible: RwLock<HashMap<String, LocatedAnchor>>,
    watchers: Mutex<Vec<Watcher>>,
    unreachable: AtomicBool,
}

struct Watcher {
    ids: Vec<String>,
    tx: mpsc::UnboundedSender<LocatedAnchor>,
}

impl MemoryLocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make an anchor findable and deliver it to every open watch for it.
    pub fn reveal(&self, located: LocatedAnchor) {
        let mut watchers = self.inner.watchers.lock();
        watchers.retain(|w| !w.tx.is_closed());
        for watcher in watchers.iter() {
            if watcher.ids.contains(&located.external_id) {
                let _ = watcher.tx.send(located.clone());
            }
        }
        self.inner.visible.write().insert(located.external_id.clone(), located);
    }

    /// Close every open watch, ending their streams.
    pub fn stop_watchers(&self) {
        let stopped = std::mem::take(&mut *self.inner.watchers.lock());
        debug!(count = stopped.len(), "stopped locate watchers");
    }

    /// Fail every `find_by_ids` with `CollaboratorFailure` while set.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.inner.unreachable.store(unreachable, Ordering::Relaxed);
    }

    pub fn open_watchers(&self) -> usize {
        self.inner.watchers.lock().iter().filter(|w| !w.tx.is_closed()).count()
    }
}

#[async_trait]
impl LocateGateway for MemoryLocator {
    async fn find_by_ids(&self, ids: &[String]) -> Result<LocateWatch> {
        if self.inner.unreachable.load(Ordering::Relaxed) {
            return Err(Error::CollaboratorFailure("anchor locate service is unreachable".into()));
        }
        let (tx, watch) = LocateWatch::channel();
        {
            let visible = self.inner.visible.read();
            for id in ids {
                if let Some(located) = visible.get(id) {
                    let _ = tx.send(located.clone());
                }
            }
        }
        self.inner.watchers.lock().push(Watcher { ids: ids.to_vec(), tx });
        debug!(ids = ids.len(), "locate watch opened");
        Ok(watch)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn lobby() -> Anchor {
        Anchor::new("lobby", AnchorKind::Main).with_external_id("asa-lobby")
    }

    #[tokio::test]
    async fn test_upsert_and_load_anchor() {
        let db = MemoryGateway::new();
        assert!(db.upsert_anchor(&lobby()).await.unwrap());
        // Upsert is idempotent.
        assert!(db.upsert_anchor(&lobby()).await.unwrap());

        let all = db.load_all_anchors().await.unwrap();
        assert_eq!(all, vec![lobby()]);
        assert_eq!(db.find_anchor("lobby").await.unwrap(), Some(lobby()));
        assert_eq!(db.find_anchor("roof").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_reversed_edge_is_one_row() {
        let db = MemoryGateway::new();
        db.upsert_edge(&Edge::new("a", "b", 2.0)).await.unwrap();
        db.upsert_edge(&Edge::new("b", "a", 2.5)).await.unwrap();
        assert_eq!(db.edge_count(), 1);
    }

    #[tokio::test]
    async fn test_partitions_are_separate() {
        let db = MemoryGateway::new();
        db.upsert_anchor(&lobby()).await.unwrap();

        let floor2 = db.with_partition("floor2");
        assert!(floor2.load_all_anchors().await.unwrap().is_empty());
        assert_eq!(floor2.anchor_count(), 0);
        assert_eq!(db.anchor_count(), 1);
    }

    #[tokio::test]
    async fn test_rejected_and_unreachable_writes() {
        let db = MemoryGateway::new();
        db.reject_writes(true);
        assert!(!db.upsert_anchor(&lobby()).await.unwrap());
        assert_eq!(db.anchor_count(), 0);

        db.reject_writes(false);
        db.set_unreachable(true);
        assert!(matches!(
            db.upsert_anchor(&lobby()).await,
            Err(Error::CollaboratorFailure(_))
        ));
        assert!(db.load_all_edges().await.is_err());
    }

    #[tokio::test]
    async fn test_locator_delivers_revealed_anchors() {
        let locator = MemoryLocator::new();
        locator.reveal(LocatedAnchor::new("asa-1", Vec3::ZERO));

        let mut watch = locator
            .find_by_ids(&["asa-1".to_string(), "asa-2".to_string()])
            .await
            .unwrap();
        assert_eq!(watch.next().await.unwrap().external_id, "asa-1");
        assert!(watch.try_next().is_none());

        // Revealed later, delivered to the open watch.
        locator.reveal(LocatedAnchor::new("asa-2", Vec3::new(1.0, 0.0, 0.0)));
        assert_eq!(watch.next().await.unwrap().external_id, "asa-2");

        // Not asked for, not delivered.
        locator.reveal(LocatedAnchor::new("asa-3", Vec3::ZERO));
        assert!(watch.try_next().is_none());

        locator.stop_watchers();
        assert!(watch.next().await.is_none());
    }
}
