//! # Gateway Traits
//!
//! The two contracts between the navigator and the outside world.
//!
//! | Trait | Role |
//! |-------|------|
//! | [`PersistenceGateway`] | Durable key/value store of anchors and edges |
//! | [`LocateGateway`] | Cloud anchor service that finds anchors in the room |
//!
//! The navigator core is synchronous. Both gateways are async and are the
//! only suspension points; their results are applied by whoever owns the
//! [`Navigator`](crate::Navigator), one at a time.
//!
//! ## Implementations
//!
//! | Gateway | Module | Description |
//! |---------|--------|-------------|
//! | `MemoryGateway` | `memory` | In-memory persistence for testing/embedding |
//! | `MemoryLocator` | `memory` | Scripted anchor locator for testing |

pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::model::*;
use crate::Result;

pub use memory::{MemoryGateway, MemoryLocator};

// ============================================================================
// PersistenceGateway
// ============================================================================

/// Durable storage of the anchor map.
///
/// Anchors are keyed by `name`, edges by the unordered pair of their
/// endpoint names. Upserts are idempotent.
///
/// Upserts report `Ok(false)` when the store answered but refused the
/// write, and `Err(Error::CollaboratorFailure)` when it could not be
/// reached. Callers treat both as "could not save".
#[async_trait]
pub trait PersistenceGateway: Send + Sync + 'static {
    /// Every anchor committed so far.
    async fn load_all_anchors(&self) -> Result<Vec<Anchor>>;

    /// Every edge committed so far.
    async fn load_all_edges(&self) -> Result<Vec<Edge>>;

    /// Insert or merge an anchor record.
    async fn upsert_anchor(&self, anchor: &Anchor) -> Result<bool>;

    /// Insert or merge an edge record.
    async fn upsert_edge(&self, edge: &Edge) -> Result<bool>;

    /// Find one anchor by name.
    ///
    /// Default: scans `load_all_anchors()`.
    async fn find_anchor(&self, name: &str) -> Result<Option<Anchor>> {
        Ok(self
            .load_all_anchors()
            .await?
            .into_iter()
            .find(|a| a.name == name))
    }
}

// ============================================================================
// LocateGateway
// ============================================================================

/// An anchor found in the physical environment by the locate service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocatedAnchor {
    /// Cloud identifier of the anchor that was found.
    pub external_id: String,
    /// Pose of the anchor in the current tracking session.
    pub position: Vec3,
    pub local_transform: Mat4,
}

impl LocatedAnchor {
    pub fn new(external_id: impl Into<String>, position: Vec3) -> Self {
        Self {
            external_id: external_id.into(),
            position,
            local_transform: Mat4::IDENTITY,
        }
    }
}

/// Stream of anchors found by one locate request.
///
/// Results arrive in any order, possibly never. The stream ends only when
/// the gateway stops the watch.
#[derive(Debug)]
pub struct LocateWatch {
    rx: mpsc::UnboundedReceiver<LocatedAnchor>,
}

impl LocateWatch {
    pub fn new(rx: mpsc::UnboundedReceiver<LocatedAnchor>) -> Self {
        Self { rx }
    }

    /// A watch paired with the sender that feeds it.
    pub fn channel() -> (mpsc::UnboundedSender<LocatedAnchor>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self::new(rx))
    }

    /// Next located anchor, or `None` once the watch is stopped.
    pub async fn next(&mut self) -> Option<LocatedAnchor> {
        self.rx.recv().await
    }

    /// Next located anchor if one is already queued.
    pub fn try_next(&mut self) -> Option<LocatedAnchor> {
        self.rx.try_recv().ok()
    }
}

/// Cloud anchor-locate service.
#[async_trait]
pub trait LocateGateway: Send + Sync + 'static {
    /// Start looking for the anchors with the given cloud identifiers.
    async fn find_by_ids(&self, ids: &[String]) -> Result<LocateWatch>;
}
