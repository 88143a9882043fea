//! # Entity Store
//!
//! In-memory registries of anchors (keyed by name) and edges (keyed by the
//! composite `"a,b"` id).
//!
//! ## Semantics
//!
//! - **Idempotent inserts**: adding an anchor whose name exists, or an edge
//!   whose endpoints are already connected in either order, is a no-op. The
//!   insert methods report whether anything changed; a duplicate is never an
//!   error.
//! - **Single writer**: no interior locking. The owner funnels every mutation
//!   through `&mut self`.
//! - **No cascades**: removing anchors or edges is not supported.

use hashbrown::HashMap;
use tracing::debug;

use crate::model::*;
use crate::{Error, Result};

// ============================================================================
// EntityStore
// ============================================================================

/// Registry of every anchor and edge the navigator knows about.
#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    anchors: HashMap<String, Anchor>,
    edges: HashMap<EdgeId, Edge>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Anchors
    // ========================================================================

    /// Insert `anchor` unless its name is already registered.
    ///
    /// Returns `true` if the anchor was inserted.
    pub fn add_anchor(&mut self, anchor: Anchor) -> bool {
        if self.anchors.contains_key(&anchor.name) {
            debug!(anchor = %anchor.name, "anchor already registered, ignoring");
            return false;
        }
        self.anchors.insert(anchor.name.clone(), anchor);
        true
    }

    pub fn get_anchor(&self, name: &str) -> Result<&Anchor> {
        self.anchors
            .get(name)
            .ok_or_else(|| Error::NotFound(format!("Anchor '{name}'")))
    }

    pub fn contains_anchor(&self, name: &str) -> bool {
        self.anchors.contains_key(name)
    }

    /// Record the cloud identifier of an anchor. This is the only field that
    /// may change after an anchor has been registered.
    pub fn set_external_id(&mut self, name: &str, external_id: impl Into<String>) -> Result<()> {
        let anchor = self.anchors
            .get_mut(name)
            .ok_or_else(|| Error::NotFound(format!("Anchor '{name}'")))?;
        anchor.external_id = Some(external_id.into());
        Ok(())
    }

    pub fn anchors(&self) -> impl Iterator<Item = &Anchor> {
        self.anchors.values()
    }

    pub fn anchor_count(&self) -> usize {
        self.anchors.len()
    }

    // ========================================================================
    // Edges
    // ========================================================================

    /// Insert `edge` unless its endpoints are already connected, in either
    /// key order.
    ///
    /// Returns `true` if the edge was inserted.
    pub fn add_edge(&mut self, edge: Edge) -> bool {
        if self.edges.contains_key(&edge.id) || self.edges.contains_key(&edge.reversed_id()) {
            debug!(edge = %edge.id, "edge already registered, ignoring");
            return false;
        }
        self.edges.insert(edge.id.clone(), edge);
        true
    }

    /// Look up an edge by id. The reversed key `"b,a"` finds the edge
    /// stored as `"a,b"`.
    pub fn get_edge(&self, id: &EdgeId) -> Result<&Edge> {
        self.edges
            .get(id)
            .or_else(|| self.edges.get(&id.reversed()))
            .ok_or_else(|| Error::NotFound(format!("Edge '{id}'")))
    }

    /// The edge joining `a` and `b`, if any.
    pub fn find_edge(&self, a: &str, b: &str) -> Option<&Edge> {
        self.edges
            .get(&EdgeId::between(a, b))
            .or_else(|| self.edges.get(&EdgeId::between(b, a)))
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty() && self.edges.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
