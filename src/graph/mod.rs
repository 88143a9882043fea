//! # Adjacency Graph
//!
//! Derived, rebuildable view of the edge registry:
//! `anchor name → (neighbor name → distance)`.
//!
//! Neighbor maps are `BTreeMap`s, so iteration is in name order no matter
//! what order edges were inserted in. The path finder's tie-break relies on
//! that.
//!
//! The graph is never patched in place by the navigator: every change to
//! the edge set triggers a full rebuild via [`build_adjacency`] or
//! [`build_with_vertices`].

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::model::Edge;

/// Neighbor name → edge distance.
pub type Neighbors = BTreeMap<String, f64>;

/// Undirected weighted graph keyed by anchor name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AdjacencyGraph {
    adjacency: BTreeMap<String, Neighbors>,
}

impl AdjacencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a vertex with no neighbors. No-op if it already exists.
    pub fn add_vertex(&mut self, name: &str) {
        if !self.adjacency.contains_key(name) {
            self.adjacency.insert(name.to_string(), Neighbors::new());
        }
    }

    /// Insert both directions of `edge`, skipping any directed pair that is
    /// already present. Returns the number of directed entries added.
    ///
    /// Edges with a negative or non-finite distance are rejected.
    pub fn insert_edge(&mut self, edge: &Edge) -> usize {
        if !edge.has_valid_distance() {
            warn!(edge = %edge.id, distance = edge.distance, "skipping edge with unusable distance");
            return 0;
        }
        let mut added = 0;
        for (from, to) in [
            (&edge.endpoint_a, &edge.endpoint_b),
            (&edge.endpoint_b, &edge.endpoint_a),
        ] {
            let neighbors = self.adjacency.entry(from.clone()).or_default();
            if !neighbors.contains_key(to) {
                neighbors.insert(to.clone(), edge.distance);
                added += 1;
            }
        }
        added
    }

    pub fn contains(&self, name: &str) -> bool {
        self.adjacency.contains_key(name)
    }

    pub fn neighbors(&self, name: &str) -> Option<&Neighbors> {
        self.adjacency.get(name)
    }

    /// Distance of the edge `a`–`b`, if they are adjacent.
    pub fn weight(&self, a: &str, b: &str) -> Option<f64> {
        self.adjacency.get(a).and_then(|n| n.get(b)).copied()
    }

    /// Vertex names in iteration (name) order.
    pub fn vertices(&self) -> impl Iterator<Item = &str> {
        self.adjacency.keys().map(String::as_str)
    }

    pub fn vertex_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Number of undirected edges.
    pub fn edge_count(&self) -> usize {
        let (loops, others) = self.adjacency.iter().fold((0, 0), |(l, o), (v, n)| {
            if n.contains_key(v) { (l + 1, o + n.len() - 1) } else { (l, o + n.len()) }
        });
        loops + others / 2
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    /// Check that every `a → b (d)` has a matching `b → a (d)`.
    pub fn is_symmetric(&self) -> bool {
        self.adjacency.iter().all(|(v, neighbors)| {
            neighbors
                .iter()
                .all(|(w, d)| self.weight(w, v) == Some(*d))
        })
    }
}

/// Build the adjacency graph of `edges`. Only anchors that appear in at
/// least one edge become vertices.
pub fn build_adjacency<'a>(edges: impl IntoIterator<Item = &'a Edge>) -> AdjacencyGraph {
    build_with_vertices(std::iter::empty::<&str>(), edges)
}

/// Build the adjacency graph of `edges`, also registering every name in
/// `vertices` so that isolated anchors are known to the path finder.
pub fn build_with_vertices<'a, 'v>(
    vertices: impl IntoIterator<Item = &'v str>,
    edges: impl IntoIterator<Item = &'a Edge>,
) -> AdjacencyGraph {
    let mut graph = AdjacencyGraph::new();
    for name in vertices {
        graph.add_vertex(name);
    }
    for edge in edges {
        graph.insert_edge(edge);
    }
    debug!(
        vertices = graph.vertex_count(),
        edges = graph.edge_count(),
        "rebuilt adjacency graph"
    );
    graph
}
