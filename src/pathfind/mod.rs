//! # Path Finder
//!
//! Single-source Dijkstra over an [`AdjacencyGraph`], stopping as soon as
//! the destination is settled.
//!
//! ## Tie-break
//!
//! The next vertex to settle is the unvisited one with the smallest tentative
//! distance. Ties go to the vertex encountered first while scanning the
//! graph's vertices in iteration order, which for [`AdjacencyGraph`] is
//! ascending name order. Relaxation uses a strict `<`, so among equal-length
//! routes the predecessor settled first is kept.
//!
//! The minimum is found with a linear scan (O(V²) per query). Anchor maps
//! hold tens of anchors, and the scan keeps the tie-break exact.

use hashbrown::HashMap;
use serde::Serialize;
use tracing::debug;

use crate::graph::AdjacencyGraph;
use crate::model::Route;
use crate::{Error, Result};

/// A computed route and its length in meters.
///
/// When the destination is unreachable the route is empty and
/// `total_distance` is `f64::INFINITY`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShortestPath {
    pub route: Route,
    pub total_distance: f64,
}

impl ShortestPath {
    pub fn is_found(&self) -> bool {
        !self.route.is_empty()
    }
}

/// Shortest route from `origin` to `destination`, as anchor names.
///
/// Returns an empty route if `destination` cannot be reached. Fails with
/// [`Error::InvalidRoute`] if either name is not a vertex of `graph`.
pub fn shortest_path(graph: &AdjacencyGraph, origin: &str, destination: &str) -> Result<Route> {
    find(graph, origin, destination).map(|p| p.route)
}

/// Like [`shortest_path`], also reporting the total distance.
pub fn find(graph: &AdjacencyGraph, origin: &str, destination: &str) -> Result<ShortestPath> {
    if !graph.contains(origin) {
        return Err(Error::InvalidRoute(format!("unknown origin '{origin}'")));
    }
    if !graph.contains(destination) {
        return Err(Error::InvalidRoute(format!("unknown destination '{destination}'")));
    }

    if origin == destination {
        return Ok(ShortestPath {
            route: Route::new(vec![origin.to_string()]),
            total_distance: 0.0,
        });
    }

    let names: Vec<&str> = graph.vertices().collect();
    let index: HashMap<&str, usize> = names.iter().enumerate().map(|(i, n)| (*n, i)).collect();

    let mut dist = vec![f64::INFINITY; names.len()];
    let mut prev: Vec<Option<usize>> = vec![None; names.len()];
    let mut settled = vec![false; names.len()];
    let mut remaining = names.len();

    dist[index[origin]] = 0.0;
    let target = index[destination];

    while remaining > 0 {
        // First unvisited vertex with the strictly smallest distance.
        let mut u = None;
        let mut best = f64::INFINITY;
        for (i, d) in dist.iter().enumerate() {
            if !settled[i] && *d < best {
                best = *d;
                u = Some(i);
            }
        }
        // Everything left is unreachable.
        let Some(u) = u else { break };

        settled[u] = true;
        remaining -= 1;
        if u == target {
            break;
        }

        if let Some(neighbors) = graph.neighbors(names[u]) {
            for (w, weight) in neighbors {
                let Some(&wi) = index.get(w.as_str()) else { continue };
                let alt = dist[u] + weight;
                if alt < dist[wi] {
                    dist[wi] = alt;
                    prev[wi] = Some(u);
                }
            }
        }
    }

    if prev[target].is_none() {
        debug!(origin, destination, "destination unreachable");
        return Ok(ShortestPath { route: Route::empty(), total_distance: f64::INFINITY });
    }

    let mut backwards = vec![names[target].to_string()];
    let mut cursor = target;
    while let Some(p) = prev[cursor] {
        backwards.push(names[p].to_string());
        cursor = p;
    }
    debug_assert_eq!(names[cursor], origin);
    backwards.reverse();

    let path = ShortestPath { route: Route::new(backwards), total_distance: dist[target] };
    debug!(
        origin,
        destination,
        hops = path.route.len() - 1,
        distance = path.total_distance,
        "found shortest path"
    );
    Ok(path)
}

// ============================================================================
// Tests
// ============================================================================
