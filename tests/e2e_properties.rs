//! Property tests for the adjacency graph and the path finder over random
//! maps of up to eight anchors.

use anchor_nav::{AdjacencyGraph, Edge, build_adjacency, pathfind};
use proptest::prelude::*;

const NAMES: [&str; 8] = ["a", "b", "c", "d", "e", "f", "g", "h"];

fn random_edges() -> impl Strategy<Value = Vec<Edge>> {
    prop::collection::vec((0..NAMES.len(), 0..NAMES.len(), 0u8..20), 0..20).prop_map(|raw| {
        raw.into_iter()
            .filter(|(a, b, _)| a != b)
            .map(|(a, b, w)| Edge::new(NAMES[a], NAMES[b], f64::from(w)))
            .collect()
    })
}

/// All-pairs shortest distances by Floyd-Warshall, as a reference.
fn reference_distances(graph: &AdjacencyGraph) -> Vec<Vec<f64>> {
    let names: Vec<&str> = graph.vertices().collect();
    let n = names.len();
    let mut dist = vec![vec![f64::INFINITY; n]; n];
    for (i, a) in names.iter().enumerate() {
        dist[i][i] = 0.0;
        for (j, b) in names.iter().enumerate() {
            if let Some(w) = graph.weight(a, b) {
                dist[i][j] = dist[i][j].min(w);
            }
        }
    }
    for k in 0..n {
        for i in 0..n {
            for j in 0..n {
                let through = dist[i][k] + dist[k][j];
                if through < dist[i][j] {
                    dist[i][j] = through;
                }
            }
        }
    }
    dist
}

proptest! {
    #[test]
    fn adjacency_is_symmetric(edges in random_edges()) {
        let graph = build_adjacency(&edges);
        prop_assert!(graph.is_symmetric());
        for edge in &edges {
            prop_assert!(graph.weight(&edge.endpoint_a, &edge.endpoint_b).is_some());
        }
    }

    #[test]
    fn route_to_self_is_single_vertex(edges in random_edges()) {
        let graph = build_adjacency(&edges);
        for name in graph.vertices() {
            let path = pathfind::find(&graph, name, name).unwrap();
            prop_assert_eq!(path.route.waypoints(), &[name.to_string()]);
            prop_assert_eq!(path.total_distance, 0.0);
        }
    }

    #[test]
    fn routes_are_walkable_and_shortest(edges in random_edges()) {
        let graph = build_adjacency(&edges);
        let names: Vec<&str> = graph.vertices().collect();
        let reference = reference_distances(&graph);

        for (i, origin) in names.iter().enumerate() {
            for (j, destination) in names.iter().enumerate() {
                let path = pathfind::find(&graph, origin, destination).unwrap();
                prop_assert_eq!(path.total_distance, reference[i][j]);

                if !path.is_found() {
                    prop_assert!(path.route.is_empty());
                    continue;
                }
                prop_assert_eq!(path.route.origin(), Some(*origin));
                prop_assert_eq!(path.route.destination(), Some(*destination));

                // Every hop is an edge, and the hops add up to the total.
                let mut walked = 0.0;
                for (a, b) in path.route.segments() {
                    let w = graph.weight(a, b);
                    prop_assert!(w.is_some(), "no edge {} -> {}", a, b);
                    walked += w.unwrap_or_default();
                }
                prop_assert_eq!(walked, path.total_distance);
            }
        }
    }
}
