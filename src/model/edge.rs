//! Edge — an undirected, weighted connection between two anchors.

use serde::{Deserialize, Serialize};

use super::Anchor;

/// Composite edge key `"<a>,<b>"`.
///
/// The key records the order the endpoints were given in, but an edge is
/// directionless: `a,b` and `b,a` name the same connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeId(pub String);

impl EdgeId {
    pub fn between(a: &str, b: &str) -> Self {
        EdgeId(format!("{a},{b}"))
    }

    /// The key with its endpoints swapped.
    ///
    /// Splits on the first comma, so it is only exact for comma-free names.
    /// With an [`Edge`] at hand, prefer [`Edge::reversed_id`].
    pub fn reversed(&self) -> Self {
        match self.0.split_once(',') {
            Some((a, b)) => EdgeId::between(b, a),
            None => self.clone(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EdgeId {
    fn from(s: &str) -> Self {
        EdgeId(s.to_string())
    }
}

/// An edge of the anchor map. Distance is in meters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub endpoint_a: String,
    pub endpoint_b: String,
    pub distance: f64,
}

impl Edge {
    pub fn new(a: impl Into<String>, b: impl Into<String>, distance: f64) -> Self {
        let (endpoint_a, endpoint_b) = (a.into(), b.into());
        Self {
            id: EdgeId::between(&endpoint_a, &endpoint_b),
            endpoint_a,
            endpoint_b,
            distance,
        }
    }

    /// Edge between two placed anchors, weighted by their straight-line distance.
    pub fn between(a: &Anchor, b: &Anchor) -> Self {
        Self::new(a.name.clone(), b.name.clone(), a.distance_to(b))
    }

    /// The key of this edge with its endpoints swapped.
    pub fn reversed_id(&self) -> EdgeId {
        EdgeId::between(&self.endpoint_b, &self.endpoint_a)
    }

    /// Usable as a graph weight: finite and non-negative.
    pub fn has_valid_distance(&self) -> bool {
        self.distance.is_finite() && self.distance >= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnchorKind, Vec3};

    #[test]
    fn test_id_is_composite() {
        let e = Edge::new("lobby", "hall", 4.0);
        assert_eq!(e.id.as_str(), "lobby,hall");
        assert_eq!(e.id.reversed(), EdgeId::between("hall", "lobby"));
    }

    #[test]
    fn test_reversed_id_uses_endpoints() {
        let e = Edge::new("x,y", "z", 1.0);
        assert_eq!(e.reversed_id().as_str(), "z,x,y");
        // Re-parsing the key splits at the wrong comma.
        assert_ne!(e.id.reversed(), e.reversed_id());
    }

    #[test]
    fn test_between_anchors_uses_positions() {
        let a = Anchor::new("a", AnchorKind::Main).with_position(Vec3::new(1.0, 0.0, 0.0));
        let b = Anchor::new("b", AnchorKind::Main).with_position(Vec3::new(1.0, 0.0, 2.5));
        let e = Edge::between(&a, &b);
        assert_eq!(e.distance, 2.5);
        assert_eq!(e.id.as_str(), "a,b");
    }

    #[test]
    fn test_invalid_distances() {
        assert!(!Edge::new("a", "b", -1.0).has_valid_distance());
        assert!(!Edge::new("a", "b", f64::NAN).has_valid_distance());
        assert!(Edge::new("a", "b", 0.0).has_valid_distance());
    }
}
