//! Route — the ordered anchor names of a navigation, origin first.

use serde::{Deserialize, Serialize};

/// Origin → … → destination, inclusive. An empty route means "no route".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    waypoints: Vec<String>,
}

impl Route {
    pub fn new(waypoints: Vec<String>) -> Self {
        Self { waypoints }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn origin(&self) -> Option<&str> {
        self.waypoints.first().map(String::as_str)
    }

    pub fn destination(&self) -> Option<&str> {
        self.waypoints.last().map(String::as_str)
    }

    pub fn waypoints(&self) -> &[String] {
        &self.waypoints
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.waypoints.iter().map(String::as_str)
    }

    /// Consecutive `(from, to)` pairs, e.g. for drawing transition lines.
    pub fn segments(&self) -> impl Iterator<Item = (&str, &str)> {
        self.waypoints
            .windows(2)
            .map(|w| (w[0].as_str(), w[1].as_str()))
    }

    pub fn into_waypoints(self) -> Vec<String> {
        self.waypoints
    }
}

impl<S: Into<String>> FromIterator<S> for Route {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}
