//! Anchor — a named physical waypoint with a pose.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Error;

/// Role of an anchor in the map.
///
/// `Main` anchors are the ones offered as origin/destination choices;
/// `Waypoint` anchors only exist to route through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnchorKind {
    Main,
    Waypoint,
}

impl AnchorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnchorKind::Main => "main",
            AnchorKind::Waypoint => "waypoint",
        }
    }
}

impl fmt::Display for AnchorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnchorKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "main" => Ok(AnchorKind::Main),
            "waypoint" => Ok(AnchorKind::Waypoint),
            other => Err(Error::Config(format!("unknown anchor kind '{other}'"))),
        }
    }
}

/// World-space position in meters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: &Vec3) -> f64 {
        let (dx, dy, dz) = (self.x - other.x, self.y - other.y, self.z - other.z);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// Row-major 4x4 world-to-local transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mat4(pub [[f64; 4]; 4]);

impl Mat4 {
    pub const IDENTITY: Mat4 = Mat4([
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]);
}

impl Default for Mat4 {
    fn default() -> Self {
        Mat4::IDENTITY
    }
}

/// A spatial anchor known to the map.
///
/// `external_id` is the identifier handed out by the cloud anchor service.
/// It stays `None` until the anchor has been committed remotely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub name: String,
    pub external_id: Option<String>,
    pub kind: AnchorKind,
    pub position: Vec3,
    pub local_transform: Mat4,
    /// When the anchor record was last written to the persistence store.
    #[serde(default)]
    pub committed_at: Option<DateTime<Utc>>,
}

impl Anchor {
    pub fn new(name: impl Into<String>, kind: AnchorKind) -> Self {
        Self {
            name: name.into(),
            external_id: None,
            kind,
            position: Vec3::ZERO,
            local_transform: Mat4::IDENTITY,
            committed_at: None,
        }
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.local_transform = transform;
        self
    }

    pub fn with_external_id(mut self, id: impl Into<String>) -> Self {
        self.external_id = Some(id.into());
        self
    }

    pub fn is_committed(&self) -> bool {
        self.external_id.is_some()
    }

    /// Straight-line distance between the two anchors' positions.
    pub fn distance_to(&self, other: &Anchor) -> f64 {
        self.position.distance(&other.position)
    }
}
