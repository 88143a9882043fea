//! # Anchor Map Model
//!
//! Plain DTOs shared by every layer: store ↔ graph ↔ path finder ↔ tracker
//! ↔ gateways.
//!
//! Design rule: this module is pure data. No I/O, no state, no async.

pub mod anchor;
pub mod edge;
pub mod route;

pub use anchor::{Anchor, AnchorKind, Mat4, Vec3};
pub use edge::{Edge, EdgeId};
pub use route::Route;
