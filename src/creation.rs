//! Anchor-creation session.
//!
//! While mapping a building the user places anchors one after another. Each
//! new anchor is connected to the one placed just before it, with the
//! straight-line distance between them as the edge weight.

use tracing::debug;

use crate::gateway::{LocateGateway, PersistenceGateway};
use crate::model::Anchor;
use crate::{CommitOutcome, Navigator, Result};

/// Tracks the previously placed anchor of one mapping walk.
#[derive(Debug, Clone, Default)]
pub struct CreationSession {
    previous: Option<String>,
}

impl CreationSession {
    /// A session whose first anchor starts a new, unconnected chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// A session that continues from an existing anchor, e.g. one the user
    /// just located in the room.
    pub fn resume_from(name: impl Into<String>) -> Self {
        Self { previous: Some(name.into()) }
    }

    /// Name of the anchor the next one will be connected to.
    pub fn previous(&self) -> Option<&str> {
        self.previous.as_deref()
    }

    /// Commit `anchor`, connected to the previous anchor if there is one.
    ///
    /// On failure the previous anchor stays where it was, so the user can
    /// retry placing the same anchor.
    pub async fn commit<P, L>(&mut self, nav: &mut Navigator<P, L>, anchor: Anchor) -> Result<CommitOutcome>
    where
        P: PersistenceGateway,
        L: LocateGateway,
    {
        let name = anchor.name.clone();
        let outcome = nav.commit_anchor(anchor, self.previous.as_deref()).await?;
        debug!(anchor = %name, previous = self.previous.as_deref(), "placed anchor");
        self.previous = Some(name);
        Ok(outcome)
    }
}
