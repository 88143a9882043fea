//! Locate search — bookkeeping for one "find these anchors" request.
//!
//! A search knows which anchors it is waiting for, keyed by their cloud
//! identifiers. It consumes a [`LocateWatch`], ignoring identifiers it did
//! not ask for and repeated deliveries, until every anchor was found.
//!
//! There is no timeout. A search whose watch never delivers stays in the
//! searching state; callers that want a deadline wrap
//! [`LocateSearch::wait_all`] in their runtime's timeout.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::gateway::{LocateWatch, LocatedAnchor};
use crate::tracker::SessionEpoch;

/// Where a search stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocateStatus {
    Searching { pending: usize },
    Complete,
    /// The watch ended before everything was found.
    Abandoned { missing: Vec<String> },
}

pub struct LocateSearch {
    epoch: SessionEpoch,
    /// external id → anchor name, still to be found
    pending: BTreeMap<String, String>,
    /// anchor name → where it was found
    found: BTreeMap<String, LocatedAnchor>,
    watch: LocateWatch,
    closed: bool,
}

impl LocateSearch {
    /// Search for `targets` (`(anchor name, external id)` pairs) on `watch`.
    pub fn new(
        epoch: SessionEpoch,
        targets: impl IntoIterator<Item = (String, String)>,
        watch: LocateWatch,
    ) -> Self {
        let pending = targets.into_iter().map(|(name, id)| (id, name)).collect();
        Self {
            epoch,
            pending,
            found: BTreeMap::new(),
            watch,
            closed: false,
        }
    }

    /// Epoch of the route request this search belongs to.
    pub fn epoch(&self) -> SessionEpoch {
        self.epoch
    }

    /// Record one delivery. Returns the anchor name if it was newly found.
    pub fn accept(&mut self, located: LocatedAnchor) -> Option<String> {
        let Some(name) = self.pending.remove(&located.external_id) else {
            debug!(external_id = %located.external_id, "ignoring unrequested or repeated anchor");
            return None;
        };
        debug!(anchor = %name, left = self.pending.len(), "anchor located");
        self.found.insert(name.clone(), located);
        if self.pending.is_empty() {
            info!(found = self.found.len(), "all requested anchors located");
        }
        Some(name)
    }

    /// Wait for the next newly found anchor.
    ///
    /// Returns `None` once everything was found or the watch ended.
    pub async fn next_found(&mut self) -> Option<String> {
        while !self.pending.is_empty() && !self.closed {
            match self.watch.next().await {
                Some(located) => {
                    if let Some(name) = self.accept(located) {
                        return Some(name);
                    }
                }
                None => self.closed = true,
            }
        }
        None
    }

    /// Apply everything already delivered without waiting.
    pub fn poll(&mut self) -> LocateStatus {
        while !self.pending.is_empty() {
            let Some(located) = self.watch.try_next() else { break };
            self.accept(located);
        }
        self.status()
    }

    /// Wait until every anchor was found or the watch ended.
    pub async fn wait_all(&mut self) -> LocateStatus {
        while self.next_found().await.is_some() {}
        self.status()
    }

    pub fn status(&self) -> LocateStatus {
        if self.pending.is_empty() {
            LocateStatus::Complete
        } else if self.closed {
            LocateStatus::Abandoned { missing: self.pending_names() }
        } else {
            LocateStatus::Searching { pending: self.pending.len() }
        }
    }

    pub fn is_complete(&self) -> bool {
        self.pending.is_empty()
    }

    /// Names still being searched for, sorted.
    pub fn pending_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.pending.values().cloned().collect();
        names.sort();
        names
    }

    /// Where each found anchor was located, by anchor name.
    pub fn found(&self) -> &BTreeMap<String, LocatedAnchor> {
        &self.found
    }
}

impl std::fmt::Debug for LocateSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocateSearch")
            .field("epoch", &self.epoch)
            .field("pending", &self.pending)
            .field("found", &self.found.keys().collect::<Vec<_>>())
            .field("closed", &self.closed)
            .finish()
    }
}
