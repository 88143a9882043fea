//! # Route Tracker
//!
//! Drives a live walk along a computed route.
//!
//! ```text
//!   Idle ──start(route)──▶ Active(remaining) ──last waypoint──▶ Completed
//!    ▲                         │
//!    └──────── abort() ────────┘   (abort() from any state)
//! ```
//!
//! Only reaching the *head* of the remaining route advances it. Any other
//! anchor is recorded as visited and reported, but the route is untouched.
//!
//! Every `start()`, `abort()` and [`RouteTracker::begin_request`] bumps the
//! session epoch. Results of asynchronous work tagged with an older epoch
//! are stale and must be dropped.

pub mod listener;

use std::collections::{BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::model::Route;
use crate::{Error, Result};

pub use listener::{ChannelListener, NavigationEvent, NavigationListener, NoopListener};

/// Monotonic navigation-session counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionEpoch(pub u64);

impl std::fmt::Display for SessionEpoch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Tracker state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerState {
    Idle,
    /// Waypoints still to reach; the front is the current target.
    Active(VecDeque<String>),
    Completed,
}

/// What a waypoint-reached event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaypointOutcome {
    /// The head was reached; this is the new target.
    Advanced(String),
    /// The destination was reached.
    Completed,
    /// A non-head anchor reached for the first time.
    Visited,
    /// Nothing changed.
    Ignored,
}

pub struct RouteTracker {
    state: TrackerState,
    visited: BTreeSet<String>,
    epoch: SessionEpoch,
    listener: Box<dyn NavigationListener>,
}

impl RouteTracker {
    pub fn new(listener: Box<dyn NavigationListener>) -> Self {
        Self {
            state: TrackerState::Idle,
            visited: BTreeSet::new(),
            epoch: SessionEpoch(0),
            listener,
        }
    }

    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, TrackerState::Active(_))
    }

    /// Remaining waypoints, current target first. Empty unless active.
    pub fn remaining(&self) -> Vec<&str> {
        match &self.state {
            TrackerState::Active(remaining) => remaining.iter().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }

    /// The waypoint the user should walk to next.
    pub fn current_target(&self) -> Option<&str> {
        match &self.state {
            TrackerState::Active(remaining) => remaining.front().map(String::as_str),
            _ => None,
        }
    }

    pub fn visited(&self) -> &BTreeSet<String> {
        &self.visited
    }

    // ========================================================================
    // Session epoch
    // ========================================================================

    pub fn epoch(&self) -> SessionEpoch {
        self.epoch
    }

    pub fn is_current(&self, epoch: SessionEpoch) -> bool {
        self.epoch == epoch
    }

    /// Open a new route request. Any older request becomes stale.
    pub fn begin_request(&mut self) -> SessionEpoch {
        self.bump_epoch()
    }

    fn bump_epoch(&mut self) -> SessionEpoch {
        self.epoch = SessionEpoch(self.epoch.0 + 1);
        self.epoch
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    /// Start walking `route`, replacing whatever was in progress.
    pub fn start(&mut self, route: Route) -> Result<()> {
        if route.is_empty() {
            return Err(Error::InvalidRoute("cannot start navigation on an empty route".into()));
        }
        let epoch = self.bump_epoch();
        info!(
            epoch = %epoch,
            origin = route.origin(),
            destination = route.destination(),
            waypoints = route.len(),
            "navigation started"
        );
        self.visited.clear();
        self.state = TrackerState::Active(route.into_waypoints().into());
        Ok(())
    }

    /// Start `route` only if `epoch` is still the current one.
    ///
    /// Returns `Ok(false)` and leaves the tracker untouched when the request
    /// was superseded.
    pub fn start_if_current(&mut self, epoch: SessionEpoch, route: Route) -> Result<bool> {
        if !self.is_current(epoch) {
            debug!(stale = %epoch, current = %self.epoch, "dropping stale route");
            return Ok(false);
        }
        self.start(route)?;
        Ok(true)
    }

    /// The user arrived at anchor `name`.
    pub fn on_waypoint_reached(&mut self, name: &str) -> WaypointOutcome {
        let TrackerState::Active(remaining) = &mut self.state else {
            return WaypointOutcome::Ignored;
        };

        if remaining.front().map(String::as_str) != Some(name) {
            if !self.visited.insert(name.to_string()) {
                return WaypointOutcome::Ignored;
            }
            debug!(anchor = name, expected = remaining.front().map(String::as_str), "reached non-target anchor");
            self.listener.on_waypoint_visited(name);
            return WaypointOutcome::Visited;
        }

        remaining.pop_front();
        self.visited.insert(name.to_string());

        match remaining.front().cloned() {
            Some(next) => {
                debug!(reached = name, next = %next, left = remaining.len(), "advancing to next waypoint");
                self.listener.on_waypoint_advance(&next);
                WaypointOutcome::Advanced(next)
            }
            None => {
                info!(destination = name, "route completed");
                self.state = TrackerState::Completed;
                self.listener.on_route_completed();
                WaypointOutcome::Completed
            }
        }
    }

    /// Drop any route in progress and return to `Idle`.
    pub fn abort(&mut self) {
        let epoch = self.bump_epoch();
        if self.is_active() {
            info!(epoch = %epoch, "navigation aborted");
        }
        self.state = TrackerState::Idle;
        self.visited.clear();
    }

    // ========================================================================
    // Signals owned by the navigator
    // ========================================================================

    pub(crate) fn notify_route_computed(&mut self, route: &Route) {
        self.listener.on_route_computed(route);
    }

    pub(crate) fn notify_no_route(&mut self) {
        self.listener.on_no_route_found();
    }
}

impl std::fmt::Debug for RouteTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteTracker")
            .field("state", &self.state)
            .field("visited", &self.visited)
            .field("epoch", &self.epoch)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn tracker() -> (RouteTracker, UnboundedReceiver<NavigationEvent>) {
        let (listener, rx) = ChannelListener::new();
        (RouteTracker::new(Box::new(listener)), rx)
    }

    fn drain(rx: &mut UnboundedReceiver<NavigationEvent>) -> Vec<NavigationEvent> {
        let mut events = Vec::new();
        while let Ok(e) = rx.try_recv() {
            events.push(e);
        }
        events
    }

    fn abc() -> Route {
        ["A", "B", "C"].into_iter().collect()
    }

    #[test]
    fn test_walk_full_route() {
        let (mut t, mut rx) = tracker();
        t.start(abc()).unwrap();

        assert_eq!(t.on_waypoint_reached("A"), WaypointOutcome::Advanced("B".into()));
        assert_eq!(t.remaining(), vec!["B", "C"]);
        assert_eq!(drain(&mut rx), vec![NavigationEvent::WaypointAdvance("B".into())]);

        t.on_waypoint_reached("B");
        assert_eq!(t.on_waypoint_reached("C"), WaypointOutcome::Completed);
        assert!(t.remaining().is_empty());
        assert_eq!(t.state(), &TrackerState::Completed);
        assert_eq!(
            drain(&mut rx),
            vec![NavigationEvent::WaypointAdvance("C".into()), NavigationEvent::RouteCompleted]
        );
    }

    #[test]
    fn test_non_head_waypoint_leaves_route() {
        let (mut t, mut rx) = tracker();
        t.start(abc()).unwrap();

        assert_eq!(t.on_waypoint_reached("C"), WaypointOutcome::Visited);
        assert_eq!(t.remaining(), vec!["A", "B", "C"]);
        assert!(t.visited().contains("C"));
        assert_eq!(drain(&mut rx), vec![NavigationEvent::WaypointVisited("C".into())]);

        // Second report of the same anchor changes nothing.
        assert_eq!(t.on_waypoint_reached("C"), WaypointOutcome::Ignored);
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_reaching_passed_waypoint_again_is_ignored() {
        let (mut t, _rx) = tracker();
        t.start(abc()).unwrap();
        t.on_waypoint_reached("A");
        assert_eq!(t.on_waypoint_reached("A"), WaypointOutcome::Ignored);
        assert_eq!(t.remaining(), vec!["B", "C"]);
    }

    #[test]
    fn test_empty_route_cannot_start() {
        let (mut t, _rx) = tracker();
        assert!(matches!(t.start(Route::empty()), Err(Error::InvalidRoute(_))));
        assert_eq!(t.state(), &TrackerState::Idle);
    }

    #[test]
    fn test_single_waypoint_route() {
        let (mut t, _rx) = tracker();
        t.start(["A"].into_iter().collect()).unwrap();
        assert_eq!(t.current_target(), Some("A"));
        assert_eq!(t.on_waypoint_reached("A"), WaypointOutcome::Completed);
    }

    #[test]
    fn test_idle_ignores_waypoints() {
        let (mut t, mut rx) = tracker();
        assert_eq!(t.on_waypoint_reached("A"), WaypointOutcome::Ignored);
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_abort_returns_to_idle() {
        let (mut t, _rx) = tracker();
        t.start(abc()).unwrap();
        t.on_waypoint_reached("A");
        t.abort();
        assert_eq!(t.state(), &TrackerState::Idle);
        assert!(t.visited().is_empty());
        assert_eq!(t.on_waypoint_reached("B"), WaypointOutcome::Ignored);
    }

    #[test]
    fn test_stale_epoch_is_dropped() {
        let (mut t, _rx) = tracker();
        let first = t.begin_request();
        let second = t.begin_request();
        assert!(first < second);

        assert!(!t.start_if_current(first, abc()).unwrap());
        assert_eq!(t.state(), &TrackerState::Idle);

        assert!(t.start_if_current(second, abc()).unwrap());
        assert!(t.is_active());
    }

    #[test]
    fn test_abort_invalidates_pending_request() {
        let (mut t, _rx) = tracker();
        let ticket = t.begin_request();
        t.abort();
        assert!(!t.start_if_current(ticket, abc()).unwrap());
    }
}
