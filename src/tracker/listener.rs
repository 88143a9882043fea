//! Presentation callbacks.
//!
//! The navigator never talks to a UI directly. Whoever hosts it passes a
//! [`NavigationListener`] in at construction and receives every signal
//! synchronously, on the thread that drives the navigator.

use serde::Serialize;
use tokio::sync::mpsc;

use crate::model::Route;

/// Receiver of navigation signals. Every method defaults to a no-op.
pub trait NavigationListener: Send {
    /// A route was computed and is about to be located.
    fn on_route_computed(&mut self, _route: &Route) {}

    /// The head of the route was reached; `next` is the new target.
    fn on_waypoint_advance(&mut self, _next: &str) {}

    /// The destination was reached.
    fn on_route_completed(&mut self) {}

    /// No route could be computed or started.
    fn on_no_route_found(&mut self) {}

    /// An anchor other than the current target was reached.
    fn on_waypoint_visited(&mut self, _name: &str) {}
}

/// Listener that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopListener;

impl NavigationListener for NoopListener {}

/// A navigation signal as a value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum NavigationEvent {
    RouteComputed(Route),
    WaypointAdvance(String),
    RouteCompleted,
    NoRouteFound,
    WaypointVisited(String),
}

/// Listener that forwards every signal into a channel.
///
/// A closed receiver is not an error: signals are simply dropped.
#[derive(Debug, Clone)]
pub struct ChannelListener {
    tx: mpsc::UnboundedSender<NavigationEvent>,
}

impl ChannelListener {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<NavigationEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, event: NavigationEvent) {
        let _ = self.tx.send(event);
    }
}

impl NavigationListener for ChannelListener {
    fn on_route_computed(&mut self, route: &Route) {
        self.send(NavigationEvent::RouteComputed(route.clone()));
    }

    fn on_waypoint_advance(&mut self, next: &str) {
        self.send(NavigationEvent::WaypointAdvance(next.to_string()));
    }

    fn on_route_completed(&mut self) {
        self.send(NavigationEvent::RouteCompleted);
    }

    fn on_no_route_found(&mut self) {
        self.send(NavigationEvent::NoRouteFound);
    }

    fn on_waypoint_visited(&mut self, name: &str) {
        self.send(NavigationEvent::WaypointVisited(name.to_string()));
    }
}
