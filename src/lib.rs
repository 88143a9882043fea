//! # anchor-nav — Anchor Graph Navigation Core
//!
//! The engine-independent heart of an AR indoor-navigation app: a map of
//! named spatial anchors joined by distance-weighted edges, shortest routes
//! over that map, and tracking of a live walk along a route.
//!
//! ## Design Principles
//!
//! 1. **Gateways at the edges**: persistence and anchor locating are traits;
//!    the core never does I/O itself
//! 2. **Synchronous core**: store, graph, path finder and tracker are plain
//!    data owned by one [`Navigator`], mutated through `&mut self`
//! 3. **Rebuild, don't patch**: the adjacency graph is rebuilt from the edge
//!    registry whenever it changes
//! 4. **Explicit signals**: presentation is reached through a
//!    [`NavigationListener`] passed in at construction
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use anchor_nav::Navigator;
//!
//! # async fn example() -> anchor_nav::Result<()> {
//! let mut nav = Navigator::open_memory()?;
//! nav.load().await?;
//!
//! let started = nav.navigate("entrance", "lab").await?;
//! println!("walking {:.1} m via {:?}", started.path.total_distance, started.path.route);
//!
//! nav.waypoint_reached("entrance");
//! # Ok(())
//! # }
//! ```
//!
//! ## Gateways
//!
//! | Gateway | Trait | Description |
//! |---------|-------|-------------|
//! | `MemoryGateway` | `PersistenceGateway` | In-memory anchor/edge tables |
//! | `MemoryLocator` | `LocateGateway` | Scripted anchor locating for tests |

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod store;
pub mod graph;
pub mod pathfind;
pub mod tracker;
pub mod gateway;
pub mod locate;
pub mod creation;
pub mod config;
pub mod export;

use std::collections::BTreeMap;

use chrono::Utc;
use tracing::{info, warn};

// ============================================================================
// Re-exports: Model (the DTOs)
// ============================================================================

pub use model::{Anchor, AnchorKind, Edge, EdgeId, Mat4, Route, Vec3};

// ============================================================================
// Re-exports: Core
// ============================================================================

pub use store::EntityStore;
pub use graph::{AdjacencyGraph, build_adjacency, build_with_vertices};
pub use pathfind::{ShortestPath, shortest_path};
pub use tracker::{
    RouteTracker, TrackerState, WaypointOutcome, SessionEpoch,
    NavigationListener, NavigationEvent, ChannelListener, NoopListener,
};

// ============================================================================
// Re-exports: Gateways
// ============================================================================

pub use gateway::{
    PersistenceGateway, LocateGateway, LocateWatch, LocatedAnchor,
    MemoryGateway, MemoryLocator,
};
pub use locate::{LocateSearch, LocateStatus};
pub use creation::CreationSession;
pub use config::NavigatorConfig;
pub use export::MapSnapshot;

// ============================================================================
// Navigator
// ============================================================================

/// The primary entry point. A `Navigator` owns the anchor map and the route
/// tracker, and talks to the outside world through its two gateways.
pub struct Navigator<P: PersistenceGateway, L: LocateGateway> {
    persistence: P,
    locator: L,
    config: NavigatorConfig,
    store: EntityStore,
    graph: AdjacencyGraph,
    tracker: RouteTracker,
}

/// Result of [`Navigator::load`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub anchors_loaded: usize,
    pub anchors_added: usize,
    pub edges_loaded: usize,
    pub edges_added: usize,
    /// Rows ignored because an anchor name is empty or contains a comma.
    pub skipped: usize,
}

/// Result of [`Navigator::commit_anchor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitOutcome {
    /// False if an anchor of that name was already registered locally.
    pub anchor_added: bool,
    /// The edge created to the previous anchor, if any.
    pub edge: Option<EdgeId>,
}

/// A computed route waiting for its anchors to be located.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRequest {
    pub epoch: SessionEpoch,
    pub path: ShortestPath,
    /// `(anchor name, external id)` for every waypoint, in route order.
    pub targets: Vec<(String, String)>,
}

impl RouteRequest {
    pub fn external_ids(&self) -> Vec<String> {
        self.targets.iter().map(|(_, id)| id.clone()).collect()
    }
}

/// Result of [`Navigator::navigate`]: every waypoint was located and the
/// tracker is walking the route.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationStart {
    pub path: ShortestPath,
    /// Where each waypoint was found, by anchor name.
    pub located: BTreeMap<String, LocatedAnchor>,
}

impl<P: PersistenceGateway, L: LocateGateway> Navigator<P, L> {
    /// Create a navigator with an empty map and a no-op listener.
    pub fn new(persistence: P, locator: L, config: NavigatorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            persistence,
            locator,
            config,
            store: EntityStore::new(),
            graph: AdjacencyGraph::new(),
            tracker: RouteTracker::new(Box::new(NoopListener)),
        })
    }

    /// Route presentation signals to `listener`.
    pub fn with_listener(mut self, listener: impl NavigationListener + 'static) -> Self {
        self.tracker = RouteTracker::new(Box::new(listener));
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn config(&self) -> &NavigatorConfig {
        &self.config
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn graph(&self) -> &AdjacencyGraph {
        &self.graph
    }

    pub fn tracker(&self) -> &RouteTracker {
        &self.tracker
    }

    /// Access the persistence gateway (for advanced use).
    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    /// Access the locate gateway (for advanced use).
    pub fn locator(&self) -> &L {
        &self.locator
    }

    /// Names of anchors that can be picked as origin or destination, sorted.
    pub fn destinations(&self) -> Vec<String> {
        let mut names: Vec<String> = self.store
            .anchors()
            .filter(|a| self.config.is_navigable(a.kind))
            .map(|a| a.name.clone())
            .collect();
        names.sort();
        names
    }

    pub fn snapshot(&self) -> MapSnapshot {
        MapSnapshot::of(&self.store)
    }

    // ========================================================================
    // Map maintenance
    // ========================================================================

    /// Pull every committed anchor and edge from persistence into the local
    /// store, then rebuild the graph.
    ///
    /// Nothing is applied unless both loads succeed.
    pub async fn load(&mut self) -> Result<LoadSummary> {
        let anchors = self.persistence.load_all_anchors().await.inspect_err(|e| {
            warn!(error = %e, table = %self.config.anchor_table, "failed to load anchors");
        })?;
        let edges = self.persistence.load_all_edges().await.inspect_err(|e| {
            warn!(error = %e, table = %self.config.edge_table, "failed to load edges");
        })?;

        let mut summary = LoadSummary {
            anchors_loaded: anchors.len(),
            edges_loaded: edges.len(),
            ..LoadSummary::default()
        };
        for anchor in anchors {
            if let Err(e) = check_anchor_name(&anchor.name) {
                warn!(error = %e, "skipping stored anchor");
                summary.skipped += 1;
                continue;
            }
            if self.store.add_anchor(anchor) {
                summary.anchors_added += 1;
            }
        }
        for edge in edges {
            if check_anchor_name(&edge.endpoint_a).is_err() || check_anchor_name(&edge.endpoint_b).is_err() {
                warn!(edge = %edge.id, "skipping stored edge with an unusable endpoint name");
                summary.skipped += 1;
                continue;
            }
            if !self.store.contains_anchor(&edge.endpoint_a) || !self.store.contains_anchor(&edge.endpoint_b) {
                warn!(edge = %edge.id, "edge references an unknown anchor");
            }
            if self.store.add_edge(edge) {
                summary.edges_added += 1;
            }
        }
        self.rebuild_graph();

        if summary.anchors_loaded == 0 {
            info!("no committed anchors found");
        } else {
            info!(
                anchors = summary.anchors_loaded,
                edges = summary.edges_loaded,
                "loaded anchor map"
            );
        }
        Ok(summary)
    }

    /// Rebuild the adjacency graph from the full edge registry. Every
    /// registered anchor is a vertex, connected or not.
    pub fn rebuild_graph(&mut self) {
        self.graph = build_with_vertices(
            self.store.anchors().map(|a| a.name.as_str()),
            self.store.edges(),
        );
    }

    /// Persist `anchor`, plus an edge to `connect_to` if given, then add
    /// both to the local store.
    ///
    /// The anchor must already carry its cloud identifier. Local state only
    /// changes after every write was confirmed; a refused or failed write
    /// leaves the store and graph untouched.
    ///
    /// A name that is already registered keeps its kind and placement. Only
    /// its cloud identifier can be updated; a differing kind, position or
    /// transform is rejected before anything is written.
    pub async fn commit_anchor(&mut self, anchor: Anchor, connect_to: Option<&str>) -> Result<CommitOutcome> {
        check_anchor_name(&anchor.name)?;
        let Some(external_id) = anchor.external_id.clone() else {
            return Err(Error::InvalidAnchor(format!("anchor '{}' has no cloud identifier", anchor.name)));
        };

        let (anchor, needs_write) = match self.store.get_anchor(&anchor.name) {
            Ok(stored) => {
                if stored.kind != anchor.kind
                    || stored.position != anchor.position
                    || stored.local_transform != anchor.local_transform
                {
                    return Err(Error::InvalidAnchor(format!(
                        "anchor '{}' is already committed with a different placement",
                        anchor.name
                    )));
                }
                let id_changed = stored.external_id.as_deref() != Some(external_id.as_str());
                let mut stored = stored.clone();
                stored.external_id = Some(external_id.clone());
                (stored, id_changed)
            }
            Err(_) => {
                let mut anchor = anchor;
                anchor.committed_at = Some(Utc::now());
                (anchor, true)
            }
        };

        let edge = match connect_to {
            Some(prev) if prev != anchor.name => {
                let prev = self.store.get_anchor(prev)?;
                match self.store.find_edge(&prev.name, &anchor.name) {
                    Some(_) => None,
                    None => Some(Edge::between(prev, &anchor)),
                }
            }
            _ => None,
        };

        if needs_write {
            confirm(self.persistence.upsert_anchor(&anchor).await, &self.config.anchor_table, &anchor.name)?;
        }
        if let Some(edge) = &edge {
            confirm(self.persistence.upsert_edge(edge).await, &self.config.edge_table, edge.id.as_str())?;
        }

        let name = anchor.name.clone();
        let anchor_added = self.store.add_anchor(anchor);
        if !anchor_added && needs_write {
            self.store.set_external_id(&name, external_id)?;
        }
        let edge = edge.map(|e| {
            let id = e.id.clone();
            self.store.add_edge(e);
            id
        });
        if self.config.rebuild_on_commit {
            self.rebuild_graph();
        }

        info!(anchor = %name, edge = edge.as_ref().map(EdgeId::as_str), "committed anchor");
        Ok(CommitOutcome { anchor_added, edge })
    }

    // ========================================================================
    // Routing
    // ========================================================================

    /// Compute the shortest route and signal the outcome to the listener.
    ///
    /// An unreachable destination is reported as [`Error::InvalidRoute`]
    /// after `on_no_route_found` was signalled.
    pub fn plan_route(&mut self, origin: &str, destination: &str) -> Result<ShortestPath> {
        match self.route_between(origin, destination) {
            Ok(path) => {
                self.tracker.notify_route_computed(&path.route);
                Ok(path)
            }
            Err(e) => {
                self.tracker.notify_no_route();
                Err(e)
            }
        }
    }

    /// Open a new route request. Earlier requests become stale.
    pub fn request_route(&mut self, origin: &str, destination: &str) -> Result<RouteRequest> {
        let epoch = self.tracker.begin_request();
        let planned = self.route_between(origin, destination).and_then(|path| {
            let targets = self.locate_targets(&path.route)?;
            Ok((path, targets))
        });
        match planned {
            Ok((path, targets)) => {
                self.tracker.notify_route_computed(&path.route);
                Ok(RouteRequest { epoch, path, targets })
            }
            Err(e) => {
                self.tracker.notify_no_route();
                Err(e)
            }
        }
    }

    /// Ask the locate gateway for every waypoint of `request`.
    pub async fn locate(&self, request: &RouteRequest) -> Result<LocateSearch> {
        let watch = self.locator.find_by_ids(&request.external_ids()).await.inspect_err(|e| {
            warn!(error = %e, epoch = %request.epoch, "locate request failed");
        })?;
        Ok(LocateSearch::new(request.epoch, request.targets.clone(), watch))
    }

    /// Start walking `request`'s route, unless it was superseded.
    pub fn begin(&mut self, request: RouteRequest) -> Result<bool> {
        self.tracker.start_if_current(request.epoch, request.path.route)
    }

    /// Plan, locate and start a route in one go.
    ///
    /// Waits until every waypoint was located. If the locate service never
    /// finds one of them, this never returns; apply a timeout around it if
    /// that matters.
    ///
    /// The navigator stays borrowed for the whole call, so nothing can
    /// supersede the request meanwhile. Callers that need to abort or
    /// re-plan while anchors are being located use [`request_route`],
    /// [`locate`] and [`begin`] instead.
    ///
    /// [`request_route`]: Navigator::request_route
    /// [`locate`]: Navigator::locate
    /// [`begin`]: Navigator::begin
    pub async fn navigate(&mut self, origin: &str, destination: &str) -> Result<NavigationStart> {
        let request = self.request_route(origin, destination)?;
        let mut search = match self.locate(&request).await {
            Ok(search) => search,
            Err(e) => {
                self.tracker.notify_no_route();
                return Err(e);
            }
        };

        if let LocateStatus::Abandoned { missing } = search.wait_all().await {
            self.tracker.notify_no_route();
            return Err(Error::CollaboratorFailure(format!(
                "locate stopped before finding {}",
                missing.join(", ")
            )));
        }

        self.tracker.start(request.path.route.clone())?;
        Ok(NavigationStart { path: request.path, located: search.found().clone() })
    }

    // ========================================================================
    // Live walk
    // ========================================================================

    /// The user arrived at anchor `name`.
    pub fn waypoint_reached(&mut self, name: &str) -> WaypointOutcome {
        self.tracker.on_waypoint_reached(name)
    }

    /// Stop navigating. Requests still in flight become stale.
    pub fn abort(&mut self) {
        self.tracker.abort();
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn route_between(&self, origin: &str, destination: &str) -> Result<ShortestPath> {
        let path = pathfind::find(&self.graph, origin, destination)?;
        if !path.is_found() {
            return Err(Error::InvalidRoute(format!("no route from '{origin}' to '{destination}'")));
        }
        Ok(path)
    }

    fn locate_targets(&self, route: &Route) -> Result<Vec<(String, String)>> {
        route
            .iter()
            .map(|name| -> Result<(String, String)> {
                let anchor = self.store.get_anchor(name)?;
                let id = anchor.external_id.clone().ok_or_else(|| {
                    Error::InvalidAnchor(format!("anchor '{name}' has no cloud identifier"))
                })?;
                Ok((name.to_string(), id))
            })
            .collect()
    }
}

/// In-memory navigator for testing and embedding.
impl Navigator<MemoryGateway, MemoryLocator> {
    pub fn open_memory() -> Result<Self> {
        Self::new(MemoryGateway::new(), MemoryLocator::new(), NavigatorConfig::default())
    }
}

impl<P: PersistenceGateway, L: LocateGateway> std::fmt::Debug for Navigator<P, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Navigator")
            .field("anchors", &self.store.anchor_count())
            .field("edges", &self.store.edge_count())
            .field("tracker", &self.tracker)
            .finish_non_exhaustive()
    }
}

/// Anchor names are edge-key components: non-blank and comma-free.
fn check_anchor_name(name: &str) -> Result<()> {
    if name.trim().is_empty() || name.contains(',') {
        return Err(Error::InvalidAnchor(format!("'{name}' is not a usable anchor name")));
    }
    Ok(())
}

/// Turn a gateway write result into "saved" or "could not save".
fn confirm(saved: Result<bool>, table: &str, key: &str) -> Result<()> {
    match saved {
        Ok(true) => Ok(()),
        Ok(false) => {
            warn!(table, key, "persistence refused write");
            Err(Error::CollaboratorFailure(format!("could not save '{key}' to '{table}'")))
        }
        Err(e) => {
            warn!(table, key, error = %e, "persistence write failed");
            Err(e)
        }
    }
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid route: {0}")]
    InvalidRoute(String),

    #[error("Invalid anchor: {0}")]
    InvalidAnchor(String),

    #[error("Collaborator failure: {0}")]
    CollaboratorFailure(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
