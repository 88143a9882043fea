//! JSON snapshot of the anchor map.
//!
//! Writes every anchor and edge of an [`EntityStore`] as one JSON document,
//! sorted by key so that two snapshots of the same map are byte-identical.
//!
//! ```text
//! EntityStore → export_json() → { "anchors": [...], "edges": [...] }
//!   → seed a MemoryGateway, diff two maps, attach to a bug report
//! ```

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::model::*;
use crate::store::EntityStore;
use crate::Result;

/// Everything the navigator knows about one map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapSnapshot {
    pub anchors: Vec<Anchor>,
    pub edges: Vec<Edge>,
}

impl MapSnapshot {
    pub fn of(store: &EntityStore) -> Self {
        let mut anchors: Vec<Anchor> = store.anchors().cloned().collect();
        anchors.sort_by(|a, b| a.name.cmp(&b.name));
        let mut edges: Vec<Edge> = store.edges().cloned().collect();
        edges.sort_by(|a, b| a.id.cmp(&b.id));
        Self { anchors, edges }
    }

    /// Load the snapshot into a fresh store. Duplicate keys collapse the
    /// same way they do on any other insert.
    pub fn into_store(self) -> EntityStore {
        let mut store = EntityStore::new();
        for anchor in self.anchors {
            store.add_anchor(anchor);
        }
        for edge in self.edges {
            store.add_edge(edge);
        }
        store
    }
}

/// Write `store` as pretty-printed JSON.
pub fn export_json(store: &EntityStore, writer: &mut dyn Write) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, &MapSnapshot::of(store))?;
    writeln!(writer)?;
    Ok(())
}

/// Read a snapshot written by [`export_json`].
pub fn import_json(reader: &mut dyn Read) -> Result<MapSnapshot> {
    Ok(serde_json::from_reader(reader)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn sample() -> EntityStore {
        let mut store = EntityStore::new();
        store.add_anchor(Anchor::new("b", AnchorKind::Waypoint).with_external_id("id-b"));
        store.add_anchor(Anchor::new("a", AnchorKind::Main).with_external_id("id-a"));
        store.add_edge(Edge::new("a", "b", 1.5));
        store
    }

    #[test]
    fn test_snapshot_is_sorted() {
        let snap = MapSnapshot::of(&sample());
        let names: Vec<&str> = snap.anchors.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_export_then_import() {
        let mut buf = Vec::new();
        export_json(&sample(), &mut buf).unwrap();

        let text = String::from_utf8(buf.clone()).unwrap();
        assert!(text.contains("\"kind\": \"waypoint\""));

        let restored = import_json(&mut buf.as_slice()).unwrap().into_store();
        assert_eq!(restored.anchor_count(), 2);
        assert_eq!(restored.find_edge("b", "a").unwrap().distance, 1.5);
    }

    #[test]
    fn test_import_garbage() {
        let err = import_json(&mut "[1, 2".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }
}
