//! Navigator configuration.

use serde::{Deserialize, Serialize};

use crate::model::AnchorKind;
use crate::{Error, Result};

/// Settings shared by the navigator and the gateways it is wired to.
///
/// Every field has a default, so a partial JSON document is enough:
///
/// ```rust
/// use anchor_nav::NavigatorConfig;
///
/// let config = NavigatorConfig::from_json_str(r#"{ "partition_key": "floor2" }"#).unwrap();
/// assert_eq!(config.partition_key, "floor2");
/// assert_eq!(config.anchor_table, "spatialAnchors");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigatorConfig {
    /// Table holding anchor records.
    pub anchor_table: String,
    /// Table holding edge records.
    pub edge_table: String,
    /// Partition all records of one map are written under.
    pub partition_key: String,
    /// Anchor kinds offered as origin and destination choices.
    pub navigable_kinds: Vec<AnchorKind>,
    /// Rebuild the adjacency graph right after each successful commit.
    pub rebuild_on_commit: bool,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            anchor_table: "spatialAnchors".into(),
            edge_table: "adjacentList".into(),
            partition_key: "main".into(),
            navigable_kinds: vec![AnchorKind::Main],
            rebuild_on_commit: true,
        }
    }
}

impl NavigatorConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: NavigatorConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("anchor_table", &self.anchor_table),
            ("edge_table", &self.edge_table),
            ("partition_key", &self.partition_key),
        ] {
            if value.trim().is_empty() {
                return Err(Error::Config(format!("{field} must not be empty")));
            }
        }
        Ok(())
    }

    pub fn is_navigable(&self, kind: AnchorKind) -> bool {
        self.navigable_kinds.contains(&kind)
    }
}
