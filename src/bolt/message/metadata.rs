//! Bolt protocol metadata types.
//!
//! Values carried in SUCCESS metadata at the end of a result stream.

use std::collections::HashMap;
use std::fmt;

use crate::bolt::value::BoltValue;

/// Query type reported as `type` when a result is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryType {
    /// Read only
    #[default]
    ReadOnly,
    /// Read and write
    ReadWrite,
    /// Write only
    WriteOnly,
    /// Schema changes
    SchemaWrite,
}

impl QueryType {
    /// Wire code (`r`, `rw`, `w`, `s`).
    pub fn as_str(self) -> &'static str {
        match self {
            QueryType::ReadOnly => "r",
            QueryType::ReadWrite => "rw",
            QueryType::WriteOnly => "w",
            QueryType::SchemaWrite => "s",
        }
    }
}

/// Query statistics returned in SUCCESS after the last PULL/DISCARD.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryStats {
    /// Nodes created
    pub nodes_created: i64,
    /// Nodes deleted
    pub nodes_deleted: i64,
    /// Relationships created
    pub relationships_created: i64,
    /// Relationships deleted
    pub relationships_deleted: i64,
    /// Properties set
    pub properties_set: i64,
    /// Labels added
    pub labels_added: i64,
    /// Labels removed
    pub labels_removed: i64,
    /// Indexes added
    pub indexes_added: i64,
    /// Indexes removed
    pub indexes_removed: i64,
    /// Constraints added
    pub constraints_added: i64,
    /// Constraints removed
    pub constraints_removed: i64,
    /// Contains system updates
    pub contains_system_updates: bool,
}

impl QueryStats {
    /// Create empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if there were any modifications.
    pub fn contains_updates(&self) -> bool {
        self.counters().iter().any(|(_, count)| *count > 0)
    }

    fn counters(&self) -> [(&'static str, i64); 11] {
        [
            ("nodes-created", self.nodes_created),
            ("nodes-deleted", self.nodes_deleted),
            ("relationships-created", self.relationships_created),
            ("relationships-deleted", self.relationships_deleted),
            ("properties-set", self.properties_set),
            ("labels-added", self.labels_added),
            ("labels-removed", self.labels_removed),
            ("indexes-added", self.indexes_added),
            ("indexes-removed", self.indexes_removed),
            ("constraints-added", self.constraints_added),
            ("constraints-removed", self.constraints_removed),
        ]
    }

    /// Convert to the `stats` metadata map. Zero counters are omitted.
    pub fn to_map(&self) -> HashMap<String, BoltValue> {
        let mut map: HashMap<String, BoltValue> = self
            .counters()
            .into_iter()
            .filter(|(_, count)| *count > 0)
            .map(|(key, count)| (key.to_string(), BoltValue::Integer(count)))
            .collect();

        if self.contains_updates() {
            map.insert("contains-updates".to_string(), BoltValue::Boolean(true));
        }
        if self.contains_system_updates {
            map.insert("contains-system-updates".to_string(), BoltValue::Boolean(true));
        }
        map
    }
}

/// Causal consistency bookmark returned by COMMIT and auto-commit completion.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bookmark {
    value: String,
}

impl Bookmark {
    /// Create a bookmark.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// Bookmark value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

impl fmt::Display for Bookmark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl From<String> for Bookmark {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for Bookmark {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
