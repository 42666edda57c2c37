//! Link (relationship) value type
//!
//! A link is a typed, directed association between two nodes. At most
//! one link exists per `(id1, link_type, id2)` triple; its visibility
//! byte marks soft deletion.

use super::types::{VISIBILITY_DEFAULT, VISIBILITY_HIDDEN};
use serde::{Deserialize, Serialize};

/// A directed link between two nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Source node (link goes FROM this node)
    pub id1: u64,

    /// Caller-defined link type
    pub link_type: i64,

    /// Target node (link goes TO this node)
    pub id2: u64,

    /// Non-zero when the link is visible
    pub visibility: u8,

    /// Caller-maintained version
    pub version: i32,

    /// Caller-supplied timestamp, used for ordering in listings
    pub time: i64,

    /// Opaque payload
    pub data: Vec<u8>,
}

impl Link {
    /// Create a visible link with an empty payload
    pub fn new(id1: u64, link_type: i64, id2: u64) -> Self {
        Link {
            id1,
            link_type,
            id2,
            visibility: VISIBILITY_DEFAULT,
            version: 0,
            time: 0,
            data: Vec::new(),
        }
    }

    /// Set the payload
    pub fn with_data(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.data = data.into();
        self
    }

    /// Set the timestamp
    pub fn with_time(mut self, time: i64) -> Self {
        self.time = time;
        self
    }

    /// Set the version
    pub fn with_version(mut self, version: i32) -> Self {
        self.version = version;
        self
    }

    /// Set the visibility byte
    pub fn with_visibility(mut self, visibility: u8) -> Self {
        self.visibility = visibility;
        self
    }

    /// Check whether the link passes the visibility filter
    pub fn is_visible(&self) -> bool {
        self.visibility != VISIBILITY_HIDDEN
    }
}

/// Precomputed link count for a `(id1, link_type)` pair
///
/// Bulk loaders hand these to stores that keep a separate count table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkCount {
    pub id1: u64,
    pub link_type: i64,
    pub time: i64,
    pub version: i64,
    pub count: i64,
}

impl LinkCount {
    pub fn new(id1: u64, link_type: i64, time: i64, version: i64, count: i64) -> Self {
        LinkCount {
            id1,
            link_type,
            time,
            version,
            count,
        }
    }
}
