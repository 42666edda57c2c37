//! Node (object) value type
//!
//! A node is a typed, versioned blob identified by a caller-chosen
//! external id. Exactly one node exists per id.

use serde::{Deserialize, Serialize};

/// A node as seen by callers of the store
///
/// Nodes have:
/// - A stable external id
/// - A caller-defined type
/// - A version and a timestamp, both opaque to the store
/// - An opaque payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// External identifier
    pub id: u64,

    /// Caller-defined object type
    pub node_type: i32,

    /// Caller-maintained version
    pub version: i64,

    /// Caller-supplied timestamp
    pub time: i32,

    /// Opaque payload
    pub data: Vec<u8>,
}

impl Node {
    /// Create a new node
    pub fn new(id: u64, node_type: i32, version: i64, time: i32, data: impl Into<Vec<u8>>) -> Self {
        Node {
            id,
            node_type,
            version,
            time,
            data: data.into(),
        }
    }

    /// Placeholder node for an id that was only ever referenced as a link endpoint
    pub fn placeholder(id: u64) -> Self {
        Node {
            id,
            node_type: 0,
            version: 0,
            time: 0,
            data: Vec::new(),
        }
    }

    /// Replace the payload
    pub fn with_data(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.data = data.into();
        self
    }

    /// Payload size in bytes
    pub fn data_len(&self) -> usize {
        self.data.len()
    }
}
