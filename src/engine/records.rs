//! Serialized record layouts stored in the engine

use crate::graph::{Link, Node, ObjectHandle, TypeTag, VISIBILITY_HIDDEN};
use serde::{Deserialize, Serialize};

/// Serialized object, keyed by its handle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct StoredObject {
    pub id: u64,
    pub node_type: i32,
    pub version: i64,
    pub time: i32,
    pub data: Vec<u8>,
}

impl StoredObject {
    pub fn from_node(node: &Node) -> Self {
        StoredObject {
            id: node.id,
            node_type: node.node_type,
            version: node.version,
            time: node.time,
            data: node.data.clone(),
        }
    }

    pub fn placeholder(id: u64) -> Self {
        Self::from_node(&Node::placeholder(id))
    }

    pub fn into_node(self) -> Node {
        Node {
            id: self.id,
            node_type: self.node_type,
            version: self.version,
            time: self.time,
            data: self.data,
        }
    }
}

/// Serialized relationship, keyed by its handle
///
/// Endpoint external ids and the link type are stored alongside the
/// engine identities so listings never have to load endpoint objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct StoredRelationship {
    pub start: ObjectHandle,
    pub end: ObjectHandle,
    pub tag: TypeTag,
    pub id1: u64,
    pub link_type: i64,
    pub id2: u64,
    pub visibility: u8,
    pub version: i32,
    pub time: i64,
    pub noinverse: bool,
    pub data: Vec<u8>,
}

impl StoredRelationship {
    pub fn new(start: ObjectHandle, end: ObjectHandle, tag: TypeTag, link: &Link, noinverse: bool) -> Self {
        StoredRelationship {
            start,
            end,
            tag,
            id1: link.id1,
            link_type: link.link_type,
            id2: link.id2,
            visibility: link.visibility,
            version: link.version,
            time: link.time,
            noinverse,
            data: link.data.clone(),
        }
    }

    /// Overwrite the mutable fields from a link
    pub fn update_from(&mut self, link: &Link, noinverse: bool) {
        self.data = link.data.clone();
        self.time = link.time;
        self.version = link.version;
        self.visibility = link.visibility;
        self.noinverse = noinverse;
    }

    pub fn hide(&mut self) {
        self.visibility = VISIBILITY_HIDDEN;
    }

    pub fn is_visible(&self) -> bool {
        self.visibility != VISIBILITY_HIDDEN
    }

    pub fn to_link(&self) -> Link {
        Link {
            id1: self.id1,
            link_type: self.link_type,
            id2: self.id2,
            visibility: self.visibility,
            version: self.version,
            time: self.time,
            data: self.data.clone(),
        }
    }
}
