//! Core type definitions for the link graph

use serde::{Deserialize, Serialize};
use std::fmt;

/// Visibility marker for a soft-deleted link
pub const VISIBILITY_HIDDEN: u8 = 0;

/// Visibility marker for a live link; new links carry this by default
pub const VISIBILITY_DEFAULT: u8 = 1;

/// Engine-internal identity of a stored object
///
/// Distinct from the external 64-bit id the caller uses; the identity
/// index maps one to the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct ObjectHandle(pub u64);

impl ObjectHandle {
    pub fn new(handle: u64) -> Self {
        ObjectHandle(handle)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectHandle({})", self.0)
    }
}

impl From<u64> for ObjectHandle {
    fn from(handle: u64) -> Self {
        ObjectHandle(handle)
    }
}

/// Engine-internal identity of a stored relationship
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct RelHandle(pub u64);

impl RelHandle {
    pub fn new(handle: u64) -> Self {
        RelHandle(handle)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RelHandle({})", self.0)
    }
}

impl From<u64> for RelHandle {
    fn from(handle: u64) -> Self {
        RelHandle(handle)
    }
}

/// Engine-native relationship type tag
///
/// Every link type maps to exactly one tag. Tags are allocated on first
/// use and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct TypeTag(pub u32);

impl TypeTag {
    pub fn new(tag: u32) -> Self {
        TypeTag(tag)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeTag({})", self.0)
    }
}

/// Traversal direction relative to an object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Relationships that start at the object
    Outgoing,
    /// Relationships that end at the object
    Incoming,
}

impl Direction {
    pub(crate) fn as_byte(self) -> u8 {
        match self {
            Direction::Outgoing => 0,
            Direction::Incoming => 1,
        }
    }

    pub(crate) fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Direction::Outgoing),
            1 => Some(Direction::Incoming),
            _ => None,
        }
    }

    pub fn reverse(self) -> Self {
        match self {
            Direction::Outgoing => Direction::Incoming,
            Direction::Incoming => Direction::Outgoing,
        }
    }
}
