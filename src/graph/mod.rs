//! Node/link data model
//!
//! This module defines the values exchanged with callers:
//! - Nodes: typed, versioned objects keyed by an external id
//! - Links: typed, directed, versioned relationships, unique per
//!   `(id1, link_type, id2)`, with a soft-delete visibility marker
//! - Engine-side identities (handles, type tags, directions)

pub mod link;
pub mod node;
pub mod types;

// Re-export main types
pub use link::{Link, LinkCount};
pub use node::Node;
pub use types::{Direction, ObjectHandle, RelHandle, TypeTag, VISIBILITY_DEFAULT, VISIBILITY_HIDDEN};
