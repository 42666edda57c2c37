//! Linkgraph
//!
//! An embedded node/link store: typed, versioned nodes and typed, directed
//! links between them, persisted in a transactional RocksDB graph engine.
//!
//! # Architecture
//!
//! - `graph`: the caller-facing data model (`Node`, `Link`, `LinkCount`)
//!   and engine identities (`ObjectHandle`, `RelHandle`, `TypeTag`)
//! - `engine`: RocksDB `TransactionDB` adapter exposing transactions, a
//!   uniqueness-constrained index and typed adjacency traversal
//! - `store`: `LinkGraphStore`, mapping nodes and links onto the engine
//!   (identity resolution, link dedup, visibility, listing, bulk loading)
//! - `config`: `StoreConfig` from harness properties or YAML
//! - `error`: `StoreError`, split into absence and systemic failures
//!
//! Every store operation runs in its own engine transaction. Absence of a
//! node or link is reported through sentinels (`false`, `None`, `-1`),
//! never as an error.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use linkgraph::{Link, LinkGraphStore, Node, StoreConfig};
//!
//! let store = LinkGraphStore::open(StoreConfig::new("/tmp/linkgraph")).unwrap();
//!
//! store.add_node(&Node::new(1, 1, 0, 0, b"alice".to_vec())).unwrap();
//! assert!(store.add_link(&Link::new(1, 5, 2).with_time(10), false).unwrap());
//!
//! let links = store.get_link_list(1, 5).unwrap().unwrap();
//! assert_eq!(links[0].id2, 2);
//! assert_eq!(store.count_links(1, 5).unwrap(), 1);
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod engine;
pub mod error;
pub mod graph;
pub mod store;

// Re-export main types for convenience
pub use config::{CacheStrategy, Compression, ConfigError, ConfigResult, EngineTuning, Phase, Properties, StoreConfig};

pub use error::{StoreError, StoreResult};

pub use graph::{
    Direction, Link, LinkCount, Node, ObjectHandle, RelHandle, TypeTag, VISIBILITY_DEFAULT,
    VISIBILITY_HIDDEN,
};

pub use store::{
    compare_links, BulkLoadStats, BulkLoader, LinkGraphStore, LinkStore, NodeStore, StoreLifecycle,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}
