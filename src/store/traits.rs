//! Store contracts as seen by a benchmark harness
//!
//! The harness drives node and link workloads through separate
//! interfaces; `LinkGraphStore` implements both.

use super::LinkGraphStore;
use crate::config::{Phase, Properties};
use crate::error::StoreResult;
use crate::graph::{Link, LinkCount, Node};

/// Lifecycle hooks shared by node and link stores
pub trait StoreLifecycle {
    /// Open the backing engine; no-op when already open
    fn initialize(&self, props: &Properties, phase: Phase, thread_id: usize) -> StoreResult<()>;

    fn close(&self);

    fn clear_errors(&self, thread_id: usize);
}

/// Node workload contract
pub trait NodeStore: StoreLifecycle {
    fn reset_node_store(&self, start_id: u64);

    fn add_node(&self, node: &Node) -> StoreResult<u64>;

    fn bulk_add_nodes(&self, nodes: &[Node]) -> StoreResult<Vec<u64>>;

    fn get_node(&self, id: u64) -> StoreResult<Option<Node>>;

    fn update_node(&self, node: &Node) -> StoreResult<bool>;

    fn delete_node(&self, id: u64) -> StoreResult<bool>;
}

/// Link workload contract
pub trait LinkStore: StoreLifecycle {
    fn add_link(&self, link: &Link, noinverse: bool) -> StoreResult<bool>;

    fn update_link(&self, link: &Link, noinverse: bool) -> StoreResult<bool>;

    fn delete_link(&self, id1: u64, link_type: i64, id2: u64, expunge: bool) -> StoreResult<bool>;

    fn get_link(&self, id1: u64, link_type: i64, id2: u64) -> StoreResult<Option<Link>>;

    fn get_link_list(&self, id1: u64, link_type: i64) -> StoreResult<Option<Vec<Link>>>;

    fn get_link_list_range(
        &self,
        id1: u64,
        link_type: i64,
        min_time: i64,
        max_time: i64,
        offset: usize,
        limit: usize,
    ) -> StoreResult<Option<Vec<Link>>>;

    fn count_links(&self, id1: u64, link_type: i64) -> StoreResult<i64>;

    /// Returns how many links were newly created
    fn add_bulk_links(&self, links: &[Link], noinverse: bool) -> StoreResult<usize>;

    fn add_bulk_counts(&self, counts: &[LinkCount]) -> StoreResult<()>;

    /// Chunk size callers should use for bulk calls
    fn bulk_load_batch_size(&self) -> usize;
}

impl StoreLifecycle for LinkGraphStore {
    fn initialize(&self, props: &Properties, phase: Phase, thread_id: usize) -> StoreResult<()> {
        LinkGraphStore::initialize(self, props, phase, thread_id)
    }

    fn close(&self) {
        LinkGraphStore::close(self)
    }

    fn clear_errors(&self, thread_id: usize) {
        LinkGraphStore::clear_errors(self, thread_id)
    }
}

impl NodeStore for LinkGraphStore {
    fn reset_node_store(&self, start_id: u64) {
        LinkGraphStore::reset_node_store(self, start_id)
    }

    fn add_node(&self, node: &Node) -> StoreResult<u64> {
        LinkGraphStore::add_node(self, node)
    }

    fn bulk_add_nodes(&self, nodes: &[Node]) -> StoreResult<Vec<u64>> {
        LinkGraphStore::bulk_add_nodes(self, nodes)
    }

    fn get_node(&self, id: u64) -> StoreResult<Option<Node>> {
        LinkGraphStore::get_node(self, id)
    }

    fn update_node(&self, node: &Node) -> StoreResult<bool> {
        LinkGraphStore::update_node(self, node)
    }

    fn delete_node(&self, id: u64) -> StoreResult<bool> {
        LinkGraphStore::delete_node(self, id)
    }
}

impl LinkStore for LinkGraphStore {
    fn add_link(&self, link: &Link, noinverse: bool) -> StoreResult<bool> {
        LinkGraphStore::add_link(self, link, noinverse)
    }

    fn update_link(&self, link: &Link, noinverse: bool) -> StoreResult<bool> {
        LinkGraphStore::update_link(self, link, noinverse)
    }

    fn delete_link(&self, id1: u64, link_type: i64, id2: u64, expunge: bool) -> StoreResult<bool> {
        LinkGraphStore::delete_link(self, id1, link_type, id2, expunge)
    }

    fn get_link(&self, id1: u64, link_type: i64, id2: u64) -> StoreResult<Option<Link>> {
        LinkGraphStore::get_link(self, id1, link_type, id2)
    }

    fn get_link_list(&self, id1: u64, link_type: i64) -> StoreResult<Option<Vec<Link>>> {
        LinkGraphStore::get_link_list(self, id1, link_type)
    }

    fn get_link_list_range(
        &self,
        id1: u64,
        link_type: i64,
        min_time: i64,
        max_time: i64,
        offset: usize,
        limit: usize,
    ) -> StoreResult<Option<Vec<Link>>> {
        LinkGraphStore::get_link_list_range(self, id1, link_type, min_time, max_time, offset, limit)
    }

    fn count_links(&self, id1: u64, link_type: i64) -> StoreResult<i64> {
        LinkGraphStore::count_links(self, id1, link_type)
    }

    fn add_bulk_links(&self, links: &[Link], noinverse: bool) -> StoreResult<usize> {
        LinkGraphStore::add_bulk_links(self, links, noinverse)
    }

    fn add_bulk_counts(&self, counts: &[LinkCount]) -> StoreResult<()> {
        LinkGraphStore::add_bulk_counts(self, counts)
    }

    fn bulk_load_batch_size(&self) -> usize {
        LinkGraphStore::bulk_load_batch_size(self)
    }
}
