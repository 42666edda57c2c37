//! Chunked bulk loading
//!
//! The store never splits a single bulk call. `BulkLoader` does it for
//! callers: it feeds nodes or links to the store in chunks of the
//! store's advertised batch size, one transaction per chunk. A failing
//! chunk stops the load; earlier chunks stay committed.

use super::traits::{LinkStore, NodeStore};
use crate::error::StoreResult;
use crate::graph::{Link, Node};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Outcome of a bulk load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkLoadStats {
    /// Transactions committed
    pub chunks: usize,
    /// Items written
    pub items: usize,
    /// Links that did not exist before
    pub created_links: usize,
}

/// Feeds iterators of nodes or links to a store chunk by chunk
pub struct BulkLoader<'s, S: ?Sized> {
    store: &'s S,
    batch_size: usize,
}

impl<'s, S> BulkLoader<'s, S>
where
    S: NodeStore + LinkStore + ?Sized,
{
    /// Loader using the store's `bulk_load_batch_size`
    pub fn new(store: &'s S) -> Self {
        Self {
            store,
            batch_size: store.bulk_load_batch_size().max(1),
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn load_nodes<I>(&self, nodes: I) -> StoreResult<BulkLoadStats>
    where
        I: IntoIterator<Item = Node>,
    {
        let mut stats = BulkLoadStats::default();
        let mut chunk = Vec::with_capacity(self.batch_size);
        for node in nodes {
            chunk.push(node);
            if chunk.len() == self.batch_size {
                self.flush_nodes(&mut chunk, &mut stats)?;
            }
        }
        self.flush_nodes(&mut chunk, &mut stats)?;
        info!("Loaded {} nodes in {} chunks", stats.items, stats.chunks);
        Ok(stats)
    }

    pub fn load_links<I>(&self, links: I, noinverse: bool) -> StoreResult<BulkLoadStats>
    where
        I: IntoIterator<Item = Link>,
    {
        let mut stats = BulkLoadStats::default();
        let mut chunk = Vec::with_capacity(self.batch_size);
        for link in links {
            chunk.push(link);
            if chunk.len() == self.batch_size {
                self.flush_links(&mut chunk, noinverse, &mut stats)?;
            }
        }
        self.flush_links(&mut chunk, noinverse, &mut stats)?;
        info!(
            "Loaded {} links ({} new) in {} chunks",
            stats.items, stats.created_links, stats.chunks
        );
        Ok(stats)
    }

    fn flush_nodes(&self, chunk: &mut Vec<Node>, stats: &mut BulkLoadStats) -> StoreResult<()> {
        if chunk.is_empty() {
            return Ok(());
        }
        let ids = self.store.bulk_add_nodes(chunk)?;
        stats.chunks += 1;
        stats.items += ids.len();
        debug!("Node chunk {} committed ({} nodes)", stats.chunks, ids.len());
        chunk.clear();
        Ok(())
    }

    fn flush_links(&self, chunk: &mut Vec<Link>, noinverse: bool, stats: &mut BulkLoadStats) -> StoreResult<()> {
        if chunk.is_empty() {
            return Ok(());
        }
        let created = self.store.add_bulk_links(chunk, noinverse)?;
        stats.chunks += 1;
        stats.items += chunk.len();
        stats.created_links += created;
        debug!("Link chunk {} committed ({} links)", stats.chunks, chunk.len());
        chunk.clear();
        Ok(())
    }
}
