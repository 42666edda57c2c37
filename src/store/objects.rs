//! Node operations

use super::identity::IdentityIndex;
use super::{scope, LinkGraphStore, StoreInner};
use crate::engine::records::{StoredObject, StoredRelationship};
use crate::engine::EngineTx;
use crate::error::{StoreError, StoreResult};
use crate::graph::{Node, RelHandle};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Create or overwrite a node inside an open transaction
pub(super) fn put_node(inner: &StoreInner, tx: &EngineTx<'_>, node: &Node) -> StoreResult<u64> {
    inner.check_payload(node.data_len())?;
    let (handle, _) = IdentityIndex::get_or_create(tx, node.id)?;
    tx.put_object(handle, &StoredObject::from_node(node))?;
    Ok(node.id)
}

impl LinkGraphStore {
    /// Create a node, or overwrite every field of an existing one
    pub fn add_node(&self, node: &Node) -> StoreResult<u64> {
        let inner = self.inner()?;
        scope::write(&inner.engine, "add_node", |tx| put_node(&inner, tx, node))
    }

    /// Node by id; `None` when absent
    pub fn get_node(&self, id: u64) -> StoreResult<Option<Node>> {
        let inner = self.inner()?;
        scope::read(&inner.engine, "get_node", None, |tx| {
            let handle = IdentityIndex::require(tx, id, false)?;
            let object = tx.get_object(handle)?.ok_or_else(|| {
                StoreError::CorruptRecord(format!("node {} indexed at missing {}", id, handle))
            })?;
            Ok(Some(object.into_node()))
        })
    }

    /// Overwrite an existing node; `false` when absent
    pub fn update_node(&self, node: &Node) -> StoreResult<bool> {
        let inner = self.inner()?;
        scope::run(&inner.engine, "update_node", false, |tx| {
            inner.check_payload(node.data_len())?;
            let handle = IdentityIndex::require(tx, node.id, true)?;
            tx.put_object(handle, &StoredObject::from_node(node))?;
            Ok(true)
        })
    }

    /// Delete a node and every link touching it; `false` when absent
    pub fn delete_node(&self, id: u64) -> StoreResult<bool> {
        let inner = self.inner()?;
        scope::run(&inner.engine, "delete_node", false, |tx| {
            let handle = IdentityIndex::require(tx, id, true)?;

            // A self-loop shows up twice, once per direction. Records are
            // locked in handle order; one whose far endpoint is being deleted
            // concurrently may already be gone.
            let handles: BTreeSet<RelHandle> = tx
                .relationships(handle, None, None, None)?
                .into_iter()
                .map(|entry| entry.relationship)
                .collect();
            let mut incident: BTreeMap<RelHandle, StoredRelationship> = BTreeMap::new();
            for rel in handles {
                if let Some(record) = tx.lock_relationship(rel)? {
                    incident.insert(rel, record);
                }
            }
            for (rel, record) in &incident {
                tx.delete_relationship(*rel, record)?;
            }

            tx.delete_object(handle)?;
            IdentityIndex::remove(tx, id)?;
            debug!("Deleted node {} with {} links", id, incident.len());
            Ok(true)
        })
    }

    /// Create or overwrite a batch of nodes in one transaction
    ///
    /// Ids come back in input order. Either every node is written or none.
    pub fn bulk_add_nodes(&self, nodes: &[Node]) -> StoreResult<Vec<u64>> {
        let inner = self.inner()?;
        scope::write(&inner.engine, "bulk_add_nodes", |tx| {
            // Lock in ascending id order so overlapping batches cannot deadlock
            let ids: BTreeSet<u64> = nodes.iter().map(|node| node.id).collect();
            for id in ids {
                IdentityIndex::get_or_create(tx, id)?;
            }
            nodes.iter().map(|node| put_node(&inner, tx, node)).collect()
        })
    }
}
