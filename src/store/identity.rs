//! Identity index: external node id -> engine object handle
//!
//! Backed by the engine's uniqueness-constrained index. Creation locks
//! the id's key before reading it, so two transactions racing on the
//! same id serialize and both end up with the same handle.

use crate::engine::records::StoredObject;
use crate::engine::{keys, EngineTx, CF_IDENTITY};
use crate::error::{StoreError, StoreResult};
use crate::graph::ObjectHandle;
use tracing::trace;

pub(crate) struct IdentityIndex;

impl IdentityIndex {
    /// Resolve `id`, creating a placeholder object when it has none
    ///
    /// Returns the handle and whether this call created it. The key stays
    /// locked until the transaction finishes.
    pub fn get_or_create(tx: &EngineTx<'_>, id: u64) -> StoreResult<(ObjectHandle, bool)> {
        let engine = tx.engine();
        let (value, created) = tx.index_get_or_insert(CF_IDENTITY, &keys::identity_key(id), || {
            Ok(engine.allocate_object().as_u64().to_be_bytes().to_vec())
        })?;
        let handle = ObjectHandle::new(keys::read_u64(&value)?);

        if created {
            tx.put_object(handle, &StoredObject::placeholder(id))?;
            trace!("Created {} for node {}", handle, id);
        }
        Ok((handle, created))
    }

    /// Plain read, no lock
    pub fn lookup(tx: &EngineTx<'_>, id: u64) -> StoreResult<Option<ObjectHandle>> {
        Self::read(tx, id, false)
    }

    /// Read and keep the id's key exclusively locked until the transaction ends
    pub fn lock(tx: &EngineTx<'_>, id: u64) -> StoreResult<Option<ObjectHandle>> {
        Self::read(tx, id, true)
    }

    /// Like `lookup`/`lock`, reporting an absent id as `NodeNotFound`
    pub fn require(tx: &EngineTx<'_>, id: u64, lock: bool) -> StoreResult<ObjectHandle> {
        let handle = if lock { Self::lock(tx, id)? } else { Self::lookup(tx, id)? };
        handle.ok_or(StoreError::NodeNotFound(id))
    }

    pub fn remove(tx: &EngineTx<'_>, id: u64) -> StoreResult<()> {
        tx.index_remove(CF_IDENTITY, &keys::identity_key(id))
    }

    fn read(tx: &EngineTx<'_>, id: u64, lock: bool) -> StoreResult<Option<ObjectHandle>> {
        match tx.index_get(CF_IDENTITY, &keys::identity_key(id), lock)? {
            Some(value) => Ok(Some(ObjectHandle::new(keys::read_u64(&value)?))),
            None => Ok(None),
        }
    }
}
