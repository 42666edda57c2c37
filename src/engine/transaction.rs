//! Engine transaction primitives
//!
//! `EngineTx` wraps one RocksDB pessimistic transaction and exposes the
//! only operations the store layer consumes: a uniqueness-constrained
//! index (lock-then-insert), object and relationship records, and
//! relationship traversal by object, direction and type.
//!
//! Reads inside a transaction observe that transaction's own writes.
//! A read-only transaction also pins a snapshot taken when it began, so
//! every plain read in it sees the same committed state. Locked reads
//! always see the latest committed value.

use super::keys::{self, AdjacencyKey};
use super::records::{StoredObject, StoredRelationship};
use super::{GraphEngine, CF_ADJACENCY, CF_OBJECTS, CF_RELATIONSHIPS};
use crate::error::{StoreError, StoreResult};
use crate::graph::{Direction, ObjectHandle, RelHandle, TypeTag};
use rocksdb::{ColumnFamily, IteratorMode, ReadOptions, SnapshotWithThreadMode, Transaction, TransactionDB};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::trace;

/// One engine transaction
pub(crate) struct EngineTx<'e> {
    engine: &'e GraphEngine,
    tx: Transaction<'e, TransactionDB>,
    /// Point-in-time view for read-only transactions
    snapshot: Option<SnapshotWithThreadMode<'e, TransactionDB>>,
}

impl<'e> EngineTx<'e> {
    pub(super) fn new(
        engine: &'e GraphEngine,
        tx: Transaction<'e, TransactionDB>,
        snapshot: Option<SnapshotWithThreadMode<'e, TransactionDB>>,
    ) -> Self {
        Self { engine, tx, snapshot }
    }

    /// Read options for plain reads, pinned to the snapshot when there is one
    fn read_opts(&self) -> ReadOptions {
        let mut opts = ReadOptions::default();
        if let Some(snapshot) = &self.snapshot {
            opts.set_snapshot(snapshot);
        }
        opts
    }

    pub fn engine(&self) -> &'e GraphEngine {
        self.engine
    }

    fn cf(&self, name: &'static str) -> StoreResult<&'e ColumnFamily> {
        self.engine.cf(name)
    }

    /// Make every write of this transaction durable and visible
    pub fn commit(self) -> StoreResult<()> {
        self.tx.commit()?;
        Ok(())
    }

    /// Discard every write of this transaction and release its locks
    pub fn rollback(&self) -> StoreResult<()> {
        self.tx.rollback()?;
        Ok(())
    }

    // ---- uniqueness-constrained index ----------------------------------

    /// Read an index entry; with `lock` the key stays exclusively locked
    /// until the transaction finishes, whether or not it exists
    pub fn index_get(&self, index: &'static str, key: &[u8], lock: bool) -> StoreResult<Option<Vec<u8>>> {
        let cf = self.cf(index)?;
        let value = if lock {
            self.tx.get_for_update_cf(cf, key, true)?
        } else {
            self.tx.get_cf_opt(cf, key, &self.read_opts())?
        };
        Ok(value)
    }

    /// Return the entry for `key`, inserting `make()` if there is none
    ///
    /// The key is locked before it is read, so concurrent callers on the
    /// same key serialize and all but the first observe the first one's
    /// value. The flag reports whether this call inserted.
    pub fn index_get_or_insert<F>(&self, index: &'static str, key: &[u8], make: F) -> StoreResult<(Vec<u8>, bool)>
    where
        F: FnOnce() -> StoreResult<Vec<u8>>,
    {
        let cf = self.cf(index)?;
        if let Some(existing) = self.tx.get_for_update_cf(cf, key, true)? {
            return Ok((existing, false));
        }
        let value = make()?;
        self.tx.put_cf(cf, key, &value)?;
        trace!("Inserted unique entry into {}", index);
        Ok((value, true))
    }

    pub fn index_remove(&self, index: &'static str, key: &[u8]) -> StoreResult<()> {
        let cf = self.cf(index)?;
        self.tx.delete_cf(cf, key)?;
        Ok(())
    }

    /// Visit every entry of an index
    pub fn index_scan(&self, index: &'static str) -> StoreResult<Vec<(Box<[u8]>, Box<[u8]>)>> {
        let cf = self.cf(index)?;
        let mut entries = Vec::new();
        for item in self.tx.iterator_cf_opt(cf, self.read_opts(), IteratorMode::Start) {
            entries.push(item?);
        }
        Ok(entries)
    }

    // ---- objects --------------------------------------------------------

    pub fn get_object(&self, handle: ObjectHandle) -> StoreResult<Option<StoredObject>> {
        let cf = self.cf(CF_OBJECTS)?;
        match self.tx.get_cf_opt(cf, keys::object_key(handle), &self.read_opts())? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn put_object(&self, handle: ObjectHandle, object: &StoredObject) -> StoreResult<()> {
        let cf = self.cf(CF_OBJECTS)?;
        self.tx.put_cf(cf, keys::object_key(handle), encode(object)?)?;
        Ok(())
    }

    pub fn delete_object(&self, handle: ObjectHandle) -> StoreResult<()> {
        let cf = self.cf(CF_OBJECTS)?;
        self.tx.delete_cf(cf, keys::object_key(handle))?;
        Ok(())
    }

    // ---- relationships --------------------------------------------------

    /// Store a new relationship and its adjacency entries at both endpoints
    pub fn create_relationship(&self, record: &StoredRelationship) -> StoreResult<RelHandle> {
        let handle = self.engine.allocate_relationship();
        let cf = self.cf(CF_RELATIONSHIPS)?;
        self.tx.put_cf(cf, keys::relationship_key(handle), encode(record)?)?;

        let adjacency = AdjacencyKey {
            object: record.start,
            direction: Direction::Outgoing,
            tag: record.tag,
            other: record.end,
            relationship: handle,
        };
        let cf = self.cf(CF_ADJACENCY)?;
        self.tx.put_cf(cf, adjacency.encode(), b"")?;
        self.tx.put_cf(cf, adjacency.mirror().encode(), b"")?;

        trace!("Created relationship {} ({} -> {})", handle, record.start, record.end);
        Ok(handle)
    }

    pub fn get_relationship(&self, handle: RelHandle) -> StoreResult<Option<StoredRelationship>> {
        let cf = self.cf(CF_RELATIONSHIPS)?;
        match self.tx.get_cf_opt(cf, keys::relationship_key(handle), &self.read_opts())? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Read a relationship and keep its key locked until the transaction ends
    ///
    /// `None` when a concurrent writer already removed it.
    pub fn lock_relationship(&self, handle: RelHandle) -> StoreResult<Option<StoredRelationship>> {
        let cf = self.cf(CF_RELATIONSHIPS)?;
        match self.tx.get_for_update_cf(cf, keys::relationship_key(handle), true)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Load a relationship the adjacency index points at
    pub fn load_relationship(&self, handle: RelHandle) -> StoreResult<StoredRelationship> {
        self.get_relationship(handle)?.ok_or_else(|| {
            StoreError::CorruptRecord(format!("adjacency entry points at missing {}", handle))
        })
    }

    pub fn put_relationship(&self, handle: RelHandle, record: &StoredRelationship) -> StoreResult<()> {
        let cf = self.cf(CF_RELATIONSHIPS)?;
        self.tx.put_cf(cf, keys::relationship_key(handle), encode(record)?)?;
        Ok(())
    }

    /// Physically remove a relationship and both adjacency entries
    pub fn delete_relationship(&self, handle: RelHandle, record: &StoredRelationship) -> StoreResult<()> {
        let cf = self.cf(CF_RELATIONSHIPS)?;
        self.tx.delete_cf(cf, keys::relationship_key(handle))?;

        let adjacency = AdjacencyKey {
            object: record.start,
            direction: Direction::Outgoing,
            tag: record.tag,
            other: record.end,
            relationship: handle,
        };
        let cf = self.cf(CF_ADJACENCY)?;
        self.tx.delete_cf(cf, adjacency.encode())?;
        self.tx.delete_cf(cf, adjacency.mirror().encode())?;

        trace!("Deleted relationship {}", handle);
        Ok(())
    }

    /// Adjacency entries of an object, narrowed by direction, type and far endpoint
    pub fn relationships(
        &self,
        object: ObjectHandle,
        direction: Option<Direction>,
        tag: Option<TypeTag>,
        other: Option<ObjectHandle>,
    ) -> StoreResult<Vec<AdjacencyKey>> {
        let cf = self.cf(CF_ADJACENCY)?;
        let prefix = keys::adjacency_prefix(object, direction, tag, other);
        let mut entries = Vec::new();
        let iter = self.tx.iterator_cf_opt(
            cf,
            self.read_opts(),
            IteratorMode::From(&prefix, rocksdb::Direction::Forward),
        );
        for item in iter {
            let (key, _) = item?;
            if !key.starts_with(&prefix) {
                break;
            }
            entries.push(AdjacencyKey::decode(&key)?);
        }
        Ok(entries)
    }

    /// Number of keys in a column family
    pub fn count(&self, name: &'static str) -> StoreResult<u64> {
        let cf = self.cf(name)?;
        let mut count = 0u64;
        for item in self.tx.iterator_cf_opt(cf, self.read_opts(), IteratorMode::Start) {
            item?;
            count += 1;
        }
        Ok(count)
    }
}

fn encode<T: Serialize>(value: &T) -> StoreResult<Vec<u8>> {
    Ok(bincode::serialize(value)?)
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> StoreResult<T> {
    Ok(bincode::deserialize(bytes)?)
}
