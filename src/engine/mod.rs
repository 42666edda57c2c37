//! Transactional graph engine over RocksDB
//!
//! A pessimistic `TransactionDB` with one column family per concern:
//! - `identity`: external id -> object handle (uniqueness-constrained index)
//! - `objects`: object handle -> object record
//! - `relationships`: relationship handle -> relationship record
//! - `adjacency`: per-object relationship index by direction and type
//! - `rel_types`: link type -> type tag (uniqueness-constrained index)
//!
//! Durability comes from the RocksDB write-ahead log.

pub(crate) mod keys;
pub(crate) mod records;
pub(crate) mod transaction;

pub(crate) use transaction::EngineTx;

use crate::config::{CacheStrategy, Compression, StoreConfig};
use crate::error::{StoreError, StoreResult};
use crate::graph::{ObjectHandle, RelHandle, TypeTag};
use rocksdb::{
    BlockBasedOptions, Cache, ColumnFamily, ColumnFamilyDescriptor, DBCompressionType, IteratorMode,
    Options, TransactionDB, TransactionDBOptions, TransactionOptions, WriteOptions,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use tracing::{debug, info};

pub(crate) const CF_IDENTITY: &str = "identity";
pub(crate) const CF_OBJECTS: &str = "objects";
pub(crate) const CF_RELATIONSHIPS: &str = "relationships";
pub(crate) const CF_ADJACENCY: &str = "adjacency";
pub(crate) const CF_REL_TYPES: &str = "rel_types";

const COLUMN_FAMILIES: [&str; 5] = [CF_IDENTITY, CF_OBJECTS, CF_RELATIONSHIPS, CF_ADJACENCY, CF_REL_TYPES];

/// Embedded transactional graph engine
pub struct GraphEngine {
    /// RocksDB instance
    db: TransactionDB,
    /// Storage path
    path: PathBuf,
    /// Lock wait for each transaction
    lock_timeout_ms: i64,
    /// Next object handle
    next_object: AtomicU64,
    /// Next relationship handle
    next_relationship: AtomicU64,
    /// Next type tag
    next_tag: AtomicU32,
}

impl GraphEngine {
    /// Open or create the engine in `config.store_dir`
    pub fn open(config: &StoreConfig) -> StoreResult<Self> {
        let path = config.store_dir.clone();
        std::fs::create_dir_all(&path)?;

        info!("Opening graph engine at: {:?}", path);

        let cache = match config.cache_type {
            CacheStrategy::None => None,
            CacheStrategy::Lru => Some(Cache::new_lru_cache(config.cache_bytes()?)),
        };

        let mut opts = Self::cf_options(config, cache.as_ref());
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        opts.set_wal_recovery_mode(rocksdb::DBRecoveryMode::PointInTime);
        if let Some(size) = config.engine.write_buffer_size {
            opts.set_write_buffer_size(size);
        }
        if let Some(count) = config.engine.max_write_buffer_number {
            opts.set_max_write_buffer_number(count);
        }
        if let Some(jobs) = config.engine.max_background_jobs {
            opts.set_max_background_jobs(jobs);
        }
        for (key, value) in &config.engine.passthrough {
            debug!("Engine option {}={} is not interpreted", key, value);
        }

        let mut txn_db_opts = TransactionDBOptions::default();
        txn_db_opts.set_txn_lock_timeout(config.lock_timeout_ms);

        let cf_descriptors: Vec<ColumnFamilyDescriptor> = COLUMN_FAMILIES
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Self::cf_options(config, cache.as_ref())))
            .collect();

        let db: TransactionDB = TransactionDB::open_cf_descriptors(&opts, &txn_db_opts, &path, cf_descriptors)?;

        let engine = Self {
            db,
            path,
            lock_timeout_ms: config.lock_timeout_ms,
            next_object: AtomicU64::new(1),
            next_relationship: AtomicU64::new(1),
            next_tag: AtomicU32::new(1),
        };
        engine.seed_allocators()?;

        info!(
            "Graph engine opened (next object {}, next relationship {}, next tag {})",
            engine.next_object.load(Ordering::Relaxed),
            engine.next_relationship.load(Ordering::Relaxed),
            engine.next_tag.load(Ordering::Relaxed)
        );

        Ok(engine)
    }

    /// Column family options shared by every family
    fn cf_options(config: &StoreConfig, cache: Option<&Cache>) -> Options {
        let mut opts = Options::default();
        let compression = match config.engine.compression.unwrap_or(Compression::Lz4) {
            Compression::None => DBCompressionType::None,
            Compression::Lz4 => DBCompressionType::Lz4,
            Compression::Zstd => DBCompressionType::Zstd,
        };
        opts.set_compression_type(compression);

        let mut table = BlockBasedOptions::default();
        match cache {
            Some(cache) => table.set_block_cache(cache),
            None => table.disable_cache(),
        }
        opts.set_block_based_table_factory(&table);
        opts
    }

    /// Continue handle and tag numbering after whatever is already stored
    fn seed_allocators(&self) -> StoreResult<()> {
        let last_object = self.last_handle(CF_OBJECTS)?;
        let last_relationship = self.last_handle(CF_RELATIONSHIPS)?;

        let mut last_tag = 0u32;
        {
            let tx = self.begin();
            for (_, value) in tx.index_scan(CF_REL_TYPES)? {
                last_tag = last_tag.max(keys::read_u32(&value)?);
            }
        }

        self.next_object.store(last_object + 1, Ordering::Relaxed);
        self.next_relationship.store(last_relationship + 1, Ordering::Relaxed);
        self.next_tag.store(last_tag + 1, Ordering::Relaxed);
        Ok(())
    }

    fn last_handle(&self, name: &'static str) -> StoreResult<u64> {
        let cf = self.cf(name)?;
        let tx = self.db.transaction();
        let mut iter = tx.iterator_cf(cf, IteratorMode::End);
        let last = match iter.next() {
            Some(item) => {
                let (key, _) = item?;
                keys::read_u64(&key)?
            }
            None => 0,
        };
        Ok(last)
    }

    pub(crate) fn cf(&self, name: &'static str) -> StoreResult<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::ColumnFamily(name.to_string()))
    }

    fn transaction(&self) -> rocksdb::Transaction<'_, TransactionDB> {
        let mut txn_opts = TransactionOptions::default();
        txn_opts.set_lock_timeout(self.lock_timeout_ms);
        txn_opts.set_deadlock_detect(true);
        self.db.transaction_opt(&WriteOptions::default(), &txn_opts)
    }

    /// Begin a pessimistic transaction
    pub(crate) fn begin(&self) -> EngineTx<'_> {
        EngineTx::new(self, self.transaction(), None)
    }

    /// Begin a read-only transaction over a snapshot of the committed state
    pub(crate) fn begin_read(&self) -> EngineTx<'_> {
        EngineTx::new(self, self.transaction(), Some(self.db.snapshot()))
    }

    pub(crate) fn allocate_object(&self) -> ObjectHandle {
        ObjectHandle::new(self.next_object.fetch_add(1, Ordering::Relaxed))
    }

    pub(crate) fn allocate_relationship(&self) -> RelHandle {
        RelHandle::new(self.next_relationship.fetch_add(1, Ordering::Relaxed))
    }

    pub(crate) fn allocate_tag(&self) -> TypeTag {
        TypeTag::new(self.next_tag.fetch_add(1, Ordering::Relaxed))
    }

    /// Storage path
    pub fn path(&self) -> &Path {
        &self.path
    }
}
