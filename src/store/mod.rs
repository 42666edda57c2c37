//! Node/link store over the transactional graph engine
//!
//! `LinkGraphStore` maps the node/link data model onto engine objects,
//! relationships and indexes:
//! - nodes resolve through the identity index (`identity`)
//! - node operations live in `objects`
//! - link operations live in `relationships`
//! - listing and counting live in `query`
//! - every public operation runs inside a transaction scope (`scope`)
//!
//! The store owns its engine. It is created by `initialize` (or `open`)
//! and released by `close`; in between the store can be shared across
//! threads behind an `Arc`.

mod identity;
mod objects;
mod query;
mod rel_types;
mod relationships;
mod scope;

pub mod bulk;
pub mod traits;

pub use bulk::{BulkLoadStats, BulkLoader};
pub use query::compare_links;
pub use traits::{LinkStore, NodeStore, StoreLifecycle};

use crate::config::{Phase, Properties, StoreConfig, DEFAULT_BULK_LOAD_BATCH_SIZE};
use crate::engine::{GraphEngine, CF_IDENTITY, CF_RELATIONSHIPS};
use crate::error::{StoreError, StoreResult};
use rel_types::RelTypeRegistry;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};

/// Engine plus everything derived from it, alive between initialize and close
pub(crate) struct StoreInner {
    pub engine: GraphEngine,
    pub types: RelTypeRegistry,
    pub config: StoreConfig,
}

impl StoreInner {
    fn open(config: StoreConfig) -> StoreResult<Self> {
        let engine = GraphEngine::open(&config)?;
        let types = RelTypeRegistry::new(config.type_cache_capacity);
        Ok(Self { engine, types, config })
    }

    /// Reject payloads above the configured bound
    pub fn check_payload(&self, len: usize) -> StoreResult<()> {
        if len > self.config.max_payload_bytes {
            return Err(StoreError::PayloadTooLarge {
                size: len,
                limit: self.config.max_payload_bytes,
            });
        }
        Ok(())
    }
}

/// Embedded node/link store
pub struct LinkGraphStore {
    inner: RwLock<Option<Arc<StoreInner>>>,
}

impl LinkGraphStore {
    /// An uninitialized store; call `initialize` before use
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(None),
        }
    }

    /// Create a store and open its engine
    pub fn open(config: StoreConfig) -> StoreResult<Self> {
        let store = Self::new();
        store.initialize_with(config)?;
        Ok(store)
    }

    /// Open the engine from harness properties
    ///
    /// A second call on an initialized store does nothing, whatever the
    /// properties say.
    pub fn initialize(&self, props: &Properties, phase: Phase, thread_id: usize) -> StoreResult<()> {
        if self.is_initialized() {
            debug!("Store already initialized (thread {}, {} phase)", thread_id, phase);
            return Ok(());
        }
        let config = StoreConfig::from_properties(props)?;
        info!("Initializing store for {} phase (thread {})", phase, thread_id);
        self.initialize_with(config)
    }

    /// Open the engine from an explicit configuration; no-op when already open
    pub fn initialize_with(&self, config: StoreConfig) -> StoreResult<()> {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if guard.is_some() {
            return Ok(());
        }
        let inner = StoreInner::open(config)?;
        info!("Store initialized at {:?}", inner.engine.path());
        *guard = Some(Arc::new(inner));
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Release the engine
    ///
    /// Operations started before `close` finish against the engine they
    /// started with; later ones fail with `NotInitialized`. The store may
    /// be initialized again afterwards.
    pub fn close(&self) {
        let taken = self.inner.write().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(inner) = taken {
            info!(
                "Closing store at {:?} ({} link types cached)",
                inner.engine.path(),
                inner.types.cached_len()
            );
        }
    }

    /// No per-thread error counters are kept
    pub fn clear_errors(&self, thread_id: usize) {
        debug!("clear_errors({}) ignored", thread_id);
    }

    /// Id space reset is not supported by the engine
    pub fn reset_node_store(&self, start_id: u64) {
        debug!("reset_node_store({}) ignored", start_id);
    }

    /// Chunk size bulk loaders should use
    pub fn bulk_load_batch_size(&self) -> usize {
        match self.inner() {
            Ok(inner) => inner.config.bulk_load_batch_size,
            Err(_) => DEFAULT_BULK_LOAD_BATCH_SIZE,
        }
    }

    /// Number of stored nodes, placeholders included
    pub fn object_count(&self) -> StoreResult<u64> {
        let inner = self.inner()?;
        scope::read(&inner.engine, "object_count", 0, |tx| tx.count(CF_IDENTITY))
    }

    /// Number of stored links, hidden ones included
    pub fn relationship_count(&self) -> StoreResult<u64> {
        let inner = self.inner()?;
        scope::read(&inner.engine, "relationship_count", 0, |tx| tx.count(CF_RELATIONSHIPS))
    }

    /// Active configuration
    pub fn config(&self) -> StoreResult<StoreConfig> {
        Ok(self.inner()?.config.clone())
    }

    pub(crate) fn inner(&self) -> StoreResult<Arc<StoreInner>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(StoreError::NotInitialized)
    }
}

impl Default for LinkGraphStore {
    fn default() -> Self {
        Self::new()
    }
}
