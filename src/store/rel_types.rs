//! Link type -> engine type tag registry
//!
//! The mapping is persisted in the engine's `rel_types` index and
//! cached in a bounded LRU. A new tag is registered in its own short
//! transaction and committed immediately, so a caller's rollback never
//! leaves relationships pointing at an unregistered tag and concurrent
//! callers never block on each other's registrations for longer than
//! that short transaction.

use crate::engine::{keys, GraphEngine, CF_REL_TYPES};
use crate::error::StoreResult;
use crate::graph::TypeTag;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Mutex, PoisonError};
use tracing::debug;

pub(crate) struct RelTypeRegistry {
    /// `None` when the configured capacity is zero
    cache: Option<Mutex<LruCache<i64, TypeTag>>>,
}

impl RelTypeRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: NonZeroUsize::new(capacity).map(|cap| Mutex::new(LruCache::new(cap))),
        }
    }

    /// Tag for `link_type`, registering one when `create` is set
    ///
    /// Without `create` an unregistered type yields `None`. Only
    /// registered types are cached.
    pub fn tag_for(&self, engine: &GraphEngine, link_type: i64, create: bool) -> StoreResult<Option<TypeTag>> {
        if let Some(tag) = self.cached(link_type) {
            return Ok(Some(tag));
        }

        let key = keys::rel_type_key(link_type);
        let tx = engine.begin();
        let value = if create {
            let (value, inserted) = tx.index_get_or_insert(CF_REL_TYPES, &key, || {
                Ok(engine.allocate_tag().as_u32().to_be_bytes().to_vec())
            })?;
            if inserted {
                tx.commit()?;
                debug!("Registered link type {}", link_type);
            }
            Some(value)
        } else {
            tx.index_get(CF_REL_TYPES, &key, false)?
        };

        let tag = match value {
            Some(bytes) => TypeTag::new(keys::read_u32(&bytes)?),
            None => return Ok(None),
        };
        if let Some(cache) = &self.cache {
            cache.lock().unwrap_or_else(PoisonError::into_inner).put(link_type, tag);
        }
        Ok(Some(tag))
    }

    fn cached(&self, link_type: i64) -> Option<TypeTag> {
        let cache = self.cache.as_ref()?;
        let mut cache = cache.lock().unwrap_or_else(PoisonError::into_inner);
        cache.get(&link_type).copied()
    }

    /// Number of cached mappings
    pub fn cached_len(&self) -> usize {
        self.cache
            .as_ref()
            .map(|cache| cache.lock().unwrap_or_else(PoisonError::into_inner).len())
            .unwrap_or(0)
    }
}
