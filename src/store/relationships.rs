//! Link operations
//!
//! A link is one engine relationship from id1's object to id2's object,
//! tagged with its link type's engine tag. The endpoints' identity keys
//! are locked in ascending id order before the relationship is looked
//! up, so writers of the same triple serialize and writers of crossing
//! triples cannot deadlock each other. Batches lock all of their
//! endpoints up front, in the same ascending order.

use super::identity::IdentityIndex;
use super::{scope, LinkGraphStore, StoreInner};
use crate::engine::records::StoredRelationship;
use crate::engine::EngineTx;
use crate::error::{StoreError, StoreResult};
use crate::graph::{Direction, Link, LinkCount, ObjectHandle, RelHandle, TypeTag};
use std::collections::BTreeSet;
use tracing::{debug, trace};

/// Lock both endpoints, creating missing ones
fn create_endpoints(tx: &EngineTx<'_>, id1: u64, id2: u64) -> StoreResult<(ObjectHandle, ObjectHandle)> {
    if id1 == id2 {
        let (handle, _) = IdentityIndex::get_or_create(tx, id1)?;
        return Ok((handle, handle));
    }
    let (low, high) = (id1.min(id2), id1.max(id2));
    let (low_handle, _) = IdentityIndex::get_or_create(tx, low)?;
    let (high_handle, _) = IdentityIndex::get_or_create(tx, high)?;
    Ok(if id1 == low {
        (low_handle, high_handle)
    } else {
        (high_handle, low_handle)
    })
}

/// Lock every endpoint of a batch in ascending id order, creating missing ones
///
/// Batch elements then only re-enter locks this transaction already holds,
/// so concurrent batches over overlapping ids cannot deadlock.
fn create_batch_endpoints(tx: &EngineTx<'_>, links: &[Link]) -> StoreResult<()> {
    let ids: BTreeSet<u64> = links.iter().flat_map(|link| [link.id1, link.id2]).collect();
    for id in ids {
        IdentityIndex::get_or_create(tx, id)?;
    }
    Ok(())
}

/// Lock both endpoints; either one missing is `NodeNotFound`
fn lock_endpoints(tx: &EngineTx<'_>, id1: u64, id2: u64) -> StoreResult<(ObjectHandle, ObjectHandle)> {
    if id1 == id2 {
        let handle = IdentityIndex::require(tx, id1, true)?;
        return Ok((handle, handle));
    }
    let (low, high) = (id1.min(id2), id1.max(id2));
    let low_handle = IdentityIndex::require(tx, low, true)?;
    let high_handle = IdentityIndex::require(tx, high, true)?;
    Ok(if id1 == low {
        (low_handle, high_handle)
    } else {
        (high_handle, low_handle)
    })
}

/// The relationship from `start` to `end` with `tag`, if any
fn find_relationship(
    tx: &EngineTx<'_>,
    start: ObjectHandle,
    tag: TypeTag,
    end: ObjectHandle,
) -> StoreResult<Option<(RelHandle, StoredRelationship)>> {
    let entries = tx.relationships(start, Some(Direction::Outgoing), Some(tag), Some(end))?;
    match entries.first() {
        Some(entry) => Ok(Some((entry.relationship, tx.load_relationship(entry.relationship)?))),
        None => Ok(None),
    }
}

/// Registered tag for a link type; an unregistered type is `LinkTypeNotFound`
fn require_tag(inner: &StoreInner, link_type: i64) -> StoreResult<TypeTag> {
    inner
        .types
        .tag_for(&inner.engine, link_type, false)?
        .ok_or(StoreError::LinkTypeNotFound(link_type))
}

/// Locate an existing link, reporting any missing piece as an absence
fn find_link(
    inner: &StoreInner,
    tx: &EngineTx<'_>,
    id1: u64,
    link_type: i64,
    id2: u64,
    lock: bool,
) -> StoreResult<(RelHandle, StoredRelationship)> {
    let (start, end) = if lock {
        lock_endpoints(tx, id1, id2)?
    } else {
        (
            IdentityIndex::require(tx, id1, false)?,
            IdentityIndex::require(tx, id2, false)?,
        )
    };
    let tag = require_tag(inner, link_type)?;
    find_relationship(tx, start, tag, end)?.ok_or_else(|| StoreError::link_not_found(id1, link_type, id2))
}

/// Create or overwrite a link inside an open transaction; `true` when created
pub(super) fn put_link(inner: &StoreInner, tx: &EngineTx<'_>, link: &Link, noinverse: bool) -> StoreResult<bool> {
    inner.check_payload(link.data.len())?;
    let tag = inner
        .types
        .tag_for(&inner.engine, link.link_type, true)?
        .ok_or(StoreError::LinkTypeNotFound(link.link_type))?;
    let (start, end) = create_endpoints(tx, link.id1, link.id2)?;

    match find_relationship(tx, start, tag, end)? {
        Some((handle, mut record)) => {
            record.update_from(link, noinverse);
            tx.put_relationship(handle, &record)?;
            trace!("Updated link ({}, {}, {})", link.id1, link.link_type, link.id2);
            Ok(false)
        }
        None => {
            let record = StoredRelationship::new(start, end, tag, link, noinverse);
            tx.create_relationship(&record)?;
            trace!("Created link ({}, {}, {})", link.id1, link.link_type, link.id2);
            Ok(true)
        }
    }
}

impl LinkGraphStore {
    /// Create a link, or overwrite the existing one for the same triple
    ///
    /// Missing endpoints are created as placeholder nodes. Returns `true`
    /// when a new link was created and `false` when one was updated.
    pub fn add_link(&self, link: &Link, noinverse: bool) -> StoreResult<bool> {
        let inner = self.inner()?;
        scope::write(&inner.engine, "add_link", |tx| put_link(&inner, tx, link, noinverse))
    }

    /// Overwrite an existing link; `false` when there is none
    pub fn update_link(&self, link: &Link, noinverse: bool) -> StoreResult<bool> {
        let inner = self.inner()?;
        scope::run(&inner.engine, "update_link", false, |tx| {
            inner.check_payload(link.data.len())?;
            let (handle, mut record) = find_link(&inner, tx, link.id1, link.link_type, link.id2, true)?;
            record.update_from(link, noinverse);
            tx.put_relationship(handle, &record)?;
            Ok(true)
        })
    }

    /// Hide a link, or remove it entirely with `expunge`; `false` when absent
    pub fn delete_link(&self, id1: u64, link_type: i64, id2: u64, expunge: bool) -> StoreResult<bool> {
        let inner = self.inner()?;
        scope::run(&inner.engine, "delete_link", false, |tx| {
            let (handle, mut record) = find_link(&inner, tx, id1, link_type, id2, true)?;
            if expunge {
                tx.delete_relationship(handle, &record)?;
            } else {
                record.hide();
                tx.put_relationship(handle, &record)?;
            }
            debug!("Deleted link ({}, {}, {}), expunge={}", id1, link_type, id2, expunge);
            Ok(true)
        })
    }

    /// Link for a triple whatever its visibility; `None` when absent
    pub fn get_link(&self, id1: u64, link_type: i64, id2: u64) -> StoreResult<Option<Link>> {
        let inner = self.inner()?;
        scope::read(&inner.engine, "get_link", None, |tx| {
            let (_, record) = find_link(&inner, tx, id1, link_type, id2, false)?;
            Ok(Some(record.to_link()))
        })
    }

    /// `add_link` for every element, all in one transaction
    ///
    /// Returns how many links were newly created.
    pub fn add_bulk_links(&self, links: &[Link], noinverse: bool) -> StoreResult<usize> {
        let inner = self.inner()?;
        scope::write(&inner.engine, "add_bulk_links", |tx| {
            create_batch_endpoints(tx, links)?;
            let mut created = 0;
            for link in links {
                if put_link(&inner, tx, link, noinverse)? {
                    created += 1;
                }
            }
            Ok(created)
        })
    }

    /// Counts are computed by traversal, so pre-aggregated ones are dropped
    pub fn add_bulk_counts(&self, counts: &[LinkCount]) -> StoreResult<()> {
        self.inner()?;
        debug!("Ignoring {} link counts", counts.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::config::StoreConfig;
    use crate::graph::{Link, LinkCount, VISIBILITY_HIDDEN};
    use crate::store::LinkGraphStore;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> LinkGraphStore {
        LinkGraphStore::open(StoreConfig::new(dir.path())).unwrap()
    }

    #[test]
    fn test_add_link_dedup() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);

        assert!(store.add_link(&Link::new(1, 5, 2).with_data("A"), false).unwrap());
        assert!(!store.add_link(&Link::new(1, 5, 2).with_data("B"), true).unwrap());

        assert_eq!(store.get_link(1, 5, 2).unwrap().unwrap().data, b"B".to_vec());
        assert_eq!(store.relationship_count().unwrap(), 1);
        // Endpoints were created implicitly
        assert_eq!(store.object_count().unwrap(), 2);
    }

    #[test]
    fn test_direction_and_type_matter() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);

        assert!(store.add_link(&Link::new(1, 5, 2), false).unwrap());
        assert!(store.add_link(&Link::new(2, 5, 1), false).unwrap());
        assert!(store.add_link(&Link::new(1, 6, 2), false).unwrap());
        assert_eq!(store.relationship_count().unwrap(), 3);
        assert!(store.get_link(1, 7, 2).unwrap().is_none());
    }

    #[test]
    fn test_update_link() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);

        assert!(!store.update_link(&Link::new(1, 5, 2), false).unwrap());
        // No placeholder endpoints were left behind by the failed update
        assert_eq!(store.object_count().unwrap(), 0);

        store.add_link(&Link::new(1, 5, 2).with_time(1), false).unwrap();
        assert!(!store.update_link(&Link::new(1, 5, 3), false).unwrap());
        assert!(store
            .update_link(&Link::new(1, 5, 2).with_time(9).with_version(2), false)
            .unwrap());

        let link = store.get_link(1, 5, 2).unwrap().unwrap();
        assert_eq!((link.time, link.version), (9, 2));
    }

    #[test]
    fn test_soft_delete_keeps_link() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);

        store.add_link(&Link::new(1, 5, 2), false).unwrap();
        assert!(store.delete_link(1, 5, 2, false).unwrap());

        let link = store.get_link(1, 5, 2).unwrap().unwrap();
        assert_eq!(link.visibility, VISIBILITY_HIDDEN);
        assert_eq!(store.get_link_list(1, 5).unwrap(), None);
        assert_eq!(store.count_links(1, 5).unwrap(), 0);

        // Re-adding makes it visible again without duplicating
        assert!(!store.add_link(&Link::new(1, 5, 2), false).unwrap());
        assert_eq!(store.count_links(1, 5).unwrap(), 1);
    }

    #[test]
    fn test_expunge_removes_link() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);

        store.add_link(&Link::new(1, 5, 2), false).unwrap();
        assert!(store.delete_link(1, 5, 2, true).unwrap());
        assert!(store.get_link(1, 5, 2).unwrap().is_none());
        assert!(!store.delete_link(1, 5, 2, true).unwrap());

        // Endpoints survive
        assert!(store.get_node(1).unwrap().is_some());
        assert!(store.get_node(2).unwrap().is_some());
    }

    #[test]
    fn test_delete_link_absent_pieces() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);

        assert!(!store.delete_link(1, 5, 2, false).unwrap());
        store.add_link(&Link::new(1, 5, 2), false).unwrap();
        assert!(!store.delete_link(1, 5, 3, false).unwrap());
        assert!(!store.delete_link(1, 8, 2, false).unwrap());
    }

    #[test]
    fn test_add_bulk_links() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);

        store.add_link(&Link::new(1, 5, 2), false).unwrap();
        let links = vec![Link::new(1, 5, 2), Link::new(1, 5, 3), Link::new(1, 5, 4)];
        assert_eq!(store.add_bulk_links(&links, false).unwrap(), 2);
        assert_eq!(store.count_links(1, 5).unwrap(), 3);

        store.add_bulk_counts(&[LinkCount::new(1, 5, 0, 0, 3)]).unwrap();
        assert_eq!(store.count_links(1, 5).unwrap(), 3);
    }
}
