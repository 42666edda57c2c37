//! Link listing and counting
//!
//! Listings only ever include visible links. They are sorted newest
//! first, with ties on `time` broken by ascending `id2`. Inside one
//! listing `id1` and `link_type` are fixed and `id2` is unique, so the
//! order is total. An empty listing is reported as `None`, the same as
//! an absent `id1`.

use super::identity::IdentityIndex;
use super::{scope, LinkGraphStore, StoreInner};
use crate::engine::EngineTx;
use crate::error::StoreResult;
use crate::graph::{Direction, Link};
use std::cmp::Ordering;
use std::ops::RangeInclusive;

/// Listing order: descending time, then ascending id2
pub fn compare_links(a: &Link, b: &Link) -> Ordering {
    b.time
        .cmp(&a.time)
        .then_with(|| a.id2.cmp(&b.id2))
        .then_with(|| a.link_type.cmp(&b.link_type))
        .then_with(|| a.id1.cmp(&b.id1))
}

/// Visible outgoing links of `link_type` whose time lies in `window`
///
/// An absent `id1` is `NodeNotFound`. A type that was never registered
/// has no links.
fn visible_links(
    inner: &StoreInner,
    tx: &EngineTx<'_>,
    id1: u64,
    link_type: i64,
    window: &RangeInclusive<i64>,
) -> StoreResult<Vec<Link>> {
    let start = IdentityIndex::require(tx, id1, false)?;
    let Some(tag) = inner.types.tag_for(&inner.engine, link_type, false)? else {
        return Ok(Vec::new());
    };

    let mut links = Vec::new();
    for entry in tx.relationships(start, Some(Direction::Outgoing), Some(tag), None)? {
        let record = tx.load_relationship(entry.relationship)?;
        if record.is_visible() && window.contains(&record.time) {
            links.push(record.to_link());
        }
    }
    Ok(links)
}

fn non_empty(links: Vec<Link>) -> Option<Vec<Link>> {
    if links.is_empty() {
        None
    } else {
        Some(links)
    }
}

impl LinkGraphStore {
    /// Every visible link of a type from `id1`, newest first
    pub fn get_link_list(&self, id1: u64, link_type: i64) -> StoreResult<Option<Vec<Link>>> {
        let inner = self.inner()?;
        scope::read(&inner.engine, "get_link_list", None, |tx| {
            let mut links = visible_links(&inner, tx, id1, link_type, &(i64::MIN..=i64::MAX))?;
            links.sort_by(compare_links);
            Ok(non_empty(links))
        })
    }

    /// Visible links of a type from `id1` with `min_time <= time <= max_time`,
    /// newest first, skipping `offset` and keeping at most `limit`
    pub fn get_link_list_range(
        &self,
        id1: u64,
        link_type: i64,
        min_time: i64,
        max_time: i64,
        offset: usize,
        limit: usize,
    ) -> StoreResult<Option<Vec<Link>>> {
        let inner = self.inner()?;
        scope::read(&inner.engine, "get_link_list_range", None, |tx| {
            let mut links = visible_links(&inner, tx, id1, link_type, &(min_time..=max_time))?;
            links.sort_by(compare_links);
            let page: Vec<Link> = links.into_iter().skip(offset).take(limit).collect();
            Ok(non_empty(page))
        })
    }

    /// Number of visible links of a type from `id1`; `-1` when `id1` is absent
    pub fn count_links(&self, id1: u64, link_type: i64) -> StoreResult<i64> {
        let inner = self.inner()?;
        scope::read(&inner.engine, "count_links", -1, |tx| {
            let links = visible_links(&inner, tx, id1, link_type, &(i64::MIN..=i64::MAX))?;
            Ok(links.len() as i64)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::graph::Node;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> LinkGraphStore {
        LinkGraphStore::open(StoreConfig::new(dir.path())).unwrap()
    }

    #[test]
    fn test_compare_links_total_order() {
        let newer = Link::new(1, 5, 9).with_time(20);
        let older = Link::new(1, 5, 2).with_time(10);
        let tie = Link::new(1, 5, 3).with_time(20);

        assert_eq!(compare_links(&newer, &older), Ordering::Less);
        assert_eq!(compare_links(&tie, &newer), Ordering::Less);
        assert_eq!(compare_links(&newer, &tie), Ordering::Greater);
        assert_eq!(compare_links(&newer, &newer.clone()), Ordering::Equal);
    }

    #[test]
    fn test_range_and_pagination() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);
        for (i, time) in [10, 20, 30, 40, 50].iter().enumerate() {
            store.add_link(&Link::new(1, 5, 100 + i as u64).with_time(*time), false).unwrap();
        }

        let page = store.get_link_list_range(1, 5, 20, 40, 1, 2).unwrap().unwrap();
        let times: Vec<i64> = page.iter().map(|l| l.time).collect();
        assert_eq!(times, vec![30, 20]);

        let all = store.get_link_list(1, 5).unwrap().unwrap();
        let times: Vec<i64> = all.iter().map(|l| l.time).collect();
        assert_eq!(times, vec![50, 40, 30, 20, 10]);

        assert_eq!(store.get_link_list_range(1, 5, 20, 40, 3, 2).unwrap(), None);
        assert_eq!(store.get_link_list_range(1, 5, 20, 40, 1000, 10).unwrap(), None);
        assert_eq!(store.get_link_list_range(1, 5, 20, 40, 0, 0).unwrap(), None);
        assert_eq!(store.get_link_list_range(1, 5, 41, 49, 0, 10).unwrap(), None);
    }

    #[test]
    fn test_equal_times_break_on_id2() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);
        for id2 in [7u64, 3, 5] {
            store.add_link(&Link::new(1, 5, id2).with_time(10), false).unwrap();
        }
        let ids: Vec<u64> = store.get_link_list(1, 5).unwrap().unwrap().iter().map(|l| l.id2).collect();
        assert_eq!(ids, vec![3, 5, 7]);
    }

    #[test]
    fn test_count_links_sentinels() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);

        assert_eq!(store.count_links(1, 5).unwrap(), -1);
        assert_eq!(store.get_link_list(1, 5).unwrap(), None);

        store.add_node(&Node::new(1, 0, 0, 0, Vec::new())).unwrap();
        assert_eq!(store.count_links(1, 5).unwrap(), 0);

        store.add_link(&Link::new(1, 5, 2), false).unwrap();
        store.add_link(&Link::new(1, 5, 3), false).unwrap();
        store.add_link(&Link::new(1, 6, 3), false).unwrap();
        store.add_link(&Link::new(2, 5, 1), false).unwrap();
        assert_eq!(store.count_links(1, 5).unwrap(), 2);
        assert_eq!(store.count_links(2, 5).unwrap(), 1);
        assert_eq!(store.count_links(3, 5).unwrap(), 0);
    }
}
