//! Concurrent get-or-create and link dedup across threads

use linkgraph::{Link, LinkGraphStore, Node, StoreConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use tempfile::TempDir;

const THREADS: usize = 8;

fn open_shared(dir: &TempDir) -> Arc<LinkGraphStore> {
    let mut config = StoreConfig::new(dir.path());
    config.lock_timeout_ms = 10_000;
    Arc::new(LinkGraphStore::open(config).unwrap())
}

#[test]
fn test_concurrent_add_node_same_id() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_shared(&temp_dir);

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for round in 0..20 {
                    let data = format!("{}-{}", t, round).into_bytes();
                    store.add_node(&Node::new(42, 1, round, 0, data)).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.object_count().unwrap(), 1);
    assert_eq!(store.get_node(42).unwrap().unwrap().version, 19);
}

#[test]
fn test_concurrent_add_link_same_triple() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_shared(&temp_dir);

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let mut created = 0usize;
                for round in 0..20 {
                    let link = Link::new(1, 5, 2).with_time(round).with_data(format!("{}", t));
                    if store.add_link(&link, false).unwrap() {
                        created += 1;
                    }
                }
                created
            })
        })
        .collect();
    let created: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

    assert_eq!(created, 1);
    assert_eq!(store.relationship_count().unwrap(), 1);
    assert_eq!(store.object_count().unwrap(), 2);
    assert_eq!(store.count_links(1, 5).unwrap(), 1);
}

#[test]
fn test_concurrent_crossing_links() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_shared(&temp_dir);

    // Half the threads write a -> b, the other half b -> a, over a
    // shared set of ids; ordered endpoint locking keeps them deadlock-free
    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..10u64 {
                    let (a, b) = (i, i + 1);
                    let link = if t % 2 == 0 { Link::new(a, 7, b) } else { Link::new(b, 7, a) };
                    store.add_link(&link, false).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.relationship_count().unwrap(), 20);
    assert_eq!(store.object_count().unwrap(), 11);
    for i in 0..10u64 {
        assert!(store.get_link(i, 7, i + 1).unwrap().is_some());
        assert!(store.get_link(i + 1, 7, i).unwrap().is_some());
    }
}

#[test]
fn test_concurrent_distinct_links_one_source() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_shared(&temp_dir);

    let handles: Vec<_> = (0..THREADS as u64)
        .map(|t| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..25u64 {
                    let id2 = 1_000 + t * 100 + i;
                    assert!(store.add_link(&Link::new(1, 5, id2).with_time(i as i64), false).unwrap());
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.count_links(1, 5).unwrap(), (THREADS * 25) as i64);
}

#[test]
fn test_reads_during_expunge_and_readd() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_shared(&temp_dir);

    let links: Vec<Link> = (10..58u64).map(|id2| Link::new(1, 5, id2).with_time(id2 as i64)).collect();
    store.add_bulk_links(&links, false).unwrap();

    let done = Arc::new(AtomicBool::new(false));
    let writer = {
        let store = Arc::clone(&store);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            for round in 0..200u64 {
                let id2 = 10 + round % 48;
                assert!(store.delete_link(1, 5, id2, true).unwrap());
                assert!(store.add_link(&Link::new(1, 5, id2).with_time(id2 as i64), false).unwrap());
            }
            done.store(true, Ordering::SeqCst);
        })
    };

    let readers: Vec<_> = (0..2)
        .map(|_| {
            let store = Arc::clone(&store);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                while !done.load(Ordering::SeqCst) {
                    let listed = store.get_link_list(1, 5).unwrap().unwrap();
                    assert!(listed.len() == 47 || listed.len() == 48);
                    let count = store.count_links(1, 5).unwrap();
                    assert!(count == 47 || count == 48);
                    let page = store.get_link_list_range(1, 5, 20, 40, 1, 5).unwrap().unwrap();
                    assert!(page.len() <= 5);
                    store.get_link(1, 5, 10).unwrap();
                    assert!(store.get_node(1).unwrap().is_some());
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }
    assert_eq!(store.count_links(1, 5).unwrap(), 48);
}

#[test]
fn test_concurrent_delete_node_shared_links() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_shared(&temp_dir);

    for round in 0..20u64 {
        let (a, b, c) = (round * 10 + 1, round * 10 + 2, round * 10 + 3);
        store.add_link(&Link::new(a, 5, b), false).unwrap();
        store.add_link(&Link::new(b, 5, a), false).unwrap();
        store.add_link(&Link::new(a, 6, b), false).unwrap();
        store.add_link(&Link::new(a, 5, c), false).unwrap();

        let barrier = Arc::new(Barrier::new(2));
        let handles: Vec<_> = [a, b]
            .into_iter()
            .map(|id| {
                let store = Arc::clone(&store);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    store.delete_node(id).unwrap()
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }

        assert!(store.get_node(a).unwrap().is_none());
        assert!(store.get_node(b).unwrap().is_none());
        assert!(store.get_node(c).unwrap().is_some());
        assert_eq!(store.get_link_list(c, 5).unwrap(), None);
    }
    assert_eq!(store.relationship_count().unwrap(), 0);
    assert_eq!(store.object_count().unwrap(), 20);
}

#[test]
fn test_concurrent_bulk_loads_overlapping_endpoints() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_shared(&temp_dir);

    // Same endpoints, opposite input order, different sources
    let forward: Vec<Link> = (100..400u64).map(|id2| Link::new(1, 5, id2)).collect();
    let reversed: Vec<Link> = (100..400u64).rev().map(|id2| Link::new(2, 5, id2)).collect();

    for _ in 0..5 {
        let barrier = Arc::new(Barrier::new(2));
        let handles: Vec<_> = [forward.clone(), reversed.clone()]
            .into_iter()
            .map(|batch| {
                let store = Arc::clone(&store);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    store.add_bulk_links(&batch, false).unwrap()
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
    }

    assert_eq!(store.count_links(1, 5).unwrap(), 300);
    assert_eq!(store.count_links(2, 5).unwrap(), 300);
    assert_eq!(store.relationship_count().unwrap(), 600);
    assert_eq!(store.object_count().unwrap(), 302);
}

#[test]
fn test_concurrent_bulk_node_loads_reversed() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_shared(&temp_dir);

    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = [false, true]
        .into_iter()
        .map(|reverse| {
            let store = Arc::clone(&store);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let mut nodes: Vec<Node> = (1..=300u64).map(|id| Node::new(id, 1, 0, 0, Vec::new())).collect();
                if reverse {
                    nodes.reverse();
                }
                barrier.wait();
                store.bulk_add_nodes(&nodes).unwrap().len()
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), 300);
    }
    assert_eq!(store.object_count().unwrap(), 300);
}
