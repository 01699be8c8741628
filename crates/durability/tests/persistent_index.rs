//! Integration tests for the write-through persistent index
//!
//! These cover the open-or-create lifecycle, reopen fidelity, and the
//! interaction between in-memory mutation and on-disk state.

use quay_core::{IdSelector, IoFlags, MetricType};
use quay_durability::{read_index, PersistentIndex};
use quay_engine::IndexHandle;
use tempfile::TempDir;

fn factory() -> quay_core::Result<IndexHandle> {
    IndexHandle::flat(4, MetricType::InnerProduct)
}

#[test]
fn test_open_create_mutate_reopen_cycle() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cycle.idx");

    // Create fresh; write on first mutation
    {
        let idx = PersistentIndex::open(&path, factory).unwrap();
        assert!(!path.exists());
        idx.add(&[1.0; 8]).unwrap();
        assert!(path.exists());
        assert_eq!(idx.ntotal(), 2);
    }

    // Reopen from disk; the factory must not run
    let idx = PersistentIndex::open(&path, || {
        panic!("factory invoked although the file exists")
    })
    .unwrap();
    assert_eq!(idx.d(), 4);
    assert_eq!(idx.ntotal(), 2);
    assert_eq!(idx.metric_type(), MetricType::InnerProduct);
}

#[test]
fn test_every_mutation_rewrites_the_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("steps.idx");
    let idx = PersistentIndex::open(&path, factory).unwrap();

    idx.add(&[0.5; 4]).unwrap();
    assert_eq!(read_index(&path, IoFlags::NONE).unwrap().ntotal(), 1);

    idx.add_with_ids(&[0.25; 4], &[10]).unwrap();
    assert_eq!(read_index(&path, IoFlags::NONE).unwrap().ntotal(), 2);

    let removed = idx.remove_ids(&IdSelector::batch(&[10]).unwrap()).unwrap();
    assert_eq!(removed, 1);
    assert_eq!(read_index(&path, IoFlags::NONE).unwrap().ntotal(), 1);
}

#[test]
fn test_add_batch_persists_final_state() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("batched.idx");
    let idx = PersistentIndex::open(&path, factory).unwrap();

    let vectors: Vec<f32> = (0..10 * 4).map(|v| v as f32 * 0.1).collect();
    idx.add_batch(&vectors, 3).unwrap();
    assert_eq!(idx.ntotal(), 10);

    let reopened = read_index(&path, IoFlags::NONE).unwrap();
    assert_eq!(reopened.ntotal(), 10);
}

#[test]
fn test_search_through_the_wrapper() {
    let dir = TempDir::new().unwrap();
    let idx = PersistentIndex::open(dir.path().join("search.idx"), || {
        IndexHandle::flat_l2(2)
    })
    .unwrap();
    idx.add(&[0.0, 0.0, 5.0, 5.0]).unwrap();

    let (distances, labels) = idx.search(&[0.1, 0.1], 2).unwrap();
    assert_eq!(labels, vec![0, 1]);
    assert!(distances[0] < distances[1]);

    let (batch_distances, batch_labels) = idx.search_batch(&[0.1, 0.1], 2, 1).unwrap();
    assert_eq!(batch_labels[0], labels);
    assert_eq!(batch_distances[0], distances);
}

#[test]
fn test_concurrent_mutations_serialize() {
    use std::sync::Arc;

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("threads.idx");
    let idx = Arc::new(PersistentIndex::open(&path, || IndexHandle::flat_l2(2)).unwrap());

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let idx = Arc::clone(&idx);
            std::thread::spawn(move || {
                for i in 0..5 {
                    let v = (t * 5 + i) as f32;
                    idx.add(&[v, v]).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(idx.ntotal(), 20);
    assert_eq!(read_index(&path, IoFlags::NONE).unwrap().ntotal(), 20);
}
