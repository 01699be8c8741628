//! Integration tests for the multi-index batch manager

use quay_core::{IoFlags, MetricType};
use quay_durability::BatchIndexManager;
use quay_engine::IndexHandle;
use tempfile::TempDir;

fn seeded(d: usize, rows: usize) -> IndexHandle {
    let mut handle = IndexHandle::flat_l2(d).unwrap();
    let vectors: Vec<f32> = (0..rows * d).map(|v| v as f32).collect();
    handle.add(&vectors).unwrap();
    handle
}

#[test]
fn test_save_all_then_load_all_round_trip() {
    let dir = TempDir::new().unwrap();

    let mut manager = BatchIndexManager::new();
    manager.register("tiny", seeded(2, 3)).unwrap();
    manager.register("wide", seeded(8, 5)).unwrap();
    assert_eq!(manager.save_all(dir.path()).unwrap(), 2);

    let mut restored = BatchIndexManager::new();
    assert_eq!(restored.load_all(dir.path(), IoFlags::NONE).unwrap(), 2);

    let mut names = restored.names();
    names.sort();
    assert_eq!(names, vec!["tiny", "wide"]);
    assert_eq!(restored.get("tiny").unwrap().ntotal(), 3);
    assert_eq!(restored.get("tiny").unwrap().d(), 2);
    assert_eq!(restored.get("wide").unwrap().ntotal(), 5);
    assert_eq!(restored.get("wide").unwrap().d(), 8);
}

#[test]
fn test_load_all_replaces_existing_entries() {
    let dir = TempDir::new().unwrap();

    let mut on_disk = BatchIndexManager::new();
    on_disk
        .register("only", IndexHandle::flat(3, MetricType::InnerProduct).unwrap())
        .unwrap();
    on_disk.save_all(dir.path()).unwrap();

    let mut manager = BatchIndexManager::new();
    manager.register("stale", seeded(2, 1)).unwrap();
    manager.load_all(dir.path(), IoFlags::NONE).unwrap();

    assert!(manager.get("stale").is_none());
    let only = manager.get("only").unwrap();
    assert_eq!(only.metric_type(), MetricType::InnerProduct);
    assert_eq!(only.d(), 3);
}

#[test]
fn test_save_all_into_missing_directory() {
    let dir = TempDir::new().unwrap();
    let nested = dir.path().join("deep").join("er");

    let mut manager = BatchIndexManager::new();
    manager.register("a", seeded(2, 2)).unwrap();
    manager.save_all(&nested).unwrap();
    assert!(nested.join("a.idx").exists());
}

#[test]
fn test_mutation_through_get_mut_survives_save() {
    let dir = TempDir::new().unwrap();

    let mut manager = BatchIndexManager::new();
    manager.register("live", IndexHandle::flat_l2(2).unwrap()).unwrap();
    manager.get_mut("live").unwrap().add(&[1.0, 2.0]).unwrap();
    manager.save_all(dir.path()).unwrap();

    let mut restored = BatchIndexManager::new();
    restored.load_all(dir.path(), IoFlags::NONE).unwrap();
    assert_eq!(restored.get("live").unwrap().ntotal(), 1);
}
