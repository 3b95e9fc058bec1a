#![allow(missing_docs)]

use std::path::Path;
use std::time::Duration;

use hopbench::bench::ring;
use hopbench::traversal::HOPS_PER_CLOCK_CHECK;
use hopbench::{
    benchmark_ring, build_ring, Dir, NodeId, RecordStore, RelType, Result, Settings,
    StorageAdapter, StoreOptions, Topology,
};
use tempfile::TempDir;

fn ring_settings(dir: &Path) -> Settings {
    Settings::new("ring").with_override("storeDir", dir.display().to_string())
}

#[test]
fn every_node_has_one_successor_and_the_cycle_closes() -> Result<()> {
    let dir = TempDir::new()?;
    let mut store = RecordStore::open(dir.path().join("ring"), &StoreOptions::for_insert())?;
    let length = 37u64;
    let stats = build_ring(&mut store, length as i64)?;
    assert_eq!(stats.nodes, length);
    assert_eq!(stats.relationships, length);
    assert_eq!(store.node_count(), length);

    for id in 0..length {
        let next = store.single_relationship(NodeId(id), RelType::Next, Dir::Out)?;
        assert_eq!(next.dst, NodeId((id + 1) % length));
    }

    for start in [0, 5, length - 1] {
        let mut node = NodeId(start);
        for hop in 1..=length {
            node = store.single_relationship(node, RelType::Next, Dir::Out)?.dst;
            assert_eq!(node == NodeId(start), hop == length, "hop {hop} from {start}");
        }
    }
    Ok(())
}

#[test]
fn five_node_ring_one_millisecond() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("ring");
    let mut store = RecordStore::open(&path, &StoreOptions::for_insert())?;
    build_ring(&mut store, 5)?;
    store.close()?;

    let store = RecordStore::open(&path, &StoreOptions::for_read())?;
    let samples = benchmark_ring(&store, 3, Duration::from_millis(1))?;
    assert_eq!(samples.len(), 3);
    for sample in samples {
        assert!(sample.hops >= HOPS_PER_CLOCK_CHECK);
        assert_eq!(sample.hops % HOPS_PER_CLOCK_CHECK, 0);
        assert!(sample.hops_per_ms() > 0.0);
    }
    Ok(())
}

#[test]
fn construct_then_traverse_through_settings() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("ring");

    let load = ring::construct(&ring_settings(&path).with_override("length", "250"))?;
    assert_eq!(load.topology, Topology::Ring);
    assert_eq!(load.stats.nodes, 250);
    assert_eq!(load.store_dir, path);
    assert!(load
        .to_string()
        .starts_with("Inserted 250 nodes and 250 relationships in "));

    let report = ring::traverse(
        &ring_settings(&path)
            .with_override("runs", "2")
            .with_override("seconds", "1"),
    )?;
    assert_eq!(report.runs.len(), 2);
    assert!(report.runs.iter().all(|run| run.hops > 0));
    assert!(report.mean_hops_per_ms() > 0.0);
    let text = report.to_string();
    assert_eq!(text.lines().count(), 2);
    assert!(text.lines().all(|line| line.starts_with("Traversal speed ")
        && line.ends_with(" hops/ms")));
    Ok(())
}

#[test]
fn reloading_replaces_the_previous_ring() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("ring");
    ring::construct(&ring_settings(&path).with_override("length", "10"))?;
    ring::construct(&ring_settings(&path).with_override("length", "4"))?;

    let store = RecordStore::open(&path, &StoreOptions::for_read())?;
    assert_eq!(store.node_count(), 4);
    assert_eq!(store.relationship_count(), 4);
    Ok(())
}

#[test]
fn reloading_leaves_foreign_files_in_the_store_dir() -> Result<()> {
    let dir = TempDir::new()?;
    let docs = dir.path().join("docs");
    std::fs::create_dir_all(docs.join("chapters"))?;
    std::fs::write(docs.join("thesis.txt"), "draft")?;
    std::fs::write(docs.join("chapters").join("one.txt"), "intro")?;

    ring::construct(&ring_settings(&docs).with_override("length", "3"))?;
    ring::construct(&ring_settings(&docs).with_override("length", "5"))?;

    assert_eq!(std::fs::read_to_string(docs.join("thesis.txt"))?, "draft");
    assert!(docs.join("chapters").join("one.txt").exists());
    let store = RecordStore::open(&docs, &StoreOptions::for_read())?;
    assert_eq!(store.node_count(), 5);
    Ok(())
}
