#![allow(missing_docs)]

use std::fs;

use hopbench::storage::REFERENCE_NODE;
use hopbench::types::{PropValue, Props};
use hopbench::{
    BenchError, Dir, NodeId, RecordStore, RelType, Result, StorageAdapter, StoreOptions,
};
use tempfile::TempDir;

fn seeded(dir: &TempDir) -> Result<std::path::PathBuf> {
    let path = dir.path().join("store");
    let mut store = RecordStore::open(&path, &StoreOptions::for_insert())?;
    for id in 1..=3 {
        store.create_node(NodeId(id), None)?;
    }
    store.create_relationship(NodeId(0), NodeId(1), RelType::Favorite, None)?;
    store.create_relationship(NodeId(2), NodeId(1), RelType::Favorite, None)?;
    store.create_relationship(NodeId(3), NodeId(3), RelType::Next, None)?;
    store.close()?;
    Ok(path)
}

#[test]
fn reopen_preserves_nodes_and_chains() -> Result<()> {
    let dir = TempDir::new()?;
    let path = seeded(&dir)?;

    let store = RecordStore::open(&path, &StoreOptions::for_read())?;
    assert_eq!(store.node_count(), 4);
    assert_eq!(store.relationship_count(), 3);
    assert_eq!(store.reference_node()?, REFERENCE_NODE);

    let book: Vec<_> = store
        .relationships(NodeId(1), RelType::Favorite, Dir::In)?
        .map(|rel| rel.src)
        .collect();
    assert_eq!(book, [NodeId(2), NodeId(0)]);

    let looped = store.single_relationship(NodeId(3), RelType::Next, Dir::Both)?;
    assert_eq!((looped.src, looped.dst), (NodeId(3), NodeId(3)));
    store.close()?;
    Ok(())
}

#[test]
fn read_only_store_rejects_writes() -> Result<()> {
    let dir = TempDir::new()?;
    let path = seeded(&dir)?;

    let mut store = RecordStore::open(&path, &StoreOptions::for_read())?;
    assert!(matches!(
        store.create_node(NodeId(9), None),
        Err(BenchError::ReadOnly)
    ));
    assert!(matches!(
        store.create_relationship(NodeId(1), NodeId(2), RelType::Next, None),
        Err(BenchError::ReadOnly)
    ));
    Ok(())
}

#[test]
fn flipped_body_byte_is_corruption() -> Result<()> {
    let dir = TempDir::new()?;
    let path = seeded(&dir)?;

    let rel_file = path.join("relstore.db");
    let mut bytes = fs::read(&rel_file)?;
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;
    fs::write(&rel_file, bytes)?;

    let err = RecordStore::open(&path, &StoreOptions::for_read()).unwrap_err();
    assert!(matches!(err, BenchError::Corruption(_)), "{err}");
    Ok(())
}

#[test]
fn truncated_file_is_corruption() -> Result<()> {
    let dir = TempDir::new()?;
    let path = seeded(&dir)?;

    let node_file = path.join("nodestore.db");
    let bytes = fs::read(&node_file)?;
    fs::write(&node_file, &bytes[..bytes.len() - 4])?;

    assert!(matches!(
        RecordStore::open(&path, &StoreOptions::for_read()),
        Err(BenchError::Corruption(_))
    ));
    Ok(())
}

#[test]
fn props_round_trip() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("props");

    let mut props = Props::new();
    props.insert("title".into(), PropValue::Str("Dune".into()));
    props.insert("pages".into(), PropValue::Int(412));
    let mut weight = Props::new();
    weight.insert("weight".into(), PropValue::Float(0.5));

    let mut store = RecordStore::open(&path, &StoreOptions::for_insert())?;
    store.create_node(NodeId(1), Some(&props))?;
    let edge = store.create_relationship(NodeId(0), NodeId(1), RelType::Favorite, Some(&weight))?;
    store.close()?;

    let store = RecordStore::open(&path, &StoreOptions::for_read())?;
    assert_eq!(store.node_props(NodeId(1)), Some(&props));
    assert_eq!(store.node_props(NodeId(0)), None);
    assert_eq!(store.relationship_props(edge), Some(&weight));
    Ok(())
}

#[test]
fn truncate_wipes_previous_store() -> Result<()> {
    let dir = TempDir::new()?;
    let path = seeded(&dir)?;

    let store = RecordStore::open(&path, &StoreOptions::for_insert().truncate(true))?;
    assert_eq!(store.node_count(), 1);
    assert_eq!(store.relationship_count(), 0);
    store.close()?;

    let store = RecordStore::open(&path, &StoreOptions::for_read())?;
    assert_eq!(store.node_count(), 1);
    Ok(())
}

#[test]
fn dropped_store_still_flushes() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("dropped");
    {
        let mut store = RecordStore::open(&path, &StoreOptions::for_insert())?;
        store.create_node(NodeId(1), None)?;
    }
    let store = RecordStore::open(&path, &StoreOptions::for_read())?;
    assert!(store.contains_node(NodeId(1)));
    Ok(())
}
