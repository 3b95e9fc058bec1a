#![allow(missing_docs)]

use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use hopbench::bench::books;
use hopbench::progress::Silent;
use hopbench::{
    benchmark_bipartite, build_bipartite, BipartiteLayout, Dir, Distribution, FavoriteWalk,
    NodeId, RecordStore, RelType, Result, Settings, StorageAdapter, StoreOptions, Topology,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tempfile::TempDir;

fn load(path: &Path, layout: BipartiteLayout, mode: Distribution, seed: u64) -> Result<RecordStore> {
    let mut store = RecordStore::open(path, &StoreOptions::for_insert())?;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    build_bipartite(&mut store, layout, mode, &mut rng, Silent)?;
    store.close()?;
    RecordStore::open(path, &StoreOptions::for_read())
}

/// Every relationship as `(src, dst)`, sorted.
fn edges(store: &RecordStore) -> BTreeSet<(NodeId, NodeId)> {
    store.all_relationships().map(|rel| (rel.src, rel.dst)).collect()
}

/// In-degree of every book, sorted.
fn book_degrees(store: &RecordStore, layout: BipartiteLayout) -> Result<Vec<usize>> {
    let mut degrees = Vec::new();
    for book in 0..layout.books {
        let rels = store.relationships(layout.book_id(book), RelType::Favorite, Dir::In)?;
        degrees.push(rels.count());
    }
    degrees.sort_unstable();
    Ok(degrees)
}

#[test]
fn counts_match_the_layout() -> Result<()> {
    let dir = TempDir::new()?;
    let layout = BipartiteLayout::new(4, 6)?;
    let store = load(&dir.path().join("g"), layout, Distribution::Scattered, 3)?;

    assert_eq!(store.node_count(), 1 + 4 * (1 + 6));
    assert_eq!(store.relationship_count(), 4 * (1 + 6));

    let root_books = store.relationships(NodeId(0), RelType::Favorite, Dir::Out)?;
    let mut targets: Vec<_> = root_books.map(|rel| rel.dst).collect();
    targets.sort();
    assert_eq!(targets, (1..=4).map(NodeId).collect::<Vec<_>>());

    for book in 0..layout.books {
        for user in 0..layout.users_per_book {
            let out = store.relationships(layout.user_id(book, user), RelType::Favorite, Dir::Out)?;
            assert_eq!(out.count(), 1);
        }
    }
    Ok(())
}

#[test]
fn optimistic_walk_visits_every_user_once() -> Result<()> {
    let dir = TempDir::new()?;
    let layout = BipartiteLayout::new(5, 7)?;
    let store = load(&dir.path().join("g"), layout, Distribution::Optimistic, 0)?;

    let users = FavoriteWalk::new(&store, NodeId(0))?.collect::<Result<Vec<_>>>()?;
    let distinct: HashSet<_> = users.iter().copied().collect();
    assert_eq!(users.len(), 35);
    assert_eq!(distinct.len(), 35);
    assert!(!distinct.contains(&NodeId(0)));
    for book in 0..layout.books {
        for user in 0..layout.users_per_book {
            assert!(distinct.contains(&layout.user_id(book, user)));
        }
    }
    Ok(())
}

#[test]
fn single_user_per_book_is_valid() -> Result<()> {
    let dir = TempDir::new()?;
    let layout = BipartiteLayout::new(3, 1)?;
    let store = load(&dir.path().join("g"), layout, Distribution::Scattered, 9)?;

    let samples = benchmark_bipartite(&store, layout, 2, Silent)?;
    for sample in samples {
        assert_eq!(sample.users, 3);
        assert_eq!(sample.books, 3);
        assert_eq!(sample.hops(), 6);
    }
    Ok(())
}

#[test]
fn optimistic_loads_are_identical_across_paths() -> Result<()> {
    let dir = TempDir::new()?;
    let layout = BipartiteLayout::new(3, 4)?;
    let a = load(&dir.path().join("a"), layout, Distribution::Optimistic, 1)?;
    let b = load(&dir.path().join("b"), layout, Distribution::Optimistic, 2)?;
    assert_eq!(edges(&a), edges(&b));
    Ok(())
}

#[test]
fn scattered_loads_share_shape() -> Result<()> {
    let dir = TempDir::new()?;
    let layout = BipartiteLayout::new(4, 5)?;
    let a = load(&dir.path().join("a"), layout, Distribution::Scattered, 1)?;
    let b = load(&dir.path().join("b"), layout, Distribution::Scattered, 2)?;
    let c = load(&dir.path().join("c"), layout, Distribution::Scattered, 1)?;

    assert_eq!(a.relationship_count(), b.relationship_count());
    assert_eq!(a.node_count(), b.node_count());
    // Every block of users lands on one book, so in-degrees are whole blocks
    // plus the root edge.
    for store in [&a, &b] {
        let degrees = book_degrees(store, layout)?;
        assert_eq!(degrees.iter().sum::<usize>(), 4 * 5 + 4);
        assert!(degrees.iter().all(|d| (d - 1) % 5 == 0));
    }
    assert_eq!(edges(&a), edges(&c));
    Ok(())
}

#[test]
fn two_books_three_users_gives_eight_hops() -> Result<()> {
    let dir = TempDir::new()?;
    let layout = BipartiteLayout::new(2, 3)?;
    let store = load(&dir.path().join("g"), layout, Distribution::Optimistic, 0)?;

    let samples = benchmark_bipartite(&store, layout, 1, Silent)?;
    assert_eq!(samples[0].users, 6);
    assert_eq!(samples[0].expected_users, 6);
    assert_eq!(samples[0].hops(), 8);
    assert!(samples[0].hops_per_ms() > 0.0);
    Ok(())
}

#[test]
fn construct_then_traverse_through_settings() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("books");
    let settings = Settings::new("books")
        .with_override("storeDir", path.display().to_string())
        .with_override("numBooks", "10")
        .with_override("numUsers", "20")
        .with_override("minFavorites", "2")
        .with_override("maxFavorites", "5")
        .with_override("numTraversals", "3")
        .with_override("renderProgression", "false")
        .with_override("seed", "42");

    let load = books::construct(&settings)?;
    assert_eq!(load.topology, Topology::Books);
    assert_eq!(load.stats.nodes, 3 * (1 + 6));
    let text = load.to_string();
    assert!(text.starts_with("Users and Books traversal example, EXPECTED type graph.\n"));
    assert!(text.contains("Inserted 21 nodes in "));
    assert!(text.contains("Inserted 21 relationships in "));

    let report = books::traverse(&settings)?;
    assert_eq!(report.runs.len(), 3);
    for run in &report.runs {
        assert_eq!(run.users, Some(18));
        assert_eq!(run.expected_users, Some(18));
        assert_eq!(run.books, Some(3));
        assert_eq!(run.hops, 21);
    }
    assert_eq!(report.to_string().matches("Counted 18 (of 18) users in ").count(), 3);
    Ok(())
}

#[test]
fn banner_is_shown_before_loading_when_progress_renders() -> Result<()> {
    let dir = TempDir::new()?;
    let settings = Settings::new("books")
        .with_override("storeDir", dir.path().join("books").display().to_string())
        .with_override("numBooks", "4")
        .with_override("numUsers", "8")
        .with_override("kind", "MIN")
        .with_override("minFavorites", "2")
        .with_override("progressStyle", "lines");

    let load = books::construct(&settings)?;
    assert_eq!(load.banner, None);
    assert!(load.to_string().starts_with("Inserted 10 nodes in "));

    let quiet = books::construct(&settings.with_override("renderProgression", "false"))?;
    assert!(quiet
        .banner
        .is_some_and(|banner| banner.starts_with("Users and Books traversal example, MIN type")));
    Ok(())
}
