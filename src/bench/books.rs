//! Users/books benchmark: build the bipartite graph, then count every user
//! two hops away from the root.

use tracing::info;

use super::{run_count, LoadReport, Outcome, ThroughputReport, Topology};
use crate::config::{BooksConfig, Settings};
use crate::error::Result;
use crate::loader::build_bipartite;
use crate::storage::RecordStore;
use crate::traversal::benchmark_bipartite;

/// Builds the users/books graph described by `settings` in a fresh store.
pub fn construct(settings: &Settings) -> Result<LoadReport> {
    let config = BooksConfig::resolve(settings)?;
    info!(
        books = config.layout.books,
        users_per_book = config.layout.users_per_book,
        optimistic = config.optimistic,
        "building users/books graph"
    );

    let mut rng = config.rng();
    let mut progress = config.progress_reporter("inserting");
    let banner = config.to_string();
    let announced = progress.announce(&banner);
    let mut store = RecordStore::open(&config.store.dir, &config.store.insert_options())?;
    let stats = build_bipartite(
        &mut store,
        config.layout,
        config.distribution(),
        &mut rng,
        progress,
    )?;
    store.close()?;

    Ok(LoadReport {
        topology: Topology::Books,
        banner: (!announced).then_some(banner),
        store_dir: config.store.dir,
        stats,
    })
}

/// Walks a previously built users/books graph `numTraversals` times.
pub fn traverse(settings: &Settings) -> Result<ThroughputReport> {
    let config = BooksConfig::resolve(settings)?;
    let runs = run_count("numTraversals", config.num_traversals)?;

    let store = RecordStore::open(&config.store.dir, &config.store.read_options())?;
    let samples = benchmark_bipartite(
        &store,
        config.layout,
        runs,
        config.progress_reporter("traversing"),
    )?;
    store.close()?;

    Ok(ThroughputReport {
        topology: Topology::Books,
        banner: Some(config.to_string()),
        store_dir: config.store.dir,
        runs: samples.into_iter().map(Into::into).collect(),
    })
}

pub(super) fn create_entry(settings: &Settings) -> Result<Outcome> {
    construct(settings).map(Outcome::Load)
}

pub(super) fn traverse_entry(settings: &Settings) -> Result<Outcome> {
    traverse(settings).map(Outcome::Traversal)
}
