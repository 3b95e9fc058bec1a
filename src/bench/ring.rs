//! Ring benchmark: build a NEXT cycle, then walk it in timed windows.

use std::time::Duration;

use tracing::info;

use super::{run_count, LoadReport, Outcome, ThroughputReport, Topology};
use crate::config::{RingConfig, Settings};
use crate::error::{BenchError, Result};
use crate::loader::{build_ring, ring_length};
use crate::storage::RecordStore;
use crate::traversal::benchmark_ring;

/// Builds the ring described by `settings` in a fresh store.
pub fn construct(settings: &Settings) -> Result<LoadReport> {
    let config = RingConfig::resolve(settings)?;
    ring_length(config.length)?;

    let mut store = RecordStore::open(&config.store.dir, &config.store.insert_options())?;
    let stats = build_ring(&mut store, config.length)?;
    store.close()?;

    Ok(LoadReport {
        topology: Topology::Ring,
        banner: None,
        store_dir: config.store.dir,
        stats,
    })
}

/// Walks a previously built ring for `runs` windows of `seconds` each.
pub fn traverse(settings: &Settings) -> Result<ThroughputReport> {
    let config = RingConfig::resolve(settings)?;
    let runs = run_count("runs", config.runs)?;
    let budget = window(config.seconds)?;

    let store = RecordStore::open(&config.store.dir, &config.store.read_options())?;
    info!(runs, seconds = config.seconds, nodes = store.node_count(), "walking ring");
    let samples = benchmark_ring(&store, runs, budget)?;
    store.close()?;

    Ok(ThroughputReport {
        topology: Topology::Ring,
        banner: None,
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

fn window(seconds: i64) -> Result<Duration> {
    u64::try_from(seconds)
        .ok()
        .filter(|&s| s > 0)
        .map(Duration::from_secs)
        .ok_or_else(|| BenchError::invalid_size(format!("seconds must be positive, got {seconds}")))
}
