//! Benchmark entry points and the reports they produce.
//!
//! Every entry point resolves its configuration snapshot, opens the store for
//! exactly one phase and closes it again before returning. Reports are plain
//! data; the binary decides whether they are printed as text or JSON.

pub mod books;
pub mod registry;
pub mod ring;

pub use registry::{Benchmark, Entry, Handler, Registry};

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use crate::error::{BenchError, Result};
use crate::loader::LoadStats;
use crate::traversal::{BipartiteSample, RingSample};

/// Graph shape a report belongs to.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Topology {
    /// NEXT cycle.
    Ring,
    /// Root → books ← users.
    Books,
}

/// Result of a `create` entry point.
#[derive(Clone, Debug, Serialize)]
pub struct LoadReport {
    /// Graph that was built.
    pub topology: Topology,
    /// Description of the configuration, printed first. `None` once it was
    /// already shown ahead of loading.
    pub banner: Option<String>,
    /// Store the graph was written to.
    pub store_dir: PathBuf,
    /// Counts and timings.
    pub stats: LoadStats,
}

impl fmt::Display for LoadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(banner) = &self.banner {
            writeln!(f, "{banner}")?;
        }
        match self.topology {
            Topology::Ring => write!(
                f,
                "Inserted {} nodes and {} relationships in {:.3} seconds",
                self.stats.nodes,
                self.stats.relationships,
                self.stats.elapsed().as_secs_f64()
            ),
            Topology::Books => write!(f, "{}", self.stats),
        }
    }
}

/// One run of a traversal, flattened for output.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RunSummary {
    /// Relationships followed.
    pub hops: u64,
    /// Wall-clock milliseconds.
    pub elapsed_ms: f64,
    /// Throughput.
    pub hops_per_ms: f64,
    /// Users counted (users/books only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users: Option<u64>,
    /// Users the layout promises (users/books only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_users: Option<u64>,
    /// Books visited (users/books only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub books: Option<u64>,
}

impl From<RingSample> for RunSummary {
    fn from(sample: RingSample) -> Self {
        Self {
            hops: sample.hops,
            elapsed_ms: millis(sample.elapsed),
            hops_per_ms: sample.hops_per_ms(),
            users: None,
            expected_users: None,
            books: None,
        }
    }
}

impl From<BipartiteSample> for RunSummary {
    fn from(sample: BipartiteSample) -> Self {
        Self {
            hops: sample.hops(),
            elapsed_ms: millis(sample.elapsed),
            hops_per_ms: sample.hops_per_ms(),
            users: Some(sample.users),
            expected_users: Some(sample.expected_users),
            books: Some(sample.books),
        }
    }
}

fn millis(elapsed: Duration) -> f64 {
    elapsed.as_secs_f64() * 1_000.0
}

/// Result of a `traverse` entry point.
#[derive(Clone, Debug, Serialize)]
pub struct ThroughputReport {
    /// Graph that was walked.
    pub topology: Topology,
    /// Description of the configuration, printed first.
    pub banner: Option<String>,
    /// Store the graph was read from.
    pub store_dir: PathBuf,
    /// One entry per run, in order.
    pub runs: Vec<RunSummary>,
}

impl ThroughputReport {
    /// Mean throughput over every run; zero without runs.
    pub fn mean_hops_per_ms(&self) -> f64 {
        if self.runs.is_empty() {
            return 0.0;
        }
        self.runs.iter().map(|run| run.hops_per_ms).sum::<f64>() / self.runs.len() as f64
    }
}

impl fmt::Display for ThroughputReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut lines = Vec::new();
        if let Some(banner) = &self.banner {
            lines.push(banner.clone());
        }
        for run in &self.runs {
            match self.topology {
                Topology::Ring => {
                    lines.push(format!("Traversal speed {:.3} hops/ms", run.hops_per_ms));
                }
                Topology::Books => {
                    let secs = run.elapsed_ms / 1_000.0;
                    lines.push("Traversing graph".to_string());
                    lines.push(format!(
                        "Counted {} (of {}) users in {} seconds.",
                        run.users.unwrap_or_default(),
                        run.expected_users.unwrap_or_default(),
                        secs
                    ));
                    lines.push(format!("Traversed {} relationships in {} seconds.", run.hops, secs));
                    lines.push(format!(
                        "That is {} relationships per millisecond.",
                        run.hops_per_ms
                    ));
                }
            }
        }
        f.write_str(&lines.join("\n"))
    }
}

/// What an entry point returns through the registry.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Outcome {
    /// A `create` run.
    Load(LoadReport),
    /// A `traverse` run.
    Traversal(ThroughputReport),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Load(report) => report.fmt(f),
            Outcome::Traversal(report) => report.fmt(f),
        }
    }
}

/// Converts a configured run count.
pub(crate) fn run_count(key: &str, runs: i64) -> Result<u32> {
    u32::try_from(runs)
        .ok()
        .filter(|&n| n > 0)
        .ok_or_else(|| BenchError::invalid_size(format!("{key} must be a positive count, got {runs}")))
}
