//! Timed walks over the loaded graphs.
//!
//! Neither walk keeps a visited set. The ring is a single cycle, and in the
//! users/books graph the only node reachable twice is the root, which the
//! two-hop iterator filters with one identity check.

use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::debug;

use crate::error::{BenchError, Result};
use crate::loader::{per_ms, BipartiteLayout};
use crate::progress::ProgressReporter;
use crate::storage::StorageAdapter;
use crate::types::{Dir, NodeId, RelType};

/// Hops taken between two clock reads in the ring walk.
pub const HOPS_PER_CLOCK_CHECK: u64 = 100;

/// One timed run of the ring walk.
#[derive(Copy, Clone, Debug, Serialize)]
pub struct RingSample {
    /// Hops completed inside the run.
    pub hops: u64,
    /// Wall-clock time of the run.
    pub elapsed: Duration,
}

impl RingSample {
    /// Throughput of the run.
    pub fn hops_per_ms(&self) -> f64 {
        per_ms(self.hops, self.elapsed)
    }
}

/// One full pass of the users/books walk.
#[derive(Copy, Clone, Debug, Serialize)]
pub struct BipartiteSample {
    /// Users yielded by the walk.
    pub users: u64,
    /// Users the layout says exist.
    pub expected_users: u64,
    /// Root→book hops taken on the outer level.
    pub books: u64,
    /// Wall-clock time of the pass.
    pub elapsed: Duration,
}

impl BipartiteSample {
    /// Relationships traversed: every user plus the root→book hops.
    pub fn hops(&self) -> u64 {
        self.users + self.books
    }

    /// Throughput of the pass.
    pub fn hops_per_ms(&self) -> f64 {
        per_ms(self.hops(), self.elapsed)
    }
}

/// Runs `runs` timed windows of `budget` each along the NEXT ring.
///
/// The walk starts at the reference node and keeps its position across runs;
/// only the clock restarts. Within a run the clock is read once every
/// [`HOPS_PER_CLOCK_CHECK`] hops, so hop counts are multiples of it.
pub fn benchmark_ring<S: StorageAdapter>(
    store: &S,
    runs: u32,
    budget: Duration,
) -> Result<Vec<RingSample>> {
    if runs == 0 {
        return Err(BenchError::invalid_size("run count must be at least 1"));
    }
    if budget.is_zero() {
        return Err(BenchError::invalid_size("time budget must be positive"));
    }

    let mut node = store.reference_node()?;
    let mut samples = Vec::with_capacity(runs as usize);
    for run in 0..runs {
        let start = Instant::now();
        let mut hops = 0u64;
        while start.elapsed() < budget {
            for _ in 0..HOPS_PER_CLOCK_CHECK {
                node = store
                    .single_relationship(node, RelType::Next, Dir::Out)?
                    .dst;
            }
            hops += HOPS_PER_CLOCK_CHECK;
        }
        let sample = RingSample {
            hops,
            elapsed: start.elapsed(),
        };
        debug!(run, hops, at = %node, "ring run finished");
        samples.push(sample);
    }
    Ok(samples)
}

/// Lazy two-hop walk: every FAVORITE neighbor of every FAVORITE neighbor of
/// `root`, except `root` itself.
///
/// State is the outer cursor over the root's relationships, the inner cursor
/// over the current book's relationships, and the excluded root. Each step
/// drains the inner cursor first and only then advances the outer one.
pub struct FavoriteWalk<'a, S: StorageAdapter + 'a> {
    store: &'a S,
    root: NodeId,
    outer: S::Relationships<'a>,
    inner: Option<(NodeId, S::Relationships<'a>)>,
    books: u64,
    skipped: u64,
}

impl<'a, S: StorageAdapter + 'a> FavoriteWalk<'a, S> {
    /// Starts a fresh walk from `root`.
    pub fn new(store: &'a S, root: NodeId) -> Result<Self> {
        Ok(Self {
            store,
            root,
            outer: store.relationships(root, RelType::Favorite, Dir::Both)?,
            inner: None,
            books: 0,
            skipped: 0,
        })
    }

    /// Outer hops taken so far.
    pub fn books_visited(&self) -> u64 {
        self.books
    }

    /// Times the root showed up on the inner level and was dropped.
    pub fn roots_skipped(&self) -> u64 {
        self.skipped
    }
}

impl<'a, S: StorageAdapter + 'a> Iterator for FavoriteWalk<'a, S> {
    type Item = Result<NodeId>;

    fn next(&mut self) -> Option<Result<NodeId>> {
        loop {
            if let Some((book, rels)) = self.inner.as_mut() {
                let book = *book;
                for rel in rels.by_ref() {
                    let user = rel.other(book);
                    if user != self.root {
                        return Some(Ok(user));
                    }
                    self.skipped += 1;
                }
                self.inner = None;
            }

            let rel = self.outer.next()?;
            let book = rel.other(self.root);
            self.books += 1;
            match self
                .store
                .relationships(book, RelType::Favorite, Dir::Both)
            {
                Ok(rels) => self.inner = Some((book, rels)),
                Err(err) => return Some(Err(err)),
            }
        }
    }
}

/// Counts every user reachable through the books, `runs` times.
///
/// Progress is reported per user against the layout's expected user count.
pub fn benchmark_bipartite<S, P>(
    store: &S,
    layout: BipartiteLayout,
    runs: u32,
    mut progress: P,
) -> Result<Vec<BipartiteSample>>
where
    S: StorageAdapter,
    P: ProgressReporter,
{
    if runs == 0 {
        return Err(BenchError::invalid_size("run count must be at least 1"));
    }
    let root = store.reference_node()?;
    let expected = layout.total_users();
    let mut samples = Vec::with_capacity(runs as usize);
    for run in 0..runs {
        let start = Instant::now();
        let mut walk = FavoriteWalk::new(store, root)?;
        let mut users = 0u64;
        for user in walk.by_ref() {
            user?;
            progress.report(users, expected, start);
            users += 1;
        }
        let sample = BipartiteSample {
            users,
            expected_users: expected,
            books: walk.books_visited(),
            elapsed: start.elapsed(),
        };
        debug!(run, users, books = sample.books, "users/books run finished");
        samples.push(sample);
    }
    Ok(samples)
}
