//! Bulk loaders for the two benchmark topologies.
//!
//! Both loaders write every node before any relationship, matching the
//! insert-only contract of the store: endpoints must exist first.

use std::fmt;
use std::time::{Duration, Instant};

use rand::Rng;
use serde::Serialize;
use tracing::info;

use crate::error::{BenchError, Result};
use crate::progress::ProgressReporter;
use crate::storage::StorageAdapter;
use crate::types::{NodeId, RelType};

/// Order in which user→book edges are written.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
pub enum Distribution {
    /// Primary root edge on the first user slot; users favor their own book.
    Optimistic,
    /// Primary root edge on a random slot; users favor a rotated book.
    Scattered,
}

impl Distribution {
    /// Maps the `optimistic` flag onto a mode.
    pub fn from_optimistic(optimistic: bool) -> Self {
        if optimistic {
            Distribution::Optimistic
        } else {
            Distribution::Scattered
        }
    }
}

/// Sizes of a users/books graph and its id numbering.
///
/// Node `0` is the root, books take ids `1..=books`, and each book owns a
/// private block of `users_per_book` user ids after the last book.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
pub struct BipartiteLayout {
    /// Number of book nodes.
    pub books: u64,
    /// Number of users per book.
    pub users_per_book: u64,
}

impl BipartiteLayout {
    /// Validates both sizes.
    pub fn new(books: u64, users_per_book: u64) -> Result<Self> {
        if books == 0 {
            return Err(BenchError::invalid_size("number of books must be positive"));
        }
        if users_per_book == 0 {
            return Err(BenchError::invalid_size(
                "number of users per book must be positive",
            ));
        }
        books
            .checked_mul(users_per_book)
            .and_then(|users| users.checked_add(books))
            .ok_or_else(|| BenchError::invalid_size("users/books graph overflows u64 ids"))?;
        Ok(Self {
            books,
            users_per_book,
        })
    }

    /// Id of book `book` (zero-based).
    pub fn book_id(&self, book: u64) -> NodeId {
        NodeId(1 + book)
    }

    /// Id of user slot `user` in book `book`'s block.
    pub fn user_id(&self, book: u64, user: u64) -> NodeId {
        NodeId(1 + self.books + book * self.users_per_book + user)
    }

    /// Users in the whole graph, one favorite edge each.
    pub fn total_users(&self) -> u64 {
        self.books * self.users_per_book
    }

    /// Nodes written by the loader, root excluded.
    pub fn total_nodes(&self) -> u64 {
        self.books + self.total_users()
    }

    /// Relationships written by the loader: one root edge per book plus one per user.
    pub fn total_relationships(&self) -> u64 {
        self.books + self.total_users()
    }
}

/// Counts and timings of one bulk load.
#[derive(Clone, Debug, Default, Serialize)]
pub struct LoadStats {
    /// Nodes created by the loader.
    pub nodes: u64,
    /// Relationships created by the loader.
    pub relationships: u64,
    /// Time spent creating nodes.
    pub node_time: Duration,
    /// Time spent creating relationships.
    pub relationship_time: Duration,
}

impl LoadStats {
    /// Total load time.
    pub fn elapsed(&self) -> Duration {
        self.node_time + self.relationship_time
    }

    /// Nodes created per millisecond of node phase.
    pub fn nodes_per_ms(&self) -> f64 {
        per_ms(self.nodes, self.node_time)
    }

    /// Relationships created per millisecond of relationship phase.
    pub fn relationships_per_ms(&self) -> f64 {
        per_ms(self.relationships, self.relationship_time)
    }
}

impl fmt::Display for LoadStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Inserted {} nodes in {} seconds.",
            self.nodes,
            self.node_time.as_secs_f64()
        )?;
        writeln!(f, "That is {} nodes per millisecond.", self.nodes_per_ms())?;
        writeln!(
            f,
            "Inserted {} relationships in {} seconds.",
            self.relationships,
            self.relationship_time.as_secs_f64()
        )?;
        write!(
            f,
            "That is {} relationships per millisecond.",
            self.relationships_per_ms()
        )
    }
}

pub(crate) fn per_ms(count: u64, elapsed: Duration) -> f64 {
    count as f64 / (elapsed.as_secs_f64() * 1_000.0)
}

/// Checks a configured ring length and converts it to a node count.
pub fn ring_length(length: i64) -> Result<u64> {
    u64::try_from(length)
        .ok()
        .filter(|&n| n > 0)
        .ok_or_else(|| BenchError::invalid_size(format!("ring length must be positive, got {length}")))
}

/// Builds a single NEXT cycle over nodes `0..length`.
///
/// Node `0` is the store's reference node and already exists; the loader
/// creates `1..length` and then links `i -> (i + 1) % length`.
pub fn build_ring<S: StorageAdapter>(store: &mut S, length: i64) -> Result<LoadStats> {
    let length = ring_length(length)?;
    let root = store.reference_node()?;
    if root != NodeId(0) {
        return Err(BenchError::StoreUninitialized);
    }

    info!(length, "inserting ring");
    let start = Instant::now();
    for id in 1..length {
        store.create_node(NodeId(id), None)?;
    }
    let node_time = start.elapsed();

    let start = Instant::now();
    for id in 0..length {
        store.create_relationship(NodeId(id), NodeId((id + 1) % length), RelType::Next, None)?;
    }
    let stats = LoadStats {
        nodes: length,
        relationships: length,
        node_time,
        relationship_time: start.elapsed(),
    };
    info!(
        nodes = stats.nodes,
        relationships = stats.relationships,
        elapsed_ms = stats.elapsed().as_millis() as u64,
        "ring inserted"
    );
    Ok(stats)
}

/// Builds the users/books graph hanging off the store's reference node.
///
/// Sizes are checked again before the store is touched, so a hand-built
/// layout with a zero size fails with `InvalidSize`.
///
/// For every book one random `offset` in `0..users_per_book` is drawn. It
/// picks the user slot that carries the root's primary edge in scattered mode
/// and rotates the book every user of that block favors, so relationships to
/// one book end up spread over the whole relationship store the way
/// incremental writes would leave them.
pub fn build_bipartite<S, R, P>(
    store: &mut S,
    layout: BipartiteLayout,
    mode: Distribution,
    rng: &mut R,
    mut progress: P,
) -> Result<LoadStats>
where
    S: StorageAdapter,
    R: Rng,
    P: ProgressReporter,
{
    let layout = BipartiteLayout::new(layout.books, layout.users_per_book)?;
    let root = store.reference_node()?;
    let BipartiteLayout {
        books,
        users_per_book,
    } = layout;

    let total = layout.total_nodes();
    info!(nodes = total, ?mode, "inserting nodes");
    progress.announce("Inserting nodes...");
    let start = Instant::now();
    for index in 0..total {
        store.create_node(NodeId(1 + index), None)?;
        progress.report(index, total, start);
    }
    let node_time = start.elapsed();

    let total = layout.total_users();
    info!(relationships = total + books, "inserting relationships");
    progress.announce("Inserting relationships...");
    let start = Instant::now();
    let mut count = 0u64;
    let mut relationships = 0u64;
    for book in 0..books {
        let offset = rng.gen_range(0..users_per_book);
        for user in 0..users_per_book {
            let primary = match mode {
                Distribution::Optimistic => user == 0,
                Distribution::Scattered => user == offset,
            };
            if primary {
                store.create_relationship(root, layout.book_id(book), RelType::Favorite, None)?;
                relationships += 1;
            }
            let target = match mode {
                Distribution::Optimistic => book,
                Distribution::Scattered => (offset + book) % books,
            };
            store.create_relationship(
                layout.user_id(book, user),
                layout.book_id(target),
                RelType::Favorite,
                None,
            )?;
            relationships += 1;
            progress.report(count, total, start);
            count += 1;
        }
    }

    Ok(LoadStats {
        nodes: layout.total_nodes(),
        relationships,
        node_time,
        relationship_time: start.elapsed(),
    })
}
