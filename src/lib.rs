//! Insert and traversal micro-benchmarks for a persisted node/relationship
//! store.
//!
//! Two graph shapes are measured. The ring is a single cycle of NEXT
//! relationships walked in timed windows; the users/books graph hangs books
//! off a root node and users off the books, and is walked two hops deep.
//! Each benchmark has a `create` phase that bulk-loads a fresh store and a
//! `traverse` phase that reopens it read-only.

#![warn(missing_docs)]

pub mod bench;
pub mod config;
pub mod error;
pub mod loader;
pub mod logging;
pub mod progress;
pub mod storage;
pub mod traversal;
pub mod types;

pub use bench::{LoadReport, Outcome, Registry, ThroughputReport, Topology};
pub use config::{BooksConfig, ConfigError, RingConfig, Settings};
pub use error::{BenchError, Result};
pub use loader::{build_bipartite, build_ring, BipartiteLayout, Distribution, LoadStats};
pub use storage::{RecordStore, StorageAdapter, StoreOptions};
pub use traversal::{benchmark_bipartite, benchmark_ring, FavoriteWalk};
pub use types::{Dir, EdgeId, NodeId, RelType, Relationship};
