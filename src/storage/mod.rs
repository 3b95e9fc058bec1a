//! Persistent node/relationship storage.
//!
//! The benchmarks only talk to storage through [`StorageAdapter`]; the bundled
//! [`RecordStore`] implements it over fixed-size record files.

mod header;
mod options;
mod record;
mod store;

pub use options::StoreOptions;
pub use store::{RecordStore, RelationshipCursor, MAX_NODE_ID, REFERENCE_NODE};

use crate::error::{BenchError, Result};
use crate::types::{Dir, EdgeId, NodeId, Props, RelType, Relationship};

/// Minimal storage surface the loaders and traversals need.
pub trait StorageAdapter {
    /// Lazy relationship sequence returned by [`StorageAdapter::relationships`].
    type Relationships<'a>: Iterator<Item = Relationship> + 'a
    where
        Self: 'a;

    /// Stores a node under a loader-chosen id. Fails with `DuplicateId`.
    fn create_node(&mut self, id: NodeId, props: Option<&Props>) -> Result<()>;

    /// Stores a typed relationship. Fails with `UnknownNode` for absent endpoints.
    fn create_relationship(
        &mut self,
        from: NodeId,
        to: NodeId,
        ty: RelType,
        props: Option<&Props>,
    ) -> Result<EdgeId>;

    /// The designated root. Fails with `StoreUninitialized`.
    fn reference_node(&self) -> Result<NodeId>;

    /// Relationships of `node` with the given type and direction.
    fn relationships(
        &self,
        node: NodeId,
        ty: RelType,
        dir: Dir,
    ) -> Result<Self::Relationships<'_>>;

    /// The only relationship matching the filter, or `BrokenTraversal` when
    /// there is none or more than one.
    fn single_relationship(&self, node: NodeId, ty: RelType, dir: Dir) -> Result<Relationship> {
        let mut rels = self.relationships(node, ty, dir)?;
        let first = rels.next().ok_or(BenchError::BrokenTraversal {
            node,
            reason: "no matching relationship",
        })?;
        if rels.next().is_some() {
            return Err(BenchError::BrokenTraversal {
                node,
                reason: "more than one matching relationship",
            });
        }
        Ok(first)
    }
}
