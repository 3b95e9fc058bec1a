//! Identifiers and handles shared by the store, loaders and traversals.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{BenchError, Result};

/// Loader-assigned node handle.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
pub struct NodeId(pub u64);

/// Store-assigned relationship handle, dense in creation order.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
pub struct EdgeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Relationship types used by the two benchmark topologies.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum RelType {
    /// Ring successor edge.
    Next = 0x01,
    /// User or root pointing at a book.
    Favorite = 0x02,
}

impl RelType {
    /// Decodes the on-disk type tag.
    pub fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            0x01 => Ok(RelType::Next),
            0x02 => Ok(RelType::Favorite),
            other => Err(BenchError::Corruption(format!(
                "unknown relationship type: 0x{other:02X}"
            ))),
        }
    }

    /// On-disk type tag.
    pub const fn to_byte(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for RelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelType::Next => f.write_str("NEXT"),
            RelType::Favorite => f.write_str("FAVORITE"),
        }
    }
}

/// Direction filter for relationship enumeration, relative to the queried node.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Dir {
    /// Relationships starting at the node.
    Out,
    /// Relationships ending at the node.
    In,
    /// Either endpoint. Self-loops are reported once.
    Both,
}

/// A stored relationship.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Relationship {
    /// Relationship id.
    pub id: EdgeId,
    /// Start node.
    pub src: NodeId,
    /// End node.
    pub dst: NodeId,
    /// Relationship type.
    pub ty: RelType,
}

impl Relationship {
    /// The endpoint opposite to `node`. For self-loops this is `node` itself.
    pub fn other(&self, node: NodeId) -> NodeId {
        if self.src == node {
            self.dst
        } else {
            self.src
        }
    }

    pub(crate) fn matches(&self, node: NodeId, dir: Dir) -> bool {
        match dir {
            Dir::Out => self.src == node,
            Dir::In => self.dst == node,
            Dir::Both => self.src == node || self.dst == node,
        }
    }
}

/// Property value carried by an optional node or relationship payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropValue {
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Floating point.
    Float(f64),
    /// UTF-8 string.
    Str(String),
}

/// Optional payload map.
pub type Props = BTreeMap<String, PropValue>;
