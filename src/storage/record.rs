use std::convert::TryInto;

use crate::error::{BenchError, Result};
use crate::types::{EdgeId, NodeId, RelType, Relationship};

pub const NODE_RECORD_SIZE: usize = 1 + 8;
pub const REL_RECORD_SIZE: usize = 1 + 8 + 8 + 1 + 8 + 8;

const IN_USE: u8 = 0x01;
const NO_EDGE: u64 = u64::MAX;

/// Fixed-size node slot: the head of the node's relationship chain.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct NodeRecord {
    pub first_rel: Option<EdgeId>,
}

/// Fixed-size relationship slot, threaded into the chains of both endpoints.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct RelRecord {
    pub src: NodeId,
    pub dst: NodeId,
    pub ty: RelType,
    pub src_next: Option<EdgeId>,
    pub dst_next: Option<EdgeId>,
}

impl RelRecord {
    /// Next link in `node`'s chain. Self-loops share one link.
    pub fn next_for(&self, node: NodeId) -> Option<EdgeId> {
        if self.src == node {
            self.src_next
        } else {
            self.dst_next
        }
    }

    pub fn to_relationship(&self, id: EdgeId) -> Relationship {
        Relationship {
            id,
            src: self.src,
            dst: self.dst,
            ty: self.ty,
        }
    }
}

pub fn encode_node(record: Option<&NodeRecord>, out: &mut Vec<u8>) {
    match record {
        Some(node) => {
            out.push(IN_USE);
            out.extend_from_slice(&edge_to_raw(node.first_rel).to_be_bytes());
        }
        None => out.extend_from_slice(&[0u8; NODE_RECORD_SIZE]),
    }
}

pub fn decode_node(data: &[u8]) -> Result<Option<NodeRecord>> {
    if data.len() < NODE_RECORD_SIZE {
        return Err(BenchError::Corruption("node record truncated".into()));
    }
    match data[0] {
        0 => Ok(None),
        IN_USE => Ok(Some(NodeRecord {
            first_rel: edge_from_raw(u64_from_be(&data[1..9])),
        })),
        other => Err(BenchError::Corruption(format!(
            "unknown node record flag: 0x{other:02X}"
        ))),
    }
}

pub fn encode_rel(record: &RelRecord, out: &mut Vec<u8>) {
    out.push(IN_USE);
    out.extend_from_slice(&record.src.0.to_be_bytes());
    out.extend_from_slice(&record.dst.0.to_be_bytes());
    out.push(record.ty.to_byte());
    out.extend_from_slice(&edge_to_raw(record.src_next).to_be_bytes());
    out.extend_from_slice(&edge_to_raw(record.dst_next).to_be_bytes());
}

pub fn decode_rel(data: &[u8]) -> Result<RelRecord> {
    if data.len() < REL_RECORD_SIZE {
        return Err(BenchError::Corruption("relationship record truncated".into()));
    }
    if data[0] != IN_USE {
        return Err(BenchError::Corruption(
            "relationship record not in use".into(),
        ));
    }
    Ok(RelRecord {
        src: NodeId(u64_from_be(&data[1..9])),
        dst: NodeId(u64_from_be(&data[9..17])),
        ty: RelType::from_byte(data[17])?,
        src_next: edge_from_raw(u64_from_be(&data[18..26])),
        dst_next: edge_from_raw(u64_from_be(&data[26..34])),
    })
}

fn edge_to_raw(edge: Option<EdgeId>) -> u64 {
    edge.map_or(NO_EDGE, |id| id.0)
}

fn edge_from_raw(raw: u64) -> Option<EdgeId> {
    if raw == NO_EDGE {
        None
    } else {
        Some(EdgeId(raw))
    }
}

fn u64_from_be(bytes: &[u8]) -> u64 {
    u64::from_be_bytes(bytes[..8].try_into().expect("slice is 8 bytes"))
}
