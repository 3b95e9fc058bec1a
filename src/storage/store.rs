use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::header::{StoreFile, StoreHeader, HEADER_LEN};
use super::options::StoreOptions;
use super::record::{
    decode_node, decode_rel, encode_node, encode_rel, NodeRecord, RelRecord, NODE_RECORD_SIZE,
    REL_RECORD_SIZE,
};
use super::StorageAdapter;
use crate::error::{BenchError, Result};
use crate::types::{Dir, EdgeId, NodeId, Props, RelType, Relationship};

const PROPS_FILE: &str = "props.json";

/// Node id of the designated root.
pub const REFERENCE_NODE: NodeId = NodeId(0);

/// Highest node id the store accepts. Node slots are dense, so an id also
/// sizes the node table.
pub const MAX_NODE_ID: u64 = (1 << 32) - 1;

#[derive(Debug, Default, Serialize, Deserialize)]
struct PropFile {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    nodes: BTreeMap<u64, Props>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    relationships: BTreeMap<u64, Props>,
}

impl PropFile {
    fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.relationships.is_empty()
    }
}

/// File-backed node/relationship record store.
///
/// Records live in memory while the store is open and are written to
/// `nodestore.db` / `relstore.db` when it is closed. Every node keeps the
/// head of a singly linked chain through the relationships touching it; new
/// relationships are prepended to both endpoint chains.
///
/// The store is a scoped resource: [`RecordStore::close`] flushes and reports
/// errors, and dropping an unclosed store flushes on a best-effort basis so
/// error paths still leave the loaded prefix on disk.
#[derive(Debug)]
pub struct RecordStore {
    dir: PathBuf,
    opts: StoreOptions,
    nodes: Vec<Option<NodeRecord>>,
    rels: Vec<RelRecord>,
    props: PropFile,
    node_count: u64,
    dirty: bool,
    closed: bool,
}

impl RecordStore {
    /// Opens the store under `dir`, creating it when allowed by `opts`.
    pub fn open(dir: impl AsRef<Path>, opts: &StoreOptions) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        if opts.truncate && !opts.read_only && dir.exists() {
            info!(path = %dir.display(), "removing existing store");
            remove_store_files(&dir)?;
        }

        let mut store = Self {
            dir,
            opts: opts.clone(),
            nodes: Vec::new(),
            rels: Vec::new(),
            props: PropFile::default(),
            node_count: 0,
            dirty: false,
            closed: false,
        };

        if store.dir.join(StoreFile::Nodes.file_name()).exists() {
            store.load()?;
            info!(
                path = %store.dir.display(),
                nodes = store.node_count,
                relationships = store.rels.len(),
                read_only = opts.read_only,
                "opened store"
            );
        } else if opts.create_if_missing && !opts.read_only {
            if opts.reference_node {
                store.insert_node(REFERENCE_NODE);
            }
            store.dirty = true;
            info!(path = %store.dir.display(), "created store");
        } else {
            // Nothing was loaded, so there is nothing to flush on drop.
            store.closed = true;
            return Err(BenchError::Io(io::Error::new(
                ErrorKind::NotFound,
                format!("no store found at {}", store.dir.display()),
            )));
        }
        Ok(store)
    }

    /// Flushes pending records and releases the store.
    pub fn close(mut self) -> Result<()> {
        self.closed = true;
        self.flush()?;
        info!(path = %self.dir.display(), "closed store");
        Ok(())
    }

    /// Writes pending records to disk without closing.
    pub fn flush(&mut self) -> Result<()> {
        if !self.dirty || self.opts.read_only {
            return Ok(());
        }
        fs::create_dir_all(&self.dir)?;

        let mut body = Vec::with_capacity(self.nodes.len() * NODE_RECORD_SIZE);
        for slot in &self.nodes {
            encode_node(slot.as_ref(), &mut body);
        }
        self.write_store_file(StoreFile::Nodes, NODE_RECORD_SIZE, &body)?;

        let mut body = Vec::with_capacity(self.rels.len() * REL_RECORD_SIZE);
        for rel in &self.rels {
            encode_rel(rel, &mut body);
        }
        self.write_store_file(StoreFile::Relationships, REL_RECORD_SIZE, &body)?;

        let props_path = self.dir.join(PROPS_FILE);
        if self.props.is_empty() {
            if props_path.exists() {
                fs::remove_file(&props_path)?;
            }
        } else {
            let encoded = serde_json::to_vec(&self.props)?;
            self.write_atomic(&props_path, &[&encoded])?;
        }

        debug!(
            nodes = self.node_count,
            relationships = self.rels.len(),
            "flushed store"
        );
        self.dirty = false;
        Ok(())
    }

    /// Directory holding the store files.
    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Number of nodes in use.
    pub fn node_count(&self) -> u64 {
        self.node_count
    }

    /// Number of relationships stored.
    pub fn relationship_count(&self) -> u64 {
        self.rels.len() as u64
    }

    /// Whether `id` is in use.
    pub fn contains_node(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Fetches one relationship by id.
    pub fn relationship(&self, id: EdgeId) -> Option<Relationship> {
        let index = usize::try_from(id.0).ok()?;
        self.rels.get(index).map(|rec| rec.to_relationship(id))
    }

    /// All relationships in creation order.
    pub fn all_relationships(&self) -> impl Iterator<Item = Relationship> + '_ {
        self.rels
            .iter()
            .enumerate()
            .map(|(index, rec)| rec.to_relationship(EdgeId(index as u64)))
    }

    /// Payload stored with a node, if any.
    pub fn node_props(&self, id: NodeId) -> Option<&Props> {
        self.props.nodes.get(&id.0)
    }

    /// Payload stored with a relationship, if any.
    pub fn relationship_props(&self, id: EdgeId) -> Option<&Props> {
        self.props.relationships.get(&id.0)
    }

    fn node(&self, id: NodeId) -> Option<&NodeRecord> {
        let index = usize::try_from(id.0).ok()?;
        self.nodes.get(index).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut NodeRecord> {
        let index = usize::try_from(id.0).ok()?;
        self.nodes.get_mut(index).and_then(Option::as_mut)
    }

    fn insert_node(&mut self, id: NodeId) {
        let index = id.0 as usize;
        if index >= self.nodes.len() {
            self.nodes.resize(index + 1, None);
        }
        self.nodes[index] = Some(NodeRecord::default());
        self.node_count += 1;
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.opts.read_only {
            Err(BenchError::ReadOnly)
        } else {
            Ok(())
        }
    }

    fn load(&mut self) -> Result<()> {
        let body = read_store_file(&self.dir, StoreFile::Nodes, NODE_RECORD_SIZE)?;
        let mut nodes = Vec::with_capacity(body.len() / NODE_RECORD_SIZE);
        for chunk in body.chunks_exact(NODE_RECORD_SIZE) {
            nodes.push(decode_node(chunk)?);
        }

        let body = read_store_file(&self.dir, StoreFile::Relationships, REL_RECORD_SIZE)?;
        let mut rels = Vec::with_capacity(body.len() / REL_RECORD_SIZE);
        for chunk in body.chunks_exact(REL_RECORD_SIZE) {
            rels.push(decode_rel(chunk)?);
        }

        self.node_count = nodes.iter().filter(|slot| slot.is_some()).count() as u64;
        self.nodes = nodes;
        self.rels = rels;
        self.validate_links()?;

        let props_path = self.dir.join(PROPS_FILE);
        if props_path.exists() {
            self.props = serde_json::from_slice(&fs::read(&props_path)?)?;
        }
        Ok(())
    }

    fn validate_links(&self) -> Result<()> {
        let rel_count = self.rels.len() as u64;
        let in_range = |link: Option<EdgeId>| link.map_or(true, |id| id.0 < rel_count);
        for (index, slot) in self.nodes.iter().enumerate() {
            if let Some(node) = slot {
                if !in_range(node.first_rel) {
                    return Err(BenchError::Corruption(format!(
                        "node {index} points past the relationship store"
                    )));
                }
            }
        }
        for (index, rel) in self.rels.iter().enumerate() {
            if !self.contains_node(rel.src) || !self.contains_node(rel.dst) {
                return Err(BenchError::Corruption(format!(
                    "relationship {index} references a missing node"
                )));
            }
            // Chains are built by prepending, so every link points backwards.
            let backwards = |link: Option<EdgeId>| link.map_or(true, |id| id.0 < index as u64);
            if !backwards(rel.src_next) || !backwards(rel.dst_next) {
                return Err(BenchError::Corruption(format!(
                    "relationship {index} has a forward chain link"
                )));
            }
        }
        Ok(())
    }

    fn write_store_file(&self, file: StoreFile, record_size: usize, body: &[u8]) -> Result<()> {
        let header = StoreHeader::new(file, record_size, body)?;
        let mut head = [0u8; HEADER_LEN];
        header.write(&mut head)?;
        self.write_atomic(&self.dir.join(file.file_name()), &[&head, body])
    }

    fn write_atomic(&self, target: &Path, parts: &[&[u8]]) -> Result<()> {
        let tmp = target.with_extension("tmp");
        {
            let mut out = io::BufWriter::new(File::create(&tmp)?);
            for part in parts {
                out.write_all(part)?;
            }
            let file = out.into_inner().map_err(|err| err.into_error())?;
            if self.opts.sync_on_close {
                file.sync_all()?;
            }
        }
        fs::rename(&tmp, target)?;
        Ok(())
    }
}

/// Deletes the files a store writes, leaving anything else in `dir` alone.
fn remove_store_files(dir: &Path) -> Result<()> {
    let names = [
        StoreFile::Nodes.file_name(),
        StoreFile::Relationships.file_name(),
        PROPS_FILE,
    ];
    for name in names {
        let target = dir.join(name);
        for path in [target.with_extension("tmp"), target] {
            match fs::remove_file(&path) {
                Ok(()) => debug!(path = %path.display(), "removed store file"),
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
        }
    }
    Ok(())
}

fn read_store_file(dir: &Path, file: StoreFile, record_size: usize) -> Result<Vec<u8>> {
    let mut data = fs::read(dir.join(file.file_name()))?;
    let header = StoreHeader::read(file, &data)?;
    let body = data.split_off(HEADER_LEN);
    header.verify_body(record_size, &body)?;
    Ok(body)
}

impl Drop for RecordStore {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(err) = self.flush() {
            warn!(path = %self.dir.display(), error = %err, "failed to flush store on drop");
        }
    }
}

impl StorageAdapter for RecordStore {
    type Relationships<'a> = RelationshipCursor<'a>;

    fn create_node(&mut self, id: NodeId, props: Option<&Props>) -> Result<()> {
        self.ensure_writable()?;
        if self.contains_node(id) {
            return Err(BenchError::DuplicateId(id));
        }
        if id.0 > MAX_NODE_ID || usize::try_from(id.0).is_err() {
            return Err(BenchError::invalid_size(format!(
                "node id {id} exceeds the maximum of {MAX_NODE_ID}"
            )));
        }
        self.insert_node(id);
        if let Some(props) = props.filter(|props| !props.is_empty()) {
            self.props.nodes.insert(id.0, props.clone());
        }
        self.dirty = true;
        Ok(())
    }

    fn create_relationship(
        &mut self,
        from: NodeId,
        to: NodeId,
        ty: RelType,
        props: Option<&Props>,
    ) -> Result<EdgeId> {
        self.ensure_writable()?;
        let src_next = self.node(from).ok_or(BenchError::UnknownNode(from))?.first_rel;
        let dst_next = self.node(to).ok_or(BenchError::UnknownNode(to))?.first_rel;

        let id = EdgeId(self.rels.len() as u64);
        self.rels.push(RelRecord {
            src: from,
            dst: to,
            ty,
            src_next,
            dst_next,
        });
        for endpoint in [from, to] {
            if let Some(node) = self.node_mut(endpoint) {
                node.first_rel = Some(id);
            }
        }
        if let Some(props) = props.filter(|props| !props.is_empty()) {
            self.props.relationships.insert(id.0, props.clone());
        }
        self.dirty = true;
        Ok(id)
    }

    fn reference_node(&self) -> Result<NodeId> {
        if self.contains_node(REFERENCE_NODE) {
            Ok(REFERENCE_NODE)
        } else {
            Err(BenchError::StoreUninitialized)
        }
    }

    fn relationships(&self, node: NodeId, ty: RelType, dir: Dir) -> Result<RelationshipCursor<'_>> {
        let record = self.node(node).ok_or(BenchError::UnknownNode(node))?;
        Ok(RelationshipCursor {
            rels: &self.rels,
            node,
            ty,
            dir,
            next: record.first_rel,
        })
    }
}

/// Lazy walk along one node's relationship chain, filtered by type and direction.
#[derive(Debug, Clone)]
pub struct RelationshipCursor<'a> {
    rels: &'a [RelRecord],
    node: NodeId,
    ty: RelType,
    dir: Dir,
    next: Option<EdgeId>,
}

impl Iterator for RelationshipCursor<'_> {
    type Item = Relationship;

    fn next(&mut self) -> Option<Relationship> {
        while let Some(id) = self.next {
            // Links were validated on load and are only ever created backwards.
            let record = self.rels.get(id.0 as usize)?;
            self.next = record.next_for(self.node);
            let rel = record.to_relationship(id);
            if rel.ty == self.ty && rel.matches(self.node, self.dir) {
                return Some(rel);
            }
        }
        None
    }
}
