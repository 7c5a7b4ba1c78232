//! On-disk index format
//!
//! ## File Layout
//!
//! ```text
//! +--------------------------------------+
//! | Header (56 bytes, little-endian)     |
//! +--------------------------------------+
//! | Body (bincode)                       |
//! |   options, vectors, links, labels    |
//! +--------------------------------------+
//! | CRC32 of body (u32)                  |
//! +--------------------------------------+
//! ```
//!
//! ## Header
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0 | 8 | Magic `VNAVIDX\0` |
//! | 8 | 4 | Format version |
//! | 12 | 1 | Metric tag |
//! | 13 | 1 | Data type tag |
//! | 14 | 1 | Entry policy tag |
//! | 15 | 1 | Reserved (0) |
//! | 16 | 8 | Dimension |
//! | 24 | 8 | Capacity |
//! | 32 | 8 | Max edges per node |
//! | 40 | 8 | Node count |
//! | 48 | 8 | Body length in bytes |
//!
//! Saves write to `<path>.tmp`, fsync, then rename over `<path>`, so a
//! reader never observes a partially written file.

use crate::distance::Distance;
use crate::graph::{reserve_total, FlatIndex, NodeId};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use vecnav_core::{
    DataType, EngineError, EngineOptions, EngineResult, EntryPolicy, MetricType, VariantKey,
};

/// File magic
pub const MAGIC: [u8; 8] = *b"VNAVIDX\0";

/// Current format version
pub const FORMAT_VERSION: u32 = 1;

/// Header size in bytes
pub const HEADER_SIZE: usize = 56;

/// Decoded file header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexHeader {
    /// Format version
    pub format_version: u32,
    /// Specialization that wrote the file
    pub key: VariantKey,
    /// Entry point policy
    pub entry_policy: EntryPolicy,
    /// Vector dimension
    pub dimension: u64,
    /// Maximum node count
    pub capacity: u64,
    /// Link slots per node
    pub max_edges_per_node: u64,
    /// Stored node count
    pub len: u64,
    /// Length of the bincode body
    pub body_len: u64,
}

impl IndexHeader {
    /// Encode to a writer
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&MAGIC)?;
        w.write_u32::<LittleEndian>(self.format_version)?;
        w.write_u8(self.key.metric.to_byte())?;
        w.write_u8(self.key.data_type.to_byte())?;
        w.write_u8(self.entry_policy.to_byte())?;
        w.write_u8(0)?;
        w.write_u64::<LittleEndian>(self.dimension)?;
        w.write_u64::<LittleEndian>(self.capacity)?;
        w.write_u64::<LittleEndian>(self.max_edges_per_node)?;
        w.write_u64::<LittleEndian>(self.len)?;
        w.write_u64::<LittleEndian>(self.body_len)?;
        Ok(())
    }

    /// Decode from a reader
    ///
    /// # Errors
    /// - `UnsupportedFormat` on bad magic, unknown version or unknown tags
    /// - `Corruption` if the header is truncated
    pub fn read_from<R: Read>(r: &mut R) -> EngineResult<Self> {
        let mut raw = [0u8; HEADER_SIZE];
        r.read_exact(&mut raw).map_err(|e| truncated(e, "header"))?;
        let mut cursor = &raw[..];

        let mut magic = [0u8; 8];
        cursor.read_exact(&mut magic)?;
        if magic != MAGIC {
            return Err(EngineError::UnsupportedFormat(format!(
                "bad magic {:02x?}",
                magic
            )));
        }

        let format_version = cursor.read_u32::<LittleEndian>()?;
        if format_version != FORMAT_VERSION {
            return Err(EngineError::UnsupportedFormat(format!(
                "format version {} (supported: {})",
                format_version, FORMAT_VERSION
            )));
        }

        let metric_tag = cursor.read_u8()?;
        let metric = MetricType::from_byte(metric_tag).ok_or_else(|| {
            EngineError::UnsupportedFormat(format!("unknown metric tag {}", metric_tag))
        })?;
        let dtype_tag = cursor.read_u8()?;
        let data_type = DataType::from_byte(dtype_tag).ok_or_else(|| {
            EngineError::UnsupportedFormat(format!("unknown data type tag {}", dtype_tag))
        })?;
        let policy_tag = cursor.read_u8()?;
        let entry_policy = EntryPolicy::from_byte(policy_tag).ok_or_else(|| {
            EngineError::UnsupportedFormat(format!("unknown entry policy tag {}", policy_tag))
        })?;
        let _reserved = cursor.read_u8()?;

        Ok(IndexHeader {
            format_version,
            key: VariantKey::new(metric, data_type),
            entry_policy,
            dimension: cursor.read_u64::<LittleEndian>()?,
            capacity: cursor.read_u64::<LittleEndian>()?,
            max_edges_per_node: cursor.read_u64::<LittleEndian>()?,
            len: cursor.read_u64::<LittleEndian>()?,
            body_len: cursor.read_u64::<LittleEndian>()?,
        })
    }
}

/// Read only the header of an index file
pub fn read_header(path: impl AsRef<Path>) -> EngineResult<IndexHeader> {
    let mut file = File::open(path.as_ref())?;
    IndexHeader::read_from(&mut file)
}

#[derive(Serialize)]
struct BodyRef<'a, T> {
    options: &'a EngineOptions,
    vectors: &'a [T],
    links: &'a [NodeId],
    labels: &'a [u64],
    entry_node: NodeId,
}

#[derive(Deserialize)]
struct Body<T> {
    options: EngineOptions,
    vectors: Vec<T>,
    links: Vec<NodeId>,
    labels: Vec<u64>,
    entry_node: NodeId,
}

fn truncated(e: io::Error, what: &str) -> EngineError {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        EngineError::Corruption(format!("truncated {}", what))
    } else {
        EngineError::Io(e)
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

impl<D: Distance> FlatIndex<D> {
    fn header(&self, body_len: u64) -> IndexHeader {
        IndexHeader {
            format_version: FORMAT_VERSION,
            key: D::key(),
            entry_policy: self.entry_policy,
            dimension: self.dimension as u64,
            capacity: self.capacity as u64,
            max_edges_per_node: self.max_edges as u64,
            len: self.len() as u64,
            body_len,
        }
    }

    /// Write the index to `path`, replacing any existing file
    pub fn save(&self, path: impl AsRef<Path>) -> EngineResult<()> {
        let path = path.as_ref();
        let body = bincode::serialize(&BodyRef {
            options: &self.options,
            vectors: &self.vectors,
            links: &self.links,
            labels: &self.labels,
            entry_node: self.entry_node,
        })?;
        let header = self.header(body.len() as u64);

        let tmp = temp_path(path);
        let written = write_file(&tmp, &header, &body)
            .and_then(|()| fs::rename(&tmp, path).map_err(EngineError::from));
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }

        info!(
            path = %path.display(),
            key = %D::key(),
            nodes = self.len(),
            bytes = HEADER_SIZE + body.len() + 4,
            "saved index"
        );
        Ok(())
    }

    /// Load an index written by [`save`](Self::save)
    ///
    /// # Errors
    /// - `SpecializationMismatch` if the file holds another (metric, dtype)
    /// - `UnsupportedFormat` / `Corruption` for unreadable or damaged files
    pub fn load(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let mut reader = BufReader::new(File::open(path)?);
        let header = IndexHeader::read_from(&mut reader)?;
        if header.key != D::key() {
            return Err(EngineError::SpecializationMismatch {
                expected: D::key(),
                found: header.key,
            });
        }

        let mut body = Vec::new();
        (&mut reader)
            .take(header.body_len)
            .read_to_end(&mut body)?;
        if body.len() as u64 != header.body_len {
            return Err(EngineError::Corruption(format!(
                "truncated body: {} of {} bytes",
                body.len(),
                header.body_len
            )));
        }
        let stored_crc = reader
            .read_u32::<LittleEndian>()
            .map_err(|e| truncated(e, "checksum"))?;
        let crc = crc32fast::hash(&body);
        if crc != stored_crc {
            return Err(EngineError::Corruption(format!(
                "checksum mismatch: stored {:08x}, computed {:08x}",
                stored_crc, crc
            )));
        }

        let body: Body<D::Element> = bincode::deserialize(&body)?;
        let index = Self::from_body(&header, body)?;
        debug!(path = %path.display(), key = %D::key(), nodes = index.len(), "loaded index");
        Ok(index)
    }

    fn from_body(header: &IndexHeader, body: Body<D::Element>) -> EngineResult<Self> {
        let corrupt = |msg: String| EngineError::Corruption(msg);

        let dimension = usize::try_from(header.dimension)
            .map_err(|_| corrupt("dimension overflows usize".into()))?;
        let capacity = usize::try_from(header.capacity)
            .map_err(|_| corrupt("capacity overflows usize".into()))?;
        let len = usize::try_from(header.len)
            .map_err(|_| corrupt("node count overflows usize".into()))?;

        if dimension == 0 {
            return Err(corrupt("zero dimension".into()));
        }
        if len > capacity || capacity > NodeId::MAX as usize {
            return Err(corrupt(format!("{} nodes in capacity {}", len, capacity)));
        }
        body.options
            .validate()
            .map_err(|e| corrupt(format!("stored options: {}", e)))?;
        let max_edges = body.options.max_edges_per_node;
        if max_edges as u64 != header.max_edges_per_node {
            return Err(corrupt(format!(
                "header says {} edges per node, options say {}",
                header.max_edges_per_node, max_edges
            )));
        }

        let expect_len = |what: &str, got: usize, want: Option<usize>| {
            if want == Some(got) {
                Ok(())
            } else {
                Err(corrupt(format!("{} has {} entries for {} nodes", what, got, len)))
            }
        };
        expect_len("vectors", body.vectors.len(), len.checked_mul(dimension))?;
        expect_len("links", body.links.len(), len.checked_mul(max_edges))?;
        expect_len("labels", body.labels.len(), Some(len))?;
        if let Some(bad) = body.links.iter().find(|&&link| link as usize >= len) {
            return Err(corrupt(format!("link to missing node {}", bad)));
        }
        if len > 0 && body.entry_node as usize >= len {
            return Err(corrupt(format!("entry node {} out of range", body.entry_node)));
        }

        let Body {
            options,
            mut vectors,
            mut links,
            mut labels,
            entry_node,
        } = body;
        reserve_total(&mut vectors, "vectors", capacity.checked_mul(dimension))?;
        reserve_total(&mut links, "links", capacity.checked_mul(max_edges))?;
        reserve_total(&mut labels, "labels", Some(capacity))?;

        Ok(Self::from_parts(
            dimension,
            capacity,
            header.entry_policy,
            options,
            vectors,
            links,
            labels,
            entry_node,
        ))
    }
}

fn write_file(path: &Path, header: &IndexHeader, body: &[u8]) -> EngineResult<()> {
    let mut w = BufWriter::new(File::create(path)?);
    header.write_to(&mut w)?;
    w.write_all(body)?;
    w.write_u32::<LittleEndian>(crc32fast::hash(body))?;
    let file = w.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()?;
    Ok(())
}
