//! NumPy `.npy` reader
//!
//! Parses the `.npy` format: 6-byte magic, version, little-endian header
//! length, a Python dict literal describing the array, then raw data.
//!
//! Only 2-D C-order arrays of `<f4`, `|u1`, `|i1` and `<i4` are accepted.

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::ops::Range;
use std::path::Path;
use thiserror::Error;
use vecnav_api::{DataType, VectorSlice};

const MAGIC: &[u8; 6] = b"\x93NUMPY";

/// Errors raised while reading an `.npy` file
#[derive(Debug, Error)]
pub enum NpyError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// File does not start with the npy magic
    #[error("not an .npy file")]
    BadMagic,

    /// Format version we cannot read
    #[error("unsupported .npy version {0}.{1}")]
    UnsupportedVersion(u8, u8),

    /// Header dict could not be parsed
    #[error("malformed .npy header: {0}")]
    MalformedHeader(String),

    /// Element type other than f4, u1, i1 or i4
    #[error("unsupported dtype {0:?}")]
    UnsupportedDtype(String),

    /// Column-major data
    #[error("fortran-order arrays are not supported")]
    FortranOrder,

    /// Not a 2-D array
    #[error("expected a 2-D array, got shape {0:?}")]
    UnsupportedShape(Vec<usize>),

    /// Fewer data bytes than the shape requires
    #[error("truncated data: expected {expected} elements")]
    Truncated {
        /// Elements implied by the shape
        expected: usize,
    },
}

/// Element storage of a parsed array
#[derive(Debug, Clone, PartialEq)]
pub enum NpyData {
    /// `<f4`
    Float32(Vec<f32>),
    /// `|u1`
    UInt8(Vec<u8>),
    /// `|i1`
    Int8(Vec<i8>),
    /// `<i4`
    Int32(Vec<i32>),
}

/// A 2-D row-major array
#[derive(Debug, Clone, PartialEq)]
pub struct NpyArray {
    pub rows: usize,
    pub cols: usize,
    pub data: NpyData,
}

impl NpyArray {
    /// Index data type for vector arrays; `None` for `<i4`
    pub fn data_type(&self) -> Option<DataType> {
        match self.data {
            NpyData::Float32(_) => Some(DataType::Float32),
            NpyData::UInt8(_) => Some(DataType::UInt8),
            NpyData::Int8(_) => Some(DataType::Int8),
            NpyData::Int32(_) => None,
        }
    }

    /// All rows as one vector batch
    pub fn vectors(&self) -> Option<VectorSlice<'_>> {
        match &self.data {
            NpyData::Float32(v) => Some(VectorSlice::from(v)),
            NpyData::UInt8(v) => Some(VectorSlice::from(v)),
            NpyData::Int8(v) => Some(VectorSlice::from(v)),
            NpyData::Int32(_) => None,
        }
    }

    /// Rows `range` as one vector batch
    pub fn rows(&self, range: Range<usize>) -> Option<VectorSlice<'_>> {
        let elements = range.start * self.cols..range.end * self.cols;
        match &self.data {
            NpyData::Float32(v) => v.get(elements).map(VectorSlice::Float32),
            NpyData::UInt8(v) => v.get(elements).map(VectorSlice::UInt8),
            NpyData::Int8(v) => v.get(elements).map(VectorSlice::Int8),
            NpyData::Int32(_) => None,
        }
    }

    /// One row as a vector
    pub fn row(&self, i: usize) -> Option<VectorSlice<'_>> {
        self.rows(i..i + 1)
    }

    /// Integer rows, e.g. ground-truth neighbor ids
    pub fn int_rows(&self) -> Option<std::slice::ChunksExact<'_, i32>> {
        match &self.data {
            NpyData::Int32(v) if self.cols > 0 => Some(v.chunks_exact(self.cols)),
            _ => None,
        }
    }
}

/// Read an `.npy` file
pub fn read_npy(path: impl AsRef<Path>) -> Result<NpyArray, NpyError> {
    let mut reader = BufReader::new(File::open(path.as_ref())?);
    parse_npy(&mut reader)
}

/// Parse `.npy` content from a reader
pub fn parse_npy<R: Read>(r: &mut R) -> Result<NpyArray, NpyError> {
    let mut magic = [0u8; 6];
    r.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(NpyError::BadMagic);
    }

    let major = r.read_u8()?;
    let minor = r.read_u8()?;
    let header_len = match major {
        1 => r.read_u16::<LittleEndian>()? as usize,
        2 | 3 => r.read_u32::<LittleEndian>()? as usize,
        _ => return Err(NpyError::UnsupportedVersion(major, minor)),
    };

    let header = read_up_to(r, header_len as u64)?;
    if header.len() != header_len {
        return Err(NpyError::MalformedHeader(format!(
            "header is {} of {} bytes",
            header.len(),
            header_len
        )));
    }
    let header = String::from_utf8(header)
        .map_err(|e| NpyError::MalformedHeader(format!("invalid UTF-8: {}", e)))?;

    let descr = dict_value(&header, "descr")?;
    let descr = descr.trim_matches(|c: char| c == '\'' || c == '"');
    if dict_value(&header, "fortran_order")? != "False" {
        return Err(NpyError::FortranOrder);
    }
    let shape = parse_shape(dict_value(&header, "shape")?)?;
    if shape.len() != 2 {
        return Err(NpyError::UnsupportedShape(shape));
    }
    let (rows, cols) = (shape[0], shape[1]);

    let count = rows
        .checked_mul(cols)
        .ok_or_else(|| NpyError::MalformedHeader(format!("shape {:?} overflows", shape)))?;
    let element_size = match descr {
        "<f4" | "<i4" => 4,
        "|u1" | "|i1" => 1,
        other => return Err(NpyError::UnsupportedDtype(other.to_string())),
    };
    let byte_len = count
        .checked_mul(element_size)
        .ok_or_else(|| NpyError::MalformedHeader(format!("shape {:?} overflows", shape)))?;

    // Buffers grow with the bytes actually present, never with the shape.
    let bytes = read_up_to(r, byte_len as u64)?;
    if bytes.len() != byte_len {
        return Err(NpyError::Truncated { expected: count });
    }

    let data = match descr {
        "<f4" => {
            let mut v = vec![0f32; count];
            LittleEndian::read_f32_into(&bytes, &mut v);
            NpyData::Float32(v)
        }
        "<i4" => {
            let mut v = vec![0i32; count];
            LittleEndian::read_i32_into(&bytes, &mut v);
            NpyData::Int32(v)
        }
        "|u1" => NpyData::UInt8(bytes),
        _ => NpyData::Int8(bytes.into_iter().map(|b| b as i8).collect()),
    };

    Ok(NpyArray { rows, cols, data })
}

/// Read at most `limit` bytes, stopping early at end of input
fn read_up_to<R: Read>(r: &mut R, limit: u64) -> Result<Vec<u8>, NpyError> {
    let mut buf = Vec::new();
    r.take(limit).read_to_end(&mut buf)?;
    Ok(buf)
}

/// Raw text of the value stored under `key` in the header dict
fn dict_value<'a>(header: &'a str, key: &str) -> Result<&'a str, NpyError> {
    let needle = format!("'{}':", key);
    let start = header
        .find(&needle)
        .ok_or_else(|| NpyError::MalformedHeader(format!("missing key {:?}", key)))?
        + needle.len();
    let rest = header[start..].trim_start();

    let end = if rest.starts_with('(') {
        rest.find(')').map(|i| i + 1)
    } else {
        rest.find(|c: char| c == ',' || c == '}')
    }
    .ok_or_else(|| NpyError::MalformedHeader(format!("unterminated value for {:?}", key)))?;
    Ok(rest[..end].trim())
}

fn parse_shape(text: &str) -> Result<Vec<usize>, NpyError> {
    let inner = text
        .strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .ok_or_else(|| NpyError::MalformedHeader(format!("bad shape {:?}", text)))?;
    inner
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<usize>()
                .map_err(|_| NpyError::MalformedHeader(format!("bad dimension {:?}", s)))
        })
        .collect()
}
