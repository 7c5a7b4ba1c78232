//! Element types storable in an index

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use vecnav_core::DataType;

/// A scalar type vectors are made of
///
/// Implemented for exactly the members of [`DataType`].
pub trait Element:
    Copy + Default + PartialEq + fmt::Debug + Send + Sync + Serialize + DeserializeOwned + 'static
{
    /// Registry tag for this element type
    const DATA_TYPE: DataType;

    /// Widen to f32 for distance accumulation
    fn to_f32(self) -> f32;

    /// Borrow a typed slice if the batch holds this element type
    fn from_vector_slice(slice: VectorSlice<'_>) -> Option<&[Self]>;
}

impl Element for f32 {
    const DATA_TYPE: DataType = DataType::Float32;

    #[inline]
    fn to_f32(self) -> f32 {
        self
    }

    fn from_vector_slice(slice: VectorSlice<'_>) -> Option<&[Self]> {
        match slice {
            VectorSlice::Float32(v) => Some(v),
            _ => None,
        }
    }
}

impl Element for u8 {
    const DATA_TYPE: DataType = DataType::UInt8;

    #[inline]
    fn to_f32(self) -> f32 {
        self as f32
    }

    fn from_vector_slice(slice: VectorSlice<'_>) -> Option<&[Self]> {
        match slice {
            VectorSlice::UInt8(v) => Some(v),
            _ => None,
        }
    }
}

impl Element for i8 {
    const DATA_TYPE: DataType = DataType::Int8;

    #[inline]
    fn to_f32(self) -> f32 {
        self as f32
    }

    fn from_vector_slice(slice: VectorSlice<'_>) -> Option<&[Self]> {
        match slice {
            VectorSlice::Int8(v) => Some(v),
            _ => None,
        }
    }
}

/// A borrowed, dtype-tagged run of vector elements
///
/// Used where the element type is only known at runtime (the type-erased
/// index handle). One or more vectors laid out back to back.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VectorSlice<'a> {
    /// 32-bit floats
    Float32(&'a [f32]),
    /// Unsigned bytes
    UInt8(&'a [u8]),
    /// Signed bytes
    Int8(&'a [i8]),
}

impl<'a> VectorSlice<'a> {
    /// Element type of the batch
    pub fn data_type(&self) -> DataType {
        match self {
            VectorSlice::Float32(_) => DataType::Float32,
            VectorSlice::UInt8(_) => DataType::UInt8,
            VectorSlice::Int8(_) => DataType::Int8,
        }
    }

    /// Number of elements (not vectors)
    pub fn len(&self) -> usize {
        match self {
            VectorSlice::Float32(v) => v.len(),
            VectorSlice::UInt8(v) => v.len(),
            VectorSlice::Int8(v) => v.len(),
        }
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<'a> From<&'a [f32]> for VectorSlice<'a> {
    fn from(v: &'a [f32]) -> Self {
        VectorSlice::Float32(v)
    }
}

impl<'a> From<&'a [u8]> for VectorSlice<'a> {
    fn from(v: &'a [u8]) -> Self {
        VectorSlice::UInt8(v)
    }
}

impl<'a> From<&'a [i8]> for VectorSlice<'a> {
    fn from(v: &'a [i8]) -> Self {
        VectorSlice::Int8(v)
    }
}

impl<'a> From<&'a Vec<f32>> for VectorSlice<'a> {
    fn from(v: &'a Vec<f32>) -> Self {
        VectorSlice::Float32(v)
    }
}

impl<'a> From<&'a Vec<u8>> for VectorSlice<'a> {
    fn from(v: &'a Vec<u8>) -> Self {
        VectorSlice::UInt8(v)
    }
}

impl<'a> From<&'a Vec<i8>> for VectorSlice<'a> {
    fn from(v: &'a Vec<i8>) -> Self {
        VectorSlice::Int8(v)
    }
}

impl<'a, const N: usize> From<&'a [f32; N]> for VectorSlice<'a> {
    fn from(v: &'a [f32; N]) -> Self {
        VectorSlice::Float32(v)
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for VectorSlice<'a> {
    fn from(v: &'a [u8; N]) -> Self {
        VectorSlice::UInt8(v)
    }
}

impl<'a, const N: usize> From<&'a [i8; N]> for VectorSlice<'a> {
    fn from(v: &'a [i8; N]) -> Self {
        VectorSlice::Int8(v)
    }
}
