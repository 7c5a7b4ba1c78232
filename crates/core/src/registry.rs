//! Type registry: element data types and distance metrics
//!
//! Both sets are closed. Every index specialization is identified by one
//! member of each (see [`VariantKey`]). The registry carries no behavior
//! beyond naming, parsing and stable byte tags for the on-disk header.
//!
//! ## Names
//!
//! | DataType | Accepted names |
//! |----------|----------------|
//! | Float32 | `float32`, `f32`, `float` |
//! | UInt8 | `uint8`, `u8` |
//! | Int8 | `int8`, `i8` |
//!
//! | MetricType | Accepted names |
//! |------------|----------------|
//! | L2 | `l2`, `euclidean` |
//! | InnerProduct | `inner_product`, `ip`, `angular`, `dot` |

use serde::{Deserialize, Serialize};
use std::fmt;

/// Element type stored in an index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    /// 32-bit IEEE float
    Float32,
    /// 8-bit unsigned integer
    #[serde(rename = "uint8")]
    UInt8,
    /// 8-bit signed integer
    Int8,
}

impl DataType {
    /// All data types (for iteration)
    pub const ALL: [DataType; 3] = [DataType::Float32, DataType::UInt8, DataType::Int8];

    /// Get all data types as a slice
    pub fn all() -> &'static [DataType] {
        &Self::ALL
    }

    /// Canonical name
    pub const fn name(&self) -> &'static str {
        match self {
            DataType::Float32 => "float32",
            DataType::UInt8 => "uint8",
            DataType::Int8 => "int8",
        }
    }

    /// Parse from name (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "float32" | "f32" | "float" => Some(DataType::Float32),
            "uint8" | "u8" => Some(DataType::UInt8),
            "int8" | "i8" => Some(DataType::Int8),
            _ => None,
        }
    }

    /// Membership test for a data type name
    pub fn is_valid(s: &str) -> bool {
        Self::parse(s).is_some()
    }

    /// Size of one element in bytes
    pub const fn element_size(&self) -> usize {
        match self {
            DataType::Float32 => 4,
            DataType::UInt8 | DataType::Int8 => 1,
        }
    }

    /// Serialization value for the index file header
    pub const fn to_byte(&self) -> u8 {
        match self {
            DataType::Float32 => 0,
            DataType::UInt8 => 1,
            DataType::Int8 => 2,
        }
    }

    /// Deserialization from the index file header
    pub const fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(DataType::Float32),
            1 => Some(DataType::UInt8),
            2 => Some(DataType::Int8),
            _ => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Distance metric used by an index
///
/// Both metrics are distances: lower = closer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    /// Squared Euclidean distance: sum((a - b)^2)
    L2,
    /// Inner product distance: 1 - dot(a, b)
    InnerProduct,
}

impl MetricType {
    /// All metrics (for iteration)
    pub const ALL: [MetricType; 2] = [MetricType::L2, MetricType::InnerProduct];

    /// Get all metrics as a slice
    pub fn all() -> &'static [MetricType] {
        &Self::ALL
    }

    /// Canonical name
    pub const fn name(&self) -> &'static str {
        match self {
            MetricType::L2 => "l2",
            MetricType::InnerProduct => "inner_product",
        }
    }

    /// Parse from name (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "l2" | "euclidean" => Some(MetricType::L2),
            "inner_product" | "ip" | "angular" | "dot" => Some(MetricType::InnerProduct),
            _ => None,
        }
    }

    /// Membership test for a metric name
    pub fn is_valid(s: &str) -> bool {
        Self::parse(s).is_some()
    }

    /// Serialization value for the index file header
    pub const fn to_byte(&self) -> u8 {
        match self {
            MetricType::L2 => 0,
            MetricType::InnerProduct => 1,
        }
    }

    /// Deserialization from the index file header
    pub const fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(MetricType::L2),
            1 => Some(MetricType::InnerProduct),
            _ => None,
        }
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Lookup key for an index specialization: (metric, data type)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VariantKey {
    /// Distance metric
    pub metric: MetricType,
    /// Element data type
    pub data_type: DataType,
}

impl VariantKey {
    /// Create a new key
    pub const fn new(metric: MetricType, data_type: DataType) -> Self {
        VariantKey { metric, data_type }
    }

    /// Every key the registry can express, metric-major
    pub fn all() -> impl Iterator<Item = VariantKey> {
        MetricType::ALL
            .into_iter()
            .flat_map(|m| DataType::ALL.into_iter().map(move |d| VariantKey::new(m, d)))
    }
}

impl fmt::Display for VariantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.metric, self.data_type)
    }
}
