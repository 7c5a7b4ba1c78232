//! Variant catalog: (metric, data type) → engine specialization
//!
//! [`SpecializationId`] is the closed set of engines this build contains.
//! A [`VariantCatalog`] decides which of them a factory may construct. The
//! built-in catalog holds all of them and is initialized once per process.

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use vecnav_core::{DataType, MetricType, VariantKey};

/// One compiled engine specialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SpecializationId {
    /// Squared L2 over f32
    L2Float32,
    /// Inner product over f32
    InnerProductFloat32,
    /// Squared L2 over u8
    L2UInt8,
    /// Inner product over u8
    InnerProductUInt8,
    /// Squared L2 over i8
    L2Int8,
    /// Inner product over i8
    InnerProductInt8,
}

impl SpecializationId {
    /// Every specialization in this build
    pub const ALL: [SpecializationId; 6] = [
        SpecializationId::L2Float32,
        SpecializationId::InnerProductFloat32,
        SpecializationId::L2UInt8,
        SpecializationId::InnerProductUInt8,
        SpecializationId::L2Int8,
        SpecializationId::InnerProductInt8,
    ];

    /// The (metric, data type) pair this specialization implements
    pub const fn key(&self) -> VariantKey {
        match self {
            SpecializationId::L2Float32 => VariantKey::new(MetricType::L2, DataType::Float32),
            SpecializationId::InnerProductFloat32 => {
                VariantKey::new(MetricType::InnerProduct, DataType::Float32)
            }
            SpecializationId::L2UInt8 => VariantKey::new(MetricType::L2, DataType::UInt8),
            SpecializationId::InnerProductUInt8 => {
                VariantKey::new(MetricType::InnerProduct, DataType::UInt8)
            }
            SpecializationId::L2Int8 => VariantKey::new(MetricType::L2, DataType::Int8),
            SpecializationId::InnerProductInt8 => {
                VariantKey::new(MetricType::InnerProduct, DataType::Int8)
            }
        }
    }

    /// Short name, e.g. `l2_float32`
    pub const fn name(&self) -> &'static str {
        match self {
            SpecializationId::L2Float32 => "l2_float32",
            SpecializationId::InnerProductFloat32 => "ip_float32",
            SpecializationId::L2UInt8 => "l2_uint8",
            SpecializationId::InnerProductUInt8 => "ip_uint8",
            SpecializationId::L2Int8 => "l2_int8",
            SpecializationId::InnerProductInt8 => "ip_int8",
        }
    }
}

impl fmt::Display for SpecializationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

static BUILTIN: Lazy<VariantCatalog> =
    Lazy::new(|| VariantCatalog::from_specializations(&SpecializationId::ALL));

/// Lookup table from [`VariantKey`] to [`SpecializationId`]
///
/// Rows are always keyed by the specialization's own `key()`, so a lookup
/// can never return an engine for a different pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariantCatalog {
    entries: FxHashMap<VariantKey, SpecializationId>,
}

impl VariantCatalog {
    /// The process-wide catalog of every built specialization
    pub fn builtin() -> &'static VariantCatalog {
        &BUILTIN
    }

    /// Catalog containing exactly `specializations`
    pub fn from_specializations(specializations: &[SpecializationId]) -> Self {
        let entries = specializations.iter().map(|id| (id.key(), *id)).collect();
        VariantCatalog { entries }
    }

    /// Copy of this catalog with `key` removed
    pub fn without(&self, key: VariantKey) -> Self {
        let mut catalog = self.clone();
        catalog.entries.remove(&key);
        catalog
    }

    /// Resolve a (metric, data type) pair
    pub fn lookup(&self, metric: MetricType, data_type: DataType) -> Option<SpecializationId> {
        self.get(VariantKey::new(metric, data_type))
    }

    /// Resolve a key
    pub fn get(&self, key: VariantKey) -> Option<SpecializationId> {
        self.entries.get(&key).copied()
    }

    /// Check if `key` has a specialization
    pub fn contains(&self, key: VariantKey) -> bool {
        self.entries.contains_key(&key)
    }

    /// Supported keys, sorted
    pub fn keys(&self) -> Vec<VariantKey> {
        let mut keys: Vec<VariantKey> = self.entries.keys().copied().collect();
        keys.sort();
        keys
    }

    /// Number of supported pairs
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
