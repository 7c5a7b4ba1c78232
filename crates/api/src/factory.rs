//! Index factory
//!
//! Validates construction parameters, resolves the (metric, data type) pair
//! through a [`VariantCatalog`] and builds the matching engine.
//!
//! ## Validation Order
//!
//! Typed entry ([`IndexFactory::create`]):
//!
//! 1. `dimension == 0` or `capacity` beyond the node id space →
//!    `InvalidParameter`
//! 2. pair missing from the catalog → `UnsupportedCombination`
//! 3. options map rejected → `InvalidParameter`
//! 4. engine construction fails → `EngineConstruction`
//!
//! Name-based entry ([`IndexFactory::create_from_request`]) checks, before
//! the steps above: dimension ≤ 0, capacity < 0, metric and data type names
//! (`UnsupportedType`), then the entry policy name (`InvalidEntryPolicy`).
//!
//! Every rejection in steps 1-3 happens before any engine storage is
//! reserved.

use crate::catalog::{SpecializationId, VariantCatalog};
use crate::handle::{AnyIndex, IndexHandle};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::path::Path;
use tracing::{debug, warn};
use vecnav_core::{
    ConfigurationMap, DataType, EngineOptions, EntryPolicy, IndexError, IndexResult, MetricType,
    TypeKind,
};
use vecnav_engine::{read_header, NodeId};

/// Loosely typed construction request
///
/// Mirrors what arrives from a config file or a foreign caller: names as
/// strings, sizes as signed integers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateRequest {
    /// Metric name, e.g. `"l2"`
    pub metric: String,
    /// Data type name, e.g. `"float32"`
    pub data_type: String,
    /// Vector dimension (must be > 0)
    pub dimension: i64,
    /// Maximum number of vectors (must be >= 0)
    pub capacity: i64,
    /// Entry policy name
    #[serde(default = "default_entry_policy")]
    pub entry_policy: String,
    /// Engine options
    #[serde(default)]
    pub options: ConfigurationMap,
}

fn default_entry_policy() -> String {
    EntryPolicy::default().name().to_string()
}

/// Builds [`IndexHandle`]s from a catalog
#[derive(Debug, Clone)]
pub struct IndexFactory {
    catalog: Cow<'static, VariantCatalog>,
}

impl Default for IndexFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexFactory {
    /// Factory over the built-in catalog
    pub fn new() -> Self {
        IndexFactory {
            catalog: Cow::Borrowed(VariantCatalog::builtin()),
        }
    }

    /// Factory restricted to `catalog`
    pub fn with_catalog(catalog: VariantCatalog) -> Self {
        IndexFactory {
            catalog: Cow::Owned(catalog),
        }
    }

    /// Catalog this factory resolves against
    pub fn catalog(&self) -> &VariantCatalog {
        &self.catalog
    }

    /// Check if this factory can build `(metric, data_type)`
    pub fn supports(&self, metric: MetricType, data_type: DataType) -> bool {
        self.catalog.lookup(metric, data_type).is_some()
    }

    /// Create an index, parsing engine options from a map
    pub fn create(
        &self,
        metric: MetricType,
        data_type: DataType,
        dimension: usize,
        capacity: usize,
        entry_policy: EntryPolicy,
        options: &ConfigurationMap,
    ) -> IndexResult<IndexHandle> {
        let id = self.resolve(metric, data_type, dimension, capacity)?;
        let options = EngineOptions::from_map(options).map_err(|e| {
            warn!(metric = %metric, data_type = %data_type, error = %e, "rejected engine options");
            e
        })?;
        self.build(id, dimension, capacity, entry_policy, options)
    }

    /// Create an index with already-typed engine options
    pub fn create_with_options(
        &self,
        metric: MetricType,
        data_type: DataType,
        dimension: usize,
        capacity: usize,
        entry_policy: EntryPolicy,
        options: EngineOptions,
    ) -> IndexResult<IndexHandle> {
        let id = self.resolve(metric, data_type, dimension, capacity)?;
        options.validate()?;
        self.build(id, dimension, capacity, entry_policy, options)
    }

    /// Create an index from names and signed sizes
    pub fn create_from_request(&self, request: &CreateRequest) -> IndexResult<IndexHandle> {
        if request.dimension <= 0 {
            return Err(IndexError::invalid_parameter(
                "dimension",
                format!("must be > 0, got {}", request.dimension),
            ));
        }
        if request.capacity < 0 {
            return Err(IndexError::invalid_parameter(
                "capacity",
                format!("must be >= 0, got {}", request.capacity),
            ));
        }
        let dimension = to_usize("dimension", request.dimension)?;
        let capacity = to_usize("capacity", request.capacity)?;

        let metric = MetricType::parse(&request.metric).ok_or_else(|| IndexError::UnsupportedType {
            kind: TypeKind::Metric,
            name: request.metric.clone(),
        })?;
        let data_type =
            DataType::parse(&request.data_type).ok_or_else(|| IndexError::UnsupportedType {
                kind: TypeKind::DataType,
                name: request.data_type.clone(),
            })?;
        let entry_policy = EntryPolicy::validate(&request.entry_policy)?;

        self.create(
            metric,
            data_type,
            dimension,
            capacity,
            entry_policy,
            &request.options,
        )
    }

    /// Load a saved index
    ///
    /// The file's (metric, data type) must be in this factory's catalog.
    pub fn load(&self, path: impl AsRef<Path>) -> IndexResult<IndexHandle> {
        let path = path.as_ref();
        let header = read_header(path)?;
        let key = header.key;
        let id = self
            .catalog
            .get(key)
            .ok_or(IndexError::UnsupportedCombination {
                metric: key.metric,
                data_type: key.data_type,
            })?;
        let inner = AnyIndex::load(id, path)?;
        debug!(path = %path.display(), specialization = %id, "loaded index handle");
        Ok(IndexHandle::new(id, inner))
    }

    fn resolve(
        &self,
        metric: MetricType,
        data_type: DataType,
        dimension: usize,
        capacity: usize,
    ) -> IndexResult<SpecializationId> {
        if dimension == 0 {
            return Err(IndexError::invalid_parameter("dimension", "must be > 0"));
        }
        if capacity > NodeId::MAX as usize {
            return Err(IndexError::invalid_parameter(
                "capacity",
                format!("must be <= {}, got {}", NodeId::MAX, capacity),
            ));
        }
        self.catalog.lookup(metric, data_type).ok_or_else(|| {
            warn!(metric = %metric, data_type = %data_type, "no specialization in catalog");
            IndexError::UnsupportedCombination { metric, data_type }
        })
    }

    fn build(
        &self,
        id: SpecializationId,
        dimension: usize,
        capacity: usize,
        entry_policy: EntryPolicy,
        options: EngineOptions,
    ) -> IndexResult<IndexHandle> {
        let inner = AnyIndex::build(id, dimension, capacity, entry_policy, options).map_err(
            |source| {
                warn!(specialization = %id, dimension, capacity, error = %source, "engine construction failed");
                IndexError::EngineConstruction {
                    key: id.key(),
                    source,
                }
            },
        )?;
        debug!(
            specialization = %id,
            dimension,
            capacity,
            policy = %entry_policy,
            "created index"
        );
        Ok(IndexHandle::new(id, inner))
    }
}

fn to_usize(parameter: &str, value: i64) -> IndexResult<usize> {
    usize::try_from(value)
        .map_err(|_| IndexError::invalid_parameter(parameter, format!("{} does not fit in usize", value)))
}

/// Create an index with the built-in catalog
pub fn create(
    metric: MetricType,
    data_type: DataType,
    dimension: usize,
    capacity: usize,
    entry_policy: EntryPolicy,
    options: &ConfigurationMap,
) -> IndexResult<IndexHandle> {
    IndexFactory::new().create(metric, data_type, dimension, capacity, entry_policy, options)
}

/// Create an index from a [`CreateRequest`] with the built-in catalog
pub fn create_from_request(request: &CreateRequest) -> IndexResult<IndexHandle> {
    IndexFactory::new().create_from_request(request)
}

/// Load a saved index with the built-in catalog
pub fn load(path: impl AsRef<Path>) -> IndexResult<IndexHandle> {
    IndexFactory::new().load(path)
}
