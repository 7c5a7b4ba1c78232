//! Type-erased index handle
//!
//! [`IndexHandle`] wraps exactly one engine specialization. The wrapped
//! engine is a variant of a closed enum, so every operation is an exhaustive
//! `match`; there is no dynamic dispatch and no downcasting.

use crate::catalog::SpecializationId;
use std::fmt;
use std::path::Path;
use vecnav_core::{
    DataType, EngineError, EngineOptions, EngineResult, EntryPolicy, IndexResult, MetricType,
    VariantKey,
};
use vecnav_engine::{
    Element, FlatIndex, InnerProduct, Neighbor, ReorderStrategy, SquaredL2, VectorSlice,
};

pub(crate) enum AnyIndex {
    L2Float32(FlatIndex<SquaredL2<f32>>),
    InnerProductFloat32(FlatIndex<InnerProduct<f32>>),
    L2UInt8(FlatIndex<SquaredL2<u8>>),
    InnerProductUInt8(FlatIndex<InnerProduct<u8>>),
    L2Int8(FlatIndex<SquaredL2<i8>>),
    InnerProductInt8(FlatIndex<InnerProduct<i8>>),
}

/// Run `$body` with `$index` bound to the concrete engine
macro_rules! dispatch {
    ($inner:expr, $index:ident => $body:expr) => {
        match $inner {
            AnyIndex::L2Float32($index) => $body,
            AnyIndex::InnerProductFloat32($index) => $body,
            AnyIndex::L2UInt8($index) => $body,
            AnyIndex::InnerProductUInt8($index) => $body,
            AnyIndex::L2Int8($index) => $body,
            AnyIndex::InnerProductInt8($index) => $body,
        }
    };
}

impl AnyIndex {
    pub(crate) fn build(
        id: SpecializationId,
        dimension: usize,
        capacity: usize,
        entry_policy: EntryPolicy,
        options: EngineOptions,
    ) -> EngineResult<Self> {
        Ok(match id {
            SpecializationId::L2Float32 => {
                AnyIndex::L2Float32(FlatIndex::new(dimension, capacity, entry_policy, options)?)
            }
            SpecializationId::InnerProductFloat32 => AnyIndex::InnerProductFloat32(
                FlatIndex::new(dimension, capacity, entry_policy, options)?,
            ),
            SpecializationId::L2UInt8 => {
                AnyIndex::L2UInt8(FlatIndex::new(dimension, capacity, entry_policy, options)?)
            }
            SpecializationId::InnerProductUInt8 => AnyIndex::InnerProductUInt8(FlatIndex::new(
                dimension,
                capacity,
                entry_policy,
                options,
            )?),
            SpecializationId::L2Int8 => {
                AnyIndex::L2Int8(FlatIndex::new(dimension, capacity, entry_policy, options)?)
            }
            SpecializationId::InnerProductInt8 => AnyIndex::InnerProductInt8(FlatIndex::new(
                dimension,
                capacity,
                entry_policy,
                options,
            )?),
        })
    }

    pub(crate) fn load(id: SpecializationId, path: &Path) -> EngineResult<Self> {
        Ok(match id {
            SpecializationId::L2Float32 => AnyIndex::L2Float32(FlatIndex::load(path)?),
            SpecializationId::InnerProductFloat32 => {
                AnyIndex::InnerProductFloat32(FlatIndex::load(path)?)
            }
            SpecializationId::L2UInt8 => AnyIndex::L2UInt8(FlatIndex::load(path)?),
            SpecializationId::InnerProductUInt8 => {
                AnyIndex::InnerProductUInt8(FlatIndex::load(path)?)
            }
            SpecializationId::L2Int8 => AnyIndex::L2Int8(FlatIndex::load(path)?),
            SpecializationId::InnerProductInt8 => {
                AnyIndex::InnerProductInt8(FlatIndex::load(path)?)
            }
        })
    }

    fn key(&self) -> VariantKey {
        dispatch!(self, index => index.key())
    }
}

fn typed<'a, T: Element>(slice: VectorSlice<'a>) -> EngineResult<&'a [T]> {
    T::from_vector_slice(slice).ok_or(EngineError::DataTypeMismatch {
        expected: T::DATA_TYPE,
        got: slice.data_type(),
    })
}

/// A constructed index of one specialization
///
/// Owns its engine exclusively: two handles never share vectors or links.
pub struct IndexHandle {
    specialization: SpecializationId,
    inner: AnyIndex,
}

impl IndexHandle {
    pub(crate) fn new(specialization: SpecializationId, inner: AnyIndex) -> Self {
        debug_assert_eq!(specialization.key(), inner.key());
        IndexHandle {
            specialization,
            inner,
        }
    }

    /// Load a saved index using the built-in catalog
    pub fn load(path: impl AsRef<Path>) -> IndexResult<Self> {
        crate::factory::load(path)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Engine specialization behind this handle
    pub fn specialization(&self) -> SpecializationId {
        self.specialization
    }

    /// (metric, data type) pair
    pub fn key(&self) -> VariantKey {
        self.specialization.key()
    }

    /// Distance metric
    pub fn metric(&self) -> MetricType {
        self.key().metric
    }

    /// Element data type
    pub fn data_type(&self) -> DataType {
        self.key().data_type
    }

    /// Vector dimension
    pub fn dimension(&self) -> usize {
        dispatch!(&self.inner, index => index.dimension())
    }

    /// Maximum number of vectors
    pub fn capacity(&self) -> usize {
        dispatch!(&self.inner, index => index.capacity())
    }

    /// Number of stored vectors
    pub fn len(&self) -> usize {
        dispatch!(&self.inner, index => index.len())
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entry point selection policy
    pub fn entry_policy(&self) -> EntryPolicy {
        dispatch!(&self.inner, index => index.entry_policy())
    }

    /// Maximum outgoing links per node
    pub fn max_edges_per_node(&self) -> usize {
        dispatch!(&self.inner, index => index.max_edges_per_node())
    }

    /// Options the engine was built with
    pub fn options(&self) -> &EngineOptions {
        dispatch!(&self.inner, index => index.options())
    }

    /// Labels in internal node order
    pub fn labels(&self) -> &[u64] {
        dispatch!(&self.inner, index => index.labels())
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Insert vectors laid out back to back, one label per vector
    ///
    /// The element type of `vectors` must match the handle's data type.
    pub fn add<'a>(&mut self, vectors: impl Into<VectorSlice<'a>>, labels: &[u64]) -> IndexResult<()> {
        let vectors = vectors.into();
        dispatch!(&mut self.inner, index => index.add(typed(vectors)?, labels)?);
        Ok(())
    }

    /// Find the `k` nearest vectors with the configured `ef_search`
    pub fn search<'a>(
        &self,
        query: impl Into<VectorSlice<'a>>,
        k: usize,
    ) -> IndexResult<Vec<Neighbor>> {
        let query = query.into();
        Ok(dispatch!(&self.inner, index => index.search(typed(query)?, k, None)?))
    }

    /// Find the `k` nearest vectors with an explicit beam width
    pub fn search_with_ef<'a>(
        &self,
        query: impl Into<VectorSlice<'a>>,
        k: usize,
        ef_search: usize,
    ) -> IndexResult<Vec<Neighbor>> {
        let query = query.into();
        Ok(dispatch!(&self.inner, index => index.search(typed(query)?, k, Some(ef_search))?))
    }

    /// Search several queries laid out back to back
    pub fn search_batch<'a>(
        &self,
        queries: impl Into<VectorSlice<'a>>,
        k: usize,
        ef_search: Option<usize>,
    ) -> IndexResult<Vec<Vec<Neighbor>>> {
        let queries = queries.into();
        Ok(dispatch!(&self.inner, index => index.search_batch(typed(queries)?, k, ef_search)?))
    }

    /// Write the index to `path`
    pub fn save(&self, path: impl AsRef<Path>) -> IndexResult<()> {
        let path = path.as_ref();
        dispatch!(&self.inner, index => index.save(path)?);
        Ok(())
    }

    /// Renumber internal nodes for memory locality
    pub fn reorder(&mut self, strategy: ReorderStrategy) {
        dispatch!(&mut self.inner, index => index.reorder(strategy))
    }
}

impl fmt::Debug for IndexHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexHandle")
            .field("specialization", &self.specialization)
            .field("dimension", &self.dimension())
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .field("entry_policy", &self.entry_policy())
            .finish()
    }
}
