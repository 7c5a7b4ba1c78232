//! Index facade for vecnav
//!
//! Turns a (metric, data type, dimension, capacity, entry policy, options)
//! request into an [`IndexHandle`] backed by the right engine
//! specialization.
//!
//! ```ignore
//! use vecnav_api::{create, ConfigurationMap, DataType, EntryPolicy, MetricType};
//!
//! let mut index = create(
//!     MetricType::L2,
//!     DataType::Float32,
//!     128,
//!     1000,
//!     EntryPolicy::FirstNode,
//!     &ConfigurationMap::new(),
//! )?;
//! index.add(&vectors, &labels)?;
//! let nearest = index.search(&query, 10)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod catalog;
pub mod factory;
pub mod handle;

pub use catalog::{SpecializationId, VariantCatalog};
pub use factory::{create, create_from_request, load, CreateRequest, IndexFactory};
pub use handle::IndexHandle;

pub use vecnav_core::{
    ConfigurationMap, DataType, EngineError, EngineOptions, EntryPolicy, IndexError, IndexResult,
    MetricType, TypeKind, VariantKey,
};
pub use vecnav_engine::{Neighbor, ReorderStrategy, VectorSlice};
