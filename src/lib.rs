//! # vecnav
//!
//! Approximate nearest-neighbor search over a flat navigable graph.
//!
//! A single entry point picks the engine specialization for a
//! (metric, data type) pair at runtime and hands back an [`IndexHandle`]
//! that hides which one was chosen.
//!
//! ## Quick Start
//!
//! ```ignore
//! use vecnav::prelude::*;
//!
//! let mut index = create(
//!     MetricType::L2,
//!     DataType::Float32,
//!     128,
//!     10_000,
//!     EntryPolicy::SampledGreedy,
//!     &ConfigurationMap::new(),
//! )?;
//! index.add(&vectors, &labels)?;
//! let nearest = index.search(&query, 10)?;
//! index.save("vectors.vnav")?;
//!
//! let reopened = load("vectors.vnav")?;
//! ```
//!
//! ## Specializations
//!
//! | Metric | float32 | uint8 | int8 |
//! |--------|---------|-------|------|
//! | l2 | yes | yes | yes |
//! | inner_product | yes | yes | yes |
//!
//! ## Crates
//!
//! - [`vecnav_core`] - type registry, entry policies, options, errors
//! - [`vecnav_engine`] - the graph engine, persistence and reordering
//! - [`vecnav_api`] - catalog, factory and type-erased handle

#![warn(missing_docs)]

pub mod prelude;

pub use vecnav_api::{
    create, create_from_request, load, CreateRequest, IndexFactory, IndexHandle,
    SpecializationId, VariantCatalog,
};
pub use vecnav_core::{
    ConfigurationMap, DataType, EngineError, EngineOptions, EngineResult, EntryPolicy,
    IndexError, IndexResult, MetricType, TypeKind, VariantKey,
};
pub use vecnav_engine::{read_header, IndexHeader, Neighbor, ReorderStrategy, VectorSlice};

/// Engine internals for callers that want a statically typed index
pub mod engine {
    pub use vecnav_engine::*;
}
