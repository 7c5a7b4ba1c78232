//! Core types for vecnav
//!
//! This crate holds the pieces every other crate agrees on:
//! - Type registry: [`DataType`], [`MetricType`], [`VariantKey`]
//! - Entry policy selector: [`EntryPolicy`]
//! - Engine options: [`EngineOptions`], [`ConfigurationMap`]
//! - Errors: [`IndexError`], [`EngineError`]

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod entry_policy;
pub mod error;
pub mod options;
pub mod registry;

pub use entry_policy::EntryPolicy;
pub use error::{EngineError, EngineResult, IndexError, IndexResult, TypeKind};
pub use options::{ConfigurationMap, EngineOptions};
pub use registry::{DataType, MetricType, VariantKey};
