//! Convenient imports for vecnav.
//!
//! ```ignore
//! use vecnav::prelude::*;
//!
//! let index = load("vectors.vnav")?;
//! ```

// Entry points
pub use crate::{create, create_from_request, load};

// Handle and factory
pub use crate::{CreateRequest, IndexFactory, IndexHandle};

// Selectors
pub use crate::{ConfigurationMap, DataType, EngineOptions, EntryPolicy, MetricType, VariantKey};

// Results
pub use crate::{IndexError, IndexResult, Neighbor, ReorderStrategy};
