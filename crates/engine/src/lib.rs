//! Flat navigable-graph index engine
//!
//! One generic engine, [`FlatIndex<D>`], monomorphized per distance kernel.
//! Each `D` fixes both the metric and the element type, so the six
//! supported (metric, dtype) pairs are six distinct types:
//!
//! | Metric | f32 | u8 | i8 |
//! |--------|-----|----|----|
//! | L2 | `FlatIndex<SquaredL2<f32>>` | `FlatIndex<SquaredL2<u8>>` | `FlatIndex<SquaredL2<i8>>` |
//! | Inner product | `FlatIndex<InnerProduct<f32>>` | `FlatIndex<InnerProduct<u8>>` | `FlatIndex<InnerProduct<i8>>` |
//!
//! Modules:
//! - `graph`: storage, insertion and beam search
//! - `entry`: entry node selection per [`EntryPolicy`](vecnav_core::EntryPolicy)
//! - `persist`: save/load with checksummed file format
//! - `reorder`: cache-friendly node renumbering

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod distance;
pub mod element;
mod entry;
pub mod graph;
pub mod persist;
pub mod reorder;
pub mod visited;

pub use distance::{Distance, InnerProduct, SquaredL2};
pub use element::{Element, VectorSlice};
pub use graph::{FlatIndex, Neighbor, NodeId};
pub use persist::{read_header, IndexHeader, FORMAT_VERSION, HEADER_SIZE, MAGIC};
pub use reorder::{rcm_permutation, ReorderStrategy};
pub use visited::VisitedSet;
