//! Entry node selection
//!
//! Every insert and search starts its beam from one node chosen by the
//! index's [`EntryPolicy`]:
//!
//! - `FirstNode`: the first inserted node, wherever reordering moved it
//! - `Random`: uniform over stored nodes, from the index's seeded RNG
//! - `SampledGreedy`: scan every `max(len / num_initializations, 1)`-th node
//!   and take the one closest to the query

use crate::distance::Distance;
use crate::graph::{FlatIndex, NodeId};
use rand::Rng;
use vecnav_core::EntryPolicy;

impl<D: Distance> FlatIndex<D> {
    /// Pick the node a traversal for `query` starts from
    ///
    /// Must not be called on an empty index.
    pub(crate) fn select_entry(&self, query: &[D::Element]) -> NodeId {
        let count = self.len();
        debug_assert!(count > 0, "entry selection on an empty index");

        match self.entry_policy {
            EntryPolicy::FirstNode => self.entry_node,
            EntryPolicy::Random => self.rng.lock().gen_range(0..count) as NodeId,
            EntryPolicy::SampledGreedy => {
                let stride = sample_stride(count, self.options.num_initializations);
                (0..count)
                    .step_by(stride)
                    .map(|node| {
                        let node = node as NodeId;
                        (D::distance(query, self.node_vector(node)), node)
                    })
                    .min_by(|a, b| a.0.total_cmp(&b.0))
                    .map_or(0, |(_, node)| node)
            }
        }
    }
}

/// Gap between sampled nodes
pub(crate) fn sample_stride(count: usize, samples: usize) -> usize {
    (count / samples.max(1)).max(1)
}
