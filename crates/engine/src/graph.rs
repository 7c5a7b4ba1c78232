//! Flat navigable graph index
//!
//! ## Layout
//!
//! Every node owns three fixed-width records, each kept in its own
//! contiguous buffer and addressed by node id:
//!
//! | Buffer | Width per node |
//! |--------|----------------|
//! | vectors | `dimension` elements |
//! | links | `max_edges_per_node` node ids |
//! | labels | one `u64` |
//!
//! Unused link slots hold the node's own id (a self-loop). All three buffers
//! are reserved for `capacity` nodes at construction and never reallocate.
//!
//! ## Insertion
//!
//! 1. Pick an entry node with the configured [`EntryPolicy`]
//! 2. Append the node with self-loops only
//! 3. Beam search from the entry with `ef_construction`
//! 4. Keep a diverse subset of the results (HNSW heuristic)
//! 5. Link the node to that subset and add back-links, pruning any
//!    neighbor whose link list is already full

use crate::distance::Distance;
use crate::element::Element;
use crate::visited::VisitedSet;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::marker::PhantomData;
use tracing::debug;
use vecnav_core::{
    DataType, EngineError, EngineOptions, EngineResult, EntryPolicy, MetricType, VariantKey,
};

/// Internal node number
pub type NodeId = u32;

/// One search result
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    /// Caller-assigned label of the stored vector
    pub label: u64,
    /// Distance to the query (lower = closer)
    pub distance: f32,
}

/// A node paired with its distance to some reference vector
///
/// Ordered by distance, then node id, so heaps are deterministic.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Candidate {
    pub distance: f32,
    pub node: NodeId,
}

impl Candidate {
    pub(crate) fn new(distance: f32, node: NodeId) -> Self {
        Candidate { distance, node }
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then_with(|| self.node.cmp(&other.node))
    }
}

/// Single-layer navigable graph over vectors of one (metric, dtype) pair
pub struct FlatIndex<D: Distance> {
    pub(crate) dimension: usize,
    pub(crate) capacity: usize,
    pub(crate) max_edges: usize,
    pub(crate) entry_policy: EntryPolicy,
    pub(crate) options: EngineOptions,
    pub(crate) vectors: Vec<D::Element>,
    pub(crate) links: Vec<NodeId>,
    pub(crate) labels: Vec<u64>,
    /// First inserted node; tracks renumbering
    pub(crate) entry_node: NodeId,
    pub(crate) rng: Mutex<StdRng>,
    visited_pool: Mutex<Vec<VisitedSet>>,
    _distance: PhantomData<fn() -> D>,
}

impl<D: Distance> std::fmt::Debug for FlatIndex<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlatIndex")
            .field("key", &D::key())
            .field("dimension", &self.dimension)
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .field("max_edges", &self.max_edges)
            .field("entry_policy", &self.entry_policy)
            .finish()
    }
}

impl<D: Distance> FlatIndex<D> {
    /// Create an empty index with storage reserved for `capacity` nodes
    ///
    /// # Errors
    /// - `InvalidConfiguration` if dimension is 0, options are out of
    ///   range or capacity exceeds the node id space
    /// - `Allocation` if the backing buffers cannot be reserved
    pub fn new(
        dimension: usize,
        capacity: usize,
        entry_policy: EntryPolicy,
        options: EngineOptions,
    ) -> EngineResult<Self> {
        if dimension == 0 {
            return Err(EngineError::InvalidConfiguration(
                "dimension must be > 0".to_string(),
            ));
        }
        if capacity > NodeId::MAX as usize {
            return Err(EngineError::InvalidConfiguration(format!(
                "capacity {} exceeds the node id limit {}",
                capacity,
                NodeId::MAX
            )));
        }
        options
            .validate()
            .map_err(|e| EngineError::InvalidConfiguration(e.to_string()))?;

        let max_edges = options.max_edges_per_node;
        let mut vectors = Vec::new();
        let mut links = Vec::new();
        let mut labels = Vec::new();
        reserve_total(&mut vectors, "vectors", capacity.checked_mul(dimension))?;
        reserve_total(&mut links, "links", capacity.checked_mul(max_edges))?;
        reserve_total(&mut labels, "labels", Some(capacity))?;

        debug!(
            key = %D::key(),
            dimension,
            capacity,
            max_edges,
            policy = %entry_policy,
            "reserved flat index storage"
        );

        Ok(Self::from_parts(
            dimension,
            capacity,
            entry_policy,
            options,
            vectors,
            links,
            labels,
            0,
        ))
    }

    pub(crate) fn from_parts(
        dimension: usize,
        capacity: usize,
        entry_policy: EntryPolicy,
        options: EngineOptions,
        vectors: Vec<D::Element>,
        links: Vec<NodeId>,
        labels: Vec<u64>,
        entry_node: NodeId,
    ) -> Self {
        FlatIndex {
            dimension,
            capacity,
            max_edges: options.max_edges_per_node,
            entry_policy,
            rng: Mutex::new(StdRng::seed_from_u64(options.seed)),
            options,
            vectors,
            links,
            labels,
            entry_node,
            visited_pool: Mutex::new(Vec::new()),
            _distance: PhantomData,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Vector dimension
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Maximum number of nodes
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of stored nodes
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Maximum outgoing links per node
    pub fn max_edges_per_node(&self) -> usize {
        self.max_edges
    }

    /// Entry point selection policy
    pub fn entry_policy(&self) -> EntryPolicy {
        self.entry_policy
    }

    /// Options the index was built with
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Distance metric
    pub fn metric(&self) -> MetricType {
        D::METRIC
    }

    /// Element data type
    pub fn data_type(&self) -> DataType {
        <D::Element as Element>::DATA_TYPE
    }

    /// (metric, data type) this index is specialized for
    pub fn key(&self) -> VariantKey {
        D::key()
    }

    /// Labels in node order
    pub fn labels(&self) -> &[u64] {
        &self.labels
    }

    /// Bytes reserved for vectors, links and labels
    pub fn reserved_bytes(&self) -> usize {
        self.vectors.capacity() * std::mem::size_of::<D::Element>()
            + self.links.capacity() * std::mem::size_of::<NodeId>()
            + self.labels.capacity() * std::mem::size_of::<u64>()
    }

    pub(crate) fn node_vector(&self, node: NodeId) -> &[D::Element] {
        let start = node as usize * self.dimension;
        &self.vectors[start..start + self.dimension]
    }

    pub(crate) fn node_links(&self, node: NodeId) -> &[NodeId] {
        let start = node as usize * self.max_edges;
        &self.links[start..start + self.max_edges]
    }

    // ========================================================================
    // Insertion
    // ========================================================================

    /// Insert a batch of vectors laid out back to back
    ///
    /// `vectors.len()` must equal `labels.len() * dimension`. The whole batch
    /// must fit in the remaining capacity; nothing is inserted otherwise.
    /// Labels are not required to be unique.
    pub fn add(&mut self, vectors: &[D::Element], labels: &[u64]) -> EngineResult<()> {
        if vectors.len() % self.dimension != 0 {
            return Err(EngineError::DimensionMismatch {
                expected: self.dimension,
                got: vectors.len(),
            });
        }
        let batch = vectors.len() / self.dimension;
        if batch != labels.len() {
            return Err(EngineError::LabelCountMismatch {
                vectors: batch,
                labels: labels.len(),
            });
        }
        let available = self.capacity - self.len();
        if batch > available {
            return Err(EngineError::CapacityExceeded {
                capacity: self.capacity,
                available,
                requested: batch,
            });
        }

        let mut visited = self
            .visited_pool
            .get_mut()
            .pop()
            .unwrap_or_else(|| VisitedSet::new(self.len() + batch));
        for (vector, &label) in vectors.chunks_exact(self.dimension).zip(labels) {
            self.insert(vector, label, &mut visited);
        }
        self.visited_pool.get_mut().push(visited);

        debug!(key = %D::key(), inserted = batch, len = self.len(), "added vectors");
        Ok(())
    }

    fn insert(&mut self, vector: &[D::Element], label: u64, visited: &mut VisitedSet) {
        // The entry must be chosen before the node exists, or the new node
        // (distance 0, no links) would be picked and end the search at once.
        let entry = if self.is_empty() {
            None
        } else {
            Some(self.select_entry(vector))
        };
        let node = self.allocate_node(vector, label);
        if entry.is_none() {
            self.entry_node = node;
        }

        if let Some(entry) = entry {
            visited.resize(self.len());
            let found = self.beam_search(vector, entry, self.options.ef_construction, visited);
            let selected = self.select_neighbors(found, self.max_edges);
            self.connect_neighbors(node, &selected);
        }
    }

    fn allocate_node(&mut self, vector: &[D::Element], label: u64) -> NodeId {
        let node = self.labels.len() as NodeId;
        self.vectors.extend_from_slice(vector);
        self.links
            .extend(std::iter::repeat(node).take(self.max_edges));
        self.labels.push(label);
        node
    }

    /// Keep up to `m` candidates, nearest first, skipping any candidate that
    /// is closer to an already kept one than to the reference vector.
    fn select_neighbors(&self, candidates: BinaryHeap<Candidate>, m: usize) -> Vec<Candidate> {
        if candidates.len() < m {
            return candidates.into_sorted_vec();
        }

        let mut selected: Vec<Candidate> = Vec::with_capacity(m);
        for candidate in candidates.into_sorted_vec() {
            if selected.len() >= m {
                break;
            }
            let diverse = selected.iter().all(|kept| {
                D::distance(self.node_vector(kept.node), self.node_vector(candidate.node))
                    >= candidate.distance
            });
            if diverse {
                selected.push(candidate);
            }
        }
        selected
    }

    fn connect_neighbors(&mut self, node: NodeId, selected: &[Candidate]) {
        let m = self.max_edges;
        let own = node as usize * m;
        for (slot, candidate) in selected.iter().take(m).enumerate() {
            self.links[own + slot] = candidate.node;
        }

        for candidate in selected {
            let neighbor = candidate.node;
            let start = neighbor as usize * m;

            if let Some(slot) = self.links[start..start + m]
                .iter()
                .position(|&link| link == neighbor)
            {
                self.links[start + slot] = node;
                continue;
            }

            // Neighbor is full: re-select among its links plus the new node.
            let origin = self.node_vector(neighbor);
            let mut pool = BinaryHeap::with_capacity(m + 1);
            pool.push(Candidate::new(
                D::distance(origin, self.node_vector(node)),
                node,
            ));
            for &link in self.node_links(neighbor) {
                if link != neighbor {
                    pool.push(Candidate::new(
                        D::distance(origin, self.node_vector(link)),
                        link,
                    ));
                }
            }
            let pruned = self.select_neighbors(pool, m);

            for (i, slot) in self.links[start..start + m].iter_mut().enumerate() {
                *slot = pruned.get(i).map_or(neighbor, |c| c.node);
            }
        }
    }

    // ========================================================================
    // Search
    // ========================================================================

    /// Greedy beam search from `entry`
    ///
    /// Returns up to `buffer_size` nodes as a max-heap (farthest on top).
    pub(crate) fn beam_search(
        &self,
        query: &[D::Element],
        entry: NodeId,
        buffer_size: usize,
        visited: &mut VisitedSet,
    ) -> BinaryHeap<Candidate> {
        visited.clear();

        let distance = D::distance(query, self.node_vector(entry));
        let mut max_distance = distance;
        let mut candidates = BinaryHeap::new();
        let mut nearest = BinaryHeap::new();
        candidates.push(Reverse(Candidate::new(distance, entry)));
        nearest.push(Candidate::new(distance, entry));
        visited.insert(entry);

        while let Some(Reverse(current)) = candidates.pop() {
            if current.distance > max_distance {
                break;
            }
            for &link in self.node_links(current.node) {
                if !visited.insert(link) {
                    continue;
                }
                let distance = D::distance(query, self.node_vector(link));
                if nearest.len() < buffer_size || distance < max_distance {
                    candidates.push(Reverse(Candidate::new(distance, link)));
                    nearest.push(Candidate::new(distance, link));
                    if nearest.len() > buffer_size {
                        nearest.pop();
                    }
                    if let Some(worst) = nearest.peek() {
                        max_distance = worst.distance;
                    }
                }
            }
        }
        nearest
    }

    /// Find up to `k` nearest stored vectors, closest first
    ///
    /// The beam width is `max(ef_search, k)`; `None` uses the index's
    /// configured `ef_search`. An empty index or `k == 0` yields no results.
    pub fn search(
        &self,
        query: &[D::Element],
        k: usize,
        ef_search: Option<usize>,
    ) -> EngineResult<Vec<Neighbor>> {
        if query.len() != self.dimension {
            return Err(EngineError::DimensionMismatch {
                expected: self.dimension,
                got: query.len(),
            });
        }
        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let ef = ef_search.unwrap_or(self.options.ef_search).max(k);
        let entry = self.select_entry(query);
        let found = self.with_visited(|visited| self.beam_search(query, entry, ef, visited));

        Ok(found
            .into_sorted_vec()
            .into_iter()
            .take(k)
            .map(|c| Neighbor {
                label: self.labels[c.node as usize],
                distance: c.distance,
            })
            .collect())
    }

    /// Search several queries laid out back to back
    pub fn search_batch(
        &self,
        queries: &[D::Element],
        k: usize,
        ef_search: Option<usize>,
    ) -> EngineResult<Vec<Vec<Neighbor>>> {
        if queries.len() % self.dimension != 0 {
            return Err(EngineError::DimensionMismatch {
                expected: self.dimension,
                got: queries.len(),
            });
        }
        queries
            .chunks_exact(self.dimension)
            .map(|query| self.search(query, k, ef_search))
            .collect()
    }

    fn with_visited<R>(&self, f: impl FnOnce(&mut VisitedSet) -> R) -> R {
        let mut visited = self
            .visited_pool
            .lock()
            .pop()
            .unwrap_or_else(|| VisitedSet::new(self.len()));
        visited.resize(self.len());
        let result = f(&mut visited);
        self.visited_pool.lock().push(visited);
        result
    }
}

/// Grow `buf` so it can hold `total` elements without reallocating
pub(crate) fn reserve_total<T>(
    buf: &mut Vec<T>,
    what: &'static str,
    total: Option<usize>,
) -> EngineResult<()> {
    let total = total.ok_or_else(|| EngineError::Allocation {
        what,
        elements: usize::MAX,
        reason: "element count overflows usize".to_string(),
    })?;
    let additional = total.saturating_sub(buf.len());
    buf.try_reserve_exact(additional)
        .map_err(|e| EngineError::Allocation {
            what,
            elements: total,
            reason: e.to_string(),
        })
}
