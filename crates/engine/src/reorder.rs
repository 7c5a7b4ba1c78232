//! Graph reordering
//!
//! Renumbers nodes so that nodes linked to each other sit close together in
//! memory. Labels, vectors and links move with their node, so search results
//! are unaffected apart from entry selection policies that depend on node
//! order.

use crate::distance::Distance;
use crate::graph::{FlatIndex, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::info;

/// Node renumbering algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReorderStrategy {
    /// Reverse Cuthill-McKee bandwidth reduction
    ReverseCuthillMckee,
}

impl ReorderStrategy {
    /// All strategies
    pub const ALL: [ReorderStrategy; 1] = [ReorderStrategy::ReverseCuthillMckee];

    /// Canonical name
    pub const fn name(&self) -> &'static str {
        match self {
            ReorderStrategy::ReverseCuthillMckee => "rcm",
        }
    }

    /// Parse from a name (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "rcm" | "reverse_cuthill_mckee" => Some(ReorderStrategy::ReverseCuthillMckee),
            _ => None,
        }
    }
}

impl std::fmt::Display for ReorderStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl<D: Distance> FlatIndex<D> {
    /// Renumber nodes with `strategy`
    pub fn reorder(&mut self, strategy: ReorderStrategy) {
        if self.len() < 2 {
            return;
        }
        let permutation = match strategy {
            ReorderStrategy::ReverseCuthillMckee => rcm_permutation(&self.outgoing_links()),
        };
        self.relabel(&permutation);
        info!(key = %D::key(), nodes = self.len(), strategy = %strategy, "reordered index");
    }

    fn outgoing_links(&self) -> Vec<Vec<NodeId>> {
        (0..self.len() as NodeId)
            .map(|node| {
                self.node_links(node)
                    .iter()
                    .copied()
                    .filter(|&link| link != node)
                    .collect()
            })
            .collect()
    }

    /// Apply `permutation` where `permutation[old] == new`
    fn relabel(&mut self, permutation: &[NodeId]) {
        for link in self.links.iter_mut() {
            *link = permutation[*link as usize];
        }
        self.entry_node = permutation[self.entry_node as usize];

        // Cycle-follow in place; storage was reserved for full capacity and
        // must not be reallocated.
        let mut target: Vec<NodeId> = permutation.to_vec();
        for position in 0..target.len() {
            while target[position] as usize != position {
                let other = target[position] as usize;
                self.swap_nodes(position, other);
                target.swap(position, other);
            }
        }
    }

    fn swap_nodes(&mut self, a: usize, b: usize) {
        let (dim, m) = (self.dimension, self.max_edges);
        for i in 0..dim {
            self.vectors.swap(a * dim + i, b * dim + i);
        }
        for i in 0..m {
            self.links.swap(a * m + i, b * m + i);
        }
        self.labels.swap(a, b);
    }
}

/// Reverse Cuthill-McKee ordering of a directed adjacency list
///
/// Links are treated as undirected. Returns `permutation[old] == new`.
pub fn rcm_permutation(adjacency: &[Vec<NodeId>]) -> Vec<NodeId> {
    let n = adjacency.len();
    let mut undirected: Vec<Vec<NodeId>> = vec![Vec::new(); n];
    for (node, links) in adjacency.iter().enumerate() {
        for &link in links {
            undirected[node].push(link);
            undirected[link as usize].push(node as NodeId);
        }
    }
    for links in undirected.iter_mut() {
        links.sort_unstable();
        links.dedup();
    }
    let degree = |node: NodeId| undirected[node as usize].len();

    let mut by_degree: Vec<NodeId> = (0..n as NodeId).collect();
    by_degree.sort_by_key(|&node| (degree(node), node));

    let mut placed = vec![false; n];
    let mut order: Vec<NodeId> = Vec::with_capacity(n);
    let mut queue = VecDeque::new();

    for &start in &by_degree {
        if placed[start as usize] {
            continue;
        }
        placed[start as usize] = true;
        queue.push_back(start);

        while let Some(node) = queue.pop_front() {
            order.push(node);
            let mut next: Vec<NodeId> = undirected[node as usize]
                .iter()
                .copied()
                .filter(|&neighbor| !placed[neighbor as usize])
                .collect();
            next.sort_by_key(|&neighbor| (degree(neighbor), neighbor));
            for neighbor in next {
                placed[neighbor as usize] = true;
                queue.push_back(neighbor);
            }
        }
    }

    let mut permutation = vec![0; n];
    for (new, &old) in order.iter().rev().enumerate() {
        permutation[old as usize] = new as NodeId;
    }
    permutation
}
