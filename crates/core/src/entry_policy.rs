//! Entry point selection policies
//!
//! An entry policy decides which graph node a beam search starts from.
//! The facade only validates the policy; the engine interprets it.

use crate::error::{IndexError, IndexResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Strategy for choosing the initial traversal node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryPolicy {
    /// Always start from the first inserted node
    FirstNode,

    /// Start from a uniformly random node
    ///
    /// The generator is seeded from `EngineOptions::seed`, so a given
    /// index replays the same sequence of entry points.
    Random,

    /// Sample `num_initializations` evenly strided nodes and start from
    /// the one closest to the query
    #[default]
    SampledGreedy,
}

impl EntryPolicy {
    /// All policies (for iteration)
    pub const ALL: [EntryPolicy; 3] = [
        EntryPolicy::FirstNode,
        EntryPolicy::Random,
        EntryPolicy::SampledGreedy,
    ];

    /// Canonical name
    pub const fn name(&self) -> &'static str {
        match self {
            EntryPolicy::FirstNode => "first_node",
            EntryPolicy::Random => "random",
            EntryPolicy::SampledGreedy => "sampled_greedy",
        }
    }

    /// Map a policy name to a policy
    ///
    /// # Errors
    /// - `InvalidEntryPolicy` if the name is not recognized
    pub fn validate(name: &str) -> IndexResult<Self> {
        match name.trim().to_lowercase().as_str() {
            "first_node" | "first" => Ok(EntryPolicy::FirstNode),
            "random" => Ok(EntryPolicy::Random),
            "sampled_greedy" | "sampled" => Ok(EntryPolicy::SampledGreedy),
            _ => Err(IndexError::InvalidEntryPolicy {
                name: name.to_string(),
            }),
        }
    }

    /// Serialization value for the index file header
    pub const fn to_byte(&self) -> u8 {
        match self {
            EntryPolicy::FirstNode => 0,
            EntryPolicy::Random => 1,
            EntryPolicy::SampledGreedy => 2,
        }
    }

    /// Deserialization from the index file header
    pub const fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(EntryPolicy::FirstNode),
            1 => Some(EntryPolicy::Random),
            2 => Some(EntryPolicy::SampledGreedy),
            _ => None,
        }
    }
}

impl FromStr for EntryPolicy {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntryPolicy::validate(s)
    }
}

impl fmt::Display for EntryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
