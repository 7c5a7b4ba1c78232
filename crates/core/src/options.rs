//! Engine-specific construction options
//!
//! Options arrive as a loosely typed [`ConfigurationMap`] (from JSON, TOML or
//! a caller-built map) and are parsed into [`EngineOptions`]. Unknown keys
//! are rejected so that a misspelled option never silently falls back to a
//! default.

use crate::error::{IndexError, IndexResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Loosely typed option map passed to the factory
pub type ConfigurationMap = BTreeMap<String, serde_json::Value>;

/// Tuning knobs of the graph engine
///
/// All fields except `seed` must be > 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineOptions {
    /// Maximum outgoing links per node (M)
    pub max_edges_per_node: usize,
    /// Beam width used while inserting
    pub ef_construction: usize,
    /// Default beam width used while searching
    pub ef_search: usize,
    /// Nodes sampled by the sampled-greedy entry policy
    pub num_initializations: usize,
    /// Seed for the random entry policy
    pub seed: u64,
}

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions {
            max_edges_per_node: 16,
            ef_construction: 100,
            ef_search: 100,
            num_initializations: 100,
            seed: 0,
        }
    }
}

impl EngineOptions {
    /// Sparse graph and narrow beams: quick builds, lower recall
    pub fn fast_build() -> Self {
        EngineOptions {
            max_edges_per_node: 8,
            ef_construction: 40,
            ef_search: 40,
            ..Default::default()
        }
    }

    /// Dense graph and wide beams: slow builds, higher recall
    pub fn high_recall() -> Self {
        EngineOptions {
            max_edges_per_node: 32,
            ef_construction: 200,
            ef_search: 200,
            ..Default::default()
        }
    }

    /// Parse options from a configuration map
    ///
    /// Missing keys take their default value.
    ///
    /// # Errors
    /// - `InvalidParameter` for unknown keys, mistyped values or values
    ///   out of range
    pub fn from_map(map: &ConfigurationMap) -> IndexResult<Self> {
        let object: serde_json::Map<String, serde_json::Value> =
            map.iter().map(|(k, v)| (k.clone(), v.clone())).collect();

        let options: EngineOptions = serde_json::from_value(serde_json::Value::Object(object))
            .map_err(|e| IndexError::invalid_parameter("options", e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    /// Check that every bounded field is in range
    pub fn validate(&self) -> IndexResult<()> {
        let positive = [
            ("max_edges_per_node", self.max_edges_per_node),
            ("ef_construction", self.ef_construction),
            ("ef_search", self.ef_search),
            ("num_initializations", self.num_initializations),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(IndexError::invalid_parameter(name, "must be > 0"));
            }
        }
        if self.max_edges_per_node > u32::MAX as usize {
            return Err(IndexError::invalid_parameter(
                "max_edges_per_node",
                format!("must be <= {}", u32::MAX),
            ));
        }
        Ok(())
    }
}
