// ⚙️ Aggregator Configuration - Thresholds as Data
// Fixed at construction; defaults are the empirically tuned constants.

use crate::error::{AggregatorError, Result as AggregatorResult};
use anyhow::{Context as AnyhowContext, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Maximum distinct aggregation keys held by the frequency aggregator
pub const DEFAULT_MAX_TAGS: usize = 10_000;

/// Label the confidence model uses for non-entity noise
pub const DEFAULT_TRASH_LABEL: &str = "trash";

/// Minimum confidence every value in a group must reach
pub const DEFAULT_CONFIDENCE_FLOOR: f64 = 0.85;

/// Per-property-type cutoff fractions
pub fn default_cutoffs() -> HashMap<String, f64> {
    HashMap::from([
        ("country".to_string(), 0.3),
        ("person".to_string(), 0.03),
        ("company".to_string(), 0.03),
        ("phone".to_string(), 0.05),
    ])
}

fn default_max_tags() -> usize {
    DEFAULT_MAX_TAGS
}

fn default_trash_label() -> String {
    DEFAULT_TRASH_LABEL.to_string()
}

fn default_confidence_floor() -> f64 {
    DEFAULT_CONFIDENCE_FLOOR
}

// ============================================================================
// CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatorConfig {
    /// Capacity cap for new keys in the frequency aggregator
    #[serde(default = "default_max_tags")]
    pub max_tags: usize,

    /// Cutoff fraction per property type name; absent types always pass
    #[serde(default = "default_cutoffs")]
    pub cutoffs: HashMap<String, f64>,

    /// Model label that disqualifies a group
    #[serde(default = "default_trash_label")]
    pub trash_label: String,

    /// Scores below this disqualify a group
    #[serde(default = "default_confidence_floor")]
    pub confidence_floor: f64,
}

impl AggregatorConfig {
    /// Load configuration from a JSON file, filling missing fields with defaults.
    ///
    /// Cutoff entries in the file are laid over the default table, so overriding
    /// one property type keeps the tuned fractions of the others.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let mut config: AggregatorConfig =
            serde_json::from_str(&content).context("Failed to parse config JSON")?;

        let mut cutoffs = default_cutoffs();
        cutoffs.extend(config.cutoffs);
        config.cutoffs = cutoffs;

        config.validate()?;
        Ok(config)
    }

    /// Reject thresholds that would make every comparison meaningless
    pub fn validate(&self) -> AggregatorResult<()> {
        for (prop, fraction) in &self.cutoffs {
            if !fraction.is_finite() || *fraction < 0.0 {
                return Err(AggregatorError::Config(format!(
                    "cutoff for '{}' must be a non-negative number, got {}",
                    prop, fraction
                )));
            }
        }

        if !self.confidence_floor.is_finite() || self.confidence_floor < 0.0 {
            return Err(AggregatorError::Config(format!(
                "confidence_floor must be a non-negative number, got {}",
                self.confidence_floor
            )));
        }

        Ok(())
    }

    /// Cutoff fraction for a property type name (0 when absent)
    pub fn cutoff_fraction(&self, prop_name: &str) -> f64 {
        self.cutoffs.get(prop_name).copied().unwrap_or(0.0)
    }
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        AggregatorConfig {
            max_tags: DEFAULT_MAX_TAGS,
            cutoffs: default_cutoffs(),
            trash_label: DEFAULT_TRASH_LABEL.to_string(),
            confidence_floor: DEFAULT_CONFIDENCE_FLOOR,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
