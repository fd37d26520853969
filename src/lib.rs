// Tag Aggregator - Core Library
// Deduplicates and filters entity-tag observations before they become records

pub mod aggregator;
pub mod config;
pub mod confidence;
pub mod error;
pub mod frequency;
pub mod observations;
pub mod property;
pub mod rules;

// Re-export commonly used types
pub use aggregator::{AggregationKey, TagAggregator, TagGroup};
pub use config::{
    AggregatorConfig, DEFAULT_CONFIDENCE_FLOOR, DEFAULT_MAX_TAGS, DEFAULT_TRASH_LABEL,
};
pub use confidence::{ConfidenceAggregator, ConfidenceModel, ModelOutput};
pub use error::{AggregatorError, Result};
pub use frequency::FrequencyAggregator;
pub use observations::{load_csv, load_reader, Observation};
pub use property::{PropertyType, TagType};
pub use rules::{ModelRule, RuleModel};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
