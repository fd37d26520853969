// ⚠️ Error types for tag aggregation
// Filtering outcomes are never errors; only broken collaborators and bad config surface here.

use thiserror::Error;

/// Result type for aggregation operations
pub type Result<T> = std::result::Result<T, AggregatorError>;

#[derive(Error, Debug)]
pub enum AggregatorError {
    /// The confidence model failed while scoring a group
    #[error("Confidence model failed for key '{key}': {source}")]
    Model {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    /// The confidence model returned labels/scores not aligned with the values
    #[error(
        "Confidence model output mismatch for key '{key}': {values} values, {labels} labels, {scores} scores"
    )]
    ModelOutputMismatch {
        key: String,
        values: usize,
        labels: usize,
        scores: usize,
    },

    /// Invalid aggregator configuration
    #[error("Configuration error: {0}")]
    Config(String),
}
