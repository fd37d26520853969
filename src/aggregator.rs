// 🧺 Shared aggregation types
// Both aggregators group observations by (normalized key, property type).

use crate::error::Result;
use crate::property::PropertyType;
use serde::{Deserialize, Serialize};

// ============================================================================
// AGGREGATION KEY
// ============================================================================

/// Composite key identifying one candidate entity under one property type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AggregationKey<P> {
    pub key: String,
    pub prop: P,
}

impl<P: PropertyType> AggregationKey<P> {
    /// Normalize `value` under `prop`; `None` when the value has no key
    pub fn for_value(prop: &P, value: &str) -> Option<Self> {
        prop.node_id_safe(value).map(|key| AggregationKey {
            key,
            prop: prop.clone(),
        })
    }
}

// ============================================================================
// TAG GROUP (result triple)
// ============================================================================

/// A group that passed filtering: (normalized key, property type, raw values)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagGroup<P> {
    pub key: String,
    pub prop: P,
    pub values: Vec<String>,
}

impl<P> TagGroup<P> {
    pub fn new(key: String, prop: P, values: Vec<String>) -> Self {
        TagGroup { key, prop, values }
    }
}

// ============================================================================
// AGGREGATOR CONTRACT
// ============================================================================

/// Accumulate observations, then yield the groups that pass filtering.
///
/// `drain` is read-only: calling it twice without `add` in between returns
/// the same groups, and `add` after draining keeps growing the groups.
pub trait TagAggregator<P: PropertyType> {
    /// Submit one observation
    fn add(&mut self, prop: &P, value: &str);

    /// Submit an observation whose value may be missing
    fn add_opt(&mut self, prop: &P, value: Option<&str>) {
        if let Some(value) = value {
            self.add(prop, value);
        }
    }

    /// Filter the accumulated groups
    fn drain(&self) -> Result<Vec<TagGroup<P>>>;

    /// Number of distinct aggregation keys held
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
