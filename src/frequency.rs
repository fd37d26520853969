// 📊 Frequency Aggregator - Keep tags that repeat often enough
//
// A property type's acceptance bar scales with how much evidence exists for it:
//   cutoff = observations_of_type * cutoff_fraction(type)
// A group survives when its value count (duplicates included) reaches the cutoff.
//
// Memory is bounded best-effort: once `max_tags` keys exist, brand-new keys are
// dropped while existing keys keep accumulating.

use crate::aggregator::{AggregationKey, TagAggregator, TagGroup};
use crate::config::AggregatorConfig;
use crate::error::Result;
use crate::property::PropertyType;
use indexmap::IndexMap;
use std::collections::HashMap;
use tracing::{debug, info};

pub struct FrequencyAggregator<P: PropertyType> {
    /// Raw values per key, in insertion order, duplicates kept
    values: IndexMap<AggregationKey<P>, Vec<String>>,

    /// Observations accepted per property type
    types: HashMap<P, usize>,

    /// Capacity cap and cutoff table
    config: AggregatorConfig,

    /// New keys refused because the cap was reached
    rejected: usize,
}

impl<P: PropertyType> FrequencyAggregator<P> {
    /// Create aggregator with the default cap and cutoff table
    pub fn new() -> Self {
        Self::from_config(AggregatorConfig::default())
    }

    /// Create aggregator from a configuration, rejecting invalid cutoffs
    pub fn with_config(config: &AggregatorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_config(config.clone()))
    }

    fn from_config(config: AggregatorConfig) -> Self {
        FrequencyAggregator {
            values: IndexMap::new(),
            types: HashMap::new(),
            config,
            rejected: 0,
        }
    }

    /// Override the capacity cap
    pub fn with_max_tags(mut self, max_tags: usize) -> Self {
        self.config.max_tags = max_tags;
        self
    }

    /// Submit one observation
    pub fn add(&mut self, prop: &P, value: &str) {
        let Some(key) = AggregationKey::for_value(prop, value) else {
            return;
        };

        // Gate on "is this key new" before inserting
        if !self.values.contains_key(&key) && self.values.len() >= self.config.max_tags {
            self.rejected += 1;
            debug!(
                prop = prop.name(),
                key = %key.key,
                max_tags = self.config.max_tags,
                "Tag capacity reached, dropping new key"
            );
            return;
        }

        self.values.entry(key).or_default().push(value.to_string());
        *self.types.entry(prop.clone()).or_insert(0) += 1;
    }

    /// Minimum group size for `prop` given the evidence seen so far
    pub fn prop_cutoff(&self, prop: &P) -> f64 {
        self.observation_count(prop) as f64 * self.config.cutoff_fraction(prop.name())
    }

    /// Observations accepted for `prop`
    pub fn observation_count(&self, prop: &P) -> usize {
        self.types.get(prop).copied().unwrap_or(0)
    }

    /// Lazily yield every group that meets its property type's cutoff
    pub fn results(&self) -> impl Iterator<Item = TagGroup<P>> + '_ {
        self.values.iter().filter_map(move |(key, values)| {
            // skip entities that do not meet a threshold of relevance
            if (values.len() as f64) < self.prop_cutoff(&key.prop) {
                return None;
            }
            Some(TagGroup::new(key.key.clone(), key.prop.clone(), values.clone()))
        })
    }

    /// Raw values stored for a key, if present
    pub fn group(&self, prop: &P, key: &str) -> Option<&[String]> {
        let lookup = AggregationKey {
            key: key.to_string(),
            prop: prop.clone(),
        };
        self.values.get(&lookup).map(|v| v.as_slice())
    }

    /// Number of distinct aggregation keys held
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// New keys refused since construction
    pub fn rejected_count(&self) -> usize {
        self.rejected
    }
}

impl<P: PropertyType> Default for FrequencyAggregator<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: PropertyType> TagAggregator<P> for FrequencyAggregator<P> {
    fn add(&mut self, prop: &P, value: &str) {
        FrequencyAggregator::add(self, prop, value);
    }

    fn drain(&self) -> Result<Vec<TagGroup<P>>> {
        let kept: Vec<TagGroup<P>> = self.results().collect();
        info!(
            groups = self.values.len(),
            kept = kept.len(),
            rejected_keys = self.rejected,
            "Frequency filtering complete"
        );
        Ok(kept)
    }

    fn len(&self) -> usize {
        FrequencyAggregator::len(self)
    }
}

// ============================================================================
// TESTS
// ============================================================================
