// 🎯 Confidence Aggregator - Let a secondary model vet each candidate entity
//
// Distinct surface forms are collected per (key, property type). At drain time the
// whole group is scored at once; one value labelled trash or scoring under the
// floor discards the entire group. No partial retention.

use crate::aggregator::{AggregationKey, TagAggregator, TagGroup};
use crate::config::AggregatorConfig;
use crate::error::{AggregatorError, Result};
use crate::property::PropertyType;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

// ============================================================================
// CONFIDENCE MODEL CONTRACT
// ============================================================================

/// Labels and scores positionally aligned with the scored values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelOutput {
    pub labels: Vec<String>,
    pub scores: Vec<f64>,
}

impl ModelOutput {
    pub fn new(labels: Vec<String>, scores: Vec<f64>) -> Self {
        ModelOutput { labels, scores }
    }
}

/// Secondary classifier that judges whether extracted values are real entities.
///
/// Called synchronously, once per group. Errors are fatal to the drain pass
/// that triggered them; the aggregator never retries.
pub trait ConfidenceModel {
    fn confidence(&self, values: &[String]) -> anyhow::Result<ModelOutput>;
}

impl<M: ConfidenceModel + ?Sized> ConfidenceModel for &M {
    fn confidence(&self, values: &[String]) -> anyhow::Result<ModelOutput> {
        (**self).confidence(values)
    }
}

impl<M: ConfidenceModel + ?Sized> ConfidenceModel for Box<M> {
    fn confidence(&self, values: &[String]) -> anyhow::Result<ModelOutput> {
        (**self).confidence(values)
    }
}

// ============================================================================
// CONFIDENCE AGGREGATOR
// ============================================================================

pub struct ConfidenceAggregator<P: PropertyType, M: ConfidenceModel> {
    /// Distinct raw values per key, in first-seen order
    values: IndexMap<AggregationKey<P>, IndexSet<String>>,

    /// Scoring model
    model: M,

    /// Label that marks a value as noise
    trash_label: String,

    /// Minimum score for every value in a kept group
    confidence_floor: f64,
}

impl<P: PropertyType, M: ConfidenceModel> ConfidenceAggregator<P, M> {
    /// Create aggregator with the default trash label and floor
    pub fn new(model: M) -> Self {
        Self::from_config(model, &AggregatorConfig::default())
    }

    /// Create aggregator from a configuration, rejecting a NaN or negative floor
    pub fn with_config(model: M, config: &AggregatorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_config(model, config))
    }

    fn from_config(model: M, config: &AggregatorConfig) -> Self {
        ConfidenceAggregator {
            values: IndexMap::new(),
            model,
            trash_label: config.trash_label.clone(),
            confidence_floor: config.confidence_floor,
        }
    }

    /// Submit one observation
    pub fn add(&mut self, prop: &P, value: &str) {
        let Some(key) = AggregationKey::for_value(prop, value) else {
            return;
        };
        self.values.entry(key).or_default().insert(value.to_string());
    }

    /// Submit an observation whose value may be missing
    pub fn add_opt(&mut self, prop: &P, value: Option<&str>) {
        if let Some(value) = value {
            self.add(prop, value);
        }
    }

    /// Lazily score each group and yield the ones the model fully trusts.
    ///
    /// A model failure is yielded as an `Err`; groups yielded before it stay valid.
    pub fn results(&self) -> impl Iterator<Item = Result<TagGroup<P>>> + '_ {
        self.values
            .iter()
            .filter(|(_, values)| !values.is_empty())
            .filter_map(move |(key, values)| {
                let values: Vec<String> = values.iter().cloned().collect();
                match self.judge(&key.key, &values) {
                    Ok(true) => Some(Ok(TagGroup::new(
                        key.key.clone(),
                        key.prop.clone(),
                        values,
                    ))),
                    Ok(false) => None,
                    Err(e) => Some(Err(e)),
                }
            })
    }

    /// Drain every group, stopping at the first model failure
    pub fn collect_results(&self) -> Result<Vec<TagGroup<P>>> {
        self.results().collect()
    }

    /// Score one group; `Ok(false)` on the first disqualifying value
    fn judge(&self, key: &str, values: &[String]) -> Result<bool> {
        let output = self
            .model
            .confidence(values)
            .map_err(|source| AggregatorError::Model {
                key: key.to_string(),
                source,
            })?;

        if output.labels.len() != values.len() || output.scores.len() != values.len() {
            return Err(AggregatorError::ModelOutputMismatch {
                key: key.to_string(),
                values: values.len(),
                labels: output.labels.len(),
                scores: output.scores.len(),
            });
        }

        for (label, confidence) in output.labels.iter().zip(&output.scores) {
            if *label == self.trash_label || *confidence < self.confidence_floor {
                debug!(
                    key,
                    ?values,
                    labels = ?output.labels,
                    scores = ?output.scores,
                    "TRASH"
                );
                return Ok(false);
            }
        }

        debug!(
            key,
            ?values,
            labels = ?output.labels,
            scores = ?output.scores,
            "KEEP"
        );
        Ok(true)
    }

    /// Distinct values stored for a key, if present
    pub fn group(&self, prop: &P, key: &str) -> Option<Vec<&str>> {
        let lookup = AggregationKey {
            key: key.to_string(),
            prop: prop.clone(),
        };
        self.values
            .get(&lookup)
            .map(|values| values.iter().map(String::as_str).collect())
    }

    /// Number of distinct aggregation keys held
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn model(&self) -> &M {
        &self.model
    }
}

impl<P: PropertyType, M: ConfidenceModel> TagAggregator<P> for ConfidenceAggregator<P, M> {
    fn add(&mut self, prop: &P, value: &str) {
        ConfidenceAggregator::add(self, prop, value);
    }

    fn drain(&self) -> Result<Vec<TagGroup<P>>> {
        let kept = self.collect_results()?;
        info!(
            groups = self.values.len(),
            kept = kept.len(),
            "Confidence filtering complete"
        );
        Ok(kept)
    }

    fn len(&self) -> usize {
        ConfidenceAggregator::len(self)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::TagType;
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;

    /// Returns canned (label, score) per value and records every call
    struct ScriptedModel {
        verdicts: HashMap<String, (String, f64)>,
        calls: RefCell<Vec<Vec<String>>>,
    }

    impl ScriptedModel {
        fn new(verdicts: &[(&str, &str, f64)]) -> Self {
            ScriptedModel {
                verdicts: verdicts
                    .iter()
                    .map(|(v, l, s)| (v.to_string(), (l.to_string(), *s)))
                    .collect(),
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl ConfidenceModel for ScriptedModel {
        fn confidence(&self, values: &[String]) -> anyhow::Result<ModelOutput> {
            self.calls.borrow_mut().push(values.to_vec());
            let (labels, scores): (Vec<String>, Vec<f64>) = values
                .iter()
                .map(|v| {
                    self.verdicts
                        .get(v)
                        .cloned()
                        .unwrap_or_else(|| ("org".to_string(), 1.0))
                })
                .unzip();
            Ok(ModelOutput::new(labels, scores))
        }
    }

    /// Fails on the n-th call
    struct FailingModel {
        fail_on: usize,
        calls: Cell<usize>,
    }

    impl ConfidenceModel for FailingModel {
        fn confidence(&self, values: &[String]) -> anyhow::Result<ModelOutput> {
            let call = self.calls.get() + 1;
            self.calls.set(call);
            if call == self.fail_on {
                anyhow::bail!("model offline");
            }
            Ok(ModelOutput::new(
                vec!["org".to_string(); values.len()],
                vec![0.99; values.len()],
            ))
        }
    }

    /// Always returns a single label regardless of input length
    struct ShortModel;

    impl ConfidenceModel for ShortModel {
        fn confidence(&self, _values: &[String]) -> anyhow::Result<ModelOutput> {
            Ok(ModelOutput::new(vec!["org".to_string()], vec![0.99]))
        }
    }

    #[test]
    fn test_distinct_surface_forms_kept() {
        let model = ScriptedModel::new(&[("Acme Corp", "org", 0.9), ("ACME CORP", "org", 0.95)]);
        let mut agg = ConfidenceAggregator::new(model);
        agg.add(&TagType::Company, "Acme Corp");
        agg.add(&TagType::Company, "ACME CORP");
        agg.add(&TagType::Company, "Acme Corp");

        let results = agg.collect_results().unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].key, "acme");
        assert_eq!(results[0].prop, TagType::Company);
        assert_eq!(results[0].values, vec!["Acme Corp", "ACME CORP"]);
    }

    #[test]
    fn test_one_trash_value_poisons_group() {
        let model = ScriptedModel::new(&[("X Holdings", "org", 0.9), ("X-Holdings", "trash", 0.5)]);
        let mut agg = ConfidenceAggregator::new(model);
        agg.add(&TagType::Company, "X Holdings");
        agg.add(&TagType::Company, "X-Holdings");

        assert_eq!(agg.len(), 1);
        assert!(agg.collect_results().unwrap().is_empty());
    }

    #[test]
    fn test_trash_label_rejects_even_with_high_score() {
        let model = ScriptedModel::new(&[("Jane Doe", "trash", 0.99)]);
        let mut agg = ConfidenceAggregator::new(model);
        agg.add(&TagType::Person, "Jane Doe");

        assert!(agg.collect_results().unwrap().is_empty());
    }

    #[test]
    fn test_floor_is_inclusive() {
        let model = ScriptedModel::new(&[("Jane Doe", "person", 0.85), ("John Roe", "person", 0.8499)]);
        let mut agg = ConfidenceAggregator::new(model);
        agg.add(&TagType::Person, "Jane Doe");
        agg.add(&TagType::Person, "John Roe");

        let keys: Vec<String> = agg
            .collect_results()
            .unwrap()
            .into_iter()
            .map(|g| g.key)
            .collect();
        assert_eq!(keys, vec!["jane doe".to_string()]);
    }

    #[test]
    fn test_model_called_once_per_group() {
        let model = ScriptedModel::new(&[]);
        let mut agg = ConfidenceAggregator::new(model);
        agg.add(&TagType::Company, "Acme Corp");
        agg.add(&TagType::Company, "ACME CORP");
        agg.add(&TagType::Person, "Jane Doe");

        agg.collect_results().unwrap();

        let calls = agg.model().calls.borrow();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], vec!["Acme Corp", "ACME CORP"]);
        assert_eq!(calls[1], vec!["Jane Doe"]);
    }

    #[test]
    fn test_none_and_unnormalizable_values_ignored() {
        let mut agg = ConfidenceAggregator::new(ScriptedModel::new(&[]));
        agg.add_opt(&TagType::Person, None);
        agg.add(&TagType::Phone, "12");

        assert!(agg.is_empty());
        assert!(agg.collect_results().unwrap().is_empty());
        assert!(agg.model().calls.borrow().is_empty());
    }

    #[test]
    fn test_model_failure_propagates_after_earlier_groups() {
        let model = FailingModel {
            fail_on: 2,
            calls: Cell::new(0),
        };
        let mut agg = ConfidenceAggregator::new(model);
        agg.add(&TagType::Company, "Acme Corp");
        agg.add(&TagType::Company, "Globex");
        agg.add(&TagType::Company, "Initech");

        let mut results = agg.results();
        let first = results.next().unwrap().unwrap();
        assert_eq!(first.key, "acme");

        match results.next() {
            Some(Err(AggregatorError::Model { key, .. })) => assert_eq!(key, "globex"),
            other => panic!("expected model failure, got {:?}", other),
        }
    }

    #[test]
    fn test_misaligned_model_output_is_error() {
        let mut agg = ConfidenceAggregator::new(ShortModel);
        agg.add(&TagType::Company, "Acme Corp");
        agg.add(&TagType::Company, "ACME CORP");

        let err = agg.collect_results().unwrap_err();
        assert!(matches!(
            err,
            AggregatorError::ModelOutputMismatch {
                values: 2,
                labels: 1,
                scores: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_custom_trash_label_and_floor() {
        let config = AggregatorConfig {
            trash_label: "noise".to_string(),
            confidence_floor: 0.5,
            ..AggregatorConfig::default()
        };
        let model = ScriptedModel::new(&[("Globex", "trash", 0.6), ("Initech", "noise", 0.9)]);
        let mut agg = ConfidenceAggregator::with_config(model, &config).unwrap();
        agg.add(&TagType::Company, "Globex");
        agg.add(&TagType::Company, "Initech");

        let keys: Vec<String> = agg
            .collect_results()
            .unwrap()
            .into_iter()
            .map(|g| g.key)
            .collect();
        assert_eq!(keys, vec!["globex".to_string()]);
    }

    #[test]
    fn test_nan_floor_rejected() {
        let config = AggregatorConfig {
            confidence_floor: f64::NAN,
            ..AggregatorConfig::default()
        };
        let result = ConfidenceAggregator::<TagType, _>::with_config(ScriptedModel::new(&[]), &config);

        assert!(matches!(result, Err(AggregatorError::Config(_))));
    }

    #[test]
    fn test_add_after_drain_grows_groups() {
        let mut agg = ConfidenceAggregator::new(ScriptedModel::new(&[]));
        agg.add(&TagType::Company, "Acme Corp");
        let first = agg.collect_results().unwrap();

        agg.add(&TagType::Company, "Acme Inc");
        let second = agg.collect_results().unwrap();

        assert_eq!(first[0].values, vec!["Acme Corp"]);
        assert_eq!(second[0].values, vec!["Acme Corp", "Acme Inc"]);
    }
}
