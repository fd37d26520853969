// 🏷️ Rule Model - Confidence scoring as data
// Pattern rules assign a label and confidence to extracted values.
// Useful as a deterministic stand-in for a trained classifier.

use crate::confidence::{ConfidenceModel, ModelOutput};
use anyhow::{Context as AnyhowContext, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

// ============================================================================
// RULE DEFINITION
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRule {
    /// Rule ID for tracking
    pub id: String,

    /// Pattern to match (supports wildcards with *)
    pub pattern: String,

    /// Label assigned to matching values (e.g. "org", "trash")
    pub label: String,

    /// Confidence score (0.0 - 1.0)
    pub confidence: f64,

    /// Priority (higher = applied first)
    #[serde(default)]
    pub priority: i32,
}

impl ModelRule {
    /// Check if pattern matches the given value (case-insensitive)
    pub fn matches(&self, value: &str) -> bool {
        let pattern = self.pattern.to_lowercase();
        let text = value.to_lowercase();

        if !pattern.contains('*') {
            return text.contains(&pattern);
        }

        let parts: Vec<&str> = pattern.split('*').collect();
        let first = parts[0];
        let last = parts[parts.len() - 1];

        if !text.starts_with(first) || !text.ends_with(last) {
            return false;
        }
        if first.len() + last.len() > text.len() {
            return false;
        }

        // Middle parts appear in order between the anchors
        let mut pos = first.len();
        let end = text.len() - last.len();
        for part in &parts[1..parts.len() - 1] {
            if part.is_empty() {
                continue;
            }
            match text[pos..end].find(part) {
                Some(found) => pos += found + part.len(),
                None => return false,
            }
        }

        true
    }
}

// ============================================================================
// RULE MODEL
// ============================================================================

#[derive(Debug, Deserialize)]
struct RuleModelFile {
    rules: Vec<ModelRule>,

    #[serde(default = "default_fallback_label")]
    fallback_label: String,

    #[serde(default = "default_fallback_confidence")]
    fallback_confidence: f64,
}

fn default_fallback_label() -> String {
    "entity".to_string()
}

fn default_fallback_confidence() -> f64 {
    1.0
}

pub struct RuleModel {
    rules: Vec<ModelRule>,
    fallback_label: String,
    fallback_confidence: f64,
}

impl RuleModel {
    /// Model with no rules: every value gets the fallback verdict
    pub fn new() -> Self {
        RuleModel {
            rules: Vec::new(),
            fallback_label: default_fallback_label(),
            fallback_confidence: default_fallback_confidence(),
        }
    }

    /// Load rules from JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read rules file: {:?}", path.as_ref()))?;

        let file: RuleModelFile =
            serde_json::from_str(&content).context("Failed to parse rules JSON")?;

        Ok(RuleModel::from_rules(file.rules)
            .with_fallback(file.fallback_label, file.fallback_confidence))
    }

    /// Create model from a list of rules
    pub fn from_rules(mut rules: Vec<ModelRule>) -> Self {
        // Sort by priority (higher first)
        rules.sort_by(|a, b| b.priority.cmp(&a.priority));
        RuleModel {
            rules,
            ..RuleModel::new()
        }
    }

    /// Verdict for values no rule matches
    pub fn with_fallback(mut self, label: String, confidence: f64) -> Self {
        self.fallback_label = label;
        self.fallback_confidence = confidence;
        self
    }

    /// Add a single rule
    pub fn add_rule(&mut self, rule: ModelRule) {
        self.rules.push(rule);
        self.rules.sort_by(|a, b| b.priority.cmp(&a.priority));
    }

    /// Label and confidence for one value (first matching rule wins)
    pub fn classify(&self, value: &str) -> (String, f64) {
        match self.rules.iter().find(|rule| rule.matches(value)) {
            Some(rule) => {
                debug!(rule = %rule.id, value, label = %rule.label, "Rule matched");
                (rule.label.clone(), rule.confidence)
            }
            None => (self.fallback_label.clone(), self.fallback_confidence),
        }
    }

    /// Get number of rules loaded
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

impl Default for RuleModel {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfidenceModel for RuleModel {
    fn confidence(&self, values: &[String]) -> Result<ModelOutput> {
        let (labels, scores): (Vec<String>, Vec<f64>) =
            values.iter().map(|v| self.classify(v)).unzip();
        Ok(ModelOutput::new(labels, scores))
    }
}

// ============================================================================
// TESTS
// ============================================================================
