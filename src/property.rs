// 🏷️ Property Types - What kind of value a tag observation carries
//
// Problem solved:
// - "Acme Corp", "ACME CORP.", "Acme Corporation" → one company key
// - "+1 (555) 010-2030" and "+15550102030" → one phone key
// - Values that cannot be normalized produce no key and are dropped upstream

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

// ============================================================================
// PROPERTY TYPE CONTRACT
// ============================================================================

/// A typed classification of an extracted value.
///
/// Implementors are used as part of a map key, so equality and hashing must
/// be stable. `node_id_safe` must be pure and deterministic.
pub trait PropertyType: Clone + Eq + Hash + fmt::Debug {
    /// Stable name, used to look up the cutoff fraction
    fn name(&self) -> &str;

    /// Normalize a raw value into a dedup key, or `None` if unnormalizable
    fn node_id_safe(&self, value: &str) -> Option<String>;
}

// ============================================================================
// BUILT-IN TAG TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagType {
    /// Person name
    Person,

    /// Company / organization name
    Company,

    /// Country (ISO-3166 alpha-2)
    Country,

    /// Phone number
    Phone,

    /// Email address
    Email,
}

impl TagType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TagType::Person => "person",
            TagType::Company => "company",
            TagType::Country => "country",
            TagType::Phone => "phone",
            TagType::Email => "email",
        }
    }

    pub fn all() -> [TagType; 5] {
        [
            TagType::Person,
            TagType::Company,
            TagType::Country,
            TagType::Phone,
            TagType::Email,
        ]
    }
}

impl fmt::Display for TagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TagType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "person" | "name" => Ok(TagType::Person),
            "company" | "organization" | "org" => Ok(TagType::Company),
            "country" => Ok(TagType::Country),
            "phone" => Ok(TagType::Phone),
            "email" => Ok(TagType::Email),
            other => Err(format!("Unknown property type: {}", other)),
        }
    }
}

impl PropertyType for TagType {
    fn name(&self) -> &str {
        self.as_str()
    }

    fn node_id_safe(&self, value: &str) -> Option<String> {
        match self {
            TagType::Person => normalize_name(value),
            TagType::Company => normalize_company(value),
            TagType::Country => normalize_country(value),
            TagType::Phone => normalize_phone(value),
            TagType::Email => normalize_email(value),
        }
    }
}

// ============================================================================
// NORMALIZERS
// ============================================================================

/// Legal-form suffixes stripped from the end of company names
const COMPANY_SUFFIXES: &[&str] = &[
    "inc", "incorporated", "corp", "corporation", "co", "company", "ltd", "limited", "llc",
    "plc", "gmbh", "ag", "sa", "srl", "bv", "nv",
];

/// Country names (lowercase) and their ISO-3166 alpha-2 codes
const COUNTRY_NAMES: &[(&str, &str)] = &[
    ("united states", "us"),
    ("united states of america", "us"),
    ("usa", "us"),
    ("united kingdom", "gb"),
    ("great britain", "gb"),
    ("uk", "gb"),
    ("germany", "de"),
    ("france", "fr"),
    ("spain", "es"),
    ("italy", "it"),
    ("netherlands", "nl"),
    ("russia", "ru"),
    ("russian federation", "ru"),
    ("china", "cn"),
    ("japan", "jp"),
    ("india", "in"),
    ("brazil", "br"),
    ("mexico", "mx"),
    ("canada", "ca"),
    ("switzerland", "ch"),
    ("cyprus", "cy"),
    ("ukraine", "ua"),
    ("panama", "pa"),
];

/// Lowercase, drop punctuation, collapse whitespace
fn normalize_name(value: &str) -> Option<String> {
    let cleaned: String = value
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .to_lowercase();

    let normalized = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    if !normalized.chars().any(|c| c.is_alphabetic()) {
        return None;
    }

    Some(normalized)
}

fn normalize_company(value: &str) -> Option<String> {
    let name = normalize_name(value)?;
    let mut words: Vec<&str> = name.split(' ').collect();

    while words.len() > 1 {
        match words.last() {
            Some(last) if COMPANY_SUFFIXES.contains(last) => {
                words.pop();
            }
            _ => break,
        }
    }

    let normalized = words.join(" ");
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

fn normalize_country(value: &str) -> Option<String> {
    let name = normalize_name(value)?;

    if let Some((_, code)) = COUNTRY_NAMES.iter().find(|(country, _)| *country == name) {
        return Some(code.to_string());
    }

    if name.len() == 2 && name.chars().all(|c| c.is_ascii_lowercase()) {
        Some(name)
    } else {
        None
    }
}

fn normalize_phone(value: &str) -> Option<String> {
    let trimmed = value.trim();
    let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();

    if !(7..=15).contains(&digits.len()) {
        return None;
    }

    if trimmed.starts_with('+') {
        Some(format!("+{}", digits))
    } else {
        Some(digits)
    }
}

fn normalize_email(value: &str) -> Option<String> {
    let email = value.trim().to_lowercase();
    let (local, domain) = email.split_once('@')?;

    if local.is_empty() || domain.contains('@') || email.contains(char::is_whitespace) {
        return None;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|l| l.is_empty()) {
        return None;
    }

    Some(email)
}

// ============================================================================
// TESTS
// ============================================================================
