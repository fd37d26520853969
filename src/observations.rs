// 📂 Observation Loader - CSV → (property type, value) pairs
// One row per extraction hit, as produced by the upstream NER pipeline.

use crate::property::TagType;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use tracing::warn;

/// Raw CSV row: `property,value`
#[derive(Debug, Clone, Deserialize)]
pub struct ObservationRow {
    pub property: String,
    pub value: Option<String>,
}

/// A parsed observation; `value` is `None` when the extractor produced an empty cell
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub prop: TagType,
    pub value: Option<String>,
}

pub fn load_csv(csv_path: &Path) -> Result<Vec<Observation>> {
    let rdr = csv::Reader::from_path(csv_path)
        .with_context(|| format!("Failed to open CSV file: {:?}", csv_path))?;
    read_observations(rdr)
}

pub fn load_reader<R: Read>(reader: R) -> Result<Vec<Observation>> {
    read_observations(csv::Reader::from_reader(reader))
}

fn read_observations<R: Read>(mut rdr: csv::Reader<R>) -> Result<Vec<Observation>> {
    let mut observations = Vec::new();
    let mut skipped = 0;

    for (line, result) in rdr.deserialize().enumerate() {
        let row: ObservationRow =
            result.with_context(|| format!("Failed to deserialize observation row {}", line + 1))?;

        match row.property.parse::<TagType>() {
            Ok(prop) => observations.push(Observation {
                prop,
                value: row.value.filter(|v| !v.is_empty()),
            }),
            Err(e) => {
                skipped += 1;
                warn!(row = line + 1, error = %e, "Skipping observation");
            }
        }
    }

    if skipped > 0 {
        warn!(skipped, "Observations with unknown property types were skipped");
    }

    Ok(observations)
}

// ============================================================================
// TESTS
// ============================================================================
