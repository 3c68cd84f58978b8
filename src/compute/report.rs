//! Score tables keyed by region id.

use crate::error::{CompactnessError, Result};
use crate::region::{MISSING_SCORE, RegionCollection};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt::Write;

/// Row key for each region: its `id_key` attribute, or its position when
/// there is no key.
fn region_ids(collection: &RegionCollection, id_key: Option<&str>) -> Result<Vec<String>> {
    collection
        .iter()
        .enumerate()
        .map(|(index, region)| match id_key {
            Some(key) => region.property(key).map(str::to_string).ok_or_else(|| {
                CompactnessError::MissingAttribute {
                    index,
                    key: key.to_string(),
                }
            }),
            None => Ok(index.to_string()),
        })
        .collect()
}

/// Writes `{ "<id>": { "<score>": value, ... }, ... }`.
///
/// Non-finite scores have no JSON form and are written as `null`.
pub fn scores_to_json(collection: &RegionCollection, id_key: Option<&str>) -> Result<String> {
    let ids = region_ids(collection, id_key)?;

    let mut document = Map::new();
    for (id, region) in ids.into_iter().zip(collection.iter()) {
        let scores: Map<String, Value> = region
            .scores
            .iter()
            .map(|(name, &value)| (name.clone(), serde_json::json!(value)))
            .collect();
        document.insert(id, Value::Object(scores));
    }

    serde_json::to_string(&Value::Object(document)).map_err(|e| {
        CompactnessError::Serialization(format!("Failed to serialize scores: {}", e))
    })
}

/// Writes a `id,<score names>` header and one row per region.
///
/// Columns are the union of score names across the collection, sorted.
/// Values carry 5 decimal places; a score a region lacks is written as
/// `-9999`.
pub fn scores_to_csv(collection: &RegionCollection, id_key: Option<&str>) -> Result<String> {
    let ids = region_ids(collection, id_key)?;
    let names: BTreeSet<&str> = collection
        .iter()
        .flat_map(|region| region.scores.keys().map(String::as_str))
        .collect();

    let mut out = String::from("id");
    for name in &names {
        out.push(',');
        out.push_str(name);
    }
    out.push('\n');

    for (id, region) in ids.iter().zip(collection.iter()) {
        out.push_str(id);
        for name in &names {
            let written = match region.score(name) {
                Some(value) => write!(out, ",{:.5}", value),
                None => write!(out, ",{}", MISSING_SCORE),
            };
            written.map_err(|e| CompactnessError::Serialization(e.to_string()))?;
        }
        out.push('\n');
    }

    Ok(out)
}
