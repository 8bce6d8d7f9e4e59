//! Import/export payloads: the JSON shape scenarios travel in between
//! stores (file download, clipboard).
//!
//! Parsing is two-staged: the payload itself must be valid JSON and an
//! object (anything else is the one blocking, user-visible failure), but
//! each scenario and operation inside it is decoded independently, so one
//! malformed item is skipped while the rest still import. No
//! referential-integrity check ties a scenario's node op-ids to the
//! accompanying operations; a dangling reference survives import and is
//! skipped by the read models.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::store::{Operation, Scenario};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("import payload is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("import payload must be a JSON object")]
    NotAnObject,
}

/// The exchange shape: `{ scenarios: [...], operations: [...] }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExchangePayload {
    pub scenarios: Vec<Scenario>,
    pub operations: Vec<Operation>,
}

impl ExchangePayload {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Parses import text into a payload of structurally valid items.
///
/// Invalid JSON or a non-object root fails the whole call; an individual
/// scenario or operation that does not decode is dropped with a warning
/// and the remainder is kept.
pub fn parse_import(text: &str) -> Result<ExchangePayload, ImportError> {
    let root: Value = serde_json::from_str(text)?;
    let Value::Object(map) = root else {
        return Err(ImportError::NotAnObject);
    };

    let mut payload = ExchangePayload::default();

    if let Some(items) = map.get("operations").and_then(Value::as_array) {
        for item in items {
            match serde_json::from_value::<Operation>(item.clone()) {
                Ok(op) => payload.operations.push(op),
                Err(err) => warn!(%err, "skipping invalid operation in import"),
            }
        }
    }
    if let Some(items) = map.get("scenarios").and_then(Value::as_array) {
        for item in items {
            match serde_json::from_value::<Scenario>(item.clone()) {
                Ok(sc) => payload.scenarios.push(sc),
                Err(err) => warn!(%err, "skipping invalid scenario in import"),
            }
        }
    }

    Ok(payload)
}
