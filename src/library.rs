//! The reference library: every item a test may cite, indexed by id.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::info;

use crate::diagnostics::{parse_error_json, parse_error_yaml, RunnerError};
use crate::err_msg;

/// Immutable id → item index built once per engine.
#[derive(Debug, Clone, Default)]
pub struct ReferenceLibrary {
    items: HashMap<String, Value>,
}

impl ReferenceLibrary {
    /// Reads a library file; `.json` is parsed as JSON, anything else as YAML.
    pub fn load(path: &Path) -> Result<Self, RunnerError> {
        let source = fs::read_to_string(path).map_err(|e| {
            err_msg!(Configuration, "cannot read library '{}': {}", path.display(), e)
        })?;
        let records: Vec<Value> = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&source).map_err(|e| parse_error_json(path, &source, &e))?
        } else {
            serde_yaml::from_str(&source).map_err(|e| parse_error_yaml(path, &source, &e))?
        };
        let library = Self::from_records(records)?;
        info!(path = %path.display(), items = library.len(), "reference library loaded");
        Ok(library)
    }

    /// Indexes records by their `id`. Every record needs a unique, non-empty string id.
    pub fn from_records(records: Vec<Value>) -> Result<Self, RunnerError> {
        let mut items = HashMap::with_capacity(records.len());
        for (position, record) in records.into_iter().enumerate() {
            let id = match record.get("id") {
                Some(Value::String(id)) if !id.trim().is_empty() => id.clone(),
                Some(Value::Number(n)) => n.to_string(),
                _ => {
                    return Err(err_msg!(
                        Configuration,
                        "library entry {} has no id",
                        position + 1
                    ))
                }
            };
            if items.contains_key(&id) {
                return Err(err_msg!(Configuration, "duplicate library id '{}'", id));
            }
            items.insert(id, record);
        }
        Ok(Self { items })
    }

    pub fn get(&self, id: &str) -> Option<&Value> {
        self.items.get(id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
