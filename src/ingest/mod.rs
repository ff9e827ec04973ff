//! Record loading from JSON and JSON Lines files.
//!
//! This module discovers record files, parses them, and maps the configured
//! source keys onto [`Record`] fields. Objects that cannot become a record
//! are skipped and counted rather than failing the whole load.

mod error;

pub use error::IngestError;

use crate::models::{RawTimestamp, Record};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Extensions read as one JSON object per line.
const LINE_DELIMITED_EXTENSIONS: &[&str] = &["jsonl", "ndjson"];

/// Extensions picked up when walking a directory.
const RECORD_EXTENSIONS: &[&str] = &["json", "jsonl", "ndjson"];

/// Keys searched for a record array when a `.json` document is an object.
const WRAPPER_KEYS: &[&str] = &["records", "data"];

/// Source keys for each record field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping {
    /// Key holding the category (e.g. `lob`).
    pub category: String,
    /// Key holding the classification (e.g. `infra_type`).
    pub classification: String,
    /// Key holding the creation timestamp (e.g. `createdtime`).
    pub timestamp: String,
}

impl Default for FieldMapping {
    fn default() -> Self {
        Self {
            category: "lob".to_string(),
            classification: "infra_type".to_string(),
            timestamp: "createdtime".to_string(),
        }
    }
}

impl From<&crate::config::FieldsConfig> for FieldMapping {
    fn from(config: &crate::config::FieldsConfig) -> Self {
        Self {
            category: config.category.clone(),
            classification: config.classification.clone(),
            timestamp: config.timestamp.clone(),
        }
    }
}

impl FieldMapping {
    /// Convert one source object into a record.
    ///
    /// Returns `None` if `value` is not an object or has no usable category.
    pub fn to_record(&self, value: &Value) -> Option<Record> {
        let object = value.as_object()?;

        Some(Record {
            category: scalar_text(object.get(&self.category))?,
            classification: scalar_text(present(object.get(&self.classification))),
            timestamp: self.timestamp_of(object),
        })
    }

    fn timestamp_of(&self, object: &Map<String, Value>) -> Option<RawTimestamp> {
        match present(object.get(&self.timestamp))? {
            Value::String(text) => Some(RawTimestamp::Text(text.clone())),
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .map(RawTimestamp::EpochMillis),
            _ => None,
        }
    }
}

/// Drop `false` and numeric zero so they read as an absent field.
fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| match v {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() != Some(0.0),
        _ => true,
    })
}

/// Stringify a scalar JSON value. `null`, arrays and objects yield `None`.
fn scalar_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Records loaded from one input path.
#[derive(Debug, Clone, Default)]
pub struct LoadedRecords {
    /// Records in file order, files in path order.
    pub records: Vec<Record>,
    /// Source entries that could not be mapped to a record.
    pub skipped: usize,
    /// Files that were read.
    pub files: Vec<PathBuf>,
}

impl LoadedRecords {
    fn push(&mut self, value: &Value, mapping: &FieldMapping, file: &Path, position: usize) {
        match mapping.to_record(value) {
            Some(record) => self.records.push(record),
            None => {
                warn!(
                    "Skipping entry {} in {}: not an object with a scalar `{}` field",
                    position,
                    file.display(),
                    mapping.category
                );
                self.skipped += 1;
            }
        }
    }
}

/// Load records from a file, or from every record file under a directory.
pub fn load_records(path: &Path, mapping: &FieldMapping) -> Result<LoadedRecords, IngestError> {
    let files = if path.is_dir() {
        discover_files(path)?
    } else if path.is_file() {
        vec![path.to_path_buf()]
    } else {
        return Err(IngestError::NotFound(path.to_path_buf()));
    };

    let mut loaded = LoadedRecords::default();
    for file in files {
        load_file(&file, mapping, &mut loaded)?;
        loaded.files.push(file);
    }

    info!(
        "Loaded {} records from {} file(s) ({} skipped)",
        loaded.records.len(),
        loaded.files.len(),
        loaded.skipped
    );

    Ok(loaded)
}

/// Find record files under `root`, sorted by path.
pub fn discover_files(root: &Path) -> Result<Vec<PathBuf>, IngestError> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!("Cannot read entry under {}: {}", root.display(), e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| has_extension(path, RECORD_EXTENSIONS))
        .collect();

    if files.is_empty() {
        return Err(IngestError::NoInput(root.to_path_buf()));
    }

    files.sort();
    Ok(files)
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| extensions.iter().any(|x| e.eq_ignore_ascii_case(x)))
        .unwrap_or(false)
}

fn load_file(
    path: &Path,
    mapping: &FieldMapping,
    loaded: &mut LoadedRecords,
) -> Result<(), IngestError> {
    let content = fs::read_to_string(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let before = loaded.records.len();

    if has_extension(path, LINE_DELIMITED_EXTENSIONS) {
        for (idx, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let value: Value = serde_json::from_str(line).map_err(|source| IngestError::Parse {
                path: path.to_path_buf(),
                line: idx + 1,
                source,
            })?;
            loaded.push(&value, mapping, path, idx + 1);
        }
    } else {
        let document: Value =
            serde_json::from_str(&content).map_err(|source| IngestError::Parse {
                path: path.to_path_buf(),
                line: source.line(),
                source,
            })?;
        for (idx, value) in record_array(&document, path)?.iter().enumerate() {
            loaded.push(value, mapping, path, idx);
        }
    }

    debug!(
        "Read {} records from {}",
        loaded.records.len() - before,
        path.display()
    );
    Ok(())
}

/// Locate the record array in a `.json` document.
fn record_array<'a>(document: &'a Value, path: &Path) -> Result<&'a Vec<Value>, IngestError> {
    match document {
        Value::Array(items) => Ok(items),
        Value::Object(map) => WRAPPER_KEYS
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_array))
            .ok_or_else(|| IngestError::UnsupportedShape(path.to_path_buf())),
        _ => Err(IngestError::UnsupportedShape(path.to_path_buf())),
    }
}
