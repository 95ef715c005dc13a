//! Class-name tables from YOLO dataset files.
//!
//! Two layouts are understood:
//! - `data.yaml` with a `names:` key holding either a list or an
//!   `index: name` mapping;
//! - `classes.txt` with one name per line, line number = class id.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::model::ClassNames;
use crate::error::StoneScanError;

#[derive(Debug, Deserialize)]
struct DataYaml {
    names: DataYamlNames,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DataYamlNames {
    Sequence(Vec<String>),
    Mapping(BTreeMap<u64, String>),
}

/// Reads class names from a `.yaml`/`.yml` or plain-text file, by extension.
pub fn read_class_names(path: &Path) -> Result<ClassNames, StoneScanError> {
    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

    let data = fs::read_to_string(path).map_err(StoneScanError::Io)?;
    if is_yaml {
        names_from_yaml(&data).map_err(|message| StoneScanError::ClassNamesParse {
            path: path.to_path_buf(),
            message,
        })
    } else {
        names_from_lines(&data).map_err(|message| StoneScanError::ClassNamesParse {
            path: path.to_path_buf(),
            message,
        })
    }
}

/// Parses the `names:` entry of a YOLO `data.yaml` document.
pub fn names_from_yaml(data: &str) -> Result<ClassNames, String> {
    let parsed: DataYaml = serde_yaml::from_str(data).map_err(|e| e.to_string())?;

    Ok(match parsed.names {
        DataYamlNames::Sequence(names) => ClassNames::from_sequence(names),
        DataYamlNames::Mapping(mapping) => mapping.into_iter().collect(),
    })
}

/// Parses the `{0: 'stone', 1: 'cyst'}` mapping YOLO exports store in
/// model metadata. The notation is a YAML flow mapping.
pub fn names_from_flow_mapping(data: &str) -> Result<ClassNames, String> {
    let mapping: BTreeMap<u64, String> =
        serde_yaml::from_str(data).map_err(|e| e.to_string())?;
    Ok(mapping.into_iter().collect())
}

/// Parses a `classes.txt` listing; blank lines are rejected since they would
/// shift every following id.
pub fn names_from_lines(data: &str) -> Result<ClassNames, String> {
    let mut names = Vec::new();
    for (line_idx, line) in data.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Err(format!("line {} is empty", line_idx + 1));
        }
        names.push(trimmed.to_string());
    }
    Ok(ClassNames::from_sequence(names))
}
