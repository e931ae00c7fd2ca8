//! Rendering assembled samples into the samplesheet document.
//!
//! The document is a YAML sequence with one entry per sample, fields
//! in the canonical order the consuming pipeline expects. Validation
//! runs over the re-parsed document rather than the typed entries, so
//! every schema violation is caught and reported in one pass.

use crate::errors::Result;
use crate::vocabulary::{COMMANDS, Command, LibraryType};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

/// A scalar-or-list reference path. The consuming pipeline historically
/// expected a scalar when there is only one reference.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ReferencePath {
    One(String),
    Many(Vec<String>),
}

/// One manifest entry. Field declaration order is the canonical
/// samplesheet order and is what gets serialized.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct SampleEntry {
    pub libraries: Vec<String>,
    pub library_types: Vec<LibraryType>,
    pub sample_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_cells: Option<u64>,
    pub is_nuclei: bool,
    pub tool: String,
    pub tool_version: String,
    pub command: Command,
    pub fastq_paths: Vec<String>,
    pub reference_path: ReferencePath,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

/// Options recognized by the serializer.
#[derive(Clone, Copy, Debug, Default)]
pub struct SerializeOptions {
    /// Collapse a single-element `reference_path` to a scalar, for
    /// consumers that predate list-valued references.
    pub reference_path_as_str: bool,
}

/// Render the manifest document.
pub fn serialize(entries: &[SampleEntry], options: SerializeOptions) -> Result<String> {
    let entries = entries
        .iter()
        .cloned()
        .map(|mut entry| {
            entry.reference_path = match (options.reference_path_as_str, entry.reference_path) {
                (true, ReferencePath::Many(paths)) if paths.len() == 1 => {
                    ReferencePath::One(paths.into_iter().next().expect("length checked"))
                }
                (false, ReferencePath::One(path)) => ReferencePath::Many(vec![path]),
                (_, reference_path) => reference_path,
            };
            entry
        })
        .collect_vec();
    Ok(serde_yaml::to_string(&entries)?)
}

/// Check a rendered manifest against the samplesheet schema, returning
/// every violation found rather than stopping at the first.
pub fn validate(document: &str) -> Result<Vec<String>> {
    let value: Value = serde_yaml::from_str(document)?;
    let Some(entries) = value.as_sequence() else {
        return Ok(vec!["manifest root is not a sequence".to_owned()]);
    };
    let mut violations = vec![];
    for (index, entry) in entries.iter().enumerate() {
        let Some(mapping) = entry.as_mapping() else {
            violations.push(format!("entry {index}: not a mapping"));
            continue;
        };
        let label = mapping
            .get("sample_name")
            .and_then(Value::as_str)
            .map_or_else(|| format!("entry {index}"), str::to_owned);
        let mut report = |message: String| violations.push(format!("{label}: {message}"));

        check_string_list(mapping.get("libraries"), "libraries", false, &mut report);
        check_string_list(
            mapping.get("library_types"),
            "library_types",
            false,
            &mut report,
        );
        check_string(mapping.get("sample_name"), "sample_name", &mut report);
        check_string(mapping.get("tool"), "tool", &mut report);
        check_string(mapping.get("tool_version"), "tool_version", &mut report);
        // fastq_paths may be empty (missing directories are a warning upstream)
        check_string_list(mapping.get("fastq_paths"), "fastq_paths", true, &mut report);

        match mapping.get("is_nuclei") {
            Some(v) if v.as_bool().is_some() => (),
            Some(_) => report("is_nuclei is not a boolean".to_owned()),
            None => report("is_nuclei is missing".to_owned()),
        }
        match mapping.get("n_cells") {
            None => (),
            Some(v) if v.as_u64().is_some() => (),
            Some(_) => report("n_cells is not a positive number".to_owned()),
        }
        match mapping.get("command").and_then(Value::as_str) {
            Some(command) if COMMANDS.contains(&command) => (),
            Some(command) => report(format!(
                "command '{command}' is not one of {}",
                COMMANDS.join("|")
            )),
            None => report("command is missing or not a string".to_owned()),
        }
        match mapping.get("reference_path") {
            Some(v) if v.as_str().is_some() => (),
            Some(v) if is_string_list(v, false) => (),
            Some(_) => report(
                "reference_path is neither a path nor a non-empty list of paths".to_owned(),
            ),
            None => report("reference_path is missing".to_owned()),
        }
        match mapping.get("tags") {
            None => (),
            Some(v) if is_string_list(v, false) => (),
            Some(_) => report("tags is not a non-empty list of strings".to_owned()),
        }
    }
    Ok(violations)
}

fn is_string_list(value: &Value, may_be_empty: bool) -> bool {
    value.as_sequence().is_some_and(|seq| {
        (may_be_empty || !seq.is_empty()) && seq.iter().all(|item| item.as_str().is_some())
    })
}

fn check_string_list(
    value: Option<&Value>,
    name: &str,
    may_be_empty: bool,
    report: &mut impl FnMut(String),
) {
    match value {
        Some(v) if is_string_list(v, may_be_empty) => (),
        Some(_) => report(format!("{name} is not a list of strings")),
        None => report(format!("{name} is missing")),
    }
}

fn check_string(value: Option<&Value>, name: &str, report: &mut impl FnMut(String)) {
    match value.and_then(Value::as_str) {
        Some(s) if !s.is_empty() => (),
        Some(_) => report(format!("{name} is empty")),
        None => report(format!("{name} is missing or not a string")),
    }
}
