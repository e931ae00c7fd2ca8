//! Inferring tool parameters from previously delivered metrics.
//!
//! Projects tend to be processed the same way from run to run, so the
//! most recent delivery for a project is the best guess for the tool
//! version and reference genome. When a project has never been
//! delivered, the current best-known version of the tool is used and
//! the reference is left for the caller to derive from library types.

use crate::errors::SampleError;
use crate::records::MetricsRecord;
use regex::Regex;
use std::collections::HashMap;
use std::result;

/// Resolved processing parameters for one sample.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolParams {
    pub tool: String,
    pub tool_version: String,
    /// Genome name taken from history; absent when falling back to the
    /// latest known version.
    pub reference: Option<String>,
}

/// Pick tool parameters for `project`.
///
/// `records` must be in delivery order, oldest first; the most recent
/// matching delivery wins. Ties among same-day deliveries follow the
/// order the collaborator returned. `genome_pattern` restricts history
/// to references plausible for the sample's species.
pub fn resolve_tool_params(
    project: &str,
    tool: &str,
    records: &[MetricsRecord],
    genome_pattern: Option<&Regex>,
    latest_known: &HashMap<String, String>,
) -> result::Result<ToolParams, SampleError> {
    let latest_delivery = records.iter().rev().find(|record| {
        record.project == project
            && record.tool == tool
            && genome_pattern.is_none_or(|pattern| pattern.is_match(&record.reference))
    });
    if let Some(record) = latest_delivery {
        return Ok(ToolParams {
            tool: record.tool.clone(),
            tool_version: record.tool_version.clone(),
            reference: Some(record.reference.clone()),
        });
    }
    match latest_known.get(tool) {
        Some(version) => Ok(ToolParams {
            tool: tool.to_owned(),
            tool_version: version.clone(),
            reference: None,
        }),
        None => Err(SampleError::Resolution(format!(
            "project {project}: no delivered metrics and no known latest version for {tool}"
        ))),
    }
}
