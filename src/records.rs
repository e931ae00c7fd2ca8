//! Typed records built from normalized rows.

use crate::errors::{Result, schema_error};
use crate::source::{Field, Row};
use serde::{Deserialize, Serialize};

/// One library after joining: a row of tracking-sheet data with its
/// metadata resolved to concrete types.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LibraryRecord {
    pub library_id: String,
    pub sample_name: String,
    pub sub_sample_name: Option<String>,
    pub project: String,
    pub species: Option<String>,
    /// The experimental-platform label as written in the sheet;
    /// mapped to a [crate::vocabulary::LibraryType] during grouping.
    pub tenx_platform: String,
    pub is_nuclei: bool,
    pub n_cells: Option<u64>,
    pub slide: Option<String>,
    pub area: Option<String>,
    pub tag_id: Option<String>,
    pub description: Option<String>,
}

impl LibraryRecord {
    pub fn from_row(row: &Row) -> Result<LibraryRecord> {
        let id = row.library_id().unwrap_or("?").to_owned();
        let required = |field: Field| -> Result<String> {
            row.get(field).map(str::to_owned).ok_or_else(|| {
                schema_error(format!("library {id}: missing required field {field}"))
            })
        };
        let optional = |field: Field| row.get(field).map(str::to_owned);
        Ok(LibraryRecord {
            library_id: required(Field::LibraryId)?,
            sample_name: required(Field::SampleName)?,
            sub_sample_name: optional(Field::SubSampleName),
            project: required(Field::Project)?,
            species: optional(Field::Species),
            tenx_platform: required(Field::TenxPlatform)?,
            is_nuclei: parse_bool(&id, row.get(Field::IsNuclei))?,
            n_cells: parse_n_cells(row.get(Field::NCells)),
            slide: optional(Field::Slide),
            area: optional(Field::Area),
            tag_id: optional(Field::TagId),
            description: optional(Field::Description),
        })
    }
}

fn parse_bool(library_id: &str, cell: Option<&str>) -> Result<bool> {
    match cell {
        None => Ok(false),
        Some(s) if s.eq_ignore_ascii_case("true") => Ok(true),
        Some(s) if s.eq_ignore_ascii_case("false") => Ok(false),
        Some(s) => Err(schema_error(format!(
            "library {library_id}: cannot read '{s}' as a boolean"
        ))),
    }
}

/// Cell counts are free text in the tracking sheet; tolerate thousands
/// separators and ignore anything that is not a positive number.
pub fn parse_n_cells(cell: Option<&str>) -> Option<u64> {
    let digits: String = cell?.chars().filter(|&c| c != ',').collect();
    digits.trim().parse().ok().filter(|&n| n > 0)
}

/// One row of historical delivered-metrics data. The sequence a
/// collaborator returns is in delivery order, oldest first.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsRecord {
    pub project: String,
    pub tool: String,
    pub tool_version: String,
    pub reference: String,
    #[serde(default)]
    pub library_ids: Vec<String>,
}
