//! Reading raw worksheet tables into normalized row mappings.
//!
//! A worksheet arrives as a plain grid of cell strings; the sheet
//! specification says which columns to keep (renamed to canonical
//! fields), where the header row sits, and whether the rows take part
//! in the library join.

use crate::errors::{Result, schema_error};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Canonical tracking-sheet fields after column renaming.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    LibraryId,
    SampleName,
    SubSampleName,
    Project,
    Species,
    #[serde(rename = "10x_platform")]
    TenxPlatform,
    IsNuclei,
    NCells,
    Slide,
    Area,
    TagId,
    Description,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Field::LibraryId => "library_id",
            Field::SampleName => "sample_name",
            Field::SubSampleName => "sub_sample_name",
            Field::Project => "project",
            Field::Species => "species",
            Field::TenxPlatform => "10x_platform",
            Field::IsNuclei => "is_nuclei",
            Field::NCells => "n_cells",
            Field::Slide => "slide",
            Field::Area => "area",
            Field::TagId => "tag_id",
            Field::Description => "description",
        };
        write!(f, "{name}")
    }
}

/// How to read one worksheet.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SheetSpec {
    pub sheet_id: String,
    /// Source column name to canonical field.
    pub columns: HashMap<String, Field>,
    #[serde(default)]
    pub header_row: usize,
    /// Whether rows of this sheet join into the main library set;
    /// non-joinable sheets are kept for dictionary-style lookups.
    #[serde(default = "default_join")]
    pub join: bool,
}

fn default_join() -> bool {
    true
}

impl SheetSpec {
    /// Validate the declared column mapping, eagerly at load time.
    pub fn check(&self) -> Result<()> {
        if self.columns.is_empty() {
            return Err(schema_error(format!(
                "sheet {}: no columns declared",
                self.sheet_id
            )));
        }
        if !self.columns.values().contains(&Field::LibraryId) {
            return Err(schema_error(format!(
                "sheet {}: no source column is mapped to library_id",
                self.sheet_id
            )));
        }
        Ok(())
    }
}

/// A worksheet as fetched: a grid of cell values, header row included.
pub type RawTable = Vec<Vec<String>>;

/// One normalized row: the canonical fields that had a non-empty cell.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Row {
    pub fields: BTreeMap<Field, String>,
}

impl Row {
    pub fn get(&self, field: Field) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    pub fn library_id(&self) -> Option<&str> {
        self.get(Field::LibraryId)
    }

    #[cfg(test)]
    pub fn from_pairs(pairs: &[(Field, &str)]) -> Row {
        Row {
            fields: pairs
                .iter()
                .map(|&(f, v)| (f, v.to_owned()))
                .collect(),
        }
    }
}

/// Empty cells and the lab's "not applicable" dash mean absent.
fn normalize(cell: &str) -> Option<String> {
    let cell = cell.trim();
    if cell.is_empty() || cell == "-" {
        None
    } else {
        Some(cell.to_owned())
    }
}

/// Apply the column renaming of `spec` to a fetched table.
///
/// Rows wider than the header are ragged and rejected; rows shorter
/// than the header are treated as having empty trailing cells, which
/// is how spreadsheet APIs deliver them. Rows whose library-identifier
/// cell is empty are skipped as blank tracking lines.
pub fn read(spec: &SheetSpec, raw: &RawTable) -> Result<Vec<Row>> {
    let header = raw.get(spec.header_row).ok_or_else(|| {
        schema_error(format!(
            "sheet {}: table has no header row at index {}",
            spec.sheet_id, spec.header_row
        ))
    })?;
    let mapped = header
        .iter()
        .enumerate()
        .filter_map(|(i, name)| spec.columns.get(name.trim()).map(|&field| (i, field)))
        .collect_vec();
    if mapped.is_empty() {
        return Err(schema_error(format!(
            "sheet {}: none of the declared columns appear in the header row",
            spec.sheet_id
        )));
    }
    if !mapped.iter().any(|&(_, field)| field == Field::LibraryId) {
        return Err(schema_error(format!(
            "sheet {}: the library_id column is missing from the header row",
            spec.sheet_id
        )));
    }
    let width = header.len();
    let mut rows = vec![];
    for (lineno, cells) in raw.iter().enumerate().skip(spec.header_row + 1) {
        if cells.len() > width {
            return Err(schema_error(format!(
                "sheet {}: row {} has {} cells but the header has {}",
                spec.sheet_id,
                lineno,
                cells.len(),
                width
            )));
        }
        let mut row = Row::default();
        for &(i, field) in &mapped {
            if let Some(value) = cells.get(i).and_then(|cell| normalize(cell)) {
                row.fields.insert(field, value);
            }
        }
        if row.library_id().is_none() {
            continue;
        }
        rows.push(row);
    }
    Ok(rows)
}
