//! Joining normalized worksheet tables on the library identifier.

use crate::errors::{ConflictError, Result};
use crate::source::{Row, SheetSpec};
use std::collections::hash_map::Entry::{Occupied, Vacant};
use std::collections::{HashMap, HashSet};

/// One worksheet plus the spec it was read with.
#[derive(Clone, Debug)]
pub struct SheetTable {
    pub spec: SheetSpec,
    pub rows: Vec<Row>,
}

/// Rows from non-joined sheets, indexed by library ID. These are kept
/// verbatim for dictionary-style lookups (e.g. multiplexing tags) and
/// never merged into the main row set.
pub type TagLookup = HashMap<String, Vec<Row>>;

/// Outer-join the joinable tables on `library_id`, left to right.
///
/// Later tables fill in fields the earlier ones left absent; differing
/// non-absent values for the same field are a [ConflictError]. Within
/// a single table a duplicated `library_id` keeps its first row. The
/// result preserves the encounter order of the first table that
/// mentions each library, so output is deterministic.
pub fn join(tables: Vec<SheetTable>) -> Result<(Vec<Row>, TagLookup)> {
    let (joinable, auxiliary): (Vec<_>, Vec<_>) =
        tables.into_iter().partition(|table| table.spec.join);

    let mut order: Vec<String> = vec![];
    let mut merged: HashMap<String, Row> = HashMap::new();
    for table in &joinable {
        let mut seen_here: HashSet<&str> = HashSet::new();
        for row in &table.rows {
            let Some(id) = row.library_id() else { continue };
            if !seen_here.insert(id) {
                continue;
            }
            match merged.entry(id.to_owned()) {
                Vacant(e) => {
                    order.push(id.to_owned());
                    e.insert(row.clone());
                }
                Occupied(mut e) => merge_into(e.get_mut(), row)?,
            }
        }
    }
    let rows = order
        .iter()
        .map(|id| merged.remove(id).expect("id recorded at insert"))
        .collect();

    let mut tag_lookup = TagLookup::new();
    for table in auxiliary {
        for row in table.rows {
            if let Some(id) = row.library_id() {
                tag_lookup.entry(id.to_owned()).or_default().push(row);
            }
        }
    }
    Ok((rows, tag_lookup))
}

fn merge_into(existing: &mut Row, incoming: &Row) -> Result<()> {
    let id = existing.library_id().unwrap_or("?").to_owned();
    for (&field, value) in &incoming.fields {
        match existing.fields.get(&field) {
            None => {
                existing.fields.insert(field, value.clone());
            }
            Some(prev) if prev == value => (),
            Some(prev) => {
                return Err(ConflictError {
                    field: field.to_string(),
                    library_id: id,
                    left: prev.clone(),
                    right: value.clone(),
                }
                .into());
            }
        }
    }
    Ok(())
}
