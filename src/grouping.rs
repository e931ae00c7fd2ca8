//! Grouping library records into samples and deriving the command.

use crate::errors::SampleError;
use crate::join::TagLookup;
use crate::records::LibraryRecord;
use crate::source::Field;
use crate::vocabulary::{self, Command, LibraryType};
use itertools::Itertools;
use std::collections::hash_map::Entry::{Occupied, Vacant};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::result;

/// One sample: the libraries grouped under a shared sample name and
/// project, with the processing command already derived.
#[derive(Clone, Debug)]
pub struct SampleGroup {
    pub sample_name: String,
    pub project: String,
    /// Ordered, de-duplicated library IDs contributing to this sample.
    pub libraries: Vec<String>,
    pub library_types: BTreeSet<LibraryType>,
    pub species: Option<String>,
    pub sub_sample_names: Vec<String>,
    pub n_cells: Option<u64>,
    pub is_nuclei: bool,
    pub tool: &'static str,
    pub command: Command,
    pub reference_dirs: &'static [&'static str],
    /// Multiplexing tag IDs, sorted; empty when the sample is not
    /// multiplexed.
    pub tags: Vec<String>,
}

/// A sample that could not be assembled. Dropping it does not abort
/// the run.
#[derive(Debug)]
pub struct SkippedSample {
    pub sample_name: String,
    pub project: String,
    pub reason: SampleError,
}

pub type GroupResult = result::Result<SampleGroup, SkippedSample>;

/// Group records by `(sample_name, project)` in first-encounter order
/// and derive each group's command. Failures are per-group values, not
/// aborts.
pub fn group(
    records: &[LibraryRecord],
    platform_to_lib_type: &HashMap<String, LibraryType>,
    tag_lookup: &TagLookup,
) -> Vec<GroupResult> {
    let mut order: Vec<(String, String)> = vec![];
    let mut members: HashMap<(String, String), Vec<&LibraryRecord>> = HashMap::new();
    for record in records {
        let key = (record.sample_name.clone(), record.project.clone());
        match members.entry(key) {
            Vacant(e) => {
                order.push(e.key().clone());
                e.insert(vec![record]);
            }
            Occupied(mut e) => e.get_mut().push(record),
        }
    }
    order
        .into_iter()
        .map(|key| {
            let group_members = &members[&key];
            assemble(&key.0, &key.1, group_members, platform_to_lib_type, tag_lookup).map_err(
                |reason| SkippedSample {
                    sample_name: key.0.clone(),
                    project: key.1.clone(),
                    reason,
                },
            )
        })
        .collect_vec()
}

fn assemble(
    sample_name: &str,
    project: &str,
    members: &[&LibraryRecord],
    platform_to_lib_type: &HashMap<String, LibraryType>,
    tag_lookup: &TagLookup,
) -> result::Result<SampleGroup, SampleError> {
    let mut libraries: Vec<String> = vec![];
    let mut library_types = BTreeSet::new();
    for member in members {
        if !libraries.contains(&member.library_id) {
            libraries.push(member.library_id.clone());
        }
        match platform_to_lib_type.get(&member.tenx_platform) {
            Some(&lib_type) => {
                library_types.insert(lib_type);
            }
            None => {
                return Err(SampleError::CommandDerivation(format!(
                    "sample {sample_name} ({project}): unknown 10x platform label '{}'",
                    member.tenx_platform
                )));
            }
        }
    }

    let program = vocabulary::program_for(&library_types).ok_or_else(|| {
        SampleError::CommandDerivation(format!(
            "sample {sample_name} ({project}): no command defined for library types [{}]",
            library_types.iter().join(", ")
        ))
    })?;

    let nuclei: HashSet<bool> = members.iter().map(|m| m.is_nuclei).collect();
    if nuclei.len() > 1 {
        return Err(SampleError::Consistency(format!(
            "sample {sample_name} ({project}): libraries disagree on is_nuclei"
        )));
    }
    let is_nuclei = nuclei.into_iter().next().unwrap_or(false);

    // cells targeted is conservatively the largest declared figure
    let n_cells = members.iter().filter_map(|m| m.n_cells).max();

    let species = members.iter().find_map(|m| m.species.clone());
    let sub_sample_names = members
        .iter()
        .filter_map(|m| m.sub_sample_name.clone())
        .unique()
        .collect_vec();

    let tags = members
        .iter()
        .flat_map(|m| {
            let from_sheets = tag_lookup
                .get(&m.library_id)
                .into_iter()
                .flatten()
                .filter_map(|row| row.get(Field::TagId).map(str::to_owned));
            m.tag_id.clone().into_iter().chain(from_sheets)
        })
        .unique()
        .sorted()
        .collect_vec();

    Ok(SampleGroup {
        sample_name: sample_name.to_owned(),
        project: project.to_owned(),
        libraries,
        library_types,
        species,
        sub_sample_names,
        n_cells,
        is_nuclei,
        tool: program.tool,
        command: program.command,
        reference_dirs: program.reference_dirs,
        tags,
    })
}
