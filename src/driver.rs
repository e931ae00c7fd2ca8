//! Main entry point: the batch pipeline from worksheets to manifest
//! entries.
//!
//! Read all sources, join, group, resolve, assemble. Each stage
//! consumes the previous stage's output and produces a new value;
//! nothing external is held across stages. Per-sample failures are
//! collected and reported, fatal failures propagate.

use crate::config::Config;
use crate::errors::{Result, SampleError};
use crate::fastq;
use crate::grouping::{self, SampleGroup};
use crate::join::{self, SheetTable};
use crate::manifest::{ReferencePath, SampleEntry};
use crate::metrics;
use crate::records::{LibraryRecord, MetricsRecord};
use crate::source::{self, RawTable};
use itertools::Itertools;
use log::{debug, info, warn};
use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use std::result;

/// Reads one worksheet of a cloud spreadsheet as a grid of cells.
pub trait WorksheetSource {
    fn fetch_worksheet(&self, spreadsheet_id: &str, sheet_id: &str) -> Result<RawTable>;
}

/// Lists previously delivered metrics, oldest delivery first.
pub trait MetricsSource {
    fn list_metrics_deliveries(&self, folder_id: &str) -> Result<Vec<MetricsRecord>>;
}

/// Knows the current best version of each processing tool.
pub trait VersionSource {
    fn latest_tool_version(&self, tool: &str) -> Result<Option<String>>;
}

/// Finds directories containing sequencing read files.
pub trait FastqLocator {
    fn list_fastq_dirs(&self, roots: &[PathBuf]) -> Result<BTreeSet<PathBuf>>;
}

/// What to assemble.
pub struct DriverArgs<'a> {
    pub config: &'a Config,
    /// Root directories to scan for FASTQ directories.
    pub fastq_roots: &'a [PathBuf],
}

/// A sample excluded from the manifest, with the reason.
#[derive(Debug)]
pub struct SkippedSample {
    pub sample_name: String,
    pub project: String,
    pub reason: String,
}

/// The assembled manifest entries plus the samples that had to be
/// dropped. Serialization and writing are the caller's job, so nothing
/// is ever partially written on a fatal error.
#[derive(Debug)]
pub struct Assembly {
    pub entries: Vec<SampleEntry>,
    pub skipped: Vec<SkippedSample>,
}

/// Run the pipeline.
///
/// This is the main entry point for the library.
pub fn assemble(
    args: &DriverArgs,
    worksheets: &dyn WorksheetSource,
    metrics_source: &dyn MetricsSource,
    versions: &dyn VersionSource,
    fastqs: &dyn FastqLocator,
) -> Result<Assembly> {
    let config = args.config;

    let mut tables = vec![];
    for spec in &config.sheets {
        let raw = worksheets.fetch_worksheet(&config.spreadsheet_id, &spec.sheet_id)?;
        let rows = source::read(spec, &raw)?;
        debug!(
            "sheet {}: {} rows ({})",
            spec.sheet_id,
            rows.len(),
            if spec.join { "joinable" } else { "lookup only" }
        );
        tables.push(SheetTable {
            spec: spec.clone(),
            rows,
        });
    }

    let (rows, tag_lookup) = join::join(tables)?;
    let records = rows
        .iter()
        .map(LibraryRecord::from_row)
        .collect::<Result<Vec<_>>>()?;
    info!("joined {} libraries", records.len());

    let deliveries = metrics_source.list_metrics_deliveries(&config.metrics_folder_id)?;
    info!("{} historical metrics deliveries", deliveries.len());
    let available_dirs = fastqs.list_fastq_dirs(args.fastq_roots)?;
    info!("{} fastq directories found", available_dirs.len());

    // one version lookup per tool, however many samples use it
    let mut latest_known: HashMap<String, String> = HashMap::new();

    let mut entries = vec![];
    let mut skipped = vec![];
    for outcome in grouping::group(&records, &config.platforms, &tag_lookup) {
        match outcome {
            Err(s) => skipped.push(SkippedSample {
                sample_name: s.sample_name,
                project: s.project,
                reason: s.reason.to_string(),
            }),
            Ok(group) => match build_entry(
                config,
                &group,
                &deliveries,
                versions,
                &mut latest_known,
                &available_dirs,
            ) {
                Ok(entry) => entries.push(entry),
                Err(reason) => skipped.push(SkippedSample {
                    sample_name: group.sample_name.clone(),
                    project: group.project.clone(),
                    reason: reason.to_string(),
                }),
            },
        }
    }
    for s in &skipped {
        warn!("excluded {} ({}): {}", s.sample_name, s.project, s.reason);
    }
    info!(
        "assembled {} samples, excluded {}",
        entries.len(),
        skipped.len()
    );
    Ok(Assembly { entries, skipped })
}

fn build_entry(
    config: &Config,
    group: &SampleGroup,
    deliveries: &[MetricsRecord],
    versions: &dyn VersionSource,
    latest_known: &mut HashMap<String, String>,
    available_dirs: &BTreeSet<PathBuf>,
) -> result::Result<SampleEntry, SampleError> {
    if !latest_known.contains_key(group.tool) {
        let fetched = versions
            .latest_tool_version(group.tool)
            .map_err(|e| SampleError::Resolution(format!("latest version of {}: {e}", group.tool)))?;
        if let Some(version) = fetched {
            latest_known.insert(group.tool.to_owned(), version);
        }
    }

    let genome_pattern = config.genome_pattern(group.species.as_deref());
    let params = metrics::resolve_tool_params(
        &group.project,
        group.tool,
        deliveries,
        genome_pattern.as_ref(),
        latest_known,
    )?;

    let genome = params
        .reference
        .or_else(|| {
            let species = group.species.as_deref()?;
            config.species_genomes.get(species).cloned()
        })
        .ok_or_else(|| {
            SampleError::Resolution(format!(
                "sample {} ({}): no historical reference and no default genome for species {}",
                group.sample_name,
                group.project,
                group.species.as_deref().unwrap_or("<unknown>")
            ))
        })?;
    let reference_paths =
        fastq::match_reference(group.reference_dirs, &genome, &config.reference_parent_dir);

    let sample_name = fastq::sanitize_sample_name(&group.sample_name);
    let mut wanted_sub_names = group.sub_sample_names.clone();
    if sample_name != group.sample_name {
        // directories may be named after either spelling
        wanted_sub_names.push(group.sample_name.clone());
    }
    let fastq_paths = fastq::match_fastqs(&sample_name, &wanted_sub_names, available_dirs);

    Ok(SampleEntry {
        libraries: group.libraries.clone(),
        library_types: group.library_types.iter().copied().collect_vec(),
        sample_name,
        n_cells: group.n_cells,
        is_nuclei: group.is_nuclei,
        tool: group.tool.to_owned(),
        tool_version: params.tool_version,
        command: group.command,
        fastq_paths: fastq_paths
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect_vec(),
        reference_path: ReferencePath::Many(
            reference_paths
                .iter()
                .map(|p| p.to_string_lossy().into_owned())
                .collect_vec(),
        ),
        tags: if group.tags.is_empty() {
            None
        } else {
            Some(group.tags.clone())
        },
    })
}
