//! File-backed collaborator implementations.
//!
//! Cloud access stays outside this crate: an exporting step dumps the
//! tracking spreadsheet and the delivered-metrics folder into a JSON
//! snapshot, and the latest tool versions into a JSON table. These
//! types serve that data through the [crate::driver] traits so the
//! binary works end to end without any network code.

use crate::driver::{FastqLocator, MetricsSource, VersionSource, WorksheetSource};
use crate::errors::{Result, fetch_error};
use crate::fastq;
use crate::records::MetricsRecord;
use crate::source::RawTable;
use anyhow::Context;
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

/// A local dump of the drive content the assembly needs: worksheet
/// grids per spreadsheet, and metrics deliveries per folder in
/// delivery order (the exporting side sorts by delivery time; ties
/// keep its ordering).
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SnapshotDrive {
    #[serde(default)]
    spreadsheets: HashMap<String, HashMap<String, RawTable>>,
    #[serde(default)]
    metrics: HashMap<String, Vec<MetricsRecord>>,
}

impl SnapshotDrive {
    pub fn load(path: &Path) -> Result<SnapshotDrive> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        let snapshot = serde_json::from_str(&raw)
            .with_context(|| format!("cannot parse {}", path.display()))?;
        Ok(snapshot)
    }
}

impl WorksheetSource for SnapshotDrive {
    fn fetch_worksheet(&self, spreadsheet_id: &str, sheet_id: &str) -> Result<RawTable> {
        self.spreadsheets
            .get(spreadsheet_id)
            .and_then(|sheets| sheets.get(sheet_id))
            .cloned()
            .ok_or_else(|| {
                fetch_error(format!(
                    "snapshot has no sheet {sheet_id} in spreadsheet {spreadsheet_id}"
                ))
            })
    }
}

impl MetricsSource for SnapshotDrive {
    fn list_metrics_deliveries(&self, folder_id: &str) -> Result<Vec<MetricsRecord>> {
        Ok(self.metrics.get(folder_id).cloned().unwrap_or_default())
    }
}

/// Known latest tool versions, exported from the pipeline repository's
/// version table.
#[derive(Debug, Default, Deserialize)]
pub struct VersionTable(HashMap<String, String>);

impl VersionTable {
    pub fn load(path: &Path) -> Result<VersionTable> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        let table = serde_json::from_str(&raw)
            .with_context(|| format!("cannot parse {}", path.display()))?;
        Ok(table)
    }
}

impl VersionSource for VersionTable {
    fn latest_tool_version(&self, tool: &str) -> Result<Option<String>> {
        Ok(self.0.get(tool).cloned())
    }
}

/// Locates FASTQ directories on the local filesystem.
pub struct FsFastqLocator;

impl FastqLocator for FsFastqLocator {
    fn list_fastq_dirs(&self, roots: &[PathBuf]) -> Result<BTreeSet<PathBuf>> {
        fastq::scan_fastq_dirs(roots)
    }
}
