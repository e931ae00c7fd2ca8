use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use tenxsheet::config::Config;
use tenxsheet::driver::{
    self, DriverArgs, FastqLocator, MetricsSource, VersionSource, WorksheetSource,
};
use tenxsheet::errors::Result;
use tenxsheet::manifest::{self, ReferencePath, SampleEntry, SerializeOptions};
use tenxsheet::records::MetricsRecord;
use tenxsheet::source::RawTable;
use tenxsheet::vocabulary::Command;

fn init() {
    let _ = pretty_env_logger::formatted_timed_builder()
        .filter_level(log::LevelFilter::Trace)
        .is_test(true)
        .try_init();
}

struct MemDrive {
    sheets: HashMap<String, RawTable>,
    metrics: Vec<MetricsRecord>,
}

impl WorksheetSource for MemDrive {
    fn fetch_worksheet(&self, _spreadsheet_id: &str, sheet_id: &str) -> Result<RawTable> {
        Ok(self.sheets[sheet_id].clone())
    }
}

impl MetricsSource for MemDrive {
    fn list_metrics_deliveries(&self, _folder_id: &str) -> Result<Vec<MetricsRecord>> {
        Ok(self.metrics.clone())
    }
}

struct MemVersions(HashMap<String, String>);

impl VersionSource for MemVersions {
    fn latest_tool_version(&self, tool: &str) -> Result<Option<String>> {
        Ok(self.0.get(tool).cloned())
    }
}

struct MemFastqs(BTreeSet<PathBuf>);

impl FastqLocator for MemFastqs {
    fn list_fastq_dirs(&self, _roots: &[PathBuf]) -> Result<BTreeSet<PathBuf>> {
        Ok(self.0.clone())
    }
}

fn config() -> Config {
    serde_yaml::from_str(
        "\
spreadsheet_id: tracking
metrics_folder_id: delivered
sheets:
  - sheet_id: main
    columns:
      Library ID: library_id
      Sample: sample_name
      Project: project
      Species: species
      Platform: 10x_platform
      Nuclei: is_nuclei
  - sheet_id: loading
    columns:
      Library ID: library_id
      Cells Loaded: n_cells
  - sheet_id: tags
    join: false
    columns:
      Library ID: library_id
      Tag: tag_id
platforms:
  3' GEX: Gene Expression
  5' VDJ: Immune Profiling
  CellPlex: Multiplexing Capture
reference_parent_dir: /refs
species_genomes:
  human: GRCh38-2020-A
",
    )
    .unwrap()
}

fn grid(rows: &[&[&str]]) -> RawTable {
    rows.iter()
        .map(|row| row.iter().map(|s| (*s).to_owned()).collect())
        .collect()
}

fn drive() -> MemDrive {
    let mut sheets = HashMap::new();
    sheets.insert(
        "main".to_owned(),
        grid(&[
            &["Library ID", "Sample", "Project", "Species", "Platform", "Nuclei"],
            &["SC1000001", "brain 1", "P1", "human", "5' VDJ", "FALSE"],
            &["SC1000002", "spleen-1", "P2", "human", "3' GEX", "FALSE"],
            &["SC1000003", "spleen-1", "P2", "human", "CellPlex", "FALSE"],
            &["SC1000004", "mixed-1", "P3", "human", "3' GEX", "FALSE"],
            &["SC1000005", "mixed-1", "P3", "human", "5' VDJ", "FALSE"],
        ]),
    );
    sheets.insert(
        "loading".to_owned(),
        grid(&[
            &["Library ID", "Cells Loaded"],
            &["SC1000001", "10,000"],
            &["SC1000002", "5000"],
        ]),
    );
    sheets.insert(
        "tags".to_owned(),
        grid(&[
            &["Library ID", "Tag"],
            &["SC1000003", "CMO301"],
            &["SC1000003", "CMO302"],
        ]),
    );
    MemDrive {
        sheets,
        metrics: vec![MetricsRecord {
            project: "P2".to_owned(),
            tool: "cellranger".to_owned(),
            tool_version: "7.0.1".to_owned(),
            reference: "GRCh38-2020-A".to_owned(),
            library_ids: vec![],
        }],
    }
}

fn versions() -> MemVersions {
    MemVersions([("cellranger".to_owned(), "7.1.0".to_owned())].into())
}

fn fastqs() -> MemFastqs {
    MemFastqs(
        ["/data/run1/brain-1", "/data/run1/spleen-1"]
            .iter()
            .map(PathBuf::from)
            .collect(),
    )
}

fn assemble() -> driver::Assembly {
    init();
    let config = config();
    driver::assemble(
        &DriverArgs {
            config: &config,
            fastq_roots: &[],
        },
        &drive(),
        &drive(),
        &versions(),
        &fastqs(),
    )
    .unwrap()
}

fn entry<'a>(assembly: &'a driver::Assembly, sample_name: &str) -> &'a SampleEntry {
    assembly
        .entries
        .iter()
        .find(|e| e.sample_name == sample_name)
        .unwrap()
}

#[test]
fn joined_vdj_sample_with_no_history_uses_latest_version() {
    let assembly = assemble();
    let brain = entry(&assembly, "brain-1");
    assert_eq!(brain.libraries, ["SC1000001"]);
    assert_eq!(brain.command, Command::Vdj);
    assert_eq!(brain.tool, "cellranger");
    // no delivered metrics for P1, so the latest known version applies
    assert_eq!(brain.tool_version, "7.1.0");
    assert_eq!(brain.n_cells, Some(10000));
    assert_eq!(
        brain.reference_path,
        ReferencePath::Many(vec!["/refs/10x-vdj/GRCh38-2020-A".to_owned()])
    );
    assert_eq!(brain.fastq_paths, ["/data/run1/brain-1"]);
    assert_eq!(brain.tags, None);
}

#[test]
fn multiplexed_sample_inherits_project_history_and_tags() {
    let assembly = assemble();
    let spleen = entry(&assembly, "spleen-1");
    assert_eq!(spleen.libraries, ["SC1000002", "SC1000003"]);
    assert_eq!(spleen.command, Command::Multi);
    assert_eq!(spleen.tool_version, "7.0.1");
    assert_eq!(
        spleen.reference_path,
        ReferencePath::Many(vec!["/refs/10x-rna/GRCh38-2020-A".to_owned()])
    );
    assert_eq!(
        spleen.tags,
        Some(vec!["CMO301".to_owned(), "CMO302".to_owned()])
    );
}

#[test]
fn undefined_combination_is_skipped_and_the_run_continues() {
    let assembly = assemble();
    assert_eq!(assembly.entries.len(), 2);
    assert_eq!(assembly.skipped.len(), 1);
    let skipped = &assembly.skipped[0];
    assert_eq!(skipped.sample_name, "mixed-1");
    assert_eq!(skipped.project, "P3");
    assert!(skipped.reason.contains("command derivation"));
}

#[test]
fn manifest_validates_and_round_trips() {
    let assembly = assemble();
    let document = manifest::serialize(&assembly.entries, SerializeOptions::default()).unwrap();
    assert_eq!(manifest::validate(&document).unwrap(), Vec::<String>::new());
    let parsed: Vec<SampleEntry> = serde_yaml::from_str(&document).unwrap();
    let again = manifest::serialize(&parsed, SerializeOptions::default()).unwrap();
    assert_eq!(document, again);
}

#[test]
fn reference_path_toggle_emits_scalars() {
    let assembly = assemble();
    let document = manifest::serialize(
        &assembly.entries,
        SerializeOptions {
            reference_path_as_str: true,
        },
    )
    .unwrap();
    assert!(document.contains("reference_path: /refs/10x-vdj/GRCh38-2020-A"));
    assert_eq!(manifest::validate(&document).unwrap(), Vec::<String>::new());
}

#[test]
fn conflicting_sheets_abort_the_whole_run() {
    init();
    let config = config();
    let mut drive = drive();
    // the loading sheet now contradicts the main sheet's sample name
    drive.sheets.insert(
        "loading".to_owned(),
        grid(&[
            &["Library ID", "Sample", "Cells Loaded"],
            &["SC1000001", "other-name", "10,000"],
        ]),
    );
    let spec = {
        let mut config = config.clone();
        config.sheets[1].columns.insert(
            "Sample".to_owned(),
            tenxsheet::source::Field::SampleName,
        );
        config
    };
    let err = driver::assemble(
        &DriverArgs {
            config: &spec,
            fastq_roots: &[],
        },
        &drive,
        &drive,
        &versions(),
        &fastqs(),
    )
    .unwrap_err();
    assert!(err.to_string().contains("SC1000001"));
}
