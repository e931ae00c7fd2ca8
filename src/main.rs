use clap::{Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use log::{error, info};
use std::path::PathBuf;
use std::{fs, process};
use tenxsheet::config::Config;
use tenxsheet::driver::{self, DriverArgs};
use tenxsheet::errors::{Result, ValidationError, invalid_input_ref};
use tenxsheet::local::{FsFastqLocator, SnapshotDrive, VersionTable};
use tenxsheet::manifest::{self, SerializeOptions};

#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    #[command(subcommand)]
    command: CliCommand,
    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Assemble a samplesheet from the tracking worksheets
    Samplesheet {
        /// Directories to scan for FASTQ directories
        #[arg(required = true)]
        fastq_roots: Vec<PathBuf>,
        /// Run configuration (YAML)
        #[arg(short, long)]
        config: PathBuf,
        /// Drive snapshot (JSON)
        #[arg(long)]
        snapshot: PathBuf,
        /// Known latest tool versions (JSON)
        #[arg(long)]
        versions: PathBuf,
        /// Output file (YAML)
        #[arg(short, long)]
        outsheet: PathBuf,
        /// Emit a single reference path as a scalar rather than a list
        #[arg(long)]
        ref_path_as_str: bool,
    },
}

fn samplesheet(
    fastq_roots: &[PathBuf],
    config: &PathBuf,
    snapshot: &PathBuf,
    versions: &PathBuf,
    outsheet: &PathBuf,
    ref_path_as_str: bool,
) -> Result<()> {
    let config = Config::load(config)?;
    let drive = SnapshotDrive::load(snapshot)?;
    let versions = VersionTable::load(versions)?;

    let assembly = driver::assemble(
        &DriverArgs {
            config: &config,
            fastq_roots,
        },
        &drive,
        &drive,
        &versions,
        &FsFastqLocator,
    )?;
    if assembly.entries.is_empty() {
        return Err(invalid_input_ref("no samples could be assembled"));
    }

    let document = manifest::serialize(
        &assembly.entries,
        SerializeOptions {
            reference_path_as_str: ref_path_as_str,
        },
    )?;
    let violations = manifest::validate(&document)?;
    if !violations.is_empty() {
        return Err(ValidationError(violations).into());
    }
    fs::write(outsheet, document)?;
    info!(
        "wrote {} samples to {}",
        assembly.entries.len(),
        outsheet.display()
    );
    Ok(())
}

fn process(args: &Args) -> Result<()> {
    match &args.command {
        CliCommand::Samplesheet {
            fastq_roots,
            config,
            snapshot,
            versions,
            outsheet,
            ref_path_as_str,
        } => samplesheet(
            fastq_roots,
            config,
            snapshot,
            versions,
            outsheet,
            *ref_path_as_str,
        ),
    }
}

fn main() {
    let args = Args::parse();
    pretty_env_logger::formatted_timed_builder()
        .filter_level(args.verbose.log_level_filter())
        .init();
    match process(&args) {
        Ok(()) => (),
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    }
}
