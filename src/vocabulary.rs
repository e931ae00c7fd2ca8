//! The fixed library-type vocabulary and the command table.
//!
//! Every 10x platform label from the tracking sheet maps (via the run
//! configuration) to one of the [LibraryType] variants below, and the
//! set of library types present in a sample determines the processing
//! tool and command through [program_for]. The table is deliberately a
//! closed lookup: combinations it does not list are errors, never
//! guesses.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Canonical vocabulary term describing what a library measures.
///
/// Variants are ordered alphabetically by their serialized label so
/// that a sorted set of library types matches the combination table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
pub enum LibraryType {
    #[serde(rename = "Antibody Capture")]
    AntibodyCapture,
    #[serde(rename = "CRISPR Guide Capture")]
    CrisprGuideCapture,
    #[serde(rename = "Chromatin Accessibility")]
    ChromatinAccessibility,
    #[serde(rename = "CytAssist Gene Expression")]
    CytAssistGeneExpression,
    #[serde(rename = "Gene Expression")]
    GeneExpression,
    #[serde(rename = "Immune Profiling")]
    ImmuneProfiling,
    #[serde(rename = "Multiplexing Capture")]
    MultiplexingCapture,
    #[serde(rename = "Spatial Gene Expression")]
    SpatialGeneExpression,
}

impl fmt::Display for LibraryType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let label = match self {
            LibraryType::AntibodyCapture => "Antibody Capture",
            LibraryType::CrisprGuideCapture => "CRISPR Guide Capture",
            LibraryType::ChromatinAccessibility => "Chromatin Accessibility",
            LibraryType::CytAssistGeneExpression => "CytAssist Gene Expression",
            LibraryType::GeneExpression => "Gene Expression",
            LibraryType::ImmuneProfiling => "Immune Profiling",
            LibraryType::MultiplexingCapture => "Multiplexing Capture",
            LibraryType::SpatialGeneExpression => "Spatial Gene Expression",
        };
        write!(f, "{label}")
    }
}

/// The processing mode required by the downstream tool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Command {
    Count,
    Vdj,
    Multi,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Command::Count => write!(f, "count"),
            Command::Vdj => write!(f, "vdj"),
            Command::Multi => write!(f, "multi"),
        }
    }
}

/// The accepted values of the `command` manifest field.
pub const COMMANDS: [&str; 3] = ["count", "vdj", "multi"];

/// The tool invocation a library-type combination resolves to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Program {
    pub tool: &'static str,
    pub command: Command,
    /// Reference subdirectories, one per modality, in library-type order.
    pub reference_dirs: &'static [&'static str],
}

/// Look up the tool, command and reference layout for a combination of
/// library types. Pure function of the set: identical sets always
/// yield identical programs regardless of encounter order.
pub fn program_for(library_types: &BTreeSet<LibraryType>) -> Option<Program> {
    use Command::*;
    use LibraryType::*;
    let p = |tool, command, reference_dirs| Program {
        tool,
        command,
        reference_dirs,
    };
    let combo = library_types.iter().copied().collect_vec();
    match combo.as_slice() {
        [ChromatinAccessibility] => Some(p("cellranger-atac", Count, &["10x-atac"])),
        [CytAssistGeneExpression] => Some(p("spaceranger", Count, &["10x-vis"])),
        [GeneExpression] => Some(p("cellranger", Count, &["10x-rna"])),
        [ImmuneProfiling] => Some(p("cellranger", Vdj, &["10x-vdj"])),
        [SpatialGeneExpression] => Some(p("spaceranger", Count, &["10x-vis"])),
        // cell-surface protein or guide co-profiling, not multiplexed
        [AntibodyCapture, GeneExpression] => Some(p("cellranger", Count, &["10x-rna"])),
        [CrisprGuideCapture, GeneExpression] => Some(p("cellranger", Count, &["10x-rna"])),
        // multiome needs the dedicated multi-platform tool
        [ChromatinAccessibility, GeneExpression] => Some(p("cellranger-arc", Count, &["10x-arc"])),
        [GeneExpression, MultiplexingCapture] => Some(p("cellranger", Multi, &["10x-rna"])),
        _ => None,
    }
}
