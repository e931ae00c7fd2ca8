//! Locating FASTQ directories and reference genomes for a sample.

use crate::errors::Result;
use itertools::Itertools;
use log::warn;
use regex::Regex;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s_]+").expect("static pattern"));
static BLACKLIST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9\-]").expect("static pattern"));

/// Replace separators with `-` and drop anything else that is not
/// alphanumeric; the downstream tools reject other characters in
/// sample names.
pub fn sanitize_sample_name(name: &str) -> String {
    let dashed = SEPARATORS.replace_all(name.trim(), "-");
    BLACKLIST.replace_all(&dashed, "").into_owned()
}

/// Directories whose final component equals the sample name or one of
/// its sub-sample names, case-sensitively. Zero matches is a warning,
/// not an error: the sample stays in the manifest so the pipeline can
/// fail explicitly instead of silently dropping it.
pub fn match_fastqs(
    sample_name: &str,
    sub_sample_names: &[String],
    available: &BTreeSet<PathBuf>,
) -> Vec<PathBuf> {
    let mut wanted: Vec<&str> = vec![sample_name];
    wanted.extend(sub_sample_names.iter().map(String::as_str));
    let matched = available
        .iter()
        .filter(|dir| {
            dir.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| wanted.contains(&name))
        })
        .cloned()
        .collect_vec();
    if matched.is_empty() {
        warn!(
            "no fastq directory matches sample {sample_name}; emitting it with an empty path list"
        );
    }
    matched
}

/// Build one reference path per modality of the resolved program, in
/// library-type order.
pub fn match_reference(
    reference_dirs: &[&str],
    genome: &str,
    reference_parent_dir: &Path,
) -> Vec<PathBuf> {
    reference_dirs
        .iter()
        .map(|dir| reference_parent_dir.join(dir).join(genome))
        .collect_vec()
}

/// Scan `roots` for directories that contain sequencing read files:
/// the root itself or any of its immediate subdirectories counts when
/// it holds at least one entry whose name mentions fastq.
pub fn scan_fastq_dirs(roots: &[PathBuf]) -> Result<BTreeSet<PathBuf>> {
    let mut dirs = BTreeSet::new();
    for root in roots {
        if has_read_files(root)? {
            dirs.insert(root.clone());
        }
        for entry in fs::read_dir(root)? {
            let path = entry?.path();
            if path.is_dir() && has_read_files(&path)? {
                dirs.insert(path);
            }
        }
    }
    Ok(dirs)
}

fn has_read_files(dir: &Path) -> Result<bool> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.path().is_file()
            && entry.file_name().to_string_lossy().contains("fastq")
        {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod test {
    use super::*;

    fn dirs(paths: &[&str]) -> BTreeSet<PathBuf> {
        paths.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn sanitize_replaces_separators_and_strips_junk() {
        assert_eq!(sanitize_sample_name("my sample_1"), "my-sample-1");
        assert_eq!(sanitize_sample_name("  spaced  "), "spaced");
        assert_eq!(sanitize_sample_name("we?ird#na!me"), "weirdname");
        assert_eq!(sanitize_sample_name("already-fine"), "already-fine");
    }

    #[test]
    fn matches_final_component_exactly() {
        let available = dirs(&["/data/run1/S1", "/data/run1/S10", "/data/run2/S1"]);
        let matched = match_fastqs("S1", &[], &available);
        assert_eq!(
            matched,
            [PathBuf::from("/data/run1/S1"), PathBuf::from("/data/run2/S1")]
        );
    }

    #[test]
    fn matching_is_case_sensitive() {
        let available = dirs(&["/data/s1"]);
        assert!(match_fastqs("S1", &[], &available).is_empty());
    }

    #[test]
    fn sub_sample_names_also_match() {
        let available = dirs(&["/data/S1-a", "/data/S1-b", "/data/other"]);
        let subs = vec!["S1-a".to_owned(), "S1-b".to_owned()];
        let matched = match_fastqs("S1", &subs, &available);
        assert_eq!(matched.len(), 2);
    }

    #[test]
    fn zero_matches_keeps_sample_with_empty_list() {
        let matched = match_fastqs("S1", &[], &dirs(&["/data/S2"]));
        assert!(matched.is_empty());
    }

    #[test]
    fn reference_path_per_modality() {
        let paths = match_reference(&["10x-arc"], "GRCh38-2020-A", Path::new("/refs"));
        assert_eq!(paths, [PathBuf::from("/refs/10x-arc/GRCh38-2020-A")]);
        let paths = match_reference(
            &["10x-rna", "10x-vdj"],
            "GRCh38-2020-A",
            Path::new("/refs"),
        );
        assert_eq!(paths.len(), 2);
    }

    #[test]
    fn scan_finds_dirs_with_read_files() {
        let root = tempfile::tempdir().unwrap();
        let with = root.path().join("S1");
        let without = root.path().join("notes");
        fs::create_dir(&with).unwrap();
        fs::create_dir(&without).unwrap();
        fs::write(with.join("SC1000001_S1_R1_001.fastq.gz"), b"").unwrap();
        fs::write(without.join("readme.txt"), b"").unwrap();
        let found = scan_fastq_dirs(&[root.path().to_path_buf()]).unwrap();
        assert_eq!(found, [with].into_iter().collect());
    }
}
