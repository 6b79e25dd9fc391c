//! Tab-separated manifest of matched file pairs
//!
//! One row per file of every matched pair, run one before run two. Unmatched
//! pairs are left out.

use super::error::Result;
use super::types::{DataType, MatchResult, RunLabel};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const MANIFEST_HEADER: [&str; 6] = [
    "sample_name",
    "run_type",
    "run_number",
    "data_source",
    "data_type",
    "filepath",
];

/// A manifest line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestRow {
    pub sample_name: String,
    /// Producer id
    pub run_type: String,
    pub run_number: RunLabel,
    pub data_source: String,
    pub data_type: DataType,
    pub filepath: String,
}

/// Rows for every matched pair, producer then sample then data source order.
pub fn manifest_rows(results: &BTreeMap<String, MatchResult>) -> Vec<ManifestRow> {
    results
        .values()
        .flat_map(|result| result.matched_pairs())
        .flat_map(|pair| pair.files())
        .map(|file| ManifestRow {
            sample_name: file.sample_name.clone(),
            run_type: file.producer.clone(),
            run_number: file.run,
            data_source: file.data_source.clone(),
            data_type: file.data_type,
            filepath: file.path.clone(),
        })
        .collect()
}

/// Write the manifest to `path`, creating its parent directory.
pub fn write_manifest(results: &BTreeMap<String, MatchResult>, path: &Path) -> Result<PathBuf> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .terminator(csv::Terminator::Any(b'\n'))
        .has_headers(false)
        .from_path(path)?;
    writer.write_record(MANIFEST_HEADER)?;
    for row in manifest_rows(results) {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(path.to_path_buf())
}

/// Parse a manifest written by [`write_manifest`].
pub fn read_manifest(path: &Path) -> Result<Vec<ManifestRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .from_path(path)?;
    let mut rows = Vec::new();
    for record in reader.deserialize() {
        rows.push(record?);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::matching::perform_matching;
    use crate::discovery::types::InputFile;
    use tempfile::TempDir;

    fn input(sample: &str, run: RunLabel, source: &str, data_type: DataType) -> InputFile {
        InputFile {
            sample_name: sample.to_string(),
            run,
            producer: "umccrise".to_string(),
            data_source: source.to_string(),
            data_type,
            path: format!("s3://bucket/{run}/{sample}/{source}.tsv"),
        }
    }

    fn results() -> BTreeMap<String, MatchResult> {
        let one = vec![
            input("S1", RunLabel::One, "purple", DataType::CopyNumberVariants),
            input("S1", RunLabel::One, "cpsr", DataType::SmallVariants),
            input("S2", RunLabel::One, "cpsr", DataType::SmallVariants),
        ];
        let two = vec![input("S1", RunLabel::Two, "purple", DataType::CopyNumberVariants)];
        let mut results = BTreeMap::new();
        results.insert(
            "umccrise".to_string(),
            perform_matching("umccrise", &one, &two).unwrap(),
        );
        results
    }

    #[test]
    fn test_write_then_read_recovers_matched_files_only() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nextflow/input_files.tsv");

        let written = write_manifest(&results(), &path).unwrap();
        assert_eq!(written, path);

        let rows = read_manifest(&path).unwrap();
        let tuples: Vec<(&str, &str, RunLabel, &str)> = rows
            .iter()
            .map(|r| {
                (
                    r.sample_name.as_str(),
                    r.data_source.as_str(),
                    r.run_number,
                    r.filepath.as_str(),
                )
            })
            .collect();
        assert_eq!(
            tuples,
            vec![
                ("S1", "purple", RunLabel::One, "s3://bucket/one/S1/purple.tsv"),
                ("S1", "purple", RunLabel::Two, "s3://bucket/two/S1/purple.tsv"),
            ]
        );
        assert!(rows.iter().all(|r| r.data_type == DataType::CopyNumberVariants));
    }

    #[test]
    fn test_manifest_text_format() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("input_files.tsv");
        write_manifest(&results(), &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "sample_name\trun_type\trun_number\tdata_source\tdata_type\tfilepath"
        );
        assert_eq!(
            lines[1],
            "S1\tumccrise\tone\tpurple\tcopy_number_variants\ts3://bucket/one/S1/purple.tsv"
        );
        assert_eq!(lines.len(), 3);
        assert!(text.ends_with('\n'));
        assert!(!text.contains('\r'));
    }
}
