//! Core types for input discovery
//!
//! Files discovered in two runs are grouped per sample and data source into
//! [`FilePair`]s, and samples are partitioned into matched and unmatched sets.

use super::error::{DiscoveryError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Run and data type labels
// ============================================================================

/// Which of the two compared runs a file came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunLabel {
    One,
    Two,
}

impl RunLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunLabel::One => "one",
            RunLabel::Two => "two",
        }
    }

    /// Set number shown in reports.
    pub fn number(&self) -> u8 {
        match self {
            RunLabel::One => 1,
            RunLabel::Two => 2,
        }
    }
}

impl fmt::Display for RunLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunLabel {
    type Err = DiscoveryError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "one" => Ok(RunLabel::One),
            "two" => Ok(RunLabel::Two),
            other => Err(DiscoveryError::InvalidState(format!("unknown run label '{}'", other))),
        }
    }
}

/// Category of a data source, used downstream to pick the comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    SmallVariants,
    StructuralVariants,
    CopyNumberVariants,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::SmallVariants => "small_variants",
            DataType::StructuralVariants => "structural_variants",
            DataType::CopyNumberVariants => "copy_number_variants",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = DiscoveryError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "small_variants" => Ok(DataType::SmallVariants),
            "structural_variants" => Ok(DataType::StructuralVariants),
            "copy_number_variants" => Ok(DataType::CopyNumberVariants),
            other => Err(DiscoveryError::InvalidState(format!("unknown data type '{}'", other))),
        }
    }
}

// ============================================================================
// Files and pairs
// ============================================================================

/// One discovered result file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFile {
    pub sample_name: String,
    pub run: RunLabel,
    /// Producer identifier, e.g. `umccrise`
    pub producer: String,
    pub data_source: String,
    pub data_type: DataType,
    /// Display form of the path (`s3://...` for object-store files)
    pub path: String,
}

/// Files for one (sample, data source) from both runs
///
/// At least one side is always present.
#[derive(Debug, Clone, Serialize)]
pub struct FilePair {
    pub sample_name: String,
    pub producer: String,
    pub data_source: String,
    pub data_type: DataType,
    pub file_one: Option<InputFile>,
    pub file_two: Option<InputFile>,
}

impl FilePair {
    /// Build a pair, checking that both sides describe the same thing.
    pub fn new(file_one: Option<InputFile>, file_two: Option<InputFile>) -> Result<Self> {
        let reference = match (&file_one, &file_two) {
            (Some(one), Some(two)) => {
                check_field(one, two, "sample_name", |f| f.sample_name.clone())?;
                check_field(one, two, "producer", |f| f.producer.clone())?;
                check_field(one, two, "data_source", |f| f.data_source.clone())?;
                check_field(one, two, "data_type", |f| f.data_type.to_string())?;
                one
            }
            (Some(one), None) => one,
            (None, Some(two)) => two,
            (None, None) => {
                return Err(DiscoveryError::InvalidState(
                    "file pair created without any files".to_string(),
                ))
            }
        };

        Ok(Self {
            sample_name: reference.sample_name.clone(),
            producer: reference.producer.clone(),
            data_source: reference.data_source.clone(),
            data_type: reference.data_type,
            file_one,
            file_two,
        })
    }

    /// Both runs have a file for this data source.
    pub fn is_matched(&self) -> bool {
        self.file_one.is_some() && self.file_two.is_some()
    }

    pub fn file(&self, run: RunLabel) -> Option<&InputFile> {
        match run {
            RunLabel::One => self.file_one.as_ref(),
            RunLabel::Two => self.file_two.as_ref(),
        }
    }

    /// Present files, run one first.
    pub fn files(&self) -> impl Iterator<Item = &InputFile> {
        self.file_one.iter().chain(self.file_two.iter())
    }
}

fn check_field(
    one: &InputFile,
    two: &InputFile,
    field: &'static str,
    get: impl Fn(&InputFile) -> String,
) -> Result<()> {
    let (value_one, value_two) = (get(one), get(two));
    if value_one != value_two {
        return Err(DiscoveryError::PairMismatch {
            sample_name: one.sample_name.clone(),
            data_source: one.data_source.clone(),
            field,
            one: value_one,
            two: value_two,
        });
    }
    Ok(())
}

/// All file pairs of one sample, keyed by data source
#[derive(Debug, Clone, Default, Serialize)]
pub struct SampleFileSet {
    pub pairs: BTreeMap<String, FilePair>,
}

impl SampleFileSet {
    pub fn get(&self, data_source: &str) -> Option<&FilePair> {
        self.pairs.get(data_source)
    }

    /// Any data source present in both runs.
    pub fn has_match(&self) -> bool {
        self.pairs.values().any(FilePair::is_matched)
    }

    /// Number of data sources with a file in the given run.
    pub fn present_in(&self, run: RunLabel) -> usize {
        self.pairs.values().filter(|pair| pair.file(run).is_some()).count()
    }
}

// ============================================================================
// Match result
// ============================================================================

/// Matching outcome for one producer
#[derive(Debug, Clone, Default, Serialize)]
pub struct MatchResult {
    pub producer: String,
    pub samples: BTreeMap<String, SampleFileSet>,
    pub matched: BTreeSet<String>,
    pub unmatched_one: BTreeSet<String>,
    pub unmatched_two: BTreeSet<String>,
}

impl MatchResult {
    /// Unmatched samples from both runs, sorted.
    pub fn unmatched(&self) -> BTreeSet<&str> {
        self.unmatched_one
            .iter()
            .chain(self.unmatched_two.iter())
            .map(String::as_str)
            .collect()
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Pairs with a file on both sides, in sample then data source order.
    pub fn matched_pairs(&self) -> impl Iterator<Item = &FilePair> {
        self.samples
            .values()
            .flat_map(|set| set.pairs.values())
            .filter(|pair| pair.is_matched())
    }

    /// Which partition a sample landed in.
    pub fn status_of(&self, sample_name: &str) -> Option<SampleStatus> {
        if self.matched.contains(sample_name) {
            Some(SampleStatus::Matched)
        } else if self.unmatched_one.contains(sample_name) {
            Some(SampleStatus::Unmatched(RunLabel::One))
        } else if self.unmatched_two.contains(sample_name) {
            Some(SampleStatus::Unmatched(RunLabel::Two))
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleStatus {
    Matched,
    /// Unmatched, assigned to the run holding more of its data sources
    Unmatched(RunLabel),
}
