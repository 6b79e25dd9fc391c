//! bcbio-nextgen: annotated small-variant calls per caller, one directory per
//! sample named with a leading timestamp

use super::{DataSource, ProducerDescriptor, SampleNamer};
use crate::discovery::error::{DiscoveryError, Result};
use crate::discovery::patterns::AmbiguityPolicy;
use crate::discovery::types::DataType;
use crate::discovery::vfs::{DirectoryEntry, Entry};
use regex::Regex;

pub const ID: &str = "bcbio";

const THRESHOLD: u32 = 30;

const FINGERPRINT: &[(&str, u32)] = &[
    ("bcbio-nextgen-commands.log$", 10),
    ("bcbio-nextgen.log$", 10),
    ("project-summary.yaml$", 10),
    ("data_versions.csv$", 3),
    ("metadata.csv$", 3),
    ("multiqc$", 3),
    ("programs.txt$", 3),
];

const SAMPLE_NAME_RE: &str = r"(?x)
    # Leading timestamp
    ^[\d_-]+T\d{4}
    # Parts sometimes present
    (?:_Cromwell_WGS)?
    (?:_All_WGS)?
    (?:_\d{4}_\d{3}_\d{2})?
    # Sample name
    _(.+?)
    # Trailing token
    (?:-merged)?$
";

pub fn descriptor() -> Result<ProducerDescriptor> {
    let mut producer = ProducerDescriptor::new(ID, "bcbio-nextgen", THRESHOLD, sample_namer()?)
        .data_source(
            DataSource::new(
                "tumour-ensemble",
                "Ensemble (tumour)",
                DataType::SmallVariants,
                "-ensemble-annotated.vcf.gz$",
            )?
            .with_exclude("germline-ensemble-annotated.vcf.gz$")?
            // Multi-tumour runs are compared on their first tumour only
            .with_ambiguity(AmbiguityPolicy::FirstByPath),
        )
        .data_source(DataSource::new(
            "normal-ensemble",
            "Ensemble (normal)",
            DataType::SmallVariants,
            ".+-germline-ensemble-annotated.vcf.gz$",
        )?)
        .data_source(DataSource::new(
            "normal-gatk",
            "GATK (normal)",
            DataType::SmallVariants,
            ".+-germline-gatk-haplotype-annotated.vcf.gz$",
        )?)
        .data_source(DataSource::new(
            "normal-strelka2",
            "Strelka2 (normal)",
            DataType::SmallVariants,
            ".+-germline-strelka2-annotated.vcf.gz$",
        )?)
        .data_source(DataSource::new(
            "normal-vardict",
            "VarDict (normal)",
            DataType::SmallVariants,
            ".+-germline-vardict-annotated.vcf.gz$",
        )?);

    for (pattern, weight) in FINGERPRINT {
        producer = producer.fingerprint(pattern, *weight)?;
    }
    Ok(producer)
}

fn sample_namer() -> Result<SampleNamer> {
    let re = Regex::new(SAMPLE_NAME_RE).map_err(|source| DiscoveryError::Pattern {
        pattern: SAMPLE_NAME_RE.to_string(),
        source,
    })?;
    Ok(Box::new(move |dir: &Entry| {
        let name = dir.name();
        re.captures(&name)
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| DiscoveryError::SampleName {
                producer: ID.to_string(),
                directory: dir.display_path(),
            })
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_name(dir: &str) -> Result<String> {
        descriptor().unwrap().sample_name(&Entry::local(dir))
    }

    #[test]
    fn test_sample_name_extraction() {
        assert_eq!(
            sample_name("/runs/2021-03-04T0102_Cromwell_WGS_SBJ00001-merged").unwrap(),
            "SBJ00001"
        );
        assert_eq!(
            sample_name("/runs/2021-03-04T0102_All_WGS_2021_123_45_PTC_Tumour-merged").unwrap(),
            "PTC_Tumour"
        );
        assert_eq!(sample_name("/runs/2020_01_02T1200_SBJ00002").unwrap(), "SBJ00002");
    }

    #[test]
    fn test_sample_name_without_timestamp_is_fatal() {
        match sample_name("/runs/final") {
            Err(DiscoveryError::SampleName { producer, directory }) => {
                assert_eq!(producer, "bcbio");
                assert_eq!(directory, "/runs/final");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_descriptor_shape() {
        let producer = descriptor().unwrap();
        assert_eq!(producer.fingerprint.len(), 7);
        assert!(producer.exclude_paths.is_empty());
        let display: Vec<&str> = producer.data_sources.iter().map(|s| s.display_name).collect();
        assert_eq!(
            display,
            vec![
                "Ensemble (tumour)",
                "Ensemble (normal)",
                "GATK (normal)",
                "Strelka2 (normal)",
                "VarDict (normal)"
            ]
        );
    }
}
