//! Pairing input files across the two runs

use super::error::{DiscoveryError, Result};
use super::inputs::RunInputs;
use super::types::{FilePair, InputFile, MatchResult, RunLabel, SampleFileSet};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Match every producer seen in either run, keyed by producer id.
pub fn match_inputs(one: &RunInputs, two: &RunInputs) -> Result<BTreeMap<String, MatchResult>> {
    let producers: BTreeSet<&String> = one.keys().chain(two.keys()).collect();
    let mut results = BTreeMap::new();
    for producer in producers {
        let inputs_one = one.get(producer).map(Vec::as_slice).unwrap_or_default();
        let inputs_two = two.get(producer).map(Vec::as_slice).unwrap_or_default();
        let result = perform_matching(producer, inputs_one, inputs_two)?;
        debug!(
            producer = producer.as_str(),
            matched = result.matched.len(),
            unmatched = result.unmatched_one.len() + result.unmatched_two.len(),
            "Matched samples"
        );
        results.insert(producer.clone(), result);
    }
    Ok(results)
}

/// Pair the files of one producer and partition its samples.
///
/// Files are grouped by (sample, data source). A group with more than one
/// file from the same run is fatal.
pub fn perform_matching(producer: &str, one: &[InputFile], two: &[InputFile]) -> Result<MatchResult> {
    let mut groups: BTreeMap<(&str, &str), Vec<&InputFile>> = BTreeMap::new();
    for file in one.iter().chain(two) {
        groups
            .entry((file.sample_name.as_str(), file.data_source.as_str()))
            .or_default()
            .push(file);
    }

    let mut samples: BTreeMap<String, SampleFileSet> = BTreeMap::new();
    for ((sample_name, data_source), group) in groups {
        let file_one = single_file(&group, RunLabel::One, sample_name, data_source)?;
        let file_two = single_file(&group, RunLabel::Two, sample_name, data_source)?;
        let pair = FilePair::new(file_one, file_two)?;
        samples
            .entry(sample_name.to_string())
            .or_default()
            .pairs
            .insert(data_source.to_string(), pair);
    }

    let mut result = MatchResult {
        producer: producer.to_string(),
        ..Default::default()
    };
    for (sample_name, files) in &samples {
        let partition = if files.has_match() {
            &mut result.matched
        } else if files.present_in(RunLabel::One) >= files.present_in(RunLabel::Two) {
            &mut result.unmatched_one
        } else {
            &mut result.unmatched_two
        };
        partition.insert(sample_name.clone());
    }
    result.samples = samples;
    Ok(result)
}

fn single_file(
    group: &[&InputFile],
    run: RunLabel,
    sample_name: &str,
    data_source: &str,
) -> Result<Option<InputFile>> {
    let mut files = group.iter().filter(|f| f.run == run);
    let first = files.next();
    let rest: Vec<&&InputFile> = files.collect();
    if !rest.is_empty() {
        let paths = first
            .into_iter()
            .chain(rest)
            .map(|f| f.path.clone())
            .collect();
        return Err(DiscoveryError::DuplicateInput {
            sample_name: sample_name.to_string(),
            data_source: data_source.to_string(),
            run: run.to_string(),
            paths,
        });
    }
    Ok(first.map(|f| (*f).clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::types::{DataType, SampleStatus};

    fn input(sample: &str, run: RunLabel, source: &str) -> InputFile {
        InputFile {
            sample_name: sample.to_string(),
            run,
            producer: "umccrise".to_string(),
            data_source: source.to_string(),
            data_type: DataType::SmallVariants,
            path: format!("/{run}/{sample}/{source}.vcf.gz"),
        }
    }

    #[test]
    fn test_pairing_completeness() {
        let one = vec![
            input("S1", RunLabel::One, "cpsr"),
            input("S1", RunLabel::One, "pcgr"),
            input("S2", RunLabel::One, "cpsr"),
        ];
        let two = vec![input("S1", RunLabel::Two, "cpsr"), input("S3", RunLabel::Two, "manta")];

        let result = perform_matching("umccrise", &one, &two).unwrap();
        let s1 = &result.samples["S1"];
        assert!(s1.get("cpsr").unwrap().is_matched());
        assert!(s1.get("pcgr").unwrap().file_two.is_none());
        assert!(result.samples["S3"].get("manta").unwrap().file_one.is_none());

        let file_count: usize = result
            .samples
            .values()
            .flat_map(|set| set.pairs.values())
            .map(|pair| pair.files().count())
            .sum();
        assert_eq!(file_count, one.len() + two.len());
    }

    #[test]
    fn test_partition_is_exhaustive() {
        let one = vec![input("S1", RunLabel::One, "cpsr"), input("S2", RunLabel::One, "cpsr")];
        let two = vec![input("S1", RunLabel::Two, "cpsr"), input("S3", RunLabel::Two, "cpsr")];
        let result = perform_matching("umccrise", &one, &two).unwrap();

        assert_eq!(result.status_of("S1"), Some(SampleStatus::Matched));
        assert_eq!(result.status_of("S2"), Some(SampleStatus::Unmatched(RunLabel::One)));
        assert_eq!(result.status_of("S3"), Some(SampleStatus::Unmatched(RunLabel::Two)));

        let mut all: Vec<&String> = result
            .matched
            .iter()
            .chain(&result.unmatched_one)
            .chain(&result.unmatched_two)
            .collect();
        all.sort();
        assert_eq!(all, vec!["S1", "S2", "S3"]);
    }

    #[test]
    fn test_majority_tie_break() {
        // 2 vs 2: tie goes to run one
        let one = vec![input("S1", RunLabel::One, "cpsr"), input("S1", RunLabel::One, "pcgr")];
        let two = vec![input("S1", RunLabel::Two, "manta"), input("S1", RunLabel::Two, "purple")];
        let result = perform_matching("umccrise", &one, &two).unwrap();
        assert!(result.unmatched_one.contains("S1"));

        // 1 vs 3: majority wins
        let one = vec![input("S1", RunLabel::One, "cpsr")];
        let two = vec![
            input("S1", RunLabel::Two, "pcgr"),
            input("S1", RunLabel::Two, "manta"),
            input("S1", RunLabel::Two, "purple"),
        ];
        let result = perform_matching("umccrise", &one, &two).unwrap();
        assert!(result.unmatched_two.contains("S1"));
    }

    #[test]
    fn test_duplicate_input_is_fatal() {
        let mut dup = input("S1", RunLabel::One, "cpsr");
        dup.path = "/one/S1/other.vcf.gz".to_string();
        let one = vec![input("S1", RunLabel::One, "cpsr"), dup];

        let err = perform_matching("umccrise", &one, &[]).unwrap_err();
        match err {
            DiscoveryError::DuplicateInput { sample_name, run, paths, .. } => {
                assert_eq!(sample_name, "S1");
                assert_eq!(run, "one");
                assert_eq!(paths.len(), 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_match_inputs_per_producer() {
        let mut one = RunInputs::new();
        one.insert("umccrise".to_string(), vec![input("S1", RunLabel::One, "cpsr")]);
        let mut bcbio_file = input("S9", RunLabel::Two, "normal-gatk");
        bcbio_file.producer = "bcbio".to_string();
        let mut two = RunInputs::new();
        two.insert("umccrise".to_string(), vec![input("S1", RunLabel::Two, "cpsr")]);
        two.insert("bcbio".to_string(), vec![bcbio_file]);

        let results = match_inputs(&one, &two).unwrap();
        let ids: Vec<&str> = results.keys().map(String::as_str).collect();
        assert_eq!(ids, vec!["bcbio", "umccrise"]);
        assert!(results["umccrise"].matched.contains("S1"));
        assert!(results["bcbio"].unmatched_two.contains("S9"));
    }
}
