//! Turning claimed directories into input files

use super::detector::{DetectedDirectory, DirectoryDetector};
use super::error::{DiscoveryError, Result};
use super::patterns::resolve;
use super::producers::{ProducerDescriptor, ProducerRegistry};
use super::types::{InputFile, RunLabel};
use super::vfs::{DirectoryEntry, Entry};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Input files of one run, grouped by producer id
pub type RunInputs = BTreeMap<String, Vec<InputFile>>;

/// Resolve every data source of `producer` inside `dir`.
///
/// Absent data sources are skipped. The sample name is only extracted once a
/// file has been found.
pub fn process_directory(
    producer: &ProducerDescriptor,
    dir: &Entry,
    run: RunLabel,
) -> Result<Vec<InputFile>> {
    let mut inputs = Vec::new();
    let mut sample_name: Option<String> = None;

    for source in &producer.data_sources {
        let Some(found) = resolve(&source.pattern, dir, source.ambiguity)? else {
            debug!(run = %run, producer = producer.id, data_source = source.name, path = %dir, "Data source absent");
            continue;
        };
        let sample = match &sample_name {
            Some(name) => name.clone(),
            None => {
                let name = producer.sample_name(dir)?;
                sample_name = Some(name.clone());
                name
            }
        };
        inputs.push(InputFile {
            sample_name: sample,
            run,
            producer: producer.id.to_string(),
            data_source: source.name.to_string(),
            data_type: source.data_type,
            path: found.display_path(),
        });
    }
    Ok(inputs)
}

/// Classify `roots` and collect the input files of every claimed directory.
pub fn discover_run(
    registry: &ProducerRegistry,
    detector: &DirectoryDetector<'_>,
    roots: &[Entry],
    run: RunLabel,
) -> Result<RunInputs> {
    let detected = detector.classify(roots, run)?;
    info!(run = %run, directories = detected.len(), "Classified input directories");

    let mut collected = RunInputs::new();
    for DetectedDirectory { producer, directory, run } in detected {
        let descriptor = registry.get(producer).ok_or_else(|| {
            DiscoveryError::InvalidState(format!("directory claimed by unknown producer '{}'", producer))
        })?;
        let inputs = process_directory(descriptor, &directory, run)?;
        collected.entry(producer.to_string()).or_default().extend(inputs);
    }
    Ok(collected)
}
