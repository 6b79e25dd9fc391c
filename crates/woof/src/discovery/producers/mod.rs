//! Producer descriptors and the registry of known producers
//!
//! A producer is the upstream pipeline that wrote a result directory. Each
//! descriptor says how to recognise such a directory (weighted fingerprint
//! probes), where its result files live (data sources), and how to name the
//! sample it holds.

pub mod bcbio;
pub mod umccrise;

use super::error::{DiscoveryError, Result};
use super::patterns::{AmbiguityPolicy, PathPattern};
use super::types::DataType;
use super::vfs::{DirectoryEntry, Entry};
use regex::Regex;
use std::collections::HashSet;
use std::fmt;

/// Extracts the sample name from a claimed directory
pub type SampleNamer = Box<dyn Fn(&Entry) -> Result<String> + Send + Sync>;

/// One kind of result file within a producer's output
#[derive(Debug, Clone)]
pub struct DataSource {
    pub name: &'static str,
    /// Column heading used in reports
    pub display_name: &'static str,
    pub data_type: DataType,
    pub pattern: PathPattern,
    pub ambiguity: AmbiguityPolicy,
}

impl DataSource {
    pub fn new(
        name: &'static str,
        display_name: &'static str,
        data_type: DataType,
        pattern: &str,
    ) -> Result<Self> {
        Ok(Self {
            name,
            display_name,
            data_type,
            pattern: PathPattern::new(pattern)?,
            ambiguity: AmbiguityPolicy::Strict,
        })
    }

    pub fn with_exclude(mut self, exclude: &str) -> Result<Self> {
        self.pattern = self.pattern.with_exclude(exclude)?;
        Ok(self)
    }

    pub fn with_ambiguity(mut self, ambiguity: AmbiguityPolicy) -> Self {
        self.ambiguity = ambiguity;
        self
    }
}

/// Static definition of one producer
pub struct ProducerDescriptor {
    pub id: &'static str,
    /// Heading used in reports
    pub title: &'static str,
    pub fingerprint: Vec<(PathPattern, u32)>,
    pub threshold: u32,
    /// Data sources in report column order
    pub data_sources: Vec<DataSource>,
    /// Paths below a producer directory that must never be classified
    pub exclude_paths: Vec<Regex>,
    sample_name: SampleNamer,
}

impl ProducerDescriptor {
    pub fn new(id: &'static str, title: &'static str, threshold: u32, sample_name: SampleNamer) -> Self {
        Self {
            id,
            title,
            fingerprint: Vec::new(),
            threshold,
            data_sources: Vec::new(),
            exclude_paths: Vec::new(),
            sample_name,
        }
    }

    pub fn fingerprint(mut self, pattern: &str, weight: u32) -> Result<Self> {
        self.fingerprint.push((PathPattern::new(pattern)?, weight));
        Ok(self)
    }

    pub fn data_source(mut self, source: DataSource) -> Self {
        self.data_sources.push(source);
        self
    }

    pub fn exclude(mut self, pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|source| DiscoveryError::Pattern {
            pattern: pattern.to_string(),
            source,
        })?;
        self.exclude_paths.push(regex);
        Ok(self)
    }

    /// Sum of the weights of every fingerprint probe with a match in `dir`.
    pub fn fingerprint_score(&self, dir: &Entry) -> Result<u32> {
        let mut score = 0;
        for (pattern, weight) in &self.fingerprint {
            if pattern.probe(dir)? {
                score += weight;
            }
        }
        Ok(score)
    }

    /// Whether `dir` scores at or above the threshold.
    pub fn claims(&self, dir: &Entry) -> Result<bool> {
        Ok(self.fingerprint_score(dir)? >= self.threshold)
    }

    pub fn sample_name(&self, dir: &Entry) -> Result<String> {
        (self.sample_name)(dir)
    }

    pub fn get_data_source(&self, name: &str) -> Option<&DataSource> {
        self.data_sources.iter().find(|source| source.name == name)
    }
}

impl fmt::Debug for ProducerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProducerDescriptor")
            .field("id", &self.id)
            .field("threshold", &self.threshold)
            .field("fingerprint", &self.fingerprint.len())
            .field("data_sources", &self.data_sources.len())
            .finish()
    }
}

/// Ordered set of producers
///
/// Order matters: when several producers claim a directory the first one
/// registered wins.
#[derive(Debug, Default)]
pub struct ProducerRegistry {
    producers: Vec<ProducerDescriptor>,
}

impl ProducerRegistry {
    pub fn new(producers: Vec<ProducerDescriptor>) -> Result<Self> {
        let mut seen = HashSet::new();
        for producer in &producers {
            if !seen.insert(producer.id) {
                return Err(DiscoveryError::Config(format!(
                    "producer '{}' registered twice",
                    producer.id
                )));
            }
        }
        Ok(Self { producers })
    }

    /// The producers this tool knows about.
    pub fn builtin() -> Result<Self> {
        Self::new(vec![umccrise::descriptor()?, bcbio::descriptor()?])
    }

    pub fn get(&self, id: &str) -> Option<&ProducerDescriptor> {
        self.producers.iter().find(|producer| producer.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProducerDescriptor> {
        self.producers.iter()
    }

    pub fn len(&self) -> usize {
        self.producers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.producers.is_empty()
    }
}

/// Sample named after the directory itself.
pub fn directory_name() -> SampleNamer {
    Box::new(|dir: &Entry| Ok(dir.name()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_builtin_registry_order() {
        let registry = ProducerRegistry::builtin().unwrap();
        let ids: Vec<&str> = registry.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["umccrise", "bcbio"]);
        assert_eq!(registry.get("bcbio").unwrap().title, "bcbio-nextgen");
        assert!(registry.get("dragen").is_none());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let err = ProducerRegistry::new(vec![
            ProducerDescriptor::new("x", "X", 1, directory_name()),
            ProducerDescriptor::new("x", "X again", 1, directory_name()),
        ])
        .unwrap_err();
        assert!(matches!(err, DiscoveryError::Config(_)));
    }

    #[test]
    fn test_fingerprint_score_is_monotonic() {
        let temp = TempDir::new().unwrap();
        let dir = Entry::local(temp.path());
        let umccrise = umccrise::descriptor().unwrap();

        let mut previous = umccrise.fingerprint_score(&dir).unwrap();
        assert_eq!(previous, 0);
        for name in ["small_variants", "structural", "coverage", "purple"] {
            fs::create_dir(temp.path().join(name)).unwrap();
            let dir = Entry::local(temp.path());
            let score = umccrise.fingerprint_score(&dir).unwrap();
            assert!(score > previous, "{name} did not raise the score");
            previous = score;
        }
        assert_eq!(previous, 35);
        assert!(umccrise.claims(&Entry::local(temp.path())).unwrap());
    }

    #[test]
    fn test_fingerprint_probe_spans_levels() {
        let temp = TempDir::new().unwrap();
        let umccrise = umccrise::descriptor().unwrap();

        // Leaf name alone, or the directory alone, is not enough
        fs::write(temp.path().join("data_versions.txt"), "").unwrap();
        fs::create_dir(temp.path().join("log")).unwrap();
        fs::write(temp.path().join("log").join("other.txt"), "").unwrap();
        assert_eq!(umccrise.fingerprint_score(&Entry::local(temp.path())).unwrap(), 0);

        fs::write(temp.path().join("log").join("data_versions.txt"), "").unwrap();
        assert_eq!(umccrise.fingerprint_score(&Entry::local(temp.path())).unwrap(), 5);
    }

    #[test]
    fn test_data_source_lookup() {
        let bcbio = bcbio::descriptor().unwrap();
        let tumour = bcbio.get_data_source("tumour-ensemble").unwrap();
        assert_eq!(tumour.ambiguity, AmbiguityPolicy::FirstByPath);
        assert_eq!(tumour.display_name, "Ensemble (tumour)");
        let strict = bcbio
            .data_sources
            .iter()
            .filter(|s| s.ambiguity == AmbiguityPolicy::Strict)
            .count();
        assert_eq!(strict, 4);
    }
}
