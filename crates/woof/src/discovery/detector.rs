//! Directory classification by producer fingerprint

use super::error::{DiscoveryError, Result};
use super::producers::{ProducerDescriptor, ProducerRegistry};
use super::types::RunLabel;
use super::vfs::{DirectoryEntry, Entry};
use regex::Regex;
use std::collections::VecDeque;
use tracing::{debug, warn};

/// A directory claimed by a producer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedDirectory {
    pub producer: &'static str,
    pub directory: Entry,
    pub run: RunLabel,
}

/// Walks run roots and hands each directory to the first producer that claims it
pub struct DirectoryDetector<'a> {
    registry: &'a ProducerRegistry,
    excludes: Vec<Regex>,
}

impl<'a> DirectoryDetector<'a> {
    /// `extra_excludes` are added to every producer's own exclusion list.
    pub fn new(registry: &'a ProducerRegistry, extra_excludes: &[String]) -> Result<Self> {
        let mut excludes: Vec<Regex> = registry
            .iter()
            .flat_map(|producer| producer.exclude_paths.iter().cloned())
            .collect();
        for pattern in extra_excludes {
            let regex = Regex::new(pattern).map_err(|source| DiscoveryError::Pattern {
                pattern: pattern.clone(),
                source,
            })?;
            excludes.push(regex);
        }
        Ok(Self { registry, excludes })
    }

    fn is_excluded(&self, dir: &Entry) -> bool {
        let path = dir.display_path();
        self.excludes.iter().any(|re| re.is_match(&path))
    }

    /// Classify every directory reachable from `roots`.
    ///
    /// Claimed directories are not descended into. Output order follows the
    /// walk: roots in order, then breadth first.
    pub fn classify(&self, roots: &[Entry], run: RunLabel) -> Result<Vec<DetectedDirectory>> {
        let mut detected = Vec::new();
        let mut queue: VecDeque<Entry> = roots.iter().cloned().collect();

        while let Some(dir) = queue.pop_front() {
            if !dir.is_dir() {
                continue;
            }
            if self.is_excluded(&dir) {
                debug!(path = %dir, "Skipping excluded directory");
                continue;
            }

            match self.claim(&dir)? {
                Some(producer) => {
                    debug!(run = %run, producer = producer.id, path = %dir, "Detected producer directory");
                    detected.push(DetectedDirectory {
                        producer: producer.id,
                        directory: dir,
                        run,
                    });
                }
                None => queue.extend(dir.children()?),
            }
        }
        Ok(detected)
    }

    /// First registered producer meeting its threshold for `dir`.
    fn claim(&self, dir: &Entry) -> Result<Option<&'a ProducerDescriptor>> {
        let mut claimants = Vec::new();
        for producer in self.registry.iter() {
            if producer.claims(dir)? {
                claimants.push(producer);
            }
        }
        if claimants.len() > 1 {
            let ids: Vec<&str> = claimants.iter().map(|p| p.id).collect();
            warn!(
                path = %dir,
                producers = ?ids,
                selected = claimants[0].id,
                "Directory matches more than one producer fingerprint"
            );
        }
        Ok(claimants.into_iter().next())
    }
}
