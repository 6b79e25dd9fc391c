//! A discovery run from root strings to match results

use super::config::DiscoveryConfig;
use super::detector::DirectoryDetector;
use super::error::{DiscoveryError, Result};
use super::inputs::discover_run;
use super::manifest::write_manifest;
use super::matching::match_inputs;
use super::object_store::{list_roots, ObjectLister, ObjectStoreUri};
use super::producers::ProducerRegistry;
use super::types::{MatchResult, RunLabel};
use super::vfs::{DirectoryEntry, Entry};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// A run root as given by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RootSpec {
    Local(PathBuf),
    ObjectStore(ObjectStoreUri),
}

impl RootSpec {
    pub fn parse(raw: &str) -> Self {
        match ObjectStoreUri::parse(raw) {
            Some(uri) => RootSpec::ObjectStore(uri),
            None => RootSpec::Local(PathBuf::from(raw)),
        }
    }
}

impl fmt::Display for RootSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RootSpec::Local(path) => write!(f, "{}", path.display()),
            RootSpec::ObjectStore(uri) => write!(f, "{}", uri),
        }
    }
}

/// Fail if any root appears more than once across both runs.
pub fn check_distinct_roots(one: &[String], two: &[String]) -> Result<()> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for raw in one.iter().chain(two) {
        *counts.entry(normalize_root(raw)).or_default() += 1;
    }
    let duplicated: Vec<String> = counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(root, _)| root)
        .collect();
    if duplicated.is_empty() {
        Ok(())
    } else {
        Err(DiscoveryError::DuplicateRoots(duplicated))
    }
}

/// Comparable form of a root: object-store roots by parsed URI, local roots
/// canonicalized when they exist and otherwise by path components.
fn normalize_root(raw: &str) -> String {
    match RootSpec::parse(raw) {
        RootSpec::ObjectStore(uri) => uri.to_string(),
        RootSpec::Local(path) => std::fs::canonicalize(&path)
            .unwrap_or_else(|_| path.components().collect())
            .display()
            .to_string(),
    }
}

/// Fail unless at least one producer has a matched sample.
pub fn ensure_any_matched(results: &BTreeMap<String, MatchResult>) -> Result<()> {
    if results.values().any(|result| !result.matched.is_empty()) {
        Ok(())
    } else {
        Err(DiscoveryError::NoSamplesMatched)
    }
}

/// State for one invocation of the discovery engine
///
/// Holds the registry and configuration, the object lister when object-store
/// roots are in play, and whether the listing notice has been shown.
pub struct DiscoverySession<'a> {
    registry: &'a ProducerRegistry,
    config: DiscoveryConfig,
    lister: Option<Arc<dyn ObjectLister>>,
    listing_notice_logged: bool,
}

impl<'a> DiscoverySession<'a> {
    pub fn new(registry: &'a ProducerRegistry, config: DiscoveryConfig) -> Self {
        Self {
            registry,
            config,
            lister: None,
            listing_notice_logged: false,
        }
    }

    pub fn with_lister(mut self, lister: Arc<dyn ObjectLister>) -> Self {
        self.lister = Some(lister);
        self
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    pub fn registry(&self) -> &'a ProducerRegistry {
        self.registry
    }

    pub fn listing_notice_logged(&self) -> bool {
        self.listing_notice_logged
    }

    /// Classify both runs and match their files.
    ///
    /// Every object-store root of both runs is listed before classification
    /// starts.
    pub async fn discover(
        &mut self,
        run_one: &[String],
        run_two: &[String],
    ) -> Result<BTreeMap<String, MatchResult>> {
        check_distinct_roots(run_one, run_two)?;

        let specs_one: Vec<RootSpec> = run_one.iter().map(|r| RootSpec::parse(r)).collect();
        let specs_two: Vec<RootSpec> = run_two.iter().map(|r| RootSpec::parse(r)).collect();
        for (label, specs) in [(RunLabel::One, &specs_one), (RunLabel::Two, &specs_two)] {
            for spec in specs {
                info!(run = %label, root = %spec, "Searching input directory");
            }
        }

        let listed = self.list_object_roots(specs_one.iter().chain(&specs_two)).await?;
        let roots_one = materialize(&specs_one, &listed)?;
        let roots_two = materialize(&specs_two, &listed)?;

        let detector = DirectoryDetector::new(self.registry, &self.config.exclude_paths)?;
        let inputs_one = discover_run(self.registry, &detector, &roots_one, RunLabel::One)?;
        let inputs_two = discover_run(self.registry, &detector, &roots_two, RunLabel::Two)?;
        match_inputs(&inputs_one, &inputs_two)
    }

    /// Check for matches, then write the manifest under `output_dir`.
    pub fn write_manifest(
        &self,
        results: &BTreeMap<String, MatchResult>,
        output_dir: &Path,
    ) -> Result<PathBuf> {
        ensure_any_matched(results)?;
        let path = self.config.manifest_path_in(output_dir);
        let written = write_manifest(results, &path)?;
        info!(path = %written.display(), "Wrote input manifest");
        Ok(written)
    }

    async fn list_object_roots<'s>(
        &mut self,
        specs: impl Iterator<Item = &'s RootSpec>,
    ) -> Result<HashMap<ObjectStoreUri, Entry>> {
        let uris: Vec<ObjectStoreUri> = specs
            .filter_map(|spec| match spec {
                RootSpec::ObjectStore(uri) => Some(uri.clone()),
                RootSpec::Local(_) => None,
            })
            .collect();
        if uris.is_empty() {
            return Ok(HashMap::new());
        }

        let lister = self.lister.clone().ok_or_else(|| {
            DiscoveryError::Config(format!(
                "object store root {} given but object store access is not available",
                uris[0]
            ))
        })?;

        if !self.listing_notice_logged {
            info!(roots = uris.len(), "Retrieving object store listings, this can take a while");
            self.listing_notice_logged = true;
        }

        let entries = list_roots(
            lister,
            &uris,
            self.config.listing_concurrency,
            self.config.listing_timeout(),
        )
        .await?;
        Ok(uris.into_iter().zip(entries).collect())
    }
}

fn materialize(specs: &[RootSpec], listed: &HashMap<ObjectStoreUri, Entry>) -> Result<Vec<Entry>> {
    specs
        .iter()
        .map(|spec| match spec {
            RootSpec::Local(path) => {
                if !path.exists() {
                    return Err(DiscoveryError::RootNotFound(path.display().to_string()));
                }
                let entry = Entry::local(path);
                if !entry.is_dir() {
                    return Err(DiscoveryError::RootNotDirectory(path.display().to_string()));
                }
                Ok(entry)
            }
            RootSpec::ObjectStore(uri) => listed
                .get(uri)
                .cloned()
                .ok_or_else(|| DiscoveryError::InvalidState(format!("{uri} was not listed"))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::object_store::InMemoryLister;
    use std::fs;
    use tempfile::TempDir;

    fn roots(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_root_spec_parse() {
        assert!(matches!(RootSpec::parse("s3://bucket/prefix"), RootSpec::ObjectStore(_)));
        assert_eq!(
            RootSpec::parse("/data/run"),
            RootSpec::Local(PathBuf::from("/data/run"))
        );
    }

    #[test]
    fn test_duplicate_roots_listed() {
        let err = check_distinct_roots(
            &roots(&["/data/a", "/data/b/"]),
            &roots(&["/data/b", "/data/c", "/data/a"]),
        )
        .unwrap_err();
        match err {
            DiscoveryError::DuplicateRoots(dups) => assert_eq!(dups, vec!["/data/a", "/data/b"]),
            other => panic!("unexpected error: {other}"),
        }
        assert!(check_distinct_roots(&roots(&["/data/a"]), &roots(&["/data/b"])).is_ok());
    }

    #[test]
    fn test_duplicate_roots_by_path_components() {
        let temp = TempDir::new().unwrap();
        let run = temp.path().join("run");
        fs::create_dir(&run).unwrap();
        let base = run.display().to_string();

        let doubled = format!("{}//run", temp.path().display());
        for alias in [format!("{base}/."), doubled, format!("{base}/")] {
            let err = check_distinct_roots(&[base.clone()], &[alias.clone()]).unwrap_err();
            assert!(matches!(err, DiscoveryError::DuplicateRoots(ref dups) if dups.len() == 1), "{alias}");
        }

        // Roots that do not exist are still compared by components
        assert!(check_distinct_roots(&roots(&["/no/such/run"]), &roots(&["/no//such/run/."])).is_err());
        assert!(check_distinct_roots(&roots(&["s3://bucket/one"]), &roots(&["s3://bucket//one/"])).is_err());
        assert!(check_distinct_roots(&roots(&["s3://bucket/one"]), &roots(&["s3://bucket/one_old"])).is_ok());
    }

    #[tokio::test]
    async fn test_run_against_itself_is_rejected() {
        let temp = TempDir::new().unwrap();
        let sample = temp.path().join("run").join("SBJ01");
        for sub in ["small_variants", "structural", "purple"] {
            fs::create_dir_all(sample.join(sub)).unwrap();
        }
        fs::write(sample.join("small_variants/SBJ01-germline.predispose_genes.vcf.gz"), "").unwrap();

        let registry = ProducerRegistry::builtin().unwrap();
        let mut session = DiscoverySession::new(&registry, DiscoveryConfig::default());
        let run = temp.path().join("run").display().to_string();
        let err = session
            .discover(&[run.clone()], &[format!("{run}/.")])
            .await
            .unwrap_err();
        assert!(matches!(err, DiscoveryError::DuplicateRoots(_)));
    }

    #[tokio::test]
    async fn test_missing_local_root() {
        let temp = TempDir::new().unwrap();
        let registry = ProducerRegistry::builtin().unwrap();
        let mut session = DiscoverySession::new(&registry, DiscoveryConfig::default());

        let missing = temp.path().join("missing").display().to_string();
        let err = session
            .discover(&[temp.path().display().to_string()], &[missing.clone()])
            .await
            .unwrap_err();
        match err {
            DiscoveryError::RootNotFound(path) => assert_eq!(path, missing),
            other => panic!("unexpected error: {other}"),
        }

        let file = temp.path().join("file.txt");
        fs::write(&file, "").unwrap();
        let err = session
            .discover(&[temp.path().display().to_string()], &[file.display().to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, DiscoveryError::RootNotDirectory(_)));
    }

    #[tokio::test]
    async fn test_object_store_root_without_lister() {
        let temp = TempDir::new().unwrap();
        let registry = ProducerRegistry::builtin().unwrap();
        let mut session = DiscoverySession::new(&registry, DiscoveryConfig::default());
        let err = session
            .discover(&roots(&["s3://bucket/one"]), &[temp.path().display().to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, DiscoveryError::Config(_)));
        assert!(!session.listing_notice_logged());
    }

    #[tokio::test]
    async fn test_listing_notice_is_one_shot() {
        let lister = InMemoryLister::new().with_objects(
            "bucket",
            [
                "one/SBJ01/small_variants/SBJ01-germline.predispose_genes.vcf.gz",
                "one/SBJ01/structural/x.txt",
                "one/SBJ01/purple/x.txt",
                "two/SBJ01/small_variants/SBJ01-germline.predispose_genes.vcf.gz",
                "two/SBJ01/structural/x.txt",
                "two/SBJ01/purple/x.txt",
            ],
        );
        let registry = ProducerRegistry::builtin().unwrap();
        let mut session = DiscoverySession::new(&registry, DiscoveryConfig::default())
            .with_lister(Arc::new(lister));

        assert!(!session.listing_notice_logged());
        let one = roots(&["s3://bucket/one"]);
        let two = roots(&["s3://bucket/two"]);
        let first = session.discover(&one, &two).await.unwrap();
        assert!(session.listing_notice_logged());
        let second = session.discover(&one, &two).await.unwrap();
        assert!(session.listing_notice_logged());

        assert!(first["umccrise"].matched.contains("SBJ01"));
        assert_eq!(first["umccrise"].matched, second["umccrise"].matched);
    }

    #[test]
    fn test_no_matches_is_fatal() {
        let mut results = BTreeMap::new();
        results.insert("umccrise".to_string(), MatchResult::default());
        assert!(matches!(
            ensure_any_matched(&results),
            Err(DiscoveryError::NoSamplesMatched)
        ));
        assert!(matches!(
            ensure_any_matched(&BTreeMap::new()),
            Err(DiscoveryError::NoSamplesMatched)
        ));
    }
}
