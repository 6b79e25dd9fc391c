//! `woof discover`: classify, pair and write the manifest

use super::error::discovery;
use super::output;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use woof::discovery::{
    build_report, summarize, DiscoveryConfig, DiscoverySession, ObjectLister, ObjectStoreUri,
    ProducerRegistry,
};

/// Arguments for the discover command
#[derive(Debug, clap::Args)]
pub struct DiscoverArgs {
    /// Result directories of the first run (local paths or s3://bucket/prefix)
    #[arg(long = "run-dir-one", required = true, num_args = 1..)]
    pub run_dir_one: Vec<String>,

    /// Result directories of the second run
    #[arg(long = "run-dir-two", required = true, num_args = 1..)]
    pub run_dir_two: Vec<String>,

    /// Directory receiving the manifest
    #[arg(long)]
    pub output_dir: PathBuf,

    /// Discovery config file (default: <WOOF_HOME>/config.toml when present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: DiscoverArgs) -> anyhow::Result<()> {
    let registry = ProducerRegistry::builtin().map_err(discovery)?;
    let (config, config_source) =
        DiscoveryConfig::resolve(args.config.as_deref(), &woof_logging::woof_home()).map_err(discovery)?;
    if let Some(path) = &config_source {
        info!(path = %path.display(), "Loaded discovery config");
    }

    let wants_object_store = args
        .run_dir_one
        .iter()
        .chain(&args.run_dir_two)
        .any(|root| ObjectStoreUri::parse(root).is_some());

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let mut session = DiscoverySession::new(&registry, config);
    if wants_object_store {
        if let Some(lister) = rt.block_on(object_lister()) {
            session = session.with_lister(lister);
        }
    }

    let results = rt
        .block_on(session.discover(&args.run_dir_one, &args.run_dir_two))
        .map_err(discovery)?;

    if !args.json {
        output::print_report(&build_report(&registry, &results));
    }

    let manifest = session
        .write_manifest(&results, &args.output_dir)
        .map_err(discovery)?;

    if args.json {
        let document = serde_json::json!({
            "producers": summarize(&results),
            "manifest": manifest.to_string_lossy(),
        });
        println!("{}", serde_json::to_string_pretty(&document)?);
    } else {
        println!("Manifest written to {}", manifest.display());
    }
    Ok(())
}

#[cfg(feature = "s3")]
async fn object_lister() -> Option<Arc<dyn ObjectLister>> {
    Some(Arc::new(woof::discovery::S3Lister::from_env().await))
}

#[cfg(not(feature = "s3"))]
async fn object_lister() -> Option<Arc<dyn ObjectLister>> {
    None
}
