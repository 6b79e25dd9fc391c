//! `woof config`: resolved paths and effective discovery settings

use super::error::discovery;
use std::path::PathBuf;
use woof::discovery::config::CONFIG_FILE_NAME;
use woof::discovery::DiscoveryConfig;

/// Arguments for the config command
#[derive(Debug, clap::Args)]
pub struct ConfigArgs {
    /// Config file to read instead of <WOOF_HOME>/config.toml
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Show resolved paths in JSON format
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: ConfigArgs) -> anyhow::Result<()> {
    let home = woof_logging::woof_home();
    let logs = woof_logging::logs_dir();
    let default_config = home.join(CONFIG_FILE_NAME);
    let (config, source) =
        DiscoveryConfig::resolve(args.config.as_deref(), &home).map_err(discovery)?;

    if args.json {
        let value = serde_json::json!({
            "home": home.to_string_lossy(),
            "logs": {
                "path": logs.to_string_lossy(),
                "exists": logs.exists(),
            },
            "config_file": {
                "path": source.as_ref().unwrap_or(&default_config).to_string_lossy(),
                "loaded": source.is_some(),
            },
            "discovery": config,
            "object_store": cfg!(feature = "s3"),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("WOOF CONFIGURATION");
    println!("==================");
    println!();
    println!("Home:     {}", home.display());
    println!(
        "Logs:     {} ({})",
        logs.display(),
        if logs.exists() { "exists" } else { "not found" }
    );
    match &source {
        Some(path) => println!("Config:   {} (loaded)", path.display()),
        None => println!("Config:   {} (not found, using defaults)", default_config.display()),
    }
    println!();
    println!("Discovery:");
    println!("  manifest_path:        {}", config.manifest_path);
    println!("  listing_concurrency:  {}", config.listing_concurrency);
    println!("  listing_timeout_secs: {}", config.listing_timeout_secs);
    if config.exclude_paths.is_empty() {
        println!("  exclude_paths:        (none)");
    } else {
        println!("  exclude_paths:");
        for pattern in &config.exclude_paths {
            println!("    {}", pattern);
        }
    }
    println!(
        "  object store:         {}",
        if cfg!(feature = "s3") { "enabled" } else { "disabled" }
    );
    Ok(())
}
