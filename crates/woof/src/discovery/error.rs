//! Error types for input discovery

use std::io;
use thiserror::Error;

/// Discovery error type
///
/// Every variant is fatal for the discovery step: a partial or ambiguous
/// manifest is never written.
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Config error: {0}")]
    Config(String),

    #[error("Same input directory provided as run one and run two: {}", .0.join(", "))]
    DuplicateRoots(Vec<String>),

    #[error("Input path not found: {0}")]
    RootNotFound(String),

    #[error("Input path is not a directory: {0}")]
    RootNotDirectory(String),

    #[error("Object listing failed for {uri}: {message}")]
    Listing { uri: String, message: String },

    #[error("Object listing for {uri} timed out after {secs}s")]
    ListingTimeout { uri: String, secs: u64 },

    #[error("Object listing for {uri} produced {count} top-level entries, expected exactly one")]
    VirtualRoot { uri: String, count: usize },

    #[error("Ambiguous match with '{pattern}' in {directory}: {}", .matches.join(", "))]
    AmbiguousMatch {
        pattern: String,
        directory: String,
        matches: Vec<String>,
    },

    #[error("Matched more than one file for {sample_name}:{data_source} in run {run}: {}", .paths.join(", "))]
    DuplicateInput {
        sample_name: String,
        data_source: String,
        run: String,
        paths: Vec<String>,
    },

    #[error("File pair for {sample_name}:{data_source} disagrees on {field}: '{one}' (run one) vs '{two}' (run two)")]
    PairMismatch {
        sample_name: String,
        data_source: String,
        field: &'static str,
        one: String,
        two: String,
    },

    #[error("Could not extract a {producer} sample name from directory {directory}")]
    SampleName { producer: String, directory: String },

    #[error("No samples matched between run one and run two")]
    NoSamplesMatched,

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, DiscoveryError>;
