//! Input discovery and matching
//!
//! Walks the result trees of two pipeline runs, works out which producer wrote
//! each directory, pulls one file per data source out of it and pairs the
//! files of both runs per sample. Matched pairs end up in a tab-separated
//! manifest.

pub mod config;
pub mod detector;
pub mod error;
pub mod inputs;
pub mod manifest;
pub mod matching;
pub mod object_store;
pub mod patterns;
pub mod producers;
pub mod report;
pub mod session;
pub mod types;
pub mod vfs;

pub use config::DiscoveryConfig;
pub use detector::{DetectedDirectory, DirectoryDetector};
pub use error::{DiscoveryError, Result};
pub use inputs::{discover_run, process_directory, RunInputs};
pub use manifest::{read_manifest, write_manifest, ManifestRow, MANIFEST_HEADER};
pub use matching::{match_inputs, perform_matching};
pub use object_store::{list_roots, InMemoryLister, ObjectLister, ObjectStoreUri};
pub use patterns::{resolve, AmbiguityPolicy, PathPattern};
pub use producers::{DataSource, ProducerDescriptor, ProducerRegistry};
pub use report::{build_report, summarize, Presence, ProducerReport, ProducerSummary, ReportCell, ReportRow};
pub use session::{check_distinct_roots, ensure_any_matched, DiscoverySession, RootSpec};
pub use types::{DataType, FilePair, InputFile, MatchResult, RunLabel, SampleFileSet, SampleStatus};
pub use vfs::{DirectoryEntry, Entry, LocalEntry, RemoteEntry, VirtualTree};

#[cfg(feature = "s3")]
pub use object_store::S3Lister;
