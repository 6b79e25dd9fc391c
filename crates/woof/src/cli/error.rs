//! Helpful error types for CLI commands
//!
//! Every error includes:
//! - What went wrong
//! - Context about the situation
//! - Suggestions for how to fix it

use std::fmt;
use woof::discovery::DiscoveryError;

/// An error with helpful context and suggestions
#[derive(Debug)]
pub struct HelpfulError {
    /// The main error message
    pub message: String,
    /// Additional context about what was happening
    pub context: Option<String>,
    /// Suggestions for how to fix the error
    pub suggestions: Vec<String>,
}

impl HelpfulError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_suggestions(mut self, suggestions: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.suggestions.extend(suggestions.into_iter().map(|s| s.into()));
        self
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": self.message,
            "context": self.context,
            "suggestions": self.suggestions,
        })
    }
}

impl From<DiscoveryError> for HelpfulError {
    fn from(err: DiscoveryError) -> Self {
        let message = err.to_string();
        match err {
            DiscoveryError::DuplicateRoots(_) => Self::new(message)
                .with_context("Each result directory may belong to only one run")
                .with_suggestion("TRY: Pass each directory to exactly one of --run-dir-one / --run-dir-two"),
            DiscoveryError::RootNotFound(path) => Self::new(message)
                .with_context("A run root does not exist")
                .with_suggestions([
                    format!("TRY: Check that the path exists: ls -la {}", path),
                    "TRY: For object store roots, check the bucket and prefix: aws s3 ls <URI>/".to_string(),
                ]),
            DiscoveryError::RootNotDirectory(path) => Self::new(message)
                .with_context("Run roots must be directories, not files")
                .with_suggestion(format!("TRY: Pass the directory containing {}", path)),
            DiscoveryError::Listing { .. } | DiscoveryError::ListingTimeout { .. } => Self::new(message)
                .with_context("Object store listing failed; nothing was classified")
                .with_suggestions([
                    "TRY: Check your AWS credentials: aws sts get-caller-identity",
                    "TRY: Raise listing_timeout_secs in the woof config file",
                    "TRY: Set WOOF_S3_ENDPOINT_URL when using a non-AWS endpoint",
                ]),
            DiscoveryError::AmbiguousMatch { matches, .. } => Self::new(message)
                .with_context("Exactly one file per data source is expected in a sample directory")
                .with_suggestions(
                    matches
                        .iter()
                        .map(|m| format!("CANDIDATE: {}", m))
                        .chain(std::iter::once(
                            "TRY: Remove or move the extra files out of the sample directory".to_string(),
                        )),
                ),
            DiscoveryError::DuplicateInput { paths, .. } => Self::new(message)
                .with_context("Two directories in the same run produced the same sample and data source")
                .with_suggestions(
                    paths
                        .iter()
                        .map(|p| format!("FILE: {}", p))
                        .chain(std::iter::once(
                            "TRY: Narrow the run roots so each sample is found once per run".to_string(),
                        )),
                ),
            DiscoveryError::SampleName { .. } => Self::new(message)
                .with_context("The producer derives the sample name from the directory name")
                .with_suggestion("TRY: Keep the original directory names written by the pipeline"),
            DiscoveryError::NoSamplesMatched => Self::new(message)
                .with_context("No data source was found in both runs for any sample")
                .with_suggestions([
                    "TRY: Check that both runs processed the same samples",
                    "TRY: Re-run with -v to see which directories were classified",
                ]),
            DiscoveryError::Pattern { .. } | DiscoveryError::Config(_) | DiscoveryError::Toml(_) => {
                Self::new(message)
                    .with_context("The discovery configuration is invalid")
                    .with_suggestion("TRY: Inspect the effective configuration: woof config")
            }
            DiscoveryError::PairMismatch { .. } | DiscoveryError::InvalidState(_) => Self::new(message)
                .with_context("Internal consistency check failed")
                .with_suggestion("TRY: Re-run with -v and report the log file"),
            DiscoveryError::VirtualRoot { .. }
            | DiscoveryError::Io(_)
            | DiscoveryError::Walk(_)
            | DiscoveryError::Csv(_) => Self::new(message),
        }
    }
}

/// Convert a library error for `?` in command functions.
pub fn discovery(err: DiscoveryError) -> anyhow::Error {
    HelpfulError::from(err).into()
}

impl fmt::Display for HelpfulError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ERROR: {}", self.message)?;

        if let Some(ctx) = &self.context {
            writeln!(f, "CONTEXT: {}", ctx)?;
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            for suggestion in &self.suggestions {
                writeln!(f, "  {}", suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for HelpfulError {}

/// Print an error as a JSON object on stdout.
pub fn print_json_error(err: &anyhow::Error) {
    let value = match err.downcast_ref::<HelpfulError>() {
        Some(helpful) => helpful.to_json(),
        None => serde_json::json!({ "error": format!("{:#}", err) }),
    };
    match serde_json::to_string_pretty(&value) {
        Ok(text) => println!("{}", text),
        Err(_) => println!("{{\"error\": \"unprintable error\"}}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helpful_error_display() {
        let err = HelpfulError::new("Something went wrong")
            .with_context("While matching")
            .with_suggestion("TRY: again");

        let display = format!("{}", err);
        assert!(display.contains("ERROR: Something went wrong"));
        assert!(display.contains("CONTEXT: While matching"));
        assert!(display.contains("TRY: again"));
    }

    #[test]
    fn test_ambiguous_match_lists_candidates() {
        let err = HelpfulError::from(DiscoveryError::AmbiguousMatch {
            pattern: "structural/.+-manta.vcf.gz$".to_string(),
            directory: "/runs/one/S1".to_string(),
            matches: vec!["/runs/one/S1/a".to_string(), "/runs/one/S1/b".to_string()],
        });
        let display = err.to_string();
        assert!(display.contains("/runs/one/S1"));
        assert!(display.contains("CANDIDATE: /runs/one/S1/a"));
        assert!(display.contains("CANDIDATE: /runs/one/S1/b"));
    }

    #[test]
    fn test_json_form() {
        let err = HelpfulError::from(DiscoveryError::NoSamplesMatched);
        let json = err.to_json();
        assert_eq!(json["error"], "No samples matched between run one and run two");
        assert!(json["suggestions"].as_array().unwrap().len() >= 1);
    }
}
