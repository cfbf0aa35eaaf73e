//! Failures that abort a merge before any report exists

use std::path::PathBuf;
use thiserror::Error;

/// Fatal merge failure: unreadable or malformed input, or a bad invocation.
///
/// Semantic problems (conflicts, validation) are never reported this way;
/// they end up as records in the [`crate::MergingReport`].
#[derive(Error, Debug)]
pub enum MergeFailure {
    #[error("Error parsing {file}:{line}:{column}: {message}")]
    Parse {
        file: String,
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Error parsing {}: cannot read file: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error parsing navigation json {file}: {source}")]
    Navigation {
        file: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid merge invocation: {0}")]
    Invocation(String),
}

/// Rejected dynamic feature name
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("FeatureName '{name}' is invalid: {reason}")]
pub struct InvalidFeatureName {
    pub name: String,
    pub reason: &'static str,
}
