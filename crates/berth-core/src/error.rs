//! Terminal error kinds for a pack run.

use berth_schema::{ManifestError, PatternError};
use std::path::PathBuf;
use thiserror::Error;

/// Everything that can abort a pack run.
///
/// All variants are terminal for the current run: nothing is retried,
/// partial output stays on disk, and the caller surfaces the message with a
/// non-zero exit. Re-running pack overwrites and augments the partial
/// output rather than cleaning it first.
#[derive(Debug, Error)]
pub enum PackError {
    /// The manifest is missing or malformed where the pipeline reads it.
    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// A `packExclude` entry could not be normalized.
    #[error(transparent)]
    Pattern(#[from] PatternError),

    /// A copy, read, or write failed.
    #[error("filesystem error at {path}: {source}")]
    FileSystem {
        /// The path the failing operation targeted.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// An existing settings document is not parseable as structured markup.
    #[error("settings document {path} could not be merged: {reason}")]
    DocumentMerge {
        /// The settings document being merged.
        path: PathBuf,
        /// Parser diagnostic.
        reason: String,
    },

    /// The requested runtime package is absent from the package cache.
    #[error("runtime package '{name}' not found in {cache}")]
    RuntimeNotFound {
        /// The requested runtime package name.
        name: String,
        /// The cache directory that was searched.
        cache: PathBuf,
    },
}

impl PackError {
    /// Attach the offending path to an I/O error.
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileSystem {
            path: path.into(),
            source,
        }
    }
}
