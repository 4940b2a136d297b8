//! berth-schema - shared types for the berth packaging pipeline.

pub mod hash;
pub mod manifest;
pub mod pattern;

// Re-exports
pub use hash::Sha512Digest;
pub use manifest::{MANIFEST_FILE, Manifest, ManifestError};
pub use pattern::{ExclusionSet, PatternError};
