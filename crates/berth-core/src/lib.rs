//! berth-core - the packaging pipeline.
//!
//! Everything between a loaded manifest and a finished output directory
//! lives here: the tree partitioner, the generated configuration, the
//! settings-document merge, launcher-script generation, runtime bundling,
//! and the orchestrator that sequences them. The crate never reads
//! environment state; callers resolve paths and hand them in.

pub mod config;
pub mod error;
pub mod pack;
pub mod partition;
pub mod paths;
pub mod runtime;
pub mod scripts;
pub mod settings;

// Re-exports
pub use error::PackError;
pub use pack::{PackOptions, PackReport, RuntimeRequest, pack};
pub use partition::{ClassifiedFile, Destination, Partition};
pub use runtime::RuntimeId;
