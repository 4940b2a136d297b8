//! berth - deployment packaging for project trees
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_panics_doc)]
//!
//! Turns a project source tree plus its `project.json` manifest into a
//! self-contained, deployable directory layout.
//!
//! # Overview
//!
//! `berth pack` partitions the source tree into application and public
//! halves, rewrites configuration so the two can find each other at run
//! time, generates launcher scripts per declared command, and optionally
//! embeds a pinned runtime package with an integrity checksum.
//!
//! # Output Layout
//!
//! ```text
//! <out>/
//! ├── approot/
//! │   ├── global.json            # cache-directory name, empty dependency map
//! │   ├── src/<project>/         # filtered application tree + rewritten manifest
//! │   └── packages/<runtime>/    # optional bundled runtime + .nupkg.sha512 sidecar
//! ├── <public-dir>/              # optional public tree + web.config
//! └── <command>.cmd / .sh        # launcher script pair per declared command
//! ```

pub mod cmd;

use clap::{Parser, Subcommand};
use dirs::home_dir;
use std::path::PathBuf;

/// Returns the berth home directory, or None if the user's home cannot be resolved.
pub fn try_berth_home() -> Option<PathBuf> {
    if let Ok(val) = std::env::var("BERTH_HOME") {
        return Some(PathBuf::from(val));
    }
    home_dir().map(|h| h.join(".berth"))
}

/// Returns the canonical berth home directory (`~/.berth`).
///
/// # Panics
///
/// Panics if neither `BERTH_HOME` is set nor the user's home directory can
/// be resolved.
pub fn berth_home() -> PathBuf {
    try_berth_home().expect("Could not determine home directory. Set BERTH_HOME to override.")
}

/// Runtime package cache of pre-extracted runtimes: ~/.berth/runtimes
pub fn runtimes_path() -> PathBuf {
    berth_home().join("runtimes")
}

#[derive(Debug, Parser)]
#[command(name = "berth")]
#[command(author, version, about = "berth - deployment packaging for project trees")]
pub struct Cli {
    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Produce a self-contained deployable layout from a project tree
    Pack {
        /// Project directory, or a direct path to project.json
        #[arg(default_value = ".")]
        project: PathBuf,

        /// Output directory for the packed layout
        #[arg(short, long)]
        out: PathBuf,

        /// Public-asset root relative to the project (overrides the manifest webroot)
        #[arg(long)]
        webroot: Option<String>,

        /// Name of the produced public-tree directory (default: the webroot's last segment)
        #[arg(long)]
        webroot_out: Option<String>,

        /// Runtime package to embed, e.g. apphost-mono.1.0.0
        #[arg(long)]
        runtime: Option<String>,

        /// Runtime package cache holding pre-extracted runtimes
        #[arg(long, env = "BERTH_RUNTIME_HOME")]
        runtime_home: Option<PathBuf>,

        /// Name of the dependency-cache directory
        #[arg(long, default_value = "packages")]
        packages: String,
    },
}
