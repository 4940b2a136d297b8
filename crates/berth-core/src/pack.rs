//! The pack pipeline: one synchronous, fail-fast sequence.
//!
//! Load manifest, compile the effective exclusion set, partition the tree,
//! copy, write the global document and the relocated manifest, merge the
//! settings document when a public tree exists, generate launcher scripts,
//! and bundle the runtime when one was requested. The first failing step
//! aborts the run; whatever was already written stays on disk, so callers
//! needing a clean slate use a fresh output directory.

use crate::error::PackError;
use crate::partition::{Destination, partition};
use crate::runtime::RuntimeId;
use crate::{config, paths, runtime, scripts, settings};
use berth_schema::{ExclusionSet, MANIFEST_FILE, Manifest};
use std::path::{Path, PathBuf};

/// A request to embed a runtime package into the output.
#[derive(Debug, Clone)]
pub struct RuntimeRequest {
    /// Name of the runtime package, e.g. `apphost-mono.1.0.0`.
    pub name: String,
    /// The runtime package cache holding the extracted package. Resolved
    /// by the caller; the pipeline never reads environment state.
    pub cache: PathBuf,
}

/// Inputs of one pack run.
#[derive(Debug, Clone)]
pub struct PackOptions {
    /// Project root containing the manifest.
    pub project_dir: PathBuf,
    /// Output directory. Created if missing; pre-existing unrelated
    /// content is left alone (additive write, not a sync).
    pub output_dir: PathBuf,
    /// Public-asset root override, relative to the project root. Falls
    /// back to the manifest's `webroot`; `None` with no manifest value
    /// means no public split.
    pub webroot: Option<String>,
    /// Name of the produced public-tree directory. Defaults to the
    /// webroot's final path segment.
    pub public_out: Option<String>,
    /// Runtime package to embed, if any.
    pub runtime: Option<RuntimeRequest>,
    /// Name of the dependency-cache directory, recorded in the global
    /// document and excluded from the source walk.
    pub cache_dir: String,
}

impl PackOptions {
    /// Options with defaults for everything but the two directories.
    pub fn new(project_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            project_dir: project_dir.into(),
            output_dir: output_dir.into(),
            webroot: None,
            public_out: None,
            runtime: None,
            cache_dir: paths::PACKAGES_DIR.to_string(),
        }
    }
}

/// What a successful run produced.
#[derive(Debug)]
pub struct PackReport {
    /// Project name used for the relocated application tree.
    pub project: String,
    /// The output directory that was written.
    pub output_dir: PathBuf,
    /// Number of files copied into the application tree.
    pub application_files: usize,
    /// Number of files copied into the public tree.
    pub public_files: usize,
    /// Name of the produced public-tree directory, if any.
    pub public_dir: Option<String>,
    /// Commands that got launcher scripts.
    pub commands: Vec<String>,
    /// Identity of the bundled runtime, if one was embedded.
    pub runtime: Option<RuntimeId>,
}

/// Run the whole pipeline.
///
/// # Errors
///
/// Returns the [`PackError`] of the first failing step. Partial output is
/// left on disk.
pub fn pack(options: &PackOptions) -> Result<PackReport, PackError> {
    let project_dir = &options.project_dir;
    let out = &options.output_dir;

    let manifest_path = project_dir.join(MANIFEST_FILE);
    let manifest = Manifest::load(&manifest_path)?;
    let project = project_name(&manifest, project_dir);

    let excludes = ExclusionSet::compile(manifest.pack_exclude(), &options.cache_dir, |p| {
        project_dir.join(p).is_dir()
    })?;

    // The flag overrides the manifest; either one triggers the split.
    let webroot = options
        .webroot
        .clone()
        .or_else(|| manifest.webroot().map(str::to_string))
        .map(|w| w.replace('\\', "/"));
    let webroot_path = webroot.as_deref().map(PathBuf::from);
    let public_dir_name = webroot_path.as_deref().map(|w| {
        options.public_out.clone().unwrap_or_else(|| {
            w.file_name()
                .map_or_else(|| "public".to_string(), |n| n.to_string_lossy().into_owned())
        })
    });

    let classified = partition(project_dir, webroot_path.as_deref(), &excludes)?;
    tracing::debug!(
        "partitioned {} application / {} public files",
        classified.count(Destination::Application),
        classified.count(Destination::Public),
    );

    std::fs::create_dir_all(out).map_err(|e| PackError::io(out, e))?;
    let app_dir = paths::app_dir(out, &project);
    let public_dir = public_dir_name.as_ref().map(|name| out.join(name));

    for file in &classified.files {
        let destination = match (file.destination, &public_dir) {
            (Destination::Public, Some(public_dir)) => public_dir.join(&file.relative),
            (Destination::Public, None) => continue,
            (Destination::Application, _) => app_dir.join(&file.relative),
        };
        if let Some(parent) = destination.parent() {
            std::fs::create_dir_all(parent).map_err(|e| PackError::io(parent, e))?;
        }
        std::fs::copy(&file.source, &destination).map_err(|e| PackError::io(&destination, e))?;
    }

    config::write_global_document(out, &options.cache_dir)?;
    config::write_manifest_copy(
        &manifest,
        &manifest_path,
        &app_dir.join(MANIFEST_FILE),
        &app_dir,
        public_dir.as_deref(),
    )?;

    let runtime_id = options
        .runtime
        .as_ref()
        .map(|request| RuntimeId::parse(&request.name));

    if let Some(public_dir) = &public_dir {
        // A requested public root materializes even when every public file
        // was excluded or the webroot is empty.
        std::fs::create_dir_all(public_dir).map_err(|e| PackError::io(public_dir, e))?;
        let entries = config::app_settings_entries(
            out,
            public_dir,
            &app_dir,
            &options.cache_dir,
            runtime_id.as_ref(),
        );
        settings::ensure_settings_document(&public_dir.join(paths::SETTINGS_FILE), &entries)?;
    }

    scripts::write_launcher_scripts(
        out,
        &project,
        manifest.commands(),
        runtime_id.as_ref(),
        &options.cache_dir,
    )?;

    let bundled = match &options.runtime {
        Some(request) => Some(runtime::bundle_runtime(
            &request.cache,
            &request.name,
            out,
            &options.cache_dir,
        )?),
        None => None,
    };

    Ok(PackReport {
        project,
        output_dir: out.clone(),
        application_files: classified.count(Destination::Application),
        public_files: classified.count(Destination::Public),
        public_dir: public_dir_name,
        commands: manifest.commands().iter().map(|(c, _)| c.clone()).collect(),
        runtime: bundled,
    })
}

/// Display name of the project: the manifest's `name` member, falling
/// back to the project directory's own name.
fn project_name(manifest: &Manifest, project_dir: &Path) -> String {
    manifest.name().map_or_else(
        || {
            project_dir
                .file_name()
                .map_or_else(|| "app".to_string(), |n| n.to_string_lossy().into_owned())
        },
        str::to_string,
    )
}
