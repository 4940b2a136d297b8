//! The `pack` command

use anyhow::{Context, Result};
use berth_core::pack::{self, PackOptions, RuntimeRequest};
use berth_schema::MANIFEST_FILE;
use std::path::{Path, PathBuf};

/// Run the pack pipeline and print a completion summary.
#[allow(clippy::too_many_arguments)]
pub fn pack(
    project: &Path,
    out: &Path,
    webroot: Option<String>,
    webroot_out: Option<String>,
    runtime: Option<String>,
    runtime_home: Option<PathBuf>,
    packages: String,
    quiet: bool,
) -> Result<()> {
    // Accept either the project directory or the manifest file itself.
    let project_dir = if project.is_file() && project.file_name().is_some_and(|n| n == MANIFEST_FILE)
    {
        project
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
    } else {
        project.to_path_buf()
    };

    let mut options = PackOptions::new(project_dir, out);
    options.webroot = webroot;
    options.public_out = webroot_out;
    options.cache_dir = packages;
    options.runtime = runtime.map(|name| RuntimeRequest {
        name,
        cache: runtime_home.unwrap_or_else(crate::runtimes_path),
    });

    tracing::debug!("packing {}", options.project_dir.display());
    let report = pack::pack(&options)
        .with_context(|| format!("failed to pack {}", options.project_dir.display()))?;

    if !quiet {
        println!(
            "Packed '{}' into {}",
            report.project,
            report.output_dir.display()
        );
        println!("  {} application file(s)", report.application_files);
        if let Some(dir) = &report.public_dir {
            println!("  {} public file(s) in {dir}/", report.public_files);
        }
        for command in &report.commands {
            println!("  scripts: {command}.cmd, {command}.sh");
        }
        if let Some(runtime) = &report.runtime {
            println!("  bundled runtime: {}", runtime.name());
        }
    }

    Ok(())
}
