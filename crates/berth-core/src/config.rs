//! Generated configuration: the global document, the relocated manifest,
//! and the app-settings values.

use crate::error::PackError;
use crate::paths;
use crate::runtime::RuntimeId;
use berth_schema::Manifest;
use std::path::{Path, PathBuf};

/// App-settings key: output dependency cache, relative to the public tree.
pub const PACKAGES_PATH_KEY: &str = "packages-path";
/// App-settings key: bootstrapper version (left empty by this pipeline).
pub const BOOTSTRAPPER_VERSION_KEY: &str = "bootstrapper-version";
/// App-settings key: runtime package cache, relative to the public tree.
pub const RUNTIME_PACKAGES_PATH_KEY: &str = "runtime-packages-path";
/// App-settings key: bundled runtime version.
pub const RUNTIME_VERSION_KEY: &str = "runtime-version";
/// App-settings key: bundled runtime flavor.
pub const RUNTIME_FLAVOR_KEY: &str = "runtime-flavor";
/// App-settings key: relocated application tree, relative to the public tree.
pub const APP_BASE_KEY: &str = "app-base";

/// Write `approot/global.json`: an empty dependency map plus the
/// dependency-cache directory name. Per-application dependencies live in
/// the application's own manifest, not here.
///
/// # Errors
///
/// Returns [`PackError::FileSystem`] when the document cannot be written.
pub fn write_global_document(out: &Path, cache_dir: &str) -> Result<(), PackError> {
    let document = serde_json::json!({
        "dependencies": {},
        "packages": cache_dir,
    });
    let path = paths::global_file(out);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| PackError::io(parent, e))?;
    }
    let text = serde_json::to_string_pretty(&document)
        .map_err(|e| PackError::io(&path, std::io::Error::other(e)))?;
    std::fs::write(&path, text + "\n").map_err(|e| PackError::io(&path, e))
}

/// Write the application-tree copy of the manifest.
///
/// With a public tree, the copy's `webroot` member is replaced with the
/// relative path (host separator convention) from the relocated
/// application back to the produced public-tree directory, computed fresh
/// regardless of the member's original value; everything else in the
/// document is carried through. Without a public tree there is nothing to
/// point at, so the file is copied byte-for-byte.
///
/// # Errors
///
/// Returns [`PackError::FileSystem`] when the copy cannot be written.
pub fn write_manifest_copy(
    manifest: &Manifest,
    source: &Path,
    destination: &Path,
    app_dir: &Path,
    public_dir: Option<&Path>,
) -> Result<(), PackError> {
    if let Some(parent) = destination.parent() {
        std::fs::create_dir_all(parent).map_err(|e| PackError::io(parent, e))?;
    }
    match public_dir {
        Some(public_dir) => {
            let webroot = host_path(&relative_path(app_dir, public_dir));
            let document = manifest.document_with_webroot(&webroot);
            let text = serde_json::to_string_pretty(&document)
                .map_err(|e| PackError::io(destination, std::io::Error::other(e)))?;
            std::fs::write(destination, text + "\n").map_err(|e| PackError::io(destination, e))
        }
        None => {
            std::fs::copy(source, destination)
                .map_err(|e| PackError::io(destination, e))
                .map(|_| ())
        }
    }
}

/// The six well-known app-settings entries for a public tree at
/// `public_dir`, in their canonical order.
pub fn app_settings_entries(
    out: &Path,
    public_dir: &Path,
    app_dir: &Path,
    cache_dir: &str,
    runtime: Option<&RuntimeId>,
) -> Vec<(&'static str, String)> {
    let packages_path = host_path(&relative_path(public_dir, &paths::packages_dir(out, cache_dir)));
    let app_base = host_path(&relative_path(public_dir, app_dir));
    let (runtime_version, runtime_flavor) = match runtime {
        Some(runtime) => (runtime.version().to_string(), runtime.flavor().to_string()),
        None => (String::new(), String::new()),
    };

    vec![
        (PACKAGES_PATH_KEY, packages_path.clone()),
        (BOOTSTRAPPER_VERSION_KEY, String::new()),
        (RUNTIME_PACKAGES_PATH_KEY, packages_path),
        (RUNTIME_VERSION_KEY, runtime_version),
        (RUNTIME_FLAVOR_KEY, runtime_flavor),
        (APP_BASE_KEY, app_base),
    ]
}

/// Compute a relative path from `from_dir` to `to_path`.
///
/// Both arguments must be rooted the same way. The function walks up from
/// `from_dir` to the common ancestor and then descends into `to_path`.
///
/// Example: `relative_path("/a/b/c", "/a/b/d/e")` returns `"../d/e"`.
pub(crate) fn relative_path(from_dir: &Path, to_path: &Path) -> PathBuf {
    let from_components: Vec<_> = from_dir.components().collect();
    let to_components: Vec<_> = to_path.components().collect();

    let common_len = from_components
        .iter()
        .zip(to_components.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut result = PathBuf::new();
    for _ in common_len..from_components.len() {
        result.push("..");
    }
    for part in &to_components[common_len..] {
        result.push(part);
    }
    result
}

/// Render a path in the host's separator convention.
pub(crate) fn host_path(path: &Path) -> String {
    let parts: Vec<String> = path
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    parts.join(std::path::MAIN_SEPARATOR_STR)
}
