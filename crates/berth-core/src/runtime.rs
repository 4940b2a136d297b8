//! Runtime package bundling.
//!
//! A runtime package arrives pre-extracted in the runtime package cache
//! (an external collaborator; nothing is fetched here). Bundling copies
//! the extracted tree verbatim into the output dependency cache, strips
//! the packaging-only artifacts that carry no runtime value, and records
//! the integrity digest of the original archive in a sidecar.

use crate::error::PackError;
use crate::paths;
use berth_schema::Sha512Digest;
use std::path::Path;

/// Content-type manifest left over from the packaging format.
const CONTENT_TYPES_FILE: &str = "[Content_Types].xml";
/// Directory holding the relationships descriptor.
const RELS_DIR: &str = "_rels";
/// The relationships descriptor itself.
const RELS_FILE: &str = ".rels";
/// Nested metadata subdirectory of the packaging format.
const PACKAGE_METADATA_DIR: &str = "package";
/// Extension of the original archive and of the integrity sidecar.
const ARCHIVE_EXT: &str = "nupkg";

/// Parsed identity of a runtime package name.
///
/// Names follow `<flavor>.<version>`: the flavor carries no dots
/// (`apphost-mono`, `apphost-clr-x64`), the version is everything after
/// the first dot (`1.0.0-beta4`). A name with no version part yields an
/// empty version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeId {
    name: String,
    flavor: String,
    version: String,
}

impl RuntimeId {
    /// Parse a runtime package directory name.
    pub fn parse(name: &str) -> Self {
        let (flavor, version) = match name.split_once('.') {
            Some((flavor, version)) if !flavor.is_empty() => (flavor, version),
            _ => (name, ""),
        };
        Self {
            name: name.to_string(),
            flavor: flavor.to_string(),
            version: version.to_string(),
        }
    }

    /// The full package name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The flavor prefix of the name.
    pub fn flavor(&self) -> &str {
        &self.flavor
    }

    /// The version suffix of the name.
    pub fn version(&self) -> &str {
        &self.version
    }
}

/// Embed the named runtime from `cache` into the output.
///
/// Copies `<cache>/<name>/` verbatim to `approot/<cache-dir>/<name>/`,
/// computes the base64 SHA-512 of the original `<name>.nupkg` archive
/// (retained inside the extracted layout, not the extracted tree) into a
/// `<name>.nupkg.sha512` sidecar alongside the copied tree, and removes
/// the three packaging-only artifacts from the copy.
///
/// # Errors
///
/// [`PackError::RuntimeNotFound`] when the runtime or its archive is
/// absent from the cache; [`PackError::FileSystem`] when copying fails.
pub fn bundle_runtime(
    cache: &Path,
    name: &str,
    out: &Path,
    cache_dir: &str,
) -> Result<RuntimeId, PackError> {
    let source = cache.join(name);
    if !source.is_dir() {
        return Err(PackError::RuntimeNotFound {
            name: name.to_string(),
            cache: cache.to_path_buf(),
        });
    }

    let archive = source.join(format!("{name}.{ARCHIVE_EXT}"));
    if !archive.is_file() {
        // The extracted layout always retains the original archive; a
        // cache entry without one is unusable for integrity stamping.
        return Err(PackError::RuntimeNotFound {
            name: name.to_string(),
            cache: cache.to_path_buf(),
        });
    }
    let digest = Sha512Digest::compute_file(&archive).map_err(|e| PackError::io(&archive, e))?;

    let packages = paths::packages_dir(out, cache_dir);
    let destination = packages.join(name);
    std::fs::create_dir_all(&destination).map_err(|e| PackError::io(&destination, e))?;
    copy_dir_all(&source, &destination)?;

    strip_packaging_artifacts(&destination)?;

    let sidecar = packages.join(format!("{name}.{ARCHIVE_EXT}.sha512"));
    std::fs::write(&sidecar, digest.as_str()).map_err(|e| PackError::io(&sidecar, e))?;

    tracing::debug!("bundled runtime {name}");
    Ok(RuntimeId::parse(name))
}

/// Recursively copy a directory tree from `src` into `dst`.
fn copy_dir_all(src: &Path, dst: &Path) -> Result<(), PackError> {
    fs_extra::dir::copy(
        src,
        dst,
        &fs_extra::dir::CopyOptions::new()
            .content_only(true)
            .overwrite(true),
    )
    .map_err(|e| PackError::io(dst, std::io::Error::other(e)))?;
    Ok(())
}

/// Remove the content-type manifest, the relationships descriptor, and
/// the nested `package` metadata directory from a bundled copy.
fn strip_packaging_artifacts(destination: &Path) -> Result<(), PackError> {
    let content_types = destination.join(CONTENT_TYPES_FILE);
    if content_types.is_file() {
        std::fs::remove_file(&content_types).map_err(|e| PackError::io(&content_types, e))?;
    }

    let rels_file = destination.join(RELS_DIR).join(RELS_FILE);
    if rels_file.is_file() {
        std::fs::remove_file(&rels_file).map_err(|e| PackError::io(&rels_file, e))?;
        let rels_dir = destination.join(RELS_DIR);
        if std::fs::read_dir(&rels_dir)
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(false)
        {
            std::fs::remove_dir(&rels_dir).map_err(|e| PackError::io(&rels_dir, e))?;
        }
    }

    let metadata_dir = destination.join(PACKAGE_METADATA_DIR);
    if metadata_dir.is_dir() {
        std::fs::remove_dir_all(&metadata_dir).map_err(|e| PackError::io(&metadata_dir, e))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn stage_runtime(cache: &Path, name: &str) {
        let root = cache.join(name);
        fs::create_dir_all(root.join("bin")).unwrap();
        fs::create_dir_all(root.join("_rels")).unwrap();
        fs::create_dir_all(root.join("package/services")).unwrap();
        fs::write(root.join("bin/apphost"), b"#!runtime").unwrap();
        fs::write(root.join(format!("{name}.nupkg")), b"archive bytes").unwrap();
        fs::write(root.join("[Content_Types].xml"), b"<Types />").unwrap();
        fs::write(root.join("_rels/.rels"), b"<Relationships />").unwrap();
        fs::write(root.join("package/services/metadata"), b"m").unwrap();
    }

    #[test]
    fn parse_splits_flavor_and_version() {
        let id = RuntimeId::parse("apphost-mono.1.0.0-beta4");
        assert_eq!(id.name(), "apphost-mono.1.0.0-beta4");
        assert_eq!(id.flavor(), "apphost-mono");
        assert_eq!(id.version(), "1.0.0-beta4");

        let bare = RuntimeId::parse("apphost");
        assert_eq!(bare.flavor(), "apphost");
        assert_eq!(bare.version(), "");
    }

    #[test]
    fn bundle_copies_strips_and_stamps() {
        let cache = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let name = "apphost-mono.1.0.0";
        stage_runtime(cache.path(), name);

        let id = bundle_runtime(cache.path(), name, out.path(), "packages").unwrap();
        assert_eq!(id.version(), "1.0.0");

        let bundled = out.path().join("approot/packages").join(name);
        assert!(bundled.join("bin/apphost").is_file());
        assert!(bundled.join(format!("{name}.nupkg")).is_file());
        // Packaging-only artifacts are gone from the copy.
        assert!(!bundled.join("[Content_Types].xml").exists());
        assert!(!bundled.join("_rels/.rels").exists());
        assert!(!bundled.join("package").exists());

        // Sidecar holds the digest of the original archive.
        let sidecar = out
            .path()
            .join("approot/packages")
            .join(format!("{name}.nupkg.sha512"));
        let recorded = fs::read_to_string(&sidecar).unwrap();
        assert_eq!(recorded, Sha512Digest::compute(b"archive bytes").as_str());

        // The cache itself is untouched.
        assert!(cache.path().join(name).join("[Content_Types].xml").is_file());
    }

    #[test]
    fn missing_runtime_is_a_terminal_error() {
        let cache = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let err = bundle_runtime(cache.path(), "apphost-mono.9.9.9", out.path(), "packages")
            .unwrap_err();
        assert!(matches!(err, PackError::RuntimeNotFound { .. }));
        assert!(err.to_string().contains("apphost-mono.9.9.9"));
    }

    #[test]
    fn cache_entry_without_archive_is_not_found() {
        let cache = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        fs::create_dir_all(cache.path().join("apphost-mono.1.0.0/bin")).unwrap();

        let err = bundle_runtime(cache.path(), "apphost-mono.1.0.0", out.path(), "packages")
            .unwrap_err();
        assert!(matches!(err, PackError::RuntimeNotFound { .. }));
    }
}
