//! Single-pass partition of the project tree into output file sets.
//!
//! The walk prunes excluded directories without descending into them, so a
//! directory-shorthand exclusion costs nothing regardless of how large the
//! excluded subtree is. Patterns that only match files deep inside a
//! retained directory are applied per file during the same walk.

use crate::error::PackError;
use berth_schema::{ExclusionSet, MANIFEST_FILE};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Which output tree a retained file lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// The relocated application tree under `approot/src/<project>`.
    Application,
    /// The public tree of static assets.
    Public,
}

/// One retained file.
#[derive(Debug, Clone)]
pub struct ClassifiedFile {
    /// Absolute location in the source tree.
    pub source: PathBuf,
    /// Destination path, relative to the project root (application) or to
    /// the webroot (public).
    pub relative: PathBuf,
    /// The output tree this file belongs to.
    pub destination: Destination,
}

/// The classified file list of one pack run.
#[derive(Debug, Default)]
pub struct Partition {
    /// Every retained file, in traversal order.
    pub files: Vec<ClassifiedFile>,
}

impl Partition {
    /// Files destined for the given tree.
    pub fn destined_for(&self, destination: Destination) -> impl Iterator<Item = &ClassifiedFile> {
        self.files.iter().filter(move |f| f.destination == destination)
    }

    /// Number of files destined for the given tree.
    pub fn count(&self, destination: Destination) -> usize {
        self.destined_for(destination).count()
    }
}

/// Walk the project tree once and classify every retained file.
///
/// With a webroot configured, retained paths at or beneath it become
/// public-only (destination relative to the webroot) and everything else
/// application-only. Without one, every retained path is application-only.
/// The manifest file is always retained in the application tree, even when
/// an exclusion pattern would match it.
///
/// # Errors
///
/// Returns [`PackError::FileSystem`] if the source tree cannot be read.
pub fn partition(
    root: &Path,
    webroot: Option<&Path>,
    excludes: &ExclusionSet,
) -> Result<Partition, PackError> {
    let mut files = Vec::new();

    let walker = WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            if !entry.file_type().is_dir() {
                return true;
            }
            let Ok(relative) = entry.path().strip_prefix(root) else {
                return true;
            };
            let keep = !excludes.is_excluded(relative, true);
            if !keep {
                tracing::debug!("pruning {}", relative.display());
            }
            keep
        });

    for entry in walker {
        let entry = entry.map_err(|e| walk_error(root, e))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };

        let is_manifest = relative == Path::new(MANIFEST_FILE);
        if !is_manifest && excludes.is_excluded(relative, false) {
            tracing::debug!("excluding {}", relative.display());
            continue;
        }

        let classified = match webroot {
            Some(webroot) if !is_manifest && relative.starts_with(webroot) => {
                let public_relative = relative
                    .strip_prefix(webroot)
                    .unwrap_or(relative)
                    .to_path_buf();
                ClassifiedFile {
                    source: entry.path().to_path_buf(),
                    relative: public_relative,
                    destination: Destination::Public,
                }
            }
            _ => ClassifiedFile {
                source: entry.path().to_path_buf(),
                relative: relative.to_path_buf(),
                destination: Destination::Application,
            },
        };
        files.push(classified);
    }

    Ok(Partition { files })
}

fn walk_error(root: &Path, error: walkdir::Error) -> PackError {
    let path = error
        .path()
        .map_or_else(|| root.to_path_buf(), Path::to_path_buf);
    let source = error
        .into_io_error()
        .unwrap_or_else(|| std::io::Error::other("walk failed"));
    PackError::io(path, source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"x").unwrap();
    }

    fn relatives(partition: &Partition, destination: Destination) -> Vec<String> {
        partition
            .destined_for(destination)
            .map(|f| f.relative.to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn everything_is_application_without_a_webroot() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "project.json");
        touch(dir.path(), "Views/Home/index.cshtml");

        let excludes = ExclusionSet::defaults("packages");
        let partition = partition(dir.path(), None, &excludes).unwrap();

        assert_eq!(
            relatives(&partition, Destination::Application),
            ["Views/Home/index.cshtml", "project.json"]
        );
        assert_eq!(partition.count(Destination::Public), 0);
    }

    #[test]
    fn webroot_splits_public_from_application() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "project.json");
        touch(dir.path(), "Startup.cs");
        touch(dir.path(), "public/index.html");
        touch(dir.path(), "public/css/site.css");

        let excludes = ExclusionSet::defaults("packages");
        let partition = partition(dir.path(), Some(Path::new("public")), &excludes).unwrap();

        assert_eq!(
            relatives(&partition, Destination::Application),
            ["Startup.cs", "project.json"]
        );
        assert_eq!(
            relatives(&partition, Destination::Public),
            ["css/site.css", "index.html"]
        );
    }

    #[test]
    fn excluded_directories_are_pruned_whole() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "project.json");
        touch(dir.path(), "Data/Input/rows.csv");
        touch(dir.path(), "Data/Backup/dump.bak");
        touch(dir.path(), "bin/app.dll");
        touch(dir.path(), ".git/HEAD");

        let patterns = vec!["Data/Backup/**".to_string()];
        let excludes = ExclusionSet::compile(&patterns, "packages", |p| {
            dir.path().join(p).is_dir()
        })
        .unwrap();
        let partition = partition(dir.path(), None, &excludes).unwrap();

        assert_eq!(
            relatives(&partition, Destination::Application),
            ["Data/Input/rows.csv", "project.json"]
        );
    }

    #[test]
    fn manifest_survives_matching_patterns() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "project.json");
        touch(dir.path(), "notes.json");

        let patterns = vec!["*.json".to_string()];
        let excludes =
            ExclusionSet::compile(&patterns, "packages", |_| false).unwrap();
        let partition = partition(dir.path(), None, &excludes).unwrap();

        assert_eq!(
            relatives(&partition, Destination::Application),
            ["project.json"]
        );
    }

    #[test]
    fn dot_files_are_kept_dot_directories_are_not() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "project.json");
        touch(dir.path(), ".gitignore");
        touch(dir.path(), ".svn/entries");

        let excludes = ExclusionSet::defaults("packages");
        let partition = partition(dir.path(), None, &excludes).unwrap();

        assert_eq!(
            relatives(&partition, Destination::Application),
            [".gitignore", "project.json"]
        );
    }
}
