//! Exclusion patterns and the glob dialect used to filter a project tree.
//!
//! A pattern set is compiled once per pack run. Compilation is the only
//! point that touches the filesystem (through an injected directory probe,
//! used to decide whether a bare name like `Data` is directory shorthand);
//! after that, [`ExclusionSet::is_excluded`] is a pure function over path
//! segments.
//!
//! Dialect:
//! - `**` matches zero or more whole path segments.
//! - `*` matches any run of characters within a single segment.
//! - Literal segments compare case-insensitively, for compatibility with
//!   case-insensitive source filesystems.
//! - A pattern with no glob metacharacter that names an existing directory,
//!   or any pattern written with a trailing separator, excludes that
//!   directory and everything beneath it (it is rewritten to `<dir>/**`).

use std::path::Path;
use thiserror::Error;

/// Error produced when an exclusion entry cannot be normalized.
#[derive(Debug, Error)]
pub enum PatternError {
    /// The entry was empty (or contained only separators) after trimming.
    #[error("exclusion pattern is empty")]
    Empty,

    /// The entry was an absolute path; patterns are relative to the
    /// project root.
    #[error("exclusion pattern '{0}' must be relative to the project root")]
    Absolute(String),
}

/// One normalized pattern: `/`-separated segments, shorthand already
/// expanded to a trailing `**`.
#[derive(Debug, Clone)]
struct CompiledPattern {
    segments: Vec<String>,
}

impl CompiledPattern {
    /// True when the pattern matches the path itself or any of its
    /// ancestor directories.
    fn matches(&self, path: &[&str]) -> bool {
        let pattern: Vec<&str> = self.segments.iter().map(String::as_str).collect();
        (1..=path.len()).any(|end| glob_match(&pattern, &path[..end]))
    }
}

/// The compiled exclusion rules for a single pack run.
///
/// Combines the manifest's `packExclude` patterns with the rules that
/// always apply: dot-prefixed directories, `bin`/`obj` directly under the
/// project root, and the local dependency-cache directory.
#[derive(Debug, Clone)]
pub struct ExclusionSet {
    patterns: Vec<CompiledPattern>,
    cache_dir: String,
}

impl ExclusionSet {
    /// Compile manifest patterns against the current project tree.
    ///
    /// `dir_exists` is consulted once per pattern, with the normalized
    /// `/`-separated pattern text, to decide whether a glob-free entry is
    /// directory shorthand. `cache_dir` is the name of the project-local
    /// dependency cache (excluded unconditionally).
    ///
    /// # Errors
    ///
    /// Returns a [`PatternError`] for entries that are empty or absolute.
    pub fn compile<F>(patterns: &[String], cache_dir: &str, dir_exists: F) -> Result<Self, PatternError>
    where
        F: Fn(&str) -> bool,
    {
        let mut compiled = Vec::with_capacity(patterns.len());

        for raw in patterns {
            let normalized = raw.trim().replace('\\', "/");
            if normalized.is_empty() {
                return Err(PatternError::Empty);
            }
            if normalized.starts_with('/') || has_drive_prefix(&normalized) {
                return Err(PatternError::Absolute(raw.clone()));
            }

            let trailing_separator = normalized.ends_with('/');
            let trimmed = normalized.trim_end_matches('/');

            let mut segments: Vec<String> = trimmed
                .split('/')
                .filter(|s| !s.is_empty() && *s != ".")
                .map(str::to_string)
                .collect();
            if segments.is_empty() {
                return Err(PatternError::Empty);
            }

            // Bare directory names are a common way to exclude build output;
            // requiring an explicit `/**` would be error-prone. A name only
            // counts as shorthand if a directory by that name actually
            // exists, because the same string could be a literal file name.
            let shorthand = trailing_separator
                || (!trimmed.contains('*') && dir_exists(&segments.join("/")));
            if shorthand && segments.last().is_some_and(|s| s != "**") {
                segments.push("**".to_string());
            }

            compiled.push(CompiledPattern { segments });
        }

        Ok(Self {
            patterns: compiled,
            cache_dir: cache_dir.to_string(),
        })
    }

    /// An empty set: only the always-excluded rules apply.
    pub fn defaults(cache_dir: &str) -> Self {
        Self {
            patterns: Vec::new(),
            cache_dir: cache_dir.to_string(),
        }
    }

    /// Decide whether `relative_path` (relative to the project root) is
    /// excluded from every output tree.
    ///
    /// The always-excluded rules run first: any non-final segment starting
    /// with `.`, a directory whose own name starts with `.`, `bin`/`obj`
    /// directories directly under the root, and the dependency-cache
    /// directory. Dot-prefixed files are retained. A path is also excluded
    /// when any pattern matches it or one of its ancestor directories.
    pub fn is_excluded(&self, relative_path: &Path, is_directory: bool) -> bool {
        let owned: Vec<String> = relative_path
            .components()
            .filter_map(|c| match c {
                std::path::Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        let segments: Vec<&str> = owned.iter().map(String::as_str).collect();

        let Some((last, parents)) = segments.split_last() else {
            return false;
        };

        // Dot-prefixed directories are gone unconditionally; dot files stay.
        if parents.iter().any(|s| s.starts_with('.')) || (is_directory && last.starts_with('.')) {
            return true;
        }

        // `bin`, `obj`, and the dependency cache, directly under the root.
        // A *file* with one of these names is retained.
        let rooted_dir = |name: &str| {
            segments[0].eq_ignore_ascii_case(name) && (segments.len() > 1 || is_directory)
        };
        if rooted_dir("bin") || rooted_dir("obj") || rooted_dir(&self.cache_dir) {
            return true;
        }

        self.patterns.iter().any(|p| p.matches(&segments))
    }
}

/// True for Windows-style `C:` drive prefixes.
fn has_drive_prefix(pattern: &str) -> bool {
    let bytes = pattern.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Match a full pattern against a full path, segment-wise.
///
/// `**` consumes zero or more whole segments; every other segment must
/// match exactly one path segment via [`segment_match`].
fn glob_match(pattern: &[&str], path: &[&str]) -> bool {
    let Some((first, rest)) = pattern.split_first() else {
        return path.is_empty();
    };
    if *first == "**" {
        // Zero segments, or swallow one and retry.
        return glob_match(rest, path) || (!path.is_empty() && glob_match(pattern, &path[1..]));
    }
    match path.split_first() {
        Some((segment, tail)) => segment_match(first, segment) && glob_match(rest, tail),
        None => false,
    }
}

/// Match one pattern segment against one path segment.
///
/// `*` matches any run of characters (including none); everything else is
/// a case-insensitive literal comparison.
fn segment_match(pattern: &str, text: &str) -> bool {
    fn inner(pattern: &[u8], text: &[u8]) -> bool {
        match pattern.split_first() {
            None => text.is_empty(),
            Some((b'*', rest)) => (0..=text.len()).any(|skip| inner(rest, &text[skip..])),
            Some((p, rest)) => text
                .split_first()
                .is_some_and(|(t, tail)| p.eq_ignore_ascii_case(t) && inner(rest, tail)),
        }
    }
    inner(pattern.as_bytes(), text.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn compile(patterns: &[&str]) -> ExclusionSet {
        let owned: Vec<String> = patterns.iter().map(ToString::to_string).collect();
        ExclusionSet::compile(&owned, "packages", |_| false).unwrap()
    }

    fn compile_with_dirs(patterns: &[&str], dirs: &[&str]) -> ExclusionSet {
        let owned: Vec<String> = patterns.iter().map(ToString::to_string).collect();
        let dirs: Vec<String> = dirs.iter().map(ToString::to_string).collect();
        ExclusionSet::compile(&owned, "packages", |p| dirs.iter().any(|d| d == p)).unwrap()
    }

    #[test]
    fn dot_directories_are_always_excluded() {
        let set = ExclusionSet::defaults("packages");
        assert!(set.is_excluded(Path::new(".git"), true));
        assert!(set.is_excluded(Path::new(".git/config"), false));
        assert!(set.is_excluded(Path::new("src/.svn"), true));
        assert!(set.is_excluded(Path::new("src/.svn/entries"), false));
    }

    #[test]
    fn dot_files_are_retained() {
        let set = ExclusionSet::defaults("packages");
        assert!(!set.is_excluded(Path::new(".gitignore"), false));
        assert!(!set.is_excluded(Path::new("src/.editorconfig"), false));
    }

    #[test]
    fn bin_and_obj_excluded_only_at_root() {
        let set = ExclusionSet::defaults("packages");
        assert!(set.is_excluded(Path::new("bin"), true));
        assert!(set.is_excluded(Path::new("obj"), true));
        assert!(set.is_excluded(Path::new("bin/app.dll"), false));
        // A file named `bin` at the root is kept.
        assert!(!set.is_excluded(Path::new("bin"), false));
        // Nested bin/obj directories are not default-excluded.
        assert!(!set.is_excluded(Path::new("tools/bin"), true));
        assert!(!set.is_excluded(Path::new("tools/bin/helper"), false));
    }

    #[test]
    fn dependency_cache_is_never_copied() {
        let set = ExclusionSet::defaults("packages");
        assert!(set.is_excluded(Path::new("packages"), true));
        assert!(set.is_excluded(Path::new("packages/Newtonsoft.Json/lib.dll"), false));
        let renamed = ExclusionSet::defaults("deps");
        assert!(renamed.is_excluded(Path::new("deps"), true));
        assert!(!renamed.is_excluded(Path::new("packages"), true));
    }

    #[test]
    fn directory_shorthand_excludes_whole_subtree() {
        let set = compile_with_dirs(&["Data/Backup"], &["Data/Backup"]);
        assert!(set.is_excluded(Path::new("Data/Backup"), true));
        assert!(set.is_excluded(Path::new("Data/Backup/2014/dump.bak"), false));
        assert!(!set.is_excluded(Path::new("Data/Input/rows.csv"), false));
    }

    #[test]
    fn trailing_separator_is_shorthand_without_probe() {
        let set = compile(&["scratch/"]);
        assert!(set.is_excluded(Path::new("scratch"), true));
        assert!(set.is_excluded(Path::new("scratch/notes.txt"), false));
    }

    #[test]
    fn glob_free_name_without_directory_is_a_literal() {
        // No directory named `LICENSE` exists, so only the file matches.
        let set = compile(&["LICENSE"]);
        assert!(set.is_excluded(Path::new("LICENSE"), false));
        assert!(!set.is_excluded(Path::new("LICENSE.txt"), false));
        assert!(!set.is_excluded(Path::new("docs/LICENSE"), false));
    }

    #[test]
    fn double_star_matches_zero_or_more_segments() {
        let set = compile(&["Data/Backup/**"]);
        assert!(set.is_excluded(Path::new("Data/Backup/dump.bak"), false));
        assert!(set.is_excluded(Path::new("Data/Backup/2014/06/dump.bak"), false));
        assert!(!set.is_excluded(Path::new("Data/Input/rows.csv"), false));
    }

    #[test]
    fn single_star_matches_within_one_segment() {
        let set = compile(&["Data/*"]);
        assert!(set.is_excluded(Path::new("Data/rows.csv"), false));
        // Deeper paths are only gone because their parent directory matched.
        assert!(set.is_excluded(Path::new("Data/Backup/dump.bak"), false));
        assert!(!set.is_excluded(Path::new("Data"), true));
    }

    #[test]
    fn star_is_confined_to_a_segment() {
        let set = compile(&["*.user"]);
        assert!(set.is_excluded(Path::new("app.csproj.user"), false));
        assert!(!set.is_excluded(Path::new("settings/app.user"), false));
    }

    #[test]
    fn interior_double_star() {
        let set = compile(&["src/**/generated"]);
        assert!(set.is_excluded(Path::new("src/generated"), true));
        assert!(set.is_excluded(Path::new("src/a/b/generated"), true));
        assert!(set.is_excluded(Path::new("src/a/generated/out.cs"), false));
        assert!(!set.is_excluded(Path::new("src/a/b/handwritten"), true));
    }

    #[test]
    fn literal_segments_compare_case_insensitively() {
        let set = compile(&["Data/Backup/**"]);
        assert!(set.is_excluded(Path::new("data/backup/dump.bak"), false));
        assert!(set.is_excluded(Path::new("DATA/BACKUP"), true));
    }

    #[test]
    fn extension_glob_does_not_match_extensionless_files() {
        let set = compile(&["**/*.log"]);
        assert!(set.is_excluded(Path::new("logs/today.log"), false));
        assert!(set.is_excluded(Path::new("today.log"), false));
        assert!(!set.is_excluded(Path::new("logs/today"), false));
    }

    #[test]
    fn backslash_separators_are_normalized() {
        let set = compile(&["Data\\Backup\\**"]);
        assert!(set.is_excluded(Path::new("Data/Backup/dump.bak"), false));
    }

    #[test]
    fn empty_pattern_is_rejected() {
        let err = ExclusionSet::compile(&[String::new()], "packages", |_| false).unwrap_err();
        assert!(matches!(err, PatternError::Empty));
        let err =
            ExclusionSet::compile(&["   ".to_string()], "packages", |_| false).unwrap_err();
        assert!(matches!(err, PatternError::Empty));
    }

    #[test]
    fn absolute_pattern_is_rejected() {
        let err = ExclusionSet::compile(&["/tmp/junk".to_string()], "packages", |_| false)
            .unwrap_err();
        assert!(matches!(err, PatternError::Absolute(_)));
        let err = ExclusionSet::compile(&["C:\\junk".to_string()], "packages", |_| false)
            .unwrap_err();
        assert!(matches!(err, PatternError::Absolute(_)));
    }

    #[test]
    fn pattern_cannot_reinclude_dot_directory() {
        // Patterns only ever exclude; a dot directory stays gone.
        let set = compile(&["keep/**"]);
        assert!(set.is_excluded(Path::new(".git/HEAD"), false));
    }

    #[test]
    fn segment_match_basics() {
        assert!(segment_match("*", "anything"));
        assert!(segment_match("*", ""));
        assert!(segment_match("a*c", "abc"));
        assert!(segment_match("a*c", "ac"));
        assert!(segment_match("a*c", "aXYZc"));
        assert!(!segment_match("a*c", "abd"));
        assert!(segment_match("*.bak", "db.bak"));
        assert!(!segment_match("*.bak", "db.bak.old"));
    }
}
