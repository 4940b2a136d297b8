//! Manifest parsing for berth projects.
//!
//! A project manifest (`project.json`) declares everything the packaging
//! pipeline reads: exclusion patterns, the public-asset root, and the
//! launchable commands. The rest of the document (dependencies, frameworks,
//! anything the author added) is opaque to the pipeline and carried through
//! the pack unmodified, so the full parsed document is kept alongside the
//! typed fields.

use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name of the project manifest.
pub const MANIFEST_FILE: &str = "project.json";

/// Error produced while loading or reading manifest fields.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// No manifest file at the expected location.
    #[error("no {MANIFEST_FILE} found at {0}")]
    NotFound(PathBuf),

    /// The manifest file could not be read.
    #[error("failed to read manifest: {0}")]
    Io(#[from] std::io::Error),

    /// The manifest is not well-formed JSON.
    #[error("manifest is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A member the pipeline reads has the wrong shape.
    #[error("manifest member '{member}' {reason}")]
    Member {
        /// Name of the offending member.
        member: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

/// A loaded project manifest.
///
/// Only the members the pipeline consumes are surfaced as typed fields;
/// [`Manifest::document`] exposes the complete document for the
/// copy-and-rewrite step.
#[derive(Debug, Clone)]
pub struct Manifest {
    document: Value,
    name: Option<String>,
    webroot: Option<String>,
    commands: Vec<(String, String)>,
    pack_exclude: Vec<String>,
}

impl Manifest {
    /// Load and parse a manifest from the given file path.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::NotFound`] if the file does not exist, and
    /// the corresponding variant if it cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        if !path.is_file() {
            return Err(ManifestError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse a manifest from its JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a JSON object or if one of the
    /// consumed members (`packExclude`, `webroot`, `commands`, `name`) has
    /// the wrong shape.
    pub fn parse(text: &str) -> Result<Self, ManifestError> {
        let document: Value = serde_json::from_str(text)?;
        let Some(object) = document.as_object() else {
            return Err(ManifestError::Member {
                member: "root",
                reason: "must be a JSON object".to_string(),
            });
        };

        let name = match object.get("name") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                return Err(ManifestError::Member {
                    member: "name",
                    reason: "must be a string".to_string(),
                });
            }
        };

        let webroot = match object.get("webroot") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
            Some(Value::String(_)) => None,
            Some(_) => {
                return Err(ManifestError::Member {
                    member: "webroot",
                    reason: "must be a string".to_string(),
                });
            }
        };

        // `packExclude` accepts a single pattern string or an array of them.
        let pack_exclude = match object.get("packExclude") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::String(s)) => vec![s.clone()],
            Some(Value::Array(items)) => {
                let mut patterns = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::String(s) => patterns.push(s.clone()),
                        _ => {
                            return Err(ManifestError::Member {
                                member: "packExclude",
                                reason: "entries must be strings".to_string(),
                            });
                        }
                    }
                }
                patterns
            }
            Some(_) => {
                return Err(ManifestError::Member {
                    member: "packExclude",
                    reason: "must be a string or an array of strings".to_string(),
                });
            }
        };

        let commands = match object.get("commands") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Object(map)) => {
                let mut commands = Vec::with_capacity(map.len());
                for (command, line) in map {
                    match line {
                        Value::String(s) => commands.push((command.clone(), s.clone())),
                        _ => {
                            return Err(ManifestError::Member {
                                member: "commands",
                                reason: format!("entry '{command}' must be a string"),
                            });
                        }
                    }
                }
                commands
            }
            Some(_) => {
                return Err(ManifestError::Member {
                    member: "commands",
                    reason: "must be an object of command lines".to_string(),
                });
            }
        };

        Ok(Self {
            document,
            name,
            webroot,
            commands,
            pack_exclude,
        })
    }

    /// Optional display name declared in the manifest.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The public-asset root, relative to the project root, if declared.
    pub fn webroot(&self) -> Option<&str> {
        self.webroot.as_deref()
    }

    /// Declared commands, in manifest order.
    pub fn commands(&self) -> &[(String, String)] {
        &self.commands
    }

    /// `packExclude` patterns, in manifest order.
    pub fn pack_exclude(&self) -> &[String] {
        &self.pack_exclude
    }

    /// The complete parsed document.
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// A copy of the document with the `webroot` member replaced.
    ///
    /// Used when relocating the manifest into the application tree: the
    /// reference must point back at the produced public-tree directory
    /// regardless of what the author originally wrote.
    pub fn document_with_webroot(&self, webroot: &str) -> Value {
        let mut document = self.document.clone();
        if let Some(object) = document.as_object_mut() {
            object.insert("webroot".to_string(), Value::String(webroot.to_string()));
        }
        document
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_consumed_members() {
        let manifest = Manifest::parse(
            r#"{
                "name": "site",
                "webroot": "public",
                "commands": { "web": "server --port 5000", "worker": "queue" },
                "packExclude": ["Data/Backup/**", "*.user"],
                "dependencies": { "left-pad": "1.0.0" }
            }"#,
        )
        .unwrap();

        assert_eq!(manifest.name(), Some("site"));
        assert_eq!(manifest.webroot(), Some("public"));
        assert_eq!(manifest.pack_exclude(), ["Data/Backup/**", "*.user"]);
        assert_eq!(
            manifest.commands(),
            [
                ("web".to_string(), "server --port 5000".to_string()),
                ("worker".to_string(), "queue".to_string()),
            ]
        );
    }

    #[test]
    fn pack_exclude_accepts_a_single_string() {
        let manifest = Manifest::parse(r#"{ "packExclude": "scratch/**" }"#).unwrap();
        assert_eq!(manifest.pack_exclude(), ["scratch/**"]);
    }

    #[test]
    fn missing_members_default_to_empty() {
        let manifest = Manifest::parse("{}").unwrap();
        assert_eq!(manifest.name(), None);
        assert_eq!(manifest.webroot(), None);
        assert!(manifest.commands().is_empty());
        assert!(manifest.pack_exclude().is_empty());
    }

    #[test]
    fn wrong_shapes_are_named() {
        let err = Manifest::parse(r#"{ "packExclude": 42 }"#).unwrap_err();
        assert!(matches!(err, ManifestError::Member { member: "packExclude", .. }));

        let err = Manifest::parse(r#"{ "commands": ["web"] }"#).unwrap_err();
        assert!(matches!(err, ManifestError::Member { member: "commands", .. }));

        let err = Manifest::parse("[]").unwrap_err();
        assert!(matches!(err, ManifestError::Member { member: "root", .. }));
    }

    #[test]
    fn webroot_rewrite_replaces_only_that_member() {
        let manifest = Manifest::parse(
            r#"{ "webroot": "public", "commands": { "web": "server" }, "extra": true }"#,
        )
        .unwrap();
        let rewritten = manifest.document_with_webroot("../../../wwwroot");

        assert_eq!(rewritten["webroot"], "../../../wwwroot");
        assert_eq!(rewritten["extra"], true);
        assert_eq!(rewritten["commands"]["web"], "server");
    }

    #[test]
    fn webroot_rewrite_inserts_when_absent() {
        let manifest = Manifest::parse(r"{}").unwrap();
        let rewritten = manifest.document_with_webroot("../../../static");
        assert_eq!(rewritten["webroot"], "../../../static");
    }

    #[test]
    fn load_reports_a_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Manifest::load(&dir.path().join(MANIFEST_FILE)).unwrap_err();
        assert!(matches!(err, ManifestError::NotFound(_)));
    }
}
