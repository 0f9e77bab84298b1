//! Validation of module manifests contributed from outside the catalog.
//!
//! Nothing from an external manifest document is used until it has passed
//! [`validate_manifest`].

use super::{Contributions, ModuleKey, ModuleManifest, PlatformGated};
use crate::constants::PRIORITY_RANGE;
use crate::error::{Error, Result};
use log::debug;
use serde::Deserialize;
use std::path::Path;

/// A manifest document that passed validation.
#[derive(Debug, Clone, Deserialize)]
pub struct ManifestDocument {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub requires: Vec<String>,
    #[serde(default, alias = "templateDir")]
    pub template_dir: Option<String>,
    #[serde(default)]
    pub priority: Option<u8>,
    /// Restricts the module to projects targeting one of these platforms.
    #[serde(default)]
    pub platforms: Vec<String>,
    #[serde(default)]
    pub defaults: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub contributions: Contributions,
}

impl ManifestDocument {
    /// Converts the document into a registrable manifest.
    ///
    /// A relative `template_dir` is taken relative to `base_dir`; a missing one
    /// means `base_dir` itself.
    pub fn into_manifest(self, base_dir: &Path) -> ModuleManifest {
        let template_dir = match &self.template_dir {
            Some(dir) => base_dir.join(dir),
            None => base_dir.to_path_buf(),
        };

        let mut manifest = ModuleManifest::new(self.id.clone(), self.name)
            .with_description(self.description)
            .with_requires(self.requires)
            .with_template_dir(template_dir)
            .with_defaults(self.defaults)
            .with_contributions(self.contributions);

        if let Some(priority) = self.priority {
            manifest = manifest.with_priority(priority);
        }
        if !self.platforms.is_empty() {
            manifest = manifest.with_enablement(PlatformGated {
                key: ModuleKey(self.id),
                platforms: self.platforms,
            });
        }
        manifest
    }
}

fn invalid(source: &str, field: &str, reason: &str) -> Error {
    Error::InvalidManifest {
        source_label: source.to_string(),
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

/// Checks an untrusted manifest value and deserializes it.
///
/// # Arguments
/// * `value` - The raw manifest document
/// * `source` - Human-readable origin used in error messages
///
/// # Errors
/// * `Error::InvalidManifest` naming `source` and the first violated field
pub fn validate_manifest(value: serde_json::Value, source: &str) -> Result<ManifestDocument> {
    let record = value.as_object().ok_or_else(|| invalid(source, "<root>", "must be a mapping"))?;

    match record.get("id") {
        None => return Err(invalid(source, "id", "is missing")),
        Some(serde_json::Value::String(id)) if id.trim().is_empty() => {
            return Err(invalid(source, "id", "must not be empty"))
        }
        Some(serde_json::Value::String(_)) => {}
        Some(_) => return Err(invalid(source, "id", "must be a string")),
    }

    match record.get("name") {
        None | Some(serde_json::Value::Null) => return Err(invalid(source, "name", "is missing")),
        Some(serde_json::Value::String(_)) => {}
        Some(_) => return Err(invalid(source, "name", "must be a string")),
    }

    if let Some(requires) = record.get("requires") {
        let items =
            requires.as_array().ok_or_else(|| invalid(source, "requires", "must be a sequence"))?;
        if items.iter().any(|item| !item.is_string()) {
            return Err(invalid(source, "requires", "must only contain module IDs"));
        }
    }

    for field in ["template_dir", "templateDir"] {
        match record.get(field) {
            None => {}
            Some(serde_json::Value::String(dir)) if !dir.trim().is_empty() => {}
            Some(serde_json::Value::String(_)) => {
                return Err(invalid(source, field, "must not be empty"))
            }
            Some(_) => return Err(invalid(source, field, "must be a path string")),
        }
    }

    if let Some(priority) = record.get("priority") {
        let in_range = priority.as_i64().is_some_and(|p| PRIORITY_RANGE.contains(&p));
        if !in_range {
            return Err(invalid(
                source,
                "priority",
                &format!(
                    "must be an integer between {} and {}",
                    PRIORITY_RANGE.start(),
                    PRIORITY_RANGE.end()
                ),
            ));
        }
    }

    serde_json::from_value(value).map_err(|e| invalid(source, "<document>", &e.to_string()))
}

/// Structural checks applied to every manifest on registration.
///
/// Returns the offending field and the reason on failure.
pub fn check_structure(manifest: &ModuleManifest) -> std::result::Result<(), (&'static str, String)> {
    if manifest.id.trim().is_empty() {
        return Err(("id", "must not be empty".to_string()));
    }
    if manifest.name.trim().is_empty() {
        return Err(("name", "must not be empty".to_string()));
    }
    if manifest.template_dir.as_os_str().is_empty() {
        return Err(("template_dir", "must not be empty".to_string()));
    }
    if let Some(priority) = manifest.priority {
        if !PRIORITY_RANGE.contains(&i64::from(priority)) {
            return Err(("priority", format!("{priority} is out of range")));
        }
    }
    Ok(())
}

/// Loads an external manifest file (JSON or YAML) and validates it.
pub fn load_manifest_file<P: AsRef<Path>>(path: P) -> Result<ModuleManifest> {
    let path = path.as_ref();
    let source = path.display().to_string();
    debug!("Loading external module manifest {source}");

    let content = std::fs::read_to_string(path)?;
    let value: serde_json::Value = serde_yaml::from_str(&content)
        .map_err(|e| invalid(&source, "<document>", &format!("is not valid YAML or JSON: {e}")))?;

    let document = validate_manifest(value, &source)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
    let base_dir = if base_dir.is_absolute() {
        base_dir.to_path_buf()
    } else {
        std::env::current_dir()?.join(base_dir)
    };
    Ok(document.into_manifest(&base_dir))
}
