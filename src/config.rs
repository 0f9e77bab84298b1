//! Project configuration handling for Stencil.
//! Loads the declarative project description (name, organization, platforms
//! and module selection) that drives a scaffold run.

use crate::constants::{CONFIG_FILES, KNOWN_PLATFORMS};
use crate::error::{Error, Result};
use indexmap::IndexMap;
use log::debug;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Selection state of one module in the project configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum ModuleSetting {
    /// The module was explicitly turned off (`auth: false`).
    Disabled,
    /// The module is on, with its user-chosen settings (possibly empty).
    Enabled(serde_json::Map<String, serde_json::Value>),
}

impl ModuleSetting {
    pub fn is_enabled(&self) -> bool {
        matches!(self, ModuleSetting::Enabled(_))
    }
}

impl<'de> Deserialize<'de> for ModuleSetting {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Flag(bool),
            Settings(serde_json::Map<String, serde_json::Value>),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Flag(false) => ModuleSetting::Disabled,
            Raw::Flag(true) => ModuleSetting::Enabled(serde_json::Map::new()),
            Raw::Settings(settings) => ModuleSetting::Enabled(settings),
        })
    }
}

/// The project configuration a scaffold run is computed from.
///
/// The engine only ever borrows this value; it is never mutated during a run.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectContext {
    pub name: String,
    #[serde(default = "default_org")]
    pub org: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_platforms")]
    pub platforms: Vec<String>,
    /// Module selection in configuration order, which is also the request order.
    #[serde(default)]
    pub modules: IndexMap<String, ModuleSetting>,
}

fn default_org() -> String {
    "com.example".to_string()
}

fn default_platforms() -> Vec<String> {
    vec!["android".to_string(), "ios".to_string()]
}

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-z][a-z0-9_]*$").expect("valid identifier regex"))
}

fn org_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[a-zA-Z][a-zA-Z0-9_]*(\.[a-zA-Z][a-zA-Z0-9_]*)+$").expect("valid org regex")
    })
}

impl ProjectContext {
    /// Creates a configuration with defaults for everything but the name.
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            org: default_org(),
            description: String::new(),
            platforms: default_platforms(),
            modules: IndexMap::new(),
        }
    }

    /// Module IDs requested by this configuration, in configuration order.
    ///
    /// Every module that is not explicitly disabled counts as requested.
    pub fn requested_modules(&self) -> Vec<String> {
        self.modules
            .iter()
            .filter(|(_, setting)| setting.is_enabled())
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Returns the setting for `id`, if the configuration mentions it.
    pub fn module(&self, id: &str) -> Option<&ModuleSetting> {
        self.modules.get(id)
    }

    pub fn targets_platform(&self, platform: &str) -> bool {
        self.platforms.iter().any(|p| p == platform)
    }

    /// Checks identifiers that end up in generated source and package names.
    ///
    /// # Errors
    /// * `Error::ConfigError` if the project name, organization ID or a
    ///   platform is not acceptable
    pub fn validate(&self) -> Result<()> {
        if !identifier_pattern().is_match(&self.name) {
            return Err(Error::ConfigError(format!(
                "project name '{}' must be lowercase letters, digits and underscores, \
                 starting with a letter",
                self.name
            )));
        }
        if !org_pattern().is_match(&self.org) {
            return Err(Error::ConfigError(format!(
                "organization '{}' must be a reverse domain such as 'com.example'",
                self.org
            )));
        }
        if let Some(platform) =
            self.platforms.iter().find(|p| !KNOWN_PLATFORMS.contains(&p.as_str()))
        {
            return Err(Error::ConfigError(format!(
                "unknown platform '{platform}' (expected one of: {})",
                KNOWN_PLATFORMS.join(", ")
            )));
        }
        Ok(())
    }

    /// Enables `id` unless the configuration already carries settings for it.
    pub fn enable_module(&mut self, id: &str) {
        match self.modules.get(id) {
            Some(ModuleSetting::Enabled(_)) => {}
            _ => {
                self.modules.insert(id.to_string(), ModuleSetting::Enabled(serde_json::Map::new()));
            }
        }
    }

    pub fn disable_module(&mut self, id: &str) {
        self.modules.insert(id.to_string(), ModuleSetting::Disabled);
    }
}

/// Parses project configuration content.
///
/// JSON is tried first, then YAML.
///
/// # Errors
/// * `Error::ConfigError` if the content is neither valid JSON nor YAML
pub fn parse_project_config(content: &str) -> Result<ProjectContext> {
    let project = match serde_json::from_str::<ProjectContext>(content) {
        Ok(project) => project,
        Err(json_err) => serde_yaml::from_str(content).map_err(|yaml_err| {
            Error::ConfigError(format!(
                "invalid project configuration (JSON: {json_err}; YAML: {yaml_err})"
            ))
        })?,
    };
    project.validate()?;
    Ok(project)
}

/// Locates the project configuration file.
///
/// An explicit path must exist; otherwise the supported file names are tried
/// in `dir`.
pub fn find_project_config<P: AsRef<Path>>(explicit: Option<P>, dir: &Path) -> Result<PathBuf> {
    if let Some(path) = explicit {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::ConfigError(format!(
                "configuration file '{}' does not exist",
                path.display()
            )));
        }
        return Ok(path.to_path_buf());
    }

    CONFIG_FILES.iter().map(|name| dir.join(name)).find(|path| path.is_file()).ok_or_else(|| {
        Error::ConfigError(format!(
            "No configuration file found (tried: {})",
            CONFIG_FILES.join(", ")
        ))
    })
}

/// Loads and validates the project configuration stored at `path`.
pub fn load_project_config<P: AsRef<Path>>(path: P) -> Result<ProjectContext> {
    let path = path.as_ref();
    debug!("Loading project configuration from {}", path.display());
    let content = std::fs::read_to_string(path)?;
    parse_project_config(&content)
}
