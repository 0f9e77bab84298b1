//! Feature module manifests.
//!
//! A module is an optional slice of the generated application: a template
//! tree, dependency declarations and wiring descriptors. Manifests are plain
//! immutable data; the only behaviour they carry is an [`Enablement`] rule.

use crate::config::{ModuleSetting, ProjectContext};
use crate::constants::{CORE_MODULE_ID, CORE_TEMPLATE_DIR};
use indexmap::IndexMap;
use serde::{de, Deserialize, Deserializer, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

pub mod catalog;
pub mod registry;
pub mod resolver;
pub mod validator;

pub use registry::ModuleRegistry;
pub use resolver::{resolve, ResolveResult};

/// A single dependency entry of the dependency manifest.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DependencySpec {
    /// A literal version constraint such as `^5.7.0`.
    Version(String),
    /// Anything else, e.g. `{ sdk: flutter }` or a git reference. Never
    /// version-compared.
    Structured(serde_yaml::Value),
}

impl DependencySpec {
    pub fn version<S: Into<String>>(constraint: S) -> Self {
        DependencySpec::Version(constraint.into())
    }

    pub fn as_version(&self) -> Option<&str> {
        match self {
            DependencySpec::Version(v) => Some(v),
            DependencySpec::Structured(_) => None,
        }
    }
}

/// Strings and bare numbers (`foo: 1.5`) are version constraints; mappings
/// and sequences are structured. A null or boolean entry is rejected.
impl<'de> Deserialize<'de> for DependencySpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        match serde_yaml::Value::deserialize(deserializer)? {
            serde_yaml::Value::String(version) => Ok(DependencySpec::Version(version)),
            serde_yaml::Value::Number(number) => Ok(DependencySpec::Version(number.to_string())),
            serde_yaml::Value::Null => {
                Err(de::Error::custom("dependency entry is empty; give a version constraint"))
            }
            serde_yaml::Value::Bool(flag) => {
                Err(de::Error::custom(format!("dependency entry '{flag}' is not a version")))
            }
            structured => Ok(DependencySpec::Structured(structured)),
        }
    }
}

/// Package name to constraint, in declaration order.
pub type DependencyMap = IndexMap<String, DependencySpec>;

/// A provider registered in the generated application's composition root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub name: String,
    #[serde(default)]
    pub import: Option<String>,
    /// Expression creating the provider; defaults to `<name>()` in templates.
    #[serde(default)]
    pub create: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub path: String,
    pub screen: String,
    #[serde(default)]
    pub import: Option<String>,
}

/// What a module adds to the generated project besides its template files.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contributions {
    #[serde(default)]
    pub dependencies: DependencyMap,
    #[serde(default, alias = "devDependencies")]
    pub dev_dependencies: DependencyMap,
    #[serde(default)]
    pub providers: Vec<Provider>,
    #[serde(default)]
    pub routes: Vec<Route>,
    /// Names of environment variables the module needs at run time.
    #[serde(default)]
    pub env: Vec<String>,
}

/// Decides whether a module participates in a run for a given project.
pub trait Enablement: Send + Sync {
    fn decide(&self, project: &ProjectContext) -> bool;
}

impl<F> Enablement for F
where
    F: Fn(&ProjectContext) -> bool + Send + Sync,
{
    fn decide(&self, project: &ProjectContext) -> bool {
        self(project)
    }
}

pub struct Always;

impl Enablement for Always {
    fn decide(&self, _project: &ProjectContext) -> bool {
        true
    }
}

/// Enabled unless the project configuration sets the module key to `false`.
pub struct ModuleKey(pub String);

impl Enablement for ModuleKey {
    fn decide(&self, project: &ProjectContext) -> bool {
        !matches!(project.module(&self.0), Some(ModuleSetting::Disabled))
    }
}

/// [`ModuleKey`] restricted to projects targeting at least one of `platforms`.
pub struct PlatformGated {
    pub key: ModuleKey,
    pub platforms: Vec<String>,
}

impl Enablement for PlatformGated {
    fn decide(&self, project: &ProjectContext) -> bool {
        self.key.decide(project) && self.platforms.iter().any(|p| project.targets_platform(p))
    }
}

/// Static description of one optional feature.
#[derive(Clone)]
pub struct ModuleManifest {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Modules that must be resolved before this one, without duplicates.
    pub requires: Vec<String>,
    pub template_dir: PathBuf,
    /// Settings applied underneath whatever the user configured.
    pub defaults: serde_json::Map<String, serde_json::Value>,
    pub priority: Option<u8>,
    pub always_included: bool,
    pub contributions: Contributions,
    enablement: Arc<dyn Enablement>,
}

impl std::fmt::Debug for ModuleManifest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleManifest")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("requires", &self.requires)
            .field("template_dir", &self.template_dir)
            .field("always_included", &self.always_included)
            .finish_non_exhaustive()
    }
}

impl ModuleManifest {
    /// Creates a manifest whose template tree is `modules/<id>` and which is
    /// enabled unless its key is set to `false`.
    pub fn new<I: Into<String>, N: Into<String>>(id: I, name: N) -> Self {
        let id = id.into();
        Self {
            template_dir: PathBuf::from(crate::constants::MODULES_TEMPLATE_DIR).join(&id),
            enablement: Arc::new(ModuleKey(id.clone())),
            id,
            name: name.into(),
            description: String::new(),
            requires: Vec::new(),
            defaults: serde_json::Map::new(),
            priority: None,
            always_included: false,
            contributions: Contributions::default(),
        }
    }

    /// The synthetic manifest for the core template set.
    pub fn core() -> Self {
        Self {
            description: "Application skeleton shared by every project".to_string(),
            template_dir: PathBuf::from(CORE_TEMPLATE_DIR),
            always_included: true,
            enablement: Arc::new(Always),
            ..Self::new(CORE_MODULE_ID, "Core")
        }
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the required modules; repeated IDs keep their first position.
    pub fn with_requires<I, S>(mut self, requires: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requires.clear();
        for id in requires {
            let id = id.into();
            if !self.requires.contains(&id) {
                self.requires.push(id);
            }
        }
        self
    }

    pub fn with_template_dir<P: Into<PathBuf>>(mut self, template_dir: P) -> Self {
        self.template_dir = template_dir.into();
        self
    }

    pub fn with_defaults(mut self, defaults: serde_json::Map<String, serde_json::Value>) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_contributions(mut self, contributions: Contributions) -> Self {
        self.contributions = contributions;
        self
    }

    pub fn with_enablement<E: Enablement + 'static>(mut self, enablement: E) -> Self {
        self.enablement = Arc::new(enablement);
        self
    }

    /// Whether this module takes part in a run for `project`.
    pub fn is_enabled(&self, project: &ProjectContext) -> bool {
        self.enablement.decide(project)
    }
}
