//! The render-time view of a project.

use crate::config::{ModuleSetting, ProjectContext};
use crate::constants::KNOWN_PLATFORMS;
use crate::module::{ModuleRegistry, Provider, ResolveResult, Route};
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Serialize)]
pub struct ProjectInfo {
    pub name: String,
    pub org: String,
    pub description: String,
    /// `org.name`, the application/bundle identifier.
    pub package_id: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Wiring {
    pub providers: Vec<Provider>,
    pub routes: Vec<Route>,
}

/// Everything a template can see.
///
/// Built fresh from a [`ProjectContext`] for every run. Each registered module
/// appears under `modules` either as `false` or as its settings object, which
/// always carries `enabled: true` so that `{% if modules.x %}` holds even
/// without user settings.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateContext {
    pub project: ProjectInfo,
    pub platforms: Map<String, Value>,
    pub modules: Map<String, Value>,
    pub wiring: Wiring,
    pub env: Vec<String>,
}

impl TemplateContext {
    /// Builds the context for `project` and its resolved modules.
    ///
    /// Only modules that are resolved and enabled for `project` are visible as
    /// settings objects; wiring and environment variables are collected from
    /// them in resolution order.
    pub fn build(
        project: &ProjectContext,
        registry: &ModuleRegistry,
        resolved: &ResolveResult<'_>,
    ) -> Self {
        let platforms = KNOWN_PLATFORMS
            .iter()
            .map(|p| (p.to_string(), Value::Bool(project.targets_platform(p))))
            .collect();

        let mut modules: Map<String, Value> = registry
            .all()
            .filter(|m| !m.always_included)
            .map(|m| (m.id.clone(), Value::Bool(false)))
            .collect();

        let mut wiring = Wiring::default();
        let mut env: Vec<String> = Vec::new();

        for manifest in resolved.ordered.iter().filter(|m| !m.always_included) {
            if !manifest.is_enabled(project) {
                continue;
            }

            let mut settings = manifest.defaults.clone();
            if let Some(ModuleSetting::Enabled(user)) = project.module(&manifest.id) {
                for (key, value) in user {
                    settings.insert(key.clone(), value.clone());
                }
            }
            settings.insert("enabled".to_string(), Value::Bool(true));
            modules.insert(manifest.id.clone(), Value::Object(settings));

            wiring.providers.extend(manifest.contributions.providers.iter().cloned());
            wiring.routes.extend(manifest.contributions.routes.iter().cloned());
            for name in &manifest.contributions.env {
                if !env.contains(name) {
                    env.push(name.clone());
                }
            }
        }

        Self {
            project: ProjectInfo {
                name: project.name.clone(),
                org: project.org.clone(),
                description: project.description.clone(),
                package_id: format!("{}.{}", project.org, project.name),
            },
            platforms,
            modules,
            wiring,
            env,
        }
    }

    /// The context as a JSON value, ready to hand to a renderer.
    pub fn to_value(&self) -> crate::error::Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}
