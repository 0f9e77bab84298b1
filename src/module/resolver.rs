//! Dependency resolution for a requested module selection.

use super::{ModuleManifest, ModuleRegistry};
use crate::constants::CORE_MODULE_ID;
use crate::error::{Error, Result};
use log::debug;
use std::collections::HashSet;

/// The dependency-closed, dependency-ordered module list for one run.
#[derive(Debug)]
pub struct ResolveResult<'r> {
    /// Core first, then every resolved module after everything it requires.
    pub ordered: Vec<&'r ModuleManifest>,
}

impl ResolveResult<'_> {
    pub fn ids(&self) -> Vec<&str> {
        self.ordered.iter().map(|m| m.id.as_str()).collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ordered.iter().any(|m| m.id == id)
    }
}

struct Walk<'r> {
    registry: &'r ModuleRegistry,
    done: HashSet<&'r str>,
    path: Vec<&'r str>,
    ordered: Vec<&'r ModuleManifest>,
}

impl<'r> Walk<'r> {
    /// Emits `manifest` after all of its requirements (depth-first post-order).
    fn visit(&mut self, manifest: &'r ModuleManifest) -> Result<()> {
        let id = manifest.id.as_str();
        if self.done.contains(id) {
            return Ok(());
        }
        if let Some(start) = self.path.iter().position(|on_path| *on_path == id) {
            let mut cycle: Vec<String> = self.path[start..].iter().map(|s| s.to_string()).collect();
            cycle.push(id.to_string());
            return Err(Error::CyclicDependency { cycle });
        }

        let mut requires = Vec::with_capacity(manifest.requires.len());
        for required in &manifest.requires {
            let dependency = self.registry.get(required).ok_or_else(|| Error::UnknownModule {
                id: required.clone(),
                required_by: Some(manifest.id.clone()),
            })?;
            requires.push(dependency);
        }
        // Unconstrained siblings pulled in implicitly follow registration order.
        requires.sort_by_key(|dependency| self.registry.position(&dependency.id));

        self.path.push(id);
        for dependency in requires {
            self.visit(dependency)?;
        }
        self.path.pop();

        self.done.insert(id);
        self.ordered.push(manifest);
        Ok(())
    }
}

/// Resolves `requested` against `registry`.
///
/// # Arguments
/// * `registry` - The module table
/// * `requested` - Module IDs in request order
///
/// # Returns
/// * `Result<ResolveResult>` - Core first, then the requested modules and
///   everything they require, each after its requirements. Unconstrained
///   modules keep request order.
///
/// # Errors
/// * `Error::UnknownModule` if a requested or required ID is not registered
/// * `Error::CyclicDependency` if `requires` edges form a cycle
pub fn resolve<'r, S: AsRef<str>>(
    registry: &'r ModuleRegistry,
    requested: &[S],
) -> Result<ResolveResult<'r>> {
    let mut roots = Vec::with_capacity(requested.len() + 1);
    let core = registry.get(CORE_MODULE_ID).ok_or_else(|| Error::UnknownModule {
        id: CORE_MODULE_ID.to_string(),
        required_by: None,
    })?;
    roots.push(core);

    for id in requested {
        let id = id.as_ref();
        let manifest = registry
            .get(id)
            .ok_or_else(|| Error::UnknownModule { id: id.to_string(), required_by: None })?;
        roots.push(manifest);
    }

    let mut walk =
        Walk { registry, done: HashSet::new(), path: Vec::new(), ordered: Vec::new() };
    for manifest in roots {
        walk.visit(manifest)?;
    }

    let result = ResolveResult { ordered: walk.ordered };
    debug!("Resolved modules: {}", result.ids().join(", "));
    Ok(result)
}
