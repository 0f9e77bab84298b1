//! The scaffold engine.
//! Combines resolution, rendering, dependency composition and writing into a
//! single run for one project configuration.
//!
//! When modules contribute dependencies, the rendered `pubspec.yaml` is
//! parsed and written back as YAML, so its comments and blank lines are not
//! kept. A manifest nobody contributes to is written exactly as rendered.

use crate::composer::merge_dependencies;
use crate::config::ProjectContext;
use crate::constants::{CORE_TEMPLATE_DIR, DEPENDENCY_MANIFEST, DEPENDENCY_PARTIAL};
use crate::context::TemplateContext;
use crate::error::{Error, Result};
use crate::hooks::{run_post_processors, CommandRunner, PostProcessStep};
use crate::module::{resolve, DependencyMap, ModuleManifest, ModuleRegistry};
use crate::processor::{render_tree, GeneratedFile};
use crate::renderer::TemplateRenderer;
use crate::writer::{ConflictResolver, FileWriter, OverwriteMode};
use indexmap::IndexMap;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEPENDENCY_SECTIONS: [&str; 2] = ["dependencies", "dev_dependencies"];

/// Generated files keyed by relative path, in first-production order.
pub type FileMap = IndexMap<String, GeneratedFile>;

/// Caller-controlled parameters of a run.
pub struct ScaffoldOptions<'a> {
    pub output_dir: PathBuf,
    pub overwrite: OverwriteMode,
    pub dry_run: bool,
    /// Run the external post-processors after writing (ignored in dry-run).
    pub post_process: bool,
    /// Consulted for existing files in [`OverwriteMode::Ask`].
    pub resolver: Option<&'a dyn ConflictResolver>,
}

impl ScaffoldOptions<'_> {
    pub fn new<P: Into<PathBuf>>(output_dir: P) -> Self {
        Self {
            output_dir: output_dir.into(),
            overwrite: OverwriteMode::Ask,
            dry_run: false,
            post_process: true,
            resolver: None,
        }
    }
}

/// Outcome of a run, as reported to the CLI or a test harness.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScaffoldResult {
    pub files_written: Vec<String>,
    pub files_skipped: Vec<String>,
    pub conflicts: Vec<String>,
    pub post_processors_run: Vec<String>,
    pub post_processor_errors: Vec<String>,
}

/// A dependency partial document: either `pubspec.partial.yaml` or a module's
/// own `pubspec.yaml`.
#[derive(Debug, Default, Deserialize)]
struct DependencyPartial {
    #[serde(default)]
    dependencies: DependencyMap,
    #[serde(default)]
    dev_dependencies: DependencyMap,
}

fn parse_partial(content: &str, source: &Path) -> Result<DependencyPartial> {
    if content.trim().is_empty() {
        return Ok(DependencyPartial::default());
    }
    serde_yaml::from_str(content).map_err(|e| {
        Error::ConfigError(format!("invalid dependency partial '{}': {e}", source.display()))
    })
}

/// Runtime and development dependency accumulators threaded through the
/// module loop.
#[derive(Debug, Default)]
struct Accumulated {
    dependencies: DependencyMap,
    dev_dependencies: DependencyMap,
}

impl Accumulated {
    fn absorb(&mut self, dependencies: &DependencyMap, dev_dependencies: &DependencyMap) -> Result<()> {
        merge_dependencies(&mut self.dependencies, dependencies)?;
        merge_dependencies(&mut self.dev_dependencies, dev_dependencies)
    }

    fn is_empty(&self) -> bool {
        self.dependencies.is_empty() && self.dev_dependencies.is_empty()
    }

    fn section(&self, name: &str) -> &DependencyMap {
        if name == "dependencies" {
            &self.dependencies
        } else {
            &self.dev_dependencies
        }
    }
}

/// Merges accumulated dependencies into the rendered dependency manifest.
///
/// Entries already in the manifest keep their position; new packages are
/// appended in accumulation order. The output is re-serialized, so comments
/// and blank lines of `manifest` are lost.
fn merge_into_manifest(manifest: &str, accumulated: &Accumulated) -> Result<String> {
    let mut document: serde_yaml::Value = serde_yaml::from_str(manifest)?;
    let root = document.as_mapping_mut().ok_or_else(|| {
        Error::ConfigError(format!("{DEPENDENCY_MANIFEST} is not a mapping"))
    })?;

    for section in DEPENDENCY_SECTIONS {
        let incoming = accumulated.section(section);
        if incoming.is_empty() {
            continue;
        }

        let key = serde_yaml::Value::String(section.to_string());
        let mut merged: DependencyMap = match root.get(&key) {
            None | Some(serde_yaml::Value::Null) => DependencyMap::new(),
            Some(existing) => serde_yaml::from_value(existing.clone())?,
        };
        merge_dependencies(&mut merged, incoming)?;
        root.insert(key, serde_yaml::to_value(&merged)?);
    }

    Ok(serde_yaml::to_string(&document)?)
}

fn manifest_has_dev_dependency(files: &FileMap, package: &str) -> bool {
    files
        .get(DEPENDENCY_MANIFEST)
        .and_then(GeneratedFile::text)
        .and_then(|text| serde_yaml::from_str::<DependencyPartial>(text).ok())
        .is_some_and(|manifest| manifest.dev_dependencies.contains_key(package))
}

/// Orchestrates scaffold runs against one registry and template root.
pub struct ScaffoldEngine<'a> {
    registry: &'a ModuleRegistry,
    renderer: &'a dyn TemplateRenderer,
    runner: &'a dyn CommandRunner,
    template_root: PathBuf,
}

impl<'a> ScaffoldEngine<'a> {
    /// # Arguments
    /// * `registry` - Modules available to this run
    /// * `renderer` - Template engine for paths and `.j2` files
    /// * `runner` - Executes the post-processors
    /// * `template_root` - Directory holding `core/` and `modules/<id>/`
    pub fn new<P: Into<PathBuf>>(
        registry: &'a ModuleRegistry,
        renderer: &'a dyn TemplateRenderer,
        runner: &'a dyn CommandRunner,
        template_root: P,
    ) -> Self {
        Self { registry, renderer, runner, template_root: template_root.into() }
    }

    fn module_dir(&self, manifest: &ModuleManifest) -> PathBuf {
        self.template_root.join(&manifest.template_dir)
    }

    /// Computes every output file for `project` without touching the output
    /// directory.
    ///
    /// # Errors
    /// * Configuration and dependency-cycle errors from resolution
    /// * I/O and rendering errors of any template
    /// * `Error::IncomparableVersions` from dependency composition
    pub fn render(&self, project: &ProjectContext) -> Result<FileMap> {
        project.validate()?;

        let requested = project.requested_modules();
        let resolved = resolve(self.registry, &requested)?;
        let context = TemplateContext::build(project, self.registry, &resolved).to_value()?;

        let mut files = FileMap::new();
        let core_dir = self.template_root.join(CORE_TEMPLATE_DIR);
        for file in render_tree(self.renderer, &core_dir, &context)? {
            files.insert(file.relative_path.clone(), file);
        }

        let mut accumulated = Accumulated::default();

        for manifest in &resolved.ordered {
            if manifest.always_included {
                continue;
            }
            if !manifest.is_enabled(project) {
                if !requested.contains(&manifest.id) {
                    warn!("Module '{}' is required but disabled for this project", manifest.id);
                }
                debug!("Skipping disabled module '{}'", manifest.id);
                continue;
            }

            info!("Applying module '{}'", manifest.id);
            accumulated.absorb(
                &manifest.contributions.dependencies,
                &manifest.contributions.dev_dependencies,
            )?;

            let module_dir = self.module_dir(manifest);
            if !module_dir.is_dir() {
                debug!("Module '{}' has no template tree at {}", manifest.id, module_dir.display());
                continue;
            }

            let partial_path = module_dir.join(DEPENDENCY_PARTIAL);
            if partial_path.is_file() {
                let partial = parse_partial(&std::fs::read_to_string(&partial_path)?, &partial_path)?;
                accumulated.absorb(&partial.dependencies, &partial.dev_dependencies)?;
            }

            for file in render_tree(self.renderer, &module_dir, &context)? {
                if file.relative_path == DEPENDENCY_MANIFEST && files.contains_key(DEPENDENCY_MANIFEST) {
                    let text = file.text().ok_or_else(|| {
                        Error::TemplateError(format!("{DEPENDENCY_MANIFEST} is not UTF-8"))
                    })?;
                    let partial = parse_partial(text, &file.template_source)?;
                    accumulated.absorb(&partial.dependencies, &partial.dev_dependencies)?;
                    continue;
                }
                if files.contains_key(&file.relative_path) {
                    debug!("Module '{}' overrides {}", manifest.id, file.relative_path);
                }
                files.insert(file.relative_path.clone(), file);
            }
        }

        if !accumulated.is_empty() {
            let manifest = files.get_mut(DEPENDENCY_MANIFEST).ok_or_else(|| {
                Error::ConfigError(format!(
                    "modules contribute dependencies but the core templates produce no {DEPENDENCY_MANIFEST}"
                ))
            })?;
            let text = manifest.text().ok_or_else(|| {
                Error::TemplateError(format!("{DEPENDENCY_MANIFEST} is not UTF-8"))
            })?;
            manifest.content = merge_into_manifest(text, &accumulated)?.into_bytes();
        }

        Ok(files)
    }

    /// Runs the whole scaffold for `project`.
    ///
    /// # Flow
    /// 1. Resolves the module selection and builds the render context
    /// 2. Renders core and module templates, composing dependencies
    /// 3. Writes the files under the overwrite policy
    /// 4. Runs the post-processors (outside dry-run), recording failures
    pub fn run(&self, project: &ProjectContext, options: &ScaffoldOptions<'_>) -> Result<ScaffoldResult> {
        let files = self.render(project)?;

        let writer = FileWriter::new(&options.output_dir, options.overwrite)
            .dry_run(options.dry_run)
            .with_resolver(options.resolver);
        let report = writer.write_all(files.values())?;

        let mut result = ScaffoldResult {
            files_written: report.written,
            files_skipped: report.skipped,
            conflicts: report.conflicts,
            ..ScaffoldResult::default()
        };

        if !options.dry_run && options.post_process {
            let steps: Vec<PostProcessStep> = PostProcessStep::ORDER
                .into_iter()
                .filter(|step| {
                    *step != PostProcessStep::CodeGeneration
                        || manifest_has_dev_dependency(&files, "build_runner")
                })
                .collect();
            let post = run_post_processors(self.runner, writer.output_root(), &steps);
            result.post_processors_run = post.run;
            result.post_processor_errors = post.errors;
        }

        info!(
            "Scaffold finished: {} written, {} skipped, {} conflicts",
            result.files_written.len(),
            result.files_skipped.len(),
            result.conflicts.len()
        );
        Ok(result)
    }
}
