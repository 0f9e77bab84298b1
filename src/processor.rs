//! Template tree processing.
//! Turns one template tree (core or a module) into in-memory generated files:
//! paths are rendered, `.j2` files are rendered and lose their suffix, all
//! other files are copied verbatim.

use crate::constants::TEMPLATE_SUFFIX;
use crate::error::{Error, Result};
use crate::ignore::parse_ignore_file;
use crate::renderer::TemplateRenderer;
use log::debug;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// One output file, produced in memory and consumed by the file writer.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedFile {
    /// Slash-separated path relative to the output directory.
    pub relative_path: String,
    pub content: Vec<u8>,
    /// Template file this output came from.
    pub template_source: PathBuf,
}

impl GeneratedFile {
    /// The content as text, if it is valid UTF-8.
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.content).ok()
    }
}

/// Checks whether a file name carries the template suffix (`main.dart.j2`).
pub fn is_template_file(filename: &str) -> bool {
    filename
        .strip_suffix(TEMPLATE_SUFFIX)
        .and_then(|rest| rest.strip_suffix('.'))
        .is_some_and(|stem| !stem.is_empty())
}

/// Returns the output path for a rendered relative path and whether the file
/// has to be rendered.
pub fn resolve_target_path(rendered_path: &str) -> (String, bool) {
    let filename = rendered_path.rsplit('/').next().unwrap_or(rendered_path);
    if is_template_file(filename) {
        let target = &rendered_path[..rendered_path.len() - TEMPLATE_SUFFIX.len() - 1];
        (target.to_string(), true)
    } else {
        (rendered_path.to_string(), false)
    }
}

/// A rendered path is usable if it is relative, has no empty segments and
/// never climbs out of the output directory.
pub fn is_rendered_path_valid(path: &str) -> bool {
    !path.is_empty()
        && !path.starts_with('/')
        && !path.contains("//")
        && !path.split('/').any(|segment| segment == ".." || segment.trim().is_empty())
}

/// Joins the components of `path` with `/` regardless of platform.
fn to_slash_path(path: &Path) -> Result<String> {
    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str().ok_or_else(|| {
                Error::TemplateError(format!("non UTF-8 path '{}'", path.display()))
            })?),
            _ => return Err(Error::TemplateError(format!("unexpected path '{}'", path.display()))),
        }
    }
    Ok(parts.join("/"))
}

/// Renders every file of the template tree rooted at `template_dir`.
///
/// # Arguments
/// * `renderer` - Template engine used for paths and `.j2` files
/// * `template_dir` - Root of the template tree
/// * `context` - Render context
///
/// # Returns
/// * `Result<Vec<GeneratedFile>>` - Files in walk order (sorted by name)
///
/// # Errors
/// * `Error::TemplateError` if the tree does not exist or a path renders to
///   something outside the output directory
/// * Any I/O or rendering error for an individual file
pub fn render_tree(
    renderer: &dyn TemplateRenderer,
    template_dir: &Path,
    context: &serde_json::Value,
) -> Result<Vec<GeneratedFile>> {
    if !template_dir.is_dir() {
        return Err(Error::TemplateError(format!(
            "template directory '{}' does not exist",
            template_dir.display()
        )));
    }

    debug!("Processing template tree {}", template_dir.display());
    let ignored = parse_ignore_file(template_dir)?;
    let mut files = Vec::new();

    for entry in WalkDir::new(template_dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let source = entry.path();
        let relative = source
            .strip_prefix(template_dir)
            .map_err(|e| Error::TemplateError(e.to_string()))?;
        let relative = to_slash_path(relative)?;

        if ignored.is_match(&relative) {
            debug!("Skipping {relative} (ignored)");
            continue;
        }

        let rendered_path = renderer.render(&relative, context)?;
        let rendered_path = rendered_path.trim();
        // A path that renders to nothing marks a conditionally excluded file.
        if rendered_path.is_empty() {
            debug!("Skipping {relative} (path rendered empty)");
            continue;
        }
        if !is_rendered_path_valid(rendered_path) {
            return Err(Error::TemplateError(format!(
                "'{relative}' renders to the invalid path '{rendered_path}'"
            )));
        }

        let (relative_path, is_template) = resolve_target_path(rendered_path);
        let content = if is_template {
            debug!("Rendering {relative} -> {relative_path}");
            renderer.render_file(source, context)?.into_bytes()
        } else {
            debug!("Copying {relative} -> {relative_path}");
            std::fs::read(source)?
        };

        files.push(GeneratedFile { relative_path, content, template_source: source.to_path_buf() });
    }

    Ok(files)
}
