//! File and directory ignore pattern handling for template trees.
//! Processes .stencilignore files to exclude specific paths from scaffolding,
//! similar to .gitignore functionality.

use crate::constants::{DEPENDENCY_PARTIAL, IGNORE_FILE};
use crate::error::{Error, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use log::debug;
use std::{fs::read_to_string, path::Path};

/// Patterns ignored in every template tree, even without a .stencilignore file.
pub const DEFAULT_IGNORE_PATTERNS: [&str; 5] =
    ["**/.DS_Store", "**/Thumbs.db", "**/*.swp", IGNORE_FILE, DEPENDENCY_PARTIAL];

fn add_pattern(builder: &mut GlobSetBuilder, pattern: &str) -> Result<()> {
    let glob = Glob::new(pattern)
        .map_err(|e| Error::IgnoreError(format!("invalid pattern '{pattern}': {e}")))?;
    builder.add(glob);
    Ok(())
}

/// Reads the .stencilignore file at the root of `template_dir` and combines it
/// with [`DEFAULT_IGNORE_PATTERNS`].
///
/// # Returns
/// * `Result<GlobSet>` - Set of compiled glob patterns matched against paths
///   relative to `template_dir`
///
/// # Notes
/// - A missing .stencilignore file only yields the defaults
/// - Blank lines and lines starting with `#` are skipped
///
/// # Example
/// ```ignore
/// # Contents of .stencilignore:
/// *.orig
/// build/**
/// ```
pub fn parse_ignore_file<P: AsRef<Path>>(template_dir: P) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in DEFAULT_IGNORE_PATTERNS {
        add_pattern(&mut builder, pattern)?;
    }

    let ignore_path = template_dir.as_ref().join(IGNORE_FILE);
    if let Ok(contents) = read_to_string(&ignore_path) {
        for line in contents.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            add_pattern(&mut builder, line)?;
        }
    } else {
        debug!("{IGNORE_FILE} does not exist in {}", template_dir.as_ref().display());
    }

    builder.build().map_err(|e| Error::IgnoreError(format!("{IGNORE_FILE} loading failed: {e}")))
}
