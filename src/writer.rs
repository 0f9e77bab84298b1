//! Conflict-aware writing of generated files.

use crate::error::{Error, Result};
use crate::processor::{is_rendered_path_valid, GeneratedFile};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// What to do when a target file already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OverwriteMode {
    /// Ask the conflict resolver; report a conflict if there is none.
    #[default]
    Ask,
    Always,
    Never,
}

/// Decides whether an existing file may be overwritten.
pub trait ConflictResolver {
    /// # Arguments
    /// * `path` - Absolute path of the existing file
    fn resolve(&self, path: &Path) -> Result<bool>;
}

impl<F> ConflictResolver for F
where
    F: Fn(&Path) -> bool,
{
    fn resolve(&self, path: &Path) -> Result<bool> {
        Ok(self(path))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    Skipped,
    Conflict,
}

/// Per-outcome lists of relative paths, in write order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteReport {
    pub written: Vec<String>,
    pub skipped: Vec<String>,
    pub conflicts: Vec<String>,
}

impl WriteReport {
    fn record(&mut self, outcome: WriteOutcome, relative_path: &str) {
        let list = match outcome {
            WriteOutcome::Written => &mut self.written,
            WriteOutcome::Skipped => &mut self.skipped,
            WriteOutcome::Conflict => &mut self.conflicts,
        };
        list.push(relative_path.to_string());
    }
}

/// Applies generated files to an output directory.
pub struct FileWriter<'a> {
    output_root: PathBuf,
    mode: OverwriteMode,
    dry_run: bool,
    resolver: Option<&'a dyn ConflictResolver>,
}

impl<'a> FileWriter<'a> {
    /// Creates a writer rooted at `output_root`.
    ///
    /// A relative `output_root` is taken relative to the current directory so
    /// that conflict resolvers always see absolute paths.
    pub fn new<P: AsRef<Path>>(output_root: P, mode: OverwriteMode) -> Self {
        let output_root = output_root.as_ref();
        let output_root = if output_root.is_absolute() {
            output_root.to_path_buf()
        } else {
            std::env::current_dir().unwrap_or_default().join(output_root)
        };
        Self { output_root, mode, dry_run: false, resolver: None }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_resolver(mut self, resolver: Option<&'a dyn ConflictResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    fn target_path(&self, relative_path: &str) -> Result<PathBuf> {
        if !is_rendered_path_valid(relative_path) {
            return Err(Error::InvalidOutputPath { path: relative_path.to_string() });
        }
        Ok(relative_path.split('/').fold(self.output_root.clone(), |path, part| path.join(part)))
    }

    fn write_contents(target: &Path, content: &[u8]) -> Result<()> {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(target, content)?;
        Ok(())
    }

    /// Writes a single file according to the overwrite mode.
    pub fn write(&self, file: &GeneratedFile) -> Result<WriteOutcome> {
        let target = self.target_path(&file.relative_path)?;

        if self.dry_run {
            debug!("[dry-run] {}", target.display());
            return Ok(WriteOutcome::Written);
        }

        if !target.exists() {
            debug!("Writing new file {}", target.display());
            Self::write_contents(&target, &file.content)?;
            return Ok(WriteOutcome::Written);
        }

        let overwrite = match self.mode {
            OverwriteMode::Always => true,
            OverwriteMode::Never => false,
            OverwriteMode::Ask => match self.resolver {
                Some(resolver) => resolver.resolve(&target)?,
                None => {
                    debug!("Conflict on {} (no resolver)", target.display());
                    return Ok(WriteOutcome::Conflict);
                }
            },
        };

        if overwrite {
            debug!("Overwriting {}", target.display());
            Self::write_contents(&target, &file.content)?;
            Ok(WriteOutcome::Written)
        } else {
            debug!("Keeping existing {}", target.display());
            Ok(WriteOutcome::Skipped)
        }
    }

    /// Writes every file; each outcome is independent of the others.
    pub fn write_all<'f, I>(&self, files: I) -> Result<WriteReport>
    where
        I: IntoIterator<Item = &'f GeneratedFile>,
    {
        let mut report = WriteReport::default();
        for file in files {
            let outcome = self.write(file)?;
            report.record(outcome, &file.relative_path);
        }
        Ok(report)
    }
}
