//! Interactive conflict resolution for `ask` overwrite mode.

use crate::error::Result;
use crate::writer::ConflictResolver;
use dialoguer::Confirm;
use std::path::Path;

/// Asks on the terminal before overwriting an existing file.
pub struct DialoguerPrompter {
    /// Answer used when the user just presses enter.
    default: bool,
}

impl DialoguerPrompter {
    pub fn new() -> Self {
        Self { default: false }
    }
}

impl Default for DialoguerPrompter {
    fn default() -> Self {
        DialoguerPrompter::new()
    }
}

impl ConflictResolver for DialoguerPrompter {
    fn resolve(&self, path: &Path) -> Result<bool> {
        let answer = Confirm::new()
            .with_prompt(format!("File '{}' already exists. Overwrite?", path.display()))
            .default(self.default)
            .interact()?;
        Ok(answer)
    }
}
