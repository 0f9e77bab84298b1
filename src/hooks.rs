//! Post-generation processing.
//! Runs the external toolchain (formatter, dependency fetch, code generation)
//! inside the generated project. A missing or failing tool is never fatal.

use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::Result;
use log::{debug, warn};

/// The fixed post-processing steps, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostProcessStep {
    Format,
    FetchDependencies,
    CodeGeneration,
}

impl PostProcessStep {
    pub const ORDER: [PostProcessStep; 3] =
        [PostProcessStep::Format, PostProcessStep::FetchDependencies, PostProcessStep::CodeGeneration];

    pub fn name(&self) -> &'static str {
        match self {
            PostProcessStep::Format => "format",
            PostProcessStep::FetchDependencies => "fetch-dependencies",
            PostProcessStep::CodeGeneration => "code-generation",
        }
    }

    /// Program and arguments for this step.
    pub fn command(&self) -> (&'static str, &'static [&'static str]) {
        match self {
            PostProcessStep::Format => ("dart", &["format", "."]),
            PostProcessStep::FetchDependencies => ("flutter", &["pub", "get"]),
            PostProcessStep::CodeGeneration => {
                ("dart", &["run", "build_runner", "build", "--delete-conflicting-outputs"])
            }
        }
    }
}

/// Exit status of a finished command; `None` when it was killed by a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandStatus {
    pub exit_code: Option<i32>,
}

impl CommandStatus {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

impl std::fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.exit_code {
            Some(code) => write!(f, "exit code {code}"),
            None => write!(f, "a signal"),
        }
    }
}

/// Runs one external command to completion inside `working_dir`.
pub trait CommandRunner {
    fn run(&self, program: &str, args: &[&str], working_dir: &Path) -> Result<CommandStatus>;
}

/// [`CommandRunner`] spawning real subprocesses.
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&self, program: &str, args: &[&str], working_dir: &Path) -> Result<CommandStatus> {
        let mut child = Command::new(program)
            .args(args)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()?;

        let status = child.wait()?;
        Ok(CommandStatus { exit_code: status.code() })
    }
}

/// Names of the steps that succeeded and messages for those that failed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PostProcessReport {
    pub run: Vec<String>,
    pub errors: Vec<String>,
}

/// Runs `steps` in order in `project_dir`, recording each failure instead of
/// returning it.
pub fn run_post_processors(
    runner: &dyn CommandRunner,
    project_dir: &Path,
    steps: &[PostProcessStep],
) -> PostProcessReport {
    let mut report = PostProcessReport::default();

    for step in steps {
        let (program, args) = step.command();
        debug!("Running post-processor '{}': {} {}", step.name(), program, args.join(" "));

        match runner.run(program, args, project_dir) {
            Ok(status) if status.success() => report.run.push(step.name().to_string()),
            Ok(status) => {
                warn!("Post-processor '{}' failed with {}", step.name(), status);
                report.errors.push(format!("{}: failed with {}", step.name(), status));
            }
            Err(e) => {
                warn!("Post-processor '{}' could not run: {}", step.name(), e);
                report.errors.push(format!("{}: {}", step.name(), e));
            }
        }
    }

    report
}
