//! Command-line interface implementation for Stencil.
//! Provides argument parsing and help text formatting using clap.

use crate::constants::DEFAULT_TEMPLATE_ROOT;
use crate::writer::OverwriteMode;
use clap::{error::ErrorKind, Args as ClapArgs, CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments structure for Stencil.
#[derive(Parser, Debug)]
#[command(author, version, about = "Stencil: modular application scaffolding tool", long_about = None)]
pub struct Args {
    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a project from a configuration file
    New(NewArgs),
    /// List the modules available for selection
    Modules(RegistryArgs),
}

/// Where modules come from.
#[derive(ClapArgs, Debug, Clone)]
pub struct RegistryArgs {
    /// Directory holding the `core` and `modules/<id>` template trees
    #[arg(long, value_name = "DIR", default_value = DEFAULT_TEMPLATE_ROOT)]
    pub templates: PathBuf,

    /// Additional module manifest (JSON or YAML); may be repeated
    #[arg(long = "module", value_name = "FILE")]
    pub module_manifests: Vec<PathBuf>,
}

#[derive(ClapArgs, Debug)]
pub struct NewArgs {
    /// Directory where the generated project will be written
    #[arg(value_name = "OUTPUT_DIR")]
    pub output_dir: PathBuf,

    /// Project configuration file; defaults to stencil.{json,yml,yaml} in the
    /// current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub registry: RegistryArgs,

    /// Enable a module in addition to the configuration; may be repeated
    #[arg(long = "with", value_name = "ID")]
    pub with: Vec<String>,

    /// Disable a module from the configuration; may be repeated
    #[arg(long = "without", value_name = "ID")]
    pub without: Vec<String>,

    /// How to treat files that already exist in the output directory
    #[arg(long, value_enum, default_value_t = OverwriteMode::Ask)]
    pub overwrite: OverwriteMode,

    /// Report what would be written without touching the disk
    #[arg(long)]
    pub dry_run: bool,

    /// Skip formatting, dependency fetch and code generation
    #[arg(long)]
    pub skip_post_process: bool,
}

/// Parses command line arguments and returns the Args structure.
///
/// # Exits
/// * With status code 1 if required arguments are missing, after printing help
/// * With clap's default error handling for other argument errors
pub fn get_args() -> Args {
    match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            if e.kind() == ErrorKind::MissingRequiredArgument
                || e.kind() == ErrorKind::MissingSubcommand
            {
                let _ = Args::command()
                    .help_template(
                        r#"{about-section}
{usage-heading} {usage}

{all-args}
{after-help}
"#,
                    )
                    .print_help();
                std::process::exit(1);
            } else {
                e.exit();
            }
        }
    }
}
