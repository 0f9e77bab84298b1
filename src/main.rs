//! Stencil's main application entry point.
//! Handles command-line argument parsing and wires the registry, renderer,
//! conflict prompt and post-processors into one scaffold run.

use std::io::IsTerminal;

use stencil::{
    cli::{get_args, Commands, NewArgs, RegistryArgs},
    config::{find_project_config, load_project_config},
    engine::{ScaffoldEngine, ScaffoldOptions, ScaffoldResult},
    error::{default_error_handler, Result},
    hooks::ProcessRunner,
    logger::init_logger,
    module::{validator::load_manifest_file, ModuleRegistry},
    prompt::DialoguerPrompter,
    renderer::MiniJinjaRenderer,
    writer::{ConflictResolver, OverwriteMode},
};

/// Main application entry point.
fn main() {
    let args = get_args();
    init_logger(args.verbose);

    let result = match args.command {
        Commands::New(new_args) => run_new(new_args),
        Commands::Modules(registry_args) => run_modules(&registry_args),
    };

    if let Err(err) = result {
        default_error_handler(err);
    }
}

/// Builds the registry from the catalog plus any external manifests.
fn load_registry(args: &RegistryArgs) -> Result<ModuleRegistry> {
    let mut registry = ModuleRegistry::with_catalog()?;
    for path in &args.module_manifests {
        registry.register(load_manifest_file(path)?)?;
    }
    Ok(registry)
}

fn run_modules(args: &RegistryArgs) -> Result<()> {
    let registry = load_registry(args)?;
    for manifest in registry.all().filter(|m| !m.always_included) {
        let requires = if manifest.requires.is_empty() {
            String::new()
        } else {
            format!(" (requires: {})", manifest.requires.join(", "))
        };
        let priority = manifest.priority.map(|p| format!(" [priority {p}]")).unwrap_or_default();
        println!("{:<14} {}{}{}", manifest.id, manifest.description, requires, priority);
    }
    Ok(())
}

/// Generates a project.
///
/// # Flow
/// 1. Loads the module registry and project configuration
/// 2. Applies `--with` / `--without` overrides
/// 3. Runs the scaffold engine
/// 4. Prints the outcome
fn run_new(args: NewArgs) -> Result<()> {
    let registry = load_registry(&args.registry)?;

    let cwd = std::env::current_dir()?;
    let config_path = find_project_config(args.config.as_ref(), &cwd)?;
    let mut project = load_project_config(&config_path)?;
    for id in &args.with {
        project.enable_module(id);
    }
    for id in &args.without {
        project.disable_module(id);
    }

    let renderer = MiniJinjaRenderer::new();
    let runner = ProcessRunner;
    let engine = ScaffoldEngine::new(&registry, &renderer, &runner, &args.registry.templates);

    let prompter = DialoguerPrompter::new();
    let resolver: Option<&dyn ConflictResolver> =
        if args.overwrite == OverwriteMode::Ask && std::io::stdin().is_terminal() {
            Some(&prompter)
        } else {
            None
        };

    let options = ScaffoldOptions {
        output_dir: args.output_dir.clone(),
        overwrite: args.overwrite,
        dry_run: args.dry_run,
        post_process: !args.skip_post_process,
        resolver,
    };

    let result = engine.run(&project, &options)?;
    print_summary(&result, args.dry_run);
    println!("Project '{}' generated in {}.", project.name, args.output_dir.display());
    Ok(())
}

fn print_summary(result: &ScaffoldResult, dry_run: bool) {
    let written_label = if dry_run { "Would write" } else { "Written" };
    for path in &result.files_written {
        println!("{written_label}: '{path}'");
    }
    for path in &result.files_skipped {
        println!("Skipped: '{path}'");
    }
    for path in &result.conflicts {
        println!("Conflict: '{path}' exists (re-run with --overwrite always|never)");
    }
    for name in &result.post_processors_run {
        println!("Post-processor ran: {name}");
    }
    for error in &result.post_processor_errors {
        eprintln!("Post-processor skipped: {error}");
    }
}
