//! Stencil scaffolds application skeletons by composing a core template set
//! with optional feature modules. Each module contributes template files,
//! package dependencies and wiring; the engine resolves module dependencies,
//! merges version constraints and writes the result with conflict-aware
//! semantics.

/// Command-line interface module for the Stencil application
pub mod cli;

/// Merging of module dependency maps ("larger version wins")
pub mod composer;

/// Project configuration handling
/// Supports JSON and YAML formats (stencil.json, stencil.yml, stencil.yaml)
pub mod config;

/// Common constants
pub mod constants;

/// Render context built from the project configuration
pub mod context;

/// Scaffold orchestration
pub mod engine;

/// Error types and handling for the Stencil application
pub mod error;

/// Post-generation processors (format, dependency fetch, code generation)
pub mod hooks;

/// File and directory ignore patterns
/// Processes .stencilignore files to exclude specific paths
pub mod ignore;

/// Logger initialization for the binary
pub mod logger;

/// Module manifests, registry, resolution and validation
pub mod module;

/// Rendering of a single template tree into generated files
pub mod processor;

/// Interactive conflict resolution
pub mod prompt;

/// Template rendering functionality
pub mod renderer;

/// Writing generated files to disk
pub mod writer;
