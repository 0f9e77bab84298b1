//! Common constants used throughout the Stencil application.

/// Supported project configuration file names
pub const CONFIG_FILES: [&str; 3] = ["stencil.json", "stencil.yml", "stencil.yaml"];

/// Stencil's ignore file name, looked up at the root of every template tree
pub const IGNORE_FILE: &str = ".stencilignore";

/// Extension marking a file as a template to be rendered
pub const TEMPLATE_SUFFIX: &str = "j2";

/// Rendered dependency manifest produced by the core templates
pub const DEPENDENCY_MANIFEST: &str = "pubspec.yaml";

/// Per-module dependency partial, merged into [`DEPENDENCY_MANIFEST`]
pub const DEPENDENCY_PARTIAL: &str = "pubspec.partial.yaml";

/// ID of the synthetic module that is always resolved first
pub const CORE_MODULE_ID: &str = "core";

/// Directory of the core template tree, relative to the template root
pub const CORE_TEMPLATE_DIR: &str = "core";

/// Directory holding one template tree per catalog module
pub const MODULES_TEMPLATE_DIR: &str = "modules";

/// Template root used when `--templates` is not given
pub const DEFAULT_TEMPLATE_ROOT: &str = "templates";

/// Valid range of a manifest's `priority` field
pub const PRIORITY_RANGE: std::ops::RangeInclusive<i64> = 0..=100;

/// Platforms a project may target; each one becomes a flag in the render context
pub const KNOWN_PLATFORMS: [&str; 6] = ["android", "ios", "web", "macos", "windows", "linux"];
