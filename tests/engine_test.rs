use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use stencil::config::{parse_project_config, ProjectContext};
use stencil::engine::{ScaffoldEngine, ScaffoldOptions};
use stencil::error::{Error, Result};
use stencil::hooks::{CommandRunner, CommandStatus};
use stencil::module::{Contributions, DependencySpec, ModuleManifest, ModuleRegistry};
use stencil::renderer::MiniJinjaRenderer;
use stencil::writer::OverwriteMode;
use tempfile::TempDir;

/// Records invocations; every command succeeds unless listed in `failing`.
#[derive(Default)]
struct FakeRunner {
    calls: RefCell<Vec<String>>,
    failing: Vec<&'static str>,
}

impl CommandRunner for FakeRunner {
    fn run(&self, program: &str, args: &[&str], _working_dir: &Path) -> Result<CommandStatus> {
        let line = std::iter::once(program).chain(args.iter().copied()).collect::<Vec<_>>().join(" ");
        self.calls.borrow_mut().push(line);
        let exit_code = if self.failing.contains(&program) { 1 } else { 0 };
        Ok(CommandStatus { exit_code: Some(exit_code) })
    }
}

fn write(root: &Path, path: &str, content: &str) {
    let target = root.join(path);
    fs::create_dir_all(target.parent().unwrap()).unwrap();
    fs::write(target, content).unwrap();
}

const CORE_PUBSPEC: &str = "name: {{ project.name }}
dependencies:
  flutter:
    sdk: flutter
  dio: ^4.0.0
dev_dependencies:
  flutter_test:
    sdk: flutter
";

/// A small template root with `core` plus `api`, `auth` and `codegen` modules.
fn template_root() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "core/pubspec.yaml.j2", CORE_PUBSPEC);
    write(root, "core/README.md.j2", "# {{ project.name }}\n{% if modules.auth %}Sign-in: {{ modules.auth.provider }}\n{% endif %}");
    write(
        root,
        "core/lib/main.dart.j2",
        "{% for p in wiring.providers %}// {{ p.name }}\n{% endfor %}void main() {}\n",
    );
    write(root, "core/{% if modules.auth %}auth_banner.txt.j2{% endif %}", "auth on\n");

    write(root, "modules/api/pubspec.partial.yaml", "dependencies:\n  dio: ^5.7.0\n");
    write(root, "modules/api/lib/api.dart.j2", "const timeout = {{ modules.api.timeout_seconds }};\n");

    write(root, "modules/auth/lib/main.dart.j2", "// with auth\nvoid main() {}\n");
    write(root, "modules/auth/lib/login.dart", "class Login {}\n");

    write(root, "modules/codegen/pubspec.partial.yaml", "dev_dependencies:\n  build_runner: ^2.4.13\n");
    dir
}

fn registry() -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    let mut api = Contributions::default();
    api.dependencies.insert("retrofit".to_string(), DependencySpec::version("^4.4.1"));
    api.providers.push(serde_json::from_value(json!({"name": "ApiClient"})).unwrap());
    registry
        .register(
            ModuleManifest::new("api", "API")
                .with_defaults(json!({"timeout_seconds": 30}).as_object().unwrap().clone())
                .with_contributions(api),
        )
        .unwrap();
    registry
        .register(
            ModuleManifest::new("auth", "Auth")
                .with_requires(["api"])
                .with_defaults(json!({"provider": "email"}).as_object().unwrap().clone()),
        )
        .unwrap();
    registry.register(ModuleManifest::new("codegen", "Codegen")).unwrap();
    registry.register(ModuleManifest::new("docs", "Docs without templates")).unwrap();
    registry
}

fn project(yaml: &str) -> ProjectContext {
    parse_project_config(yaml).unwrap()
}

fn pubspec(files: &stencil::engine::FileMap) -> serde_yaml::Value {
    serde_yaml::from_str(files["pubspec.yaml"].text().unwrap()).unwrap()
}

#[test]
fn test_core_only_render() {
    let templates = template_root();
    let (registry, renderer, runner) = (registry(), MiniJinjaRenderer::new(), FakeRunner::default());
    let engine = ScaffoldEngine::new(&registry, &renderer, &runner, templates.path());

    let files = engine.render(&project("name: demo\n")).unwrap();
    let paths: Vec<&str> = files.keys().map(String::as_str).collect();
    assert_eq!(paths, vec!["README.md", "lib/main.dart", "pubspec.yaml"]);
    assert_eq!(files["README.md"].text().unwrap(), "# demo\n");
    // Without contributions the manifest is left exactly as rendered.
    assert_eq!(files["pubspec.yaml"].text().unwrap(), CORE_PUBSPEC.replace("{{ project.name }}", "demo"));
}

#[test_log::test]
fn test_module_dependencies_are_merged_into_manifest() {
    let templates = template_root();
    let (registry, renderer, runner) = (registry(), MiniJinjaRenderer::new(), FakeRunner::default());
    let engine = ScaffoldEngine::new(&registry, &renderer, &runner, templates.path());

    let files = engine.render(&project("name: demo\nmodules:\n  api: true\n")).unwrap();
    let manifest = pubspec(&files);

    assert_eq!(manifest["dependencies"]["retrofit"], "^4.4.1");
    assert_eq!(manifest["dependencies"]["dio"], "^5.7.0");
    assert_eq!(manifest["dependencies"]["flutter"]["sdk"], "flutter");
    assert_eq!(manifest["dev_dependencies"]["flutter_test"]["sdk"], "flutter");
    assert_eq!(files["lib/api.dart"].text().unwrap(), "const timeout = 30;\n");
    assert_eq!(files["lib/main.dart"].text().unwrap(), "// ApiClient\nvoid main() {}\n");
}

#[test]
fn test_larger_core_version_survives_older_module() {
    let templates = template_root();
    write(templates.path(), "core/pubspec.yaml.j2", &CORE_PUBSPEC.replace("^4.0.0", "^5.7.0"));
    write(templates.path(), "modules/api/pubspec.partial.yaml", "dependencies:\n  dio: ^4.0.0\n");
    let (registry, renderer, runner) = (registry(), MiniJinjaRenderer::new(), FakeRunner::default());
    let engine = ScaffoldEngine::new(&registry, &renderer, &runner, templates.path());

    let files = engine.render(&project("name: demo\nmodules:\n  api: true\n")).unwrap();
    assert_eq!(pubspec(&files)["dependencies"]["dio"], "^5.7.0");
}

#[test]
fn test_module_dependency_manifest_is_merged_not_replaced() {
    let templates = template_root();
    write(
        templates.path(),
        "modules/codegen/pubspec.yaml.j2",
        "name: other\ndependencies:\n  dio: ^5.7.0\n  flutter: ^1.0.0\n",
    );
    let (registry, renderer, runner) = (registry(), MiniJinjaRenderer::new(), FakeRunner::default());
    let engine = ScaffoldEngine::new(&registry, &renderer, &runner, templates.path());

    let files = engine.render(&project("name: demo\nmodules:\n  codegen: true\n")).unwrap();
    let manifest = pubspec(&files);

    assert_eq!(manifest["name"], "demo");
    assert_eq!(manifest["dependencies"]["dio"], "^5.7.0");
    assert_eq!(manifest["dependencies"]["flutter"]["sdk"], "flutter");
    assert_eq!(manifest["dev_dependencies"]["build_runner"], "^2.4.13");
    assert_eq!(files.keys().filter(|p| p.as_str() == "pubspec.yaml").count(), 1);
}

#[test]
fn test_manifest_comments_survive_without_contributions() {
    let templates = template_root();
    let commented = format!("# generated by stencil\n\n{CORE_PUBSPEC}");
    write(templates.path(), "core/pubspec.yaml.j2", &commented);
    let (registry, renderer, runner) = (registry(), MiniJinjaRenderer::new(), FakeRunner::default());
    let engine = ScaffoldEngine::new(&registry, &renderer, &runner, templates.path());

    let files = engine.render(&project("name: demo\n")).unwrap();
    assert_eq!(files["pubspec.yaml"].text().unwrap(), commented.replace("{{ project.name }}", "demo"));

    // Once modules contribute, the manifest is re-serialized: comments go,
    // every key and value stays.
    let files = engine.render(&project("name: demo\nmodules:\n  api: true\n")).unwrap();
    let text = files["pubspec.yaml"].text().unwrap();
    assert!(!text.contains("# generated by stencil"));
    let manifest = pubspec(&files);
    assert_eq!(manifest["name"], "demo");
    assert_eq!(manifest["dev_dependencies"]["flutter_test"]["sdk"], "flutter");
}

#[test]
fn test_required_modules_and_overrides() {
    let templates = template_root();
    let (registry, renderer, runner) = (registry(), MiniJinjaRenderer::new(), FakeRunner::default());
    let engine = ScaffoldEngine::new(&registry, &renderer, &runner, templates.path());

    let files = engine
        .render(&project("name: demo\nmodules:\n  auth:\n    provider: otp\n"))
        .unwrap();

    // `auth` pulls in `api`; later modules replace earlier files in place.
    assert!(files.contains_key("lib/api.dart"));
    assert_eq!(files["lib/main.dart"].text().unwrap(), "// with auth\nvoid main() {}\n");
    assert_eq!(files["lib/login.dart"].text().unwrap(), "class Login {}\n");
    assert_eq!(files["README.md"].text().unwrap(), "# demo\nSign-in: otp\n");
    assert_eq!(files["auth_banner.txt"].text().unwrap(), "auth on\n");

    let paths: Vec<&str> = files.keys().map(String::as_str).collect();
    assert_eq!(paths.iter().position(|p| *p == "lib/main.dart"), Some(1));
}

#[test]
fn test_disabled_modules_contribute_nothing() {
    let templates = template_root();
    let (registry, renderer, runner) = (registry(), MiniJinjaRenderer::new(), FakeRunner::default());
    let engine = ScaffoldEngine::new(&registry, &renderer, &runner, templates.path());

    let files = engine.render(&project("name: demo\nmodules:\n  api: false\n  auth: false\n")).unwrap();
    assert!(!files.contains_key("lib/api.dart"));
    assert!(!files.contains_key("auth_banner.txt"));
    assert!(pubspec(&files)["dependencies"].get("retrofit").is_none());
}

#[test]
fn test_required_but_disabled_module_is_skipped() {
    let templates = template_root();
    let (registry, renderer, runner) = (registry(), MiniJinjaRenderer::new(), FakeRunner::default());
    let engine = ScaffoldEngine::new(&registry, &renderer, &runner, templates.path());

    let files = engine.render(&project("name: demo\nmodules:\n  auth: true\n  api: false\n")).unwrap();
    assert!(files.contains_key("lib/login.dart"));
    assert!(!files.contains_key("lib/api.dart"));
}

#[test]
fn test_module_without_template_tree() {
    let templates = template_root();
    let (registry, renderer, runner) = (registry(), MiniJinjaRenderer::new(), FakeRunner::default());
    let engine = ScaffoldEngine::new(&registry, &renderer, &runner, templates.path());

    let files = engine.render(&project("name: demo\nmodules:\n  docs: true\n")).unwrap();
    assert_eq!(files.len(), 3);
}

#[test]
fn test_missing_core_tree_is_an_error() {
    let templates = TempDir::new().unwrap();
    let (registry, renderer, runner) = (registry(), MiniJinjaRenderer::new(), FakeRunner::default());
    let engine = ScaffoldEngine::new(&registry, &renderer, &runner, templates.path());

    assert!(engine.render(&project("name: demo\n")).is_err());
}

#[test]
fn test_unknown_module_fails_before_writing() {
    let templates = template_root();
    let output = TempDir::new().unwrap();
    let target = output.path().join("app");
    let (registry, renderer, runner) = (registry(), MiniJinjaRenderer::new(), FakeRunner::default());
    let engine = ScaffoldEngine::new(&registry, &renderer, &runner, templates.path());

    let result = engine.run(&project("name: demo\nmodules:\n  billing: true\n"), &ScaffoldOptions::new(&target));
    assert!(matches!(result, Err(Error::UnknownModule { .. })));
    assert!(!target.exists());
    assert!(runner.calls.borrow().is_empty());
}

#[test]
fn test_run_writes_expected_tree() {
    let templates = template_root();
    let output = TempDir::new().unwrap();
    let (registry, renderer, runner) = (registry(), MiniJinjaRenderer::new(), FakeRunner::default());
    let engine = ScaffoldEngine::new(&registry, &renderer, &runner, templates.path());

    let mut options = ScaffoldOptions::new(output.path());
    options.post_process = false;
    let result = engine.run(&project("name: demo\n"), &options).unwrap();
    assert_eq!(result.files_written, vec!["README.md", "lib/main.dart", "pubspec.yaml"]);

    let expected = TempDir::new().unwrap();
    write(expected.path(), "README.md", "# demo\n");
    write(expected.path(), "lib/main.dart", "void main() {}\n");
    write(expected.path(), "pubspec.yaml", &CORE_PUBSPEC.replace("{{ project.name }}", "demo"));
    assert!(!dir_diff::is_different(output.path(), expected.path()).unwrap());
}

#[test]
fn test_dry_run_writes_nothing() {
    let templates = template_root();
    let output = TempDir::new().unwrap();
    let target = output.path().join("app");
    let (registry, renderer, runner) = (registry(), MiniJinjaRenderer::new(), FakeRunner::default());
    let engine = ScaffoldEngine::new(&registry, &renderer, &runner, templates.path());

    let mut options = ScaffoldOptions::new(&target);
    options.dry_run = true;
    let result = engine.run(&project("name: demo\nmodules:\n  api: true\n"), &options).unwrap();

    assert_eq!(result.files_written.len(), 4);
    assert!(!target.exists());
    assert!(result.post_processors_run.is_empty());
    assert!(runner.calls.borrow().is_empty());
}

#[test]
fn test_ask_mode_reports_conflicts() {
    let templates = template_root();
    let output = TempDir::new().unwrap();
    write(output.path(), "README.md", "# mine\n");
    let (registry, renderer, runner) = (registry(), MiniJinjaRenderer::new(), FakeRunner::default());
    let engine = ScaffoldEngine::new(&registry, &renderer, &runner, templates.path());

    let mut options = ScaffoldOptions::new(output.path());
    options.post_process = false;
    let result = engine.run(&project("name: demo\n"), &options).unwrap();
    assert_eq!(result.conflicts, vec!["README.md"]);
    assert_eq!(fs::read_to_string(output.path().join("README.md")).unwrap(), "# mine\n");

    options.overwrite = OverwriteMode::Never;
    let result = engine.run(&project("name: demo\n"), &options).unwrap();
    assert_eq!(result.files_skipped, vec!["README.md", "lib/main.dart", "pubspec.yaml"]);
    assert!(result.conflicts.is_empty());
}

#[test]
fn test_post_processors_without_code_generation() {
    let templates = template_root();
    let output = TempDir::new().unwrap();
    let (registry, renderer) = (registry(), MiniJinjaRenderer::new());
    let runner = FakeRunner { failing: vec!["flutter"], ..FakeRunner::default() };
    let engine = ScaffoldEngine::new(&registry, &renderer, &runner, templates.path());

    let result = engine.run(&project("name: demo\n"), &ScaffoldOptions::new(output.path())).unwrap();

    assert_eq!(*runner.calls.borrow(), vec!["dart format .", "flutter pub get"]);
    assert_eq!(result.post_processors_run, vec!["format"]);
    assert_eq!(result.post_processor_errors, vec!["fetch-dependencies: failed with exit code 1"]);
    assert_eq!(result.files_written.len(), 3);
}

#[test]
fn test_code_generation_runs_when_build_runner_is_declared() {
    let templates = template_root();
    let output = TempDir::new().unwrap();
    let (registry, renderer, runner) = (registry(), MiniJinjaRenderer::new(), FakeRunner::default());
    let engine = ScaffoldEngine::new(&registry, &renderer, &runner, templates.path());

    let result = engine
        .run(&project("name: demo\nmodules:\n  codegen: true\n"), &ScaffoldOptions::new(output.path()))
        .unwrap();

    assert_eq!(result.post_processors_run, vec!["format", "fetch-dependencies", "code-generation"]);
    assert_eq!(
        runner.calls.borrow().last().map(String::as_str),
        Some("dart run build_runner build --delete-conflicting-outputs")
    );
    let written: serde_yaml::Value =
        serde_yaml::from_str(&fs::read_to_string(output.path().join("pubspec.yaml")).unwrap()).unwrap();
    assert_eq!(written["dev_dependencies"]["build_runner"], "^2.4.13");
}

#[test]
fn test_renders_are_deterministic() {
    let templates = template_root();
    let (registry, renderer, runner) = (registry(), MiniJinjaRenderer::new(), FakeRunner::default());
    let engine = ScaffoldEngine::new(&registry, &renderer, &runner, templates.path());
    let project = project("name: demo\nmodules:\n  auth: true\n  codegen: true\n");

    let first = engine.render(&project).unwrap();
    let second = engine.render(&project).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_shipped_templates_render_with_catalog() {
    let templates = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("templates");
    let registry = ModuleRegistry::with_catalog().unwrap();
    let (renderer, runner) = (MiniJinjaRenderer::new(), FakeRunner::default());
    let engine = ScaffoldEngine::new(&registry, &renderer, &runner, &templates);

    let project = project(
        "name: field_notes\norg: com.acme\nmodules:\n  state: true\n  auth: true\n  offline_sync: true\n  localization: true\n  push: true\n",
    );
    let files = engine.render(&project).unwrap();

    let manifest = pubspec(&files);
    assert_eq!(manifest["name"], "field_notes");
    assert_eq!(manifest["dependencies"]["flutter_localizations"]["sdk"], "flutter");
    assert_eq!(manifest["dependencies"]["dio"], "^5.7.0");
    assert_eq!(manifest["dev_dependencies"]["build_runner"], "^2.4.13");
    assert_eq!(manifest["flutter"]["generate"], true);

    for path in ["lib/main.dart", "lib/app.dart", "lib/router.dart", ".env.example", "l10n.yaml"] {
        assert!(files.contains_key(path), "missing {path}");
    }
    assert!(!files.contains_key("pubspec.partial.yaml"));
}
