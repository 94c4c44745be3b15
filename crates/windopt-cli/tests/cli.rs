use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn repo_path(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join(relative)
}

fn config_path(name: &str) -> String {
    repo_path(&format!("test_data/configs/{name}"))
        .to_str()
        .unwrap()
        .to_string()
}

/// `windopt` isolated from the user's settings and library.
fn windopt(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("windopt").unwrap();
    cmd.env("WINDOPT_HOME", home).env_remove("WINDOPT_LIBRARY");
    cmd
}

#[test]
fn validate_accepts_clean_config() {
    let home = tempdir().unwrap();
    windopt(home.path())
        .args(["validate", &config_path("tower_mass.yaml")])
        .assert()
        .success()
        .stdout(predicate::str::contains("configuration is valid"));
}

#[test]
fn validate_reports_reversed_indices() {
    let home = tempdir().unwrap();
    windopt(home.path())
        .args(["validate", &config_path("bad_indices.yaml")])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("1 issue"))
        .stdout(predicate::str::contains("index_order"))
        .stdout(predicate::str::contains("blade.aero_shape.twist"));
}

#[test]
fn validate_json_output() {
    let home = tempdir().unwrap();
    let output = windopt(home.path())
        .args(["validate", &config_path("two_merit.yaml"), "--format", "json"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["clean"], serde_json::Value::Bool(false));
    let issues = report["issues"].as_array().unwrap();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0]["kind"], "merit_figure");
    assert_eq!(issues[0]["field"], "merit_figure");
}

#[test]
fn validate_schema_error_exits_with_two() {
    let home = tempdir().unwrap();
    windopt(home.path())
        .args(["validate", &config_path("unknown_key.yaml")])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown top-level key 'objective'"));
}

#[test]
fn validate_with_registry_file() {
    let home = tempdir().unwrap();
    windopt(home.path())
        .args([
            "validate",
            &config_path("blade_aero.yaml"),
            "--registry",
            &config_path("registry.yaml"),
        ])
        .assert()
        .success();

    let registry = home.path().join("tower_only.yaml");
    fs::write(
        &registry,
        "design_variables: [tower.outer_diameter]\nconstraints: ['tower.*']\n",
    )
    .unwrap();
    windopt(home.path())
        .args([
            "validate",
            &config_path("blade_aero.yaml"),
            "--registry",
            registry.to_str().unwrap(),
        ])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("unknown_reference"))
        .stdout(predicate::str::contains("component 'blade'"));
}

#[test]
fn validate_with_builtin_registry() {
    let home = tempdir().unwrap();
    windopt(home.path())
        .args([
            "validate",
            &config_path("tower_mass.yaml"),
            "--registry",
            "builtin",
        ])
        .assert()
        .success();
}

#[test]
fn library_reference_needs_a_library() {
    let home = tempdir().unwrap();
    windopt(home.path())
        .args(["validate", &config_path("with_library_ref.yaml")])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("no data library is configured"));

    windopt(home.path())
        .args([
            "validate",
            &config_path("with_library_ref.yaml"),
            "--library",
            repo_path("test_data/library").to_str().unwrap(),
        ])
        .assert()
        .success();
}

#[test]
fn library_from_environment() {
    let home = tempdir().unwrap();
    windopt(home.path())
        .env("WINDOPT_LIBRARY", repo_path("test_data/library"))
        .args(["validate", &config_path("with_library_ref.yaml")])
        .assert()
        .success();
}

#[test]
fn library_from_settings_file() {
    let home = tempdir().unwrap();
    let settings_dir = home.path().join("config");
    fs::create_dir_all(&settings_dir).unwrap();
    fs::write(
        settings_dir.join("windopt.toml"),
        format!(
            "[library]\npath = {:?}\n",
            repo_path("test_data/library").to_str().unwrap()
        ),
    )
    .unwrap();

    windopt(home.path())
        .args(["library", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("test_data/library"));
    windopt(home.path())
        .args(["validate", &config_path("with_library_ref.yaml")])
        .assert()
        .success();
}

#[test]
fn show_table_summary() {
    let home = tempdir().unwrap();
    windopt(home.path())
        .args(["show", &config_path("tower_mass.yaml")])
        .assert()
        .success()
        .stdout(predicate::str::contains("Merit figure: tower_mass (minimized)"))
        .stdout(predicate::str::contains("tower.outer_diameter"))
        .stdout(predicate::str::contains("[3.87, 8]"))
        .stdout(predicate::str::contains("Recorder: log_opt.sql"));
}

#[test]
fn show_json_for_one_component() {
    let home = tempdir().unwrap();
    let output = windopt(home.path())
        .args([
            "show",
            &config_path("blade_aero.yaml"),
            "--component",
            "control",
            "--format",
            "json",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());
    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let design_variables = summary["design_variables"].as_array().unwrap();
    assert_eq!(design_variables.len(), 1);
    assert_eq!(design_variables[0]["path"], "control.tsr");
    assert!(summary["constraints"].as_array().unwrap().is_empty());
    assert_eq!(summary["merit_figures"][0], "AEP");
}

#[test]
fn show_unknown_component_fails() {
    let home = tempdir().unwrap();
    windopt(home.path())
        .args(["show", &config_path("tower_mass.yaml"), "--component", "nacelle"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("component 'nacelle' not found"));
}

#[test]
fn normalize_writes_reloadable_document() {
    let home = tempdir().unwrap();
    let out = home.path().join("out/blade.yaml");
    windopt(home.path())
        .args([
            "normalize",
            &config_path("blade_aero.yaml"),
            "-o",
            out.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote normalized configuration"));

    let original = windopt_io::load_from_path(&repo_path("test_data/configs/blade_aero.yaml")).unwrap();
    let normalized = windopt_io::load_from_path(&out).unwrap();
    assert_eq!(normalized, original);
    let text = fs::read_to_string(&out).unwrap();
    assert!(text.contains("layer_name: Spar_Cap_SS"));
    assert!(!text.contains("optimization_variables"));
}

#[test]
fn normalize_to_stdout() {
    let home = tempdir().unwrap();
    windopt(home.path())
        .args(["normalize", &config_path("tower_mass.yaml")])
        .assert()
        .success()
        .stdout(predicate::str::contains("merit_figure: tower_mass"))
        .stdout(predicate::str::contains("optimization:"));
}

#[test]
fn library_list_shows_items() {
    let home = tempdir().unwrap();
    windopt(home.path())
        .args([
            "library",
            "list",
            "--library",
            repo_path("test_data/library").to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("slsqp_tight"))
        .stdout(predicate::str::contains("tower_standard"));
}

#[test]
fn library_list_requires_library() {
    let home = tempdir().unwrap();
    windopt(home.path())
        .args(["library", "list"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("no data library configured"));
}

#[test]
fn library_export_round_trip() {
    let home = tempdir().unwrap();
    let library = home.path().join("library");
    fs::create_dir_all(&library).unwrap();
    let library_arg = library.to_str().unwrap();

    windopt(home.path())
        .args([
            "library",
            "export",
            &config_path("blade_aero.yaml"),
            "--section",
            "design-variables",
            "--name",
            "blade_aero_shape",
            "--library",
            library_arg,
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported design_variables"));
    assert!(library.join("design_variables/blade_aero_shape.yaml").is_file());

    windopt(home.path())
        .args([
            "library",
            "export",
            &config_path("blade_aero.yaml"),
            "--section",
            "design-variables",
            "--name",
            "blade_aero_shape",
            "--library",
            library_arg,
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("already exists"));

    let config = home.path().join("uses_item.yaml");
    fs::write(&config, "merit_figure: AEP\ndesign_variables: blade_aero_shape\n").unwrap();
    windopt(home.path())
        .args([
            "validate",
            config.to_str().unwrap(),
            "--library",
            library_arg,
        ])
        .assert()
        .success();
}

#[test]
fn config_init_and_show() {
    let home = tempdir().unwrap();
    windopt(home.path())
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote default settings"));
    assert!(home.path().join("config/windopt.toml").is_file());

    windopt(home.path())
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already exist"));

    windopt(home.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[logging]"))
        .stdout(predicate::str::contains("level = \"warn\""));
}

#[test]
fn settings_choose_output_format() {
    let home = tempdir().unwrap();
    let settings_dir = home.path().join("config");
    fs::create_dir_all(&settings_dir).unwrap();
    fs::write(settings_dir.join("windopt.toml"), "[output]\nformat = \"json\"\n").unwrap();

    windopt(home.path())
        .args(["validate", &config_path("tower_mass.yaml")])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"clean\": true"));
}

#[test]
fn completions_generate() {
    let home = tempdir().unwrap();
    windopt(home.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("_windopt()"))
        .stdout(predicate::str::contains("complete -F _windopt"));
}

#[test]
fn completions_written_to_file() {
    let home = tempdir().unwrap();
    let out = home.path().join("completions/_windopt");
    windopt(home.path())
        .args(["completions", "zsh", "--out", out.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote zsh completions for windopt"));
    let script = fs::read_to_string(&out).unwrap();
    assert!(script.starts_with("#compdef windopt"));
}
