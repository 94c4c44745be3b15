use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

use windopt_core::{
    check_references, validate, ConfigurationModel, ConstraintBound, IssueKind, Limit,
    MeritFigure, SchemaError, Solver, StaticRegistry, VariableBounds, WindoptError,
};
use windopt_io::{load_from_path, load_from_str, to_yaml_string, write_to_path, Library, Loader};

fn repo_path(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join(relative)
}

fn load_fixture(name: &str) -> ConfigurationModel {
    load_from_path(&repo_path(&format!("test_data/configs/{name}"))).unwrap()
}

fn registry() -> StaticRegistry {
    let text = fs::read_to_string(repo_path("test_data/configs/registry.yaml")).unwrap();
    StaticRegistry::from_yaml_str(&text).unwrap()
}

#[test]
fn tower_fixture_is_clean() {
    let model = load_fixture("tower_mass.yaml");
    assert_eq!(model.merit_figure(), Some(MeritFigure::TowerMass));
    assert_eq!(model.design_variables.len(), 2);
    assert_eq!(model.active_constraints().count(), 7);
    assert_eq!(model.components(), vec!["tower"]);
    assert!(validate(&model).is_empty());
    assert!(check_references(&model, &registry()).is_empty());
    assert!(check_references(&model, &StaticRegistry::builtin()).is_empty());
}

#[test]
fn blade_fixture_uses_alias_layers_and_nested_driver() {
    let model = load_fixture("blade_aero.yaml");
    assert_eq!(model.merit_figures, vec![MeritFigure::Aep]);
    assert_eq!(model.components(), vec!["blade", "control"]);

    let layers: Vec<String> = model
        .design_variables
        .iter()
        .filter(|dv| dv.path.ends_in_layer())
        .map(|dv| dv.path.to_string())
        .collect();
    assert_eq!(
        layers,
        vec!["blade.structure[Spar_Cap_SS]", "blade.structure[Spar_Cap_PS]"]
    );

    let chord = model.constraint(&"blade.chord".parse().unwrap()).unwrap();
    assert_eq!(chord.bound, ConstraintBound::OneSided(Limit::Upper(4.75)));
    assert_eq!(model.constraints_for("blade").count(), 6);

    assert_eq!(model.driver.optimization.solver, Solver::Snopt);
    assert!(model.driver.design_of_experiments.is_some());
    assert_eq!(model.recorder.includes, vec!["*blade*", "AEP"]);

    assert!(validate(&model).is_empty());
    assert!(check_references(&model, &registry()).is_empty());
}

#[test]
fn reversed_indices_give_one_issue_naming_the_variable() {
    let model = load_fixture("bad_indices.yaml");
    let issues = validate(&model);
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].kind, IssueKind::IndexOrder);
    assert!(issues[0].field.contains("blade.aero_shape.twist"));
}

#[test]
fn two_merit_figures_give_one_issue() {
    let model = load_fixture("two_merit.yaml");
    let issues = validate(&model);
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].field, "merit_figure");
}

#[test]
fn unknown_top_level_key_is_rejected() {
    let err = load_from_path(&repo_path("test_data/configs/unknown_key.yaml")).unwrap_err();
    assert!(matches!(
        err,
        WindoptError::Schema(SchemaError::UnknownTopLevelKey(ref key)) if key == "objective"
    ));
}

#[test]
fn missing_file_is_an_io_error() {
    let err = load_from_path(&repo_path("test_data/configs/nope.yaml")).unwrap_err();
    assert!(matches!(err, WindoptError::Io(_)));
    assert!(err.to_string().contains("nope.yaml"));
}

#[test]
fn library_references_resolve() {
    let library = Library::open(repo_path("test_data/library")).unwrap();
    let model = Loader::new()
        .with_library(library)
        .load_path(&repo_path("test_data/configs/with_library_ref.yaml"))
        .unwrap();

    assert_eq!(model.driver.optimization.max_iter, 250);
    assert_eq!(model.driver.optimization.tol, 1e-8);
    let d_to_t = model.constraint(&"tower.d_to_t".parse().unwrap()).unwrap();
    assert_eq!(
        d_to_t.bound,
        ConstraintBound::Range(Limit::Both {
            lower: 120.0,
            upper: 500.0
        })
    );
    assert!(validate(&model).is_empty());
}

#[test]
fn serialized_fixtures_reload_identically() {
    for name in ["tower_mass.yaml", "blade_aero.yaml", "bad_indices.yaml", "two_merit.yaml"] {
        let model = load_fixture(name);
        let text = to_yaml_string(&model).unwrap();
        let reloaded = load_from_str(&text).unwrap();
        assert_eq!(reloaded, model, "{name} changed on reload");
        assert_eq!(to_yaml_string(&reloaded).unwrap(), text);
    }
}

#[test]
fn written_file_reloads() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("normalized.yaml");
    let model = load_fixture("blade_aero.yaml");
    write_to_path(&model, &out).unwrap();

    let reloaded = load_from_path(&out).unwrap();
    let twist = reloaded
        .design_variable(&"blade.aero_shape.twist".parse().unwrap())
        .unwrap();
    assert_eq!(
        twist.bounds,
        VariableBounds::Relative {
            max_decrease: 0.08722,
            max_increase: 0.08722
        }
    );
    assert_eq!(reloaded, model);
}

#[test]
fn json_documents_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");
    fs::write(
        &path,
        r#"{"merit_figure": "LCOE",
            "design_variables": {"tower": {"outer_diameter": {"flag": true, "lower_bound": 3.87, "upper_bound": 8.0}}},
            "driver": {"solver": "COBYLA", "flag": true}}"#,
    )
    .unwrap();
    let model = load_from_path(&path).unwrap();
    assert_eq!(model.driver.optimization.solver, Solver::Cobyla);
    assert!(validate(&model).is_empty());
}
