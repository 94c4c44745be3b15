//! Writing a [`ConfigurationModel`] back to its document form.

use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::Path;
use tracing::info;

use windopt_core::{
    ConfigurationModel, Constraint, ConstraintBound, DesignOfExperiments, DesignVariable, Limit,
    OptimizationDriver, ParameterPath, RecorderSettings, Segment, VariableBounds, WindoptError,
    WindoptResult,
};

/// Rebuild the YAML tree for `model`.
///
/// Loading the result yields a model equal to `model`.
pub fn to_document(model: &ConfigurationModel) -> Value {
    let mut root = Mapping::new();

    let mut general = Mapping::new();
    general.insert("folder_output".into(), model.general.folder_output.as_str().into());
    general.insert("fname_output".into(), model.general.fname_output.as_str().into());
    root.insert("general".into(), Value::Mapping(general));

    if !model.design_variables.is_empty() {
        let leaves = model
            .design_variables
            .iter()
            .map(|dv| (&dv.path, design_variable_leaf(dv)));
        root.insert("design_variables".into(), tree(leaves));
    }

    match model.merit_figures.as_slice() {
        [] => {}
        [only] => {
            root.insert("merit_figure".into(), only.as_str().into());
        }
        many => {
            let names = many.iter().map(|figure| Value::from(figure.as_str())).collect();
            root.insert("merit_figure".into(), Value::Sequence(names));
        }
    }

    if !model.constraints.is_empty() {
        let leaves = model.constraints.iter().map(|c| (&c.path, constraint_leaf(c)));
        root.insert("constraints".into(), tree(leaves));
    }

    let mut driver = Mapping::new();
    driver.insert(
        "optimization".into(),
        optimization_value(&model.driver.optimization),
    );
    if let Some(doe) = &model.driver.design_of_experiments {
        driver.insert("design_of_experiments".into(), doe_value(doe));
    }
    root.insert("driver".into(), Value::Mapping(driver));
    root.insert("recorder".into(), recorder_value(&model.recorder));

    Value::Mapping(root)
}

pub fn to_yaml_string(model: &ConfigurationModel) -> WindoptResult<String> {
    serde_yaml::to_string(&to_document(model)).map_err(|err| WindoptError::Serialize(err.to_string()))
}

/// Write the canonical document to `path`, creating parent directories.
pub fn write_to_path(model: &ConfigurationModel, path: &Path) -> WindoptResult<()> {
    let text = to_yaml_string(model)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, text)?;
    info!(path = %path.display(), "wrote configuration");
    Ok(())
}

fn tree<'a>(leaves: impl Iterator<Item = (&'a ParameterPath, Mapping)>) -> Value {
    let mut root = Mapping::new();
    for (path, leaf) in leaves {
        insert_leaf(&mut root, path.segments(), leaf);
    }
    Value::Mapping(root)
}

fn insert_leaf(node: &mut Mapping, segments: &[Segment], leaf: Mapping) {
    match segments {
        [Segment::Key(key)] => {
            node.insert(key.as_str().into(), Value::Mapping(leaf));
        }
        [Segment::Key(key), Segment::Layer(name)] => {
            if !node.contains_key(key.as_str()) {
                node.insert(key.as_str().into(), Value::Sequence(Vec::new()));
            }
            if let Some(Value::Sequence(items)) = node.get_mut(key.as_str()) {
                let mut item = Mapping::new();
                item.insert("layer_name".into(), name.as_str().into());
                for (field, value) in leaf {
                    item.insert(field, value);
                }
                items.push(Value::Mapping(item));
            }
        }
        [Segment::Key(key), rest @ ..] => {
            if !node.contains_key(key.as_str()) {
                node.insert(key.as_str().into(), Value::Mapping(Mapping::new()));
            }
            if let Some(Value::Mapping(child)) = node.get_mut(key.as_str()) {
                insert_leaf(child, rest, leaf);
            }
        }
        // Paths never start with a layer.
        _ => {}
    }
}

fn design_variable_leaf(dv: &DesignVariable) -> Mapping {
    let mut leaf = Mapping::new();
    leaf.insert("flag".into(), dv.flag.into());
    match dv.bounds {
        VariableBounds::Unbounded => {}
        VariableBounds::Absolute(limit) => insert_limit(&mut leaf, "lower_bound", "upper_bound", limit),
        VariableBounds::Relative {
            max_decrease,
            max_increase,
        } => {
            leaf.insert("max_decrease".into(), max_decrease.into());
            leaf.insert("max_increase".into(), max_increase.into());
        }
    }
    insert_count(&mut leaf, "n_opt", dv.n_opt);
    insert_count(&mut leaf, "index_start", dv.index_start);
    insert_count(&mut leaf, "index_end", dv.index_end);
    for (key, value) in &dv.options {
        leaf.insert(key.as_str().into(), value.clone());
    }
    leaf
}

fn constraint_leaf(constraint: &Constraint) -> Mapping {
    let mut leaf = Mapping::new();
    leaf.insert("flag".into(), constraint.flag.into());
    match constraint.bound {
        ConstraintBound::Unbounded => {}
        ConstraintBound::OneSided(limit) => insert_limit(&mut leaf, "min", "max", limit),
        ConstraintBound::Range(limit) => insert_limit(&mut leaf, "lower_bound", "upper_bound", limit),
        ConstraintBound::Target {
            target,
            acceptable_error,
        } => {
            leaf.insert("target".into(), target.into());
            leaf.insert("acceptable_error".into(), acceptable_error.into());
        }
    }
    insert_count(&mut leaf, "index_start", constraint.index_start);
    insert_count(&mut leaf, "index_end", constraint.index_end);
    for (key, value) in &constraint.options {
        leaf.insert(key.as_str().into(), value.clone());
    }
    leaf
}

fn insert_limit(leaf: &mut Mapping, lower_key: &str, upper_key: &str, limit: Limit) {
    if let Some(lower) = limit.lower() {
        leaf.insert(lower_key.into(), lower.into());
    }
    if let Some(upper) = limit.upper() {
        leaf.insert(upper_key.into(), upper.into());
    }
}

fn insert_count(leaf: &mut Mapping, key: &str, value: Option<usize>) {
    if let Some(value) = value {
        leaf.insert(key.into(), (value as u64).into());
    }
}

fn optimization_value(driver: &OptimizationDriver) -> Value {
    let mut map = Mapping::new();
    map.insert("flag".into(), driver.flag.into());
    map.insert("solver".into(), driver.solver.name().into());
    map.insert("tol".into(), driver.tol.into());
    map.insert("max_iter".into(), (driver.max_iter as u64).into());
    insert_count(&mut map, "max_major_iter", driver.max_major_iter);
    insert_count(&mut map, "max_minor_iter", driver.max_minor_iter);
    map.insert("step_size".into(), driver.step_size.into());
    map.insert("form".into(), driver.form.as_str().into());
    Value::Mapping(map)
}

fn doe_value(doe: &DesignOfExperiments) -> Value {
    let mut map = Mapping::new();
    map.insert("flag".into(), doe.flag.into());
    map.insert("generator".into(), doe.generator.as_str().into());
    map.insert("num_samples".into(), (doe.num_samples as u64).into());
    map.insert("seed".into(), doe.seed.into());
    map.insert("levels".into(), (doe.levels as u64).into());
    map.insert("criterion".into(), doe.criterion.as_str().into());
    map.insert("run_parallel".into(), doe.run_parallel.into());
    Value::Mapping(map)
}

fn recorder_value(recorder: &RecorderSettings) -> Value {
    let mut map = Mapping::new();
    map.insert("flag".into(), recorder.flag.into());
    if let Some(file_name) = &recorder.file_name {
        map.insert("file_name".into(), file_name.as_str().into());
    }
    if !recorder.includes.is_empty() {
        let includes = recorder
            .includes
            .iter()
            .map(|pattern| Value::from(pattern.as_str()))
            .collect();
        map.insert("includes".into(), Value::Sequence(includes));
    }
    Value::Mapping(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load::load_from_str;
    use windopt_core::{MeritFigure, Solver};

    #[test]
    fn layers_become_named_sequences() {
        let mut model = ConfigurationModel::default();
        let structure = ParameterPath::new("blade").child("structure");
        for name in ["Spar_Cap_SS", "Spar_Cap_PS"] {
            let mut dv = DesignVariable::new(structure.layer(name));
            dv.flag = true;
            dv.bounds = VariableBounds::Relative {
                max_decrease: 0.2,
                max_increase: 2.0,
            };
            model.design_variables.push(dv);
        }

        let document = to_document(&model);
        let items = document["design_variables"]["blade"]["structure"]
            .as_sequence()
            .unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["layer_name"], Value::from("Spar_Cap_SS"));
        assert_eq!(items[1]["max_increase"], Value::from(2.0));
    }

    #[test]
    fn single_merit_figure_is_a_scalar() {
        let mut model = ConfigurationModel::default();
        model.merit_figures.push(MeritFigure::Aep);
        assert_eq!(to_document(&model)["merit_figure"], Value::from("AEP"));

        model.merit_figures.push(MeritFigure::Lcoe);
        assert!(to_document(&model)["merit_figure"].is_sequence());
    }

    #[test]
    fn unknown_solver_survives_round_trip() {
        let model = load_from_str("merit_figure: LCOE\ndriver:\n  solver: Powell\n").unwrap();
        let reloaded = load_from_str(&to_yaml_string(&model).unwrap()).unwrap();
        assert_eq!(reloaded.driver.optimization.solver, Solver::Unknown("Powell".into()));
        assert_eq!(reloaded, model);
    }

    #[test]
    fn write_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out/config.yaml");
        let mut model = ConfigurationModel::default();
        model.merit_figures.push(MeritFigure::TowerMass);
        write_to_path(&model, &path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("merit_figure: tower_mass"));
    }
}
