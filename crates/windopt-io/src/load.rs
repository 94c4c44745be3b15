//! Turning YAML documents into [`ConfigurationModel`]s.
//!
//! The document is parsed into a generic YAML tree first. The closed
//! settings sections (`general`, `driver`, `recorder`) deserialize straight
//! into their model types; the open `design_variables` and `constraints`
//! trees are walked by hand so every error names its dotted path.
//! JSON documents load too, since JSON is a subset of YAML.
//!
//! **Tree rules** for `design_variables` and `constraints`:
//! - the first level names components, deeper mappings are groups;
//! - a mapping holding any recognized leaf key (`flag`, bounds, indices) is a leaf;
//! - a bare boolean is shorthand for `{flag: <bool>}`;
//! - a sequence is a list of leaves, each named by its `layer_name`.

use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use windopt_core::{
    ConfigurationModel, Constraint, ConstraintBound, DesignVariable, Limit, MeritFigure,
    ParameterPath, SchemaError, VariableBounds, WindoptError, WindoptResult,
};

use crate::library::{Library, LibrarySection};

const TOP_LEVEL_KEYS: [&str; 7] = [
    "general",
    "design_variables",
    "optimization_variables",
    "merit_figure",
    "constraints",
    "driver",
    "recorder",
];

pub(crate) const DESIGN_VARIABLE_KEYS: &[&str] = &[
    "flag",
    "lower_bound",
    "upper_bound",
    "max_decrease",
    "max_increase",
    "n_opt",
    "index_start",
    "index_end",
];

pub(crate) const CONSTRAINT_KEYS: &[&str] = &[
    "flag",
    "min",
    "max",
    "lower_bound",
    "upper_bound",
    "target",
    "acceptable_error",
    "index_start",
    "index_end",
];

/// Load a configuration from YAML text without a data library.
pub fn load_from_str(text: &str) -> WindoptResult<ConfigurationModel> {
    Loader::new().load_str(text)
}

/// Load a configuration file without a data library.
pub fn load_from_path(path: &Path) -> WindoptResult<ConfigurationModel> {
    Loader::new().load_path(path)
}

/// Document loader, optionally backed by a [`Library`] for section references.
#[derive(Debug, Clone, Default)]
pub struct Loader {
    library: Option<Library>,
}

impl Loader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve string-valued sections against `library`.
    pub fn with_library(mut self, library: Library) -> Self {
        self.library = Some(library);
        self
    }

    pub fn library(&self) -> Option<&Library> {
        self.library.as_ref()
    }

    pub fn load_str(&self, text: &str) -> WindoptResult<ConfigurationModel> {
        let document = parse_yaml("<input>", text)?;
        self.load_value(document)
    }

    pub fn load_path(&self, path: &Path) -> WindoptResult<ConfigurationModel> {
        debug!(path = %path.display(), "reading configuration");
        let text = read_text(path)?;
        let document = parse_yaml(&path.display().to_string(), &text)?;
        self.load_value(document)
    }

    /// Build a model from an already-parsed document.
    pub fn load_value(&self, document: Value) -> WindoptResult<ConfigurationModel> {
        let root = match document {
            Value::Null => Mapping::new(),
            Value::Mapping(root) => root,
            other => return Err(wrong_type("<document>", "a mapping", &other).into()),
        };

        for key in root.keys() {
            let name = key_name(key, "<document>")?;
            if !TOP_LEVEL_KEYS.contains(&name) {
                return Err(SchemaError::UnknownTopLevelKey(name.to_string()).into());
            }
        }
        if root.contains_key("design_variables") && root.contains_key("optimization_variables") {
            return Err(SchemaError::DuplicateSection.into());
        }

        let mut model = ConfigurationModel::default();
        for (key, value) in &root {
            let name = key_name(key, "<document>")?;
            let value = self.resolve_reference(name, value)?;
            match name {
                "general" => model.general = read_section(name, value)?,
                "design_variables" | "optimization_variables" => {
                    model.design_variables =
                        read_tree(name, &value, DESIGN_VARIABLE_KEYS, build_design_variable)?
                }
                "constraints" => {
                    model.constraints = read_tree(name, &value, CONSTRAINT_KEYS, build_constraint)?
                }
                "merit_figure" => model.merit_figures = read_merit_figures(&value)?,
                "driver" => model.driver = read_section(name, value)?,
                "recorder" => model.recorder = read_section(name, value)?,
                _ => {}
            }
        }

        debug!(
            design_variables = model.design_variables.len(),
            constraints = model.constraints.len(),
            "loaded configuration"
        );
        Ok(model)
    }

    /// Replace a bare-string section with the library item it names.
    fn resolve_reference(&self, key: &str, value: &Value) -> WindoptResult<Value> {
        let (Some(section), Value::String(item)) = (LibrarySection::from_key(key), value) else {
            return Ok(value.clone());
        };
        match &self.library {
            Some(library) => {
                info!(section = key, item = item.as_str(), "resolving library reference");
                library.load_item(section, item)
            }
            None => Err(SchemaError::UnresolvedReference {
                path: key.to_string(),
                name: item.clone(),
            }
            .into()),
        }
    }
}

pub(crate) fn read_text(path: &Path) -> WindoptResult<String> {
    fs::read_to_string(path).map_err(|err| {
        WindoptError::Io(std::io::Error::new(
            err.kind(),
            format!("reading '{}': {err}", path.display()),
        ))
    })
}

pub(crate) fn parse_yaml(origin: &str, text: &str) -> Result<Value, SchemaError> {
    serde_yaml::from_str(text).map_err(|err| SchemaError::Syntax(format!("{origin}: {err}")))
}

// ============================================================================
// Design variable / constraint trees
// ============================================================================

type LeafBuilder<T> = fn(&str, ParameterPath, &Mapping) -> Result<T, SchemaError>;

fn read_tree<T>(
    section: &str,
    value: &Value,
    leaf_keys: &[&str],
    build: LeafBuilder<T>,
) -> Result<Vec<T>, SchemaError> {
    let mut out = Vec::new();
    match value {
        Value::Null => {}
        Value::Mapping(components) => {
            for (key, child) in components {
                let component = key_name(key, section)?;
                walk(
                    section,
                    ParameterPath::new(component),
                    child,
                    leaf_keys,
                    build,
                    &mut out,
                )?;
            }
        }
        other => return Err(wrong_type(section, "a mapping of components", other)),
    }
    Ok(out)
}

fn walk<T>(
    section: &str,
    path: ParameterPath,
    value: &Value,
    leaf_keys: &[&str],
    build: LeafBuilder<T>,
    out: &mut Vec<T>,
) -> Result<(), SchemaError> {
    let here = format!("{section}.{path}");
    match value {
        Value::Null => {}
        Value::Bool(flag) => {
            let mut leaf = Mapping::new();
            leaf.insert(Value::from("flag"), Value::Bool(*flag));
            out.push(build(&here, path, &leaf)?);
        }
        Value::Mapping(map) if is_leaf(map, leaf_keys) => out.push(build(&here, path, map)?),
        Value::Mapping(map) => {
            for (key, child) in map {
                let name = key_name(key, &here)?;
                walk(section, path.child(name), child, leaf_keys, build, out)?;
            }
        }
        Value::Sequence(items) => {
            for (idx, item) in items.iter().enumerate() {
                let item_here = format!("{here}[{idx}]");
                let map = item
                    .as_mapping()
                    .ok_or_else(|| wrong_type(&item_here, "a mapping with a layer_name", item))?;
                let name = match map.get("layer_name") {
                    Some(Value::String(name)) => name.clone(),
                    Some(other) => {
                        return Err(wrong_type(
                            &format!("{item_here}.layer_name"),
                            "a string",
                            other,
                        ))
                    }
                    None => {
                        return Err(SchemaError::MissingField {
                            path: item_here,
                            key: "layer_name".into(),
                        })
                    }
                };
                let leaf: Mapping = map
                    .iter()
                    .filter(|(key, _)| key.as_str() != Some("layer_name"))
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect();
                let layer_path = path.layer(name);
                let layer_here = format!("{section}.{layer_path}");
                out.push(build(&layer_here, layer_path, &leaf)?);
            }
        }
        other => {
            return Err(wrong_type(
                &here,
                "a mapping, a boolean or a sequence of layers",
                other,
            ))
        }
    }
    Ok(())
}

fn is_leaf(map: &Mapping, leaf_keys: &[&str]) -> bool {
    map.keys()
        .filter_map(Value::as_str)
        .any(|key| leaf_keys.contains(&key))
}

fn build_design_variable(
    at: &str,
    path: ParameterPath,
    map: &Mapping,
) -> Result<DesignVariable, SchemaError> {
    let fields = Fields::new(at, map);
    let absolute = Limit::from_sides(fields.number("lower_bound")?, fields.number("upper_bound")?);
    let max_decrease = fields.number("max_decrease")?;
    let max_increase = fields.number("max_increase")?;

    let bounds = match (absolute, max_decrease, max_increase) {
        (None, None, None) => VariableBounds::Unbounded,
        (Some(limit), None, None) => VariableBounds::Absolute(limit),
        (None, Some(max_decrease), Some(max_increase)) => VariableBounds::Relative {
            max_decrease,
            max_increase,
        },
        (None, _, _) => {
            return Err(bound_shape(
                at,
                "max_decrease and max_increase must be given together",
            ))
        }
        (Some(_), _, _) => {
            return Err(bound_shape(
                at,
                "absolute bounds (lower_bound/upper_bound) cannot be mixed with relative bounds (max_decrease/max_increase)",
            ))
        }
    };

    Ok(DesignVariable {
        path,
        flag: fields.flag()?,
        bounds,
        n_opt: fields.count("n_opt")?,
        index_start: fields.count("index_start")?,
        index_end: fields.count("index_end")?,
        options: fields.extras(DESIGN_VARIABLE_KEYS)?,
    })
}

fn build_constraint(at: &str, path: ParameterPath, map: &Mapping) -> Result<Constraint, SchemaError> {
    let fields = Fields::new(at, map);
    let one_sided = Limit::from_sides(fields.number("min")?, fields.number("max")?);
    let range = Limit::from_sides(fields.number("lower_bound")?, fields.number("upper_bound")?);
    let target = fields.number("target")?;
    let acceptable_error = fields.number("acceptable_error")?;
    let targeted = target.is_some() || acceptable_error.is_some();

    let bound = match (one_sided, range, targeted) {
        (None, None, false) => ConstraintBound::Unbounded,
        (Some(limit), None, false) => ConstraintBound::OneSided(limit),
        (None, Some(limit), false) => ConstraintBound::Range(limit),
        (None, None, true) => match target {
            Some(target) => ConstraintBound::Target {
                target,
                acceptable_error: acceptable_error.unwrap_or(0.0),
            },
            None => {
                return Err(SchemaError::MissingField {
                    path: at.to_string(),
                    key: "target".into(),
                })
            }
        },
        _ => {
            return Err(bound_shape(
                at,
                "bound keys from different shapes are mixed; use one of min/max, lower_bound/upper_bound or target/acceptable_error",
            ))
        }
    };

    Ok(Constraint {
        path,
        flag: fields.flag()?,
        bound,
        index_start: fields.count("index_start")?,
        index_end: fields.count("index_end")?,
        options: fields.extras(CONSTRAINT_KEYS)?,
    })
}

// ============================================================================
// Scalar sections
// ============================================================================

fn read_merit_figures(value: &Value) -> Result<Vec<MeritFigure>, SchemaError> {
    const AT: &str = "merit_figure";
    match value {
        Value::Null => Ok(Vec::new()),
        Value::String(name) => Ok(vec![name.parse()?]),
        Value::Sequence(items) => items
            .iter()
            .enumerate()
            .map(|(idx, item)| match item {
                Value::String(name) => name.parse(),
                other => Err(wrong_type(
                    &format!("{AT}[{idx}]"),
                    "a merit figure name",
                    other,
                )),
            })
            .collect(),
        Value::Mapping(entries) => {
            let mut selected = Vec::new();
            for (key, entry) in entries {
                let name = key_name(key, AT)?;
                let figure: MeritFigure = name.parse()?;
                let at = format!("{AT}.{name}");
                let chosen = match entry {
                    Value::Null => false,
                    Value::Bool(flag) => *flag,
                    Value::Mapping(map) => {
                        let fields = Fields::new(&at, map);
                        fields.reject_unknown(&["flag"])?;
                        fields.flag()?
                    }
                    other => return Err(wrong_type(&at, "a boolean or {flag: ...}", other)),
                };
                if chosen {
                    selected.push(figure);
                }
            }
            Ok(selected)
        }
        other => Err(wrong_type(AT, "a merit figure name", other)),
    }
}

/// Deserialize a closed settings section. A null section or field takes its default.
fn read_section<T>(section: &str, value: Value) -> Result<T, SchemaError>
where
    T: DeserializeOwned + Default,
{
    match without_nulls(value) {
        Value::Null => Ok(T::default()),
        value => serde_yaml::from_value(value).map_err(|err| SchemaError::InvalidSection {
            path: section.to_string(),
            message: err.to_string(),
        }),
    }
}

fn without_nulls(value: Value) -> Value {
    match value {
        Value::Mapping(map) => Value::Mapping(
            map.into_iter()
                .filter(|(_, value)| !value.is_null())
                .map(|(key, value)| (key, without_nulls(value)))
                .collect(),
        ),
        other => other,
    }
}

// ============================================================================
// Field access helpers
// ============================================================================

/// Typed access to the keys of one mapping. Null values count as absent.
struct Fields<'a> {
    at: &'a str,
    map: &'a Mapping,
}

impl<'a> Fields<'a> {
    fn new(at: &'a str, map: &'a Mapping) -> Self {
        Self { at, map }
    }

    fn path(&self, key: &str) -> String {
        format!("{}.{}", self.at, key)
    }

    fn get(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key).filter(|value| !value.is_null())
    }

    fn flag(&self) -> Result<bool, SchemaError> {
        match self.get("flag") {
            None => Ok(false),
            Some(Value::Bool(value)) => Ok(*value),
            Some(other) => Err(wrong_type(&self.path("flag"), "a boolean", other)),
        }
    }

    fn number(&self, key: &str) -> Result<Option<f64>, SchemaError> {
        self.get(key)
            .map(|value| as_number(&self.path(key), value))
            .transpose()
    }

    fn count(&self, key: &str) -> Result<Option<usize>, SchemaError> {
        self.get(key)
            .map(|value| as_count(&self.path(key), value))
            .transpose()
    }

    fn reject_unknown(&self, known: &[&str]) -> Result<(), SchemaError> {
        for key in self.map.keys() {
            let name = key_name(key, self.at)?;
            if !known.contains(&name) {
                return Err(SchemaError::UnknownField {
                    path: self.at.to_string(),
                    key: name.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Every key not in `known`, kept verbatim.
    fn extras(&self, known: &[&str]) -> Result<BTreeMap<String, Value>, SchemaError> {
        let mut extras = BTreeMap::new();
        for (key, value) in self.map {
            let name = key_name(key, self.at)?;
            if !known.contains(&name) {
                extras.insert(name.to_string(), value.clone());
            }
        }
        Ok(extras)
    }
}

fn key_name<'k>(key: &'k Value, at: &str) -> Result<&'k str, SchemaError> {
    key.as_str().ok_or_else(|| SchemaError::WrongType {
        path: at.to_string(),
        expected: "string keys",
        found: describe(key),
    })
}

fn as_number(at: &str, value: &Value) -> Result<f64, SchemaError> {
    let non_numeric = || SchemaError::NonNumeric {
        path: at.to_string(),
        found: describe(value),
    };
    let number = match value {
        Value::Number(number) => number.as_f64(),
        // Quoted scientific notation such as "4e-3"
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|number| !number.is_nan()).ok_or_else(non_numeric)
}

fn as_count(at: &str, value: &Value) -> Result<usize, SchemaError> {
    let count = match value {
        Value::Number(number) => number.as_u64().or_else(|| {
            number
                .as_f64()
                .filter(|f| *f >= 0.0 && f.fract() == 0.0 && *f <= u32::MAX as f64)
                .map(|f| f as u64)
        }),
        _ => None,
    };
    count
        .and_then(|count| usize::try_from(count).ok())
        .ok_or_else(|| wrong_type(at, "a non-negative integer", value))
}

fn wrong_type(at: &str, expected: &'static str, found: &Value) -> SchemaError {
    SchemaError::WrongType {
        path: at.to_string(),
        expected,
        found: describe(found),
    }
}

fn bound_shape(at: &str, message: &str) -> SchemaError {
    SchemaError::BoundShape {
        path: at.to_string(),
        message: message.to_string(),
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(flag) => format!("boolean {flag}"),
        Value::Number(number) => format!("number {number}"),
        Value::String(text) => format!("string '{text}'"),
        Value::Sequence(_) => "a sequence".to_string(),
        Value::Mapping(_) => "a mapping".to_string(),
        Value::Tagged(tagged) => format!("tagged value {}", tagged.tag),
    }
}
