//! Typed configuration model.
//!
//! A [`ConfigurationModel`] is the immutable result of loading an optimization
//! document. Design variables and constraints live in flat lists keyed by a
//! [`ParameterPath`]; the first path segment names the owning component
//! (tower, monopile, blade, ...).
//!
//! Bound shapes are tagged variants ([`VariableBounds`], [`ConstraintBound`])
//! so that a `max`-style constraint can never also carry a `target`.

use serde::de::{Deserializer, Error as _};
use serde::{Deserialize, Serialize, Serializer};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::de;
use crate::error::SchemaError;

// ============================================================================
// Parameter paths
// ============================================================================

/// One step of a [`ParameterPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Segment {
    /// A mapping key, e.g. `outer_diameter`
    Key(String),
    /// A named element of a layer sequence, e.g. `[Spar_Cap_SS]`
    Layer(String),
}

impl Segment {
    pub fn name(&self) -> &str {
        match self {
            Segment::Key(name) | Segment::Layer(name) => name,
        }
    }
}

/// Location of a tunable quantity inside a component.
///
/// Rendered as `blade.aero_shape.twist` or `blade.structure[Spar_Cap_SS]`.
/// The first segment is always a key naming the component, and a layer
/// segment can only appear last.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParameterPath {
    segments: Vec<Segment>,
}

impl ParameterPath {
    /// Path to a component's root.
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            segments: vec![Segment::Key(component.into())],
        }
    }

    /// Extend by a mapping key.
    pub fn child(&self, key: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Key(key.into()));
        Self { segments }
    }

    /// Extend by a named layer. The result is terminal.
    pub fn layer(&self, name: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Layer(name.into()));
        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Name of the owning component.
    pub fn component(&self) -> &str {
        self.segments[0].name()
    }

    pub fn ends_in_layer(&self) -> bool {
        matches!(self.segments.last(), Some(Segment::Layer(_)))
    }
}

impl fmt::Display for ParameterPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Key(key) if idx == 0 => write!(f, "{key}")?,
                Segment::Key(key) => write!(f, ".{key}")?,
                Segment::Layer(name) => write!(f, "[{name}]")?,
            }
        }
        Ok(())
    }
}

impl FromStr for ParameterPath {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let segments = split_path(s)?;
        match segments.first() {
            Some(Segment::Key(_)) => Ok(Self { segments }),
            _ => Err(SchemaError::InvalidPath {
                path: s.to_string(),
                reason: "must start with a component name".into(),
            }),
        }
    }
}

impl Serialize for ParameterPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Split `a.b[c]` into `[Key(a), Key(b), Layer(c)]`.
pub(crate) fn split_path(s: &str) -> Result<Vec<Segment>, SchemaError> {
    let invalid = |reason: &str| SchemaError::InvalidPath {
        path: s.to_string(),
        reason: reason.to_string(),
    };

    let mut segments = Vec::new();
    let mut chars = s.chars().peekable();
    let mut key = String::new();
    let mut after_layer = false;

    while let Some(c) = chars.next() {
        match c {
            '.' => {
                if after_layer {
                    return Err(invalid("a layer selector must be last"));
                }
                if key.is_empty() {
                    return Err(invalid("empty segment"));
                }
                segments.push(Segment::Key(std::mem::take(&mut key)));
            }
            '[' => {
                if after_layer {
                    return Err(invalid("only one layer selector is allowed"));
                }
                if key.is_empty() {
                    return Err(invalid("layer selector needs a preceding key"));
                }
                segments.push(Segment::Key(std::mem::take(&mut key)));
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some(']') => break,
                        Some(ch) => name.push(ch),
                        None => return Err(invalid("unterminated '['")),
                    }
                }
                if name.is_empty() {
                    return Err(invalid("empty layer name"));
                }
                segments.push(Segment::Layer(name));
                after_layer = true;
            }
            ']' => return Err(invalid("unmatched ']'")),
            _ if after_layer => return Err(invalid("a layer selector must be last")),
            _ => key.push(c),
        }
    }

    if after_layer {
        return Ok(segments);
    }
    if key.is_empty() {
        return Err(invalid("empty segment"));
    }
    segments.push(Segment::Key(key));
    Ok(segments)
}

// ============================================================================
// Bounds
// ============================================================================

/// A lower limit, an upper limit, or both.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Limit {
    Lower(f64),
    Upper(f64),
    Both { lower: f64, upper: f64 },
}

impl Limit {
    /// Build from optional sides; `None` when neither side is present.
    pub fn from_sides(lower: Option<f64>, upper: Option<f64>) -> Option<Self> {
        match (lower, upper) {
            (Some(lower), Some(upper)) => Some(Limit::Both { lower, upper }),
            (Some(lower), None) => Some(Limit::Lower(lower)),
            (None, Some(upper)) => Some(Limit::Upper(upper)),
            (None, None) => None,
        }
    }

    pub fn lower(&self) -> Option<f64> {
        match *self {
            Limit::Lower(lower) | Limit::Both { lower, .. } => Some(lower),
            Limit::Upper(_) => None,
        }
    }

    pub fn upper(&self) -> Option<f64> {
        match *self {
            Limit::Upper(upper) | Limit::Both { upper, .. } => Some(upper),
            Limit::Lower(_) => None,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.lower().map_or(true, f64::is_finite) && self.upper().map_or(true, f64::is_finite)
    }
}

/// Bounds on a design variable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableBounds {
    /// No bound keys; the consuming framework applies its own limits
    Unbounded,
    /// `lower_bound` / `upper_bound`, in the parameter's own units
    Absolute(Limit),
    /// `max_decrease` / `max_increase` applied to spline control points
    Relative { max_decrease: f64, max_increase: f64 },
}

impl fmt::Display for VariableBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariableBounds::Unbounded => write!(f, "-"),
            VariableBounds::Absolute(limit) => fmt_interval(f, limit),
            VariableBounds::Relative {
                max_decrease,
                max_increase,
            } => write!(f, "-{max_decrease} / +{max_increase}"),
        }
    }
}

/// Bound on a constrained quantity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintBound {
    /// Flag-only; the bound is implied (stress or buckling utilization, ...)
    Unbounded,
    /// `min` and/or `max`
    OneSided(Limit),
    /// `lower_bound` and/or `upper_bound`; equal sides express equality
    Range(Limit),
    /// `target` with a symmetric `acceptable_error` band
    Target { target: f64, acceptable_error: f64 },
}

impl fmt::Display for ConstraintBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintBound::Unbounded => write!(f, "-"),
            ConstraintBound::OneSided(Limit::Lower(min)) => write!(f, "min {min}"),
            ConstraintBound::OneSided(Limit::Upper(max)) => write!(f, "max {max}"),
            ConstraintBound::OneSided(Limit::Both { lower, upper }) => {
                write!(f, "min {lower}, max {upper}")
            }
            ConstraintBound::Range(limit) => fmt_interval(f, limit),
            ConstraintBound::Target {
                target,
                acceptable_error,
            } => write!(f, "{target} +/- {acceptable_error}"),
        }
    }
}

fn fmt_interval(f: &mut fmt::Formatter<'_>, limit: &Limit) -> fmt::Result {
    match limit {
        Limit::Lower(lower) => write!(f, "[{lower}, inf)"),
        Limit::Upper(upper) => write!(f, "(-inf, {upper}]"),
        Limit::Both { lower, upper } => write!(f, "[{lower}, {upper}]"),
    }
}

// ============================================================================
// Design variables and constraints
// ============================================================================

/// A parameter the optimizer may change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DesignVariable {
    pub path: ParameterPath,
    pub flag: bool,
    pub bounds: VariableBounds,
    /// Number of spline control points along the span
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n_opt: Option<usize>,
    /// First free control point; earlier points are locked
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_start: Option<usize>,
    /// Last free control point (exclusive)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_end: Option<usize>,
    /// Keys the schema does not interpret, kept verbatim (`inverse`, ...)
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, Value>,
}

impl DesignVariable {
    /// An inactive, unbounded variable.
    pub fn new(path: ParameterPath) -> Self {
        Self {
            path,
            flag: false,
            bounds: VariableBounds::Unbounded,
            n_opt: None,
            index_start: None,
            index_end: None,
            options: BTreeMap::new(),
        }
    }

    pub fn component(&self) -> &str {
        self.path.component()
    }
}

/// A condition the optimizer must respect.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Constraint {
    pub path: ParameterPath,
    pub flag: bool,
    pub bound: ConstraintBound,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_start: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_end: Option<usize>,
    /// Keys the schema does not interpret (`margin`, `max_ratio`, ...)
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, Value>,
}

impl Constraint {
    /// An inactive, flag-only constraint.
    pub fn new(path: ParameterPath) -> Self {
        Self {
            path,
            flag: false,
            bound: ConstraintBound::Unbounded,
            index_start: None,
            index_end: None,
            options: BTreeMap::new(),
        }
    }

    pub fn component(&self) -> &str {
        self.path.component()
    }
}

// ============================================================================
// Merit figure
// ============================================================================

/// Scalar objective of the optimization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MeritFigure {
    #[serde(rename = "LCOE")]
    Lcoe,
    #[serde(rename = "AEP")]
    Aep,
    #[serde(rename = "Cp")]
    Cp,
    #[serde(rename = "blade_mass")]
    BladeMass,
    #[serde(rename = "blade_cost")]
    BladeCost,
    #[serde(rename = "blade_tip_deflection")]
    BladeTipDeflection,
    #[serde(rename = "tower_mass")]
    TowerMass,
    #[serde(rename = "tower_cost")]
    TowerCost,
    #[serde(rename = "monopile_mass")]
    MonopileMass,
    #[serde(rename = "monopile_cost")]
    MonopileCost,
    #[serde(rename = "structural_mass")]
    StructuralMass,
    #[serde(rename = "structural_cost")]
    StructuralCost,
    #[serde(rename = "rotor_overspeed")]
    RotorOverspeed,
}

impl MeritFigure {
    pub const ALL: [MeritFigure; 13] = [
        MeritFigure::Lcoe,
        MeritFigure::Aep,
        MeritFigure::Cp,
        MeritFigure::BladeMass,
        MeritFigure::BladeCost,
        MeritFigure::BladeTipDeflection,
        MeritFigure::TowerMass,
        MeritFigure::TowerCost,
        MeritFigure::MonopileMass,
        MeritFigure::MonopileCost,
        MeritFigure::StructuralMass,
        MeritFigure::StructuralCost,
        MeritFigure::RotorOverspeed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MeritFigure::Lcoe => "LCOE",
            MeritFigure::Aep => "AEP",
            MeritFigure::Cp => "Cp",
            MeritFigure::BladeMass => "blade_mass",
            MeritFigure::BladeCost => "blade_cost",
            MeritFigure::BladeTipDeflection => "blade_tip_deflection",
            MeritFigure::TowerMass => "tower_mass",
            MeritFigure::TowerCost => "tower_cost",
            MeritFigure::MonopileMass => "monopile_mass",
            MeritFigure::MonopileCost => "monopile_cost",
            MeritFigure::StructuralMass => "structural_mass",
            MeritFigure::StructuralCost => "structural_cost",
            MeritFigure::RotorOverspeed => "rotor_overspeed",
        }
    }

    /// Whether the framework maximizes rather than minimizes this figure.
    pub fn is_maximized(&self) -> bool {
        matches!(self, MeritFigure::Aep | MeritFigure::Cp)
    }

    pub fn allowed_names() -> String {
        Self::ALL
            .iter()
            .map(MeritFigure::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for MeritFigure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MeritFigure {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|figure| figure.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| SchemaError::UnknownMeritFigure {
                name: s.to_string(),
                allowed: Self::allowed_names(),
            })
    }
}

// ============================================================================
// Driver
// ============================================================================

/// Optimization algorithm requested from the external framework.
///
/// Unrecognized names are kept as [`Solver::Unknown`] so that they surface as
/// validation issues alongside everything else wrong with the document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Solver {
    Slsqp,
    Conmin,
    Cobyla,
    Snopt,
    Ipopt,
    Unknown(String),
}

impl Solver {
    pub const KNOWN: [Solver; 5] = [
        Solver::Slsqp,
        Solver::Conmin,
        Solver::Cobyla,
        Solver::Snopt,
        Solver::Ipopt,
    ];

    pub fn from_name(name: &str) -> Self {
        let trimmed = name.trim();
        Self::KNOWN
            .iter()
            .find(|solver| solver.name().eq_ignore_ascii_case(trimmed))
            .cloned()
            .unwrap_or_else(|| Solver::Unknown(name.to_string()))
    }

    pub fn name(&self) -> &str {
        match self {
            Solver::Slsqp => "SLSQP",
            Solver::Conmin => "CONMIN",
            Solver::Cobyla => "COBYLA",
            Solver::Snopt => "SNOPT",
            Solver::Ipopt => "IPOPT",
            Solver::Unknown(name) => name,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Solver::Unknown(_))
    }

    /// Only SNOPT distinguishes major and minor iterations.
    pub fn has_major_minor_iterations(&self) -> bool {
        matches!(self, Solver::Snopt)
    }

    pub fn known_names() -> String {
        Self::KNOWN
            .iter()
            .map(|solver| solver.name().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Solver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Solver {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Any name loads; unknown solvers are reported by validation.
impl<'de> Deserialize<'de> for Solver {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(|name| Solver::from_name(&name))
    }
}

/// Finite-difference mode for gradient approximation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FdForm {
    #[default]
    Forward,
    Central,
}

impl FdForm {
    pub fn as_str(&self) -> &'static str {
        match self {
            FdForm::Forward => "forward",
            FdForm::Central => "central",
        }
    }
}

impl FromStr for FdForm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "forward" => Ok(FdForm::Forward),
            "central" => Ok(FdForm::Central),
            _ => Err("forward, central".to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for FdForm {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        de::choice(deserializer)
    }
}

/// Settings for the gradient-based optimization driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OptimizationDriver {
    #[serde(default)]
    pub flag: bool,
    #[serde(default = "default_solver")]
    pub solver: Solver,
    /// Convergence tolerance
    #[serde(default = "default_tol", deserialize_with = "de::number")]
    pub tol: f64,
    #[serde(default = "default_max_iter", deserialize_with = "de::count")]
    pub max_iter: usize,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de::optional_count"
    )]
    pub max_major_iter: Option<usize>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de::optional_count"
    )]
    pub max_minor_iter: Option<usize>,
    /// Finite-difference step
    #[serde(default = "default_step_size", deserialize_with = "de::number")]
    pub step_size: f64,
    #[serde(default)]
    pub form: FdForm,
}

fn default_solver() -> Solver {
    Solver::Slsqp
}

fn default_tol() -> f64 {
    1e-6
}

fn default_max_iter() -> usize {
    100
}

fn default_step_size() -> f64 {
    1e-3
}

impl Default for OptimizationDriver {
    fn default() -> Self {
        Self {
            flag: false,
            solver: default_solver(),
            tol: default_tol(),
            max_iter: default_max_iter(),
            max_major_iter: None,
            max_minor_iter: None,
            step_size: default_step_size(),
            form: FdForm::default(),
        }
    }
}

/// Sampling scheme for a design-of-experiments run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum DoeGenerator {
    #[default]
    Uniform,
    FullFact,
    PlackettBurman,
    BoxBehnken,
    LatinHypercube,
}

impl DoeGenerator {
    pub const ALL: [DoeGenerator; 5] = [
        DoeGenerator::Uniform,
        DoeGenerator::FullFact,
        DoeGenerator::PlackettBurman,
        DoeGenerator::BoxBehnken,
        DoeGenerator::LatinHypercube,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DoeGenerator::Uniform => "Uniform",
            DoeGenerator::FullFact => "FullFact",
            DoeGenerator::PlackettBurman => "PlackettBurman",
            DoeGenerator::BoxBehnken => "BoxBehnken",
            DoeGenerator::LatinHypercube => "LatinHypercube",
        }
    }
}

impl FromStr for DoeGenerator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|generator| generator.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| {
                Self::ALL
                    .iter()
                    .map(DoeGenerator::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            })
    }
}

impl<'de> Deserialize<'de> for DoeGenerator {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        de::choice(deserializer)
    }
}

/// Design-of-experiments driver, an alternative to optimization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DesignOfExperiments {
    pub flag: bool,
    pub generator: DoeGenerator,
    #[serde(deserialize_with = "de::count")]
    pub num_samples: usize,
    #[serde(deserialize_with = "de::count")]
    pub seed: u64,
    /// Levels per variable for factorial generators
    #[serde(deserialize_with = "de::count")]
    pub levels: usize,
    pub criterion: String,
    pub run_parallel: bool,
}

impl Default for DesignOfExperiments {
    fn default() -> Self {
        Self {
            flag: false,
            generator: DoeGenerator::Uniform,
            num_samples: 5,
            seed: 2,
            levels: 2,
            criterion: "center".to_string(),
            run_parallel: true,
        }
    }
}

/// Driver section in either document form.
///
/// The flat form holds the optimization settings directly; the nested form
/// splits them into `optimization` and `design_of_experiments`, and is
/// recognized by either key.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DriverSettings {
    pub optimization: OptimizationDriver,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub design_of_experiments: Option<DesignOfExperiments>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct NestedDriver {
    #[serde(default)]
    optimization: OptimizationDriver,
    #[serde(default)]
    design_of_experiments: Option<DesignOfExperiments>,
}

impl<'de> Deserialize<'de> for DriverSettings {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = Mapping::deserialize(deserializer)?;
        let nested = map.contains_key("optimization") || map.contains_key("design_of_experiments");
        let document = Value::Mapping(map);
        if nested {
            let NestedDriver {
                optimization,
                design_of_experiments,
            } = serde_yaml::from_value(document).map_err(D::Error::custom)?;
            Ok(Self {
                optimization,
                design_of_experiments,
            })
        } else {
            let optimization = serde_yaml::from_value(document).map_err(D::Error::custom)?;
            Ok(Self {
                optimization,
                design_of_experiments: None,
            })
        }
    }
}

// ============================================================================
// Recorder and general settings
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RecorderSettings {
    pub flag: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Variable-name patterns to record; empty records the defaults
    #[serde(skip_serializing_if = "Vec::is_empty", deserialize_with = "de::one_or_many")]
    pub includes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneralSettings {
    #[serde(default = "default_folder_output")]
    pub folder_output: String,
    #[serde(default = "default_fname_output")]
    pub fname_output: String,
}

fn default_folder_output() -> String {
    "outputs".to_string()
}

fn default_fname_output() -> String {
    "output".to_string()
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            folder_output: default_folder_output(),
            fname_output: default_fname_output(),
        }
    }
}

// ============================================================================
// The whole document
// ============================================================================

/// A loaded optimization configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ConfigurationModel {
    pub general: GeneralSettings,
    /// In document order
    pub design_variables: Vec<DesignVariable>,
    /// In document order
    pub constraints: Vec<Constraint>,
    /// Every merit figure the document selects; valid documents select one
    pub merit_figures: Vec<MeritFigure>,
    pub driver: DriverSettings,
    pub recorder: RecorderSettings,
}

impl ConfigurationModel {
    /// The objective, when exactly one is selected.
    pub fn merit_figure(&self) -> Option<MeritFigure> {
        match self.merit_figures.as_slice() {
            [figure] => Some(*figure),
            _ => None,
        }
    }

    pub fn active_design_variables(&self) -> impl Iterator<Item = &DesignVariable> {
        self.design_variables.iter().filter(|dv| dv.flag)
    }

    pub fn active_constraints(&self) -> impl Iterator<Item = &Constraint> {
        self.constraints.iter().filter(|c| c.flag)
    }

    /// Component names in first-seen order.
    pub fn components(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        let all = self
            .design_variables
            .iter()
            .map(DesignVariable::component)
            .chain(self.constraints.iter().map(Constraint::component));
        for name in all {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    pub fn design_variables_for<'a>(
        &'a self,
        component: &'a str,
    ) -> impl Iterator<Item = &'a DesignVariable> {
        self.design_variables
            .iter()
            .filter(move |dv| dv.component() == component)
    }

    pub fn constraints_for<'a>(
        &'a self,
        component: &'a str,
    ) -> impl Iterator<Item = &'a Constraint> {
        self.constraints
            .iter()
            .filter(move |c| c.component() == component)
    }

    pub fn design_variable(&self, path: &ParameterPath) -> Option<&DesignVariable> {
        self.design_variables.iter().find(|dv| &dv.path == path)
    }

    pub fn constraint(&self, path: &ParameterPath) -> Option<&Constraint> {
        self.constraints.iter().find(|c| &c.path == path)
    }
}
