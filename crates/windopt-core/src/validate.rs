//! Cross-field validation of a loaded configuration.
//!
//! [`validate`] never stops at the first problem: it walks the whole model and
//! returns every [`ValidationIssue`] so a user can fix a document in one edit
//! cycle. The consuming framework refuses to start a run while any issue
//! remains.
//!
//! # Example
//!
//! ```
//! use windopt_core::{validate, ConfigurationModel, IssueKind, ValidationReport};
//!
//! // No merit figure selected
//! let model = ConfigurationModel::default();
//! let report = ValidationReport::from_issues(validate(&model));
//!
//! assert_eq!(report.len(), 1);
//! assert_eq!(report.count(IssueKind::MeritFigure), 1);
//! ```

use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use tracing::debug;

use crate::model::{
    ConfigurationModel, Constraint, ConstraintBound, DesignVariable, DoeGenerator, Limit,
    MeritFigure, Solver, VariableBounds,
};

/// What kind of invariant an issue violates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Zero or several merit figures selected
    MeritFigure,
    /// `index_start` / `index_end` / `n_opt` out of order
    IndexOrder,
    /// Lower side not below the upper side
    BoundOrder,
    /// Infinite or NaN bound
    NonFinite,
    /// A quantity that must be positive or non-negative is not
    Negative,
    /// Solver name outside the known set
    Solver,
    /// A driver option the chosen solver does not honor
    SolverOption,
    /// Inconsistent driver settings
    Driver,
    /// Optimization enabled with nothing to vary
    NoActiveDesignVariables,
    /// The same parameter targeted by two design variables
    Duplicate,
    /// Recording enabled without somewhere to record to
    Recorder,
    /// Unusable output naming
    General,
    /// Component or parameter unknown to the consuming framework
    UnknownReference,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::MeritFigure => "merit_figure",
            IssueKind::IndexOrder => "index_order",
            IssueKind::BoundOrder => "bound_order",
            IssueKind::NonFinite => "non_finite",
            IssueKind::Negative => "negative",
            IssueKind::Solver => "solver",
            IssueKind::SolverOption => "solver_option",
            IssueKind::Driver => "driver",
            IssueKind::NoActiveDesignVariables => "no_active_design_variables",
            IssueKind::Duplicate => "duplicate",
            IssueKind::Recorder => "recorder",
            IssueKind::General => "general",
            IssueKind::UnknownReference => "unknown_reference",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single violated invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub kind: IssueKind,
    /// Dotted path of the offending field, e.g. `design_variables.tower.outer_diameter`
    pub field: String,
    /// Human-readable description
    pub message: String,
}

impl ValidationIssue {
    pub fn new(kind: IssueKind, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.field, self.message)
    }
}

/// Collection of issues with summary helpers.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_issues(issues: Vec<ValidationIssue>) -> Self {
        Self { issues }
    }

    pub fn extend(&mut self, issues: impl IntoIterator<Item = ValidationIssue>) {
        self.issues.extend(issues);
    }

    /// True when the configuration may be run.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn count(&self, kind: IssueKind) -> usize {
        self.of_kind(kind).count()
    }

    pub fn of_kind(&self, kind: IssueKind) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(move |issue| issue.kind == kind)
    }

    pub fn summary(&self) -> String {
        match self.issues.len() {
            0 => "No issues".to_string(),
            1 => "1 issue".to_string(),
            n => format!("{n} issues"),
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Validation: {}", self.summary())?;
        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }
        Ok(())
    }
}

/// Check every cross-field invariant of `model`.
pub fn validate(model: &ConfigurationModel) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    check_merit_figures(&model.merit_figures, &mut issues);

    let mut seen = HashSet::new();
    for dv in &model.design_variables {
        if !seen.insert(&dv.path) {
            issues.push(ValidationIssue::new(
                IssueKind::Duplicate,
                format!("design_variables.{}", dv.path),
                "parameter is targeted by more than one design variable",
            ));
        }
        check_design_variable(dv, &mut issues);
    }

    for constraint in &model.constraints {
        check_constraint(constraint, &mut issues);
    }

    check_driver(model, &mut issues);
    check_recorder(model, &mut issues);
    check_general(model, &mut issues);

    debug!(issues = issues.len(), "validated configuration");
    issues
}

fn check_merit_figures(selected: &[MeritFigure], issues: &mut Vec<ValidationIssue>) {
    match selected {
        [_] => {}
        [] => issues.push(ValidationIssue::new(
            IssueKind::MeritFigure,
            "merit_figure",
            format!(
                "no merit figure selected; choose exactly one of: {}",
                MeritFigure::allowed_names()
            ),
        )),
        many => {
            let names: Vec<&str> = many.iter().map(MeritFigure::as_str).collect();
            issues.push(ValidationIssue::new(
                IssueKind::MeritFigure,
                "merit_figure",
                format!(
                    "{} merit figures selected ({}); exactly one is allowed",
                    many.len(),
                    names.join(", ")
                ),
            ));
        }
    }
}

fn check_design_variable(dv: &DesignVariable, issues: &mut Vec<ValidationIssue>) {
    let field = format!("design_variables.{}", dv.path);

    if dv.n_opt == Some(0) {
        issues.push(ValidationIssue::new(
            IssueKind::Negative,
            format!("{field}.n_opt"),
            "n_opt must be at least 1",
        ));
    }

    check_indices(&field, dv.index_start, dv.index_end, issues);

    // Indices beyond the control points; reported once for the larger index.
    if let Some(n_opt) = dv.n_opt.filter(|n| *n > 0) {
        let widest = [("index_start", dv.index_start), ("index_end", dv.index_end)]
            .into_iter()
            .filter_map(|(key, index)| index.map(|index| (key, index)))
            .max_by_key(|(_, index)| *index);
        if let Some((key, index)) = widest.filter(|(_, index)| *index > n_opt) {
            issues.push(ValidationIssue::new(
                IssueKind::IndexOrder,
                format!("{field}.{key}"),
                format!("{key} {index} exceeds n_opt {n_opt}"),
            ));
        }
    }

    match dv.bounds {
        VariableBounds::Unbounded => {}
        VariableBounds::Absolute(limit) => {
            if !limit.is_finite() {
                issues.push(non_finite(&field));
            } else if let Limit::Both { lower, upper } = limit {
                if lower >= upper {
                    issues.push(ValidationIssue::new(
                        IssueKind::BoundOrder,
                        field.clone(),
                        format!("lower_bound {lower} must be below upper_bound {upper}"),
                    ));
                }
            }
        }
        VariableBounds::Relative {
            max_decrease,
            max_increase,
        } => {
            if !max_decrease.is_finite() || !max_increase.is_finite() {
                issues.push(non_finite(&field));
            } else if max_decrease < 0.0 || max_increase < 0.0 {
                issues.push(ValidationIssue::new(
                    IssueKind::Negative,
                    field.clone(),
                    format!(
                        "max_decrease ({max_decrease}) and max_increase ({max_increase}) must not be negative"
                    ),
                ));
            }
        }
    }
}

fn check_constraint(constraint: &Constraint, issues: &mut Vec<ValidationIssue>) {
    let field = format!("constraints.{}", constraint.path);

    check_indices(&field, constraint.index_start, constraint.index_end, issues);

    match constraint.bound {
        ConstraintBound::Unbounded => {}
        ConstraintBound::OneSided(limit) => {
            if !limit.is_finite() {
                issues.push(non_finite(&field));
            } else if let Limit::Both { lower, upper } = limit {
                if lower > upper {
                    issues.push(ValidationIssue::new(
                        IssueKind::BoundOrder,
                        field.clone(),
                        format!("min {lower} exceeds max {upper}"),
                    ));
                }
            }
        }
        ConstraintBound::Range(limit) => {
            if !limit.is_finite() {
                issues.push(non_finite(&field));
            } else if let Limit::Both { lower, upper } = limit {
                if lower > upper {
                    issues.push(ValidationIssue::new(
                        IssueKind::BoundOrder,
                        field.clone(),
                        format!("lower_bound {lower} exceeds upper_bound {upper}"),
                    ));
                }
            }
        }
        ConstraintBound::Target {
            target,
            acceptable_error,
        } => {
            if !target.is_finite() || !acceptable_error.is_finite() {
                issues.push(non_finite(&field));
            } else if acceptable_error < 0.0 {
                issues.push(ValidationIssue::new(
                    IssueKind::Negative,
                    format!("{field}.acceptable_error"),
                    format!("acceptable_error {acceptable_error} must not be negative"),
                ));
            }
        }
    }
}

fn check_indices(
    field: &str,
    start: Option<usize>,
    end: Option<usize>,
    issues: &mut Vec<ValidationIssue>,
) {
    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            issues.push(ValidationIssue::new(
                IssueKind::IndexOrder,
                field.to_string(),
                format!("index_start {start} is after index_end {end}"),
            ));
        }
    }
}

fn check_driver(model: &ConfigurationModel, issues: &mut Vec<ValidationIssue>) {
    let opt = &model.driver.optimization;

    if let Solver::Unknown(name) = &opt.solver {
        issues.push(ValidationIssue::new(
            IssueKind::Solver,
            "driver.optimization.solver",
            format!(
                "unknown solver '{name}'; expected one of: {}",
                Solver::known_names()
            ),
        ));
    } else if !opt.solver.has_major_minor_iterations() {
        for (key, value) in [
            ("max_major_iter", opt.max_major_iter),
            ("max_minor_iter", opt.max_minor_iter),
        ] {
            if value.is_some() {
                issues.push(ValidationIssue::new(
                    IssueKind::SolverOption,
                    format!("driver.optimization.{key}"),
                    format!("{key} is only honored by SNOPT, not {}", opt.solver),
                ));
            }
        }
    }

    for (key, value) in [("tol", opt.tol), ("step_size", opt.step_size)] {
        if !(value.is_finite() && value > 0.0) {
            issues.push(ValidationIssue::new(
                IssueKind::Driver,
                format!("driver.optimization.{key}"),
                format!("{key} must be a positive finite number, found {value}"),
            ));
        }
    }

    if opt.max_iter == 0 {
        issues.push(ValidationIssue::new(
            IssueKind::Driver,
            "driver.optimization.max_iter",
            "max_iter must be at least 1",
        ));
    }

    if let Some(doe) = &model.driver.design_of_experiments {
        if doe.flag && opt.flag {
            issues.push(ValidationIssue::new(
                IssueKind::Driver,
                "driver",
                "optimization and design_of_experiments cannot both be enabled",
            ));
        }
        if doe.num_samples == 0 {
            issues.push(ValidationIssue::new(
                IssueKind::Driver,
                "driver.design_of_experiments.num_samples",
                "num_samples must be at least 1",
            ));
        }
        if doe.generator == DoeGenerator::FullFact && doe.levels < 2 {
            issues.push(ValidationIssue::new(
                IssueKind::Driver,
                "driver.design_of_experiments.levels",
                format!("FullFact needs at least 2 levels, found {}", doe.levels),
            ));
        }
    }

    if opt.flag && model.active_design_variables().next().is_none() {
        issues.push(ValidationIssue::new(
            IssueKind::NoActiveDesignVariables,
            "design_variables",
            "optimization is enabled but no design variable has flag: true",
        ));
    }
}

fn check_recorder(model: &ConfigurationModel, issues: &mut Vec<ValidationIssue>) {
    let recorder = &model.recorder;
    let has_file = recorder
        .file_name
        .as_deref()
        .is_some_and(|name| !name.trim().is_empty());
    if recorder.flag && !has_file {
        issues.push(ValidationIssue::new(
            IssueKind::Recorder,
            "recorder.file_name",
            "recording is enabled but no file_name is given",
        ));
    }
}

fn check_general(model: &ConfigurationModel, issues: &mut Vec<ValidationIssue>) {
    for (key, value) in [
        ("folder_output", &model.general.folder_output),
        ("fname_output", &model.general.fname_output),
    ] {
        if value.trim().is_empty() {
            issues.push(ValidationIssue::new(
                IssueKind::General,
                format!("general.{key}"),
                format!("{key} must not be empty"),
            ));
        }
    }
}

fn non_finite(field: &str) -> ValidationIssue {
    ValidationIssue::new(
        IssueKind::NonFinite,
        field.to_string(),
        "bounds must be finite numbers",
    )
}
