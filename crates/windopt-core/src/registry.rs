//! Lazy checking of component and parameter names.
//!
//! Loading never rejects a parameter name: only the consuming framework knows
//! which quantities its analysis kernels expose. It plugs that knowledge in
//! through [`SchemaRegistry`], and [`check_references`] turns unknown names into
//! [`ValidationIssue`]s of kind [`IssueKind::UnknownReference`].

use serde::Deserialize;

use crate::error::SchemaError;
use crate::model::{split_path, ConfigurationModel, ParameterPath, Segment};
use crate::validate::{IssueKind, ValidationIssue};

/// Which section a name was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceScope {
    DesignVariable,
    Constraint,
}

/// Knowledge of which parameters exist in the consuming framework.
pub trait SchemaRegistry {
    fn knows(&self, scope: ReferenceScope, path: &ParameterPath) -> bool;

    /// Whether the component owns any parameter in `scope`.
    fn knows_component(&self, _scope: ReferenceScope, _component: &str) -> bool {
        true
    }
}

/// Accepts every name.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenRegistry;

impl SchemaRegistry for OpenRegistry {
    fn knows(&self, _scope: ReferenceScope, _path: &ParameterPath) -> bool {
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PatternSegment {
    Key(String),
    Layer(String),
    AnyKey,
    AnyLayer,
}

impl PatternSegment {
    fn matches(&self, segment: &Segment) -> bool {
        match (self, segment) {
            (PatternSegment::AnyKey, Segment::Key(_)) => true,
            (PatternSegment::AnyLayer, Segment::Layer(_)) => true,
            (PatternSegment::Key(want), Segment::Key(have)) => want == have,
            (PatternSegment::Layer(want), Segment::Layer(have)) => want == have,
            _ => false,
        }
    }
}

/// A dotted path where `*` stands for any single segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    segments: Vec<PatternSegment>,
}

impl PathPattern {
    pub fn parse(pattern: &str) -> Result<Self, SchemaError> {
        let segments = split_path(pattern)?
            .into_iter()
            .map(|segment| match segment {
                Segment::Key(key) if key == "*" => PatternSegment::AnyKey,
                Segment::Layer(name) if name == "*" => PatternSegment::AnyLayer,
                Segment::Key(key) => PatternSegment::Key(key),
                Segment::Layer(name) => PatternSegment::Layer(name),
            })
            .collect();
        Ok(Self { segments })
    }

    pub fn matches(&self, path: &ParameterPath) -> bool {
        let segments = path.segments();
        self.segments.len() == segments.len()
            && self
                .segments
                .iter()
                .zip(segments)
                .all(|(pattern, segment)| pattern.matches(segment))
    }

    fn matches_component(&self, component: &str) -> bool {
        match self.segments.first() {
            Some(PatternSegment::AnyKey) => true,
            Some(PatternSegment::Key(key)) => key == component,
            _ => false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    design_variables: Vec<String>,
    #[serde(default)]
    constraints: Vec<String>,
}

/// Registry built from explicit path patterns.
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    design_variables: Vec<PathPattern>,
    constraints: Vec<PathPattern>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a known parameter pattern for one scope.
    pub fn allow(mut self, scope: ReferenceScope, pattern: &str) -> Result<Self, SchemaError> {
        let pattern = PathPattern::parse(pattern)?;
        match scope {
            ReferenceScope::DesignVariable => self.design_variables.push(pattern),
            ReferenceScope::Constraint => self.constraints.push(pattern),
        }
        Ok(self)
    }

    /// Parse `{design_variables: [..], constraints: [..]}`.
    pub fn from_yaml_str(text: &str) -> Result<Self, SchemaError> {
        let file: RegistryFile =
            serde_yaml::from_str(text).map_err(|err| SchemaError::Syntax(err.to_string()))?;
        let mut registry = Self::new();
        for pattern in &file.design_variables {
            registry = registry.allow(ReferenceScope::DesignVariable, pattern)?;
        }
        for pattern in &file.constraints {
            registry = registry.allow(ReferenceScope::Constraint, pattern)?;
        }
        Ok(registry)
    }

    /// Parameters exposed by the tower, monopile, blade and control models.
    pub fn builtin() -> Self {
        Self::from_yaml_str(include_str!("../data/known_parameters.yaml"))
            .expect("embedded known_parameters.yaml parses")
    }

    fn patterns(&self, scope: ReferenceScope) -> &[PathPattern] {
        match scope {
            ReferenceScope::DesignVariable => &self.design_variables,
            ReferenceScope::Constraint => &self.constraints,
        }
    }
}

impl SchemaRegistry for StaticRegistry {
    fn knows(&self, scope: ReferenceScope, path: &ParameterPath) -> bool {
        self.patterns(scope)
            .iter()
            .any(|pattern| pattern.matches(path))
    }

    fn knows_component(&self, scope: ReferenceScope, component: &str) -> bool {
        self.patterns(scope)
            .iter()
            .any(|pattern| pattern.matches_component(component))
    }
}

/// Report every design variable and constraint the registry does not know.
pub fn check_references<R: SchemaRegistry + ?Sized>(
    model: &ConfigurationModel,
    registry: &R,
) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let design_variables = model
        .design_variables
        .iter()
        .map(|dv| (ReferenceScope::DesignVariable, "design_variables", &dv.path));
    let constraints = model
        .constraints
        .iter()
        .map(|c| (ReferenceScope::Constraint, "constraints", &c.path));

    for (scope, section, path) in design_variables.chain(constraints) {
        if registry.knows(scope, path) {
            continue;
        }
        let noun = scope_noun(scope);
        let component = path.component();
        let message = if registry.knows_component(scope, component) {
            format!("'{path}' is not a recognized {noun}")
        } else {
            format!("component '{component}' has no {noun}s")
        };
        issues.push(ValidationIssue::new(
            IssueKind::UnknownReference,
            format!("{section}.{path}"),
            message,
        ));
    }
    issues
}

fn scope_noun(scope: ReferenceScope) -> &'static str {
    match scope {
        ReferenceScope::DesignVariable => "design variable",
        ReferenceScope::Constraint => "constraint",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Constraint, DesignVariable};

    fn model() -> ConfigurationModel {
        let mut model = ConfigurationModel::default();
        model.design_variables.push(DesignVariable::new(
            ParameterPath::new("tower").child("outer_diameter"),
        ));
        model.design_variables.push(DesignVariable::new(
            ParameterPath::new("blade").child("structure").layer("Spar_Cap_SS"),
        ));
        model
            .constraints
            .push(Constraint::new(ParameterPath::new("nacelle").child("overhang")));
        model
    }

    #[test]
    fn open_registry_accepts_everything() {
        assert!(check_references(&model(), &OpenRegistry).is_empty());
    }

    #[test]
    fn wildcards_match_single_segments() {
        let pattern = PathPattern::parse("blade.structure[*]").unwrap();
        assert!(pattern.matches(&"blade.structure[Spar_Cap_PS]".parse().unwrap()));
        assert!(!pattern.matches(&"blade.structure".parse().unwrap()));

        let any_component = PathPattern::parse("*.stress").unwrap();
        assert!(any_component.matches(&"monopile.stress".parse().unwrap()));
        assert!(!any_component.matches(&"monopile.stress.extra".parse().unwrap()));
    }

    #[test]
    fn static_registry_reports_unknown_names() {
        let registry = StaticRegistry::new()
            .allow(ReferenceScope::DesignVariable, "tower.outer_diameter")
            .unwrap()
            .allow(ReferenceScope::Constraint, "tower.stress")
            .unwrap();
        let issues = check_references(&model(), &registry);
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].field, "design_variables.blade.structure[Spar_Cap_SS]");
        assert!(issues[0].message.contains("component 'blade'"));
        assert_eq!(issues[1].field, "constraints.nacelle.overhang");
        assert!(issues.iter().all(|i| i.kind == IssueKind::UnknownReference));
    }

    #[test]
    fn registry_from_yaml() {
        let registry = StaticRegistry::from_yaml_str(
            "design_variables: [tower.outer_diameter, 'blade.structure[*]']\nconstraints: []\n",
        )
        .unwrap();
        let issues = check_references(&model(), &registry);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field, "constraints.nacelle.overhang");
    }

    #[test]
    fn bad_pattern_is_a_schema_error() {
        let err = StaticRegistry::from_yaml_str("design_variables: ['tower..x']").unwrap_err();
        assert!(matches!(err, SchemaError::InvalidPath { .. }));
    }

    #[test]
    fn builtin_registry_parses() {
        let registry = StaticRegistry::builtin();
        assert!(registry.knows(
            ReferenceScope::DesignVariable,
            &"tower.outer_diameter".parse().unwrap()
        ));
        assert!(registry.knows(
            ReferenceScope::Constraint,
            &"blade.frequency.flap_3P".parse().unwrap()
        ));
        assert!(!registry.knows(
            ReferenceScope::DesignVariable,
            &"tower.paint_color".parse().unwrap()
        ));
    }
}
