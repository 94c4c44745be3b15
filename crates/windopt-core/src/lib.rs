//! # windopt-core: Optimization Configuration Model
//!
//! Typed representation of a wind-turbine design optimization document:
//! which parameters the optimizer may vary, the single merit figure it
//! minimizes, the constraints it must respect, and the driver and recorder
//! settings handed to the external optimization framework.
//!
//! The crate carries no I/O. `windopt-io` turns YAML into a
//! [`ConfigurationModel`]; this crate checks it.
//!
//! ## Quick Start
//!
//! ```rust
//! use windopt_core::*;
//!
//! let mut model = ConfigurationModel::default();
//! model.merit_figures.push(MeritFigure::StructuralMass);
//!
//! let mut diameter = DesignVariable::new(ParameterPath::new("tower").child("outer_diameter"));
//! diameter.flag = true;
//! diameter.bounds = VariableBounds::Absolute(Limit::Both { lower: 3.87, upper: 8.0 });
//! model.design_variables.push(diameter);
//!
//! assert!(validate(&model).is_empty());
//! assert!(check_references(&model, &StaticRegistry::builtin()).is_empty());
//! ```

mod de;
pub mod error;
pub mod model;
pub mod registry;
pub mod validate;

pub use error::{SchemaError, WindoptError, WindoptResult};
pub use model::{
    ConfigurationModel, Constraint, ConstraintBound, DesignOfExperiments, DesignVariable,
    DoeGenerator, DriverSettings, FdForm, GeneralSettings, Limit, MeritFigure,
    OptimizationDriver, ParameterPath, RecorderSettings, Segment, Solver, VariableBounds,
};
pub use registry::{check_references, OpenRegistry, PathPattern, ReferenceScope, SchemaRegistry, StaticRegistry};
pub use validate::{validate, IssueKind, ValidationIssue, ValidationReport};
