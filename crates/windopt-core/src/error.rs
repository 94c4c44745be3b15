//! Error types for configuration loading.
//!
//! [`SchemaError`] covers documents that cannot be turned into a
//! [`ConfigurationModel`](crate::ConfigurationModel) at all. Every variant that
//! concerns a particular node carries the dotted path of that node so the user
//! can find it in the YAML file.
//!
//! [`WindoptError`] is the error returned at crate API boundaries, wrapping
//! schema errors together with I/O, library and serialization failures.
//!
//! # Example
//!
//! ```ignore
//! use windopt_core::{WindoptError, WindoptResult};
//!
//! fn run(path: &Path) -> WindoptResult<()> {
//!     let model = load_from_path(path)?;
//!     let issues = validate(&model);
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// A structurally invalid configuration document.
///
/// These are fatal: no model is produced and the run cannot proceed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    /// The text is not well-formed YAML
    #[error("YAML syntax error: {0}")]
    Syntax(String),

    /// A key at the document root that no section recognizes
    #[error("unknown top-level key '{0}'")]
    UnknownTopLevelKey(String),

    /// A key the enclosing mapping does not allow
    #[error("{path}: unknown field '{key}'")]
    UnknownField { path: String, key: String },

    /// Both spellings of the design variable section were given
    #[error("'design_variables' and 'optimization_variables' are aliases; use only one")]
    DuplicateSection,

    #[error("{path}: expected {expected}, found {found}")]
    WrongType {
        path: String,
        expected: &'static str,
        found: String,
    },

    #[error("{path}: expected a number, found {found}")]
    NonNumeric { path: String, found: String },

    /// Bound keys from different shapes mixed on one entry, or a pair given half-way
    #[error("{path}: {message}")]
    BoundShape { path: String, message: String },

    #[error("unknown merit figure '{name}'; expected one of: {allowed}")]
    UnknownMeritFigure { name: String, allowed: String },

    /// A closed settings section (general, driver, recorder) failed to deserialize
    #[error("{path}: {message}")]
    InvalidSection { path: String, message: String },

    #[error("{path}: missing required field '{key}'")]
    MissingField { path: String, key: String },

    /// A section names a library item but no data library is configured
    #[error("{path}: refers to library item '{name}' but no data library is configured")]
    UnresolvedReference { path: String, name: String },

    #[error("invalid parameter path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },
}

/// Unified error type for windopt operations.
#[derive(Error, Debug)]
pub enum WindoptError {
    /// I/O errors (file access)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The document does not match the configuration schema
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// A referenced sub-configuration is missing from every searched library
    #[error("library item '{file}' not found in '{dir}'")]
    LibraryItemNotFound { dir: String, file: String },

    /// Other data library failures (bad root, refused overwrite, bad item name)
    #[error("Library error: {0}")]
    Library(String),

    /// Writing a model back to YAML failed
    #[error("Serialization error: {0}")]
    Serialize(String),
}

/// Convenience type alias for Results using WindoptError.
pub type WindoptResult<T> = Result<T, WindoptError>;

impl From<serde_yaml::Error> for WindoptError {
    fn from(err: serde_yaml::Error) -> Self {
        WindoptError::Schema(SchemaError::Syntax(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_error_mentions_path() {
        let err = SchemaError::NonNumeric {
            path: "design_variables.tower.outer_diameter.lower_bound".into(),
            found: "a string 'wide'".into(),
        };
        let text = err.to_string();
        assert!(text.contains("tower.outer_diameter.lower_bound"));
        assert!(text.contains("expected a number"));
    }

    #[test]
    fn schema_error_converts_into_windopt_error() {
        fn inner() -> Result<(), SchemaError> {
            Err(SchemaError::DuplicateSection)
        }

        fn outer() -> WindoptResult<()> {
            inner()?;
            Ok(())
        }

        let err = outer().unwrap_err();
        assert!(matches!(err, WindoptError::Schema(SchemaError::DuplicateSection)));
        assert!(err.to_string().starts_with("Schema error"));
    }

    #[test]
    fn io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: WindoptError = io_err.into();
        assert!(matches!(err, WindoptError::Io(_)));
    }

    #[test]
    fn yaml_error_becomes_syntax_error() {
        let yaml_err = serde_yaml::from_str::<serde_yaml::Value>("a: [1, 2").unwrap_err();
        let err: WindoptError = yaml_err.into();
        assert!(matches!(err, WindoptError::Schema(SchemaError::Syntax(_))));
    }
}
