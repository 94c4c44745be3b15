//! Reading and writing windopt configuration documents.
//!
//! - [`load`]: YAML text or files into a [`windopt_core::ConfigurationModel`]
//! - [`dump`]: the model back into its canonical document
//! - [`library`]: reusable sub-configurations referenced by name

pub mod dump;
pub mod library;
pub mod load;

pub use dump::{to_document, to_yaml_string, write_to_path};
pub use library::{Library, LibrarySection, LIBRARY_ENV};
pub use load::{load_from_path, load_from_str, Loader};
