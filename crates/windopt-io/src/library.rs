//! Data library of reusable sub-configurations.
//!
//! A library is a directory with one subdirectory per document section:
//!
//! ```text
//! <library>/
//!   general/           run output settings
//!   design_variables/  design variable trees
//!   constraints/       constraint trees
//!   drivers/           driver settings
//!   recorders/         recorder settings
//! ```
//!
//! A section written as a bare string, such as `driver: slsqp_tight`, is a
//! reference to `<library>/drivers/slsqp_tight.yaml`. Items missing from the
//! primary library are looked up in an optional fallback library.

use serde_yaml::{Mapping, Value};
use std::collections::BTreeSet;
use std::fs;
use std::iter;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use windopt_core::{WindoptError, WindoptResult};

use crate::load::{parse_yaml, read_text};

/// Environment variable naming the default library root.
pub const LIBRARY_ENV: &str = "WINDOPT_LIBRARY";

const ITEM_EXTENSIONS: [&str; 2] = ["yaml", "yml"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LibrarySection {
    General,
    DesignVariables,
    Constraints,
    Drivers,
    Recorders,
}

impl LibrarySection {
    pub const ALL: [LibrarySection; 5] = [
        LibrarySection::General,
        LibrarySection::DesignVariables,
        LibrarySection::Constraints,
        LibrarySection::Drivers,
        LibrarySection::Recorders,
    ];

    /// Section for a top-level document key; `merit_figure` has none.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "general" => Some(LibrarySection::General),
            "design_variables" | "optimization_variables" => Some(LibrarySection::DesignVariables),
            "constraints" => Some(LibrarySection::Constraints),
            "driver" => Some(LibrarySection::Drivers),
            "recorder" => Some(LibrarySection::Recorders),
            _ => None,
        }
    }

    /// Top-level document key.
    pub fn key(&self) -> &'static str {
        match self {
            LibrarySection::General => "general",
            LibrarySection::DesignVariables => "design_variables",
            LibrarySection::Constraints => "constraints",
            LibrarySection::Drivers => "driver",
            LibrarySection::Recorders => "recorder",
        }
    }

    pub fn dir_name(&self) -> &'static str {
        match self {
            LibrarySection::General => "general",
            LibrarySection::DesignVariables => "design_variables",
            LibrarySection::Constraints => "constraints",
            LibrarySection::Drivers => "drivers",
            LibrarySection::Recorders => "recorders",
        }
    }

    /// The value of this section in a parsed document, honoring the
    /// `optimization_variables` alias.
    pub fn value_in<'a>(&self, document: &'a Mapping) -> Option<&'a Value> {
        match self {
            LibrarySection::DesignVariables => document
                .get("design_variables")
                .or_else(|| document.get("optimization_variables")),
            other => document.get(other.key()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Library {
    root: PathBuf,
    fallback: Option<PathBuf>,
}

impl Library {
    /// Open the library rooted at `root`, which must be a directory.
    pub fn open(root: impl Into<PathBuf>) -> WindoptResult<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(WindoptError::Library(format!(
                "invalid library path '{}'",
                root.display()
            )));
        }
        debug!(root = %root.display(), "opened data library");
        Ok(Self {
            root,
            fallback: None,
        })
    }

    /// Open the library named by `WINDOPT_LIBRARY`, if set.
    pub fn from_env() -> WindoptResult<Option<Self>> {
        match std::env::var_os(LIBRARY_ENV) {
            Some(root) if !root.is_empty() => Self::open(PathBuf::from(root)).map(Some),
            _ => Ok(None),
        }
    }

    pub fn with_fallback(mut self, fallback: impl Into<PathBuf>) -> Self {
        self.fallback = Some(fallback.into());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn fallback(&self) -> Option<&Path> {
        self.fallback.as_deref()
    }

    /// Path of the item file, searching the primary library first.
    pub fn locate(&self, section: LibrarySection, name: &str) -> WindoptResult<PathBuf> {
        check_item_name(name)?;
        for base in self.search_roots() {
            for ext in ITEM_EXTENSIONS {
                let candidate = base.join(section.dir_name()).join(format!("{name}.{ext}"));
                if candidate.is_file() {
                    return Ok(candidate);
                }
            }
        }
        Err(WindoptError::LibraryItemNotFound {
            dir: section.dir_name().to_string(),
            file: format!("{name}.yaml"),
        })
    }

    pub fn load_item(&self, section: LibrarySection, name: &str) -> WindoptResult<Value> {
        let path = self.locate(section, name)?;
        debug!(item = %path.display(), "loading library item");
        let text = read_text(&path)?;
        Ok(parse_yaml(&path.display().to_string(), &text)?)
    }

    /// Item names available for `section` across both libraries, sorted.
    pub fn list(&self, section: LibrarySection) -> WindoptResult<Vec<String>> {
        let mut names = BTreeSet::new();
        for base in self.search_roots() {
            let dir = base.join(section.dir_name());
            if !dir.is_dir() {
                continue;
            }
            for entry in fs::read_dir(&dir)? {
                let path = entry?.path();
                let is_item = path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ITEM_EXTENSIONS.contains(&ext));
                if !is_item {
                    continue;
                }
                if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                    names.insert(stem.to_string());
                }
            }
        }
        Ok(names.into_iter().collect())
    }

    /// Save `value` as a library item in the primary library.
    ///
    /// Fails when the item already exists unless `overwrite` is set.
    pub fn export(
        &self,
        section: LibrarySection,
        name: &str,
        value: &Value,
        overwrite: bool,
    ) -> WindoptResult<PathBuf> {
        check_item_name(name)?;
        let dir = self.root.join(section.dir_name());
        let path = dir.join(format!("{name}.yaml"));
        if path.exists() && !overwrite {
            return Err(WindoptError::Library(format!(
                "'{}' already exists (use overwrite to replace it)",
                path.display()
            )));
        }
        fs::create_dir_all(&dir)?;
        let text =
            serde_yaml::to_string(value).map_err(|err| WindoptError::Serialize(err.to_string()))?;
        fs::write(&path, text)?;
        info!(item = %path.display(), "exported library item");
        Ok(path)
    }

    fn search_roots(&self) -> impl Iterator<Item = &Path> {
        iter::once(self.root.as_path()).chain(self.fallback.as_deref())
    }
}

fn check_item_name(name: &str) -> WindoptResult<()> {
    if name.is_empty() || name.starts_with('.') || name.contains(['/', '\\']) {
        return Err(WindoptError::Library(format!(
            "invalid library item name '{name}'"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load::Loader;
    use tempfile::tempdir;
    use windopt_core::{SchemaError, Solver};

    fn write(root: &Path, relative: &str, text: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }

    #[test]
    fn open_requires_directory() {
        let dir = tempdir().unwrap();
        let err = Library::open(dir.path().join("missing")).unwrap_err();
        assert!(err.to_string().contains("invalid library path"));
    }

    #[test]
    fn resolves_section_reference() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "drivers/snopt_long.yml",
            "solver: SNOPT\nmax_major_iter: 50\n",
        );
        let library = Library::open(dir.path()).unwrap();
        let model = Loader::new()
            .with_library(library)
            .load_str("merit_figure: LCOE\ndriver: snopt_long\n")
            .unwrap();
        assert_eq!(model.driver.optimization.solver, Solver::Snopt);
        assert_eq!(model.driver.optimization.max_major_iter, Some(50));
    }

    #[test]
    fn falls_back_to_second_library() {
        let primary = tempdir().unwrap();
        let fallback = tempdir().unwrap();
        write(fallback.path(), "recorders/sql.yaml", "flag: true\nfile_name: log.sql\n");

        let library = Library::open(primary.path())
            .unwrap()
            .with_fallback(fallback.path());
        let located = library.locate(LibrarySection::Recorders, "sql").unwrap();
        assert!(located.starts_with(fallback.path()));
    }

    #[test]
    fn missing_item_names_directory_and_file() {
        let dir = tempdir().unwrap();
        let library = Library::open(dir.path()).unwrap();
        let err = library
            .load_item(LibrarySection::Constraints, "tower_standard")
            .unwrap_err();
        assert!(matches!(
            err,
            WindoptError::LibraryItemNotFound { ref dir, ref file }
                if dir == "constraints" && file == "tower_standard.yaml"
        ));
    }

    #[test]
    fn broken_item_is_a_syntax_error() {
        let dir = tempdir().unwrap();
        write(dir.path(), "general/bad.yaml", "folder_output: [\n");
        let library = Library::open(dir.path()).unwrap();
        let err = library.load_item(LibrarySection::General, "bad").unwrap_err();
        assert!(matches!(err, WindoptError::Schema(SchemaError::Syntax(_))));
    }

    #[test]
    fn lists_items_from_both_libraries() {
        let primary = tempdir().unwrap();
        let fallback = tempdir().unwrap();
        write(primary.path(), "drivers/b.yaml", "{}");
        write(primary.path(), "drivers/notes.txt", "ignored");
        write(fallback.path(), "drivers/a.yml", "{}");
        write(fallback.path(), "drivers/b.yaml", "{}");

        let library = Library::open(primary.path())
            .unwrap()
            .with_fallback(fallback.path());
        assert_eq!(library.list(LibrarySection::Drivers).unwrap(), vec!["a", "b"]);
        assert!(library.list(LibrarySection::Recorders).unwrap().is_empty());
    }

    #[test]
    fn export_refuses_to_overwrite() {
        let dir = tempdir().unwrap();
        let library = Library::open(dir.path()).unwrap();
        let value: Value = serde_yaml::from_str("flag: true\nsolver: COBYLA\n").unwrap();

        let path = library
            .export(LibrarySection::Drivers, "cobyla", &value, false)
            .unwrap();
        assert!(path.ends_with("drivers/cobyla.yaml"));

        let err = library
            .export(LibrarySection::Drivers, "cobyla", &value, false)
            .unwrap_err();
        assert!(err.to_string().contains("already exists"));

        library
            .export(LibrarySection::Drivers, "cobyla", &value, true)
            .unwrap();
        assert_eq!(library.load_item(LibrarySection::Drivers, "cobyla").unwrap(), value);
    }

    #[test]
    fn rejects_item_names_with_separators() {
        let dir = tempdir().unwrap();
        let library = Library::open(dir.path()).unwrap();
        assert!(library.locate(LibrarySection::General, "../etc").is_err());
        assert!(library.locate(LibrarySection::General, "").is_err());
    }

    #[test]
    fn section_keys_round_trip() {
        for section in LibrarySection::ALL {
            assert_eq!(LibrarySection::from_key(section.key()), Some(section));
        }
        assert_eq!(
            LibrarySection::from_key("optimization_variables"),
            Some(LibrarySection::DesignVariables)
        );
        assert_eq!(LibrarySection::from_key("merit_figure"), None);
    }
}
