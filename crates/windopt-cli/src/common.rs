//! Argument types and helpers shared across commands.

use anyhow::{anyhow, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::path::Path;

use windopt_io::{Library, LibrarySection, Loader};

use crate::config::WindoptSettings;

/// Output format for reports and summaries.
#[derive(ValueEnum, Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable aligned table
    #[default]
    Table,
    /// JSON object (pipe-friendly, structured)
    Json,
}

/// Document section as named on the command line.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SectionArg {
    General,
    DesignVariables,
    Constraints,
    Driver,
    Recorder,
}

impl From<SectionArg> for LibrarySection {
    fn from(arg: SectionArg) -> Self {
        match arg {
            SectionArg::General => LibrarySection::General,
            SectionArg::DesignVariables => LibrarySection::DesignVariables,
            SectionArg::Constraints => LibrarySection::Constraints,
            SectionArg::Driver => LibrarySection::Drivers,
            SectionArg::Recorder => LibrarySection::Recorders,
        }
    }
}

/// Write data as JSON to the given writer.
pub fn write_json<W: Write, T: Serialize>(data: &T, writer: &mut W, pretty: bool) -> io::Result<()> {
    if pretty {
        serde_json::to_writer_pretty(&mut *writer, data).map_err(io::Error::other)?;
    } else {
        serde_json::to_writer(&mut *writer, data).map_err(io::Error::other)?;
    }
    writeln!(writer)?;
    Ok(())
}

/// The data library to use, if any.
///
/// The `--library` flag wins over `WINDOPT_LIBRARY`, which wins over the
/// settings file. The configured fallback applies to whichever is chosen.
pub fn resolve_library(flag: Option<&Path>, settings: &WindoptSettings) -> Result<Option<Library>> {
    let primary = match flag {
        Some(root) => Some(Library::open(root)?),
        None => match Library::from_env()? {
            Some(library) => Some(library),
            None => settings
                .library
                .path
                .as_ref()
                .map(|root| Library::open(root))
                .transpose()?,
        },
    };
    Ok(primary.map(|library| match &settings.library.fallback {
        Some(fallback) => library.with_fallback(fallback),
        None => library,
    }))
}

/// Like [`resolve_library`], but a library is required.
pub fn require_library(flag: Option<&Path>, settings: &WindoptSettings) -> Result<Library> {
    resolve_library(flag, settings)?.ok_or_else(|| {
        anyhow!("no data library configured; pass --library, set WINDOPT_LIBRARY or set [library] path in the settings file")
    })
}

pub fn loader_for(library: Option<Library>) -> Loader {
    match library {
        Some(library) => Loader::new().with_library(library),
        None => Loader::new(),
    }
}

/// `2..8`, `2..`, `..8` or `-`.
pub fn format_indices(start: Option<usize>, end: Option<usize>) -> String {
    match (start, end) {
        (None, None) => "-".to_string(),
        (start, end) => format!(
            "{}..{}",
            start.map(|s| s.to_string()).unwrap_or_default(),
            end.map(|e| e.to_string()).unwrap_or_default()
        ),
    }
}
