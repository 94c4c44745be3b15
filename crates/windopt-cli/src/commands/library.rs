use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{anyhow, Result};
use tabwriter::TabWriter;

use windopt_cli::cli::LibraryCommands;
use windopt_cli::common::{
    loader_for, require_library, resolve_library, write_json, OutputFormat, SectionArg,
};
use windopt_cli::config::WindoptSettings;
use windopt_io::{to_document, Library, LibrarySection};

pub fn handle(
    command: &LibraryCommands,
    library: Option<&Path>,
    settings: &WindoptSettings,
) -> Result<()> {
    match command {
        LibraryCommands::List { section, format } => list(
            &require_library(library, settings)?,
            *section,
            format.unwrap_or(settings.output.format),
        ),
        LibraryCommands::Export {
            config,
            section,
            name,
            overwrite,
        } => export(config, *section, name, *overwrite, library, settings),
        LibraryCommands::Path => path(library, settings),
    }
}

fn list(library: &Library, section: Option<SectionArg>, format: OutputFormat) -> Result<()> {
    let sections: Vec<LibrarySection> = match section {
        Some(section) => vec![section.into()],
        None => LibrarySection::ALL.to_vec(),
    };
    let mut items = BTreeMap::new();
    for section in sections {
        items.insert(section.dir_name(), library.list(section)?);
    }

    match format {
        OutputFormat::Table => {
            let mut writer = TabWriter::new(io::stdout());
            writeln!(writer, "SECTION\tITEM")?;
            for (section, names) in &items {
                for name in names {
                    writeln!(writer, "{section}\t{name}")?;
                }
            }
            writer.flush()?;
        }
        OutputFormat::Json => write_json(&items, &mut io::stdout(), true)?,
    }
    Ok(())
}

fn export(
    config: &Path,
    section: SectionArg,
    name: &str,
    overwrite: bool,
    library: Option<&Path>,
    settings: &WindoptSettings,
) -> Result<()> {
    let target = require_library(library, settings)?;
    let section = LibrarySection::from(section);

    // Export the canonical form so the item loads back the same way.
    let model = loader_for(Some(target.clone())).load_path(config)?;
    let document = to_document(&model);
    let value = document
        .as_mapping()
        .and_then(|root| section.value_in(root))
        .ok_or_else(|| {
            anyhow!(
                "{} has no '{}' section to export",
                config.display(),
                section.key()
            )
        })?;

    let path = target.export(section, name, value, overwrite)?;
    println!("Exported {} to {}", section.key(), path.display());
    Ok(())
}

fn path(library: Option<&Path>, settings: &WindoptSettings) -> Result<()> {
    match resolve_library(library, settings)? {
        Some(library) => {
            println!("library: {}", library.root().display());
            if let Some(fallback) = library.fallback() {
                println!("fallback: {}", fallback.display());
            }
        }
        None => println!("no data library configured"),
    }
    Ok(())
}
