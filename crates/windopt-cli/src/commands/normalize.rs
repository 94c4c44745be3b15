use std::path::Path;

use anyhow::Result;
use tracing::warn;

use windopt_cli::common::{loader_for, resolve_library};
use windopt_cli::config::WindoptSettings;
use windopt_core::validate;
use windopt_io::{to_yaml_string, write_to_path};

pub fn handle(
    config: &Path,
    out: Option<&Path>,
    library: Option<&Path>,
    settings: &WindoptSettings,
) -> Result<()> {
    let model = loader_for(resolve_library(library, settings)?).load_path(config)?;
    let issues = validate(&model);
    if !issues.is_empty() {
        warn!(
            issues = issues.len(),
            "normalizing a configuration that does not validate"
        );
    }

    match out {
        Some(path) => {
            write_to_path(&model, path)?;
            println!("Wrote normalized configuration to {}", path.display());
        }
        None => print!("{}", to_yaml_string(&model)?),
    }
    Ok(())
}
