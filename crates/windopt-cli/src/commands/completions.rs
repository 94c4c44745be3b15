use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use clap_complete::{generate, Shell};

use windopt_cli::cli::build_cli_command;

/// Print the completion script for `shell`, or write it to `out`.
pub fn handle(shell: Shell, out: Option<&Path>) -> Result<()> {
    let mut command = build_cli_command();
    let bin_name = command.get_name().to_string();

    let mut sink: Box<dyn Write> = match out {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
            let file = fs::File::create(path)
                .with_context(|| format!("creating {}", path.display()))?;
            Box::new(io::BufWriter::new(file))
        }
        None => Box::new(io::stdout()),
    };
    generate(shell, &mut command, bin_name.as_str(), &mut sink);
    sink.flush()?;

    if let Some(path) = out {
        println!("Wrote {shell} completions for {bin_name} to {}", path.display());
    }
    Ok(())
}
