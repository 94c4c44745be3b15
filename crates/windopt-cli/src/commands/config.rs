use anyhow::Result;

use windopt_cli::cli::ConfigCommands;
use windopt_cli::config::{ensure_settings, load_settings, settings_path};

pub fn handle(command: &ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Init { force } => {
            let (path, written) = ensure_settings(*force)?;
            if written {
                println!("Wrote default settings to {}", path.display());
            } else {
                println!(
                    "Settings already exist at {} (use --force to reset them)",
                    path.display()
                );
            }
        }
        ConfigCommands::Show => {
            let settings = load_settings()?;
            println!("# {}", settings_path()?.display());
            print!("{}", toml::to_string_pretty(&settings)?);
        }
    }
    Ok(())
}
