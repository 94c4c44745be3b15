use clap::{CommandFactory, Parser, Subcommand, ValueHint};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::common::{OutputFormat, SectionArg};

#[derive(Parser, Debug)]
#[command(
    name = "windopt",
    author,
    version,
    about = "Load, validate and normalize wind turbine design optimization configurations",
    long_about = None
)]
pub struct Cli {
    /// Set the logging level (defaults to the settings file, then warn)
    #[arg(long, global = true)]
    pub log_level: Option<tracing::Level>,

    /// Data library root; overrides WINDOPT_LIBRARY and the settings file
    #[arg(long, global = true, value_hint = ValueHint::DirPath)]
    pub library: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load a configuration and report every validation issue
    Validate {
        /// Configuration file (YAML or JSON)
        #[arg(value_hint = ValueHint::FilePath)]
        config: PathBuf,
        /// Also check parameter names against a registry file, or `builtin`
        #[arg(long)]
        registry: Option<String>,
        /// Output format (defaults to the settings file)
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
    },
    /// Summarize design variables, constraints and driver settings
    Show {
        #[arg(value_hint = ValueHint::FilePath)]
        config: PathBuf,
        /// Only list entries of this component
        #[arg(long)]
        component: Option<String>,
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
    },
    /// Write the canonical form of a configuration
    Normalize {
        #[arg(value_hint = ValueHint::FilePath)]
        config: PathBuf,
        /// Output file; stdout when omitted
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        out: Option<PathBuf>,
    },
    /// Reusable sub-configurations
    Library {
        #[command(subcommand)]
        command: LibraryCommands,
    },
    /// The windopt settings file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: Shell,
        /// Write output to a file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum LibraryCommands {
    /// List the items available in each section
    List {
        /// Only list this section
        #[arg(long, value_enum)]
        section: Option<SectionArg>,
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
    },
    /// Save one section of a configuration as a library item
    Export {
        /// Configuration to take the section from
        #[arg(value_hint = ValueHint::FilePath)]
        config: PathBuf,
        #[arg(long, value_enum)]
        section: SectionArg,
        /// Item name, without extension
        #[arg(long)]
        name: String,
        /// Replace an existing item
        #[arg(long)]
        overwrite: bool,
    },
    /// Print the library directories that are searched
    Path,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Write the default settings file
    Init {
        /// Replace an existing settings file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective settings
    Show,
}

pub fn build_cli_command() -> clap::Command {
    Cli::command()
}
