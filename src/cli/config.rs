//! Configuration-related CLI commands.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use crate::config::{load_config, ChangelogConfig};

/// Configuration operations.
#[derive(Parser)]
pub struct ConfigCommand {
    /// Configuration subcommand to execute.
    #[command(subcommand)]
    pub command: ConfigSubcommands,
}

/// Configuration subcommands.
#[derive(Subcommand)]
pub enum ConfigSubcommands {
    /// Shows the effective configuration, defaults filled in.
    Show(ShowCommand),
    /// Writes a starter configuration file.
    Init(InitCommand),
}

/// File format for `config` output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FileFormat {
    /// YAML.
    Yaml,
    /// JSON.
    Json,
}

/// Show command options.
#[derive(Parser)]
pub struct ShowCommand {
    /// Configuration file (defaults to the first `.grenrc*` found).
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Repository directory used for discovery (defaults to the current directory).
    #[arg(long, value_name = "DIR")]
    pub repo: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, default_value = "yaml")]
    pub format: FileFormat,
}

/// Init command options.
#[derive(Parser)]
pub struct InitCommand {
    /// Directory to write the file into (defaults to the current directory).
    #[arg(long, value_name = "DIR")]
    pub repo: Option<PathBuf>,

    /// File format; picks `.grenrc.yml` or `.grenrc.json`.
    #[arg(long, value_enum, default_value = "yaml")]
    pub format: FileFormat,

    /// Overwrites an existing file.
    #[arg(long)]
    pub force: bool,
}

impl ConfigCommand {
    /// Executes the config command.
    pub fn execute(self) -> Result<()> {
        match self.command {
            ConfigSubcommands::Show(show_cmd) => show_cmd.execute(),
            ConfigSubcommands::Init(init_cmd) => init_cmd.execute(),
        }
    }
}

impl ShowCommand {
    /// Executes the show command.
    pub fn execute(self) -> Result<()> {
        let repo_dir = super::project_dir(self.repo.as_deref())?;
        let loaded = load_config(self.config.as_deref(), &repo_dir)?;

        let rendered = match self.format {
            FileFormat::Yaml => {
                println!("# Source: {}", loaded.source);
                loaded.config.to_yaml()?
            }
            FileFormat::Json => loaded.config.to_json()?,
        };
        println!("{rendered}");
        Ok(())
    }
}

impl InitCommand {
    /// Executes the init command.
    pub fn execute(self) -> Result<()> {
        let repo_dir = super::project_dir(self.repo.as_deref())?;
        let path = write_starter_config(&repo_dir, self.format, self.force)?;
        println!("✅ Created {}", path.display());
        Ok(())
    }
}

/// Writes the default configuration as `.grenrc.yml` or `.grenrc.json` in `dir`.
fn write_starter_config(dir: &Path, format: FileFormat, force: bool) -> Result<PathBuf> {
    let (name, content) = match format {
        FileFormat::Yaml => (
            ".grenrc.yml",
            serde_yaml::to_string(&ChangelogConfig::default())
                .context("Failed to serialize configuration to YAML")?,
        ),
        FileFormat::Json => (".grenrc.json", ChangelogConfig::default().to_json()? + "\n"),
    };

    let path = dir.join(name);
    if path.exists() && !force {
        bail!("{} already exists; use --force to overwrite", path.display());
    }

    fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}
