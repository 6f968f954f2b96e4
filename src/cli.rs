//! CLI interface for relnotes.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

pub mod check;
pub mod config;
pub mod generate;
pub mod help;

/// relnotes: release notes and changelogs from tags, issues and commits.
#[derive(Parser)]
#[command(name = "relnotes")]
#[command(about = "Generates changelogs from tags, issues, pull requests and commits", long_about = None)]
#[command(version)]
pub struct Cli {
    /// The main command to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Generates or updates the changelog.
    Generate(generate::GenerateCommand),
    /// Validates the configuration.
    Check(check::CheckCommand),
    /// Shows or creates configuration files.
    Config(config::ConfigCommand),
    /// Displays comprehensive help for all commands.
    #[command(name = "help-all")]
    HelpAll(help::HelpCommand),
}

impl Cli {
    /// Executes the CLI command.
    pub fn execute(self) -> Result<()> {
        match self.command {
            Commands::Generate(cmd) => cmd.execute(),
            Commands::Check(cmd) => cmd.execute(),
            Commands::Config(cmd) => cmd.execute(),
            Commands::HelpAll(cmd) => cmd.execute(),
        }
    }
}

/// Resolves `--repo`, defaulting to the current directory.
fn project_dir(repo: Option<&Path>) -> Result<PathBuf> {
    match repo {
        Some(dir) => Ok(dir.to_path_buf()),
        None => std::env::current_dir().context("Failed to determine current directory"),
    }
}
