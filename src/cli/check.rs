//! Check command: validates the changelog configuration.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::config::{load_config, validate, OutputFormat, ValidationReport};

/// Check command options.
#[derive(Parser)]
pub struct CheckCommand {
    /// Configuration file (defaults to the first `.grenrc*` found).
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Repository directory used for discovery (defaults to the current directory).
    #[arg(long, value_name = "DIR")]
    pub repo: Option<PathBuf>,

    /// Output format: text (default), json, yaml.
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,

    /// Exits with an error code on warnings too.
    #[arg(long)]
    pub strict: bool,
}

impl CheckCommand {
    /// Executes the check command.
    ///
    /// Exit codes: 0 valid, 1 errors, 2 warnings with `--strict`.
    pub fn execute(self) -> Result<()> {
        let repo_dir = super::project_dir(self.repo.as_deref())?;
        let loaded = load_config(self.config.as_deref(), &repo_dir)?;

        if self.format == OutputFormat::Text {
            println!("🔍 Checking {}", loaded.source);
        }

        let report = validate(&loaded.config);
        println!("{}", render_report(&report, self.format)?);

        let exit_code = report.exit_code(self.strict);
        if exit_code != 0 {
            std::process::exit(exit_code);
        }

        Ok(())
    }
}

fn render_report(report: &ValidationReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(report.to_text()),
        OutputFormat::Json => {
            serde_json::to_string_pretty(report).context("Failed to serialize report to JSON")
        }
        OutputFormat::Yaml => {
            crate::data::to_yaml(report).context("Failed to serialize report to YAML")
        }
    }
}
