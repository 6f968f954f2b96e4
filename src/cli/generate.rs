//! Generate command: builds the changelog and writes it.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{debug, warn};

use crate::changelog::{write_changelog, Generator};
use crate::config::{
    load_config, validate, ChangelogConfig, ConfigError, ConfigOverrides, DataSource,
    IssueSeverity,
};
use crate::data::Snapshot;
use crate::git::{CommitSource, GitRepository};

/// Generate command options.
#[derive(Parser)]
pub struct GenerateCommand {
    /// Configuration file (defaults to the first `.grenrc*` found).
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Issue and pull request snapshot, JSON or YAML.
    /// Required for the issues, prs and milestones data sources.
    #[arg(long, value_name = "FILE")]
    pub data: Option<PathBuf>,

    /// Repository directory (defaults to the current directory).
    #[arg(long, value_name = "DIR")]
    pub repo: Option<PathBuf>,

    /// Changelog file to write; overrides changelogFilename.
    #[arg(long, short, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Overrides dataSource: issues, prs, commits or milestones.
    #[arg(long, value_name = "SOURCE")]
    pub data_source: Option<DataSource>,

    /// Overrides the release name prefix.
    #[arg(long)]
    pub prefix: Option<String>,

    /// Only includes entries that belong to a milestone.
    #[arg(long)]
    pub only_milestones: bool,

    /// Replaces the changelog instead of adding missing releases.
    #[arg(long = "override")]
    pub override_file: bool,

    /// Only renders releases whose tag matches this glob (e.g. `v2.*`).
    #[arg(long, value_name = "GLOB")]
    pub tags: Option<String>,

    /// Prints the changelog instead of writing it.
    #[arg(long)]
    pub stdout: bool,
}

impl GenerateCommand {
    /// Executes the generate command.
    pub fn execute(self) -> Result<()> {
        let repo_dir = super::project_dir(self.repo.as_deref())?;
        let loaded = load_config(self.config.as_deref(), &repo_dir)?;
        debug!("Using configuration from {}", loaded.source);

        let mut config = loaded.config;
        self.overrides().apply(&mut config);
        check_config(&config)?;

        let snapshot = self.load_snapshot(config.data_source)?;
        let repo = if config.data_source == DataSource::Commits || snapshot.tags.is_empty() {
            Some(GitRepository::open_at(&repo_dir).with_context(|| {
                format!("Failed to open git repository at {}", repo_dir.display())
            })?)
        } else {
            None
        };

        let tags = match &repo {
            Some(repo) if snapshot.tags.is_empty() => repo.tags()?,
            _ => snapshot.tags.clone(),
        };
        if tags.is_empty() {
            bail!("No tags found; create a release tag first");
        }

        let mut generator = Generator::new(&config)?;
        if let Some(pattern) = &self.tags {
            generator = generator.with_tag_glob(pattern)?;
        }

        let commits = repo.as_ref().map(|r| r as &dyn CommitSource);
        let releases = generator.releases(&tags, &snapshot, commits)?;
        let rendered = generator.render(&releases)?;

        if self.stdout {
            print!("{}", rendered.to_markdown());
            return Ok(());
        }

        let path = repo_dir.join(&config.changelog_filename);
        let outcome = write_changelog(&path, &rendered, config.override_file)?;
        if outcome.written == 0 {
            println!("✅ {} is up to date", outcome.path.display());
        } else {
            println!(
                "✅ Wrote {} release(s) to {} ({} already present)",
                outcome.written,
                outcome.path.display(),
                outcome.skipped
            );
        }

        Ok(())
    }

    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            data_source: self.data_source,
            prefix: self.prefix.clone(),
            only_milestones: self.only_milestones,
            changelog_filename: self
                .output
                .as_ref()
                .map(|p| p.to_string_lossy().into_owned()),
            override_file: self.override_file,
        }
    }

    fn load_snapshot(&self, source: DataSource) -> Result<Snapshot> {
        match &self.data {
            Some(path) => Snapshot::load_from_file(path),
            None if source == DataSource::Commits => Ok(Snapshot::default()),
            None => bail!("The {source} data source needs a snapshot; pass --data <FILE>"),
        }
    }
}

/// Fails on validation errors; warnings are logged and generation continues.
fn check_config(config: &ChangelogConfig) -> Result<()> {
    let report = validate(config);

    for issue in &report.issues {
        if issue.severity == IssueSeverity::Warning {
            warn!("{}: {}", issue.key, issue.explanation);
        }
    }

    if report.has_errors() {
        eprint!("{}", report.to_text());
        return Err(ConfigError::Invalid {
            count: report.summary.error_count,
        }
        .into());
    }

    Ok(())
}
