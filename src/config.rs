//! Changelog configuration: the `.grenrc` model, discovery, loading and validation.

use std::path::PathBuf;

use thiserror::Error;

use crate::template::TemplateError;

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{discover_config, load_config, ConfigFormat, ConfigSource, LoadedConfig};
pub use model::{
    ChangelogConfig, ConfigOverrides, DataSource, Group, GroupBy, IncludeMessages, Templates,
    CATCH_ALL_LABEL,
};
pub use validate::{validate, ConfigIssue, IssueSeverity, OutputFormat, ValidationReport};

/// Errors raised while loading or compiling a configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read configuration file {}", path.display())]
    Read {
        /// File that failed to read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration content is not valid for its format.
    #[error("Failed to parse {format} configuration{}: {message}", origin(path.as_ref()))]
    Parse {
        /// File the content came from, when known.
        path: Option<PathBuf>,
        /// Format the content was parsed as.
        format: ConfigFormat,
        /// Parser message.
        message: String,
    },

    /// A template could not be parsed or uses unsupported placeholders.
    #[error("Invalid template '{key}': {source}")]
    Template {
        /// Configuration key of the template, e.g. `template.issue`.
        key: String,
        /// Underlying template error.
        #[source]
        source: TemplateError,
    },

    /// Validation found errors.
    #[error("Configuration has {count} error(s); run `relnotes check` for details")]
    Invalid {
        /// Number of error-level issues.
        count: usize,
    },
}

fn origin(path: Option<&PathBuf>) -> String {
    path.map(|p| format!(" {}", p.display())).unwrap_or_default()
}
