//! # relnotes
//!
//! Changelog and release notes generation driven by a `.grenrc` configuration.
//!
//! Entries come from a snapshot of closed issues or merged pull requests, or
//! straight from git commits, and are assigned to release tags, grouped by
//! label and rendered through user-supplied templates.
//!
//! ## Quick Start
//!
//! ```rust
//! use relnotes::config::{validate, ChangelogConfig};
//!
//! let config = ChangelogConfig::default();
//! assert!(!validate(&config).has_errors());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod changelog;
pub mod cli;
pub mod config;
pub mod data;
pub mod git;
pub mod template;

pub use crate::cli::Cli;

/// The current version of relnotes.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
