//! Local snapshot of issue and pull request metadata.
//!
//! The accepted shapes match the JSON printed by `gh issue list --json ...`
//! and `gh pr list --json ...`, so an export can be used without rewriting.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A released tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Tag name, e.g. `1.4.0` or `v1.4.0`.
    pub name: String,
    /// When the tagged commit was made.
    pub date: DateTime<Utc>,
}

/// Issues, pull requests and (optionally) tags exported from a repository host.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Release tags; read from the git repository when empty.
    #[serde(default)]
    pub tags: Vec<Tag>,
    /// Issues.
    #[serde(default)]
    pub issues: Vec<Entry>,
    /// Pull requests.
    #[serde(default, alias = "pull_requests")]
    pub pull_requests: Vec<Entry>,
}

/// An issue or pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// Issue or pull request number.
    pub number: u64,
    /// Title.
    pub title: String,
    /// Web URL.
    #[serde(default, alias = "html_url")]
    pub url: String,
    /// Author.
    #[serde(default, alias = "user")]
    pub author: Option<Author>,
    /// Label names.
    #[serde(default, deserialize_with = "de_names")]
    pub labels: Vec<String>,
    /// Milestone title.
    #[serde(default, deserialize_with = "de_optional_name")]
    pub milestone: Option<String>,
    /// When the issue was closed.
    #[serde(default, alias = "closed_at")]
    pub closed_at: Option<DateTime<Utc>>,
    /// When the pull request was merged.
    #[serde(default, alias = "merged_at")]
    pub merged_at: Option<DateTime<Utc>>,
}

/// Issue or pull request author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    /// Account login.
    pub login: String,
    /// Profile URL; derived from the login when absent.
    #[serde(default, alias = "html_url", skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Author {
    /// Returns the profile URL, falling back to `https://github.com/<login>`.
    pub fn profile_url(&self) -> String {
        self.url
            .clone()
            .unwrap_or_else(|| format!("https://github.com/{}", self.login))
    }
}

/// A label or milestone given either as a plain string or as an object.
#[derive(Deserialize)]
#[serde(untagged)]
enum NamedRef {
    Plain(String),
    Named { name: String },
    Titled { title: String },
}

impl NamedRef {
    fn into_name(self) -> String {
        match self {
            Self::Plain(s) | Self::Named { name: s } | Self::Titled { title: s } => s,
        }
    }
}

fn de_names<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let raw: Option<Vec<NamedRef>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(NamedRef::into_name)
        .collect())
}

fn de_optional_name<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    let raw: Option<NamedRef> = Option::deserialize(deserializer)?;
    Ok(raw.map(NamedRef::into_name).filter(|s| !s.is_empty()))
}

impl Entry {
    /// Returns `#<number>`, the text used for issue links.
    pub fn reference(&self) -> String {
        format!("#{}", self.number)
    }

    /// Returns the author login, or an empty string when unknown.
    pub fn user_login(&self) -> &str {
        self.author.as_ref().map_or("", |a| a.login.as_str())
    }

    /// Returns the author profile URL, or an empty string when unknown.
    pub fn user_url(&self) -> String {
        self.author.as_ref().map(Author::profile_url).unwrap_or_default()
    }
}

impl Snapshot {
    /// Loads a snapshot; `.json` files are read as JSON, anything else as YAML.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot file: {}", path.display()))?;

        let snapshot = if path.extension().is_some_and(|e| e == "json") {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse snapshot file: {}", path.display()))?
        } else {
            crate::data::from_yaml(&content)
                .with_context(|| format!("Failed to parse snapshot file: {}", path.display()))?
        };

        Ok(snapshot)
    }
}
