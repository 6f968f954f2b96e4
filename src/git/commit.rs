//! Commit metadata used for commit-based changelogs.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use git2::Commit;
use serde::{Deserialize, Serialize};

use super::SHORT_HASH_LEN;

/// A commit as listed in a changelog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitEntry {
    /// Full SHA-1 hash.
    pub hash: String,
    /// Author name.
    pub author: String,
    /// Commit time.
    pub date: DateTime<Utc>,
    /// First line of the commit message.
    pub message: String,
    /// Whether the commit has more than one parent.
    pub is_merge: bool,
}

impl CommitEntry {
    /// Creates a `CommitEntry` from a `git2::Commit`.
    pub fn from_git_commit(commit: &Commit) -> Result<Self> {
        let time = commit.time();
        let date = DateTime::from_timestamp(time.seconds(), 0).context("Invalid commit timestamp")?;

        Ok(Self {
            hash: commit.id().to_string(),
            author: commit.author().name().unwrap_or("Unknown").to_string(),
            date,
            message: commit.summary().unwrap_or("").trim().to_string(),
            is_merge: commit.parent_count() > 1,
        })
    }

    /// Returns the hash truncated to [`SHORT_HASH_LEN`] characters.
    pub fn short_hash(&self) -> &str {
        if self.hash.len() > SHORT_HASH_LEN {
            &self.hash[..SHORT_HASH_LEN]
        } else {
            &self.hash
        }
    }
}
