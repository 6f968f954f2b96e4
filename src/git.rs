//! Local git repository access: tags and the commits between them.

use anyhow::Result;

pub mod commit;
pub mod repository;

pub use commit::CommitEntry;
pub use repository::GitRepository;

/// Number of hex characters to show in abbreviated commit hashes.
pub const SHORT_HASH_LEN: usize = 8;

/// Source of commits between two revisions.
///
/// Implemented by [`GitRepository`]; changelog assembly only depends on this
/// trait so it can be driven without a repository on disk.
pub trait CommitSource {
    /// Returns commits reachable from `to` but not from `from`, oldest first.
    fn commits_between(&self, from: Option<&str>, to: &str) -> Result<Vec<CommitEntry>>;
}
