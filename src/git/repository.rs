//! Git repository operations

use std::path::Path;

use anyhow::{Context, Result};
use chrono::DateTime;
use git2::{Repository, Sort};
use tracing::debug;

use super::{CommitEntry, CommitSource};
use crate::data::Tag;

/// Git repository wrapper
pub struct GitRepository {
    repo: Repository,
}

impl GitRepository {
    /// Opens the repository at `path`.
    pub fn open_at<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let repo = Repository::open(path)
            .with_context(|| format!("Not a git repository: {}", path.display()))?;

        Ok(Self { repo })
    }

    /// List tags with the commit time of the tagged commit, oldest first.
    ///
    /// Tags that do not point at a commit are skipped.
    pub fn tags(&self) -> Result<Vec<Tag>> {
        let names = self.repo.tag_names(None).context("Failed to list tags")?;
        let mut tags = Vec::new();

        for name in names.iter().flatten() {
            let object = self
                .repo
                .revparse_single(&format!("refs/tags/{name}"))
                .with_context(|| format!("Failed to resolve tag: {name}"))?;

            let commit = match object.peel_to_commit() {
                Ok(commit) => commit,
                Err(e) => {
                    debug!("Skipping tag {name}: {e}");
                    continue;
                }
            };

            let date = DateTime::from_timestamp(commit.time().seconds(), 0)
                .with_context(|| format!("Invalid timestamp on tag: {name}"))?;

            tags.push(Tag {
                name: name.to_string(),
                date,
            });
        }

        tags.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.name.cmp(&b.name)));
        Ok(tags)
    }

    /// Resolves a tag name to its commit, falling back to any revision
    /// (branch, hash) when no such tag exists.
    fn resolve_commit(&self, rev: &str) -> Result<git2::Commit<'_>> {
        let object = match self.repo.revparse_single(&format!("refs/tags/{rev}")) {
            Ok(object) => object,
            Err(_) => {
                debug!("No tag named {rev}, resolving it as a revision");
                self.repo
                    .revparse_single(rev)
                    .with_context(|| format!("Failed to resolve revision: {rev}"))?
            }
        };

        object
            .peel_to_commit()
            .with_context(|| format!("Failed to peel {rev} to a commit"))
    }
}

impl CommitSource for GitRepository {
    fn commits_between(&self, from: Option<&str>, to: &str) -> Result<Vec<CommitEntry>> {
        let end = self.resolve_commit(to)?;

        let mut walker = self.repo.revwalk().context("Failed to create revwalk")?;
        walker
            .set_sorting(Sort::TOPOLOGICAL | Sort::TIME)
            .context("Failed to set revwalk sorting")?;
        walker.push(end.id()).context("Failed to push end commit")?;

        if let Some(from) = from {
            let start = self.resolve_commit(from)?;
            walker.hide(start.id()).context("Failed to hide start commit")?;
        }

        let mut commits = Vec::new();
        for oid in walker {
            let oid = oid.context("Failed to get commit OID from walker")?;
            let commit = self.repo.find_commit(oid).context("Failed to find commit")?;
            commits.push(CommitEntry::from_git_commit(&commit)?);
        }

        // Reverse to get chronological order (oldest first)
        commits.reverse();
        debug!("{} commit(s) in {}..{to}", commits.len(), from.unwrap_or(""));
        Ok(commits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::{Oid, Signature, Time};
    use tempfile::TempDir;

    fn commit(repo: &Repository, message: &str, seconds: i64, parents: &[Oid]) -> Oid {
        let sig = Signature::new("Test User", "test@example.com", &Time::new(seconds, 0)).unwrap();
        let tree_id = repo.index().unwrap().write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let parents: Vec<_> = parents.iter().map(|id| repo.find_commit(*id).unwrap()).collect();
        let parents: Vec<_> = parents.iter().collect();
        repo.commit(None, &sig, &sig, message, &tree, &parents).unwrap()
    }

    fn setup() -> (TempDir, Repository) {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        (dir, repo)
    }

    #[test]
    fn open_at_rejects_plain_directory() {
        let dir = TempDir::new().unwrap();
        assert!(GitRepository::open_at(dir.path()).is_err());
    }

    #[test]
    fn tags_sorted_by_commit_date_including_annotated() {
        let (dir, repo) = setup();
        let first = commit(&repo, "first", 1_000, &[]);
        let second = commit(&repo, "second", 2_000, &[first]);

        let sig = Signature::new("Test User", "test@example.com", &Time::new(3_000, 0)).unwrap();
        repo.tag("v2", &repo.find_object(first, None).unwrap(), &sig, "annotated", false)
            .unwrap();
        repo.tag_lightweight("v1", &repo.find_object(second, None).unwrap(), false)
            .unwrap();

        let tags = GitRepository::open_at(dir.path()).unwrap().tags().unwrap();
        let names: Vec<_> = tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["v2", "v1"]);
        assert_eq!(tags[0].date.timestamp(), 1_000);
    }

    #[test]
    fn commits_between_tags_oldest_first() {
        let (dir, repo) = setup();
        let a = commit(&repo, "a", 1_000, &[]);
        let b = commit(&repo, "b", 2_000, &[a]);
        let side = commit(&repo, "side", 2_500, &[a]);
        let merge = commit(&repo, "Merge side", 3_000, &[b, side]);
        repo.tag_lightweight("start", &repo.find_object(a, None).unwrap(), false)
            .unwrap();
        repo.tag_lightweight("end", &repo.find_object(merge, None).unwrap(), false)
            .unwrap();

        let git = GitRepository::open_at(dir.path()).unwrap();

        let all = git.commits_between(None, "start").unwrap();
        assert_eq!(all.len(), 1);

        let range = git.commits_between(Some("start"), "end").unwrap();
        let messages: Vec<_> = range.iter().map(|c| c.message.as_str()).collect();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages.last(), Some(&"Merge side"));
        assert!(range.last().unwrap().is_merge);
        assert!(!range[0].is_merge);
    }

    #[test]
    fn commits_between_prefers_tags_over_other_refs() {
        let (dir, repo) = setup();
        let a = commit(&repo, "a", 1_000, &[]);
        let b = commit(&repo, "b", 2_000, &[a]);
        repo.tag_lightweight("v1", &repo.find_object(a, None).unwrap(), false)
            .unwrap();
        repo.branch("v1", &repo.find_commit(b).unwrap(), false).unwrap();
        repo.reference("refs/v1", b, false, "same name as a tag").unwrap();

        let git = GitRepository::open_at(dir.path()).unwrap();
        let commits = git.commits_between(None, "v1").unwrap();
        let messages: Vec<_> = commits.iter().map(|c| c.message.as_str()).collect();
        assert_eq!(messages, vec!["a"]);

        // Names that are not tags still resolve as revisions.
        let commits = git.commits_between(Some("v1"), &b.to_string()).unwrap();
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].message, "b");
    }

    #[test]
    fn commits_between_unknown_revision_is_error() {
        let (dir, repo) = setup();
        commit(&repo, "a", 1_000, &[]);

        let git = GitRepository::open_at(dir.path()).unwrap();
        let err = git.commits_between(None, "missing").unwrap_err();
        assert!(err.to_string().contains("missing"));
    }
}
