//! Changelog assembly: filtering, release assignment, grouping and rendering.

use anyhow::{bail, Context, Result};
use chrono::format::{Item as FormatItem, StrftimeItems};
use chrono::{DateTime, Utc};
use globset::{Glob, GlobMatcher};
use tracing::{debug, info};

use crate::config::model::CompiledTemplates;
use crate::config::{ChangelogConfig, DataSource};
use crate::data::{Entry, Snapshot, Tag};
use crate::git::{CommitEntry, CommitSource};
use crate::template::{TemplateError, Variables};

pub mod group;
pub mod release;
pub mod render;
pub mod writer;

pub use group::{group_items, Section};
pub use release::Release;
pub use render::{RenderedChangelog, RenderedRelease};
pub use writer::{merge_into_existing, write_changelog, WriteOutcome};

/// Something that becomes one line of the changelog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    /// An issue or pull request.
    Entry(Entry),
    /// A git commit.
    Commit(CommitEntry),
}

impl Item {
    /// Returns the item's labels; commits have none.
    pub fn labels(&self) -> &[String] {
        match self {
            Self::Entry(entry) => &entry.labels,
            Self::Commit(_) => &[],
        }
    }

    /// Short identifier for log messages.
    pub fn describe(&self) -> String {
        match self {
            Self::Entry(entry) => entry.reference(),
            Self::Commit(commit) => commit.short_hash().to_string(),
        }
    }

    /// Renders the item through `template.issue` or `template.commit`.
    pub fn render(&self, templates: &CompiledTemplates) -> Result<String, TemplateError> {
        match self {
            Self::Entry(entry) => {
                let vars = Variables::new()
                    .with("name", entry.title.as_str())
                    .with("text", entry.reference())
                    .with("url", entry.url.as_str())
                    .with("user_login", entry.user_login())
                    .with("user_url", entry.user_url());
                templates.issue.render(&vars)
            }
            Self::Commit(commit) => {
                let vars = Variables::new()
                    .with("message", commit.message.as_str())
                    .with("author", commit.author.as_str())
                    .with("hash", commit.hash.as_str())
                    .with("short_hash", commit.short_hash());
                templates.commit.render(&vars)
            }
        }
    }
}

/// Builds releases and renders them for one configuration.
pub struct Generator<'a> {
    config: &'a ChangelogConfig,
    templates: CompiledTemplates,
    selection: Option<GlobMatcher>,
}

impl<'a> Generator<'a> {
    /// Prepares a generator, compiling every template up front.
    pub fn new(config: &'a ChangelogConfig) -> Result<Self> {
        let templates = config
            .compile_templates()
            .context("Configuration templates are invalid")?;

        if StrftimeItems::new(&config.date_format).any(|i| matches!(i, FormatItem::Error)) {
            bail!("Invalid dateFormat: '{}'", config.date_format);
        }

        Ok(Self {
            config,
            templates,
            selection: None,
        })
    }

    /// Restricts rendered releases to tags matching a glob such as `v1.*`.
    ///
    /// Release ranges are still computed from every tag, so the first selected
    /// release starts after the tag before it.
    pub fn with_tag_glob(mut self, pattern: &str) -> Result<Self> {
        let glob =
            Glob::new(pattern).with_context(|| format!("Invalid tag pattern: {pattern}"))?;
        self.selection = Some(glob.compile_matcher());
        Ok(self)
    }

    /// Assigns entries to releases, newest release first.
    ///
    /// `commits` is only consulted for the `commits` data source.
    pub fn releases(
        &self,
        tags: &[Tag],
        snapshot: &Snapshot,
        commits: Option<&dyn CommitSource>,
    ) -> Result<Vec<Release>> {
        let tags = self.effective_tags(tags);

        let mut releases = match self.config.data_source {
            DataSource::Issues => {
                release::assign_by_date(&tags, self.filter_entries(&snapshot.issues, |e| e.closed_at))
            }
            DataSource::Prs => release::assign_by_date(
                &tags,
                self.filter_entries(&snapshot.pull_requests, |e| e.merged_at),
            ),
            DataSource::Milestones => {
                let titles = tags
                    .iter()
                    .map(|tag| {
                        let vars = Variables::new().with("tag_name", tag.name.as_str());
                        self.templates.milestone_match.render(&vars)
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                let entries = self
                    .filter_entries(&snapshot.issues, |e| e.closed_at)
                    .into_iter()
                    .map(|(_, entry)| entry)
                    .collect();
                release::assign_by_milestone(&tags, &titles, entries)
            }
            DataSource::Commits => {
                let source =
                    commits.context("The commits data source needs a git repository")?;
                self.commit_releases(&tags, source)?
            }
        };

        if let Some(matcher) = &self.selection {
            releases.retain(|r| matcher.is_match(&r.tag.name));
        }

        releases.retain(|r| {
            if r.items.is_empty() {
                debug!("Skipping release {} with no entries", r.tag.name);
                false
            } else {
                true
            }
        });

        releases.reverse();
        info!("Assembled {} release(s)", releases.len());
        Ok(releases)
    }

    /// Renders releases into changelog text.
    pub fn render(&self, releases: &[Release]) -> Result<RenderedChangelog> {
        render::render_changelog(self.config, &self.templates, releases)
    }

    fn effective_tags(&self, tags: &[Tag]) -> Vec<Tag> {
        let mut tags: Vec<Tag> = tags
            .iter()
            .filter(|tag| {
                let ignored = self.config.is_ignored_tag(&tag.name);
                if ignored {
                    debug!("Ignoring tag {}", tag.name);
                }
                !ignored
            })
            .cloned()
            .collect();
        tags.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.name.cmp(&b.name)));
        tags
    }

    /// Keeps entries that have a release date and pass the label and milestone filters.
    fn filter_entries(
        &self,
        entries: &[Entry],
        date_of: fn(&Entry) -> Option<DateTime<Utc>>,
    ) -> Vec<(DateTime<Utc>, Entry)> {
        entries
            .iter()
            .filter_map(|entry| {
                let Some(date) = date_of(entry) else {
                    debug!("Skipping {}: not closed or merged", entry.reference());
                    return None;
                };
                if self.config.is_ignored_issue(&entry.labels) {
                    debug!("Skipping {}: ignored label", entry.reference());
                    return None;
                }
                if self.config.only_milestones && entry.milestone.is_none() {
                    debug!("Skipping {}: no milestone", entry.reference());
                    return None;
                }
                Some((date, entry.clone()))
            })
            .collect()
    }

    fn commit_releases(&self, tags: &[Tag], source: &dyn CommitSource) -> Result<Vec<Release>> {
        let mut releases = Vec::with_capacity(tags.len());
        let mut previous: Option<&str> = None;

        for tag in tags {
            let items = source
                .commits_between(previous, &tag.name)?
                .into_iter()
                .filter(|c| self.config.include_messages.keeps(c.is_merge))
                .filter(|c| !self.config.is_ignored_commit(&c.message))
                .map(Item::Commit)
                .collect();

            releases.push(Release {
                tag: tag.clone(),
                items,
            });
            previous = Some(&tag.name);
        }

        Ok(releases)
    }
}
