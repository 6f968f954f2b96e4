//! Configuration data model.
//!
//! Keys are camelCase on disk (`dataSource`, `groupBy`, `changelogFilename`,
//! ...) so existing `.grenrc` files load unchanged.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, MapAccess, Unexpected, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::ConfigError;
use crate::template::Template;

/// Label that collects entries no other group matched.
pub const CATCH_ALL_LABEL: &str = "...";

/// Variables accepted by `template.issue`.
pub const ISSUE_VARIABLES: &[&str] = &["name", "text", "url", "user_login", "user_url"];
/// Variables accepted by `template.commit`.
pub const COMMIT_VARIABLES: &[&str] = &["message", "author", "hash", "short_hash"];
/// Variables accepted by `template.group`.
pub const GROUP_VARIABLES: &[&str] = &["heading"];
/// Variables accepted by `template.release`.
pub const RELEASE_VARIABLES: &[&str] = &["release", "date", "body"];
/// Variables accepted by `milestoneMatch`.
pub const MILESTONE_VARIABLES: &[&str] = &["tag_name"];

/// Upstream data that feeds the changelog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// Closed issues, released by close date.
    #[default]
    Issues,
    /// Merged pull requests, released by merge date.
    Prs,
    /// Git commits between tags.
    Commits,
    /// Issues released by milestone title.
    Milestones,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Issues => write!(f, "issues"),
            Self::Prs => write!(f, "prs"),
            Self::Commits => write!(f, "commits"),
            Self::Milestones => write!(f, "milestones"),
        }
    }
}

impl std::str::FromStr for DataSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "issues" => Ok(Self::Issues),
            "prs" => Ok(Self::Prs),
            "commits" => Ok(Self::Commits),
            "milestones" => Ok(Self::Milestones),
            other => Err(format!(
                "unknown data source '{other}' (expected issues, prs, commits or milestones)"
            )),
        }
    }
}

/// Which commits the `commits` source keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncludeMessages {
    /// Non-merge commits only.
    #[default]
    Commits,
    /// Merge commits only.
    Merges,
    /// Every commit.
    All,
}

impl IncludeMessages {
    /// Returns whether a commit with the given merge status is kept.
    pub fn keeps(self, is_merge: bool) -> bool {
        match self {
            Self::Commits => !is_merge,
            Self::Merges => is_merge,
            Self::All => true,
        }
    }
}

/// A changelog section and the labels that route entries into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    /// Section heading.
    pub heading: String,
    /// Labels belonging to this section.
    pub labels: Vec<String>,
}

impl Group {
    /// Returns whether this group collects otherwise unmatched entries.
    pub fn is_catch_all(&self) -> bool {
        self.labels.iter().any(|l| l == CATCH_ALL_LABEL)
    }

    /// Returns whether any of the given labels belongs to this group.
    pub fn matches<S: AsRef<str>>(&self, labels: &[S]) -> bool {
        labels
            .iter()
            .any(|label| self.labels.iter().any(|l| l == label.as_ref()))
    }
}

/// How entries are bucketed into sections.
///
/// On disk this is `false`, the string `"label"`, or a map from heading to
/// labels. The map keeps file order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GroupBy {
    /// No sections.
    #[default]
    None,
    /// One section per label.
    Label,
    /// Explicit sections, in file order.
    Headings(Vec<Group>),
}

impl Serialize for GroupBy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::None => serializer.serialize_bool(false),
            Self::Label => serializer.serialize_str("label"),
            Self::Headings(groups) => {
                let mut map = serializer.serialize_map(Some(groups.len()))?;
                for group in groups {
                    map.serialize_entry(&group.heading, &group.labels)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for GroupBy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct GroupByVisitor;

        impl<'de> Visitor<'de> for GroupByVisitor {
            type Value = GroupBy;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("false, \"label\", or a map of heading to a list of labels")
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<GroupBy, E> {
                if v {
                    Err(E::invalid_value(Unexpected::Bool(true), &self))
                } else {
                    Ok(GroupBy::None)
                }
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<GroupBy, E> {
                if v == "label" {
                    Ok(GroupBy::Label)
                } else {
                    Err(E::invalid_value(Unexpected::Str(v), &self))
                }
            }

            fn visit_unit<E: de::Error>(self) -> Result<GroupBy, E> {
                Ok(GroupBy::None)
            }

            fn visit_none<E: de::Error>(self) -> Result<GroupBy, E> {
                Ok(GroupBy::None)
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<GroupBy, A::Error> {
                let mut groups = Vec::new();
                while let Some((heading, labels)) = map.next_entry::<String, Vec<String>>()? {
                    groups.push(Group { heading, labels });
                }
                Ok(GroupBy::Headings(groups))
            }
        }

        deserializer.deserialize_any(GroupByVisitor)
    }
}

/// Output templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct Templates {
    /// One issue or pull request line.
    pub issue: String,
    /// One commit line.
    pub commit: String,
    /// Section heading.
    pub group: String,
    /// Text at the top of the changelog file.
    pub changelog_title: String,
    /// One release block.
    pub release: String,
    /// Text between release blocks.
    pub release_separator: String,
    /// Heading for unlabeled entries when grouping by label.
    pub no_label: String,
}

impl Default for Templates {
    fn default() -> Self {
        Self {
            issue: "- {{name}} [{{text}}]({{url}})".to_string(),
            commit: "- {{message}} ({{short_hash}})".to_string(),
            group: "\n#### {{heading}}\n".to_string(),
            changelog_title: "# Changelog\n\n".to_string(),
            release: "## {{release}} ({{date}})\n{{body}}".to_string(),
            release_separator: "\n".to_string(),
            no_label: "closed".to_string(),
        }
    }
}

impl Templates {
    /// Lists every template with its configuration key and accepted variables.
    pub fn entries(&self) -> [(&'static str, &str, &'static [&'static str]); 7] {
        [
            ("template.issue", self.issue.as_str(), ISSUE_VARIABLES),
            ("template.commit", self.commit.as_str(), COMMIT_VARIABLES),
            ("template.group", self.group.as_str(), GROUP_VARIABLES),
            ("template.changelogTitle", self.changelog_title.as_str(), &[]),
            ("template.release", self.release.as_str(), RELEASE_VARIABLES),
            ("template.releaseSeparator", self.release_separator.as_str(), &[]),
            ("template.noLabel", self.no_label.as_str(), &[]),
        ]
    }
}

/// Parsed templates ready for rendering.
#[derive(Debug, Clone)]
pub struct CompiledTemplates {
    /// `template.issue`.
    pub issue: Template,
    /// `template.commit`.
    pub commit: Template,
    /// `template.group`.
    pub group: Template,
    /// `template.changelogTitle`.
    pub changelog_title: Template,
    /// `template.release`.
    pub release: Template,
    /// `template.releaseSeparator`.
    pub release_separator: Template,
    /// `template.noLabel`.
    pub no_label: Template,
    /// `milestoneMatch`.
    pub milestone_match: Template,
}

/// Changelog configuration, loaded once per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChangelogConfig {
    /// Upstream data source.
    pub data_source: DataSource,
    /// Prepended to tag names in release headings.
    pub prefix: String,
    /// Keep only entries assigned to a milestone.
    pub only_milestones: bool,
    /// Section layout.
    pub group_by: GroupBy,
    /// Output file path.
    pub changelog_filename: String,
    /// Output templates.
    pub template: Templates,
    /// Entries carrying any of these labels are dropped.
    pub ignore_issues_with: Vec<String>,
    /// Tags containing any of these substrings are skipped.
    pub ignore_tags_with: Vec<String>,
    /// Commits whose message contains any of these substrings are dropped.
    pub ignore_commits_with: Vec<String>,
    /// Which commits the `commits` source keeps.
    pub include_messages: IncludeMessages,
    /// Milestone title belonging to a tag.
    pub milestone_match: String,
    /// chrono format for release dates.
    pub date_format: String,
    /// Replace the changelog file instead of merging new releases into it.
    #[serde(rename = "override")]
    pub override_file: bool,
    /// Keys this tool does not know; reported by validation and otherwise ignored.
    #[serde(flatten, skip_serializing_if = "BTreeMap::is_empty")]
    pub unknown: BTreeMap<String, serde_yaml::Value>,
}

impl Default for ChangelogConfig {
    fn default() -> Self {
        Self {
            data_source: DataSource::default(),
            prefix: String::new(),
            only_milestones: false,
            group_by: GroupBy::default(),
            changelog_filename: "CHANGELOG.md".to_string(),
            template: Templates::default(),
            ignore_issues_with: Vec::new(),
            ignore_tags_with: Vec::new(),
            ignore_commits_with: Vec::new(),
            include_messages: IncludeMessages::default(),
            milestone_match: "Version {{tag_name}}".to_string(),
            date_format: "%Y-%m-%d".to_string(),
            override_file: false,
            unknown: BTreeMap::new(),
        }
    }
}

impl ChangelogConfig {
    /// Parses every template, checking placeholders against what each accepts.
    pub fn compile_templates(&self) -> Result<CompiledTemplates, ConfigError> {
        let compile = |key: &str, source: &str, allowed: &[&str]| {
            Template::parse(source)
                .and_then(|t| t.check_placeholders(allowed).map(|()| t))
                .map_err(|source| ConfigError::Template {
                    key: key.to_string(),
                    source,
                })
        };

        let [issue, commit, group, changelog_title, release, release_separator, no_label] =
            self.template.entries();

        Ok(CompiledTemplates {
            issue: compile(issue.0, issue.1, issue.2)?,
            commit: compile(commit.0, commit.1, commit.2)?,
            group: compile(group.0, group.1, group.2)?,
            changelog_title: compile(changelog_title.0, changelog_title.1, changelog_title.2)?,
            release: compile(release.0, release.1, release.2)?,
            release_separator: compile(
                release_separator.0,
                release_separator.1,
                release_separator.2,
            )?,
            no_label: compile(no_label.0, no_label.1, no_label.2)?,
            milestone_match: compile("milestoneMatch", &self.milestone_match, MILESTONE_VARIABLES)?,
        })
    }

    /// Returns whether an entry with these labels is dropped by `ignoreIssuesWith`.
    pub fn is_ignored_issue<S: AsRef<str>>(&self, labels: &[S]) -> bool {
        labels
            .iter()
            .any(|label| self.ignore_issues_with.iter().any(|i| i == label.as_ref()))
    }

    /// Returns whether a tag is skipped by `ignoreTagsWith`.
    pub fn is_ignored_tag(&self, tag_name: &str) -> bool {
        self.ignore_tags_with
            .iter()
            .any(|pattern| !pattern.is_empty() && tag_name.contains(pattern.as_str()))
    }

    /// Returns whether a commit message is dropped by `ignoreCommitsWith`.
    pub fn is_ignored_commit(&self, message: &str) -> bool {
        self.ignore_commits_with
            .iter()
            .any(|pattern| !pattern.is_empty() && message.contains(pattern.as_str()))
    }
}

/// Command-line values layered over the loaded file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// `--data-source`.
    pub data_source: Option<DataSource>,
    /// `--prefix`.
    pub prefix: Option<String>,
    /// `--only-milestones`.
    pub only_milestones: bool,
    /// `--output`.
    pub changelog_filename: Option<String>,
    /// `--override`.
    pub override_file: bool,
}

impl ConfigOverrides {
    /// Applies the overrides in place. Flags only ever switch options on.
    pub fn apply(&self, config: &mut ChangelogConfig) {
        if let Some(source) = self.data_source {
            config.data_source = source;
        }
        if let Some(prefix) = &self.prefix {
            config.prefix.clone_from(prefix);
        }
        if self.only_milestones {
            config.only_milestones = true;
        }
        if let Some(filename) = &self.changelog_filename {
            config.changelog_filename.clone_from(filename);
        }
        if self.override_file {
            config.override_file = true;
        }
    }
}
