//! Schema-level validation of a changelog configuration.

use std::collections::HashMap;
use std::fmt;

use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};

use super::model::MILESTONE_VARIABLES;
use super::{ChangelogConfig, DataSource, GroupBy};
use crate::template::Template;

/// Validation report for one configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Every issue found, in discovery order.
    pub issues: Vec<ConfigIssue>,
    /// Summary statistics.
    pub summary: ValidationSummary,
}

/// A single problem found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigIssue {
    /// Severity level of the issue.
    pub severity: IssueSeverity,
    /// Configuration key the issue is about, e.g. `groupBy.Bugs`.
    pub key: String,
    /// Short rule identifier.
    pub rule: String,
    /// Human-readable explanation.
    pub explanation: String,
}

/// Severity level for issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    /// Blocks generation (exit code 1).
    Error,
    /// Advisory (exit code 0, or 2 with --strict).
    Warning,
    /// Suggestion only (never affects the exit code).
    Info,
}

impl fmt::Display for IssueSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "ERROR"),
            Self::Warning => write!(f, "WARNING"),
            Self::Info => write!(f, "INFO"),
        }
    }
}

/// Summary statistics for a validation report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationSummary {
    /// Number of errors.
    pub error_count: usize,
    /// Number of warnings.
    pub warning_count: usize,
    /// Number of info-level notes.
    pub info_count: usize,
}

impl ValidationSummary {
    /// Counts issues by severity.
    pub fn from_issues(issues: &[ConfigIssue]) -> Self {
        let mut summary = Self::default();
        for issue in issues {
            match issue.severity {
                IssueSeverity::Error => summary.error_count += 1,
                IssueSeverity::Warning => summary.warning_count += 1,
                IssueSeverity::Info => summary.info_count += 1,
            }
        }
        summary
    }
}

impl ValidationReport {
    /// Creates a report from a list of issues.
    pub fn new(issues: Vec<ConfigIssue>) -> Self {
        let summary = ValidationSummary::from_issues(&issues);
        Self { issues, summary }
    }

    /// Checks if the report has any errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.summary.error_count > 0
    }

    /// Checks if the report has any warnings.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        self.summary.warning_count > 0
    }

    /// Determines the exit code: 1 on errors, 2 on warnings under `strict`, else 0.
    pub fn exit_code(&self, strict: bool) -> i32 {
        if self.has_errors() {
            1
        } else if strict && self.has_warnings() {
            2
        } else {
            0
        }
    }

    /// Renders the report as plain text.
    pub fn to_text(&self) -> String {
        let mut output = String::new();
        if self.issues.is_empty() {
            output.push_str("\u{2705} Configuration is valid\n");
            return output;
        }

        for issue in &self.issues {
            output.push_str(&format!(
                "{:<7}  {}: {} ({})\n",
                issue.severity.to_string(),
                issue.key,
                issue.explanation,
                issue.rule
            ));
        }
        output.push_str(&format!(
            "\n{} error(s), {} warning(s), {} info\n",
            self.summary.error_count, self.summary.warning_count, self.summary.info_count
        ));
        output
    }
}

/// Output format for validation results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text format.
    #[default]
    Text,
    /// JSON format.
    Json,
    /// YAML format.
    Yaml,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            other => Err(format!("unknown format '{other}' (expected text, json or yaml)")),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
            Self::Yaml => write!(f, "yaml"),
        }
    }
}

struct Collector {
    issues: Vec<ConfigIssue>,
}

impl Collector {
    fn push(&mut self, severity: IssueSeverity, key: impl Into<String>, rule: &str, explanation: String) {
        self.issues.push(ConfigIssue {
            severity,
            key: key.into(),
            rule: rule.to_string(),
            explanation,
        });
    }
}

/// Validates a configuration. Never fails; problems are reported as issues.
pub fn validate(config: &ChangelogConfig) -> ValidationReport {
    let mut c = Collector { issues: Vec::new() };

    for key in config.unknown.keys() {
        c.push(
            IssueSeverity::Warning,
            key.clone(),
            "unknown-key",
            format!("'{key}' is not a recognised option and is ignored"),
        );
    }

    check_group_by(config, &mut c);
    check_templates(config, &mut c);

    if config.changelog_filename.trim().is_empty() {
        c.push(
            IssueSeverity::Error,
            "changelogFilename",
            "non-empty",
            "output file name must not be empty".to_string(),
        );
    }

    if StrftimeItems::new(&config.date_format).any(|item| matches!(item, Item::Error)) {
        c.push(
            IssueSeverity::Error,
            "dateFormat",
            "date-format",
            format!("'{}' is not a valid date format", config.date_format),
        );
    }

    if config.data_source == DataSource::Commits && config.only_milestones {
        c.push(
            IssueSeverity::Warning,
            "onlyMilestones",
            "no-effect",
            "commits carry no milestones; onlyMilestones has no effect".to_string(),
        );
    }

    ValidationReport::new(c.issues)
}

fn check_group_by(config: &ChangelogConfig, c: &mut Collector) {
    let GroupBy::Headings(groups) = &config.group_by else {
        if config.group_by == GroupBy::Label && config.data_source == DataSource::Commits {
            c.push(
                IssueSeverity::Warning,
                "groupBy",
                "no-effect",
                "commits carry no labels; groupBy has no effect".to_string(),
            );
        }
        return;
    };

    if config.data_source == DataSource::Commits {
        c.push(
            IssueSeverity::Warning,
            "groupBy",
            "no-effect",
            "commits carry no labels; groupBy has no effect".to_string(),
        );
    }

    let mut seen_headings: Vec<&str> = Vec::new();
    let mut label_owner: HashMap<&str, &str> = HashMap::new();
    let mut has_catch_all = false;

    for group in groups {
        let key = format!("groupBy.{}", group.heading);

        if group.heading.trim().is_empty() {
            c.push(
                IssueSeverity::Error,
                "groupBy",
                "non-empty-heading",
                "section headings must not be empty".to_string(),
            );
        }

        if seen_headings.contains(&group.heading.as_str()) {
            c.push(
                IssueSeverity::Error,
                key.clone(),
                "unique-heading",
                format!("heading '{}' is defined more than once", group.heading),
            );
        }
        seen_headings.push(&group.heading);

        if group.labels.is_empty() {
            c.push(
                IssueSeverity::Error,
                key.clone(),
                "non-empty-labels",
                "a section needs at least one label".to_string(),
            );
        }

        for label in &group.labels {
            if label.trim().is_empty() {
                c.push(
                    IssueSeverity::Error,
                    key.clone(),
                    "non-empty-label",
                    "labels must be non-empty strings".to_string(),
                );
                continue;
            }

            match label_owner.get(label.as_str()) {
                Some(owner) if *owner != group.heading => c.push(
                    IssueSeverity::Warning,
                    key.clone(),
                    "shared-label",
                    format!("label '{label}' already belongs to '{owner}', which takes precedence"),
                ),
                Some(_) => {}
                None => {
                    label_owner.insert(label, &group.heading);
                }
            }
        }

        has_catch_all |= group.is_catch_all();
    }

    if !has_catch_all && !groups.is_empty() {
        c.push(
            IssueSeverity::Info,
            "groupBy",
            "catch-all",
            "no section lists \"...\"; entries matching no section are left out".to_string(),
        );
    }
}

fn check_templates(config: &ChangelogConfig, c: &mut Collector) {
    let milestone = ("milestoneMatch", config.milestone_match.as_str(), MILESTONE_VARIABLES);

    for (key, source, allowed) in config.template.entries().into_iter().chain([milestone]) {
        let template = match Template::parse(source) {
            Ok(t) => t,
            Err(e) => {
                c.push(IssueSeverity::Error, key, "template-syntax", e.to_string());
                continue;
            }
        };

        if let Err(e) = template.check_placeholders(allowed) {
            c.push(IssueSeverity::Error, key, "known-placeholders", e.to_string());
            continue;
        }

        let placeholders = template.placeholders();
        if key == "template.release" && !placeholders.contains(&"body") {
            c.push(
                IssueSeverity::Warning,
                key,
                "release-body",
                "release template has no {{body}}; releases will list no entries".to_string(),
            );
        }
        if key == "milestoneMatch"
            && config.data_source == DataSource::Milestones
            && !placeholders.contains(&"tag_name")
        {
            c.push(
                IssueSeverity::Warning,
                key,
                "milestone-tag",
                "milestoneMatch has no {{tag_name}}; every release maps to the same milestone"
                    .to_string(),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Group;

    fn group(heading: &str, labels: &[&str]) -> Group {
        Group {
            heading: heading.to_string(),
            labels: labels.iter().map(ToString::to_string).collect(),
        }
    }

    fn with_groups(groups: Vec<Group>) -> ChangelogConfig {
        ChangelogConfig {
            group_by: GroupBy::Headings(groups),
            ..ChangelogConfig::default()
        }
    }

    fn rules(report: &ValidationReport) -> Vec<&str> {
        report.issues.iter().map(|i| i.rule.as_str()).collect()
    }

    #[test]
    fn default_config_is_clean() {
        let report = validate(&ChangelogConfig::default());
        assert!(report.issues.is_empty(), "{:?}", report.issues);
        assert_eq!(report.exit_code(true), 0);
    }

    #[test]
    fn empty_label_set_is_error() {
        let report = validate(&with_groups(vec![group("Bugs", &[]), group("Other", &["..."])]));
        assert!(report.has_errors());
        assert_eq!(rules(&report), vec!["non-empty-labels"]);
    }

    #[test]
    fn blank_label_is_error() {
        let report = validate(&with_groups(vec![group("Bugs", &["bug", " "])]));
        assert!(rules(&report).contains(&"non-empty-label"));
    }

    #[test]
    fn blank_heading_is_error() {
        let report = validate(&with_groups(vec![group("", &["bug"]), group("Other", &["..."])]));
        assert_eq!(rules(&report), vec!["non-empty-heading"]);
    }

    #[test]
    fn duplicate_heading_is_error() {
        let report = validate(&with_groups(vec![
            group("Bugs", &["bug"]),
            group("Bugs", &["defect"]),
            group("Other", &["..."]),
        ]));
        assert_eq!(rules(&report), vec!["unique-heading"]);
    }

    #[test]
    fn shared_label_is_warning() {
        let report = validate(&with_groups(vec![
            group("Bugs", &["bug"]),
            group("Fixes", &["bug", "fix"]),
            group("Other", &["..."]),
        ]));
        assert!(!report.has_errors());
        assert!(report.has_warnings());
        assert_eq!(report.exit_code(false), 0);
        assert_eq!(report.exit_code(true), 2);
        assert!(report.issues[0].explanation.contains("'Bugs'"));
    }

    #[test]
    fn missing_catch_all_is_info() {
        let report = validate(&with_groups(vec![group("Bugs", &["bug"])]));
        assert_eq!(report.summary.info_count, 1);
        assert_eq!(report.exit_code(true), 0);
    }

    #[test]
    fn unknown_issue_placeholder_is_error() {
        let mut config = ChangelogConfig::default();
        config.template.issue = "- {{name}} {{milestone}}".to_string();
        let report = validate(&config);
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].key, "template.issue");
        assert_eq!(report.issues[0].rule, "known-placeholders");
        assert_eq!(report.exit_code(false), 1);
    }

    #[test]
    fn all_issue_placeholders_are_accepted() {
        let mut config = ChangelogConfig::default();
        config.template.issue =
            "- {{name}} {{text}} {{url}} {{user_login}} {{user_url}}".to_string();
        assert!(validate(&config).issues.is_empty());
    }

    #[test]
    fn unterminated_template_is_error() {
        let mut config = ChangelogConfig::default();
        config.template.group = "#### {{heading".to_string();
        let report = validate(&config);
        assert_eq!(rules(&report), vec!["template-syntax"]);
    }

    #[test]
    fn release_without_body_is_warning() {
        let mut config = ChangelogConfig::default();
        config.template.release = "## {{release}}".to_string();
        assert_eq!(rules(&validate(&config)), vec!["release-body"]);
    }

    #[test]
    fn milestone_match_without_tag_name() {
        let config = ChangelogConfig {
            data_source: DataSource::Milestones,
            milestone_match: "Next".to_string(),
            ..ChangelogConfig::default()
        };
        assert_eq!(rules(&validate(&config)), vec!["milestone-tag"]);
    }

    #[test]
    fn empty_filename_and_bad_date_format() {
        let config = ChangelogConfig {
            changelog_filename: "  ".to_string(),
            date_format: "%Y-%Q".to_string(),
            ..ChangelogConfig::default()
        };
        assert_eq!(rules(&validate(&config)), vec!["non-empty", "date-format"]);
    }

    #[test]
    fn commits_source_warnings() {
        let config = ChangelogConfig {
            data_source: DataSource::Commits,
            only_milestones: true,
            group_by: GroupBy::Label,
            ..ChangelogConfig::default()
        };
        let report = validate(&config);
        assert_eq!(report.summary.warning_count, 2);
    }

    #[test]
    fn unknown_keys_are_warnings() {
        let config: ChangelogConfig =
            serde_json::from_str(r#"{"ignoreLabels": ["wip"], "username": "o"}"#).unwrap();
        let report = validate(&config);
        assert_eq!(rules(&report), vec!["unknown-key", "unknown-key"]);
    }

    #[test]
    fn text_report() {
        let report = validate(&with_groups(vec![group("Bugs", &[])]));
        let text = report.to_text();
        assert!(text.contains("ERROR    groupBy.Bugs: a section needs at least one label"));
        assert!(text.contains("1 error(s), 0 warning(s), 1 info"));
        assert!(validate(&ChangelogConfig::default())
            .to_text()
            .contains("Configuration is valid"));
    }

    #[test]
    fn output_format_parse() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("yml".parse::<OutputFormat>().unwrap(), OutputFormat::Yaml);
        assert!("xml".parse::<OutputFormat>().is_err());
    }
}
