use anyhow::Result;
use clap::Parser;
use git2::{Repository, Signature, Time};
use relnotes::config::{ChangelogConfig, DataSource};
use relnotes::Cli;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const GRENRC_YML: &str = r#"prefix: v
groupBy:
  Bug Fixes:
    - bug
  Features:
    - enhancement
  Other:
    - "..."
ignoreIssuesWith:
  - wontfix
template:
  issue: "- {{name}} ([{{text}}]({{url}})) by [@{{user_login}}]({{user_url}})"
"#;

const SNAPSHOT_JSON: &str = r#"{
  "tags": [
    {"name": "1.0.0", "date": "2024-01-10T12:00:00Z"},
    {"name": "1.1.0", "date": "2024-03-01T12:00:00Z"}
  ],
  "issues": [
    {
      "number": 1,
      "title": "Crash on empty input",
      "url": "https://github.com/acme/widget/issues/1",
      "author": {"login": "alice"},
      "labels": [{"name": "bug"}],
      "closedAt": "2024-01-05T09:00:00Z"
    },
    {
      "number": 2,
      "title": "Add --json flag",
      "url": "https://github.com/acme/widget/issues/2",
      "author": {"login": "bob"},
      "labels": [{"name": "enhancement"}],
      "closedAt": "2024-02-10T09:00:00Z"
    },
    {
      "number": 3,
      "title": "Typo in README",
      "url": "https://github.com/acme/widget/issues/3",
      "author": {"login": "alice"},
      "labels": [{"name": "docs"}],
      "closedAt": "2024-02-11T09:00:00Z"
    },
    {
      "number": 4,
      "title": "Flaky test",
      "url": "https://github.com/acme/widget/issues/4",
      "author": {"login": "carol"},
      "labels": [{"name": "bug"}, {"name": "wontfix"}],
      "closedAt": "2024-02-12T09:00:00Z"
    },
    {
      "number": 5,
      "title": "Still open",
      "url": "https://github.com/acme/widget/issues/5",
      "author": {"login": "dave"},
      "labels": []
    }
  ]
}"#;

/// A project directory with a `.grenrc.yml` and an issue snapshot next to it.
struct TestProject {
    dir: TempDir,
    snapshot: PathBuf,
}

impl TestProject {
    fn new() -> Result<Self> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join(".grenrc.yml"), GRENRC_YML)?;
        let snapshot = dir.path().join("snapshot.json");
        fs::write(&snapshot, SNAPSHOT_JSON)?;
        Ok(Self { dir, snapshot })
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn generate(&self, extra: &[&str]) -> Result<()> {
        let repo = self.path().to_string_lossy().into_owned();
        let data = self.snapshot.to_string_lossy().into_owned();
        let mut args = vec!["relnotes", "generate", "--repo", repo.as_str(), "--data", data.as_str()];
        args.extend_from_slice(extra);
        Cli::try_parse_from(args)?.execute()
    }

    fn changelog(&self) -> Result<String> {
        Ok(fs::read_to_string(self.path().join("CHANGELOG.md"))?)
    }
}

/// A temporary git repository whose commits have fixed timestamps.
struct TestRepo {
    _temp_dir: TempDir,
    repo_path: PathBuf,
    repo: Repository,
    commits: Vec<git2::Oid>,
}

impl TestRepo {
    fn new() -> Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        let repo_path = temp_dir.path().to_path_buf();
        let repo = Repository::init(&repo_path)?;

        Ok(TestRepo {
            _temp_dir: temp_dir,
            repo_path,
            repo,
            commits: Vec::new(),
        })
    }

    fn add_commit(&mut self, message: &str, content: &str, seconds: i64) -> Result<git2::Oid> {
        fs::write(self.repo_path.join("notes.txt"), content)?;

        let mut index = self.repo.index()?;
        index.add_path(Path::new("notes.txt"))?;
        index.write()?;

        let signature = Signature::new("Test User", "test@example.com", &Time::new(seconds, 0))?;
        let tree = self.repo.find_tree(index.write_tree()?)?;

        let parent = match self.commits.last() {
            Some(id) => Some(self.repo.find_commit(*id)?),
            None => None,
        };
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        let commit_id =
            self.repo
                .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)?;
        self.commits.push(commit_id);
        Ok(commit_id)
    }

    fn tag(&self, name: &str, commit: git2::Oid) -> Result<()> {
        let object = self.repo.find_object(commit, None)?;
        self.repo.tag_lightweight(name, &object, false)?;
        Ok(())
    }
}

fn short(oid: git2::Oid) -> String {
    oid.to_string()[..8].to_string()
}

#[test]
fn test_generate_from_issue_snapshot() -> Result<()> {
    let project = TestProject::new()?;
    project.generate(&[])?;

    let changelog = project.changelog()?;
    insta::assert_snapshot!("issue_changelog", changelog);
    Ok(())
}

#[test]
fn test_generate_adds_only_missing_releases() -> Result<()> {
    let project = TestProject::new()?;

    project.generate(&["--tags", "1.0.*"])?;
    let first = project.changelog()?;
    assert!(first.contains("## v1.0.0 (2024-01-10)"));
    assert!(!first.contains("v1.1.0"));

    // Hand edits to an existing release survive a regular run.
    fs::write(
        project.path().join("CHANGELOG.md"),
        first.replace("Crash on empty input", "Crash on empty input (edited)"),
    )?;

    project.generate(&[])?;
    let second = project.changelog()?;
    assert!(second.starts_with("# Changelog\n\n## v1.1.0 (2024-03-01)\n"));
    assert_eq!(second.matches("## v1.0.0").count(), 1);
    assert!(second.contains("Crash on empty input (edited)"));

    project.generate(&["--override"])?;
    let third = project.changelog()?;
    assert!(!third.contains("(edited)"));
    assert_eq!(third.matches("## v1.1.0").count(), 1);
    Ok(())
}

#[test]
fn test_generate_label_grouping_and_output_flag() -> Result<()> {
    let project = TestProject::new()?;
    fs::write(
        project.path().join(".grenrc.yml"),
        "groupBy: label\nonlyMilestones: false\n",
    )?;

    project.generate(&["--output", "docs/RELEASES.md", "--prefix", "release-"])?;

    let text = fs::read_to_string(project.path().join("docs").join("RELEASES.md"))?;
    let features = text.find("#### enhancement").unwrap();
    let docs = text.find("#### docs").unwrap();
    assert!(text.contains("## release-1.1.0 (2024-03-01)"));
    assert!(features < docs);
    // Without ignoreIssuesWith the wontfix issue is listed under its first label.
    assert!(text.contains("- Flaky test [#4]"));
    assert!(!text.contains("Still open"));
    Ok(())
}

#[test]
fn test_generate_from_git_commits() -> Result<()> {
    let mut repo = TestRepo::new()?;
    let day = 86_400;
    let start = 1_704_067_200; // 2024-01-01T00:00:00Z

    let initial = repo.add_commit("Initial commit", "a", start)?;
    repo.tag("0.1.0", initial)?;
    let parser = repo.add_commit("Add parser", "ab", start + day)?;
    let skipped = repo.add_commit("Bump version [skip changelog]", "abc", start + 2 * day)?;
    repo.tag("0.2.0", skipped)?;
    repo.add_commit("Unreleased work", "abcd", start + 3 * day)?;

    fs::write(
        repo.repo_path.join(".grenrc.json"),
        r#"{"dataSource": "commits", "ignoreCommitsWith": ["[skip changelog]"]}"#,
    )?;

    let path = repo.repo_path.to_string_lossy().into_owned();
    Cli::try_parse_from(["relnotes", "generate", "--repo", path.as_str()])?.execute()?;

    let changelog = fs::read_to_string(repo.repo_path.join("CHANGELOG.md"))?;
    assert_eq!(
        changelog,
        format!(
            "# Changelog\n\n\
             ## 0.2.0 (2024-01-03)\n- Add parser ({})\n\n\
             ## 0.1.0 (2024-01-01)\n- Initial commit ({})\n",
            short(parser),
            short(initial)
        )
    );
    Ok(())
}

#[test]
fn test_generate_rejects_invalid_config() -> Result<()> {
    let project = TestProject::new()?;
    fs::write(
        project.path().join(".grenrc.yml"),
        "template:\n  issue: \"- {{title}}\"\n",
    )?;

    let err = project.generate(&[]).unwrap_err();
    assert!(err.to_string().contains("relnotes check"));
    assert!(!project.path().join("CHANGELOG.md").exists());
    Ok(())
}

#[test]
fn test_config_init_writes_loadable_file() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().to_string_lossy().into_owned();

    Cli::try_parse_from(["relnotes", "config", "init", "--repo", path.as_str(), "--format", "json"])?
        .execute()?;

    let config = ChangelogConfig::load_from_file(dir.path().join(".grenrc.json"))?;
    assert_eq!(config, ChangelogConfig::default());
    assert_eq!(config.data_source, DataSource::Issues);

    let again =
        Cli::try_parse_from(["relnotes", "config", "init", "--repo", path.as_str(), "--format", "json"])?
            .execute();
    assert!(again.is_err());
    Ok(())
}

#[test]
fn test_help_all_lists_every_command() -> Result<()> {
    use relnotes::cli::help::HelpGenerator;

    let output = HelpGenerator::new().generate_all_help()?;
    for command in ["generate", "check", "config show", "config init", "help-all"] {
        assert!(output.contains(&format!("relnotes {command} - ")), "{command}");
    }
    Ok(())
}
