//! Turning releases into markdown.

use anyhow::{Context, Result};
use tracing::warn;

use super::{group_items, Release};
use crate::config::model::CompiledTemplates;
use crate::config::{ChangelogConfig, DataSource, GroupBy};
use crate::template::Variables;

/// One rendered release block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedRelease {
    /// Tag the block was rendered for.
    pub tag_name: String,
    /// Line naming the release, used to recognise it in an existing file.
    pub heading_line: String,
    /// Full block text.
    pub text: String,
}

/// A rendered changelog, kept in pieces so it can be merged into an existing file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedChangelog {
    /// Rendered `template.changelogTitle`.
    pub title: String,
    /// Rendered `template.releaseSeparator`.
    pub separator: String,
    /// Release blocks, newest first.
    pub releases: Vec<RenderedRelease>,
}

impl RenderedChangelog {
    /// Joins the title and release blocks into a complete document.
    pub fn to_markdown(&self) -> String {
        let body = self
            .releases
            .iter()
            .map(|r| r.text.as_str())
            .collect::<Vec<_>>()
            .join(&self.separator);
        format!("{}{body}", self.title)
    }
}

pub(crate) fn render_changelog(
    config: &ChangelogConfig,
    templates: &CompiledTemplates,
    releases: &[Release],
) -> Result<RenderedChangelog> {
    let empty = Variables::new();
    let title = templates.changelog_title.render(&empty)?;
    let separator = templates.release_separator.render(&empty)?;

    let releases = releases
        .iter()
        .map(|release| {
            render_release(config, templates, release)
                .with_context(|| format!("Failed to render release {}", release.tag.name))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(RenderedChangelog {
        title,
        separator,
        releases,
    })
}

fn render_release(
    config: &ChangelogConfig,
    templates: &CompiledTemplates,
    release: &Release,
) -> Result<RenderedRelease> {
    // Commits carry no labels, so grouping would put everything under one heading.
    let group_by = if config.data_source == DataSource::Commits {
        &GroupBy::None
    } else {
        &config.group_by
    };
    let no_label = templates.no_label.render(&Variables::new())?;

    let mut body = String::new();
    for section in group_items(group_by, &release.items, &no_label) {
        if let Some(heading) = &section.heading {
            let vars = Variables::new().with("heading", heading.as_str());
            body.push_str(&templates.group.render(&vars)?);
        }
        for item in section.items {
            body.push_str(&item.render(templates)?);
            body.push('\n');
        }
    }

    let name = format!("{}{}", config.prefix, release.tag.name);
    let vars = Variables::new()
        .with("release", name.as_str())
        .with("date", release.tag.date.format(&config.date_format).to_string());
    let frame = templates.release.render(&vars.clone().with("body", ""))?;
    let text = templates.release.render(&vars.with("body", body))?;

    Ok(RenderedRelease {
        tag_name: release.tag.name.clone(),
        heading_line: heading_line(&frame, &name),
        text,
    })
}

/// Picks the line that identifies a release: the first one mentioning its name
/// outside the body, else the first non-blank line.
fn heading_line(frame: &str, name: &str) -> String {
    if let Some(line) = frame.lines().find(|line| line.contains(name)) {
        return line.trim().to_string();
    }

    warn!("template.release does not show release {name}; matching existing releases by their first line");
    frame
        .lines()
        .find(|line| !line.trim().is_empty())
        .unwrap_or_default()
        .trim()
        .to_string()
}
