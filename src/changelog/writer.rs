//! Writing the changelog file.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

use super::{RenderedChangelog, RenderedRelease};

/// What a write did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOutcome {
    /// File written.
    pub path: PathBuf,
    /// Release blocks added to the file.
    pub written: usize,
    /// Release blocks already present and left alone.
    pub skipped: usize,
}

/// Writes the changelog to `path`.
///
/// With `override_file`, or when the file does not exist, the file is replaced
/// with the full document. Otherwise only releases whose heading line is not
/// already in the file are inserted, newest first, right after the title. An
/// empty file is treated like a missing one.
pub fn write_changelog(
    path: &Path,
    changelog: &RenderedChangelog,
    override_file: bool,
) -> Result<WriteOutcome> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    if override_file || !path.exists() {
        fs::write(path, changelog.to_markdown())
            .with_context(|| format!("Failed to write changelog: {}", path.display()))?;
        info!("Wrote {} release(s) to {}", changelog.releases.len(), path.display());
        return Ok(WriteOutcome {
            path: path.to_path_buf(),
            written: changelog.releases.len(),
            skipped: 0,
        });
    }

    let existing = fs::read_to_string(path)
        .with_context(|| format!("Failed to read changelog: {}", path.display()))?;
    let (merged, written) = merge_into_existing(&existing, changelog);

    if written > 0 {
        fs::write(path, merged)
            .with_context(|| format!("Failed to write changelog: {}", path.display()))?;
        info!("Added {written} release(s) to {}", path.display());
    } else {
        debug!("{} is already up to date", path.display());
    }

    Ok(WriteOutcome {
        path: path.to_path_buf(),
        written,
        skipped: changelog.releases.len() - written,
    })
}

/// Inserts releases missing from `existing`, returning the new text and how many were added.
pub fn merge_into_existing(existing: &str, changelog: &RenderedChangelog) -> (String, usize) {
    if existing.trim().is_empty() {
        return (changelog.to_markdown(), changelog.releases.len());
    }

    let present: HashSet<&str> = existing.lines().map(str::trim).collect();
    let missing: Vec<&RenderedRelease> = changelog
        .releases
        .iter()
        .filter(|r| {
            let heading = r.heading_line.trim();
            let known = !heading.is_empty() && present.contains(heading);
            if known {
                debug!("Release {} is already in the changelog", r.tag_name);
            }
            !known
        })
        .collect();

    if missing.is_empty() {
        return (existing.to_string(), 0);
    }

    let blocks = missing
        .iter()
        .map(|r| r.text.as_str())
        .collect::<Vec<_>>()
        .join(&changelog.separator);
    let sep = &changelog.separator;

    let merged = match existing.strip_prefix(changelog.title.as_str()) {
        Some(rest) if !changelog.title.is_empty() => {
            format!("{}{blocks}{sep}{rest}", changelog.title)
        }
        _ => format!("{blocks}{sep}{existing}"),
    };

    (merged, missing.len())
}
