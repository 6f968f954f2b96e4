//! Assigning entries to releases.

use chrono::{DateTime, Utc};
use tracing::debug;

use super::Item;
use crate::data::{Entry, Tag};

/// A tag with the items released under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    /// The release tag.
    pub tag: Tag,
    /// Items in snapshot order.
    pub items: Vec<Item>,
}

fn empty_releases(tags: &[Tag]) -> Vec<Release> {
    tags.iter()
        .map(|tag| Release {
            tag: tag.clone(),
            items: Vec::new(),
        })
        .collect()
}

/// Puts each entry into the first tag (ascending) dated at or after it.
///
/// `tags` must be sorted oldest first. Entries newer than the newest tag
/// are unreleased and dropped.
pub fn assign_by_date(tags: &[Tag], entries: Vec<(DateTime<Utc>, Entry)>) -> Vec<Release> {
    let mut releases = empty_releases(tags);

    for (date, entry) in entries {
        match tags.iter().position(|tag| tag.date >= date) {
            Some(index) => releases[index].items.push(Item::Entry(entry)),
            None => debug!("{} is not released yet", entry.reference()),
        }
    }

    releases
}

/// Puts each entry into the tag whose rendered milestone title equals the entry's milestone.
///
/// `titles[i]` is the milestone title for `tags[i]`.
pub fn assign_by_milestone(tags: &[Tag], titles: &[String], entries: Vec<Entry>) -> Vec<Release> {
    let mut releases = empty_releases(tags);

    for entry in entries {
        let index = entry
            .milestone
            .as_deref()
            .and_then(|m| titles.iter().position(|t| t == m));
        match index {
            Some(index) => releases[index].items.push(Item::Entry(entry)),
            None => debug!("{} has no matching milestone", entry.reference()),
        }
    }

    releases
}
