//! Splitting a release's items into headed sections.

use tracing::debug;

use super::Item;
use crate::config::{Group, GroupBy};

/// A run of items under an optional heading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section<'a> {
    /// Section heading; `None` when items are not grouped.
    pub heading: Option<String>,
    /// Items in their original order.
    pub items: Vec<&'a Item>,
}

/// Groups items according to `groupBy`.
///
/// - `None`: one unheaded section.
/// - `Label`: one section per first label, in first-seen order; unlabeled items go
///   under `no_label`.
/// - `Headings`: each item goes to the first group sharing a label, falling back to
///   the catch-all group. Items matching nothing are dropped.
///
/// Empty sections are never returned.
pub fn group_items<'a>(group_by: &GroupBy, items: &'a [Item], no_label: &str) -> Vec<Section<'a>> {
    if items.is_empty() {
        return Vec::new();
    }

    match group_by {
        GroupBy::None => vec![Section {
            heading: None,
            items: items.iter().collect(),
        }],
        GroupBy::Label => by_first_label(items, no_label),
        GroupBy::Headings(groups) => by_headings(groups, items),
    }
}

fn by_first_label<'a>(items: &'a [Item], no_label: &str) -> Vec<Section<'a>> {
    let mut sections: Vec<Section<'a>> = Vec::new();

    for item in items {
        let heading = item
            .labels()
            .first()
            .map_or_else(|| no_label.to_string(), Clone::clone);

        match sections
            .iter_mut()
            .find(|s| s.heading.as_deref() == Some(heading.as_str()))
        {
            Some(section) => section.items.push(item),
            None => sections.push(Section {
                heading: Some(heading),
                items: vec![item],
            }),
        }
    }

    sections
}

fn by_headings<'a>(groups: &[Group], items: &'a [Item]) -> Vec<Section<'a>> {
    let catch_all = groups.iter().position(Group::is_catch_all);
    let mut buckets: Vec<Vec<&'a Item>> = vec![Vec::new(); groups.len()];

    for item in items {
        let target = groups
            .iter()
            .position(|g| g.matches(item.labels()))
            .or(catch_all);
        match target {
            Some(index) => buckets[index].push(item),
            None => debug!("{} matches no group", item.describe()),
        }
    }

    groups
        .iter()
        .zip(buckets)
        .filter(|(_, bucket)| !bucket.is_empty())
        .map(|(group, bucket)| Section {
            heading: Some(group.heading.clone()),
            items: bucket,
        })
        .collect()
}
