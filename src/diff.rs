use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

/// Last known state of the portal: course name -> item titles, in page order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(BTreeMap<String, Vec<String>>);

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, course: impl Into<String>, items: Vec<String>) {
        self.0.insert(course.into(), items);
    }

    pub fn get(&self, course: &str) -> Option<&[String]> {
        self.0.get(course).map(Vec::as_slice)
    }

    pub fn courses(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Snapshot to store after a confirmed change.
    ///
    /// Every course in `newer` takes its new list as is. Courses only present
    /// in `self` (no longer listed on the portal) keep their stored list.
    pub fn absorb(mut self, newer: Snapshot) -> Snapshot {
        self.0.extend(newer.0);
        self
    }
}

impl<C, I> FromIterator<(C, I)> for Snapshot
where
    C: Into<String>,
    I: IntoIterator,
    I::Item: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (C, I)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(course, items)| (course.into(), items.into_iter().map(Into::into).collect()))
                .collect(),
        )
    }
}

/// New `"<course> - <item>"` entries found by one cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet(BTreeSet<String>);

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.0.contains(entry)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Comma-joined entries, in sorted order.
    pub fn joined(&self) -> String {
        self.iter().collect::<Vec<_>>().join(", ")
    }
}

impl fmt::Display for ChangeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.joined())
    }
}

impl<S: Into<String>> FromIterator<S> for ChangeSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Items that appeared in courses that were already tracked.
///
/// A course only reports when its list grew. Brand-new courses, shrunk lists
/// and same-length edits report nothing.
pub fn compute_changes(old: &Snapshot, new: &Snapshot) -> ChangeSet {
    let mut changes = BTreeSet::new();
    for (course, items) in &new.0 {
        let Some(previous) = old.0.get(course) else {
            continue;
        };
        if items.is_empty() || items.len() <= previous.len() {
            continue;
        }
        let known: HashSet<&String> = previous.iter().collect();
        changes.extend(
            items
                .iter()
                .filter(|title| !known.contains(title))
                .map(|title| format!("{course} - {title}")),
        );
    }
    ChangeSet(changes)
}
