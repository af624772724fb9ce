use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::model::LessonKey;

/// Lessons the current user marked done for one course.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompletionSet(BTreeSet<LessonKey>);

impl CompletionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the key was already present.
    pub fn insert(&mut self, key: LessonKey) -> bool {
        self.0.insert(key)
    }

    /// Returns `false` when the key was not present.
    pub fn remove(&mut self, key: &LessonKey) -> bool {
        self.0.remove(key)
    }

    pub fn contains(&self, key: &LessonKey) -> bool {
        self.0.contains(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LessonKey> {
        self.0.iter()
    }

    pub fn keys(&self) -> &BTreeSet<LessonKey> {
        &self.0
    }

    pub fn union_with(&mut self, other: &BTreeSet<LessonKey>) {
        self.0.extend(other.iter().cloned());
    }

    /// Number of keys that name a lesson in the current structure.
    pub fn resolved_count(&self, lessons: &[LessonKey]) -> usize {
        lessons.iter().filter(|k| self.0.contains(k)).count()
    }
}

impl From<BTreeSet<LessonKey>> for CompletionSet {
    fn from(keys: BTreeSet<LessonKey>) -> Self {
        Self(keys)
    }
}

impl FromIterator<LessonKey> for CompletionSet {
    fn from_iter<T: IntoIterator<Item = LessonKey>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// `round(100 * done / total)`, 0 for a course without lessons.
pub fn percentage(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (100.0 * done as f64 / total as f64).round();
    pct.min(100.0) as u8
}

/// Approximates a completion set from a remote aggregate by marking the first
/// `round(pct / 100 * total)` lessons in flattened order. Which lessons the user really finished
/// is unknown; only the percentage is preserved.
pub fn seed_from_percentage(pct: u8, lessons: &[LessonKey]) -> CompletionSet {
    let count = (f64::from(pct.min(100)) / 100.0 * lessons.len() as f64).round() as usize;
    lessons.iter().take(count).cloned().collect()
}

/// Forward-only reconciliation of a cached set with the remote aggregate: when the remote side
/// is ahead, the seeded prefix is added to the local set; local completions are never dropped.
pub fn merge_with_remote(
    local: CompletionSet,
    remote_pct: Option<u8>,
    lessons: &[LessonKey],
) -> CompletionSet {
    let Some(remote_pct) = remote_pct else {
        return local;
    };

    let local_pct = percentage(local.resolved_count(lessons), lessons.len());
    if remote_pct <= local_pct {
        return local;
    }

    let mut merged = local;
    merged.union_with(seed_from_percentage(remote_pct, lessons).keys());
    merged
}
