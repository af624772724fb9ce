use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::model::entity::{Lesson, Part};

/// One lesson of the depth-first linearization, with its position in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlatLesson<'a> {
    pub lesson: &'a Lesson,
    pub part_index: usize,
    pub module_index: usize,
    pub lesson_index: usize,
}

impl FlatLesson<'_> {
    pub fn position(&self) -> (usize, usize, usize) {
        (self.part_index, self.module_index, self.lesson_index)
    }

    pub fn position_key(&self) -> LessonKey {
        LessonKey::position(self.part_index, self.module_index, self.lesson_index)
    }
}

/// Parts → modules → lessons in index order. The result is only valid for the structure it was
/// computed from; any edit means flattening again.
pub fn flatten(parts: &[Part]) -> Vec<FlatLesson<'_>> {
    parts
        .iter()
        .enumerate()
        .flat_map(|(part_index, part)| {
            part.modules()
                .iter()
                .enumerate()
                .flat_map(move |(module_index, module)| {
                    module
                        .lessons()
                        .iter()
                        .enumerate()
                        .map(move |(lesson_index, lesson)| FlatLesson {
                            lesson,
                            part_index,
                            module_index,
                            lesson_index,
                        })
                })
        })
        .collect()
}

/// Unit of completion tracking.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LessonKey(String);

impl LessonKey {
    pub fn new<S: Into<String>>(key: S) -> Self {
        Self(key.into())
    }

    /// `"{part}-{module}-{lesson}"`, the legacy position-based key.
    pub fn position(part: usize, module: usize, lesson: usize) -> Self {
        Self(format!("{part}-{module}-{lesson}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses a position key back into indices.
    pub fn as_position(&self) -> Option<(usize, usize, usize)> {
        let mut it = self.0.split('-').map(|s| s.parse::<usize>().ok());
        let key = (it.next()??, it.next()??, it.next()??);
        if it.next().is_some() {
            return None;
        }
        Some(key)
    }
}

impl std::fmt::Display for LessonKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LessonKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// How lessons are identified in a completion set.
///
/// `Position` keys shift when content is inserted or reordered, so progress may be attributed to
/// the wrong lesson after an edit. `LessonId` keys follow the lesson wherever it moves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyStrategy {
    #[default]
    LessonId,
    Position,
}

impl KeyStrategy {
    pub fn key(&self, flat: &FlatLesson<'_>) -> LessonKey {
        match self {
            Self::LessonId => LessonKey::new(flat.lesson.id()),
            Self::Position => flat.position_key(),
        }
    }

    pub fn keys(&self, flat: &[FlatLesson<'_>]) -> Vec<LessonKey> {
        flat.iter().map(|f| self.key(f)).collect()
    }
}

/// Rewrites position keys into lesson-id keys against the current structure. Keys that already
/// name a lesson or don't parse as positions are kept verbatim; positions that no longer exist
/// are dropped.
pub fn migrate_position_keys<'k, I>(keys: I, flat: &[FlatLesson<'_>]) -> BTreeSet<LessonKey>
where
    I: IntoIterator<Item = &'k LessonKey>,
{
    keys.into_iter()
        .filter_map(|key| match key.as_position() {
            _ if flat.iter().any(|f| f.lesson.id() == key.as_str()) => Some(key.clone()),
            Some(pos) => flat
                .iter()
                .find(|f| f.position() == pos)
                .map(|f| LessonKey::new(f.lesson.id())),
            None => Some(key.clone()),
        })
        .collect()
}
