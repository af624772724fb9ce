use serde::{Deserialize, Serialize};

use crate::model::entity::{Lesson, Part};

/// Root of a course curriculum. Order of parts, modules and lessons is significant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseContent {
    #[serde(default)]
    parts: Vec<Part>,
}

impl CourseContent {
    pub fn new(parts: Vec<Part>) -> Self {
        Self { parts }
    }

    /// Content a new course starts with in the editor: one part, one module, one lesson.
    pub fn seeded() -> Self {
        Self::new(vec![Part::blank()])
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn into_parts(self) -> Vec<Part> {
        self.parts
    }

    pub fn set_parts(&mut self, parts: Vec<Part>) {
        self.parts = parts;
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn lesson_count(&self) -> usize {
        self.parts.iter().map(Part::lesson_count).sum()
    }

    pub fn lesson_at(&self, part: usize, module: usize, lesson: usize) -> Option<&Lesson> {
        self.parts
            .get(part)?
            .modules()
            .get(module)?
            .lessons()
            .get(lesson)
    }

    /// Serialized form stored in the backend's `content` field.
    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl From<Vec<Part>> for CourseContent {
    fn from(parts: Vec<Part>) -> Self {
        Self::new(parts)
    }
}
