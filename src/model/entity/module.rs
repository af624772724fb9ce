use serde::{Deserialize, Serialize};

use crate::model::entity::Lesson;
use crate::model::ids::new_id;

/// Mid-level grouping of lessons within a part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    lessons: Vec<Lesson>,
}

impl Module {
    pub fn new(id: String, title: String, description: String, lessons: Vec<Lesson>) -> Self {
        Self {
            id,
            title,
            description,
            lessons,
        }
    }

    /// New module seeded with one blank lesson.
    pub fn blank() -> Self {
        Self::new(new_id(), String::new(), String::new(), vec![Lesson::blank()])
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn lessons(&self) -> &[Lesson] {
        &self.lessons
    }

    pub fn lesson(&self, id: &str) -> Option<&Lesson> {
        self.lessons.iter().find(|l| l.id() == id)
    }

    pub(crate) fn lessons_mut(&mut self) -> &mut Vec<Lesson> {
        &mut self.lessons
    }

    pub(crate) fn apply(&mut self, patch: ModulePatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ModulePatch {
    pub title: Option<String>,
    pub description: Option<String>,
}

impl ModulePatch {
    pub fn title<S: Into<String>>(mut self, title: S) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }
}
