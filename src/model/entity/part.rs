use serde::{Deserialize, Serialize};

use crate::model::entity::Module;
use crate::model::ids::new_id;

/// Top-level curriculum division, e.g. "Part 1: Introduction".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    modules: Vec<Module>,
}

impl Part {
    pub fn new(id: String, title: String, description: String, modules: Vec<Module>) -> Self {
        Self {
            id,
            title,
            description,
            modules,
        }
    }

    /// New part seeded with one blank module holding one blank lesson.
    pub fn blank() -> Self {
        Self::new(new_id(), String::new(), String::new(), vec![Module::blank()])
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

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn module(&self, id: &str) -> Option<&Module> {
        self.modules.iter().find(|m| m.id() == id)
    }

    pub fn lesson_count(&self) -> usize {
        self.modules.iter().map(|m| m.lessons().len()).sum()
    }

    pub(crate) fn modules_mut(&mut self) -> &mut Vec<Module> {
        &mut self.modules
    }

    pub(crate) fn apply(&mut self, patch: PartPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PartPatch {
    pub title: Option<String>,
    pub description: Option<String>,
}

impl PartPatch {
    pub fn title<S: Into<String>>(mut self, title: S) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }
}
