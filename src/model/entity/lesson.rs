use serde::{Deserialize, Serialize};

use crate::model::ids::new_id;
use crate::model::video::{VideoRender, yt_id};

/// Leaf unit of curriculum content. A lesson without a video url is a text lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    video_url: String,
    #[serde(default)]
    duration: String,
}

impl Lesson {
    pub fn new(
        id: String,
        title: String,
        description: String,
        video_url: String,
        duration: String,
    ) -> Self {
        Self {
            id,
            title,
            description,
            video_url,
            duration,
        }
    }

    /// Freshly minted lesson, as created by the builder.
    pub fn blank() -> Self {
        Self::new(
            new_id(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
        )
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

    pub fn video_url(&self) -> &str {
        &self.video_url
    }

    pub fn duration(&self) -> &str {
        &self.duration
    }

    pub fn is_text_lesson(&self) -> bool {
        self.video_url.trim().is_empty()
    }

    pub fn yt_id(&self) -> Option<String> {
        yt_id(&self.video_url)
    }

    pub fn video(&self) -> VideoRender {
        VideoRender::for_url(&self.video_url)
    }

    pub(crate) fn apply(&mut self, patch: LessonPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(video_url) = patch.video_url {
            self.video_url = video_url;
        }
        if let Some(duration) = patch.duration {
            self.duration = duration;
        }
    }
}

/// Partial update for a lesson; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub video_url: Option<String>,
    pub duration: Option<String>,
}

impl LessonPatch {
    pub fn title<S: Into<String>>(mut self, title: S) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn video_url<S: Into<String>>(mut self, video_url: S) -> Self {
        self.video_url = Some(video_url.into());
        self
    }

    pub fn duration<S: Into<String>>(mut self, duration: S) -> Self {
        self.duration = Some(duration.into());
        self
    }
}
