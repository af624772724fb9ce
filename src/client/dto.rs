use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::{ClientError, ClientResult};
use crate::model::{CourseContent, parse_course_content};
use crate::progress::percentage;

/// Payload of the progress sync endpoint. Only the aggregate is exchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub course_id: u64,
    pub progress: u8,
    pub completed: bool,
}

impl ProgressUpdate {
    pub fn new(course_id: u64, progress: u8) -> Self {
        Self {
            course_id,
            progress,
            completed: progress == 100,
        }
    }

    /// Payload for `done` of `total` lessons. Rounding may not reach 100 and `completed` may not
    /// flip before the last lesson is done.
    pub fn from_counts(course_id: u64, done: usize, total: usize) -> Self {
        let completed = total > 0 && done >= total;
        let mut progress = percentage(done, total);
        if !completed {
            progress = progress.min(99);
        }
        Self {
            course_id,
            progress,
            completed,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Course {
    id: u64,
    title: String,
    content: Option<CourseContent>,
}

impl Course {
    pub fn new(id: u64, title: String, content: Option<CourseContent>) -> Self {
        Self { id, title, content }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> Option<&CourseContent> {
        self.content.as_ref()
    }

    pub fn into_content(self) -> Option<CourseContent> {
        self.content
    }

    /// Reads a course out of a "get course" response. The record may be wrapped in a `data`
    /// or `course` envelope, and `content` may be a JSON string, an object or missing.
    pub fn from_response(value: &Value, requested_id: u64) -> ClientResult<Self> {
        let record = unwrap_envelope(value, &["data", "course"]);
        let obj = record
            .as_object()
            .ok_or_else(|| ClientError::invalid_response("course is not an object"))?;

        let id = obj.get("id").and_then(as_u64).unwrap_or(requested_id);
        let title = obj
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let content = parse_course_content(obj.get("content"));

        Ok(Self::new(id, title, content))
    }
}

/// Body for saving course content; the curriculum travels as a JSON string.
#[derive(Debug, Serialize)]
pub struct CourseContentSave {
    pub content: String,
}

impl CourseContentSave {
    pub fn new(content: &CourseContent) -> ClientResult<Self> {
        Ok(Self {
            content: content.to_json_string()?,
        })
    }
}

/// Remote aggregate percentage from a progress response, clamped to 0..=100.
/// Accepts `{progress}`, `{data: {progress}}`, a bare number, or a numeric string.
pub fn remote_percentage(value: &Value) -> Option<u8> {
    let record = unwrap_envelope(value, &["data"]);
    let raw = match record {
        Value::Object(obj) => obj.get("progress")?,
        other => other,
    };

    let pct = match raw {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };

    if !pct.is_finite() {
        return None;
    }
    Some(pct.round().clamp(0.0, 100.0) as u8)
}

fn unwrap_envelope<'a>(value: &'a Value, keys: &[&str]) -> &'a Value {
    keys.iter()
        .find_map(|k| value.get(*k).filter(|v| v.is_object()))
        .unwrap_or(value)
}

fn as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}
