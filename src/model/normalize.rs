//! Boundary normalization for curriculum data coming from the backend.
//!
//! The backend's `content` field is not a reliable contract: it may be a JSON string or an
//! already decoded object, fields may be missing or carry the wrong type, and older records
//! use `video_url` instead of `videoUrl`. Everything is coerced here so the rest of the crate
//! works with fully populated [`Part`]s. Nothing in this module returns an error; malformed
//! input degrades to `None` or empty values.

use serde_json::{Map, Value};

use crate::model::entity::{CourseContent, Lesson, Module, Part};
use crate::model::ids::new_id;

/// Fills in missing ids (and empty titles/descriptions) for every part, module and lesson.
/// Existing ids are kept as-is, so normalizing twice is a no-op.
pub fn ensure_ids(raw_parts: &[Value]) -> Vec<Part> {
    raw_parts
        .iter()
        .filter_map(Value::as_object)
        .map(part_from)
        .collect()
}

/// Parses a course `content` field which may be absent, a JSON string or an object.
/// Returns `None` unless the decoded value carries an array-typed `parts` field.
pub fn parse_course_content(raw: Option<&Value>) -> Option<CourseContent> {
    let decoded;
    let value = match raw? {
        Value::Null => return None,
        Value::String(s) => {
            decoded = decode_str(s)?;
            &decoded
        }
        other => other,
    };

    let parts = value.as_object()?.get("parts")?.as_array()?;
    Some(CourseContent::new(ensure_ids(parts)))
}

pub fn parse_course_content_str(raw: &str) -> Option<CourseContent> {
    let value = decode_str(raw)?;
    parse_course_content(Some(&value))
}

fn decode_str(raw: &str) -> Option<Value> {
    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!("course content is not valid json: {e}");
            None
        }
    }
}

fn part_from(obj: &Map<String, Value>) -> Part {
    let modules = list(obj, "modules")
        .iter()
        .filter_map(Value::as_object)
        .map(module_from)
        .collect();
    Part::new(id_or_new(obj), text(obj, "title"), text(obj, "description"), modules)
}

fn module_from(obj: &Map<String, Value>) -> Module {
    let lessons = list(obj, "lessons")
        .iter()
        .filter_map(Value::as_object)
        .map(lesson_from)
        .collect();
    Module::new(id_or_new(obj), text(obj, "title"), text(obj, "description"), lessons)
}

fn lesson_from(obj: &Map<String, Value>) -> Lesson {
    let video_url = match text(obj, "videoUrl") {
        url if url.is_empty() => text(obj, "video_url"),
        url => url,
    };

    Lesson::new(
        id_or_new(obj),
        text(obj, "title"),
        text(obj, "description"),
        video_url,
        text(obj, "duration"),
    )
}

fn id_or_new(obj: &Map<String, Value>) -> String {
    match text(obj, "id") {
        id if id.trim().is_empty() => new_id(),
        id => id,
    }
}

/// Strings pass through, numbers are stringified (ids and durations are often numeric),
/// anything else reads as empty.
fn text(obj: &Map<String, Value>, key: &str) -> String {
    match obj.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn list<'a>(obj: &'a Map<String, Value>, key: &str) -> &'a [Value] {
    obj.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}
