//! Read-only curriculum tree with collapse state.
//!
//! Expansion state is a set of open node ids kept apart from the content, so one curriculum can
//! back several views that are expanded differently.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{CourseContent, Lesson, Module, Part, parse_course_content};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExpandMode {
    /// At most one part and one module open at a time.
    #[default]
    Accordion,
    Free,
}

#[derive(Debug, Clone, Default)]
pub struct CurriculumView {
    mode: ExpandMode,
    open_parts: BTreeSet<String>,
    open_modules: BTreeSet<String>,
}

impl CurriculumView {
    pub fn new(mode: ExpandMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    pub fn mode(&self) -> ExpandMode {
        self.mode
    }

    pub fn is_part_open(&self, part_id: &str) -> bool {
        self.open_parts.contains(part_id)
    }

    pub fn is_module_open(&self, module_id: &str) -> bool {
        self.open_modules.contains(module_id)
    }

    pub fn toggle_part(&mut self, part_id: &str) {
        toggle(&mut self.open_parts, part_id, self.mode);
    }

    pub fn toggle_module(&mut self, module_id: &str) {
        toggle(&mut self.open_modules, module_id, self.mode);
    }

    /// Opens the path down to a module, e.g. the one holding the active lesson.
    pub fn reveal(&mut self, part_id: &str, module_id: &str) {
        if self.mode == ExpandMode::Accordion {
            self.open_parts.clear();
            self.open_modules.clear();
        }
        self.open_parts.insert(part_id.to_string());
        self.open_modules.insert(module_id.to_string());
    }

    pub fn collapse_all(&mut self) {
        self.open_parts.clear();
        self.open_modules.clear();
    }

    /// Opens every node. In accordion mode only the first part and its first module.
    pub fn expand_all(&mut self, content: &CourseContent) {
        match self.mode {
            ExpandMode::Free => {
                for part in content.parts() {
                    self.open_parts.insert(part.id().to_string());
                    for module in part.modules() {
                        self.open_modules.insert(module.id().to_string());
                    }
                }
            }
            ExpandMode::Accordion => {
                if let Some(part) = content.parts().first() {
                    let module_id = part.modules().first().map(Module::id).unwrap_or_default();
                    self.reveal(part.id(), module_id);
                }
            }
        }
    }

    /// Renders the tree as indented text. Closed nodes show their header only.
    pub fn render(&self, content: Option<&CourseContent>) -> String {
        let content = match content {
            Some(content) if !content.is_empty() => content,
            _ => return String::from("No content has been added to this course yet.\n"),
        };

        let mut out = String::new();
        for (p, part) in content.parts().iter().enumerate() {
            self.render_part(&mut out, p, part);
        }
        out
    }

    fn render_part(&self, out: &mut String, index: usize, part: &Part) {
        let open = self.is_part_open(part.id());
        let _ = writeln!(
            out,
            "{} Part {}: {} ({} modules, {} lessons)",
            marker(open),
            index + 1,
            or_untitled(part.title(), "Untitled part"),
            part.modules().len(),
            part.lesson_count()
        );
        if !open {
            return;
        }
        if !part.description().is_empty() {
            let _ = writeln!(out, "    {}", part.description());
        }
        for (m, module) in part.modules().iter().enumerate() {
            self.render_module(out, m, module);
        }
    }

    fn render_module(&self, out: &mut String, index: usize, module: &Module) {
        let open = self.is_module_open(module.id());
        let _ = writeln!(
            out,
            "    {} Module {}: {} ({} lessons)",
            marker(open),
            index + 1,
            or_untitled(module.title(), "Untitled module"),
            module.lessons().len()
        );
        if !open {
            return;
        }
        for (l, lesson) in module.lessons().iter().enumerate() {
            render_lesson(out, l, lesson);
        }
    }
}

fn render_lesson(out: &mut String, index: usize, lesson: &Lesson) {
    let video = lesson.video();
    let duration = if lesson.duration().is_empty() {
        String::new()
    } else {
        format!(" {}", lesson.duration())
    };
    let _ = writeln!(
        out,
        "        {}. {} [{}]{}",
        index + 1,
        or_untitled(lesson.title(), "Untitled lesson"),
        video.label(),
        duration
    );
    let _ = writeln!(out, "           {video}");
    if !lesson.description().is_empty() {
        let _ = writeln!(out, "           {}", lesson.description());
    }
}

fn toggle(open: &mut BTreeSet<String>, id: &str, mode: ExpandMode) {
    if open.remove(id) {
        return;
    }
    if mode == ExpandMode::Accordion {
        open.clear();
    }
    open.insert(id.to_string());
}

fn marker(open: bool) -> &'static str {
    if open { "[-]" } else { "[+]" }
}

pub(crate) fn or_untitled<'a>(title: &'a str, fallback: &'a str) -> &'a str {
    if title.trim().is_empty() { fallback } else { title }
}

/// Viewer over a raw `content` blob as stored by the backend.
#[derive(Debug, Clone)]
pub struct CurriculumViewer {
    content: Option<CourseContent>,
    view: CurriculumView,
}

impl CurriculumViewer {
    pub fn from_raw(raw: Option<&Value>, mode: ExpandMode) -> Self {
        Self::new(parse_course_content(raw), mode)
    }

    pub fn new(content: Option<CourseContent>, mode: ExpandMode) -> Self {
        Self {
            content,
            view: CurriculumView::new(mode),
        }
    }

    pub fn content(&self) -> Option<&CourseContent> {
        self.content.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.content.as_ref().is_none_or(CourseContent::is_empty)
    }

    pub fn view(&self) -> &CurriculumView {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut CurriculumView {
        &mut self.view
    }

    pub fn render(&self) -> String {
        self.view.render(self.content.as_ref())
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    fn content() -> CourseContent {
        parse_course_content(Some(&json!({
            "parts": [
                {
                    "id": "p1", "title": "Safety",
                    "modules": [
                        { "id": "m1", "title": "Gear", "lessons": [
                            {
                                "id": "l1", "title": "Helmets",
                                "videoUrl": "https://youtu.be/abc12345678", "duration": "4:00"
                            },
                            { "id": "l2", "title": "Gloves", "videoUrl": "https://vimeo.com/1" },
                            { "id": "l3", "title": "Reading" }
                        ]},
                        { "id": "m2", "title": "Fire", "lessons": [] }
                    ]
                },
                { "id": "p2", "title": "", "modules": [] }
            ]
        })))
        .unwrap()
    }

    #[test]
    fn accordion_toggle_test() {
        let mut view = CurriculumView::new(ExpandMode::Accordion);
        view.toggle_part("p1");
        view.toggle_part("p2");
        assert!(!view.is_part_open("p1"));
        assert!(view.is_part_open("p2"));

        view.toggle_part("p2");
        assert!(!view.is_part_open("p2"));

        view.toggle_module("m1");
        view.toggle_module("m2");
        assert!(!view.is_module_open("m1"));
        assert!(view.is_module_open("m2"));
    }

    #[test]
    fn free_toggle_test() {
        let mut view = CurriculumView::new(ExpandMode::Free);
        view.toggle_part("p1");
        view.toggle_part("p2");
        assert!(view.is_part_open("p1"));
        assert!(view.is_part_open("p2"));

        view.expand_all(&content());
        assert!(view.is_module_open("m1"));
        assert!(view.is_module_open("m2"));

        view.collapse_all();
        assert!(!view.is_part_open("p1"));
    }

    #[test]
    fn views_are_independent_test() {
        let content = content();
        let mut a = CurriculumView::new(ExpandMode::Accordion);
        let b = CurriculumView::new(ExpandMode::Accordion);
        a.expand_all(&content);
        assert!(a.is_module_open("m1"));
        assert!(!b.is_module_open("m1"));
    }

    #[test]
    fn render_three_video_modes_test() {
        let content = content();
        let mut view = CurriculumView::new(ExpandMode::Accordion);
        view.reveal("p1", "m1");
        let out = view.render(Some(&content));

        assert!(out.contains("[-] Part 1: Safety (2 modules, 3 lessons)"));
        assert!(out.contains("1. Helmets [video] 4:00"));
        assert!(out.contains("https://www.youtube.com/embed/abc12345678"));
        assert!(out.contains("2. Gloves [link]"));
        assert!(out.contains("https://vimeo.com/1"));
        assert!(out.contains("3. Reading [no video]"));
        assert!(out.contains("No video for this lesson"));
        assert!(out.contains("[+] Module 2: Fire (0 lessons)"));
        assert!(out.contains("[+] Part 2: Untitled part"));
    }

    #[test]
    fn collapsed_render_hides_children_test() {
        let view = CurriculumView::new(ExpandMode::Free);
        let out = view.render(Some(&content()));
        assert!(out.contains("[+] Part 1: Safety"));
        assert!(!out.contains("Helmets"));
    }

    #[test]
    fn viewer_empty_states_test() {
        let none = CurriculumViewer::from_raw(None, ExpandMode::Accordion);
        assert!(none.is_empty());
        assert_eq!(none.render(), "No content has been added to this course yet.\n");

        let broken = CurriculumViewer::from_raw(Some(&json!("{oops")), ExpandMode::Accordion);
        assert!(broken.is_empty());

        let empty = CurriculumViewer::from_raw(Some(&json!(r#"{"parts":[]}"#)), ExpandMode::Free);
        assert!(empty.is_empty());
        assert!(empty.render().starts_with("No content"));

        let mut full = CurriculumViewer::new(Some(content()), ExpandMode::Free);
        assert!(!full.is_empty());
        full.view_mut().toggle_part("p1");
        assert!(full.render().contains("[+] Module 1: Gear"));
    }
}
