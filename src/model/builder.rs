//! Editing operations over a curriculum.
//!
//! Every operation is a pure function from the current parts to a new vector; the input is never
//! mutated and untouched siblings are carried over unchanged. Unknown ids leave the structure as it
//! was. [`CurriculumBuilder`] wraps the same operations for an owner that keeps the authoritative
//! copy and wants to be told about every change.

use crate::model::entity::{Lesson, LessonPatch, Module, ModulePatch, Part, PartPatch};

/// Removal controls are only offered while more than one item remains at a level.
/// The data model itself does not enforce this.
pub fn can_remove(siblings: usize) -> bool {
    siblings > 1
}

pub fn add_part(parts: &[Part]) -> Vec<Part> {
    let mut next = parts.to_vec();
    next.push(Part::blank());
    next
}

pub fn remove_part(parts: &[Part], part_id: &str) -> Vec<Part> {
    parts.iter().filter(|p| p.id() != part_id).cloned().collect()
}

pub fn update_part(parts: &[Part], part_id: &str, patch: PartPatch) -> Vec<Part> {
    with_part(parts, part_id, |part| part.apply(patch))
}

pub fn add_module(parts: &[Part], part_id: &str) -> Vec<Part> {
    with_part(parts, part_id, |part| part.modules_mut().push(Module::blank()))
}

pub fn remove_module(parts: &[Part], part_id: &str, module_id: &str) -> Vec<Part> {
    with_part(parts, part_id, |part| {
        part.modules_mut().retain(|m| m.id() != module_id)
    })
}

pub fn update_module(
    parts: &[Part],
    part_id: &str,
    module_id: &str,
    patch: ModulePatch,
) -> Vec<Part> {
    with_module(parts, part_id, module_id, |module| module.apply(patch))
}

pub fn add_lesson(parts: &[Part], part_id: &str, module_id: &str) -> Vec<Part> {
    with_module(parts, part_id, module_id, |module| {
        module.lessons_mut().push(Lesson::blank())
    })
}

pub fn remove_lesson(parts: &[Part], part_id: &str, module_id: &str, lesson_id: &str) -> Vec<Part> {
    with_module(parts, part_id, module_id, |module| {
        module.lessons_mut().retain(|l| l.id() != lesson_id)
    })
}

pub fn update_lesson(
    parts: &[Part],
    part_id: &str,
    module_id: &str,
    lesson_id: &str,
    patch: LessonPatch,
) -> Vec<Part> {
    with_module(parts, part_id, module_id, |module| {
        if let Some(lesson) = module.lessons_mut().iter_mut().find(|l| l.id() == lesson_id) {
            lesson.apply(patch);
        }
    })
}

fn with_part<F>(parts: &[Part], part_id: &str, f: F) -> Vec<Part>
where
    F: FnOnce(&mut Part),
{
    let mut next = parts.to_vec();
    if let Some(part) = next.iter_mut().find(|p| p.id() == part_id) {
        f(part);
    }
    next
}

fn with_module<F>(parts: &[Part], part_id: &str, module_id: &str, f: F) -> Vec<Part>
where
    F: FnOnce(&mut Module),
{
    with_part(parts, part_id, |part| {
        if let Some(module) = part.modules_mut().iter_mut().find(|m| m.id() == module_id) {
            f(module);
        }
    })
}

/// Stateless editor: each call computes the next parts from `current` and hands
/// the whole vector to `on_change`.
pub struct CurriculumBuilder<F>
where
    F: FnMut(Vec<Part>),
{
    on_change: F,
}

impl<F> CurriculumBuilder<F>
where
    F: FnMut(Vec<Part>),
{
    pub fn new(on_change: F) -> Self {
        Self { on_change }
    }

    pub fn add_part(&mut self, current: &[Part]) {
        (self.on_change)(add_part(current));
    }

    pub fn remove_part(&mut self, current: &[Part], part_id: &str) {
        (self.on_change)(remove_part(current, part_id));
    }

    pub fn update_part(&mut self, current: &[Part], part_id: &str, patch: PartPatch) {
        (self.on_change)(update_part(current, part_id, patch));
    }

    pub fn add_module(&mut self, current: &[Part], part_id: &str) {
        (self.on_change)(add_module(current, part_id));
    }

    pub fn remove_module(&mut self, current: &[Part], part_id: &str, module_id: &str) {
        (self.on_change)(remove_module(current, part_id, module_id));
    }

    pub fn update_module(
        &mut self,
        current: &[Part],
        part_id: &str,
        module_id: &str,
        patch: ModulePatch,
    ) {
        (self.on_change)(update_module(current, part_id, module_id, patch));
    }

    pub fn add_lesson(&mut self, current: &[Part], part_id: &str, module_id: &str) {
        (self.on_change)(add_lesson(current, part_id, module_id));
    }

    pub fn remove_lesson(
        &mut self,
        current: &[Part],
        part_id: &str,
        module_id: &str,
        lesson_id: &str,
    ) {
        (self.on_change)(remove_lesson(current, part_id, module_id, lesson_id));
    }

    pub fn update_lesson(
        &mut self,
        current: &[Part],
        part_id: &str,
        module_id: &str,
        lesson_id: &str,
        patch: LessonPatch,
    ) {
        (self.on_change)(update_lesson(current, part_id, module_id, lesson_id, patch));
    }
}
