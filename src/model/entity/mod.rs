mod lesson;
pub use lesson::{Lesson, LessonPatch};

mod module;
pub use module::{Module, ModulePatch};

mod part;
pub use part::{Part, PartPatch};

mod content;
pub use content::CourseContent;
