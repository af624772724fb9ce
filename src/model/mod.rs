pub mod builder;
pub use builder::CurriculumBuilder;

pub mod entity;
pub use entity::{CourseContent, Lesson, LessonPatch, Module, ModulePatch, Part, PartPatch};

mod flatten;
pub use flatten::{FlatLesson, KeyStrategy, LessonKey, flatten, migrate_position_keys};

mod ids;
pub use ids::new_id;

mod normalize;
pub use normalize::{ensure_ids, parse_course_content, parse_course_content_str};

mod video;
pub use video::{VideoRender, embed_url, yt_id};
