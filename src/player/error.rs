use thiserror::Error;

use crate::client::ClientError;

pub type PlayerResult<T> = std::result::Result<T, PlayerError>;

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("course {course_id} has no lessons")]
    NoContent { course_id: u64 },

    #[error("no lesson at part {part}, module {module}, lesson {lesson}")]
    LessonOutOfRange {
        part: usize,
        module: usize,
        lesson: usize,
    },

    #[error("unable to load course: {0}")]
    Client(#[from] ClientError),
}
