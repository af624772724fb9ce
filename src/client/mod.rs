use async_trait::async_trait;

mod context;
pub use context::{UserContext, UserRole};

pub mod dto;
pub use dto::{Course, ProgressUpdate};

mod error;
pub use error::{ClientError, ClientResult};

mod http;
pub use http::BackendClient;

/// Where the player loads a course and the user's remote aggregate progress from.
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn get_course(&self, course_id: u64) -> ClientResult<Course>;
    async fn get_progress(&self, course_id: u64) -> ClientResult<Option<u8>>;
}

/// Remote progress endpoint. Receives the aggregate only, never individual lessons.
#[async_trait]
pub trait ProgressSync: Send + Sync {
    async fn update_progress(&self, update: &ProgressUpdate) -> ClientResult<()>;
}
