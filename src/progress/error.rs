use thiserror::Error;

pub type CacheResult<T> = std::result::Result<T, CacheError>;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache io error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("cache json error: {0}")]
    SerdeError(#[from] serde_json::Error),
}
