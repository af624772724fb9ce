mod cache;
pub use cache::{CacheEntry, FileCache, LocalCache, MemoryCache, cache_key};

mod completion;
pub use completion::{
    CompletionSet, merge_with_remote, percentage, seed_from_percentage,
};

mod error;
pub use error::{CacheError, CacheResult};

mod tracker;
pub use tracker::{DEFAULT_DEBOUNCE, ProgressTracker, TrackerOptions, TrackerState};
