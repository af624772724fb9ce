//! Per-session lesson progress.
//!
//! Every mutation is written through to the local cache immediately and (re)arms a debounce
//! timer; when the timer expires the aggregate percentage is pushed to the remote endpoint.
//! Only the state at the end of a quiet window is ever sent. The local cache is the source of
//! truth for the session: a failed sync is logged and dropped, local state is never rolled back.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::client::{ProgressSync, ProgressUpdate, UserContext};
use crate::error::log_error;
use crate::model::{KeyStrategy, LessonKey};
use crate::progress::cache::{CacheEntry, LocalCache, cache_key};
use crate::progress::completion::{CompletionSet, merge_with_remote, seed_from_percentage};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(800);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    /// Nothing loaded from the cache yet.
    Idle,
    Loaded,
    /// Local change waiting for the debounce window.
    Dirty,
    /// Request in flight.
    Syncing,
}

#[derive(Debug, Clone, Copy)]
pub struct TrackerOptions {
    pub debounce: Duration,
    pub key_strategy: KeyStrategy,
}

impl Default for TrackerOptions {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            key_strategy: KeyStrategy::default(),
        }
    }
}

struct Shared {
    course_id: u64,
    cache_key: String,
    cache: Arc<dyn LocalCache>,
    sync: Arc<dyn ProgressSync>,
    debounce: Duration,
}

struct Inner {
    state: TrackerState,
    done: CompletionSet,
    lessons: Vec<LessonKey>,
    // version of the cache entry we last read or wrote
    version: u64,
    // bumped on every mutation, lets a finished sync tell whether it is still current
    generation: u64,
    timer: Option<CancellationToken>,
    last_synced: Option<ProgressUpdate>,
}

impl Inner {
    fn update(&self, course_id: u64) -> ProgressUpdate {
        let done = self.done.resolved_count(&self.lessons);
        ProgressUpdate::from_counts(course_id, done, self.lessons.len())
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
    }
}

pub struct ProgressTracker {
    inner: Arc<Mutex<Inner>>,
    shared: Arc<Shared>,
    key_strategy: KeyStrategy,
}

impl ProgressTracker {
    /// `lessons` are the keys of the current flattened curriculum, in order.
    pub fn new(
        user: &UserContext,
        course_id: u64,
        lessons: Vec<LessonKey>,
        cache: Arc<dyn LocalCache>,
        sync: Arc<dyn ProgressSync>,
        options: TrackerOptions,
    ) -> Self {
        let shared = Shared {
            course_id,
            cache_key: cache_key(user.user_id(), course_id),
            cache,
            sync,
            debounce: options.debounce,
        };

        let inner = Inner {
            state: TrackerState::Idle,
            done: CompletionSet::new(),
            lessons,
            version: 0,
            generation: 0,
            timer: None,
            last_synced: None,
        };

        Self {
            inner: Arc::new(Mutex::new(inner)),
            shared: Arc::new(shared),
            key_strategy: options.key_strategy,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        lock(&self.inner)
    }

    pub fn course_id(&self) -> u64 {
        self.shared.course_id
    }

    pub fn key_strategy(&self) -> KeyStrategy {
        self.key_strategy
    }

    pub fn cache_key(&self) -> &str {
        &self.shared.cache_key
    }

    /// Populates the completion set from the local cache. When the cache is empty and the remote
    /// aggregate is nonzero, a set is seeded from the percentage; when both exist the remote
    /// side may only move progress forward.
    pub fn load(&self, remote_pct: Option<u8>) {
        self.load_with(remote_pct, CompletionSet::clone);
    }

    /// Like [`load`](Self::load), but rewrites the cached keys (e.g. legacy position keys) with
    /// `migrate` before they are compared with the remote aggregate.
    #[tracing::instrument(skip(self, migrate), fields(key = %self.shared.cache_key))]
    pub fn load_with<F>(&self, remote_pct: Option<u8>, migrate: F)
    where
        F: FnOnce(&CompletionSet) -> CompletionSet,
    {
        let cached = match self.shared.cache.get(&self.shared.cache_key) {
            Ok(raw) => raw.as_deref().and_then(CacheEntry::decode),
            Err(e) => {
                log_error(&e);
                None
            }
        };

        let mut inner = self.lock();
        let (version, stored) = match cached {
            Some(entry) => (entry.version, CompletionSet::from(entry.keys)),
            None => (0, CompletionSet::new()),
        };

        let local = migrate(&stored);
        if local != stored {
            tracing::debug!("migrated {} cached keys to {}", stored.len(), local.len());
        }

        let seeded = local.is_empty() && remote_pct.is_some_and(|pct| pct > 0);
        let done = if seeded {
            let pct = remote_pct.unwrap_or_default();
            tracing::debug!("seeding completion set from remote progress {pct}%");
            seed_from_percentage(pct, &inner.lessons)
        } else {
            merge_with_remote(local, remote_pct, &inner.lessons)
        };

        let changed = done != stored;
        inner.version = version;
        inner.done = done;
        inner.state = TrackerState::Loaded;
        if changed {
            write_through(&self.shared, &mut inner);
        }
        tracing::debug!("loaded {} completed lessons", inner.done.len());
    }

    /// Replaces the lesson list after the curriculum changed. Completed keys are kept.
    pub fn set_lessons(&self, lessons: Vec<LessonKey>) {
        self.lock().lessons = lessons;
    }

    pub fn mark_complete(&self, key: LessonKey) {
        self.mutate(|done| {
            done.insert(key);
        });
    }

    pub fn mark_incomplete(&self, key: &LessonKey) {
        self.mutate(|done| {
            done.remove(key);
        });
    }

    /// Returns whether the lesson is complete afterwards.
    pub fn toggle(&self, key: LessonKey) -> bool {
        let mut now_done = false;
        self.mutate(|done| {
            now_done = if done.contains(&key) {
                done.remove(&key);
                false
            } else {
                done.insert(key);
                true
            };
        });
        now_done
    }

    // Marking an already-complete lesson still writes through and re-arms the timer.
    fn mutate<F>(&self, f: F)
    where
        F: FnOnce(&mut CompletionSet),
    {
        let mut inner = self.lock();
        f(&mut inner.done);
        inner.generation += 1;
        inner.state = TrackerState::Dirty;
        write_through(&self.shared, &mut inner);
        arm_timer(&self.inner, &self.shared, &mut inner);
    }

    pub fn is_complete(&self, key: &LessonKey) -> bool {
        self.lock().done.contains(key)
    }

    pub fn snapshot(&self) -> CompletionSet {
        self.lock().done.clone()
    }

    pub fn state(&self) -> TrackerState {
        self.lock().state
    }

    pub fn total_lessons(&self) -> usize {
        self.lock().lessons.len()
    }

    pub fn completed_count(&self) -> usize {
        let inner = self.lock();
        inner.done.resolved_count(&inner.lessons)
    }

    pub fn percentage(&self) -> u8 {
        self.current_update().progress
    }

    /// Derived on every call; adding lessons to the course turns it back off.
    pub fn is_course_complete(&self) -> bool {
        let inner = self.lock();
        let total = inner.lessons.len();
        total > 0 && inner.done.resolved_count(&inner.lessons) == total
    }

    /// Payload a sync would send right now.
    pub fn current_update(&self) -> ProgressUpdate {
        self.lock().update(self.shared.course_id)
    }

    pub fn last_synced(&self) -> Option<ProgressUpdate> {
        self.lock().last_synced
    }

    /// Sends pending changes now, cancelling the debounce timer. Returns whether a request was
    /// made; failures are logged and swallowed.
    pub async fn flush(&self) -> bool {
        flush(self.inner.clone(), self.shared.clone(), None).await
    }

    /// Teardown: cancels the timer and flushes whatever is pending.
    #[tracing::instrument(skip(self), fields(course_id = self.shared.course_id))]
    pub async fn close(self) {
        self.flush().await;
    }
}

impl Drop for ProgressTracker {
    fn drop(&mut self) {
        let pending = {
            let mut inner = self.lock();
            inner.cancel_timer();
            inner.state == TrackerState::Dirty
        };

        if !pending {
            return;
        }

        // best effort, fire and forget
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let inner = self.inner.clone();
                let shared = self.shared.clone();
                handle.spawn(async move {
                    flush(inner, shared, None).await;
                });
            }
            Err(_) => tracing::warn!(
                "progress tracker dropped outside a runtime, pending progress stays local"
            ),
        }
    }
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Persists the full set. If another writer stored a newer version since we last looked, its
/// keys are merged in so neither side loses completions.
fn write_through(shared: &Shared, inner: &mut Inner) {
    let stored = match shared.cache.get(&shared.cache_key) {
        Ok(raw) => raw.as_deref().and_then(CacheEntry::decode),
        Err(e) => {
            log_error(&e);
            None
        }
    };

    let mut version = inner.version;
    if let Some(stored) = stored {
        if stored.version > inner.version {
            tracing::debug!(
                "cache entry advanced by another writer ({} > {}), merging",
                stored.version,
                inner.version
            );
            inner.done.union_with(&stored.keys);
        }
        version = version.max(stored.version);
    }

    let entry = CacheEntry::new(version + 1, inner.done.keys().clone());
    let result = entry
        .encode()
        .and_then(|raw| shared.cache.set(&shared.cache_key, &raw));

    match result {
        Ok(()) => inner.version = entry.version,
        Err(e) => log_error(&e),
    }
}

fn arm_timer(inner_arc: &Arc<Mutex<Inner>>, shared: &Arc<Shared>, inner: &mut Inner) {
    inner.cancel_timer();

    let handle = match tokio::runtime::Handle::try_current() {
        Ok(handle) => handle,
        Err(_) => {
            tracing::warn!("no async runtime, progress sync deferred until flush");
            return;
        }
    };

    let token = CancellationToken::new();
    inner.timer = Some(token.clone());

    let generation = inner.generation;
    let inner_arc = inner_arc.clone();
    let shared = shared.clone();
    let debounce = shared.debounce;

    handle.spawn(async move {
        tokio::select! {
            _ = token.cancelled() => {}
            _ = tokio::time::sleep(debounce) => {
                flush(inner_arc, shared, Some(generation)).await;
            }
        }
    });
}

/// The single sync path, used by the timer, by explicit flushes and by teardown.
/// `expected` is the generation a timer was armed for; a stale timer does nothing.
async fn flush(inner_arc: Arc<Mutex<Inner>>, shared: Arc<Shared>, expected: Option<u64>) -> bool {
    let (update, generation) = {
        let mut inner = lock(&inner_arc);
        if expected.is_some_and(|g| g != inner.generation) {
            return false;
        }
        if inner.state != TrackerState::Dirty {
            return false;
        }

        inner.cancel_timer();
        inner.state = TrackerState::Syncing;
        (inner.update(shared.course_id), inner.generation)
    };

    tracing::debug!(
        "syncing progress of course {}: {}% (completed: {})",
        update.course_id,
        update.progress,
        update.completed
    );
    let result = shared.sync.update_progress(&update).await;

    let mut inner = lock(&inner_arc);
    match result {
        Ok(()) => {
            tracing::info!("progress of course {} synced", update.course_id);
            inner.last_synced = Some(update);
        }
        Err(e) => {
            tracing::warn!("progress sync failed, keeping local state");
            log_error(&e);
        }
    }

    if inner.generation == generation {
        inner.state = TrackerState::Loaded;
    } else if inner.state == TrackerState::Syncing {
        inner.state = TrackerState::Dirty;
    }
    true
}
