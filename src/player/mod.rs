//! Course player: navigation over the flattened curriculum, completion tracking and the
//! sidebar tree.

use std::fmt::Write as _;
use std::sync::Arc;

pub mod command;
pub use command::PlayerCommand;

mod error;
pub use error::{PlayerError, PlayerResult};

mod view;
pub use view::{CurriculumView, CurriculumViewer, ExpandMode};

use crate::Config;
use crate::client::{ContentSource, Course, ProgressSync, UserContext};
use crate::error::log_error;
use crate::model::{
    CourseContent, FlatLesson, KeyStrategy, Lesson, LessonKey, VideoRender, flatten,
    migrate_position_keys,
};
use crate::progress::{CompletionSet, LocalCache, ProgressTracker, TrackerOptions};
use view::or_untitled;

#[derive(Debug, Clone, Copy, Default)]
pub struct PlayerOptions {
    pub tracker: TrackerOptions,
    pub expand_mode: ExpandMode,
}

impl PlayerOptions {
    pub fn from_config(config: &Config) -> Self {
        let player = config.player();
        Self {
            tracker: TrackerOptions {
                debounce: player.debounce(),
                key_strategy: player.key_strategy(),
            },
            expand_mode: player.expand_mode(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breadcrumb {
    pub part: String,
    pub module: String,
    pub lesson: String,
}

impl std::fmt::Display for Breadcrumb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} › {} › {}", self.part, self.module, self.lesson)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidebarLesson {
    pub key: LessonKey,
    pub title: String,
    pub position: (usize, usize, usize),
    pub done: bool,
    pub active: bool,
    pub video: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidebarModule {
    pub id: String,
    pub title: String,
    pub done: usize,
    pub total: usize,
    pub lessons: Vec<SidebarLesson>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidebarPart {
    pub id: String,
    pub title: String,
    pub done: usize,
    pub total: usize,
    pub modules: Vec<SidebarModule>,
}

pub struct CoursePlayer {
    course_id: u64,
    title: String,
    content: CourseContent,
    key_strategy: KeyStrategy,
    active: (usize, usize, usize),
    tracker: ProgressTracker,
    view: CurriculumView,
}

impl CoursePlayer {
    /// Fetches the course and the user's remote progress, then opens the player.
    /// A failing progress fetch only loses the seeding hint.
    #[tracing::instrument(skip(source, user, cache, sync, options))]
    pub async fn load(
        source: &dyn ContentSource,
        course_id: u64,
        user: &UserContext,
        cache: Arc<dyn LocalCache>,
        sync: Arc<dyn ProgressSync>,
        options: PlayerOptions,
    ) -> PlayerResult<Self> {
        let (course, remote) =
            tokio::join!(source.get_course(course_id), source.get_progress(course_id));
        let course = course?;
        let remote = remote.unwrap_or_else(|e| {
            log_error(&e);
            None
        });

        Self::open(course, user, remote, cache, sync, options)
    }

    pub fn open(
        course: Course,
        user: &UserContext,
        remote_pct: Option<u8>,
        cache: Arc<dyn LocalCache>,
        sync: Arc<dyn ProgressSync>,
        options: PlayerOptions,
    ) -> PlayerResult<Self> {
        let course_id = course.id();
        let title = course.title().to_string();
        let content = course.into_content().unwrap_or_default();

        let key_strategy = options.tracker.key_strategy;
        let flat = flatten(content.parts());
        let first = flat
            .first()
            .map(FlatLesson::position)
            .ok_or(PlayerError::NoContent { course_id })?;
        let lessons = key_strategy.keys(&flat);

        let tracker = ProgressTracker::new(user, course_id, lessons, cache, sync, options.tracker);
        match key_strategy {
            KeyStrategy::LessonId => tracker.load_with(remote_pct, |done| {
                CompletionSet::from(migrate_position_keys(done.iter(), &flat))
            }),
            KeyStrategy::Position => tracker.load(remote_pct),
        }

        let mut player = Self {
            course_id,
            title,
            content,
            key_strategy,
            active: first,
            tracker,
            view: CurriculumView::new(options.expand_mode),
        };
        player.reveal_active();
        Ok(player)
    }

    pub fn course_id(&self) -> u64 {
        self.course_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &CourseContent {
        &self.content
    }

    pub fn tracker(&self) -> &ProgressTracker {
        &self.tracker
    }

    pub fn view(&self) -> &CurriculumView {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut CurriculumView {
        &mut self.view
    }

    pub fn flat(&self) -> Vec<FlatLesson<'_>> {
        flatten(self.content.parts())
    }

    pub fn active(&self) -> (usize, usize, usize) {
        self.active
    }

    fn active_index(&self) -> Option<usize> {
        self.flat().iter().position(|f| f.position() == self.active)
    }

    pub fn current_lesson(&self) -> Option<&Lesson> {
        let (p, m, l) = self.active;
        self.content.lesson_at(p, m, l)
    }

    pub fn current_key(&self) -> Option<LessonKey> {
        let (p, m, l) = self.active;
        let lesson = self.content.lesson_at(p, m, l)?;
        Some(self.key_for(lesson, self.active))
    }

    pub fn yt_id(&self) -> Option<String> {
        self.current_lesson().and_then(Lesson::yt_id)
    }

    pub fn current_video(&self) -> VideoRender {
        self.current_lesson()
            .map(Lesson::video)
            .unwrap_or(VideoRender::NoVideo)
    }

    fn key_for(&self, lesson: &Lesson, (p, m, l): (usize, usize, usize)) -> LessonKey {
        self.key_strategy.key(&FlatLesson {
            lesson,
            part_index: p,
            module_index: m,
            lesson_index: l,
        })
    }

    fn reveal_active(&mut self) {
        let (p, m, _) = self.active;
        let ids = self.content.parts().get(p).and_then(|part| {
            part.modules()
                .get(m)
                .map(|module| (part.id().to_string(), module.id().to_string()))
        });
        if let Some((part_id, module_id)) = ids {
            self.view.reveal(&part_id, &module_id);
        }
    }

    pub fn go_to_lesson(&mut self, part: usize, module: usize, lesson: usize) -> PlayerResult<()> {
        if self.content.lesson_at(part, module, lesson).is_none() {
            return Err(PlayerError::LessonOutOfRange {
                part,
                module,
                lesson,
            });
        }
        self.active = (part, module, lesson);
        self.reveal_active();
        Ok(())
    }

    /// Marks the current lesson complete, then advances. Returns whether the position moved;
    /// on the last lesson only the completion happens.
    pub fn go_next(&mut self) -> bool {
        if let Some(key) = self.current_key() {
            self.tracker.mark_complete(key);
        }

        let next = self
            .active_index()
            .and_then(|i| self.flat().get(i + 1).map(FlatLesson::position));
        match next {
            Some((p, m, l)) => self.go_to_lesson(p, m, l).is_ok(),
            None => false,
        }
    }

    /// Steps back without touching completion.
    pub fn go_prev(&mut self) -> bool {
        let prev = self
            .active_index()
            .filter(|i| *i > 0)
            .and_then(|i| self.flat().get(i - 1).map(FlatLesson::position));
        match prev {
            Some((p, m, l)) => self.go_to_lesson(p, m, l).is_ok(),
            None => false,
        }
    }

    pub fn mark_current_complete(&self) {
        if let Some(key) = self.current_key() {
            self.tracker.mark_complete(key);
        }
    }

    pub fn mark_current_incomplete(&self) {
        if let Some(key) = self.current_key() {
            self.tracker.mark_incomplete(&key);
        }
    }

    pub fn is_complete(&self, key: &LessonKey) -> bool {
        self.tracker.is_complete(key)
    }

    pub fn progress_percentage(&self) -> u8 {
        self.tracker.percentage()
    }

    /// Recomputed from the completion set on every call.
    pub fn show_completion_banner(&self) -> bool {
        self.tracker.is_course_complete()
    }

    pub fn breadcrumb(&self) -> Option<Breadcrumb> {
        let (p, m, l) = self.active;
        let part = self.content.parts().get(p)?;
        let module = part.modules().get(m)?;
        let lesson = module.lessons().get(l)?;
        Some(Breadcrumb {
            part: or_untitled(part.title(), &format!("Part {}", p + 1)).to_string(),
            module: or_untitled(module.title(), &format!("Module {}", m + 1)).to_string(),
            lesson: or_untitled(lesson.title(), &format!("Lesson {}", l + 1)).to_string(),
        })
    }

    /// Navigation tree with per-part and per-module completion counts.
    pub fn sidebar(&self) -> Vec<SidebarPart> {
        let done = self.tracker.snapshot();
        self.content
            .parts()
            .iter()
            .enumerate()
            .map(|(p, part)| {
                let modules: Vec<SidebarModule> = part
                    .modules()
                    .iter()
                    .enumerate()
                    .map(|(m, module)| {
                        let lessons: Vec<SidebarLesson> = module
                            .lessons()
                            .iter()
                            .enumerate()
                            .map(|(l, lesson)| {
                                let key = self.key_for(lesson, (p, m, l));
                                SidebarLesson {
                                    done: done.contains(&key),
                                    key,
                                    title: lesson.title().to_string(),
                                    position: (p, m, l),
                                    active: (p, m, l) == self.active,
                                    video: lesson.video().label(),
                                }
                            })
                            .collect();
                        SidebarModule {
                            id: module.id().to_string(),
                            title: module.title().to_string(),
                            done: lessons.iter().filter(|l| l.done).count(),
                            total: lessons.len(),
                            lessons,
                        }
                    })
                    .collect();
                SidebarPart {
                    id: part.id().to_string(),
                    title: part.title().to_string(),
                    done: modules.iter().map(|m| m.done).sum(),
                    total: modules.iter().map(|m| m.total).sum(),
                    modules,
                }
            })
            .collect()
    }

    /// Sidebar as text, honouring the view's expansion state.
    pub fn render_sidebar(&self) -> String {
        let mut out = String::new();
        for (p, part) in self.sidebar().iter().enumerate() {
            let open = self.view.is_part_open(&part.id);
            let _ = writeln!(
                out,
                "{} Part {}: {} [{}/{}]",
                if open { "[-]" } else { "[+]" },
                p + 1,
                or_untitled(&part.title, "Untitled part"),
                part.done,
                part.total
            );
            if !open {
                continue;
            }
            for (m, module) in part.modules.iter().enumerate() {
                let open = self.view.is_module_open(&module.id);
                let _ = writeln!(
                    out,
                    "    {} Module {}: {} [{}/{}]",
                    if open { "[-]" } else { "[+]" },
                    m + 1,
                    or_untitled(&module.title, "Untitled module"),
                    module.done,
                    module.total
                );
                if !open {
                    continue;
                }
                for lesson in &module.lessons {
                    let (lp, lm, ll) = lesson.position;
                    let _ = writeln!(
                        out,
                        "        {} {} {} ({} {} {}) [{}]",
                        if lesson.active { ">" } else { " " },
                        if lesson.done { "[x]" } else { "[ ]" },
                        or_untitled(&lesson.title, "Untitled lesson"),
                        lp + 1,
                        lm + 1,
                        ll + 1,
                        lesson.video
                    );
                }
            }
        }
        let _ = writeln!(out, "Progress: {}%", self.progress_percentage());
        out
    }

    /// Teardown: cancels the pending sync timer and flushes.
    pub async fn close(self) {
        self.tracker.close().await;
    }
}

#[cfg(test)]
mod test {
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    use super::*;
    use crate::client::{ClientResult, ProgressUpdate};
    use crate::model::parse_course_content;
    use crate::progress::MemoryCache;

    #[derive(Default)]
    struct NullSync {
        calls: Mutex<Vec<ProgressUpdate>>,
    }

    #[async_trait]
    impl ProgressSync for NullSync {
        async fn update_progress(&self, update: &ProgressUpdate) -> ClientResult<()> {
            self.calls.lock().unwrap().push(*update);
            Ok(())
        }
    }

    fn course() -> Course {
        let content = parse_course_content(Some(&json!({
            "parts": [
                { "id": "p1", "title": "Intro", "modules": [
                    { "id": "m1", "title": "Start", "lessons": [
                        {
                            "id": "a", "title": "Welcome",
                            "videoUrl": "https://youtu.be/abc12345678"
                        },
                        { "id": "b", "title": "Tools" }
                    ]},
                    { "id": "m2", "title": "", "lessons": [{ "id": "c", "title": "" }] }
                ]},
                { "id": "p2", "title": "Practice", "modules": [
                    { "id": "m3", "title": "Drills", "lessons": [{ "id": "d", "title": "Drill" }] }
                ]}
            ]
        })));
        Course::new(42, "Carpentry".into(), content)
    }

    fn player(strategy: KeyStrategy, cache: Arc<MemoryCache>) -> CoursePlayer {
        CoursePlayer::open(
            course(),
            &UserContext::student(7),
            None,
            cache,
            Arc::new(NullSync::default()),
            PlayerOptions {
                tracker: TrackerOptions {
                    key_strategy: strategy,
                    ..Default::default()
                },
                ..Default::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn open_requires_lessons_test() {
        let result = CoursePlayer::open(
            Course::new(1, "Empty".into(), None),
            &UserContext::student(7),
            None,
            Arc::new(MemoryCache::new()),
            Arc::new(NullSync::default()),
            PlayerOptions::default(),
        );
        assert!(matches!(result, Err(PlayerError::NoContent { course_id: 1 })));
    }

    #[test]
    fn navigation_test() {
        let mut player = player(KeyStrategy::LessonId, Arc::new(MemoryCache::new()));
        assert_eq!(player.active(), (0, 0, 0));
        assert_eq!(player.yt_id().as_deref(), Some("abc12345678"));
        assert!(!player.go_prev());

        assert!(player.go_next());
        assert_eq!(player.active(), (0, 0, 1));
        assert!(player.is_complete(&LessonKey::from("a")));
        assert_eq!(player.yt_id(), None);
        assert_eq!(player.current_video(), VideoRender::NoVideo);

        assert!(player.go_next());
        assert_eq!(player.active(), (0, 1, 0));
        assert!(player.go_next());
        assert_eq!(player.active(), (1, 0, 0));
        assert!(player.view().is_part_open("p2"));
        assert!(!player.view().is_part_open("p1"));

        // last lesson: completes but stays put
        assert!(!player.go_next());
        assert_eq!(player.active(), (1, 0, 0));
        assert!(player.show_completion_banner());

        // going back has no completion side effect
        player.mark_current_incomplete();
        assert!(player.go_prev());
        assert!(!player.is_complete(&LessonKey::from("d")));
        assert!(!player.show_completion_banner());
        assert_eq!(player.progress_percentage(), 75);
    }

    #[test]
    fn go_to_lesson_bounds_test() {
        let mut player = player(KeyStrategy::LessonId, Arc::new(MemoryCache::new()));
        assert!(player.go_to_lesson(0, 1, 0).is_ok());
        assert_eq!(player.current_lesson().unwrap().id(), "c");
        assert!(matches!(
            player.go_to_lesson(0, 1, 1),
            Err(PlayerError::LessonOutOfRange { .. })
        ));
        assert_eq!(player.active(), (0, 1, 0));
    }

    #[test]
    fn breadcrumb_test() {
        let mut player = player(KeyStrategy::LessonId, Arc::new(MemoryCache::new()));
        assert_eq!(player.breadcrumb().unwrap().to_string(), "Intro › Start › Welcome");
        player.go_to_lesson(0, 1, 0).unwrap();
        assert_eq!(player.breadcrumb().unwrap().to_string(), "Intro › Module 2 › Lesson 1");
    }

    #[test]
    fn sidebar_counts_test() {
        let mut player = player(KeyStrategy::Position, Arc::new(MemoryCache::new()));
        player.go_next();
        player.go_next();
        assert_eq!(player.current_key(), Some(LessonKey::from("0-1-0")));

        let sidebar = player.sidebar();
        assert_eq!((sidebar[0].done, sidebar[0].total), (2, 3));
        assert_eq!((sidebar[0].modules[0].done, sidebar[0].modules[0].total), (2, 2));
        assert_eq!((sidebar[0].modules[1].done, sidebar[0].modules[1].total), (0, 1));
        assert_eq!((sidebar[1].done, sidebar[1].total), (0, 1));
        assert!(sidebar[0].modules[1].lessons[0].active);
        assert_eq!(sidebar[0].modules[0].lessons[0].video, "video");

        let text = player.render_sidebar();
        assert!(text.contains("[-] Part 1: Intro [2/3]"));
        assert!(text.contains("[+] Part 2: Practice [0/1]"));
        assert!(text.contains("Progress: 50%"));
    }

    #[test]
    fn legacy_position_cache_is_migrated_test() {
        let cache = Arc::new(MemoryCache::new());
        cache.set("course_progress_7_42", r#"["0-0-1","1-0-0"]"#).unwrap();

        let player = player(KeyStrategy::LessonId, cache.clone());
        assert!(player.is_complete(&LessonKey::from("b")));
        assert!(player.is_complete(&LessonKey::from("d")));
        assert!(!player.is_complete(&LessonKey::from("0-0-1")));

        let stored = cache.get("course_progress_7_42").unwrap().unwrap();
        assert!(stored.contains("\"b\"") && stored.contains("\"d\""));
    }

    #[test]
    fn legacy_cache_is_migrated_before_remote_merge_test() {
        let open = |remote: u8| {
            let cache = Arc::new(MemoryCache::new());
            cache.set("course_progress_7_42", r#"["0-0-1","0-1-0"]"#).unwrap();
            let player = CoursePlayer::open(
                course(),
                &UserContext::student(7),
                Some(remote),
                cache,
                Arc::new(NullSync::default()),
                PlayerOptions::default(),
            )
            .unwrap();
            let done: Vec<String> = player
                .tracker()
                .snapshot()
                .iter()
                .map(|k| k.to_string())
                .collect();
            (done, player.progress_percentage(), player.show_completion_banner())
        };

        // remote agrees with the migrated cache: nothing is added
        assert_eq!(open(50), (vec!["b".to_string(), "c".to_string()], 50, false));
        // remote behind: local wins
        assert_eq!(open(25), (vec!["b".to_string(), "c".to_string()], 50, false));
        // remote ahead: the seeded prefix joins the migrated keys
        assert_eq!(
            open(75),
            (vec!["a".to_string(), "b".to_string(), "c".to_string()], 75, false)
        );
    }

    #[tokio::test]
    async fn load_from_source_test() {
        struct Source;

        #[async_trait]
        impl ContentSource for Source {
            async fn get_course(&self, _course_id: u64) -> ClientResult<Course> {
                Ok(course())
            }

            async fn get_progress(&self, _course_id: u64) -> ClientResult<Option<u8>> {
                Err(crate::client::ClientError::invalid_response("down"))
            }
        }

        let player = CoursePlayer::load(
            &Source,
            42,
            &UserContext::student(7),
            Arc::new(MemoryCache::new()),
            Arc::new(NullSync::default()),
            PlayerOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(player.title(), "Carpentry");
        assert_eq!(player.tracker().total_lessons(), 4);
        assert_eq!(player.progress_percentage(), 0);
    }
}
