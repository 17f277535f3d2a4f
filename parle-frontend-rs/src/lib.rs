mod config;
mod host;
pub mod lesson_player;
pub mod practice;
pub mod progress;
pub mod stats;
mod utils;

pub use config::ParleConfig;
pub use progress::{Progress, ProgressEvent, SnapshotError};

use std::cell::RefCell;
#[cfg(target_arch = "wasm32")]
use std::sync::LazyLock;

use chrono::Utc;
use journal::data_model::{ListenerKey, Store};
use lesson_utils::{Catalog, CatalogError, CefrLevel, GradingMode, GradingResult, LessonCatalogEntry};
use wasm_bindgen::prelude::*;

use crate::host::{JsAudioPlayer, JsSnapshotSink};
use crate::lesson_player::LessonCursor;
use crate::practice::{Answer, PracticeOutcome};
use crate::stats::ProgressSummary;

#[derive(Debug, thiserror::Error)]
pub enum ParleError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error("invalid config: {0}")]
    Config(serde_json::Error),
    #[error("no lesson with id `{0}`")]
    UnknownLesson(String),
    #[error("no phrase with id `{0}`")]
    UnknownPhrase(String),
    #[error("no exercise `{exercise_id}` in lesson `{lesson_id}`")]
    UnknownExercise {
        lesson_id: String,
        exercise_id: String,
    },
    #[error("timestamp {0} is out of range")]
    InvalidTimestamp(f64),
}

impl From<ParleError> for JsValue {
    fn from(error: ParleError) -> Self {
        JsError::new(&error.to_string()).into()
    }
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
pub struct Parle {
    // never hold a borrow of the store while calling back into JS
    store: RefCell<Store<Progress>>,
    catalog: Catalog,
    config: ParleConfig,
}

// putting this inside LOGGER prevents us from accidentally initializing the logger more than once
#[cfg(target_arch = "wasm32")]
#[allow(clippy::declare_interior_mutable_const)]
const LOGGER: LazyLock<()> = LazyLock::new(|| {
    utils::set_panic_hook();

    wasm_logger::init(wasm_logger::Config::default());
    log::info!("Logging initialized");
});

fn init_logging() {
    #[cfg(target_arch = "wasm32")]
    #[allow(clippy::borrow_interior_mutable_const)]
    *LOGGER;
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
impl Parle {
    /// `persist` is called with a snapshot after every call that changed the progress.
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen(constructor))]
    pub fn new(
        catalog_json: &str,
        snapshot: Option<String>,
        config_json: Option<String>,
        persist: Option<js_sys::Function>,
    ) -> Result<Parle, ParleError> {
        init_logging();

        let catalog = Catalog::from_json(catalog_json)?;
        let config = match config_json {
            Some(json) => ParleConfig::from_json(&json).map_err(ParleError::Config)?,
            None => ParleConfig::default(),
        };
        let progress = match snapshot {
            Some(snapshot) => Progress::from_snapshot(&snapshot)?.retain_known(&catalog),
            None => Progress::default(),
        };

        let mut store = Store::new(progress);
        if let Some(persist) = persist {
            store = store.with_sink(JsSnapshotSink { persist });
        }

        log::info!("Parle ready with {} lessons", catalog.len());
        Ok(Self {
            store: RefCell::new(store),
            catalog,
            config,
        })
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn subscribe(&self, callback: js_sys::Function) -> ListenerKey {
        self.store.borrow_mut().register_listener(move |_| {
            let this = JsValue::null();
            let _ = callback.call0(&this);
        })
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn unsubscribe(&self, key: ListenerKey) {
        self.store.borrow_mut().unregister_listener(key)
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn progress(&self) -> Progress {
        Progress::clone(&self.store.borrow().state())
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn statistics(&self) -> ProgressSummary {
        ProgressSummary::compute(
            &self.catalog,
            &self.store.borrow().state(),
            &self.config.bands,
            self.config.recommendation_limit,
        )
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn recommended_lessons(&self, level: Option<CefrLevel>) -> Vec<String> {
        let progress = self.store.borrow().state();
        stats::recommend(
            &self.catalog,
            &progress,
            level,
            self.config.recommendation_limit,
        )
        .into_iter()
        .map(|lesson| lesson.id.clone())
        .collect()
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn lesson(&self, lesson_id: &str) -> Option<LessonCatalogEntry> {
        self.catalog.get(lesson_id).cloned()
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn next_lesson_id(&self, lesson_id: &str) -> Option<String> {
        self.catalog
            .next_lesson(lesson_id)
            .map(|lesson| lesson.id.clone())
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn grade_typed(
        &self,
        phrase_id: &str,
        candidate: &str,
    ) -> Result<PracticeOutcome, ParleError> {
        self.grade(phrase_id, candidate, GradingMode::Character)
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn grade_spoken(
        &self,
        phrase_id: &str,
        transcript: &str,
    ) -> Result<PracticeOutcome, ParleError> {
        self.grade(phrase_id, transcript, GradingMode::WordPositional)
    }

    /// A passed exercise raises the skill its kind trains. Exercises are not phrases, so
    /// nothing is marked as mastered.
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn grade_exercise(
        &self,
        lesson_id: &str,
        exercise_id: &str,
        answer: &str,
    ) -> Result<GradingResult, ParleError> {
        let _flusher = FlushLater::new(self);

        let exercise = self
            .lesson_entry(lesson_id)?
            .exercises
            .iter()
            .find(|exercise| exercise.id == exercise_id)
            .ok_or_else(|| ParleError::UnknownExercise {
                lesson_id: lesson_id.to_string(),
                exercise_id: exercise_id.to_string(),
            })?;

        let result = self.config.thresholds.grade_exercise(exercise, answer);
        if result.passed {
            self.store.borrow_mut().dispatch(
                ProgressEvent::RaisedSkill {
                    skill: exercise.kind.skill(),
                    score: i32::from(result.percent()),
                },
                Utc::now(),
            );
        }
        Ok(result)
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn start_lesson(&self, lesson_id: &str) -> Result<(), ParleError> {
        let _flusher = FlushLater::new(self);
        self.lesson_entry(lesson_id)?;
        self.store.borrow_mut().dispatch(
            ProgressEvent::StartedLesson {
                lesson_id: lesson_id.to_string(),
            },
            Utc::now(),
        );
        Ok(())
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn complete_lesson(&self, lesson_id: &str, score: i32) -> Result<Progress, ParleError> {
        let _flusher = FlushLater::new(self);
        self.lesson_entry(lesson_id)?;
        let progress = self.store.borrow_mut().dispatch(
            ProgressEvent::CompletedLesson {
                lesson_id: lesson_id.to_string(),
                score,
            },
            Utc::now(),
        );
        Ok(Progress::clone(&progress))
    }

    /// Timestamps are milliseconds since the epoch, as `Date.now()` returns them.
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn record_study_session(
        &self,
        started_at_ms: f64,
        ended_at_ms: f64,
    ) -> Result<(), ParleError> {
        let _flusher = FlushLater::new(self);
        let started_at = utils::timestamp_from_millis(started_at_ms)
            .ok_or(ParleError::InvalidTimestamp(started_at_ms))?;
        let ended_at = utils::timestamp_from_millis(ended_at_ms)
            .ok_or(ParleError::InvalidTimestamp(ended_at_ms))?;

        self.store.borrow_mut().dispatch(
            ProgressEvent::StudiedSession {
                started_at,
                ended_at,
            },
            ended_at,
        );
        Ok(())
    }

    /// Speaks phrase `phrase_index` of the lesson through `speak(text, rate)`.
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn play_phrase(
        &self,
        lesson_id: &str,
        phrase_index: usize,
        speak: js_sys::Function,
    ) -> Result<bool, ParleError> {
        let lesson = self.lesson_entry(lesson_id)?;
        let cursor = LessonCursor::at(lesson, phrase_index);
        let mut player = JsAudioPlayer { speak };
        Ok(cursor.play_current(&mut player, &self.config.playback))
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn export_snapshot(&self) -> Result<String, ParleError> {
        Ok(self.store.borrow().state().to_snapshot()?)
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn reset(&self) {
        let _flusher = FlushLater::new(self);
        self.store.borrow_mut().reset();
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn progress_schema() -> String {
        Progress::json_schema().to_string()
    }
}

impl Parle {
    fn lesson_entry(&self, lesson_id: &str) -> Result<&LessonCatalogEntry, ParleError> {
        self.catalog
            .get(lesson_id)
            .ok_or_else(|| ParleError::UnknownLesson(lesson_id.to_string()))
    }

    fn grade(
        &self,
        phrase_id: &str,
        candidate: &str,
        mode: GradingMode,
    ) -> Result<PracticeOutcome, ParleError> {
        let _flusher = FlushLater::new(self);

        let Some((_, phrase)) = self.catalog.phrase(phrase_id) else {
            log::warn!("Asked to grade unknown phrase {phrase_id}");
            return Err(ParleError::UnknownPhrase(phrase_id.to_string()));
        };
        let answer = Answer {
            expected_phrase_id: phrase.id.clone(),
            reference_text: phrase.reference_text.clone(),
            candidate_text: candidate.to_string(),
            mode,
        };

        let (outcome, events) = practice::grade_answer(&answer, &self.config.thresholds);
        let mut store = self.store.borrow_mut();
        for event in events {
            store.dispatch(event, Utc::now());
        }
        Ok(outcome)
    }

    fn flush_notifications(&self) {
        // Collect first, so no borrow is held while the sink and listeners run.
        let notifications = self.store.borrow_mut().drain_due_notifications();
        for notification in notifications {
            notification();
        }
    }
}

/// Persists and notifies listeners when dropped, whichever way the function it lives in
/// returns.
struct FlushLater<'a> {
    parle: &'a Parle,
}

impl<'a> FlushLater<'a> {
    fn new(parle: &'a Parle) -> Self {
        Self { parle }
    }
}

impl Drop for FlushLater<'_> {
    fn drop(&mut self) {
        self.parle.flush_notifications();
    }
}
