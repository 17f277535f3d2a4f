use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use journal::data_model::Timestamped;
use lesson_utils::{Catalog, GradingResult, Skill, SkillMap};

/// Skill scores live in 0..=MAX_SCORE.
pub const MAX_SCORE: u8 = 100;

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("malformed progress snapshot: {0}")]
    Json(#[from] serde_json::Error),
}

/// Everything we remember about one learner.
///
/// Never mutated in place by the app: every change is a [`ProgressEvent`] applied through
/// [`journal::AppState::apply_event`], which hands back a new value. The methods below are
/// the same transitions, usable directly when no store is involved.
#[derive(
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    serde::Serialize,
    serde::Deserialize,
    tsify::Tsify,
    schemars::JsonSchema,
)]
#[serde(rename_all = "camelCase", default)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct Progress {
    pub completed_lesson_ids: BTreeSet<String>,
    /// Grows until reset. Mastery is permanent.
    pub mastered_phrase_ids: BTreeSet<String>,
    /// Best score ever reached per skill, never lowered.
    #[serde(flatten)]
    pub skills: SkillMap<u8>,
    pub study_streak_days: u32,
    pub total_study_minutes: u32,
    pub last_study_timestamp: Option<DateTime<Utc>>,
    /// Counts completions, so finishing a lesson twice counts twice.
    pub lessons_completed: u32,
    pub lessons_started: u32,
}

fn clamp_score(score: i32) -> u8 {
    score.clamp(0, MAX_SCORE as i32) as u8
}

impl Progress {
    pub fn skill(&self, skill: Skill) -> u8 {
        *self.skills.get(&skill)
    }

    pub fn has_completed(&self, lesson_id: &str) -> bool {
        self.completed_lesson_ids.contains(lesson_id)
    }

    pub fn has_mastered(&self, phrase_id: &str) -> bool {
        self.mastered_phrase_ids.contains(phrase_id)
    }

    /// A passed answer masters the phrase and lifts `skill` to the answer's score. A failed
    /// one changes nothing.
    #[must_use]
    pub fn record_grading(mut self, phrase_id: &str, result: &GradingResult, skill: Skill) -> Self {
        if !result.passed {
            return self;
        }
        if self.mastered_phrase_ids.insert(phrase_id.to_string()) {
            log::debug!("Mastered phrase {phrase_id}");
        }
        self.raise(skill, result.percent());
        self
    }

    #[must_use]
    pub fn complete_lesson(mut self, lesson_id: &str, score: i32, now: DateTime<Utc>) -> Self {
        self.completed_lesson_ids.insert(lesson_id.to_string());
        let score = clamp_score(score);
        for skill in Skill::ALL {
            self.raise(skill, score);
        }
        self.lessons_completed = self.lessons_completed.saturating_add(1);
        self.note_study(now);
        self
    }

    #[must_use]
    pub fn raise_skill(mut self, skill: Skill, score: i32) -> Self {
        self.raise(skill, clamp_score(score));
        self
    }

    #[must_use]
    pub fn start_lesson(mut self, lesson_id: &str) -> Self {
        log::debug!("Started lesson {lesson_id}");
        self.lessons_started = self.lessons_started.saturating_add(1);
        self
    }

    /// Adds the session's length, rounded to whole minutes. A session that ends before it
    /// starts adds nothing but still counts as studying on `ended_at`.
    #[must_use]
    pub fn record_study_session(
        mut self,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
    ) -> Self {
        let millis = (ended_at - started_at).num_milliseconds().max(0);
        let minutes = (millis as f64 / 60_000.0).round() as u32;
        self.total_study_minutes = self.total_study_minutes.saturating_add(minutes);
        self.note_study(ended_at);
        self
    }

    fn raise(&mut self, skill: Skill, score: u8) {
        let current = self.skills.get_mut(&skill);
        *current = (*current).max(score.min(MAX_SCORE));
    }

    /// Streaks count consecutive UTC calendar days with some study.
    fn note_study(&mut self, at: DateTime<Utc>) {
        let Some(last) = self.last_study_timestamp else {
            self.study_streak_days = 1;
            self.last_study_timestamp = Some(at);
            return;
        };

        let days = (at.date_naive() - last.date_naive()).num_days();
        if days < 0 {
            log::debug!("Ignoring study at {at} for the streak, last study was {last}");
            return;
        }

        self.study_streak_days = match days {
            0 => self.study_streak_days.max(1),
            1 => self.study_streak_days.saturating_add(1),
            _ => 1,
        };
        self.last_study_timestamp = Some(last.max(at));
    }

    /// Drops ids the catalog doesn't know about, e.g. after lessons were removed.
    #[must_use]
    pub fn retain_known(mut self, catalog: &Catalog) -> Self {
        let lessons_before = self.completed_lesson_ids.len();
        let phrases_before = self.mastered_phrase_ids.len();

        self.completed_lesson_ids
            .retain(|id| catalog.contains_lesson(id));
        self.mastered_phrase_ids
            .retain(|id| catalog.contains_phrase(id));

        let dropped = lessons_before - self.completed_lesson_ids.len() + phrases_before
            - self.mastered_phrase_ids.len();
        if dropped > 0 {
            log::warn!("Dropped {dropped} lesson/phrase ids missing from the catalog");
        }
        self
    }

    pub fn to_snapshot(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Restores a snapshot written by [`Progress::to_snapshot`]. Missing fields take their
    /// defaults. Skill scores are rounded and clamped into 0..=MAX_SCORE, whatever number
    /// the snapshot holds.
    pub fn from_snapshot(json: &str) -> Result<Self, SnapshotError> {
        let mut value = serde_json::from_str::<serde_json::Value>(json)
            .inspect_err(|e| log::error!("Error parsing progress snapshot: {e}"))?;
        if let Some(fields) = value.as_object_mut() {
            for skill in Skill::ALL {
                if let Some(score) = fields.get_mut(&skill.to_string())
                    && let Some(number) = score.as_f64()
                {
                    let clamped = number.round().clamp(0.0, f64::from(MAX_SCORE)) as u8;
                    *score = serde_json::Value::from(clamped);
                }
            }
        }
        let progress = serde_json::from_value::<Progress>(value)
            .inspect_err(|e| log::error!("Error parsing progress snapshot: {e}"))?;
        Ok(progress)
    }

    /// JSON schema of the snapshot format.
    pub fn json_schema() -> serde_json::Value {
        schemars::schema_for!(Progress).to_value()
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(tag = "type")]
pub enum ProgressEvent {
    #[serde(rename_all = "camelCase")]
    GradedAnswer {
        phrase_id: String,
        result: GradingResult,
        skill: Skill,
    },
    /// Completed at the event's timestamp.
    #[serde(rename_all = "camelCase")]
    CompletedLesson { lesson_id: String, score: i32 },
    RaisedSkill { skill: Skill, score: i32 },
    #[serde(rename_all = "camelCase")]
    StartedLesson { lesson_id: String },
    #[serde(rename_all = "camelCase")]
    StudiedSession {
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
    },
    Reset,
}

impl journal::PartialAppState for Progress {
    type Event = ProgressEvent;
    type Partial = Self;

    fn process_event(progress: Self, event: &Timestamped<ProgressEvent>) -> Self {
        match &event.event {
            ProgressEvent::GradedAnswer {
                phrase_id,
                result,
                skill,
            } => progress.record_grading(phrase_id, result, *skill),
            ProgressEvent::CompletedLesson { lesson_id, score } => {
                progress.complete_lesson(lesson_id, *score, event.timestamp)
            }
            ProgressEvent::RaisedSkill { skill, score } => progress.raise_skill(*skill, *score),
            ProgressEvent::StartedLesson { lesson_id } => progress.start_lesson(lesson_id),
            ProgressEvent::StudiedSession {
                started_at,
                ended_at,
            } => progress.record_study_session(*started_at, *ended_at),
            ProgressEvent::Reset => Progress::default(),
        }
    }

    fn finalize(partial: Self) -> Self {
        partial
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use journal::AppState as _;
    use journal::data_model::Store;
    use lesson_utils::GradingMode;
    use lesson_utils::grading::GradingThresholds;

    use super::*;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
    }

    fn passed(similarity: f64) -> GradingResult {
        GradingResult {
            similarity,
            passed: true,
            threshold_used: 0.7,
            mode: GradingMode::Character,
        }
    }

    fn failed(similarity: f64) -> GradingResult {
        GradingResult {
            passed: false,
            ..passed(similarity)
        }
    }

    fn stamped(event: ProgressEvent, timestamp: DateTime<Utc>) -> Timestamped<ProgressEvent> {
        Timestamped {
            timestamp,
            index: 0,
            event,
        }
    }

    #[test]
    fn test_default_is_all_zero() {
        let progress = Progress::default();
        assert!(progress.completed_lesson_ids.is_empty());
        assert!(progress.mastered_phrase_ids.is_empty());
        assert!(progress.skills.values().all(|score| *score == 0));
        assert_eq!(progress.study_streak_days, 0);
        assert_eq!(progress.total_study_minutes, 0);
        assert_eq!(progress.last_study_timestamp, None);
    }

    #[test]
    fn test_typed_answer_masters_phrase() {
        let result = GradingThresholds::default().grade("Bonjour", "bonjour ", GradingMode::Character);
        assert_eq!(result.similarity, 1.0);
        assert!(result.passed);

        let progress = Progress::default().record_grading("p1", &result, Skill::Pronunciation);
        assert_eq!(
            progress.mastered_phrase_ids,
            BTreeSet::from(["p1".to_string()])
        );
        assert_eq!(progress.skill(Skill::Pronunciation), 100);
        assert_eq!(progress.skill(Skill::Grammar), 0);
    }

    #[test]
    fn test_record_grading_is_idempotent() {
        let once = Progress::default().record_grading("p1", &passed(0.9), Skill::Speaking);
        let twice = once
            .clone()
            .record_grading("p1", &passed(0.9), Skill::Speaking);
        assert_eq!(once.mastered_phrase_ids.len(), twice.mastered_phrase_ids.len());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_failed_grading_changes_nothing() {
        let progress = Progress::default()
            .raise_skill(Skill::Speaking, 40)
            .record_grading("p1", &failed(0.95), Skill::Speaking);
        assert!(!progress.has_mastered("p1"));
        assert_eq!(progress.skill(Skill::Speaking), 40);
    }

    #[test]
    fn test_scores_never_decrease() {
        let steps: Vec<Box<dyn Fn(Progress) -> Progress>> = vec![
            Box::new(|p| p.record_grading("a", &passed(0.9), Skill::Grammar)),
            Box::new(|p| p.record_grading("b", &passed(0.72), Skill::Grammar)),
            Box::new(|p| p.complete_lesson("lesson-1", 50, at(1, 10))),
            Box::new(|p| p.record_grading("c", &failed(0.1), Skill::Listening)),
            Box::new(|p| p.complete_lesson("lesson-2", 95, at(1, 11))),
            Box::new(|p| p.raise_skill(Skill::Speaking, 10)),
            Box::new(|p| p.complete_lesson("lesson-3", -20, at(2, 11))),
        ];

        let mut progress = Progress::default();
        for step in steps {
            let next = step(progress.clone());
            for skill in Skill::ALL {
                assert!(next.skill(skill) >= progress.skill(skill), "{skill} went down");
            }
            progress = next;
        }
        assert_eq!(progress.skill(Skill::Grammar), 95);
    }

    #[test]
    fn test_complete_lesson_twice() {
        let progress = Progress::default()
            .complete_lesson("lesson-1", 85, at(1, 9))
            .complete_lesson("lesson-1", 85, at(1, 18));

        assert_eq!(progress.completed_lesson_ids.len(), 1);
        assert!(progress.has_completed("lesson-1"));
        for skill in Skill::ALL {
            assert!(progress.skill(skill) >= 85);
        }
        assert_eq!(progress.lessons_completed, 2);
        assert_eq!(progress.study_streak_days, 1);
        assert_eq!(progress.last_study_timestamp, Some(at(1, 18)));
    }

    #[test]
    fn test_scores_are_clamped() {
        let progress = Progress::default()
            .complete_lesson("lesson-1", 150, at(1, 9))
            .raise_skill(Skill::Listening, 1000);
        assert!(progress.skills.values().all(|score| *score == 100));

        let progress = Progress::default().raise_skill(Skill::Grammar, -5);
        assert_eq!(progress.skill(Skill::Grammar), 0);
    }

    #[test]
    fn test_streak_counts_consecutive_days() {
        let progress = Progress::default().complete_lesson("a", 10, at(1, 23));
        assert_eq!(progress.study_streak_days, 1);

        // Next calendar day, even though less than 24h later.
        let progress = progress.complete_lesson("b", 10, at(2, 1));
        assert_eq!(progress.study_streak_days, 2);

        let progress = progress.complete_lesson("c", 10, at(2, 20));
        assert_eq!(progress.study_streak_days, 2);

        let progress = progress.complete_lesson("d", 10, at(3, 8));
        assert_eq!(progress.study_streak_days, 3);

        let progress = progress.complete_lesson("e", 10, at(5, 8));
        assert_eq!(progress.study_streak_days, 1);
    }

    #[test]
    fn test_earlier_study_does_not_break_streak() {
        let progress = Progress::default()
            .complete_lesson("a", 10, at(4, 9))
            .complete_lesson("b", 10, at(5, 9))
            .complete_lesson("c", 10, at(1, 9));
        assert_eq!(progress.study_streak_days, 2);
        assert_eq!(progress.last_study_timestamp, Some(at(5, 9)));
        assert_eq!(progress.completed_lesson_ids.len(), 3);
    }

    #[test]
    fn test_study_session_minutes() {
        let start = at(1, 9);
        let progress = Progress::default()
            .record_study_session(start, start + Duration::seconds(90))
            .record_study_session(start, start + Duration::minutes(58));
        assert_eq!(progress.total_study_minutes, 60);
        assert_eq!(progress.study_streak_days, 1);

        let progress = progress.record_study_session(start, start - Duration::minutes(10));
        assert_eq!(progress.total_study_minutes, 60);
    }

    #[test]
    fn test_start_lesson_counts() {
        let progress = Progress::default().start_lesson("a").start_lesson("a");
        assert_eq!(progress.lessons_started, 2);
        assert!(progress.completed_lesson_ids.is_empty());
    }

    #[test]
    fn test_events_drive_progress_through_store() {
        let mut store = Store::new(Progress::default());
        store.dispatch(
            ProgressEvent::StartedLesson {
                lesson_id: "lesson-1".to_string(),
            },
            at(1, 9),
        );
        store.dispatch(
            ProgressEvent::GradedAnswer {
                phrase_id: "p1".to_string(),
                result: passed(0.8),
                skill: Skill::Pronunciation,
            },
            at(1, 9),
        );
        let state = store.dispatch(
            ProgressEvent::CompletedLesson {
                lesson_id: "lesson-1".to_string(),
                score: 70,
            },
            at(1, 10),
        );

        assert_eq!(state.lessons_started, 1);
        assert_eq!(state.skill(Skill::Pronunciation), 80);
        assert_eq!(state.skill(Skill::Listening), 70);
        assert_eq!(state.last_study_timestamp, Some(at(1, 10)));

        assert_eq!(store.version(), 3);

        let state = store.dispatch(ProgressEvent::Reset, at(1, 11));
        assert_eq!(*state, Progress::default());
    }

    #[test]
    fn test_apply_single_event() {
        let progress = Progress::default().apply_event(&stamped(
            ProgressEvent::StudiedSession {
                started_at: at(1, 9),
                ended_at: at(1, 10),
            },
            at(1, 10),
        ));
        assert_eq!(progress.total_study_minutes, 60);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let progress = Progress::default()
            .record_grading("p1", &passed(0.75), Skill::Pronunciation)
            .complete_lesson("lesson-1", 60, at(3, 12))
            .record_study_session(at(3, 12), at(3, 13));

        let snapshot = progress.to_snapshot().unwrap();
        let value: serde_json::Value = serde_json::from_str(&snapshot).unwrap();
        assert_eq!(value["pronunciation"], 75);
        assert_eq!(value["completedLessonIds"][0], "lesson-1");
        assert_eq!(value["totalStudyMinutes"], 60);

        assert_eq!(Progress::from_snapshot(&snapshot).unwrap(), progress);
    }

    #[test]
    fn test_snapshot_restore_clamps_and_defaults() {
        let progress =
            Progress::from_snapshot(r#"{"pronunciation": 200, "masteredPhraseIds": ["p1"]}"#)
                .unwrap();
        assert_eq!(progress.skill(Skill::Pronunciation), 100);
        assert!(progress.has_mastered("p1"));
        assert_eq!(progress.lessons_completed, 0);

        let progress = Progress::from_snapshot(
            r#"{"pronunciation": 300, "grammar": -5, "listening": 72.5, "speaking": 40}"#,
        )
        .unwrap();
        assert_eq!(progress.skill(Skill::Pronunciation), 100);
        assert_eq!(progress.skill(Skill::Grammar), 0);
        assert_eq!(progress.skill(Skill::Listening), 73);
        assert_eq!(progress.skill(Skill::Speaking), 40);

        assert!(matches!(
            Progress::from_snapshot(r#"{"speaking": "high"}"#),
            Err(SnapshotError::Json(_))
        ));
        assert!(matches!(
            Progress::from_snapshot("[1, 2"),
            Err(SnapshotError::Json(_))
        ));
    }

    #[test]
    fn test_json_schema_names_snapshot_fields() {
        let schema = Progress::json_schema();
        let text = schema.to_string();
        assert!(text.contains("masteredPhraseIds"));
        assert!(text.contains("studyStreakDays"));
        assert!(text.contains("speaking"));
    }

    #[test]
    fn test_retain_known() {
        let catalog = Catalog::from_json(
            r#"[{
                "id": "lesson-1",
                "level": "A1",
                "category": "Greetings",
                "difficulty": 1,
                "durationMinutes": 10,
                "phrases": [{ "id": "p1", "referenceText": "Bonjour" }]
            }]"#,
        )
        .unwrap();

        let progress = Progress::default()
            .record_grading("p1", &passed(1.0), Skill::Pronunciation)
            .record_grading("gone", &passed(1.0), Skill::Pronunciation)
            .complete_lesson("lesson-1", 10, at(1, 9))
            .complete_lesson("lesson-9", 10, at(1, 9))
            .retain_known(&catalog);

        assert_eq!(progress.completed_lesson_ids.len(), 1);
        assert_eq!(progress.mastered_phrase_ids.len(), 1);
        assert!(progress.has_mastered("p1"));
    }
}
