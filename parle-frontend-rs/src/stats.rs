//! Read-only views derived from the catalog and a [`Progress`] value.
//!
//! Nothing here is stored: achievements, band completion and recommendations are
//! recomputed on every query, so they can never disagree with the progress they came from.

use lesson_utils::{Catalog, CefrLevel, DifficultyBand, LessonCatalogEntry, Skill};

use crate::progress::Progress;

/// How many lessons are recommended when the host doesn't ask for a number.
pub const RECOMMENDATION_LIMIT: usize = 3;

/// `round(100 * part / total)`, or 0 when there is nothing to count.
pub fn percentage(part: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    (100.0 * part as f64 / total as f64).round().clamp(0.0, 100.0) as u8
}

/// Incomplete lessons in catalog order, at most `max` of them. With `level` set only lessons
/// of that level are considered.
pub fn recommend<'a>(
    catalog: &'a Catalog,
    progress: &Progress,
    level: Option<CefrLevel>,
    max: usize,
) -> Vec<&'a LessonCatalogEntry> {
    catalog
        .lessons()
        .filter(|lesson| level.is_none_or(|level| lesson.level == level))
        .filter(|lesson| !progress.has_completed(&lesson.id))
        .take(max)
        .collect()
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, PartialEq, Eq, tsify::Tsify)]
#[serde(rename_all = "camelCase")]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct BandProgress {
    pub label: String,
    pub completed: usize,
    pub total: usize,
    pub percentage: u8,
}

pub fn band_progress(
    catalog: &Catalog,
    progress: &Progress,
    bands: &[DifficultyBand],
) -> Vec<BandProgress> {
    bands
        .iter()
        .map(|band| {
            let (completed, total) = count_completed(
                catalog.lessons().filter(|l| band.contains(l.difficulty)),
                progress,
            );
            BandProgress {
                label: band.label.clone(),
                completed,
                total,
                percentage: percentage(completed, total),
            }
        })
        .collect()
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, PartialEq, Eq, tsify::Tsify)]
#[serde(rename_all = "camelCase")]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct LevelProgress {
    pub level: CefrLevel,
    pub completed: usize,
    pub total: usize,
    pub percentage: u8,
}

/// Completion per CEFR level, for every level the catalog has lessons in.
pub fn level_progress(catalog: &Catalog, progress: &Progress) -> Vec<LevelProgress> {
    CefrLevel::ALL
        .into_iter()
        .filter_map(|level| {
            let (completed, total) = count_completed(catalog.by_level(level), progress);
            (total > 0).then(|| LevelProgress {
                level,
                completed,
                total,
                percentage: percentage(completed, total),
            })
        })
        .collect()
}

/// The lowest level that still has something left to do.
pub fn suggested_level(catalog: &Catalog, progress: &Progress) -> Option<CefrLevel> {
    catalog
        .lessons()
        .filter(|lesson| !progress.has_completed(&lesson.id))
        .map(|lesson| lesson.level)
        .min()
}

fn count_completed<'a>(
    lessons: impl Iterator<Item = &'a LessonCatalogEntry>,
    progress: &Progress,
) -> (usize, usize) {
    lessons.fold((0, 0), |(completed, total), lesson| {
        let done = usize::from(progress.has_completed(&lesson.id));
        (completed + done, total + 1)
    })
}

pub fn average_skill_score(progress: &Progress) -> u8 {
    let sum: u32 = progress.skills.values().map(|score| u32::from(*score)).sum();
    (sum as f64 / Skill::ALL.len() as f64).round() as u8
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, PartialEq, Eq, tsify::Tsify)]
#[serde(rename_all = "camelCase")]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct VocabularyStats {
    pub mastered: usize,
    /// Every phrase of every lesson.
    pub total: usize,
    pub percentage: u8,
}

pub fn vocabulary_stats(catalog: &Catalog, progress: &Progress) -> VocabularyStats {
    let mastered = progress.mastered_phrase_ids.len();
    let total = catalog.total_phrase_count();
    VocabularyStats {
        mastered,
        total,
        percentage: percentage(mastered, total),
    }
}

#[derive(
    Clone,
    Copy,
    Debug,
    serde::Serialize,
    serde::Deserialize,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    tsify::Tsify,
)]
#[serde(rename_all = "kebab-case")]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub enum AchievementId {
    FirstHour,
    LessonMaster,
    HighAchiever,
    WeekWarrior,
}

impl AchievementId {
    pub const ALL: [AchievementId; 4] = [
        AchievementId::FirstHour,
        AchievementId::LessonMaster,
        AchievementId::HighAchiever,
        AchievementId::WeekWarrior,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            AchievementId::FirstHour => "First Hour",
            AchievementId::LessonMaster => "Lesson Master",
            AchievementId::HighAchiever => "High Achiever",
            AchievementId::WeekWarrior => "Week Warrior",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            AchievementId::FirstHour => "Studied for 1 hour",
            AchievementId::LessonMaster => "Completed 5 lessons",
            AchievementId::HighAchiever => "Achieved 80% average score",
            AchievementId::WeekWarrior => "7-day study streak",
        }
    }

    pub fn is_unlocked(&self, progress: &Progress) -> bool {
        match self {
            AchievementId::FirstHour => progress.total_study_minutes >= 60,
            AchievementId::LessonMaster => progress.completed_lesson_ids.len() >= 5,
            AchievementId::HighAchiever => average_skill_score(progress) >= 80,
            AchievementId::WeekWarrior => progress.study_streak_days >= 7,
        }
    }
}

#[derive(Clone, Debug, serde::Serialize, PartialEq, Eq, tsify::Tsify)]
#[serde(rename_all = "camelCase")]
#[tsify(into_wasm_abi)]
pub struct Achievement {
    pub id: AchievementId,
    pub title: String,
    pub description: String,
}

impl From<AchievementId> for Achievement {
    fn from(id: AchievementId) -> Self {
        Self {
            id,
            title: id.title().to_string(),
            description: id.description().to_string(),
        }
    }
}

/// Unlocked achievements, in table order.
pub fn achievements(progress: &Progress) -> Vec<AchievementId> {
    AchievementId::ALL
        .into_iter()
        .filter(|id| id.is_unlocked(progress))
        .collect()
}

/// Everything the progress dashboard shows, computed in one go.
#[derive(Clone, Debug, serde::Serialize, PartialEq, Eq, tsify::Tsify)]
#[serde(rename_all = "camelCase")]
#[tsify(into_wasm_abi)]
pub struct ProgressSummary {
    pub bands: Vec<BandProgress>,
    pub levels: Vec<LevelProgress>,
    pub average_skill_score: u8,
    pub vocabulary: VocabularyStats,
    pub achievements: Vec<Achievement>,
    pub recommended_lesson_ids: Vec<String>,
    pub suggested_level: Option<CefrLevel>,
    pub study_streak_days: u32,
    pub total_study_minutes: u32,
}

impl ProgressSummary {
    pub fn compute(
        catalog: &Catalog,
        progress: &Progress,
        bands: &[DifficultyBand],
        recommendation_limit: usize,
    ) -> Self {
        let suggested_level = suggested_level(catalog, progress);
        Self {
            bands: band_progress(catalog, progress, bands),
            levels: level_progress(catalog, progress),
            average_skill_score: average_skill_score(progress),
            vocabulary: vocabulary_stats(catalog, progress),
            achievements: achievements(progress)
                .into_iter()
                .map(Achievement::from)
                .collect(),
            recommended_lesson_ids: recommend(
                catalog,
                progress,
                suggested_level,
                recommendation_limit,
            )
            .into_iter()
            .map(|lesson| lesson.id.clone())
            .collect(),
            suggested_level,
            study_streak_days: progress.study_streak_days,
            total_study_minutes: progress.total_study_minutes,
        }
    }
}
