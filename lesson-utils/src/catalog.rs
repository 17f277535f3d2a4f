//! The read-only lesson catalog.
//!
//! Loaded once at startup from the host's JSON, validated, and queried by id, level and
//! category. Catalog order is significant: recommendations and "next lesson" follow it.

use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::{CefrLevel, LessonCatalogEntry, Phrase};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("duplicate lesson id `{0}`")]
    DuplicateLesson(String),
    #[error("phrase id `{phrase_id}` in lesson `{lesson_id}` is already used")]
    DuplicatePhrase { lesson_id: String, phrase_id: String },
    #[error("lesson `{lesson_id}` has difficulty {difficulty}, expected 1-10")]
    DifficultyOutOfRange { lesson_id: String, difficulty: u8 },
    #[error("lesson `{0}` has a duration of zero minutes")]
    ZeroDuration(String),
}

#[derive(Clone, Debug, Default)]
pub struct Catalog {
    lessons: IndexMap<String, LessonCatalogEntry>,
    /// phrase id -> (lesson index, phrase index)
    phrase_locations: FxHashMap<String, (usize, usize)>,
}

impl Catalog {
    pub fn new(lessons: Vec<LessonCatalogEntry>) -> Result<Self, CatalogError> {
        let mut catalog = Catalog::default();

        for lesson in lessons {
            if !(1..=10).contains(&lesson.difficulty) {
                return Err(CatalogError::DifficultyOutOfRange {
                    lesson_id: lesson.id,
                    difficulty: lesson.difficulty,
                });
            }
            if lesson.duration_minutes == 0 {
                return Err(CatalogError::ZeroDuration(lesson.id));
            }
            if catalog.lessons.contains_key(&lesson.id) {
                return Err(CatalogError::DuplicateLesson(lesson.id));
            }

            let lesson_index = catalog.lessons.len();
            for (phrase_index, phrase) in lesson.phrases.iter().enumerate() {
                if catalog
                    .phrase_locations
                    .insert(phrase.id.clone(), (lesson_index, phrase_index))
                    .is_some()
                {
                    return Err(CatalogError::DuplicatePhrase {
                        lesson_id: lesson.id.clone(),
                        phrase_id: phrase.id.clone(),
                    });
                }
            }
            catalog.lessons.insert(lesson.id.clone(), lesson);
        }

        log::info!(
            "Loaded catalog with {} lessons and {} phrases",
            catalog.lessons.len(),
            catalog.phrase_locations.len()
        );
        Ok(catalog)
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let lessons = serde_json::from_str::<Vec<LessonCatalogEntry>>(json)
            .inspect_err(|e| log::error!("Error parsing catalog: {e:?}"))?;
        Self::new(lessons)
    }

    pub fn len(&self) -> usize {
        self.lessons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lessons.is_empty()
    }

    /// All lessons in catalog order.
    pub fn lessons(&self) -> impl Iterator<Item = &LessonCatalogEntry> {
        self.lessons.values()
    }

    pub fn lesson_ids(&self) -> impl Iterator<Item = &str> {
        self.lessons.keys().map(String::as_str)
    }

    pub fn get(&self, lesson_id: &str) -> Option<&LessonCatalogEntry> {
        self.lessons.get(lesson_id)
    }

    pub fn contains_lesson(&self, lesson_id: &str) -> bool {
        self.lessons.contains_key(lesson_id)
    }

    pub fn by_level(&self, level: CefrLevel) -> impl Iterator<Item = &LessonCatalogEntry> {
        self.lessons().filter(move |lesson| lesson.level == level)
    }

    pub fn by_category(&self, category: &str) -> impl Iterator<Item = &LessonCatalogEntry> {
        self.lessons()
            .filter(move |lesson| lesson.category == category)
    }

    /// Distinct categories, in order of first appearance.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen = FxHashSet::default();
        self.lessons()
            .map(|lesson| lesson.category.as_str())
            .filter(|category| seen.insert(*category))
            .collect()
    }

    pub fn next_lesson(&self, lesson_id: &str) -> Option<&LessonCatalogEntry> {
        let index = self.lessons.get_index_of(lesson_id)?;
        self.lessons.get_index(index + 1).map(|(_, lesson)| lesson)
    }

    pub fn previous_lesson(&self, lesson_id: &str) -> Option<&LessonCatalogEntry> {
        let index = self.lessons.get_index_of(lesson_id)?;
        let previous = index.checked_sub(1)?;
        self.lessons.get_index(previous).map(|(_, lesson)| lesson)
    }

    /// The phrase with `phrase_id` and the lesson it belongs to.
    pub fn phrase(&self, phrase_id: &str) -> Option<(&LessonCatalogEntry, &Phrase)> {
        let (lesson_index, phrase_index) = *self.phrase_locations.get(phrase_id)?;
        let (_, lesson) = self.lessons.get_index(lesson_index)?;
        Some((lesson, lesson.phrases.get(phrase_index)?))
    }

    pub fn contains_phrase(&self, phrase_id: &str) -> bool {
        self.phrase_locations.contains_key(phrase_id)
    }

    pub fn phrase_ids(&self) -> impl Iterator<Item = &str> {
        self.lessons()
            .flat_map(|lesson| lesson.phrases.iter().map(|phrase| phrase.id.as_str()))
    }

    /// Number of phrases summed over every lesson.
    pub fn total_phrase_count(&self) -> usize {
        self.lessons().map(|lesson| lesson.phrases.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lesson(
        id: &str,
        level: CefrLevel,
        category: &str,
        difficulty: u8,
    ) -> LessonCatalogEntry {
        LessonCatalogEntry {
            id: id.to_string(),
            title: format!("Lesson {id}"),
            level,
            category: category.to_string(),
            difficulty,
            duration_minutes: 15,
            phrases: vec![
                phrase(&format!("{id}-p1"), "Bonjour"),
                phrase(&format!("{id}-p2"), "Merci beaucoup"),
            ],
            grammar_points: Vec::new(),
            vocabulary: Vec::new(),
            exercises: Vec::new(),
        }
    }

    fn phrase(id: &str, reference_text: &str) -> Phrase {
        Phrase {
            id: id.to_string(),
            reference_text: reference_text.to_string(),
            translation: String::new(),
            pronunciation_hint: String::new(),
            context: String::new(),
            usage_notes: String::new(),
        }
    }

    fn sample() -> Catalog {
        Catalog::new(vec![
            lesson("lesson-1", CefrLevel::A1, "Greetings", 1),
            lesson("lesson-2", CefrLevel::A1, "Directions", 2),
            lesson("lesson-3", CefrLevel::A2, "Greetings", 4),
            lesson("lesson-4", CefrLevel::B1, "Stories", 6),
        ])
        .unwrap()
    }

    #[test]
    fn test_queries_follow_catalog_order() {
        let catalog = sample();
        assert_eq!(catalog.len(), 4);

        let a1: Vec<&str> = catalog
            .by_level(CefrLevel::A1)
            .map(|l| l.id.as_str())
            .collect();
        assert_eq!(a1, vec!["lesson-1", "lesson-2"]);

        let greetings: Vec<&str> = catalog
            .by_category("Greetings")
            .map(|l| l.id.as_str())
            .collect();
        assert_eq!(greetings, vec!["lesson-1", "lesson-3"]);

        assert_eq!(
            catalog.categories(),
            vec!["Greetings", "Directions", "Stories"]
        );
    }

    #[test]
    fn test_next_and_previous_lesson() {
        let catalog = sample();
        assert_eq!(catalog.next_lesson("lesson-1").unwrap().id, "lesson-2");
        assert!(catalog.next_lesson("lesson-4").is_none());
        assert_eq!(catalog.previous_lesson("lesson-2").unwrap().id, "lesson-1");
        assert!(catalog.previous_lesson("lesson-1").is_none());
        assert!(catalog.next_lesson("missing").is_none());
    }

    #[test]
    fn test_phrase_lookup() {
        let catalog = sample();
        let (lesson, phrase) = catalog.phrase("lesson-3-p2").unwrap();
        assert_eq!(lesson.id, "lesson-3");
        assert_eq!(phrase.reference_text, "Merci beaucoup");
        assert!(catalog.contains_phrase("lesson-1-p1"));
        assert!(!catalog.contains_phrase("nope"));
        assert_eq!(catalog.total_phrase_count(), 8);
        assert_eq!(catalog.phrase_ids().count(), 8);
    }

    #[test]
    fn test_rejects_duplicates_and_bad_values() {
        let duplicate = Catalog::new(vec![
            lesson("lesson-1", CefrLevel::A1, "Greetings", 1),
            lesson("lesson-1", CefrLevel::A1, "Greetings", 1),
        ]);
        assert!(matches!(duplicate, Err(CatalogError::DuplicateLesson(id)) if id == "lesson-1"));

        let mut second = lesson("lesson-2", CefrLevel::A1, "Greetings", 1);
        second.phrases[0].id = "lesson-1-p1".to_string();
        let shared_phrase =
            Catalog::new(vec![lesson("lesson-1", CefrLevel::A1, "Greetings", 1), second]);
        assert!(matches!(
            shared_phrase,
            Err(CatalogError::DuplicatePhrase { ref phrase_id, .. }) if phrase_id == "lesson-1-p1"
        ));

        let too_hard = Catalog::new(vec![lesson("lesson-1", CefrLevel::C2, "Stories", 11)]);
        assert!(matches!(
            too_hard,
            Err(CatalogError::DifficultyOutOfRange { difficulty: 11, .. })
        ));

        let mut instant = lesson("lesson-1", CefrLevel::A1, "Greetings", 1);
        instant.duration_minutes = 0;
        assert!(matches!(
            Catalog::new(vec![instant]),
            Err(CatalogError::ZeroDuration(_))
        ));
    }

    #[test]
    fn test_from_json() {
        let json = r#"[
            {
                "id": "lesson-1",
                "title": "Je comprends le français... un peu",
                "category": "I speak French, a little",
                "level": "A1",
                "difficulty": 1,
                "durationMinutes": 15,
                "phrases": [
                    {
                        "id": "phrase-1-1",
                        "referenceText": "Je comprends le français... un peu",
                        "translation": "I understand French... a little"
                    }
                ]
            }
        ]"#;
        let catalog = Catalog::from_json(json).unwrap();
        assert_eq!(catalog.get("lesson-1").unwrap().phrases.len(), 1);

        assert!(matches!(
            Catalog::from_json("{not json"),
            Err(CatalogError::Json(_))
        ));
    }

    #[test]
    fn test_empty_catalog() {
        let catalog = Catalog::new(Vec::new()).unwrap();
        assert!(catalog.is_empty());
        assert_eq!(catalog.total_phrase_count(), 0);
        assert!(catalog.categories().is_empty());
    }
}
