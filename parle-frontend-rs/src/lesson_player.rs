use lesson_utils::{LessonCatalogEntry, Phrase};

pub const DEFAULT_SPEECH_RATE: f64 = 0.8;

/// Speech synthesis, provided by the host.
pub trait AudioPlayer {
    /// Say `text` in the target language. `rate` is relative to normal speed.
    fn speak(&mut self, text: &str, rate: f64);
}

#[derive(
    Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize, tsify::Tsify,
)]
#[serde(rename_all = "camelCase", default)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct PlaybackSettings {
    /// Slightly slower than normal by default, learners are still listening closely.
    pub speech_rate: f64,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            speech_rate: DEFAULT_SPEECH_RATE,
        }
    }
}

/// Walks the phrases of one lesson in playback order. Moving past either end stays put.
#[derive(Clone, Debug)]
pub struct LessonCursor<'a> {
    lesson: &'a LessonCatalogEntry,
    index: usize,
}

impl<'a> LessonCursor<'a> {
    pub fn new(lesson: &'a LessonCatalogEntry) -> Self {
        Self { lesson, index: 0 }
    }

    /// A cursor on phrase `index`, or on the last phrase if `index` is past the end.
    pub fn at(lesson: &'a LessonCatalogEntry, index: usize) -> Self {
        let mut cursor = Self::new(lesson);
        cursor.index = index.min(cursor.last_index());
        cursor
    }

    pub fn lesson(&self) -> &'a LessonCatalogEntry {
        self.lesson
    }

    pub fn index(&self) -> usize {
        self.index
    }

    fn last_index(&self) -> usize {
        self.lesson.phrases.len().saturating_sub(1)
    }

    /// `None` only for a lesson without phrases.
    pub fn current(&self) -> Option<&'a Phrase> {
        self.lesson.phrases.get(self.index)
    }

    pub fn is_first(&self) -> bool {
        self.index == 0
    }

    pub fn is_last(&self) -> bool {
        self.index >= self.last_index()
    }

    pub fn next(&mut self) -> Option<&'a Phrase> {
        self.index = (self.index + 1).min(self.last_index());
        self.current()
    }

    pub fn previous(&mut self) -> Option<&'a Phrase> {
        self.index = self.index.saturating_sub(1);
        self.current()
    }

    /// How far through the lesson the cursor is, counting the current phrase as seen.
    pub fn percent_through(&self) -> u8 {
        crate::stats::percentage(self.index + 1, self.lesson.phrases.len())
    }

    /// Speaks the current phrase. Returns false if there was nothing to say.
    pub fn play_current(&self, player: &mut impl AudioPlayer, settings: &PlaybackSettings) -> bool {
        match self.current() {
            Some(phrase) => {
                player.speak(&phrase.reference_text, settings.speech_rate);
                true
            }
            None => {
                log::warn!("Lesson {} has no phrases to play", self.lesson.id);
                false
            }
        }
    }
}
