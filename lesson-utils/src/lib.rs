pub mod catalog;
pub mod grading;

pub use catalog::{Catalog, CatalogError};

/// CEFR proficiency band. Ordered from `A1` (lowest) to `C2` (highest).
#[derive(
    Clone,
    Debug,
    serde::Serialize,
    serde::Deserialize,
    Hash,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Copy,
    tsify::Tsify,
    schemars::JsonSchema,
)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub enum CefrLevel {
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
}

impl CefrLevel {
    pub const ALL: [CefrLevel; 6] = [
        CefrLevel::A1,
        CefrLevel::A2,
        CefrLevel::B1,
        CefrLevel::B2,
        CefrLevel::C1,
        CefrLevel::C2,
    ];

    /// The band after this one, `None` for `C2`.
    pub fn next(&self) -> Option<CefrLevel> {
        match self {
            CefrLevel::A1 => Some(CefrLevel::A2),
            CefrLevel::A2 => Some(CefrLevel::B1),
            CefrLevel::B1 => Some(CefrLevel::B2),
            CefrLevel::B2 => Some(CefrLevel::C1),
            CefrLevel::C1 => Some(CefrLevel::C2),
            CefrLevel::C2 => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CefrLevel::A1 => "A1",
            CefrLevel::A2 => "A2",
            CefrLevel::B1 => "B1",
            CefrLevel::B2 => "B2",
            CefrLevel::C1 => "C1",
            CefrLevel::C2 => "C2",
        }
    }
}

impl std::fmt::Display for CefrLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One of the four scored skills. The scores live in a [`SkillMap`].
#[derive(
    Clone,
    Copy,
    Debug,
    serde::Serialize,
    serde::Deserialize,
    Hash,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    tsify::Tsify,
    schemars::JsonSchema,
    enumap::EnuMap,
)]
#[serde(rename_all = "camelCase")]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[enumap(derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    serde::Serialize,
    serde::Deserialize,
    schemars::JsonSchema
))]
#[enumap(serde(default))]
#[enumap(schemars(bound = "T: schemars::JsonSchema + Default + serde::Serialize"))]
pub enum Skill {
    Pronunciation,
    Grammar,
    Listening,
    Speaking,
}

impl std::fmt::Display for Skill {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Skill::Pronunciation => write!(f, "pronunciation"),
            Skill::Grammar => write!(f, "grammar"),
            Skill::Listening => write!(f, "listening"),
            Skill::Speaking => write!(f, "speaking"),
        }
    }
}

/// Which similarity algorithm graded an answer. The two are calibrated separately and
/// must not be mixed up: see [`grading::character_similarity`] and
/// [`grading::word_positional_similarity`].
#[derive(
    Clone,
    Copy,
    Debug,
    serde::Serialize,
    serde::Deserialize,
    Hash,
    Eq,
    PartialEq,
    tsify::Tsify,
    schemars::JsonSchema,
)]
#[serde(rename_all = "camelCase")]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub enum GradingMode {
    /// Typed practice: edit distance over characters.
    Character,
    /// Spoken practice: exact word matches by position.
    WordPositional,
}

#[derive(
    Clone, Debug, serde::Serialize, serde::Deserialize, PartialEq, tsify::Tsify, schemars::JsonSchema,
)]
#[serde(rename_all = "camelCase")]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct GradingResult {
    /// Always within [0, 1].
    pub similarity: f64,
    pub passed: bool,
    pub threshold_used: f64,
    pub mode: GradingMode,
}

impl GradingResult {
    /// Similarity as a 0-100 score, the unit skill scores are kept in.
    pub fn percent(&self) -> u8 {
        (self.similarity * 100.0).round().clamp(0.0, 100.0) as u8
    }
}

#[derive(
    Clone, Debug, serde::Serialize, serde::Deserialize, PartialEq, Eq, tsify::Tsify, schemars::JsonSchema,
)]
#[serde(rename_all = "camelCase")]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct Phrase {
    /// Unique across the whole catalog.
    pub id: String,
    /// Exact target-language form, accents and punctuation included.
    pub reference_text: String,
    #[serde(default)]
    pub translation: String,
    #[serde(default)]
    pub pronunciation_hint: String,
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub usage_notes: String,
}

#[derive(
    Clone, Debug, serde::Serialize, serde::Deserialize, PartialEq, Eq, tsify::Tsify, schemars::JsonSchema,
)]
#[serde(rename_all = "camelCase")]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct GrammarPoint {
    pub id: String,
    pub title: String,
    pub explanation: String,
    #[serde(default)]
    pub examples: Vec<String>,
    #[serde(default)]
    pub rules: Vec<String>,
}

#[derive(
    Clone, Debug, serde::Serialize, serde::Deserialize, PartialEq, Eq, tsify::Tsify, schemars::JsonSchema,
)]
#[serde(rename_all = "camelCase")]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct VocabularyItem {
    pub id: String,
    pub word: String,
    pub translation: String,
    pub part_of_speech: String,
    #[serde(default)]
    pub example: String,
}

#[derive(
    Clone,
    Copy,
    Debug,
    serde::Serialize,
    serde::Deserialize,
    Hash,
    Eq,
    PartialEq,
    tsify::Tsify,
    schemars::JsonSchema,
)]
#[serde(rename_all = "lowercase")]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub enum ExerciseKind {
    Pronunciation,
    Translation,
    Listening,
    Speaking,
}

impl ExerciseKind {
    /// The skill a passed exercise of this kind raises.
    pub fn skill(&self) -> Skill {
        match self {
            ExerciseKind::Pronunciation => Skill::Pronunciation,
            ExerciseKind::Translation => Skill::Grammar,
            ExerciseKind::Listening => Skill::Listening,
            ExerciseKind::Speaking => Skill::Speaking,
        }
    }

    pub fn grading_mode(&self) -> GradingMode {
        match self {
            ExerciseKind::Speaking => GradingMode::WordPositional,
            ExerciseKind::Pronunciation | ExerciseKind::Translation | ExerciseKind::Listening => {
                GradingMode::Character
            }
        }
    }
}

#[derive(
    Clone, Debug, serde::Serialize, serde::Deserialize, PartialEq, Eq, tsify::Tsify, schemars::JsonSchema,
)]
#[serde(rename_all = "camelCase")]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct Exercise {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ExerciseKind,
    pub question: String,
    pub correct_answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

/// One lesson of the read-only catalog.
#[derive(
    Clone, Debug, serde::Serialize, serde::Deserialize, PartialEq, Eq, tsify::Tsify, schemars::JsonSchema,
)]
#[serde(rename_all = "camelCase")]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct LessonCatalogEntry {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub level: CefrLevel,
    pub category: String,
    /// 1-10, independent of `level`.
    pub difficulty: u8,
    pub duration_minutes: u32,
    /// Playback order.
    pub phrases: Vec<Phrase>,
    #[serde(default)]
    pub grammar_points: Vec<GrammarPoint>,
    #[serde(default)]
    pub vocabulary: Vec<VocabularyItem>,
    #[serde(default)]
    pub exercises: Vec<Exercise>,
}

/// A contiguous, inclusive difficulty range used for progress reporting.
#[derive(
    Clone, Debug, serde::Serialize, serde::Deserialize, PartialEq, Eq, tsify::Tsify, schemars::JsonSchema,
)]
#[serde(rename_all = "camelCase")]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct DifficultyBand {
    pub label: String,
    pub min_difficulty: u8,
    pub max_difficulty: u8,
}

impl DifficultyBand {
    pub fn new(label: impl Into<String>, min_difficulty: u8, max_difficulty: u8) -> Self {
        Self {
            label: label.into(),
            min_difficulty,
            max_difficulty,
        }
    }

    /// Beginner 1-3, Elementary 4-5, Intermediate 6-7, Advanced 8-10.
    pub fn standard() -> Vec<DifficultyBand> {
        vec![
            DifficultyBand::new("Beginner", 1, 3),
            DifficultyBand::new("Elementary", 4, 5),
            DifficultyBand::new("Intermediate", 6, 7),
            DifficultyBand::new("Advanced", 8, 10),
        ]
    }

    pub fn contains(&self, difficulty: u8) -> bool {
        (self.min_difficulty..=self.max_difficulty).contains(&difficulty)
    }
}
