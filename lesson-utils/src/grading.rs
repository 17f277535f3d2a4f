//! Answer grading
//!
//! Two distinct similarity measures, each calibrated with its own thresholds:
//! - [`character_similarity`]: edit distance over characters, for typed answers.
//! - [`word_positional_similarity`]: word `i` compared only to word `i`, for spoken answers.
//!
//! Both normalize by trimming and lowercasing only. Accents are significant, so "café" and
//! "cafe" differ.

use crate::{Exercise, GradingMode, GradingResult};

/// Pass mark for typed practice.
pub const TYPED_PASS_THRESHOLD: f64 = 0.7;
/// Spoken answers at or above this mark the phrase as mastered.
pub const SPOKEN_EXCELLENT_THRESHOLD: f64 = 0.8;
/// Spoken answers at or above this still raise the speaking score.
pub const SPOKEN_GOOD_THRESHOLD: f64 = 0.6;

#[derive(
    Clone,
    Copy,
    Debug,
    serde::Serialize,
    serde::Deserialize,
    PartialEq,
    tsify::Tsify,
    schemars::JsonSchema,
)]
#[serde(rename_all = "camelCase", default)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct GradingThresholds {
    pub typed_pass: f64,
    pub spoken_excellent: f64,
    pub spoken_good: f64,
}

impl Default for GradingThresholds {
    fn default() -> Self {
        Self {
            typed_pass: TYPED_PASS_THRESHOLD,
            spoken_excellent: SPOKEN_EXCELLENT_THRESHOLD,
            spoken_good: SPOKEN_GOOD_THRESHOLD,
        }
    }
}

impl GradingThresholds {
    /// The threshold a `passed` verdict is measured against in `mode`.
    pub fn pass_threshold(&self, mode: GradingMode) -> f64 {
        match mode {
            GradingMode::Character => self.typed_pass,
            GradingMode::WordPositional => self.spoken_excellent,
        }
    }

    pub fn grade(&self, reference: &str, candidate: &str, mode: GradingMode) -> GradingResult {
        grade(reference, candidate, mode, self.pass_threshold(mode))
    }

    pub fn grade_exercise(&self, exercise: &Exercise, candidate: &str) -> GradingResult {
        self.grade(
            &exercise.correct_answer,
            candidate,
            exercise.kind.grading_mode(),
        )
    }
}

/// Feedback tiers of spoken practice.
#[derive(
    Clone,
    Copy,
    Debug,
    serde::Serialize,
    serde::Deserialize,
    PartialEq,
    Eq,
    tsify::Tsify,
    schemars::JsonSchema,
)]
#[serde(rename_all = "camelCase")]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub enum SpokenFeedback {
    /// Phrase is mastered and the speaking score is raised.
    Excellent,
    /// Speaking score is raised, phrase is not mastered yet.
    Good,
    TryAgain,
}

impl SpokenFeedback {
    /// Tiers on the raw similarity, the same number the `passed` verdict uses, so an
    /// `Excellent` answer is always a passed one.
    pub fn from_similarity(similarity: f64, thresholds: &GradingThresholds) -> Self {
        if passes(similarity, thresholds.spoken_excellent) {
            SpokenFeedback::Excellent
        } else if passes(similarity, thresholds.spoken_good) {
            SpokenFeedback::Good
        } else {
            SpokenFeedback::TryAgain
        }
    }

    /// Whether this tier should count toward the speaking score.
    pub fn raises_score(&self) -> bool {
        matches!(self, SpokenFeedback::Excellent | SpokenFeedback::Good)
    }
}

/// Trim surrounding whitespace and fold to lowercase. Nothing else is touched.
pub fn normalize_answer(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Inclusive comparison: a similarity exactly at the threshold passes.
pub fn passes(similarity: f64, threshold: f64) -> bool {
    similarity >= threshold
}

/// Calculate Levenshtein distance between two strings
///
/// Counts single-character insertions, deletions and substitutions over Unicode scalar
/// values. Transpositions cost two.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    // Only the previous row of the matrix is needed at any time.
    let mut previous: Vec<usize> = (0..=b_chars.len()).collect();
    let mut current = vec![0; b_chars.len() + 1];

    for (i, a_char) in a_chars.iter().enumerate() {
        current[0] = i + 1;
        for (j, b_char) in b_chars.iter().enumerate() {
            let cost = usize::from(a_char != b_char);
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b_chars.len()]
}

/// `(len(longer) - distance) / len(longer)` over the normalized strings, in [0, 1].
///
/// Lengths are in characters. When both strings have the same length the reference is
/// taken as the longer one. Two empty answers are a perfect match.
pub fn character_similarity(reference: &str, candidate: &str) -> f64 {
    let reference = normalize_answer(reference);
    let candidate = normalize_answer(candidate);

    let reference_len = reference.chars().count();
    let candidate_len = candidate.chars().count();
    let (longer, shorter, longer_len) = if candidate_len > reference_len {
        (&candidate, &reference, candidate_len)
    } else {
        (&reference, &candidate, reference_len)
    };

    if longer_len == 0 {
        return 1.0;
    }

    let distance = levenshtein_distance(longer, shorter);
    (longer_len.saturating_sub(distance) as f64 / longer_len as f64).clamp(0.0, 1.0)
}

/// Share of word positions where the candidate says exactly the reference word.
///
/// Position `i` of the candidate is compared only with position `i` of the reference; there
/// is no alignment search, so a dropped word shifts everything after it. The denominator is
/// the longer of the two word counts. Two empty answers are a perfect match.
pub fn word_positional_similarity(reference: &str, candidate: &str) -> f64 {
    let reference = normalize_answer(reference);
    let candidate = normalize_answer(candidate);

    let reference_words: Vec<&str> = reference.split_whitespace().collect();
    let candidate_words: Vec<&str> = candidate.split_whitespace().collect();

    let total = reference_words.len().max(candidate_words.len());
    if total == 0 {
        return 1.0;
    }

    let equal = candidate_words
        .iter()
        .zip(reference_words.iter())
        .filter(|(heard, expected)| heard == expected)
        .count();

    equal as f64 / total as f64
}

/// Closeness of a typed answer. Same as [`character_similarity`].
pub fn score(reference: &str, candidate: &str) -> f64 {
    character_similarity(reference, candidate)
}

pub fn similarity(reference: &str, candidate: &str, mode: GradingMode) -> f64 {
    match mode {
        GradingMode::Character => character_similarity(reference, candidate),
        GradingMode::WordPositional => word_positional_similarity(reference, candidate),
    }
}

pub fn grade(reference: &str, candidate: &str, mode: GradingMode, threshold: f64) -> GradingResult {
    let similarity = similarity(reference, candidate, mode);
    GradingResult {
        similarity,
        passed: passes(similarity, threshold),
        threshold_used: threshold,
        mode,
    }
}
