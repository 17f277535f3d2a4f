//! Turning learner answers into progress.
//!
//! Where answers come from (keyboard, speech recognition) is the host's business: it hands
//! them over through an [`AnswerSource`].

use chrono::Utc;
use journal::data_model::Store;
use lesson_utils::grading::{GradingThresholds, SpokenFeedback};
use lesson_utils::{GradingMode, GradingResult, Skill};

use crate::progress::{Progress, ProgressEvent};

#[derive(
    Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize, tsify::Tsify,
)]
#[serde(rename_all = "camelCase")]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct Answer {
    pub expected_phrase_id: String,
    pub reference_text: String,
    /// Typed text or a speech transcript.
    pub candidate_text: String,
    pub mode: GradingMode,
}

pub trait AnswerSource {
    fn next_answer(&mut self) -> Option<Answer>;
}

impl<I> AnswerSource for I
where
    I: Iterator<Item = Answer>,
{
    fn next_answer(&mut self) -> Option<Answer> {
        self.next()
    }
}

#[derive(
    Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize, tsify::Tsify,
)]
#[serde(rename_all = "camelCase")]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct PracticeOutcome {
    pub phrase_id: String,
    pub result: GradingResult,
    /// Only spoken answers get a feedback tier.
    pub feedback: Option<SpokenFeedback>,
}

/// Typed practice trains pronunciation, spoken practice trains speaking.
pub fn practised_skill(mode: GradingMode) -> Skill {
    match mode {
        GradingMode::Character => Skill::Pronunciation,
        GradingMode::WordPositional => Skill::Speaking,
    }
}

/// Grades one answer and lists the events it causes, without touching any state.
pub fn grade_answer(
    answer: &Answer,
    thresholds: &GradingThresholds,
) -> (PracticeOutcome, Vec<ProgressEvent>) {
    let result = thresholds.grade(&answer.reference_text, &answer.candidate_text, answer.mode);
    let skill = practised_skill(answer.mode);

    let feedback = match answer.mode {
        GradingMode::Character => None,
        GradingMode::WordPositional => {
            Some(SpokenFeedback::from_similarity(result.similarity, thresholds))
        }
    };

    let mut events = vec![ProgressEvent::GradedAnswer {
        phrase_id: answer.expected_phrase_id.clone(),
        result: result.clone(),
        skill,
    }];
    // Close enough to count toward the score, not enough to master the phrase.
    if !result.passed && feedback.is_some_and(|f| f.raises_score()) {
        events.push(ProgressEvent::RaisedSkill {
            skill,
            score: i32::from(result.percent()),
        });
    }

    let outcome = PracticeOutcome {
        phrase_id: answer.expected_phrase_id.clone(),
        result,
        feedback,
    };
    (outcome, events)
}

/// Grades every answer `source` yields, in order, dispatching the resulting events to
/// `store`.
pub fn grade_answers(
    source: &mut impl AnswerSource,
    store: &mut Store<Progress>,
    thresholds: &GradingThresholds,
) -> Vec<PracticeOutcome> {
    let mut outcomes = Vec::new();
    while let Some(answer) = source.next_answer() {
        let (outcome, events) = grade_answer(&answer, thresholds);
        log::debug!(
            "Graded {} answer for {}: {:.2} (passed: {})",
            match answer.mode {
                GradingMode::Character => "typed",
                GradingMode::WordPositional => "spoken",
            },
            outcome.phrase_id,
            outcome.result.similarity,
            outcome.result.passed
        );
        for event in events {
            store.dispatch(event, Utc::now());
        }
        outcomes.push(outcome);
    }
    outcomes
}
