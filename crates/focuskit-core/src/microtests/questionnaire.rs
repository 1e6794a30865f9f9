//! Six-item self-report questionnaire on a 0–4 Likert scale.

use std::collections::BTreeMap;

use crate::error::BatteryError;
use crate::model::{Cue, Input, Measurement, Step};

use super::{MicroTest, StepContext};

pub const QUESTIONS: [&str; 6] = [
    "How often do you have trouble wrapping up the final details of a project, once the challenging parts have been done?",
    "How often do you have difficulty getting things in order when you have to do a task that requires organization?",
    "How often do you have problems remembering appointments or obligations?",
    "When you have a task that requires a lot of thought, how often do you avoid or delay getting started?",
    "How often do you fidget or squirm with your hands or feet when you have to sit down for a long time?",
    "How often do you feel overly active and compelled to do things, like you were driven by a motor?",
];

pub const LIKERT_LABELS: [&str; 5] = ["Never", "Rarely", "Sometimes", "Often", "Very often"];

pub const MAX_ANSWER: u8 = 4;

/// Highest possible questionnaire score.
pub const MAX_SCORE: u32 = QUESTIONS.len() as u32 * MAX_ANSWER as u32;

fn validate(question: usize, value: u8) -> Result<(), BatteryError> {
    if question >= QUESTIONS.len() {
        return Err(BatteryError::UnknownQuestion(question));
    }
    if value > MAX_ANSWER {
        return Err(BatteryError::AnswerOutOfRange { question, value });
    }
    Ok(())
}

/// Sum of all answers. Defined only when every question has an answer.
pub fn score(answers: &BTreeMap<usize, u8>) -> Result<u32, BatteryError> {
    for (&question, &value) in answers {
        validate(question, value)?;
    }
    if answers.len() < QUESTIONS.len() {
        return Err(BatteryError::IncompleteAnswers {
            answered: answers.len(),
            total: QUESTIONS.len(),
        });
    }
    Ok(answers.values().map(|&v| v as u32).sum())
}

/// Collects answers and reports the score once the last question is answered.
#[derive(Debug, Default)]
pub struct QuestionnaireStep {
    answers: BTreeMap<usize, u8>,
    finished: bool,
}

impl QuestionnaireStep {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answers(&self) -> &BTreeMap<usize, u8> {
        &self.answers
    }
}

impl MicroTest for QuestionnaireStep {
    fn step(&self) -> Step {
        Step::Questionnaire
    }

    fn start(&mut self, ctx: &mut StepContext<'_>) {
        ctx.cue(Cue::QuestionAnswered {
            answered: 0,
            total: QUESTIONS.len(),
        });
    }

    fn reset(&mut self) {
        self.answers.clear();
        self.finished = false;
    }

    fn on_input(&mut self, input: Input, ctx: &mut StepContext<'_>) {
        let Input::Answer { question, value } = input else {
            return;
        };
        if self.finished {
            tracing::debug!(question, "questionnaire already scored, answer ignored");
            return;
        }
        if let Err(e) = validate(question, value) {
            tracing::warn!("rejected answer: {e}");
            return;
        }

        self.answers.insert(question, value);
        ctx.cue(Cue::QuestionAnswered {
            answered: self.answers.len(),
            total: QUESTIONS.len(),
        });

        if let Ok(total) = score(&self.answers) {
            self.finished = true;
            ctx.complete(Measurement::Questionnaire { score: total });
        }
    }

    fn is_finished(&self) -> bool {
        self.finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::microtests::harness::Harness;

    #[test]
    fn score_sums_complete_answers() {
        let answers: BTreeMap<usize, u8> = (0..6).map(|q| (q, (q % 5) as u8)).collect();
        assert_eq!(score(&answers).unwrap(), 1 + 2 + 3 + 4);
        assert_eq!(MAX_SCORE, 24);
    }

    #[test]
    fn partial_answers_are_not_scored() {
        let answers: BTreeMap<usize, u8> = (0..5).map(|q| (q, 4)).collect();
        assert_eq!(
            score(&answers),
            Err(BatteryError::IncompleteAnswers {
                answered: 5,
                total: 6
            })
        );
    }

    #[test]
    fn invalid_answers_are_rejected() {
        let mut answers: BTreeMap<usize, u8> = (0..6).map(|q| (q, 1)).collect();
        answers.insert(2, 5);
        assert_eq!(
            score(&answers),
            Err(BatteryError::AnswerOutOfRange {
                question: 2,
                value: 5
            })
        );

        let mut answers: BTreeMap<usize, u8> = (0..6).map(|q| (q, 1)).collect();
        answers.insert(9, 1);
        assert_eq!(score(&answers), Err(BatteryError::UnknownQuestion(9)));
    }

    #[test]
    fn completes_once_when_last_question_answered() {
        let mut h = Harness::new(1);
        let mut step = QuestionnaireStep::new();
        h.start(&mut step);

        for q in 0..5 {
            h.input(&mut step, Input::Answer { question: q, value: 3 });
        }
        // Re-answering an existing question does not complete the set.
        h.input(&mut step, Input::Answer { question: 0, value: 2 });
        assert!(h.completions.is_empty());

        h.input(&mut step, Input::Answer { question: 5, value: 4 });
        assert_eq!(
            h.last_completion(),
            Some(&Measurement::Questionnaire { score: 2 + 3 * 4 + 4 })
        );

        h.input(&mut step, Input::Answer { question: 5, value: 0 });
        assert_eq!(h.completions.len(), 1);
        assert!(step.is_finished());
    }

    #[test]
    fn out_of_range_input_is_ignored() {
        let mut h = Harness::new(1);
        let mut step = QuestionnaireStep::new();
        h.start(&mut step);
        h.input(&mut step, Input::Answer { question: 0, value: 7 });
        h.input(&mut step, Input::Press);
        assert!(step.answers().is_empty());
    }
}
