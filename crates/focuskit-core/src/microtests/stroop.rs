//! Stroop interference: name the ink, not the word.

use rand::seq::SliceRandom;

use crate::model::{BatteryConfig, Cue, InkColor, Input, Measurement, Step};
use crate::scoring::stroop_score;

use super::{MicroTest, StepContext};

/// One presented trial and the user's answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StroopTrial {
    pub word: InkColor,
    pub ink: InkColor,
    pub selected: Option<InkColor>,
}

impl StroopTrial {
    pub fn is_correct(&self) -> bool {
        self.selected == Some(self.ink)
    }
}

#[derive(Debug)]
pub struct StroopTest {
    trials: usize,
    history: Vec<StroopTrial>,
    current: Option<StroopTrial>,
    finished: bool,
}

impl StroopTest {
    pub fn new(config: &BatteryConfig) -> Self {
        Self {
            trials: config.stroop_trials.max(1),
            history: Vec::new(),
            current: None,
            finished: false,
        }
    }

    pub fn current(&self) -> Option<&StroopTrial> {
        self.current.as_ref()
    }

    pub fn history(&self) -> &[StroopTrial] {
        &self.history
    }

    fn present(&mut self, ctx: &mut StepContext<'_>) {
        // Word and ink are drawn independently; congruent trials happen by chance.
        let word = *InkColor::ALL.choose(ctx.rng()).unwrap_or(&InkColor::Red);
        let ink = *InkColor::ALL.choose(ctx.rng()).unwrap_or(&InkColor::Red);
        self.current = Some(StroopTrial {
            word,
            ink,
            selected: None,
        });
        ctx.cue(Cue::StroopTrial {
            index: self.history.len() + 1,
            word,
            ink,
        });
    }
}

impl MicroTest for StroopTest {
    fn step(&self) -> Step {
        Step::Stroop
    }

    fn start(&mut self, ctx: &mut StepContext<'_>) {
        self.present(ctx);
    }

    fn reset(&mut self) {
        self.history.clear();
        self.current = None;
        self.finished = false;
    }

    fn on_input(&mut self, input: Input, ctx: &mut StepContext<'_>) {
        let Input::Color(selected) = input else {
            return;
        };
        if self.finished {
            return;
        }
        let Some(mut trial) = self.current.take() else {
            return;
        };

        trial.selected = Some(selected);
        ctx.cue(Cue::StroopAnswered {
            correct: trial.is_correct(),
        });
        self.history.push(trial);

        if self.history.len() < self.trials {
            self.present(ctx);
            return;
        }

        let correct = self.history.iter().filter(|t| t.is_correct()).count() as u32;
        let trials = self.history.len() as u32;
        self.finished = true;
        ctx.complete(Measurement::Stroop {
            correct,
            trials,
            score: stroop_score(correct, trials),
        });
    }

    fn is_finished(&self) -> bool {
        self.finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::microtests::harness::Harness;

    fn other_than(color: InkColor) -> InkColor {
        match color {
            InkColor::Red => InkColor::Green,
            InkColor::Green => InkColor::Blue,
            InkColor::Blue => InkColor::Red,
        }
    }

    fn answer_pattern(seed: u64, pattern: &[bool]) -> (StroopTest, Harness) {
        let mut h = Harness::new(seed);
        let mut test = StroopTest::new(&BatteryConfig::default());
        h.start(&mut test);
        for &correct in pattern {
            let ink = test.current().expect("trial presented").ink;
            let pick = if correct { ink } else { other_than(ink) };
            h.input(&mut test, Input::Color(pick));
        }
        (test, h)
    }

    #[test]
    fn three_of_five_scores_sixty() {
        let (test, h) = answer_pattern(1, &[true, false, true, false, true]);
        assert!(test.is_finished());
        assert_eq!(
            h.completions,
            vec![Measurement::Stroop {
                correct: 3,
                trials: 5,
                score: 60.0
            }]
        );
    }

    #[test]
    fn correctness_follows_ink_not_word() {
        let mut h = Harness::new(12);
        let mut test = StroopTest::new(&BatteryConfig::default());
        h.start(&mut test);
        let trial = *test.current().unwrap();
        h.input(&mut test, Input::Color(trial.ink));
        assert!(test.history()[0].is_correct());
        assert_eq!(test.history()[0].word, trial.word);
    }

    #[test]
    fn exactly_five_trials_then_ignores_input() {
        let (test, mut h) = answer_pattern(3, &[true; 5]);
        let mut test = test;
        h.input(&mut test, Input::Color(InkColor::Red));
        assert_eq!(test.history().len(), 5);
        assert_eq!(h.completions.len(), 1);
        let presented = h
            .cues
            .iter()
            .filter(|c| matches!(c, Cue::StroopTrial { .. }))
            .count();
        assert_eq!(presented, 5);
    }

    #[test]
    fn non_color_input_is_ignored() {
        let mut h = Harness::new(4);
        let mut test = StroopTest::new(&BatteryConfig::default());
        h.start(&mut test);
        h.input(&mut test, Input::Press);
        h.input(&mut test, Input::Tile(1));
        assert!(test.history().is_empty());
        assert!(test.current().is_some());
    }
}
