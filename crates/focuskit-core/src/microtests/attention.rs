//! Go/No-Go sustained attention.
//!
//! Stimuli appear on a fixed interval for a fixed wall-clock session. Each
//! stimulus opens a response window that lasts until the next stimulus (or
//! the end of the session), even after the stimulus itself is hidden. One
//! press is counted per window.

use rand::Rng;

use crate::model::{AttentionTally, BatteryConfig, Cue, Input, Measurement, Millis, Step};
use crate::scheduler::{TimerHandle, TimerKind};

use super::{MicroTest, StepContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Running,
    Finished,
}

#[derive(Debug, Clone, Copy)]
struct Window {
    index: usize,
    target: bool,
    responded: bool,
}

#[derive(Debug)]
pub struct AttentionTest {
    duration_ms: Millis,
    interval_ms: Millis,
    visible_ms: Millis,
    target_probability: f64,
    phase: Phase,
    window: Option<Window>,
    shown: usize,
    tally: AttentionTally,
    tick: Option<TimerHandle>,
    hide: Option<TimerHandle>,
}

impl AttentionTest {
    pub fn new(config: &BatteryConfig) -> Self {
        Self {
            duration_ms: config.attention_duration_ms,
            interval_ms: config.attention_interval_ms.max(1),
            visible_ms: config.attention_visible_ms,
            target_probability: config.attention_target_probability.clamp(0.0, 1.0),
            phase: Phase::Idle,
            window: None,
            shown: 0,
            tally: AttentionTally::default(),
            tick: None,
            hide: None,
        }
    }

    pub fn tally(&self) -> AttentionTally {
        self.tally
    }

    /// Score an unanswered target as a miss before its window closes.
    fn close_window(&mut self, ctx: &mut StepContext<'_>) {
        if let Some(window) = self.window.take() {
            if window.target && !window.responded {
                self.tally.misses += 1;
                tracing::debug!(index = window.index, "target missed");
                ctx.cue(Cue::AttentionScored(self.tally));
            }
        }
    }

    fn show_stimulus(&mut self, ctx: &mut StepContext<'_>) {
        self.close_window(ctx);

        let target = ctx.rng().gen_bool(self.target_probability);
        if target {
            self.tally.targets_shown += 1;
        } else {
            self.tally.non_targets_shown += 1;
        }
        self.shown += 1;
        self.window = Some(Window {
            index: self.shown,
            target,
            responded: false,
        });
        ctx.cue(Cue::StimulusShown {
            index: self.shown,
            target,
        });

        if let Some(handle) = self.hide.take() {
            ctx.cancel(handle);
        }
        self.hide = Some(ctx.schedule(self.visible_ms, TimerKind::AttentionHide));
        self.tick = Some(ctx.schedule(self.interval_ms, TimerKind::AttentionTick));
    }

    fn finish(&mut self, ctx: &mut StepContext<'_>) {
        self.close_window(ctx);
        for handle in [self.tick.take(), self.hide.take()].into_iter().flatten() {
            ctx.cancel(handle);
        }
        self.phase = Phase::Finished;
        ctx.cue(Cue::StimulusHidden);
        tracing::info!(
            hits = self.tally.hits,
            misses = self.tally.misses,
            false_clicks = self.tally.false_clicks,
            "attention session finished"
        );
        ctx.complete(Measurement::Attention(self.tally));
    }
}

impl MicroTest for AttentionTest {
    fn step(&self) -> Step {
        Step::Attention
    }

    fn start(&mut self, ctx: &mut StepContext<'_>) {
        self.phase = Phase::Idle;
        ctx.cue(Cue::AttentionReady);
    }

    fn reset(&mut self) {
        self.phase = Phase::Idle;
        self.window = None;
        self.shown = 0;
        self.tally = AttentionTally::default();
        self.tick = None;
        self.hide = None;
    }

    fn on_input(&mut self, input: Input, ctx: &mut StepContext<'_>) {
        if input != Input::Press {
            return;
        }
        match self.phase {
            Phase::Idle => {
                // The deadline is scheduled first so it wins a tie with the last tick.
                ctx.schedule(self.duration_ms, TimerKind::AttentionDeadline);
                self.tick = Some(ctx.schedule(self.interval_ms, TimerKind::AttentionTick));
                self.phase = Phase::Running;
            }
            Phase::Running => {
                let Some(window) = self.window.as_mut() else {
                    tracing::debug!("press before first stimulus ignored");
                    return;
                };
                if window.responded {
                    return;
                }
                window.responded = true;
                if window.target {
                    self.tally.hits += 1;
                } else {
                    self.tally.false_clicks += 1;
                }
                ctx.cue(Cue::AttentionScored(self.tally));
            }
            Phase::Finished => {}
        }
    }

    fn on_timer(&mut self, kind: TimerKind, ctx: &mut StepContext<'_>) {
        if self.phase != Phase::Running {
            return;
        }
        match kind {
            TimerKind::AttentionTick => self.show_stimulus(ctx),
            TimerKind::AttentionHide => {
                self.hide = None;
                ctx.cue(Cue::StimulusHidden);
            }
            TimerKind::AttentionDeadline => self.finish(ctx),
            _ => {}
        }
    }

    fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::microtests::harness::Harness;

    /// Run a whole session; `respond(target)` returns how many times to press.
    fn run_session(
        h: &mut Harness,
        test: &mut AttentionTest,
        mut respond: impl FnMut(bool) -> u32,
    ) -> AttentionTally {
        h.start(test);
        h.input(test, Input::Press);
        while !test.is_finished() {
            let deadline = h.scheduler.next_deadline().expect("timers pending while running");
            h.run_until(test, deadline);
            let shown: Vec<bool> = h
                .take_cues()
                .into_iter()
                .filter_map(|c| match c {
                    Cue::StimulusShown { target, .. } => Some(target),
                    _ => None,
                })
                .collect();
            for target in shown {
                let presses = respond(target);
                if presses > 0 {
                    h.advance(test, 200);
                    for _ in 0..presses {
                        h.input(test, Input::Press);
                    }
                }
            }
        }
        assert_eq!(h.completions.len(), 1);
        match h.last_completion() {
            Some(Measurement::Attention(tally)) => *tally,
            other => panic!("unexpected measurement {other:?}"),
        }
    }

    fn assert_invariants(t: &AttentionTally) {
        assert!(t.hits + t.misses <= t.targets_shown, "{t:?}");
        assert!(t.false_clicks <= t.non_targets_shown, "{t:?}");
    }

    #[test]
    fn perfect_responder() {
        let mut h = Harness::new(42);
        let mut test = AttentionTest::new(&BatteryConfig::default());
        let t = run_session(&mut h, &mut test, |target| u32::from(target));
        assert_invariants(&t);
        assert_eq!(t.targets_shown + t.non_targets_shown, 19);
        assert_eq!(t.hits, t.targets_shown);
        assert_eq!(t.misses, 0);
        assert_eq!(t.false_clicks, 0);
        assert_eq!(h.now, 30_000);
        assert!(h.scheduler.is_empty());
    }

    #[test]
    fn silent_participant_misses_every_target() {
        let mut h = Harness::new(8);
        let mut test = AttentionTest::new(&BatteryConfig::default());
        let t = run_session(&mut h, &mut test, |_| 0);
        assert_invariants(&t);
        assert_eq!(t.hits, 0);
        assert_eq!(t.misses, t.targets_shown);
        assert_eq!(t.false_clicks, 0);
    }

    #[test]
    fn double_presses_count_once_per_window() {
        let mut h = Harness::new(21);
        let mut test = AttentionTest::new(&BatteryConfig::default());
        let t = run_session(&mut h, &mut test, |_| 3);
        assert_invariants(&t);
        assert_eq!(t.hits, t.targets_shown);
        assert_eq!(t.false_clicks, t.non_targets_shown);
        assert_eq!(t.misses, 0);
    }

    #[test]
    fn presses_before_first_stimulus_are_ignored() {
        let mut h = Harness::new(2);
        let mut test = AttentionTest::new(&BatteryConfig::default());
        h.start(&mut test);
        h.input(&mut test, Input::Press);
        h.advance(&mut test, 700);
        h.input(&mut test, Input::Press);
        h.input(&mut test, Input::Press);
        assert_eq!(test.tally(), AttentionTally::default());

        // The first stimulus appears without any pre-scored miss.
        h.advance(&mut test, 800);
        let tally = test.tally();
        assert_eq!(tally.targets_shown + tally.non_targets_shown, 1);
        assert_eq!(tally.misses, 0);
    }

    #[test]
    fn unanswered_final_target_is_a_miss_at_deadline() {
        let config = BatteryConfig {
            attention_duration_ms: 3000,
            attention_interval_ms: 1000,
            attention_target_probability: 1.0,
            ..Default::default()
        };
        let mut h = Harness::new(4);
        let mut test = AttentionTest::new(&config);
        let mut seen = 0;
        let t = run_session(&mut h, &mut test, |_| {
            seen += 1;
            u32::from(seen == 1)
        });
        // Ticks at 1000 and 2000; the tick due at 3000 loses to the deadline.
        assert_eq!(t.targets_shown, 2);
        assert_eq!(t.hits, 1);
        assert_eq!(t.misses, 1);
    }

    #[test]
    fn response_after_hide_still_counts_for_its_window() {
        let config = BatteryConfig {
            attention_target_probability: 1.0,
            ..Default::default()
        };
        let mut h = Harness::new(4);
        let mut test = AttentionTest::new(&config);
        h.start(&mut test);
        h.input(&mut test, Input::Press);
        h.run_until(&mut test, 1500 + 1400);
        assert!(h.cues.contains(&Cue::StimulusHidden));
        h.input(&mut test, Input::Press);
        assert_eq!(test.tally().hits, 1);
    }

    #[test]
    fn next_stimulus_outlives_previous_hide_timer() {
        let config = BatteryConfig {
            attention_duration_ms: 5000,
            attention_interval_ms: 1000,
            attention_visible_ms: 1500,
            ..Default::default()
        };
        let mut h = Harness::new(6);
        let mut test = AttentionTest::new(&config);
        h.start(&mut test);
        h.input(&mut test, Input::Press);

        h.run_until(&mut test, 2000);
        h.take_cues();
        h.run_until(&mut test, 2900);
        assert!(!h.cues.contains(&Cue::StimulusHidden));

        h.run_until(&mut test, 5000);
        assert!(test.is_finished());
        let hidden = h
            .cues
            .iter()
            .filter(|c| **c == Cue::StimulusHidden)
            .count();
        // Only the end of the session hides the last stimulus.
        assert_eq!(hidden, 1);
        assert!(h.scheduler.is_empty());
    }
}
