//! Simple reaction time: wait for "go", press as fast as possible.
//!
//! A press while still waiting restarts the round with a fresh random delay
//! and records nothing. Once "go" is shown there is no upper timeout; the
//! controller waits for the press indefinitely.

use rand::Rng;

use crate::model::{BatteryConfig, Cue, Input, Measurement, Millis, Step};
use crate::scheduler::{TimerHandle, TimerKind};
use crate::scoring::mean;

use super::{MicroTest, StepContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Waiting { go: TimerHandle },
    Go { since: Millis },
    Done,
}

#[derive(Debug)]
pub struct ReactionTest {
    rounds: usize,
    min_delay_ms: Millis,
    max_delay_ms: Millis,
    phase: Phase,
    times: Vec<Millis>,
    early_presses: u32,
}

impl ReactionTest {
    pub fn new(config: &BatteryConfig) -> Self {
        Self {
            rounds: config.reaction_rounds.max(1),
            min_delay_ms: config.reaction_min_delay_ms,
            max_delay_ms: config.reaction_max_delay_ms,
            phase: Phase::Idle,
            times: Vec::new(),
            early_presses: 0,
        }
    }

    pub fn times(&self) -> &[Millis] {
        &self.times
    }

    pub fn early_presses(&self) -> u32 {
        self.early_presses
    }

    fn begin_wait(&mut self, ctx: &mut StepContext<'_>) {
        let delay = if self.max_delay_ms > self.min_delay_ms {
            ctx.rng().gen_range(self.min_delay_ms..self.max_delay_ms)
        } else {
            self.min_delay_ms
        };
        let go = ctx.schedule(delay, TimerKind::ReactionGo);
        self.phase = Phase::Waiting { go };
        ctx.cue(Cue::ReactionWait {
            round: self.times.len() + 1,
        });
        tracing::debug!(delay, round = self.times.len() + 1, "reaction wait scheduled");
    }
}

impl MicroTest for ReactionTest {
    fn step(&self) -> Step {
        Step::Reaction
    }

    fn start(&mut self, ctx: &mut StepContext<'_>) {
        self.phase = Phase::Idle;
        ctx.cue(Cue::ReactionReady);
    }

    fn reset(&mut self) {
        self.phase = Phase::Idle;
        self.times.clear();
        self.early_presses = 0;
    }

    fn on_input(&mut self, input: Input, ctx: &mut StepContext<'_>) {
        if input != Input::Press {
            return;
        }
        match self.phase {
            Phase::Idle => self.begin_wait(ctx),
            Phase::Waiting { go } => {
                ctx.cancel(go);
                self.early_presses += 1;
                ctx.cue(Cue::ReactionEarly);
                self.begin_wait(ctx);
            }
            Phase::Go { since } => {
                let elapsed = ctx.now().saturating_sub(since);
                self.times.push(elapsed);
                ctx.cue(Cue::ReactionRecorded {
                    round: self.times.len(),
                    elapsed_ms: elapsed,
                });

                if self.times.len() < self.rounds {
                    self.begin_wait(ctx);
                    return;
                }
                self.phase = Phase::Done;
                ctx.complete(Measurement::Reaction {
                    times_ms: self.times.clone(),
                    average_ms: mean(&self.times),
                });
            }
            Phase::Done => {}
        }
    }

    fn on_timer(&mut self, kind: TimerKind, ctx: &mut StepContext<'_>) {
        if kind != TimerKind::ReactionGo {
            return;
        }
        if let Phase::Waiting { .. } = self.phase {
            self.phase = Phase::Go { since: ctx.now() };
            ctx.cue(Cue::ReactionGo);
        }
    }

    fn is_finished(&self) -> bool {
        self.phase == Phase::Done
    }
}
