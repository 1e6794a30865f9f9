//! Time production: press to start, press again when you think the target
//! interval has passed. A cancel while timing discards the attempt.

use crate::model::{BatteryConfig, Cue, Input, Measurement, Millis, Step};
use crate::scoring::time_diff;

use super::{MicroTest, StepContext};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Idle,
    Timing { started: Millis },
    Done,
}

#[derive(Debug)]
pub struct TimeProductionTest {
    target_secs: f64,
    phase: Phase,
    cancellations: u32,
}

impl TimeProductionTest {
    pub fn new(config: &BatteryConfig) -> Self {
        Self {
            target_secs: config.time_target_secs,
            phase: Phase::Idle,
            cancellations: 0,
        }
    }

    pub fn cancellations(&self) -> u32 {
        self.cancellations
    }

    pub fn is_timing(&self) -> bool {
        matches!(self.phase, Phase::Timing { .. })
    }
}

impl MicroTest for TimeProductionTest {
    fn step(&self) -> Step {
        Step::TimeProduction
    }

    fn start(&mut self, ctx: &mut StepContext<'_>) {
        self.phase = Phase::Idle;
        ctx.cue(Cue::TimingReady);
    }

    fn reset(&mut self) {
        self.phase = Phase::Idle;
        self.cancellations = 0;
    }

    fn on_input(&mut self, input: Input, ctx: &mut StepContext<'_>) {
        match (self.phase, input) {
            (Phase::Idle, Input::Press) => {
                self.phase = Phase::Timing {
                    started: ctx.now(),
                };
                ctx.cue(Cue::TimingStarted);
            }
            (Phase::Timing { started }, Input::Press) => {
                let duration_secs = ctx.now().saturating_sub(started) as f64 / 1000.0;
                let diff_secs = time_diff(duration_secs, self.target_secs);
                self.phase = Phase::Done;
                tracing::debug!(duration_secs, diff_secs, "interval produced");
                ctx.complete(Measurement::TimeProduction {
                    duration_secs,
                    diff_secs,
                });
            }
            (Phase::Timing { .. }, Input::Cancel) => {
                self.phase = Phase::Idle;
                self.cancellations += 1;
                ctx.cue(Cue::TimingCancelled);
                ctx.cue(Cue::TimingReady);
            }
            _ => {}
        }
    }

    fn is_finished(&self) -> bool {
        self.phase == Phase::Done
    }
}
