//! Micro-test controllers.
//!
//! Each controller is an explicit state machine driven by two kinds of
//! events: user [`Input`] and fired timers. It talks to the outside world
//! only through a [`StepContext`], which lets it read the clock, schedule
//! timers, emit display cues and report its single measurement.

pub mod attention;
pub mod memory;
pub mod questionnaire;
pub mod reaction;
pub mod stroop;
pub mod time_production;

use rand::rngs::StdRng;

use crate::model::{BatteryConfig, Cue, Input, Measurement, Millis, Step};
use crate::scheduler::{Scheduler, TimerHandle, TimerKind};

pub use attention::AttentionTest;
pub use memory::MemoryTest;
pub use questionnaire::QuestionnaireStep;
pub use reaction::ReactionTest;
pub use stroop::StroopTest;
pub use time_production::TimeProductionTest;

/// A step controller owned by the orchestrator for the lifetime of one step.
pub trait MicroTest: Send {
    /// The step this controller measures.
    fn step(&self) -> Step;

    /// Called once when the step is entered (and again after `reset`).
    fn start(&mut self, ctx: &mut StepContext<'_>);

    /// Drop all transient state and return to the pre-start state.
    fn reset(&mut self);

    fn on_input(&mut self, input: Input, ctx: &mut StepContext<'_>);

    fn on_timer(&mut self, kind: TimerKind, ctx: &mut StepContext<'_>) {
        let _ = ctx;
        tracing::debug!(step = %self.step(), ?kind, "timer ignored");
    }

    /// Whether the controller already reported its measurement.
    fn is_finished(&self) -> bool;
}

/// Build a fresh controller for a step. Steps completed by the host
/// (intro, speech, report) have no controller.
pub fn controller_for(step: Step, config: &BatteryConfig) -> Option<Box<dyn MicroTest>> {
    match step {
        Step::Questionnaire => Some(Box::new(QuestionnaireStep::new())),
        Step::Reaction => Some(Box::new(ReactionTest::new(config))),
        Step::Attention => Some(Box::new(AttentionTest::new(config))),
        Step::Memory => Some(Box::new(MemoryTest::new(config))),
        Step::Stroop => Some(Box::new(StroopTest::new(config))),
        Step::TimeProduction => Some(Box::new(TimeProductionTest::new(config))),
        Step::Intro | Step::Speech | Step::Report => None,
    }
}

/// Everything a controller may touch while handling one event.
pub struct StepContext<'a> {
    now: Millis,
    scheduler: &'a mut Scheduler,
    rng: &'a mut StdRng,
    cues: &'a mut Vec<Cue>,
    completion: &'a mut Option<Measurement>,
}

impl<'a> StepContext<'a> {
    pub fn new(
        now: Millis,
        scheduler: &'a mut Scheduler,
        rng: &'a mut StdRng,
        cues: &'a mut Vec<Cue>,
        completion: &'a mut Option<Measurement>,
    ) -> Self {
        Self {
            now,
            scheduler,
            rng,
            cues,
            completion,
        }
    }

    pub fn now(&self) -> Millis {
        self.now
    }

    pub fn schedule(&mut self, delay_ms: Millis, kind: TimerKind) -> TimerHandle {
        self.scheduler.schedule(self.now, delay_ms, kind)
    }

    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        self.scheduler.cancel(handle)
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut *self.rng
    }

    pub fn cue(&mut self, cue: Cue) {
        self.cues.push(cue);
    }

    /// Report the step's measurement. A second report in the same event is dropped.
    pub fn complete(&mut self, measurement: Measurement) {
        if self.completion.is_some() {
            tracing::warn!(step = %measurement.step(), "duplicate completion dropped");
            return;
        }
        *self.completion = Some(measurement);
    }
}
