//! Battery orchestrator.
//!
//! Sequences the micro-test controllers, owns the aggregate result and
//! decides when the user may move on. It is the only writer of
//! [`AggregateResult`]; controllers report through their completion slot and
//! the orchestrator folds each measurement in exactly once.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::clock::Clock;
use crate::error::BatteryError;
use crate::microtests::{controller_for, MicroTest, StepContext};
use crate::model::{AggregateResult, BatteryConfig, Cue, Input, Measurement, Millis, Step};
use crate::scheduler::{FiredTimer, Scheduler};

/// One administration of the test battery.
pub struct Battery {
    config: BatteryConfig,
    clock: Arc<dyn Clock>,
    scheduler: Scheduler,
    rng: StdRng,
    steps: Vec<Step>,
    index: usize,
    step_completed: bool,
    active: Option<Box<dyn MicroTest>>,
    results: AggregateResult,
    cues: Vec<Cue>,
    report_requested: bool,
}

impl Battery {
    pub fn new(config: BatteryConfig, clock: Arc<dyn Clock>) -> Self {
        Self::with_rng(config, clock, StdRng::from_entropy())
    }

    /// A battery whose random draws are reproducible.
    pub fn with_seed(config: BatteryConfig, clock: Arc<dyn Clock>, seed: u64) -> Self {
        Self::with_rng(config, clock, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: BatteryConfig, clock: Arc<dyn Clock>, rng: StdRng) -> Self {
        let steps = Step::sequence(config.include_speech);
        let mut battery = Self {
            config,
            clock,
            scheduler: Scheduler::new(),
            rng,
            steps,
            index: 0,
            step_completed: false,
            active: None,
            results: AggregateResult::default(),
            cues: Vec::new(),
            report_requested: false,
        };
        battery.enter_current();
        battery
    }

    pub fn config(&self) -> &BatteryConfig {
        &self.config
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn current_step(&self) -> Step {
        self.steps[self.index]
    }

    pub fn now(&self) -> Millis {
        self.clock.now_ms()
    }

    /// Position in the battery as a 0..=100 percentage.
    pub fn progress(&self) -> f64 {
        let last = self.steps.len().saturating_sub(1).max(1);
        self.index as f64 / last as f64 * 100.0
    }

    /// Whether the current step has reported its measurement (or needs none).
    pub fn is_step_complete(&self) -> bool {
        self.step_completed || !self.current_step().requires_measurement()
    }

    pub fn is_finished(&self) -> bool {
        self.current_step() == Step::Report
    }

    /// The aggregate as collected so far. Fields of steps that have not
    /// completed still hold their defaults.
    pub fn results(&self) -> &AggregateResult {
        &self.results
    }

    /// Move from `from` to the next step.
    pub fn advance(&mut self, from: Step) -> Result<Step, BatteryError> {
        let current = self.current_step();
        if from != current {
            return Err(BatteryError::NotCurrentStep {
                requested: from,
                current,
            });
        }
        if current == Step::Report {
            return Err(BatteryError::Finished);
        }
        if !self.is_step_complete() {
            return Err(BatteryError::StepIncomplete(current));
        }

        self.index += 1;
        self.enter_current();
        Ok(self.current_step())
    }

    /// Accept the measurement of the active step. Anything else is logged and
    /// dropped. Returns whether the measurement was recorded.
    pub fn complete_step(&mut self, step: Step, measurement: Measurement) -> bool {
        let current = self.current_step();
        if step != current {
            tracing::warn!(%step, %current, "completion for inactive step dropped");
            return false;
        }
        if self.step_completed {
            tracing::warn!(%step, "step already completed, measurement dropped");
            return false;
        }
        if measurement.step() != step {
            tracing::warn!(
                %step,
                kind = %measurement.step(),
                "measurement kind does not belong to step, dropped"
            );
            return false;
        }

        measurement.apply(&mut self.results);
        self.step_completed = true;
        self.cues.push(Cue::StepCompleted(step));
        tracing::info!(%step, "step completed");
        true
    }

    /// Throw away the active step's progress and start it over.
    pub fn restart_active(&mut self) -> Result<(), BatteryError> {
        let step = self.current_step();
        if self.is_finished() {
            return Err(BatteryError::Finished);
        }
        if self.step_completed {
            return Err(BatteryError::AlreadyCompleted(step));
        }
        let dropped = self.scheduler.invalidate_all();
        tracing::info!(%step, dropped, "restarting step");
        if let Some(controller) = self.active.as_mut() {
            controller.reset();
            let now = self.clock.now_ms();
            self.dispatch(now, |controller, ctx| controller.start(ctx));
        }
        Ok(())
    }

    /// Route a user input to the active controller.
    pub fn on_input(&mut self, input: Input) {
        let now = self.clock.now_ms();
        // Due timers happen before the input they precede.
        self.pump_until(now);
        if self.active.is_none() {
            tracing::debug!(step = %self.current_step(), ?input, "input without active controller ignored");
            return;
        }
        self.dispatch(now, |controller, ctx| controller.on_input(input, ctx));
    }

    /// Fire every timer that is due by the clock's current time.
    /// Returns how many fired.
    pub fn pump(&mut self) -> usize {
        let now = self.clock.now_ms();
        self.pump_until(now)
    }

    fn pump_until(&mut self, now: Millis) -> usize {
        let mut fired = 0;
        while let Some(timer) = self.scheduler.pop_due(now) {
            self.dispatch_timer(timer);
            fired += 1;
        }
        fired
    }

    /// Dispatch one specific timer, typically captured earlier with
    /// [`Battery::peek_timer`]. Cancelled, already-fired and stale timers are
    /// no-ops. Returns whether the timer was delivered.
    pub fn fire(&mut self, timer: FiredTimer) -> bool {
        if self.scheduler.is_stale(timer.handle) {
            tracing::warn!(kind = ?timer.kind, epoch = timer.handle.epoch(), "stale timer ignored");
            return false;
        }
        if !self.scheduler.claim(timer) {
            tracing::debug!(kind = ?timer.kind, "timer no longer pending");
            return false;
        }
        self.dispatch_timer(timer);
        true
    }

    pub fn next_deadline(&self) -> Option<Millis> {
        self.scheduler.next_deadline()
    }

    pub fn peek_timer(&self) -> Option<FiredTimer> {
        self.scheduler.peek()
    }

    /// Take every cue emitted since the last drain.
    pub fn drain_cues(&mut self) -> Vec<Cue> {
        std::mem::take(&mut self.cues)
    }

    /// Hand out the finalized aggregate for the report request. Yields it
    /// once, and only at the terminal step.
    pub fn take_report_request(&mut self) -> Option<AggregateResult> {
        if !self.is_finished() {
            return None;
        }
        if self.report_requested {
            tracing::debug!("report already requested");
            return None;
        }
        self.report_requested = true;
        tracing::info!("report requested");
        Some(self.results.clone())
    }

    fn enter_current(&mut self) {
        let dropped = self.scheduler.invalidate_all();
        if dropped > 0 {
            tracing::debug!(dropped, "pending timers invalidated");
        }
        let step = self.current_step();
        self.step_completed = false;
        self.active = controller_for(step, &self.config);
        self.cues.push(Cue::StepEntered(step));
        tracing::info!(%step, index = self.index, "entered step");

        if self.active.is_some() {
            let now = self.clock.now_ms();
            self.dispatch(now, |controller, ctx| controller.start(ctx));
        }
    }

    fn dispatch_timer(&mut self, timer: FiredTimer) {
        // Timer handlers observe their scheduled instant so chained timers do not drift.
        let now = timer.handle.deadline();
        self.dispatch(now, |controller, ctx| controller.on_timer(timer.kind, ctx));
    }

    fn dispatch(&mut self, now: Millis, f: impl FnOnce(&mut dyn MicroTest, &mut StepContext<'_>)) {
        let Some(mut controller) = self.active.take() else {
            return;
        };
        let step = controller.step();
        let mut completion = None;
        {
            let mut ctx = StepContext::new(
                now,
                &mut self.scheduler,
                &mut self.rng,
                &mut self.cues,
                &mut completion,
            );
            f(controller.as_mut(), &mut ctx);
        }
        self.active = Some(controller);
        if let Some(measurement) = completion {
            self.complete_step(step, measurement);
        }
    }
}
