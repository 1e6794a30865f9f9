//! Real-time driver for a battery.
//!
//! Runs the active step against the battery's clock: sleeps until the next
//! timer is due, feeds user commands from a channel and forwards every cue
//! to an observer. The battery is borrowed mutably for the whole run, so
//! events reach it strictly one at a time.

use std::time::Duration;

use tokio::sync::mpsc;

use crate::engine::Battery;
use crate::model::{Cue, Input, Step};

/// Observer of display cues. Implemented by front ends.
pub trait BatteryObserver: Send + Sync {
    fn on_cue(&self, cue: &Cue);
}

/// Observer that ignores everything.
pub struct NoopObserver;

impl BatteryObserver for NoopObserver {
    fn on_cue(&self, _: &Cue) {}
}

/// Something the user asked for while a step runs, tagged with the step
/// that was on screen. Commands for any other step are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Input { step: Step, input: Input },
    /// Start the active step over.
    Restart { step: Step },
}

impl Command {
    pub fn step(&self) -> Step {
        match self {
            Command::Input { step, .. } | Command::Restart { step } => *step,
        }
    }
}

/// Why [`run_step`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepRun {
    Completed,
    /// The command channel closed before the step completed.
    InputClosed,
}

/// Drive the current step until it completes or the command channel closes.
pub async fn run_step(
    battery: &mut Battery,
    commands: &mut mpsc::Receiver<Command>,
    observer: &dyn BatteryObserver,
) -> StepRun {
    loop {
        for cue in battery.drain_cues() {
            observer.on_cue(&cue);
        }
        if battery.is_step_complete() {
            return StepRun::Completed;
        }

        let wait = battery
            .next_deadline()
            .map(|deadline| Duration::from_millis(deadline.saturating_sub(battery.now())));

        tokio::select! {
            _ = sleep_or_pend(wait) => {
                let fired = battery.pump();
                tracing::trace!(fired, "timers pumped");
            }
            command = commands.recv() => match command {
                Some(command) if command.step() != battery.current_step() => {
                    tracing::debug!(
                        step = %command.step(),
                        current = %battery.current_step(),
                        "command for a previous step dropped"
                    );
                }
                Some(Command::Input { input, .. }) => battery.on_input(input),
                Some(Command::Restart { .. }) => {
                    if let Err(e) = battery.restart_active() {
                        tracing::warn!("restart rejected: {e}");
                    }
                }
                None => {
                    for cue in battery.drain_cues() {
                        observer.on_cue(&cue);
                    }
                    return StepRun::InputClosed;
                }
            },
        }
    }
}

async fn sleep_or_pend(wait: Option<Duration>) {
    match wait {
        Some(duration) => tokio::time::sleep(duration).await,
        None => std::future::pending().await,
    }
}
