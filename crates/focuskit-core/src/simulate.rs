//! Scripted participant simulation.
//!
//! Runs a whole battery on a [`ManualClock`] with a scripted participant
//! that reacts to cues the way a real user would: it waits for stimuli,
//! responds after a sampled latency and makes mistakes at a rate set by its
//! profile. With a fixed seed the run is fully deterministic.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::clock::{Clock, ManualClock};
use crate::engine::Battery;
use crate::error::BatteryError;
use crate::microtests::questionnaire::QUESTIONS;
use crate::model::{AggregateResult, BatteryConfig, Cue, InkColor, Input, Measurement, Millis, Step};
use crate::speech::PERMISSION_DENIED_TEXT;

/// Behavior presets for the scripted participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantProfile {
    /// Attentive and consistent.
    Steady,
    /// Slow, impulsive and forgetful.
    Distracted,
}

impl fmt::Display for ParticipantProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParticipantProfile::Steady => write!(f, "steady"),
            ParticipantProfile::Distracted => write!(f, "distracted"),
        }
    }
}

impl FromStr for ParticipantProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "steady" => Ok(ParticipantProfile::Steady),
            "distracted" => Ok(ParticipantProfile::Distracted),
            other => Err(format!("unknown profile: {other}")),
        }
    }
}

/// Tunable behavior of a scripted participant.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantTraits {
    /// Likert value given to every question.
    pub answer: u8,
    /// Response latency range, `[lo, hi)` ms.
    pub latency_ms: (Millis, Millis),
    /// Chance of jumping the gun once per reaction round.
    pub early_press_probability: f64,
    pub hit_probability: f64,
    pub false_click_probability: f64,
    /// Longest sequence echoed correctly.
    pub memory_span: u32,
    pub stroop_accuracy: f64,
    /// Interval held in the time production task.
    pub produced_ms: Millis,
    /// Abort the first time production attempt.
    pub cancels_first_attempt: bool,
}

impl ParticipantProfile {
    pub fn traits(self) -> ParticipantTraits {
        match self {
            ParticipantProfile::Steady => ParticipantTraits {
                answer: 1,
                latency_ms: (240, 330),
                early_press_probability: 0.0,
                hit_probability: 0.95,
                false_click_probability: 0.05,
                memory_span: 7,
                stroop_accuracy: 1.0,
                produced_ms: 10_200,
                cancels_first_attempt: false,
            },
            ParticipantProfile::Distracted => ParticipantTraits {
                answer: 3,
                latency_ms: (420, 560),
                early_press_probability: 0.4,
                hit_probability: 0.6,
                false_click_probability: 0.35,
                memory_span: 2,
                stroop_accuracy: 0.6,
                produced_ms: 7_400,
                cancels_first_attempt: true,
            },
        }
    }
}

/// Outcome of a scripted run.
#[derive(Debug, Clone)]
pub struct SimulatedSession {
    pub results: AggregateResult,
    /// Every cue the battery emitted, in order.
    pub transcript: Vec<Cue>,
    /// Virtual time the run took.
    pub elapsed_ms: Millis,
}

/// Run a full battery with a scripted participant, stopping at the report step.
pub fn simulate_battery(
    config: BatteryConfig,
    profile: ParticipantProfile,
    seed: u64,
) -> Result<SimulatedSession, BatteryError> {
    simulate_with_traits(config, profile.traits(), seed)
}

pub fn simulate_with_traits(
    config: BatteryConfig,
    traits: ParticipantTraits,
    seed: u64,
) -> Result<SimulatedSession, BatteryError> {
    let clock = Arc::new(ManualClock::new(0));
    let battery = Battery::with_seed(config, clock.clone(), seed);
    let mut participant = Participant {
        traits,
        rng: StdRng::seed_from_u64(seed.wrapping_add(1)),
        battery,
        clock,
        transcript: Vec::new(),
    };
    participant.run()?;

    tracing::info!(
        elapsed_ms = participant.clock.now_ms(),
        cues = participant.transcript.len(),
        "simulation finished"
    );
    Ok(SimulatedSession {
        results: participant.battery.results().clone(),
        elapsed_ms: participant.clock.now_ms(),
        transcript: participant.transcript,
    })
}

struct Participant {
    traits: ParticipantTraits,
    rng: StdRng,
    battery: Battery,
    clock: Arc<ManualClock>,
    transcript: Vec<Cue>,
}

impl Participant {
    fn run(&mut self) -> Result<(), BatteryError> {
        loop {
            let step = self.battery.current_step();
            tracing::debug!(%step, "participant on step");
            match step {
                Step::Intro => {}
                Step::Questionnaire => self.questionnaire(),
                Step::Reaction => self.reaction()?,
                Step::Attention => self.attention()?,
                Step::Memory => self.memory()?,
                Step::Stroop => self.stroop()?,
                Step::TimeProduction => self.time_production(),
                Step::Speech => {
                    self.battery.complete_step(
                        Step::Speech,
                        Measurement::Speech {
                            analysis: PERMISSION_DENIED_TEXT.to_string(),
                        },
                    );
                }
                Step::Report => {
                    self.observe();
                    return Ok(());
                }
            }
            self.observe();
            self.battery.advance(step)?;
        }
    }

    /// Move cues from the battery into the transcript, returning the new ones.
    fn observe(&mut self) -> Vec<Cue> {
        let cues = self.battery.drain_cues();
        self.transcript.extend(cues.iter().cloned());
        cues
    }

    fn press(&mut self, input: Input) {
        self.battery.on_input(input);
    }

    fn latency(&mut self) -> Millis {
        let (lo, hi) = self.traits.latency_ms;
        if hi > lo {
            self.rng.gen_range(lo..hi)
        } else {
            lo
        }
    }

    /// Jump to the next pending timer and fire it.
    fn next_timer(&mut self) -> Result<(), BatteryError> {
        let deadline = self
            .battery
            .next_deadline()
            .ok_or(BatteryError::Stalled(self.battery.current_step()))?;
        self.clock.set(deadline);
        self.battery.pump();
        Ok(())
    }

    fn questionnaire(&mut self) {
        for question in 0..QUESTIONS.len() {
            self.clock.advance(1500);
            self.press(Input::Answer {
                question,
                value: self.traits.answer,
            });
        }
    }

    fn reaction(&mut self) -> Result<(), BatteryError> {
        self.press(Input::Press);
        let mut may_jump = true;
        while !self.battery.is_step_complete() {
            let go = self
                .battery
                .next_deadline()
                .ok_or(BatteryError::Stalled(Step::Reaction))?;
            if may_jump && self.rng.gen_bool(self.traits.early_press_probability) {
                may_jump = false;
                self.clock.set(go.saturating_sub(200));
                self.press(Input::Press);
                continue;
            }
            self.next_timer()?;
            let latency = self.latency();
            self.clock.advance(latency);
            self.press(Input::Press);
            may_jump = true;
        }
        Ok(())
    }

    fn attention(&mut self) -> Result<(), BatteryError> {
        self.press(Input::Press);
        while !self.battery.is_step_complete() {
            self.next_timer()?;
            for cue in self.observe() {
                let Cue::StimulusShown { target, .. } = cue else {
                    continue;
                };
                let p = if target {
                    self.traits.hit_probability
                } else {
                    self.traits.false_click_probability
                };
                if self.rng.gen_bool(p) {
                    let latency = self.latency();
                    self.clock.advance(latency);
                    self.press(Input::Press);
                }
            }
        }
        Ok(())
    }

    fn memory(&mut self) -> Result<(), BatteryError> {
        let grid = self.battery.config().memory_tiles.max(2);
        self.press(Input::Press);
        while !self.battery.is_step_complete() {
            // Watch the replay.
            let mut shown = Vec::new();
            loop {
                self.next_timer()?;
                let mut ready = false;
                for cue in self.observe() {
                    match cue {
                        Cue::TileOn(tile) => shown.push(tile),
                        Cue::MemoryAwaitingEcho { .. } => ready = true,
                        _ => {}
                    }
                }
                if ready {
                    break;
                }
            }

            if shown.len() as u32 > self.traits.memory_span {
                let wrong = (shown[0] + 1) % grid;
                self.clock.advance(self.traits.latency_ms.0);
                self.press(Input::Tile(wrong));
                break;
            }
            for tile in shown {
                let latency = self.latency();
                self.clock.advance(latency);
                self.press(Input::Tile(tile));
            }
        }
        Ok(())
    }

    fn stroop(&mut self) -> Result<(), BatteryError> {
        while !self.battery.is_step_complete() {
            let trial = self.observe().into_iter().rev().find_map(|cue| match cue {
                Cue::StroopTrial { ink, .. } => Some(ink),
                _ => None,
            });
            let ink = trial.ok_or(BatteryError::Stalled(Step::Stroop))?;
            let pick = if self.rng.gen_bool(self.traits.stroop_accuracy) {
                ink
            } else {
                let others: Vec<InkColor> =
                    InkColor::ALL.into_iter().filter(|&c| c != ink).collect();
                others[self.rng.gen_range(0..others.len())]
            };
            let latency = self.latency();
            self.clock.advance(latency * 2);
            self.press(Input::Color(pick));
        }
        Ok(())
    }

    fn time_production(&mut self) {
        if self.traits.cancels_first_attempt {
            self.press(Input::Press);
            self.clock.advance(3_000);
            self.press(Input::Cancel);
            self.clock.advance(1_000);
        }
        self.press(Input::Press);
        self.clock.advance(self.traits.produced_ms);
        self.press(Input::Press);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{CorrelationLevel, IndicatorSummary};

    #[test]
    fn steady_participant_looks_typical() {
        let session =
            simulate_battery(BatteryConfig::default(), ParticipantProfile::Steady, 7).unwrap();
        let r = &session.results;
        assert_eq!(r.hyperactivity_score, 6);
        assert_eq!(r.reaction_times.len(), 5);
        assert!(r.reaction_times.iter().all(|&t| (240..330).contains(&t)));
        assert_eq!(r.memory_score, 7);
        assert_eq!(r.stroop_score, 100.0);
        assert!((r.time_diff_seconds - 0.2).abs() < 1e-9);
        assert_eq!(
            IndicatorSummary::evaluate(r).level,
            CorrelationLevel::Low
        );
        assert!(session.transcript.contains(&Cue::StepEntered(Step::Report)));
    }

    #[test]
    fn distracted_participant_shows_strong_pattern() {
        let session =
            simulate_battery(BatteryConfig::default(), ParticipantProfile::Distracted, 7).unwrap();
        let r = &session.results;
        assert_eq!(r.hyperactivity_score, 18);
        assert!(r.avg_reaction_time > 400.0);
        assert_eq!(r.memory_score, 2);
        assert!((r.time_diff_seconds + 2.6).abs() < 1e-9);
        assert!(session.transcript.contains(&Cue::TimingCancelled));

        let summary = IndicatorSummary::evaluate(r);
        assert!(summary.questionnaire && summary.reaction_time && summary.memory);
        assert_eq!(summary.level, CorrelationLevel::Strong);
    }

    #[test]
    fn runs_are_deterministic_per_seed() {
        let a = simulate_battery(BatteryConfig::default(), ParticipantProfile::Distracted, 99)
            .unwrap();
        let b = simulate_battery(BatteryConfig::default(), ParticipantProfile::Distracted, 99)
            .unwrap();
        assert_eq!(a.results, b.results);
        assert_eq!(a.elapsed_ms, b.elapsed_ms);
    }

    #[test]
    fn attention_invariants_hold_for_many_seeds() {
        for seed in 0..20 {
            let session =
                simulate_battery(BatteryConfig::default(), ParticipantProfile::Distracted, seed)
                    .unwrap();
            let shown: Vec<bool> = session
                .transcript
                .iter()
                .filter_map(|c| match c {
                    Cue::StimulusShown { target, .. } => Some(*target),
                    _ => None,
                })
                .collect();
            assert_eq!(shown.len(), 19);
            let targets = shown.iter().filter(|&&t| t).count() as u32;
            let r = &session.results;
            assert!(r.attention_hits + r.attention_misses <= targets);
            assert!(r.attention_false_clicks <= 19 - targets);
        }
    }

    #[test]
    fn speech_step_is_filled_with_placeholder() {
        let config = BatteryConfig {
            include_speech: true,
            ..Default::default()
        };
        let session = simulate_battery(config, ParticipantProfile::Steady, 3).unwrap();
        assert_eq!(
            session.results.audio_analysis.as_deref(),
            Some(PERMISSION_DENIED_TEXT)
        );
    }

    #[test]
    fn profile_parsing() {
        assert_eq!("Steady".parse::<ParticipantProfile>(), Ok(ParticipantProfile::Steady));
        assert!("sleepy".parse::<ParticipantProfile>().is_err());
        assert_eq!(ParticipantProfile::Distracted.to_string(), "distracted");
    }
}
