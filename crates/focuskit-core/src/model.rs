//! Core data model types for focuskit.
//!
//! These are the types the whole battery speaks: the ordered steps, user
//! inputs, display cues, finalized measurements and the aggregate result
//! handed to the analysis service.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Milliseconds on the injected monotonic clock.
pub type Millis = u64;

/// One position in the battery. Steps are visited strictly in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Intro,
    Questionnaire,
    Reaction,
    Attention,
    Memory,
    Stroop,
    TimeProduction,
    Speech,
    Report,
}

impl Step {
    /// The ordered step list for a battery.
    pub fn sequence(include_speech: bool) -> Vec<Step> {
        let mut steps = vec![
            Step::Intro,
            Step::Questionnaire,
            Step::Reaction,
            Step::Attention,
            Step::Memory,
            Step::Stroop,
            Step::TimeProduction,
        ];
        if include_speech {
            steps.push(Step::Speech);
        }
        steps.push(Step::Report);
        steps
    }

    /// Whether the step must report a measurement before the battery moves on.
    pub fn requires_measurement(self) -> bool {
        !matches!(self, Step::Intro | Step::Report)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Intro => "intro",
            Step::Questionnaire => "questionnaire",
            Step::Reaction => "reaction",
            Step::Attention => "attention",
            Step::Memory => "memory",
            Step::Stroop => "stroop",
            Step::TimeProduction => "time_production",
            Step::Speech => "speech",
            Step::Report => "report",
        };
        f.write_str(name)
    }
}

/// The three colors used by the Stroop test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InkColor {
    Red,
    Green,
    Blue,
}

impl InkColor {
    pub const ALL: [InkColor; 3] = [InkColor::Red, InkColor::Green, InkColor::Blue];
}

impl fmt::Display for InkColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InkColor::Red => write!(f, "red"),
            InkColor::Green => write!(f, "green"),
            InkColor::Blue => write!(f, "blue"),
        }
    }
}

impl FromStr for InkColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "red" | "r" => Ok(InkColor::Red),
            "green" | "g" => Ok(InkColor::Green),
            "blue" | "b" => Ok(InkColor::Blue),
            other => Err(format!("unknown color: {other}")),
        }
    }
}

/// A single user input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    /// Primary action: click, spacebar, start/stop button.
    Press,
    /// Abort an in-progress action (e.g. pointer left the control).
    Cancel,
    /// A memory grid tile was selected.
    Tile(u8),
    /// A Stroop color button was selected.
    Color(InkColor),
    /// A questionnaire answer.
    Answer { question: usize, value: u8 },
}

/// Display event emitted by a controller for the front end.
///
/// Controllers never read presentation state back; cues flow one way.
#[derive(Debug, Clone, PartialEq)]
pub enum Cue {
    StepEntered(Step),
    StepCompleted(Step),

    QuestionAnswered { answered: usize, total: usize },

    ReactionReady,
    ReactionWait { round: usize },
    ReactionGo,
    ReactionEarly,
    ReactionRecorded { round: usize, elapsed_ms: Millis },

    AttentionReady,
    StimulusShown { index: usize, target: bool },
    StimulusHidden,
    AttentionScored(AttentionTally),

    MemoryReady,
    MemoryLevel { level: u32 },
    TileOn(u8),
    TileOff(u8),
    MemoryAwaitingEcho { level: u32 },
    MemoryCorrect(u8),
    MemoryWrong(u8),

    StroopTrial { index: usize, word: InkColor, ink: InkColor },
    StroopAnswered { correct: bool },

    TimingReady,
    TimingStarted,
    TimingCancelled,
}

/// Go/No-Go counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttentionTally {
    pub hits: u32,
    pub misses: u32,
    pub false_clicks: u32,
    pub targets_shown: u32,
    pub non_targets_shown: u32,
}

/// A finalized measurement reported by exactly one step.
#[derive(Debug, Clone, PartialEq)]
pub enum Measurement {
    Questionnaire { score: u32 },
    Reaction { times_ms: Vec<Millis>, average_ms: f64 },
    Attention(AttentionTally),
    Memory { score: u32 },
    Stroop { correct: u32, trials: u32, score: f64 },
    TimeProduction { duration_secs: f64, diff_secs: f64 },
    Speech { analysis: String },
}

impl Measurement {
    /// The step that owns this kind of measurement.
    pub fn step(&self) -> Step {
        match self {
            Measurement::Questionnaire { .. } => Step::Questionnaire,
            Measurement::Reaction { .. } => Step::Reaction,
            Measurement::Attention(_) => Step::Attention,
            Measurement::Memory { .. } => Step::Memory,
            Measurement::Stroop { .. } => Step::Stroop,
            Measurement::TimeProduction { .. } => Step::TimeProduction,
            Measurement::Speech { .. } => Step::Speech,
        }
    }

    /// Fold this measurement into the aggregate. Only the orchestrator calls this.
    pub(crate) fn apply(self, result: &mut AggregateResult) {
        match self {
            Measurement::Questionnaire { score } => result.hyperactivity_score = score,
            Measurement::Reaction {
                times_ms,
                average_ms,
            } => {
                result.reaction_times = times_ms;
                result.avg_reaction_time = average_ms;
            }
            Measurement::Attention(tally) => {
                result.attention_hits = tally.hits;
                result.attention_misses = tally.misses;
                result.attention_false_clicks = tally.false_clicks;
            }
            Measurement::Memory { score } => result.memory_score = score,
            Measurement::Stroop { score, .. } => result.stroop_score = score,
            Measurement::TimeProduction { diff_secs, .. } => result.time_diff_seconds = diff_secs,
            Measurement::Speech { analysis } => result.audio_analysis = Some(analysis),
        }
    }
}

/// The aggregate payload sent to the analysis service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateResult {
    pub hyperactivity_score: u32,
    pub reaction_times: Vec<Millis>,
    pub avg_reaction_time: f64,
    pub attention_hits: u32,
    pub attention_misses: u32,
    pub attention_false_clicks: u32,
    pub memory_score: u32,
    pub stroop_score: f64,
    pub time_diff_seconds: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_analysis: Option<String>,
}

/// Timing and sizing constants of the battery.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatteryConfig {
    /// Reaction rounds per battery.
    pub reaction_rounds: usize,
    /// Lower bound of the random pre-stimulus delay (inclusive).
    pub reaction_min_delay_ms: Millis,
    /// Upper bound of the random pre-stimulus delay (exclusive).
    pub reaction_max_delay_ms: Millis,
    /// Total length of the go/no-go session.
    pub attention_duration_ms: Millis,
    /// Interval between stimulus onsets.
    pub attention_interval_ms: Millis,
    /// How long each stimulus stays visible.
    pub attention_visible_ms: Millis,
    /// Probability that a stimulus is a target.
    pub attention_target_probability: f64,
    /// Delay before each tile of a replayed sequence lights up.
    pub memory_onset_ms: Millis,
    /// How long each replayed tile stays lit.
    pub memory_highlight_ms: Millis,
    /// Pause between a correct echo and the next presentation.
    pub memory_level_pause_ms: Millis,
    /// Number of tiles in the memory grid.
    pub memory_tiles: u8,
    pub stroop_trials: usize,
    /// Interval the user tries to produce, in seconds.
    pub time_target_secs: f64,
    /// Insert the voice sample step before the report.
    pub include_speech: bool,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            reaction_rounds: 5,
            reaction_min_delay_ms: 1000,
            reaction_max_delay_ms: 3000,
            attention_duration_ms: 30_000,
            attention_interval_ms: 1500,
            attention_visible_ms: 1300,
            attention_target_probability: 0.7,
            memory_onset_ms: 300,
            memory_highlight_ms: 600,
            memory_level_pause_ms: 1000,
            memory_tiles: 9,
            stroop_trials: 5,
            time_target_secs: 10.0,
            include_speech: false,
        }
    }
}
