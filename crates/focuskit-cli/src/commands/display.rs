//! Plain-text rendering of display cues.

use focuskit_core::driver::BatteryObserver;
use focuskit_core::microtests::questionnaire::{LIKERT_LABELS, QUESTIONS};
use focuskit_core::model::{Cue, Step};

/// Prints cues to stdout as they arrive.
pub struct TerminalObserver;

impl BatteryObserver for TerminalObserver {
    fn on_cue(&self, cue: &Cue) {
        if let Some(line) = describe(cue) {
            println!("{line}");
        }
    }
}

/// What a participant sees for a cue, or `None` for cues with no text.
pub fn describe(cue: &Cue) -> Option<String> {
    let text = match cue {
        Cue::StepEntered(step) => format!("\n== {} ==\n{}", title(*step), instructions(*step)),
        Cue::StepCompleted(step) => format!("{} complete.", title(*step)),

        Cue::QuestionAnswered { answered, total } => {
            let question = QUESTIONS.get(*answered)?;
            let scale: Vec<String> = LIKERT_LABELS
                .iter()
                .enumerate()
                .map(|(value, label)| format!("{value} {label}"))
                .collect();
            format!(
                "Question {}/{}: {}\n  [{}]",
                answered + 1,
                total,
                question,
                scale.join(" | ")
            )
        }

        Cue::ReactionReady => "Press Enter to start.".to_string(),
        Cue::ReactionWait { round } => format!("Round {round}: wait for GO..."),
        Cue::ReactionGo => "GO!".to_string(),
        Cue::ReactionEarly => "Too early! Wait for GO.".to_string(),
        Cue::ReactionRecorded { round, elapsed_ms } => {
            format!("Round {round}: {elapsed_ms} ms")
        }

        Cue::AttentionReady => "Press Enter to start.".to_string(),
        Cue::StimulusShown { target: true, .. } => "[ GREEN ]  press!".to_string(),
        Cue::StimulusShown { target: false, .. } => "[  RED  ]  hold".to_string(),
        Cue::StimulusHidden => return None,
        Cue::AttentionScored(tally) => format!(
            "  hits {} / false clicks {}",
            tally.hits, tally.false_clicks
        ),

        Cue::MemoryReady => "Press Enter to start.".to_string(),
        Cue::MemoryLevel { level } => format!("Level {level}: watch the sequence."),
        Cue::TileOn(tile) => format!("  tile {}", tile + 1),
        Cue::TileOff(_) => return None,
        Cue::MemoryAwaitingEcho { level } => {
            format!("Your turn: enter the {level} tile(s), one per line.")
        }
        Cue::MemoryCorrect(tile) => format!("  {} ok", tile + 1),
        Cue::MemoryWrong(tile) => format!("  {} wrong", tile + 1),

        Cue::StroopTrial { index, word, ink } => format!(
            "Trial {}: the word {} printed in {} ink. Ink color? (r/g/b)",
            index + 1,
            word.to_string().to_uppercase(),
            ink
        ),
        Cue::StroopAnswered { correct: true } => "  correct".to_string(),
        Cue::StroopAnswered { correct: false } => "  wrong".to_string(),

        Cue::TimingReady => "Press Enter to start the clock.".to_string(),
        Cue::TimingStarted => "Timing... press Enter when you think the time is up.".to_string(),
        Cue::TimingCancelled => "Cancelled.".to_string(),
    };
    Some(text)
}

fn title(step: Step) -> &'static str {
    match step {
        Step::Intro => "focuskit",
        Step::Questionnaire => "Questionnaire",
        Step::Reaction => "Reaction time",
        Step::Attention => "Go / No-Go",
        Step::Memory => "Sequence memory",
        Step::Stroop => "Stroop",
        Step::TimeProduction => "Time production",
        Step::Speech => "Voice sample",
        Step::Report => "Report",
    }
}

fn instructions(step: Step) -> &'static str {
    match step {
        Step::Intro => {
            "A short battery of attention and memory tasks. This is not a diagnosis.\n\
             Type `restart` during a test to start it over. Press Enter to begin."
        }
        Step::Questionnaire => "Answer each question with a number from 0 to 4.",
        Step::Reaction => "Press Enter as soon as you see GO.",
        Step::Attention => "Press Enter for GREEN only. Let RED pass.",
        Step::Memory => "Watch the tiles light up, then repeat them in order.",
        Step::Stroop => "Name the ink color, not the word.",
        Step::TimeProduction => "Start the clock, then stop it when you think the target time has passed.\nDo not count aloud.",
        Step::Speech => "Analyzing the voice sample...",
        Step::Report => "Preparing your summary...",
    }
}
