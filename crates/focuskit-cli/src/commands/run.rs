//! The `focuskit run` command.

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, watch};

use focuskit_core::clock::SystemClock;
use focuskit_core::driver::{run_step, BatteryObserver, Command, StepRun};
use focuskit_core::engine::Battery;
use focuskit_core::microtests::questionnaire::{MAX_ANSWER, QUESTIONS};
use focuskit_core::model::{InkColor, Input, Step};
use focuskit_core::report::SessionReport;
use focuskit_core::requestor::ReportRequestor;
use focuskit_core::speech::capture_speech;
use focuskit_providers::{create_speech_analyzer, load_config_from};

use super::display::TerminalObserver;
use super::{print_summary, save_report, select_provider};

pub struct RunArgs {
    pub config: Option<PathBuf>,
    pub seed: Option<u64>,
    pub output: Option<PathBuf>,
    pub audio: Option<PathBuf>,
    pub provider: Option<String>,
    pub offline: bool,
}

pub async fn execute(args: RunArgs) -> Result<()> {
    let mut config = load_config_from(args.config.as_deref())?;

    let audio = match &args.audio {
        Some(path) => Some(
            std::fs::read(path)
                .with_context(|| format!("failed to read audio: {}", path.display()))?,
        ),
        None => None,
    };
    if audio.is_some() {
        config.battery.include_speech = true;
    }

    let provider = select_provider(&config, args.provider.as_deref(), args.offline)?;
    let speech = create_speech_analyzer(&config)?;
    let output_dir = args.output.unwrap_or_else(|| config.output_dir.clone());

    let clock = Arc::new(SystemClock::new());
    let mut battery = match args.seed {
        Some(seed) => Battery::with_seed(config.battery.clone(), clock, seed),
        None => Battery::new(config.battery.clone(), clock),
    };

    let (step_tx, step_rx) = watch::channel(battery.current_step());
    let (command_tx, mut commands) = mpsc::channel(32);
    let tiles = config.battery.memory_tiles.max(2);
    // Blocking stdin reads cannot be cancelled, so they stay off the runtime.
    std::thread::spawn(move || read_commands(step_rx, command_tx, tiles));

    let observer = TerminalObserver;
    loop {
        let step = battery.current_step();
        step_tx.send_replace(step);
        show_cues(&mut battery, &observer);

        match step {
            Step::Intro => loop {
                match commands.recv().await {
                    Some(Command::Input {
                        step: Step::Intro,
                        input: Input::Press,
                    }) => break,
                    Some(_) => continue,
                    None => anyhow::bail!("input closed before the battery started"),
                }
            },
            Step::Speech => {
                let measurement = capture_speech(speech.as_deref(), audio.as_deref()).await;
                battery.complete_step(Step::Speech, measurement);
                show_cues(&mut battery, &observer);
            }
            Step::Report => break,
            _ => {
                if run_step(&mut battery, &mut commands, &observer).await == StepRun::InputClosed {
                    anyhow::bail!("input closed during the {step} step");
                }
            }
        }
        battery.advance(step)?;
    }

    let mut requestor = ReportRequestor::new(provider.clone(), config.retry_policy());
    let outcome = requestor
        .deliver(&mut battery)
        .await
        .context("the report was already requested")?;

    let report = SessionReport::new(battery.results().clone(), battery.now())
        .with_outcome(&outcome, provider.name());
    print_summary(&report);

    let path = save_report(&report, &output_dir)?;
    eprintln!("\nSession saved to: {}", path.display());

    Ok(())
}

fn show_cues(battery: &mut Battery, observer: &dyn BatteryObserver) {
    for cue in battery.drain_cues() {
        observer.on_cue(&cue);
    }
}

fn read_commands(step: watch::Receiver<Step>, commands: mpsc::Sender<Command>, tiles: u8) {
    let mut translator = LineTranslator::new(tiles);
    for line in std::io::stdin().lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!("failed to read stdin: {e}");
                break;
            }
        };
        let current = *step.borrow();
        match translator.translate(current, &line) {
            Ok(command) => {
                if commands.blocking_send(command).is_err() {
                    break;
                }
            }
            Err(message) => eprintln!("{message}"),
        }
    }
}

/// Turns terminal lines into battery commands for the step on screen.
struct LineTranslator {
    tiles: u8,
    step: Step,
    answered: usize,
}

impl LineTranslator {
    fn new(tiles: u8) -> Self {
        Self {
            tiles,
            step: Step::Intro,
            answered: 0,
        }
    }

    fn translate(&mut self, step: Step, line: &str) -> Result<Command, String> {
        if step != self.step {
            self.step = step;
            self.answered = 0;
        }
        let line = line.trim().to_lowercase();
        if line == "restart" {
            self.answered = 0;
            return Ok(Command::Restart { step });
        }

        let input = match step {
            Step::Questionnaire => {
                let value: u8 = line
                    .parse()
                    .ok()
                    .filter(|v| *v <= MAX_ANSWER)
                    .ok_or_else(|| format!("answer with a number from 0 to {MAX_ANSWER}"))?;
                if self.answered >= QUESTIONS.len() {
                    return Err("all questions are answered".to_string());
                }
                let question = self.answered;
                self.answered += 1;
                Input::Answer { question, value }
            }
            Step::Memory if !line.is_empty() => {
                let tile: u8 = line
                    .parse()
                    .ok()
                    .filter(|t| (1..=self.tiles).contains(t))
                    .ok_or_else(|| format!("enter a tile number from 1 to {}", self.tiles))?;
                Input::Tile(tile - 1)
            }
            Step::Stroop => Input::Color(line.parse::<InkColor>()?),
            _ => match line.as_str() {
                "" | "p" | "press" => Input::Press,
                "c" | "cancel" => Input::Cancel,
                other => return Err(format!("unrecognized input: {other}")),
            },
        };
        Ok(Command::Input { step, input })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(step: Step, input: Input) -> Command {
        Command::Input { step, input }
    }

    #[test]
    fn enter_is_a_press() {
        let mut t = LineTranslator::new(9);
        assert_eq!(
            t.translate(Step::Reaction, "").unwrap(),
            input(Step::Reaction, Input::Press)
        );
        assert_eq!(
            t.translate(Step::TimeProduction, " C ").unwrap(),
            input(Step::TimeProduction, Input::Cancel)
        );
        assert!(t.translate(Step::Attention, "x").is_err());
    }

    #[test]
    fn answers_go_to_questions_in_order() {
        let mut t = LineTranslator::new(9);
        assert_eq!(
            t.translate(Step::Questionnaire, "3").unwrap(),
            input(
                Step::Questionnaire,
                Input::Answer {
                    question: 0,
                    value: 3
                }
            )
        );
        assert!(t.translate(Step::Questionnaire, "5").is_err());
        assert_eq!(
            t.translate(Step::Questionnaire, "0").unwrap(),
            input(
                Step::Questionnaire,
                Input::Answer {
                    question: 1,
                    value: 0
                }
            )
        );

        assert_eq!(
            t.translate(Step::Questionnaire, "restart").unwrap(),
            Command::Restart {
                step: Step::Questionnaire
            }
        );
        assert_eq!(
            t.translate(Step::Questionnaire, "4").unwrap(),
            input(
                Step::Questionnaire,
                Input::Answer {
                    question: 0,
                    value: 4
                }
            )
        );
    }

    #[test]
    fn questionnaire_stops_after_last_question() {
        let mut t = LineTranslator::new(9);
        for _ in 0..QUESTIONS.len() {
            t.translate(Step::Questionnaire, "1").unwrap();
        }
        assert!(t.translate(Step::Questionnaire, "1").is_err());
    }

    #[test]
    fn memory_tiles_are_one_based() {
        let mut t = LineTranslator::new(9);
        assert_eq!(
            t.translate(Step::Memory, "1").unwrap(),
            input(Step::Memory, Input::Tile(0))
        );
        assert_eq!(
            t.translate(Step::Memory, "9").unwrap(),
            input(Step::Memory, Input::Tile(8))
        );
        assert!(t.translate(Step::Memory, "0").is_err());
        assert!(t.translate(Step::Memory, "10").is_err());
        assert_eq!(
            t.translate(Step::Memory, "").unwrap(),
            input(Step::Memory, Input::Press)
        );
    }

    #[test]
    fn stroop_accepts_color_names_and_initials() {
        let mut t = LineTranslator::new(9);
        assert_eq!(
            t.translate(Step::Stroop, "g").unwrap(),
            input(Step::Stroop, Input::Color(InkColor::Green))
        );
        assert_eq!(
            t.translate(Step::Stroop, "Blue").unwrap(),
            input(Step::Stroop, Input::Color(InkColor::Blue))
        );
        assert!(t.translate(Step::Stroop, "").is_err());
    }
}
