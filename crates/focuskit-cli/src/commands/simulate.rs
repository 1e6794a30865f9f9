//! The `focuskit simulate` command.

use std::path::PathBuf;

use anyhow::Result;

use focuskit_core::report::SessionReport;
use focuskit_core::requestor::ReportRequestor;
use focuskit_core::simulate::{simulate_battery, ParticipantProfile};
use focuskit_providers::load_config_from;

use super::display::describe;
use super::{print_summary, save_report, select_provider};

pub async fn execute(
    profile: ParticipantProfile,
    seed: u64,
    output: Option<PathBuf>,
    transcript: bool,
    provider_name: Option<String>,
    offline: bool,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let provider = select_provider(&config, provider_name.as_deref(), offline)?;
    let output_dir = output.unwrap_or_else(|| config.output_dir.clone());

    eprintln!("Simulating a {profile} participant (seed {seed})...");
    let session = simulate_battery(config.battery.clone(), profile, seed)?;

    if transcript {
        for cue in &session.transcript {
            if let Some(line) = describe(cue) {
                println!("{line}");
            }
        }
        println!();
    }

    let mut requestor = ReportRequestor::new(provider.clone(), config.retry_policy());
    let outcome = requestor.request(&session.results).await;

    let report = SessionReport::new(session.results, session.elapsed_ms)
        .with_outcome(&outcome, provider.name());
    print_summary(&report);

    let path = save_report(&report, &output_dir)?;
    eprintln!("\nSession saved to: {}", path.display());

    Ok(())
}
