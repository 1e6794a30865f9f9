pub mod analyze;
pub mod display;
pub mod init;
pub mod models;
pub mod run;
pub mod simulate;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use comfy_table::{Cell, Table};

use focuskit_core::microtests::questionnaire::MAX_SCORE;
use focuskit_core::report::SessionReport;
use focuskit_core::requestor::FALLBACK_MESSAGE;
use focuskit_core::traits::AnalysisProvider;
use focuskit_providers::mock::MockAnalysisProvider;
use focuskit_providers::{provider_by_name, FocuskitConfig};

/// Resolve the analysis provider for a command.
///
/// `--offline` wins over everything, then `--provider`, then the config default.
pub(crate) fn select_provider(
    config: &FocuskitConfig,
    name: Option<&str>,
    offline: bool,
) -> Result<Arc<dyn AnalysisProvider>> {
    if offline {
        return Ok(Arc::new(MockAnalysisProvider::offline()));
    }
    let name = name.unwrap_or(&config.default_provider);
    Ok(Arc::from(provider_by_name(config, name)?))
}

/// Write the report as `session-<timestamp>-<id>.json` under `dir`.
pub(crate) fn save_report(report: &SessionReport, dir: &Path) -> Result<PathBuf> {
    let timestamp = report.created_at.format("%Y-%m-%dT%H%M%S");
    let short_id: String = report.id.simple().to_string().chars().take(8).collect();
    let path = dir.join(format!("session-{timestamp}-{short_id}.json"));
    report.save_json(&path)?;
    Ok(path)
}

pub(crate) fn print_summary(report: &SessionReport) {
    let r = &report.results;
    let ind = &report.indicators;
    let mark = |present: bool| if present { "yes" } else { "no" };

    let mut table = Table::new();
    table.set_header(vec!["Test", "Result", "Indicator"]);
    table.add_row(vec![
        Cell::new("Questionnaire"),
        Cell::new(format!("{} / {MAX_SCORE}", r.hyperactivity_score)),
        Cell::new(mark(ind.questionnaire)),
    ]);
    table.add_row(vec![
        Cell::new("Reaction time"),
        Cell::new(format!("{:.0} ms", r.avg_reaction_time)),
        Cell::new(mark(ind.reaction_time)),
    ]);
    table.add_row(vec![
        Cell::new("Attention"),
        Cell::new(format!(
            "{} hits / {} misses / {} false",
            r.attention_hits, r.attention_misses, r.attention_false_clicks
        )),
        Cell::new(mark(ind.attention)),
    ]);
    table.add_row(vec![
        Cell::new("Sequence memory"),
        Cell::new(format!("level {}", r.memory_score)),
        Cell::new(mark(ind.memory)),
    ]);
    table.add_row(vec![
        Cell::new("Stroop"),
        Cell::new(format!("{:.0}%", r.stroop_score)),
        Cell::new("-"),
    ]);
    table.add_row(vec![
        Cell::new("Time production"),
        Cell::new(format!("{:+.2} s", r.time_diff_seconds)),
        Cell::new("-"),
    ]);
    println!("{table}");

    let mut chart = Table::new();
    chart.set_header(vec!["Focus", "Memory", "Inhibition", "Time"]);
    chart.add_row(vec![
        Cell::new(format!("{:.0}", report.chart.focus)),
        Cell::new(format!("{:.0}", report.chart.memory)),
        Cell::new(format!("{:.0}", report.chart.inhibition)),
        Cell::new(format!("{:.0}", report.chart.time)),
    ]);
    println!("{chart}");

    println!("\nPattern: {} ({} of 4 indicators)\n", ind.level, ind.count);

    match &report.narrative {
        Some(narrative) => println!("{narrative}"),
        None => {
            println!("{FALLBACK_MESSAGE}");
            println!("{}", ind.level.interpretation());
        }
    }

    if let Some(audio) = &r.audio_analysis {
        println!("\nVoice sample: {audio}");
    }
}
