//! Optional voice-sample step.
//!
//! Audio capture itself lives outside the core. The host hands over the
//! recorded bytes (or nothing, when microphone access was refused) and this
//! module turns the outcome into the step's measurement. Every path produces
//! a measurement so the battery can always move on.

use crate::model::Measurement;
use crate::traits::SpeechAnalyzer;

pub const PERMISSION_DENIED_TEXT: &str =
    "Audio analysis skipped: microphone access was not granted.";
pub const UNAVAILABLE_TEXT: &str = "Audio analysis unavailable: the speech service did not respond.";

/// Analyze a voice sample, substituting placeholder text on denial or failure.
pub async fn capture_speech(
    analyzer: Option<&dyn SpeechAnalyzer>,
    audio: Option<&[u8]>,
) -> Measurement {
    let Some(audio) = audio.filter(|a| !a.is_empty()) else {
        tracing::info!("no audio sample, speech step skipped");
        return placeholder(PERMISSION_DENIED_TEXT);
    };
    let Some(analyzer) = analyzer else {
        tracing::warn!("no speech analyzer configured");
        return placeholder(UNAVAILABLE_TEXT);
    };

    match analyzer.analyze_audio(audio).await {
        Ok(analysis) => {
            tracing::info!(analyzer = analyzer.name(), bytes = audio.len(), "speech analyzed");
            Measurement::Speech { analysis }
        }
        Err(e) => {
            tracing::warn!(analyzer = analyzer.name(), "speech analysis failed: {e:#}");
            placeholder(UNAVAILABLE_TEXT)
        }
    }
}

fn placeholder(text: &str) -> Measurement {
    Measurement::Speech {
        analysis: text.to_string(),
    }
}
