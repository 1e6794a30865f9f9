//! focuskit-providers: Analysis and speech service integrations.
//!
//! Implements the `AnalysisProvider` trait for a remote analysis endpoint,
//! Google Gemini and an offline mock, plus the HTTP speech analyzer.

pub mod config;
pub mod gemini;
mod http;
pub mod mock;
pub mod remote;
pub mod speech;

pub use config::{
    create_provider, create_speech_analyzer, load_config, load_config_from, provider_by_name,
    FocuskitConfig, ProviderConfig, SpeechConfig,
};
pub use focuskit_core::error::ProviderError;
