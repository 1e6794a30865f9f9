//! Configuration loading and provider factory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use focuskit_core::model::BatteryConfig;
use focuskit_core::requestor::RetryPolicy;
use focuskit_core::traits::{AnalysisProvider, SpeechAnalyzer};

use crate::gemini::{GeminiProvider, DEFAULT_MODEL};
use crate::mock::MockAnalysisProvider;
use crate::remote::RemoteProvider;
use crate::speech::HttpSpeechAnalyzer;

/// Configuration for a single analysis provider.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    Remote {
        base_url: String,
    },
    Gemini {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default = "default_gemini_model")]
        model: String,
    },
    Mock {
        #[serde(default)]
        response: Option<String>,
    },
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::Remote { base_url } => f
                .debug_struct("Remote")
                .field("base_url", base_url)
                .finish(),
            ProviderConfig::Gemini {
                api_key: _,
                base_url,
                model,
            } => f
                .debug_struct("Gemini")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .field("model", model)
                .finish(),
            ProviderConfig::Mock { response } => f
                .debug_struct("Mock")
                .field("response", response)
                .finish(),
        }
    }
}

fn default_gemini_model() -> String {
    DEFAULT_MODEL.to_string()
}

/// Speech-analysis service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    pub base_url: String,
}

/// Top-level focuskit configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FocuskitConfig {
    /// Provider configurations keyed by name.
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    /// Provider used for the report.
    #[serde(default = "default_provider")]
    pub default_provider: String,
    /// Retries after a failed analysis request.
    #[serde(default = "default_retries")]
    pub max_retries: u32,
    /// Initial delay between retries in milliseconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
    /// Where session reports are written.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub speech: Option<SpeechConfig>,
    /// Battery timing overrides.
    #[serde(default)]
    pub battery: BatteryConfig,
}

fn default_provider() -> String {
    "gemini".to_string()
}
fn default_retries() -> u32 {
    2
}
fn default_retry_delay() -> u64 {
    1000
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./focuskit-sessions")
}

impl Default for FocuskitConfig {
    fn default() -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider(),
            max_retries: default_retries(),
            retry_delay_ms: default_retry_delay(),
            output_dir: default_output_dir(),
            speech: None,
            battery: BatteryConfig::default(),
        }
    }
}

impl FocuskitConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            initial_delay: Duration::from_millis(self.retry_delay_ms),
            ..RetryPolicy::default()
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Substituted values are inserted verbatim and never re-scanned.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        result.push_str(&rest[..start]);
        let var_name = &rest[start + 2..start + end];
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

/// Resolve env vars in a provider config.
fn resolve_provider_config(config: &ProviderConfig) -> ProviderConfig {
    match config {
        ProviderConfig::Remote { base_url } => ProviderConfig::Remote {
            base_url: resolve_env_vars(base_url),
        },
        ProviderConfig::Gemini {
            api_key,
            base_url,
            model,
        } => ProviderConfig::Gemini {
            api_key: resolve_env_vars(api_key),
            base_url: base_url.as_ref().map(|u| resolve_env_vars(u)),
            model: model.clone(),
        },
        ProviderConfig::Mock { response } => ProviderConfig::Mock {
            response: response.clone(),
        },
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `focuskit.toml` in the current directory
/// 2. `~/.config/focuskit/config.toml`
///
/// Environment variable override: `FOCUSKIT_GEMINI_KEY`.
pub fn load_config() -> Result<FocuskitConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<FocuskitConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("focuskit.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<FocuskitConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => FocuskitConfig::default(),
    };

    // Apply env var overrides
    if let Ok(key) = std::env::var("FOCUSKIT_GEMINI_KEY") {
        config
            .providers
            .entry("gemini".into())
            .or_insert(ProviderConfig::Gemini {
                api_key: String::new(),
                base_url: None,
                model: default_gemini_model(),
            });
        if let Some(ProviderConfig::Gemini { api_key, .. }) = config.providers.get_mut("gemini") {
            *api_key = key;
        }
    }

    // Resolve env vars in all provider configs
    let resolved: HashMap<String, ProviderConfig> = config
        .providers
        .iter()
        .map(|(k, v)| (k.clone(), resolve_provider_config(v)))
        .collect();
    config.providers = resolved;
    if let Some(speech) = config.speech.as_mut() {
        speech.base_url = resolve_env_vars(&speech.base_url);
    }

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("focuskit"))
}

/// Create a provider instance from its configuration.
///
/// `battery` supplies the test parameters the prompt describes.
pub fn create_provider(
    config: &ProviderConfig,
    battery: &BatteryConfig,
) -> Result<Box<dyn AnalysisProvider>> {
    match config {
        ProviderConfig::Remote { base_url } => Ok(Box::new(RemoteProvider::new(base_url)?)),
        ProviderConfig::Gemini {
            api_key,
            base_url,
            model,
        } => {
            if api_key.is_empty() {
                anyhow::bail!("gemini provider has no API key (set FOCUSKIT_GEMINI_KEY)");
            }
            Ok(Box::new(
                GeminiProvider::new(api_key, base_url.clone(), Some(model.clone()))?
                    .with_time_target(battery.time_target_secs),
            ))
        }
        ProviderConfig::Mock { response } => Ok(Box::new(match response {
            Some(text) => MockAnalysisProvider::with_fixed_response(text),
            None => MockAnalysisProvider::offline(),
        })),
    }
}

/// Look up a provider by name. `mock` is always available.
pub fn provider_by_name(config: &FocuskitConfig, name: &str) -> Result<Box<dyn AnalysisProvider>> {
    match config.providers.get(name) {
        Some(provider_config) => create_provider(provider_config, &config.battery)
            .with_context(|| format!("failed to create provider '{name}'")),
        None if name == "mock" => Ok(Box::new(MockAnalysisProvider::offline())),
        None => anyhow::bail!(
            "provider '{name}' is not configured; add [providers.{name}] to focuskit.toml or run offline"
        ),
    }
}

/// The speech analyzer, when a speech service is configured.
pub fn create_speech_analyzer(config: &FocuskitConfig) -> Result<Option<Box<dyn SpeechAnalyzer>>> {
    match &config.speech {
        Some(speech) => Ok(Some(Box::new(HttpSpeechAnalyzer::new(&speech.base_url)?))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_FOCUSKIT_TEST_VAR", "hello");
        assert_eq!(resolve_env_vars("${_FOCUSKIT_TEST_VAR}"), "hello");
        assert_eq!(
            resolve_env_vars("prefix_${_FOCUSKIT_TEST_VAR}_suffix"),
            "prefix_hello_suffix"
        );
        assert_eq!(resolve_env_vars("${unterminated"), "${unterminated");
        std::env::remove_var("_FOCUSKIT_TEST_VAR");
    }

    #[test]
    fn resolve_env_vars_keeps_references_inside_values() {
        std::env::set_var("_FOCUSKIT_TEST_SELF", "a${_FOCUSKIT_TEST_SELF}b");
        std::env::set_var("_FOCUSKIT_TEST_OTHER", "${_FOCUSKIT_TEST_SELF}");
        assert_eq!(
            resolve_env_vars("${_FOCUSKIT_TEST_SELF}"),
            "a${_FOCUSKIT_TEST_SELF}b"
        );
        assert_eq!(
            resolve_env_vars("x${_FOCUSKIT_TEST_OTHER}y${_FOCUSKIT_TEST_SELF}"),
            "x${_FOCUSKIT_TEST_SELF}ya${_FOCUSKIT_TEST_SELF}b"
        );
        assert_eq!(resolve_env_vars("${_FOCUSKIT_TEST_UNSET_VAR}!"), "!");
        std::env::remove_var("_FOCUSKIT_TEST_SELF");
        std::env::remove_var("_FOCUSKIT_TEST_OTHER");
    }

    #[test]
    fn default_config() {
        let config = FocuskitConfig::default();
        assert_eq!(config.default_provider, "gemini");
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.retry_policy().initial_delay, Duration::from_secs(1));
        assert_eq!(config.retry_policy().max_delay, Duration::from_secs(30));
        assert_eq!(config.battery.reaction_rounds, 5);
    }

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
default_provider = "remote"
max_retries = 4
output_dir = "out"

[providers.remote]
type = "remote"
base_url = "http://localhost:5000"

[providers.gemini]
type = "gemini"
api_key = "g-key"

[providers.offline]
type = "mock"
response = "fine"

[speech]
base_url = "http://localhost:7000"

[battery]
reaction_rounds = 3
include_speech = true
"#;
        let config: FocuskitConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.providers.len(), 3);
        assert_eq!(config.default_provider, "remote");
        assert_eq!(config.max_retries, 4);
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert!(matches!(
            config.providers.get("gemini"),
            Some(ProviderConfig::Gemini { model, .. }) if model == "gemini-1.5-flash"
        ));
        assert_eq!(config.battery.reaction_rounds, 3);
        assert!(config.battery.include_speech);
        assert_eq!(config.battery.attention_duration_ms, 30_000);
        assert_eq!(config.speech.unwrap().base_url, "http://localhost:7000");
    }

    #[test]
    fn debug_masks_api_key() {
        let config = ProviderConfig::Gemini {
            api_key: "super-secret".into(),
            base_url: None,
            model: "gemini-1.5-flash".into(),
        };
        let printed = format!("{config:?}");
        assert!(!printed.contains("super-secret"));
        assert!(printed.contains("***"));
    }

    #[test]
    fn load_from_file_resolves_env() {
        std::env::set_var("_FOCUSKIT_TEST_URL", "http://analysis.local");
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("focuskit.toml");
        std::fs::write(
            &path,
            "[providers.remote]\ntype = \"remote\"\nbase_url = \"${_FOCUSKIT_TEST_URL}\"\n",
        )
        .unwrap();

        let config = load_config_from(Some(&path)).unwrap();
        assert!(matches!(
            config.providers.get("remote"),
            Some(ProviderConfig::Remote { base_url }) if base_url == "http://analysis.local"
        ));
        std::env::remove_var("_FOCUSKIT_TEST_URL");
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let err = load_config_from(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn provider_lookup() {
        let mut config = FocuskitConfig::default();
        assert_eq!(provider_by_name(&config, "mock").unwrap().name(), "mock");
        let err = provider_by_name(&config, "gemini").err().unwrap();
        assert!(err.to_string().contains("not configured"));

        config.providers.insert(
            "gemini".into(),
            ProviderConfig::Gemini {
                api_key: String::new(),
                base_url: None,
                model: default_gemini_model(),
            },
        );
        assert!(provider_by_name(&config, "gemini").is_err());

        config.providers.insert(
            "remote".into(),
            ProviderConfig::Remote {
                base_url: "http://localhost:5000".into(),
            },
        );
        assert_eq!(provider_by_name(&config, "remote").unwrap().name(), "remote");
    }
}
