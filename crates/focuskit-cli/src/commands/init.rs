//! The `focuskit init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("focuskit.toml").exists() {
        println!("focuskit.toml already exists, skipping.");
    } else {
        std::fs::write("focuskit.toml", SAMPLE_CONFIG)?;
        println!("Created focuskit.toml");
    }

    println!("\nNext steps:");
    println!("  1. Set FOCUSKIT_GEMINI_KEY or edit focuskit.toml");
    println!("  2. Try it offline: focuskit simulate --offline");
    println!("  3. Take the battery: focuskit run");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# focuskit configuration

default_provider = "gemini"
max_retries = 2
retry_delay_ms = 1000
output_dir = "./focuskit-sessions"

[providers.gemini]
type = "gemini"
api_key = "${FOCUSKIT_GEMINI_KEY}"
model = "gemini-1.5-flash"

# A self-hosted analysis service answering POST /analyze with {"analysis": "..."}
# [providers.remote]
# type = "remote"
# base_url = "http://localhost:3000"

[providers.mock]
type = "mock"

# Enables the voice sample step when `focuskit run --audio` is used
# [speech]
# base_url = "http://localhost:3000"

[battery]
reaction_rounds = 5
attention_duration_ms = 30000
memory_tiles = 9
stroop_trials = 5
time_target_secs = 10.0
include_speech = false
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use focuskit_providers::FocuskitConfig;

    #[test]
    fn sample_config_parses() {
        let config: FocuskitConfig = toml::from_str(SAMPLE_CONFIG).unwrap();
        assert_eq!(config.default_provider, "gemini");
        assert_eq!(config.providers.len(), 2);
        assert_eq!(config.battery.reaction_rounds, 5);
    }
}
