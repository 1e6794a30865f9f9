//! The `focuskit models` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use focuskit_providers::config::ProviderConfig;
use focuskit_providers::gemini::GeminiProvider;
use focuskit_providers::load_config_from;

pub async fn execute(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;

    let gemini = config
        .providers
        .get("gemini")
        .into_iter()
        .chain(config.providers.values())
        .find_map(|provider| match provider {
            ProviderConfig::Gemini {
                api_key,
                base_url,
                model,
            } => Some((api_key, base_url, model)),
            _ => None,
        });
    let Some((api_key, base_url, model)) = gemini else {
        println!("No Gemini provider configured. Run `focuskit init` to create a config file.");
        return Ok(());
    };
    anyhow::ensure!(
        !api_key.is_empty(),
        "gemini provider has no API key (set FOCUSKIT_GEMINI_KEY)"
    );

    let provider = GeminiProvider::new(api_key, base_url.clone(), Some(model.clone()))?;
    let models = provider.list_models().await?;

    if models.is_empty() {
        println!("No models available for generateContent with this key.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Model", "Name", "Description"]);
    for info in &models {
        let id = if &info.id == model {
            format!("{} (configured)", info.id)
        } else {
            info.id.clone()
        };
        table.add_row(vec![
            Cell::new(id),
            Cell::new(&info.display_name),
            Cell::new(&info.description),
        ]);
    }
    println!("{table}");

    Ok(())
}
