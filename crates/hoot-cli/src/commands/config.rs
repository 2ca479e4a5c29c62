/// Configuration management command handlers
use anyhow::Result;
use clap::Subcommand;
use hoot_ai::AiService;
use hoot_core::{
    config::{DB_FILE, SETTINGS_FILE},
    Settings,
};
use hoot_storage::{AiConfig, Database};
use std::path::Path;

use super::helpers::print_rule;

const AI_FIELDS: &[&str] = &[
    "api_key",
    "model",
    "base_url",
    "max_output_tokens",
    "temperature",
    "enabled",
];

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Get a configuration value (e.g. ai.model)
    Get { key: String },
    /// Set a configuration value (e.g. ai.api_key <KEY>)
    Set { key: String, value: String },
    /// Reset a configuration value to its default
    Unset { key: String },
    /// List all configuration
    List,
    /// Send a test prompt to the configured model
    Test,
}

pub async fn handle_config_command(data_dir: &Path, action: ConfigAction) -> Result<()> {
    let db = Database::new(Some(data_dir.join(DB_FILE)))?;
    match action {
        ConfigAction::Get { key } => handle_config_get(&db, &key),
        ConfigAction::Set { key, value } => handle_config_set(&db, &key, &value),
        ConfigAction::Unset { key } => handle_config_unset(&db, &key),
        ConfigAction::List => handle_config_list(&db, data_dir),
        ConfigAction::Test => handle_config_test(&db).await,
    }
}

fn handle_config_get(db: &Database, key: &str) -> Result<()> {
    let field = ai_field(key)?;
    match ai_value(&db.get_ai_config()?, field) {
        Some(v) => println!("{key} = {v}"),
        None => println!("{key} is not set"),
    }
    Ok(())
}

fn handle_config_set(db: &Database, key: &str, value: &str) -> Result<()> {
    let field = ai_field(key)?;
    db.update_ai_config_field(field, Some(value))?;
    if field == "api_key" {
        println!("Set {key}");
    } else {
        println!("Set {key} = {value}");
    }
    Ok(())
}

fn handle_config_unset(db: &Database, key: &str) -> Result<()> {
    let field = ai_field(key)?;
    let default = (field == "enabled").then_some("true");
    db.update_ai_config_field(field, default)?;
    println!("Reset {key}");
    Ok(())
}

fn handle_config_list(db: &Database, data_dir: &Path) -> Result<()> {
    let config = db.get_ai_config()?;

    println!("Configuration:");
    print_rule();

    println!("\n[ai]");
    for field in AI_FIELDS {
        let value = ai_value(&config, field).unwrap_or_else(|| "(not set)".to_string());
        println!("  {field} = {value}");
    }
    if config.api_key.is_none() && config.effective_api_key().is_some() {
        println!("  (api key taken from GEMINI_API_KEY)");
    }

    let settings_path = data_dir.join(SETTINGS_FILE);
    let settings = Settings::load(&settings_path)?;
    println!("\n[blocking] ({})", settings_path.display());
    println!("  baseline = {}", settings.blocking.baseline.join(", "));
    println!("  video_host = {}", settings.blocking.video_host);
    println!("  block_page = {}", settings.blocking.block_page);
    println!("  ai_extension = {}", settings.blocking.ai_extension);
    println!("\n[daemon]");
    println!(
        "  tick_interval_seconds = {}",
        settings.daemon.tick_interval_seconds
    );
    println!("\n[classifier]");
    println!("  dedup_capacity = {}", settings.classifier.dedup_capacity);
    println!("  timeout_seconds = {}", settings.classifier.timeout_seconds);

    Ok(())
}

async fn handle_config_test(db: &Database) -> Result<()> {
    let service = AiService::new(&db.get_ai_config()?)?;
    println!("Testing {}...", service.model_name());
    service.test_connection().await?;
    println!("Connection OK.");
    Ok(())
}

fn ai_field(key: &str) -> Result<&str> {
    let Some(("ai", field)) = key.split_once('.') else {
        anyhow::bail!("Invalid key format. Use: ai.<field> (e.g., ai.api_key)");
    };
    if !AI_FIELDS.contains(&field) {
        anyhow::bail!(
            "Unknown field: {field}. Valid fields: {}",
            AI_FIELDS.join(", ")
        );
    }
    Ok(field)
}

fn ai_value(config: &AiConfig, field: &str) -> Option<String> {
    match field {
        "api_key" => config.masked_api_key(),
        "model" => Some(config.effective_model().to_string()),
        "base_url" => Some(config.effective_base_url().to_string()),
        "max_output_tokens" => Some(config.max_output_tokens.to_string()),
        "temperature" => Some(config.temperature.to_string()),
        "enabled" => Some(config.enabled.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ai_field_parsing() {
        assert_eq!(ai_field("ai.model").unwrap(), "model");
        assert!(ai_field("model").is_err());
        assert!(ai_field("plane.api_key").is_err());
        assert!(ai_field("ai.colour").is_err());
    }

    #[test]
    fn test_ai_value_masks_key() {
        let config = AiConfig {
            api_key: Some("AIzaSyExampleKey123".to_string()),
            ..AiConfig::default()
        };
        assert_eq!(ai_value(&config, "api_key").unwrap(), "AIzaSyEx***");
        assert_eq!(ai_value(&config, "model").unwrap(), "gemini-2.5-flash");
    }

    #[test]
    fn test_set_and_unset_round_trip() {
        let db = Database::in_memory().unwrap();
        handle_config_set(&db, "ai.max_output_tokens", "256").unwrap();
        handle_config_set(&db, "ai.enabled", "false").unwrap();
        let config = db.get_ai_config().unwrap();
        assert_eq!(config.max_output_tokens, 256);
        assert!(!config.enabled);

        handle_config_unset(&db, "ai.max_output_tokens").unwrap();
        handle_config_unset(&db, "ai.enabled").unwrap();
        let config = db.get_ai_config().unwrap();
        assert_eq!(config.max_output_tokens, 1024);
        assert!(config.enabled);
    }
}
