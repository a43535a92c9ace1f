use std::path::Path;

use crate::config::schema::Config;
use crate::error::ConfigError;
use crate::publisher::VIEWER_ASSET_FILES;

const SCHEMA_JSON: &str = include_str!("../../../../schema/config-v1.json");

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let config: Config = serde_json::from_value(json_value)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let compiled =
        jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
            message: format!("Failed to compile JSON schema: {}", e),
        })?;

    let error_messages: Vec<String> = compiled
        .iter_errors(json_value)
        .map(|e| format!("{} at {}", e, e.instance_path()))
        .collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    if config.worker_count == 0 {
        return Err(ConfigError::Validation {
            message: "worker_count must be at least 1".to_string(),
        });
    }

    // The viewer shell is resolved exactly once, here. Publish never
    // searches alternative locations or fetches assets remotely.
    let assets = config.viewer_assets();
    for file in VIEWER_ASSET_FILES {
        let path = assets.join(file);
        if !path.is_file() {
            return Err(ConfigError::MissingViewerAsset { path });
        }
    }

    Ok(())
}
