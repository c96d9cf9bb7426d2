//! Configuration loader for Strata.
//!
//! Reads `config.toml` from the data directory (`~/.strata/` by default) and
//! deserializes it into [`StrataConfig`]. Falls back to defaults when the
//! file is missing or malformed.

use std::path::{Path, PathBuf};

use secrecy::SecretString;

use strata_types::config::StrataConfig;

/// Environment variables checked, in order, for the Bedrock API key.
pub const API_KEY_VARS: [&str; 2] = ["STRATA_BEDROCK_API_KEY", "AWS_BEARER_TOKEN_BEDROCK"];

/// Resolve the data directory.
///
/// Priority:
/// 1. `STRATA_DATA_DIR` environment variable
/// 2. `~/.strata`
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("STRATA_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".strata");
    }

    // Last resort: current directory
    PathBuf::from(".strata")
}

/// Load configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`StrataConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
pub async fn load_config(data_dir: &Path) -> StrataConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return StrataConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return StrataConfig::default();
        }
    };

    match toml::from_str::<StrataConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("Failed to parse {}: {err}, using defaults", config_path.display());
            StrataConfig::default()
        }
    }
}

/// Directory buckets are mapped under.
pub fn blob_root(config: &StrataConfig, data_dir: &Path) -> PathBuf {
    config
        .storage
        .blob_root
        .clone()
        .unwrap_or_else(|| data_dir.join("blobs"))
}

/// LanceDB directory.
pub fn vector_path(config: &StrataConfig, data_dir: &Path) -> PathBuf {
    config
        .storage
        .vector_path
        .clone()
        .unwrap_or_else(|| data_dir.join("vectors"))
}

/// The Bedrock API key from the environment, if set and non-empty.
pub fn bedrock_api_key() -> Option<SecretString> {
    API_KEY_VARS
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|value| !value.trim().is_empty())
        .map(|value| SecretString::from(value.trim().to_string()))
}
