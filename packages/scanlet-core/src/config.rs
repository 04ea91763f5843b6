//! Application configuration.
//!
//! Settings are resolved with priority:
//! 1. Environment variables (`SCANLET_*`)
//! 2. Config file (`~/.config/scanlet/config.toml`)
//! 3. Default values

use crate::error::ConfigError;
use crate::storage::StorageBackend;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Ad network's public test interstitial unit. Safe to request in development.
pub const DEFAULT_AD_UNIT_ID: &str = "ca-app-pub-3940256099942544/1033173712";

const ENV_AD_UNIT_ID: &str = "SCANLET_AD_UNIT_ID";
const ENV_ADS_ENABLED: &str = "SCANLET_ADS_ENABLED";
const ENV_STORAGE: &str = "SCANLET_STORAGE";
const ENV_CONFIG_DIR: &str = "SCANLET_CONFIG_DIR";

const CONFIG_FILE: &str = "config.toml";

/// Configuration file structure
#[derive(Debug, Deserialize, Default)]
struct ConfigFile {
    ads: Option<AdsSection>,
    storage: Option<StorageSection>,
}

#[derive(Debug, Deserialize, Default)]
struct AdsSection {
    unit_id: Option<String>,
    enabled: Option<bool>,
    keywords: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Default)]
struct StorageSection {
    backend: Option<StorageBackend>,
}

/// Runtime ad configuration
#[derive(Debug, Clone)]
pub struct AdConfig {
    /// Interstitial unit id handed to the ad network
    pub unit_id: String,
    /// Master switch; hosts AND this with their own enabling condition
    pub enabled: bool,
    /// Contextual keywords attached to every request
    pub keywords: Vec<String>,
    /// Where `unit_id` came from (for logging)
    pub source: ConfigSource,
}

/// Runtime application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub ads: AdConfig,
    pub storage: StorageBackend,
    /// Directory holding `config.toml` and file-backed preferences
    pub config_dir: PathBuf,
}

/// Where the configuration came from
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    /// Using default hardcoded values
    Default,
    /// Loaded from environment variable
    Environment,
    /// Loaded from config file
    ConfigFile,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::ConfigFile => write!(f, "config file"),
        }
    }
}

/// Get the scanlet config directory
pub fn config_dir() -> PathBuf {
    config_dir_with(|key| std::env::var(key).ok())
}

fn config_dir_with(env: impl Fn(&str) -> Option<String>) -> PathBuf {
    if let Some(dir) = env(ENV_CONFIG_DIR).filter(|d| !d.trim().is_empty()) {
        return PathBuf::from(dir.trim());
    }

    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("scanlet")
}

/// Load configuration from the config file
fn load_config_file(dir: &Path) -> Result<Option<ConfigFile>, ConfigError> {
    let path = dir.join(CONFIG_FILE);

    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(&path)?;
    let config = toml::from_str(&content)?;
    tracing::debug!("Loaded config from {:?}", path);
    Ok(Some(config))
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        }),
    }
}

/// Load the application configuration from the process environment and the
/// default config directory. Never fails: unreadable sources are logged and
/// skipped.
pub fn load_app_config() -> AppConfig {
    load_app_config_with(|key| std::env::var(key).ok())
}

/// Same as [`load_app_config`] with an injectable environment lookup.
pub fn load_app_config_with(env: impl Fn(&str) -> Option<String>) -> AppConfig {
    let dir = config_dir_with(&env);

    let file = match load_config_file(&dir) {
        Ok(file) => file.unwrap_or_default(),
        Err(e) => {
            tracing::warn!("Ignoring config file in {:?}: {}", dir, e);
            ConfigFile::default()
        }
    };
    let ads_file = file.ads.unwrap_or_default();

    // Ad unit id
    let env_unit = env(ENV_AD_UNIT_ID)
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty());
    let file_unit = ads_file
        .unit_id
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty());

    let (unit_id, source) = if let Some(unit) = env_unit {
        tracing::info!("Using ad unit id from environment variable: {}", unit);
        (unit, ConfigSource::Environment)
    } else if let Some(unit) = file_unit {
        tracing::info!("Using ad unit id from config file: {}", unit);
        (unit, ConfigSource::ConfigFile)
    } else {
        tracing::debug!("Using default ad unit id: {}", DEFAULT_AD_UNIT_ID);
        (DEFAULT_AD_UNIT_ID.to_string(), ConfigSource::Default)
    };

    // Enabled flag
    let mut enabled = ads_file.enabled.unwrap_or(true);
    if let Some(raw) = env(ENV_ADS_ENABLED) {
        match parse_bool(ENV_ADS_ENABLED, &raw) {
            Ok(value) => enabled = value,
            Err(e) => tracing::warn!("{}", e),
        }
    }

    // Storage backend
    let mut storage = file
        .storage
        .and_then(|s| s.backend)
        .unwrap_or(StorageBackend::Keyring);
    if let Some(raw) = env(ENV_STORAGE) {
        match raw.parse() {
            Ok(backend) => storage = backend,
            Err(_) => tracing::warn!(
                "{}",
                ConfigError::InvalidValue {
                    key: ENV_STORAGE,
                    value: raw,
                }
            ),
        }
    }

    AppConfig {
        ads: AdConfig {
            unit_id,
            enabled,
            keywords: ads_file.keywords.unwrap_or_default(),
            source,
        },
        storage,
        config_dir: dir,
    }
}

/// Get the path to the config file for documentation purposes
pub fn get_config_file_path_string() -> String {
    config_dir().join(CONFIG_FILE).display().to_string()
}

/// Generate example config file content
pub fn generate_example_config() -> String {
    r#"# Scanlet Configuration
# Place this file at: ~/.config/scanlet/config.toml

[ads]
# Interstitial ad unit id
# Default: the ad network's public test unit
# unit_id = "ca-app-pub-XXXXXXXXXXXXXXXX/NNNNNNNNNN"

# Set to false to never request ads
# enabled = true

# Contextual keywords sent with every request
# keywords = ["scanner", "pdf"]

[storage]
# Where preferences (language, ad consent) are kept: "keyring", "file" or "memory"
# backend = "keyring"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_app_config_with(env_from(&[(
            ENV_CONFIG_DIR,
            dir.path().to_str().unwrap(),
        )]));

        assert_eq!(config.ads.unit_id, DEFAULT_AD_UNIT_ID);
        assert_eq!(config.ads.source, ConfigSource::Default);
        assert!(config.ads.enabled);
        assert!(config.ads.keywords.is_empty());
        assert_eq!(config.storage, StorageBackend::Keyring);
        assert_eq!(config.config_dir, dir.path());
    }

    #[test]
    fn test_config_file_values() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            r#"
[ads]
unit_id = " ca-app-pub-1/2 "
enabled = false
keywords = ["pdf"]

[storage]
backend = "file"
"#,
        )
        .unwrap();

        let config = load_app_config_with(env_from(&[(
            ENV_CONFIG_DIR,
            dir.path().to_str().unwrap(),
        )]));

        assert_eq!(config.ads.unit_id, "ca-app-pub-1/2");
        assert_eq!(config.ads.source, ConfigSource::ConfigFile);
        assert!(!config.ads.enabled);
        assert_eq!(config.ads.keywords, vec!["pdf".to_string()]);
        assert_eq!(config.storage, StorageBackend::File);
    }

    #[test]
    fn test_environment_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            "[ads]\nunit_id = \"from-file\"\nenabled = true\n",
        )
        .unwrap();

        let config = load_app_config_with(env_from(&[
            (ENV_CONFIG_DIR, dir.path().to_str().unwrap()),
            (ENV_AD_UNIT_ID, "from-env"),
            (ENV_ADS_ENABLED, "off"),
            (ENV_STORAGE, "memory"),
        ]));

        assert_eq!(config.ads.unit_id, "from-env");
        assert_eq!(config.ads.source, ConfigSource::Environment);
        assert!(!config.ads.enabled);
        assert_eq!(config.storage, StorageBackend::Memory);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "this is = = not toml").unwrap();

        let config = load_app_config_with(env_from(&[
            (ENV_CONFIG_DIR, dir.path().to_str().unwrap()),
            (ENV_ADS_ENABLED, "maybe"),
            (ENV_STORAGE, "floppy"),
        ]));

        assert_eq!(config.ads.source, ConfigSource::Default);
        assert!(config.ads.enabled);
        assert_eq!(config.storage, StorageBackend::Keyring);
    }

    #[test]
    fn test_example_config_parses() {
        let parsed: ConfigFile = toml::from_str(&generate_example_config()).unwrap();
        assert!(parsed.ads.is_some());
        assert!(parsed.storage.is_some());
    }
}
