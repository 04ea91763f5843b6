//! Error types for the trait seams between the core and its host.
//!
//! None of these are ever surfaced to an end user: the ad controller and the
//! locale context catch them at the boundary and degrade to "no ad" or
//! "keep the current language". They exist so hosts and logs can tell the
//! failures apart.

use thiserror::Error;

/// Failure reading or writing a stored preference.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("keyring error: {0}")]
    Keyring(String),

    #[error("preference file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode preference: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("preference storage unavailable: {0}")]
    Unavailable(String),
}

/// Failure looking up the user's advertising consent.
#[derive(Debug, Error)]
pub enum ConsentError {
    #[error("consent storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("consent provider failed: {0}")]
    Provider(String),
}

/// Failure reported by, or while talking to, the ad network SDK.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdError {
    #[error("failed to create ad request: {0}")]
    Create(String),

    #[error("failed to subscribe to ad events: {0}")]
    Subscribe(String),

    #[error("failed to load ad: {0}")]
    Load(String),

    #[error("failed to show ad: {0}")]
    Show(String),

    /// Error delivered through the `error` event of a loading ad.
    #[error("ad network error {code}: {message}")]
    Network { code: i32, message: String },
}

/// Failure loading the application config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}
