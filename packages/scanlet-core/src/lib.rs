//! Scanlet Core Library
//!
//! This crate holds the parts of the Scanlet scanner app that are more than
//! glue around platform SDKs:
//! - Consent-gated interstitial ad lifecycle
//! - Device language resolution with a stored override
//! - Preference storage (keyring with file fallback)
//!
//! # Features
//!
//! - `keyring-storage` (default): Use platform keyring for preference storage
//!
//! # Example
//!
//! ```no_run
//! use scanlet_core::{config, locale, storage};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = config::load_app_config();
//!     let store = storage::open_store(config.storage, &config.config_dir);
//!
//!     let device = locale::EnvLocaleProvider::from_env();
//!     let languages = locale::LocaleContext::new(&device, store);
//!     println!("Starting in {}", languages.initial_language());
//!
//!     languages.set_language(locale::LanguageCode::Tr).await;
//! }
//! ```

pub mod ads;
pub mod config;
pub mod error;
pub mod locale;
pub mod storage;

// Re-export commonly used types
pub use ads::{AdLifecycleController, ConsentProvider, ConsentState, ControllerPhase, StoredConsent};
pub use config::{AdConfig, AppConfig, ConfigSource};
pub use error::{AdError, ConfigError, ConsentError, StorageError};
pub use locale::{LanguageCode, LocaleContext, LocaleSignalSet, resolve_device_language};
pub use storage::{PreferenceStore, StorageBackend};
