//! Scanlet CLI - inspect and adjust the preferences the app core works from
//!
//! This binary can:
//! - Show the device-derived and stored display language
//! - Set the stored display language
//! - Show and record advertising consent
//! - Show the ad request the app would make under the current consent
//! - Show configuration paths and settings

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use scanlet_core::ads::{ConsentState, RequestOptions, StoredConsent};
use scanlet_core::config::{self, AppConfig};
use scanlet_core::locale::{EnvLocaleProvider, LanguageCode, LocaleContext};
use scanlet_core::storage::{self, PreferenceStore};
use scanlet_core::ConsentProvider;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "scanlet")]
#[command(author = "Scanlet Team")]
#[command(version)]
#[command(about = "Inspect and adjust Scanlet language and ad consent preferences")]
#[command(long_about = "
Scanlet CLI reads and writes the preference keys the Scanlet app uses:
the display language and the user's advertising consent. Builds without
keyring support keep them in a JSON file in the config directory;
`scanlet config` shows which store is in use.

Quick start:
  1. See what the app will display:  scanlet language
  2. Pin a language:                 scanlet language set tr
  3. Record ad consent:              scanlet consent grant
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for scripting
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show or set the display language
    Language {
        #[command(subcommand)]
        action: Option<LanguageAction>,
    },

    /// Show or record advertising consent
    Consent {
        #[command(subcommand)]
        action: Option<ConsentAction>,
    },

    /// Show the ad request that would be made with the current consent
    Ads,

    /// Show configuration paths and settings
    Config {
        /// Print an example config file instead
        #[arg(long)]
        example: bool,
    },
}

#[derive(Subcommand)]
pub enum LanguageAction {
    /// Show device, stored and active language
    Show,
    /// Store a language choice (en, tr, ar, es)
    Set { code: LanguageCode },
}

#[derive(Subcommand)]
pub enum ConsentAction {
    /// Show the stored consent
    Show,
    /// Allow personalized ads
    Grant,
    /// Only non-personalized ads
    Decline,
    /// Forget the stored answer
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("scanlet={},scanlet_core={}", log_level, log_level).into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = config::load_app_config();
    let store = storage::open_store(config.storage, &config.config_dir);

    match &cli.command {
        Commands::Language { action } => match action {
            None | Some(LanguageAction::Show) => cmd_language_show(&cli, store).await,
            Some(LanguageAction::Set { code }) => cmd_language_set(&cli, store, *code).await,
        },
        Commands::Consent { action } => match action {
            None | Some(ConsentAction::Show) => cmd_consent_show(&cli, store).await,
            Some(ConsentAction::Grant) => cmd_consent_record(&cli, store, ConsentState::Granted).await,
            Some(ConsentAction::Decline) => {
                cmd_consent_record(&cli, store, ConsentState::Declined).await
            }
            Some(ConsentAction::Reset) => cmd_consent_reset(&cli, store).await,
        },
        Commands::Ads => cmd_ads(&cli, &config, store).await,
        Commands::Config { example } => cmd_config(&cli, &config, store.as_ref(), *example),
    }
}

async fn cmd_language_show(cli: &Cli, store: Arc<dyn PreferenceStore>) -> Result<()> {
    let device = EnvLocaleProvider::from_env();
    let languages = LocaleContext::new(&device, store);

    let device_language = languages.device_language();
    let stored = match languages.stored_language().await {
        Ok(stored) => stored,
        Err(e) => {
            tracing::warn!("Could not read stored language: {}", e);
            None
        }
    };
    let active = languages.restore_language().await;

    match cli.format {
        OutputFormat::Text => {
            println!("Device language:  {} ({})", device_language, device_language.native_name());
            match stored {
                Some(code) => println!("Stored language:  {}", code),
                None => println!("Stored language:  (none)"),
            }
            println!("Active language:  {} ({})", active, active.native_name());
            println!("Layout direction: {}", languages.layout_direction());
        }
        OutputFormat::Json => {
            println!("{}", serde_json::json!({
                "device": device_language,
                "stored": stored,
                "active": active,
                "layoutDirection": languages.layout_direction(),
            }));
        }
    }

    Ok(())
}

async fn cmd_language_set(cli: &Cli, store: Arc<dyn PreferenceStore>, code: LanguageCode) -> Result<()> {
    let device = EnvLocaleProvider::from_env();
    let languages = LocaleContext::new(&device, store);

    languages.set_language(code).await;

    match cli.format {
        OutputFormat::Text => println!("Language set to {} ({})", code, code.native_name()),
        OutputFormat::Json => {
            println!("{}", serde_json::json!({
                "status": "set",
                "language": code,
            }));
        }
    }

    Ok(())
}

async fn cmd_consent_show(cli: &Cli, store: Arc<dyn PreferenceStore>) -> Result<()> {
    let consent = StoredConsent::new(store);
    let record = consent.load_record().await?;
    let state = record.as_ref().map(|r| r.state).unwrap_or_default();

    match cli.format {
        OutputFormat::Text => {
            println!("Ad consent: {}", state);
            if let Some(record) = &record {
                println!("Updated:    {}", record.updated_at.to_rfc3339());
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::json!({
                "state": state,
                "updatedAt": record.map(|r| r.updated_at),
            }));
        }
    }

    Ok(())
}

async fn cmd_consent_record(
    cli: &Cli,
    store: Arc<dyn PreferenceStore>,
    state: ConsentState,
) -> Result<()> {
    let consent = StoredConsent::new(store);
    let record = consent.record(state).await?;

    match cli.format {
        OutputFormat::Text => println!("Ad consent recorded: {}", record.state),
        OutputFormat::Json => {
            println!("{}", serde_json::json!({
                "state": record.state,
                "updatedAt": record.updated_at,
            }));
        }
    }

    Ok(())
}

async fn cmd_consent_reset(cli: &Cli, store: Arc<dyn PreferenceStore>) -> Result<()> {
    StoredConsent::new(store).clear().await?;

    match cli.format {
        OutputFormat::Text => println!("Ad consent cleared"),
        OutputFormat::Json => println!("{}", serde_json::json!({ "state": ConsentState::Unknown })),
    }

    Ok(())
}

async fn cmd_ads(cli: &Cli, config: &AppConfig, store: Arc<dyn PreferenceStore>) -> Result<()> {
    let consent = StoredConsent::new(store);
    let granted = match consent.has_consent().await {
        Ok(granted) => granted,
        Err(e) => {
            tracing::warn!("Consent lookup failed, assuming not granted: {}", e);
            false
        }
    };
    let options = RequestOptions::for_consent(granted, &config.ads.keywords);

    match cli.format {
        OutputFormat::Text => {
            println!("Ads enabled:           {}", config.ads.enabled);
            println!("Ad unit:               {} ({})", config.ads.unit_id, config.ads.source);
            println!("Non-personalized only: {}", options.non_personalized_only);
            if !options.keywords.is_empty() {
                println!("Keywords:              {}", options.keywords.join(", "));
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::json!({
                "enabled": config.ads.enabled,
                "unitId": config.ads.unit_id,
                "unitIdSource": config.ads.source.to_string(),
                "options": options,
            }));
        }
    }

    Ok(())
}

fn cmd_config(cli: &Cli, config: &AppConfig, store: &dyn PreferenceStore, example: bool) -> Result<()> {
    if example {
        print!("{}", config::generate_example_config());
        return Ok(());
    }

    match cli.format {
        OutputFormat::Text => {
            println!("Config file:   {}", config::get_config_file_path_string());
            println!("Storage:       {}", config.storage.effective());
            println!("Preferences:   {}", store.describe());
        }
        OutputFormat::Json => {
            println!("{}", serde_json::json!({
                "configFile": config::get_config_file_path_string(),
                "storage": config.storage.effective(),
                "preferences": store.describe(),
            }));
        }
    }

    Ok(())
}
