//! Advertising consent.

use crate::error::ConsentError;
use crate::storage::PreferenceStore;
use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Preference key for the stored consent record
pub const CONSENT_PREF_KEY: &str = "ads.consent.v1";

/// The user's consent to personalized advertising.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentState {
    /// Never asked, or the answer was lost
    #[default]
    Unknown,
    /// Not personalized
    Declined,
    Granted,
}

impl ConsentState {
    pub fn is_granted(self) -> bool {
        matches!(self, ConsentState::Granted)
    }
}

impl std::fmt::Display for ConsentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConsentState::Unknown => write!(f, "unknown"),
            ConsentState::Declined => write!(f, "declined"),
            ConsentState::Granted => write!(f, "granted"),
        }
    }
}

/// Source of the user's consent. Queried once per ad activation.
pub trait ConsentProvider: Send + Sync {
    fn consent_state(&self) -> BoxFuture<'_, Result<ConsentState, ConsentError>>;

    /// Whether personalized ads are allowed.
    fn has_consent(&self) -> BoxFuture<'_, Result<bool, ConsentError>> {
        async move { Ok(self.consent_state().await?.is_granted()) }.boxed()
    }
}

/// Consent record as persisted in the preference store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsentRecord {
    pub state: ConsentState,
    pub updated_at: DateTime<Utc>,
}

/// Consent persisted in a [`PreferenceStore`].
///
/// Nothing is cached: every lookup reads the store, so a change made from a
/// settings screen is picked up by the next activation.
pub struct StoredConsent {
    store: Arc<dyn PreferenceStore>,
}

impl StoredConsent {
    pub fn new(store: Arc<dyn PreferenceStore>) -> Self {
        Self { store }
    }

    /// Read the full record, `None` if nothing usable is stored.
    pub async fn load_record(&self) -> Result<Option<ConsentRecord>, ConsentError> {
        let Some(raw) = self.store.get(CONSENT_PREF_KEY).await? else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                tracing::warn!("Ignoring unreadable consent record: {}", e);
                Ok(None)
            }
        }
    }

    /// Persist the user's answer.
    pub async fn record(&self, state: ConsentState) -> Result<ConsentRecord, ConsentError> {
        let record = ConsentRecord {
            state,
            updated_at: Utc::now(),
        };
        let json = serde_json::to_string(&record).map_err(crate::error::StorageError::from)?;
        self.store.set(CONSENT_PREF_KEY, &json).await?;
        tracing::info!("Ad consent recorded: {}", state);
        Ok(record)
    }

    /// Forget the stored answer; lookups report `Unknown` afterwards.
    pub async fn clear(&self) -> Result<(), ConsentError> {
        self.store.remove(CONSENT_PREF_KEY).await?;
        tracing::info!("Ad consent cleared");
        Ok(())
    }
}

impl ConsentProvider for StoredConsent {
    fn consent_state(&self) -> BoxFuture<'_, Result<ConsentState, ConsentError>> {
        async move {
            Ok(self
                .load_record()
                .await?
                .map(|r| r.state)
                .unwrap_or_default())
        }
        .boxed()
    }
}
