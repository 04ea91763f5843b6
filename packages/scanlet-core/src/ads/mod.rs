//! Interstitial ads gated on privacy consent.
//!
//! Ads are a non-critical enhancement: every failure in here ends the current
//! activation with no ad shown and is never reported to the user.

mod consent;
mod controller;
mod network;

pub use consent::{CONSENT_PREF_KEY, ConsentProvider, ConsentRecord, ConsentState, StoredConsent};
pub use controller::{AdLifecycleController, ControllerPhase};
pub use network::{
    AdEvent, AdEventHandler, AdEventKind, AdHandle, AdNetworkClient, RequestOptions,
    SubscriptionId,
};
