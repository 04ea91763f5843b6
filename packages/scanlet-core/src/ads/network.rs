//! Seam to the vendor ad SDK.
//!
//! The controller only needs four capabilities: create a request, subscribe to
//! its `loaded`/`error` events, load it, and show it. Hosts implement these
//! traits over the platform SDK binding.

use crate::error::AdError;
use serde::{Deserialize, Serialize};

/// Options attached to an ad request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestOptions {
    /// Ask the network not to use personal data.
    pub non_personalized_only: bool,
    pub keywords: Vec<String>,
}

impl RequestOptions {
    /// Options for a request made under the given consent answer.
    ///
    /// Anything short of an explicit grant yields a non-personalized request.
    pub fn for_consent(granted: bool, keywords: &[String]) -> Self {
        Self {
            non_personalized_only: !granted,
            keywords: keywords.to_vec(),
        }
    }
}

/// Kinds of event the controller listens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdEventKind {
    Loaded,
    Error,
}

/// An event delivered by the SDK for one ad.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdEvent {
    Loaded,
    Error(AdError),
}

impl AdEvent {
    pub fn kind(&self) -> AdEventKind {
        match self {
            AdEvent::Loaded => AdEventKind::Loaded,
            AdEvent::Error(_) => AdEventKind::Error,
        }
    }
}

/// Opaque token returned by [`AdHandle::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Callback registered for one event kind. May be invoked from any thread,
/// including synchronously from inside [`AdHandle::load`].
pub type AdEventHandler = Box<dyn Fn(AdEvent) + Send + Sync + 'static>;

/// One ad instance created by the network.
pub trait AdHandle: Send + 'static {
    fn subscribe(
        &mut self,
        kind: AdEventKind,
        handler: AdEventHandler,
    ) -> Result<SubscriptionId, AdError>;

    fn unsubscribe(&mut self, id: SubscriptionId);

    /// Start loading. Completion is reported through the subscribed events.
    fn load(&mut self) -> Result<(), AdError>;

    /// Present a loaded ad. Its on-screen lifecycle belongs to the SDK.
    fn show(&mut self) -> Result<(), AdError>;
}

/// Factory for ad instances.
pub trait AdNetworkClient: Send + Sync + 'static {
    type Ad: AdHandle;

    fn create_request(&self, unit_id: &str, options: &RequestOptions) -> Result<Self::Ad, AdError>;
}
