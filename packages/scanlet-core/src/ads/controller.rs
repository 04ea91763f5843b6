//! Consent-gated interstitial lifecycle.
//!
//! One activation runs `ResolvingConsent -> Requesting -> Loading -> Idle` on a
//! spawned task. SDK callbacks are forwarded as messages on a channel owned by
//! the ad request, so the task only ever reacts to events of its own handle.
//!
//! Every continuation carries the activation token it was started with and
//! re-checks it under the state lock before touching anything. `deactivate`
//! swaps the token out and cancels it, which turns any late consent answer or
//! ad event into a no-op.

use super::consent::ConsentProvider;
use super::network::{
    AdEvent, AdEventKind, AdHandle, AdNetworkClient, RequestOptions, SubscriptionId,
};
use crate::config::AdConfig;
use crate::error::AdError;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

/// Where the controller is in its cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerPhase {
    Idle,
    ResolvingConsent,
    Requesting,
    Loading,
}

impl std::fmt::Display for ControllerPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ControllerPhase::Idle => write!(f, "idle"),
            ControllerPhase::ResolvingConsent => write!(f, "resolving consent"),
            ControllerPhase::Requesting => write!(f, "requesting"),
            ControllerPhase::Loading => write!(f, "loading"),
        }
    }
}

/// Marks one activation. Valid while it is the controller's current token.
#[derive(Debug, Clone)]
struct ActivationToken {
    generation: u64,
    cancel: CancellationToken,
}

/// One ad instance with the subscriptions attached to it.
struct AdRequest<A: AdHandle> {
    ad: A,
    subscriptions: Vec<SubscriptionId>,
    shown: bool,
}

impl<A: AdHandle> AdRequest<A> {
    /// Detach every listener and drop the handle.
    fn release(mut self) {
        for id in self.subscriptions.drain(..) {
            self.ad.unsubscribe(id);
        }
    }
}

struct ControllerState<A: AdHandle> {
    current: Option<ActivationToken>,
    request: Option<AdRequest<A>>,
}

impl<A: AdHandle> ControllerState<A> {
    fn is_current(&self, token: &ActivationToken) -> bool {
        self.current
            .as_ref()
            .is_some_and(|t| t.generation == token.generation)
    }
}

struct Shared<N: AdNetworkClient> {
    network: N,
    consent: Arc<dyn ConsentProvider>,
    unit_id: String,
    keywords: Vec<String>,
    next_generation: AtomicU64,
    state: Mutex<ControllerState<N::Ad>>,
    phase: watch::Sender<ControllerPhase>,
}

/// Drives at most one ad acquisition-and-display cycle at a time.
///
/// Dropping the controller deactivates it.
pub struct AdLifecycleController<N: AdNetworkClient> {
    shared: Arc<Shared<N>>,
    ads_enabled: bool,
}

impl<N: AdNetworkClient> AdLifecycleController<N> {
    pub fn new(network: N, consent: Arc<dyn ConsentProvider>, config: &AdConfig) -> Self {
        let (phase, _) = watch::channel(ControllerPhase::Idle);
        Self {
            shared: Arc::new(Shared {
                network,
                consent,
                unit_id: config.unit_id.clone(),
                keywords: config.keywords.clone(),
                next_generation: AtomicU64::new(0),
                state: Mutex::new(ControllerState {
                    current: None,
                    request: None,
                }),
                phase,
            }),
            ads_enabled: config.enabled,
        }
    }

    /// Start a cycle if `enabled` and nothing is in flight.
    ///
    /// Returns whether a new cycle was started. Must be called from within a
    /// tokio runtime; outside one no work starts.
    pub fn activate(&self, enabled: bool) -> bool {
        if !enabled || !self.ads_enabled {
            tracing::trace!("Ads not enabled, skipping activation");
            return false;
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                tracing::warn!("Cannot activate ads outside a tokio runtime: {}", e);
                return false;
            }
        };

        let token = {
            let mut state = self.shared.lock_state();
            if state.current.is_some() {
                tracing::debug!("Ad activation already in progress");
                return false;
            }

            let token = ActivationToken {
                generation: self.shared.next_generation.fetch_add(1, Ordering::Relaxed) + 1,
                cancel: CancellationToken::new(),
            };
            state.current = Some(token.clone());
            self.shared.set_phase(ControllerPhase::ResolvingConsent);
            token
        };

        tracing::debug!("Starting ad activation #{}", token.generation);
        runtime.spawn(run_activation(self.shared.clone(), token));
        true
    }

    /// Cancel whatever is in flight and release the current ad, if any.
    ///
    /// Takes effect before returning. Safe to call at any time, any number of
    /// times.
    pub fn deactivate(&self) {
        let mut state = self.shared.lock_state();

        if let Some(token) = state.current.take() {
            token.cancel.cancel();
            tracing::debug!("Ad activation #{} cancelled", token.generation);
        }
        if let Some(request) = state.request.take() {
            request.release();
        }

        self.shared.set_phase(ControllerPhase::Idle);
    }

    pub fn phase(&self) -> ControllerPhase {
        *self.shared.phase.borrow()
    }

    /// Watch phase transitions.
    pub fn subscribe_phase(&self) -> watch::Receiver<ControllerPhase> {
        self.shared.phase.subscribe()
    }
}

impl<N: AdNetworkClient> Drop for AdLifecycleController<N> {
    fn drop(&mut self) {
        self.deactivate();
    }
}

impl<N: AdNetworkClient> Shared<N> {
    fn lock_state(&self) -> MutexGuard<'_, ControllerState<N::Ad>> {
        // A panicking SDK call poisons the lock; the activation guard cleans up.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_phase(&self, next: ControllerPhase) {
        self.phase.send_if_modified(|phase| {
            if *phase == next {
                return false;
            }
            *phase = next;
            true
        });
    }

    /// End the activation without showing anything.
    fn finish(&self, token: &ActivationToken) {
        let mut state = self.lock_state();
        if !state.is_current(token) {
            return;
        }
        self.finish_locked(&mut state);
    }

    fn finish_locked(&self, state: &mut ControllerState<N::Ad>) {
        if let Some(request) = state.request.take() {
            request.release();
        }
        state.current = None;
        self.set_phase(ControllerPhase::Idle);
    }

    /// Create the ad, attach both listeners, then load it.
    ///
    /// Returns the receiving end of the ad's event channel, or `None` if the
    /// activation is stale or the network refused the request.
    fn open_request(
        &self,
        token: &ActivationToken,
        granted: bool,
    ) -> Option<mpsc::UnboundedReceiver<AdEvent>> {
        let mut state = self.lock_state();
        if !state.is_current(token) {
            tracing::debug!(
                "Consent answer for stale activation #{} discarded",
                token.generation
            );
            return None;
        }
        self.set_phase(ControllerPhase::Requesting);

        let options = RequestOptions::for_consent(granted, &self.keywords);
        tracing::debug!(
            "Requesting ad (unit={}, non_personalized_only={})",
            self.unit_id,
            options.non_personalized_only
        );

        let ad = match self.network.create_request(&self.unit_id, &options) {
            Ok(ad) => ad,
            Err(e) => {
                tracing::warn!("Ad request could not be created: {}", e);
                self.finish_locked(&mut state);
                return None;
            }
        };

        let (tx, rx) = mpsc::unbounded_channel();
        let mut request = AdRequest {
            ad,
            subscriptions: Vec::with_capacity(2),
            shown: false,
        };

        for kind in [AdEventKind::Loaded, AdEventKind::Error] {
            let tx = tx.clone();
            let handler = Box::new(move |event: AdEvent| {
                // Receiver is gone once the activation ended.
                let _ = tx.send(event);
            });
            match request.ad.subscribe(kind, handler) {
                Ok(id) => request.subscriptions.push(id),
                Err(e) => {
                    tracing::warn!("Failed to subscribe to {:?} events: {}", kind, e);
                    request.release();
                    self.finish_locked(&mut state);
                    return None;
                }
            }
        }
        drop(tx);

        if let Err(e) = request.ad.load() {
            tracing::warn!("Ad load could not be started: {}", e);
            request.release();
            self.finish_locked(&mut state);
            return None;
        }

        state.request = Some(request);
        self.set_phase(ControllerPhase::Loading);
        Some(rx)
    }

    fn on_loaded(&self, token: &ActivationToken) {
        let mut state = self.lock_state();
        if !state.is_current(token) {
            tracing::debug!("Load event for stale activation #{} ignored", token.generation);
            return;
        }

        if let Some(request) = state.request.as_mut() {
            if !request.shown {
                request.shown = true;
                match request.ad.show() {
                    Ok(()) => tracing::debug!("Ad shown for activation #{}", token.generation),
                    Err(e) => tracing::warn!("Failed to show ad: {}", e),
                }
            }
        }

        self.finish_locked(&mut state);
    }

    fn on_error(&self, token: &ActivationToken, error: AdError) {
        let mut state = self.lock_state();
        if !state.is_current(token) {
            return;
        }
        tracing::debug!("Ad failed to load: {}", error);
        self.finish_locked(&mut state);
    }
}

/// Ends its activation when the task stops, whether it returns, is dropped or
/// unwinds out of an SDK call.
struct ActivationGuard<N: AdNetworkClient> {
    shared: Arc<Shared<N>>,
    token: ActivationToken,
}

impl<N: AdNetworkClient> Drop for ActivationGuard<N> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            tracing::warn!(
                "Ad activation #{} aborted by a panicking ad network call",
                self.token.generation
            );
        }
        self.shared.finish(&self.token);
    }
}

async fn run_activation<N: AdNetworkClient>(shared: Arc<Shared<N>>, token: ActivationToken) {
    let guard = ActivationGuard { shared, token };
    let shared = guard.shared.as_ref();
    let token = &guard.token;

    let consent = tokio::select! {
        _ = token.cancel.cancelled() => return,
        result = shared.consent.has_consent() => result,
    };

    let granted = match consent {
        Ok(granted) => granted,
        Err(e) => {
            tracing::warn!("Consent lookup failed, skipping ad: {}", e);
            return;
        }
    };

    let Some(mut events) = shared.open_request(token, granted) else {
        return;
    };

    let event = tokio::select! {
        _ = token.cancel.cancelled() => return,
        event = events.recv() => event,
    };

    match event {
        Some(AdEvent::Loaded) => shared.on_loaded(token),
        Some(AdEvent::Error(e)) => shared.on_error(token, e),
        None => tracing::debug!("Ad network dropped its event handlers"),
    }
}
