//! Ad activations read consent fresh from storage each time.

use scanlet_core::ads::{
    AdEvent, AdEventHandler, AdEventKind, AdHandle, AdLifecycleController, AdNetworkClient,
    ConsentState, ControllerPhase, RequestOptions, StoredConsent, SubscriptionId,
};
use scanlet_core::config::{AdConfig, ConfigSource};
use scanlet_core::storage::{MemoryStore, PreferenceStore};
use scanlet_core::AdError;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct Recorded {
    requests: Vec<RequestOptions>,
    loaded_handlers: Vec<Arc<dyn Fn(AdEvent) + Send + Sync>>,
    shows: usize,
}

#[derive(Clone, Default)]
struct RecordingNetwork {
    recorded: Arc<Mutex<Recorded>>,
}

struct RecordingAd {
    recorded: Arc<Mutex<Recorded>>,
    next_id: u64,
}

impl AdHandle for RecordingAd {
    fn subscribe(&mut self, kind: AdEventKind, handler: AdEventHandler) -> Result<SubscriptionId, AdError> {
        if kind == AdEventKind::Loaded {
            self.recorded.lock().unwrap().loaded_handlers.push(Arc::from(handler));
        }
        self.next_id += 1;
        Ok(SubscriptionId(self.next_id))
    }

    fn unsubscribe(&mut self, _id: SubscriptionId) {}

    fn load(&mut self) -> Result<(), AdError> {
        Ok(())
    }

    fn show(&mut self) -> Result<(), AdError> {
        self.recorded.lock().unwrap().shows += 1;
        Ok(())
    }
}

impl AdNetworkClient for RecordingNetwork {
    type Ad = RecordingAd;

    fn create_request(&self, _unit_id: &str, options: &RequestOptions) -> Result<RecordingAd, AdError> {
        self.recorded.lock().unwrap().requests.push(options.clone());
        Ok(RecordingAd {
            recorded: self.recorded.clone(),
            next_id: 0,
        })
    }
}

impl RecordingNetwork {
    fn deliver_last_load(&self) {
        let handler = self.recorded.lock().unwrap().loaded_handlers.last().cloned();
        if let Some(handler) = handler {
            handler(AdEvent::Loaded);
        }
    }
}

async fn settle() {
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn consent_change_applies_to_next_activation() {
    let store: Arc<dyn PreferenceStore> = Arc::new(MemoryStore::new());
    let consent = Arc::new(StoredConsent::new(store.clone()));
    let network = RecordingNetwork::default();
    let config = AdConfig {
        unit_id: "unit".to_string(),
        enabled: true,
        keywords: Vec::new(),
        source: ConfigSource::Default,
    };
    let ads = AdLifecycleController::new(network.clone(), consent.clone(), &config);

    // Nothing stored yet: fail closed.
    assert!(ads.activate(true));
    settle().await;
    network.deliver_last_load();
    settle().await;
    assert_eq!(ads.phase(), ControllerPhase::Idle);

    consent.record(ConsentState::Granted).await.unwrap();
    assert!(ads.activate(true));
    settle().await;
    network.deliver_last_load();
    settle().await;

    let recorded = network.recorded.lock().unwrap();
    assert_eq!(recorded.requests.len(), 2);
    assert!(recorded.requests[0].non_personalized_only);
    assert!(!recorded.requests[1].non_personalized_only);
    assert_eq!(recorded.shows, 2);
}
