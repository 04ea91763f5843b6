//! Process-wide language state.
//!
//! A [`LocaleContext`] is built once at startup and handed to whatever needs
//! the active language. It owns the device-derived default, the stored user
//! preference and the change notifications.

use super::language::{LanguageCode, TextDirection};
use super::resolve::resolve_device_language;
use super::signals::DeviceLocaleProvider;
use crate::error::StorageError;
use crate::storage::PreferenceStore;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Preference key for the user's language choice.
///
/// Bumping the version orphans values written under older keys.
pub const LANGUAGE_PREF_KEY: &str = "language.v2";

#[derive(Default)]
struct PendingLoad {
    /// Bumped by every explicit change; a preference load started under an
    /// older generation must not apply.
    generation: u64,
    cancel: Option<CancellationToken>,
}

struct Inner {
    device_language: LanguageCode,
    store: Arc<dyn PreferenceStore>,
    active: watch::Sender<LanguageCode>,
    pending: Mutex<PendingLoad>,
}

#[derive(Clone)]
pub struct LocaleContext {
    inner: Arc<Inner>,
}

impl LocaleContext {
    /// Resolve the device language and start with it active.
    pub fn new(device: &dyn DeviceLocaleProvider, store: Arc<dyn PreferenceStore>) -> Self {
        let device_language = resolve_device_language(&device.signals());
        tracing::debug!("Device language resolved to {}", device_language);

        let (active, _) = watch::channel(device_language);
        Self {
            inner: Arc::new(Inner {
                device_language,
                store,
                active,
                pending: Mutex::new(PendingLoad::default()),
            }),
        }
    }

    /// Language derived from the device alone.
    pub fn device_language(&self) -> LanguageCode {
        self.inner.device_language
    }

    pub fn active_language(&self) -> LanguageCode {
        *self.inner.active.borrow()
    }

    /// Watch the active language.
    pub fn subscribe(&self) -> watch::Receiver<LanguageCode> {
        self.inner.active.subscribe()
    }

    /// Layout is always left-to-right; the UI has no mirrored layout, so
    /// Arabic text renders RTL inside an LTR layout.
    pub fn layout_direction(&self) -> TextDirection {
        TextDirection::Ltr
    }

    /// Return the device language now and apply the stored preference once it
    /// has been read.
    ///
    /// The stored value replaces the active language only if it names a
    /// supported language, differs from the active one, and no explicit
    /// [`set_language`](Self::set_language) or [`reset`](Self::reset) happened
    /// in the meantime. Needs a tokio runtime for the background read.
    pub fn initial_language(&self) -> LanguageCode {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::warn!("No runtime to load the stored language: {}", e);
                None
            }
        };

        if let Some(runtime) = runtime {
            let cancel = CancellationToken::new();
            let generation = {
                let mut pending = self.lock_pending();
                if let Some(previous) = pending.cancel.replace(cancel.clone()) {
                    previous.cancel();
                }
                pending.generation
            };

            let inner = self.inner.clone();
            runtime.spawn(async move {
                tokio::select! {
                    _ = cancel.cancelled() => {}
                    stored = read_stored_language(inner.store.as_ref()) => {
                        apply_stored_language(&inner, generation, stored);
                    }
                }
            });
        }

        self.inner.device_language
    }

    /// Switch language and remember the choice.
    ///
    /// The in-memory change always sticks; a failed write is only logged.
    pub async fn set_language(&self, code: LanguageCode) {
        self.supersede_pending();
        self.inner.active.send_if_modified(|active| {
            let changed = *active != code;
            *active = code;
            changed
        });
        tracing::info!("Language set to {}", code);

        if let Err(e) = self.inner.store.set(LANGUAGE_PREF_KEY, code.as_str()).await {
            tracing::warn!("Failed to persist language preference: {}", e);
        }
    }

    /// Read the stored preference and apply it before returning the active
    /// language.
    ///
    /// The awaited counterpart of [`initial_language`](Self::initial_language)
    /// for callers that need the settled value, such as one-shot tools. An
    /// explicit change made while the read is in flight still wins.
    pub async fn restore_language(&self) -> LanguageCode {
        let generation = self.lock_pending().generation;
        let stored = read_stored_language(self.inner.store.as_ref()).await;
        apply_stored_language(&self.inner, generation, stored);
        self.active_language()
    }

    /// The stored preference, `None` if unset or unsupported.
    pub async fn stored_language(&self) -> Result<Option<LanguageCode>, StorageError> {
        read_stored_language(self.inner.store.as_ref()).await
    }

    /// Drop any pending preference load and return to the device language.
    /// The stored preference is left untouched.
    pub fn reset(&self) {
        self.supersede_pending();
        self.inner.active.send_if_modified(|active| {
            let changed = *active != self.inner.device_language;
            *active = self.inner.device_language;
            changed
        });
    }

    fn supersede_pending(&self) {
        let mut pending = self.lock_pending();
        pending.generation += 1;
        if let Some(cancel) = pending.cancel.take() {
            cancel.cancel();
        }
    }

    fn lock_pending(&self) -> MutexGuard<'_, PendingLoad> {
        self.inner.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

async fn read_stored_language(
    store: &dyn PreferenceStore,
) -> Result<Option<LanguageCode>, StorageError> {
    let Some(raw) = store.get(LANGUAGE_PREF_KEY).await? else {
        return Ok(None);
    };

    match raw.parse() {
        Ok(code) => Ok(Some(code)),
        Err(e) => {
            tracing::debug!("Ignoring stored language: {}", e);
            Ok(None)
        }
    }
}

fn apply_stored_language(
    inner: &Inner,
    generation: u64,
    stored: Result<Option<LanguageCode>, StorageError>,
) {
    let code = match stored {
        Ok(Some(code)) => code,
        Ok(None) => return,
        Err(e) => {
            tracing::warn!("Failed to read language preference: {}", e);
            return;
        }
    };

    let mut pending = inner.pending.lock().unwrap_or_else(PoisonError::into_inner);
    if pending.generation != generation {
        tracing::debug!("Stored language {} superseded by an explicit change", code);
        return;
    }
    pending.cancel = None;

    if inner.active.send_if_modified(|active| {
        let changed = *active != code;
        *active = code;
        changed
    }) {
        tracing::debug!("Applied stored language {}", code);
    }
}
