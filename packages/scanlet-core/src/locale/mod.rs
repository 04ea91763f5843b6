//! Display language selection.
//!
//! The device language is a pure function of the locale signals
//! ([`resolve_device_language`]); a stored user choice overrides it through
//! [`LocaleContext`].

mod context;
mod language;
mod resolve;
mod signals;

pub use context::{LANGUAGE_PREF_KEY, LocaleContext};
pub use language::{LanguageCode, TextDirection};
pub use resolve::{ARABIC_REGIONS, SPANISH_REGIONS, resolve_device_language};
pub use signals::{
    DeviceLocaleProvider, EnvLocaleProvider, LocaleSignal, LocaleSignalSet, StaticLocaleProvider,
    parse_posix_locale,
};
