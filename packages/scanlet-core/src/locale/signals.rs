//! Device locale signals.

use std::collections::HashMap;

/// One locale reported by the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleSignal {
    /// BCP 47-ish tag as reported, e.g. `es-MX`
    pub language_tag: String,
    pub region_code: Option<String>,
}

impl LocaleSignal {
    pub fn new(language_tag: impl Into<String>, region_code: Option<&str>) -> Self {
        Self {
            language_tag: language_tag.into(),
            region_code: region_code.map(str::to_string),
        }
    }
}

/// Everything the device tells us about its locale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocaleSignalSet {
    /// Preferred locales in order; `None` when the platform can't list them
    pub locales: Option<Vec<LocaleSignal>>,
    /// Scalar fallback region
    pub region: Option<String>,
    /// Legacy single locale string, e.g. `tr-TR`
    pub locale: Option<String>,
}

impl LocaleSignalSet {
    fn first_locale(&self) -> Option<&LocaleSignal> {
        self.locales.as_ref().and_then(|l| l.first())
    }

    /// Region of the first reported locale, else the scalar region, uppercased.
    pub fn primary_region(&self) -> Option<String> {
        self.first_locale()
            .and_then(|l| l.region_code.as_deref())
            .filter(|r| !r.trim().is_empty())
            .or(self.region.as_deref())
            .map(|r| r.trim().to_uppercase())
            .filter(|r| !r.is_empty())
    }

    /// Tag of the first reported locale, else the legacy locale string,
    /// lowercased.
    pub fn primary_tag(&self) -> Option<String> {
        let tag = match self.first_locale() {
            Some(locale) => Some(locale.language_tag.as_str()),
            None => self.locale.as_deref(),
        };
        tag.map(|t| t.trim().to_lowercase()).filter(|t| !t.is_empty())
    }
}

/// Source of device locale information.
pub trait DeviceLocaleProvider: Send + Sync {
    /// Preferred locales, `None` if the platform cannot provide the list.
    fn locales(&self) -> Option<Vec<LocaleSignal>>;

    fn region(&self) -> Option<String>;

    fn locale(&self) -> Option<String>;

    fn signals(&self) -> LocaleSignalSet {
        LocaleSignalSet {
            locales: self.locales(),
            region: self.region(),
            locale: self.locale(),
        }
    }
}

/// Provider returning a fixed signal set (tests, hosts that read the
/// platform themselves).
#[derive(Debug, Clone, Default)]
pub struct StaticLocaleProvider(pub LocaleSignalSet);

impl DeviceLocaleProvider for StaticLocaleProvider {
    fn locales(&self) -> Option<Vec<LocaleSignal>> {
        self.0.locales.clone()
    }

    fn region(&self) -> Option<String> {
        self.0.region.clone()
    }

    fn locale(&self) -> Option<String> {
        self.0.locale.clone()
    }
}

/// Reads POSIX locale variables.
///
/// `LANGUAGE` (colon-separated priority list) comes first, then the first set
/// of `LC_ALL`, `LC_MESSAGES`, `LANG`. `C` and `POSIX` carry no language and
/// are skipped.
#[derive(Debug, Clone)]
pub struct EnvLocaleProvider {
    vars: HashMap<String, String>,
}

const LOCALE_VARS: [&str; 3] = ["LC_ALL", "LC_MESSAGES", "LANG"];

impl EnvLocaleProvider {
    /// Snapshot the current process environment.
    pub fn from_env() -> Self {
        let vars = LOCALE_VARS
            .iter()
            .chain(std::iter::once(&"LANGUAGE"))
            .filter_map(|k| std::env::var(k).ok().map(|v| (k.to_string(), v)))
            .collect();
        Self { vars }
    }

    /// Provider over explicit variable values.
    pub fn from_vars<'a>(vars: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            vars: vars
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// Value of the first non-empty of `LC_ALL`, `LC_MESSAGES`, `LANG`.
    fn primary_value(&self) -> Option<&str> {
        LOCALE_VARS
            .iter()
            .filter_map(|k| self.vars.get(*k))
            .map(|v| v.trim())
            .find(|v| !v.is_empty())
    }
}

/// Parse `tr_TR.UTF-8`, `es-MX`, `de_DE@euro`, `ar` into a signal.
pub fn parse_posix_locale(raw: &str) -> Option<LocaleSignal> {
    let base = raw
        .trim()
        .split(['.', '@'])
        .next()
        .unwrap_or_default();

    if base.is_empty() || base == "C" || base == "POSIX" {
        return None;
    }

    let mut parts = base.split(['_', '-']);
    let language = parts.next().filter(|l| !l.is_empty())?.to_lowercase();
    let region = parts
        .find(|p| p.len() == 2 || (p.len() == 3 && p.chars().all(|c| c.is_ascii_digit())))
        .map(|r| r.to_uppercase());

    let language_tag = match &region {
        Some(region) => format!("{}-{}", language, region),
        None => language,
    };

    Some(LocaleSignal {
        language_tag,
        region_code: region,
    })
}

impl DeviceLocaleProvider for EnvLocaleProvider {
    fn locales(&self) -> Option<Vec<LocaleSignal>> {
        let mut locales: Vec<LocaleSignal> = Vec::new();

        let language_list = self.vars.get("LANGUAGE").map(String::as_str).unwrap_or("");
        let candidates = language_list
            .split(':')
            .chain(self.primary_value())
            .filter_map(parse_posix_locale);

        for signal in candidates {
            if !locales.contains(&signal) {
                locales.push(signal);
            }
        }

        if locales.is_empty() { None } else { Some(locales) }
    }

    fn region(&self) -> Option<String> {
        self.primary_value()
            .and_then(parse_posix_locale)
            .and_then(|l| l.region_code)
    }

    fn locale(&self) -> Option<String> {
        self.primary_value()
            .and_then(parse_posix_locale)
            .map(|l| l.language_tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_posix_locale() {
        assert_eq!(
            parse_posix_locale("tr_TR.UTF-8"),
            Some(LocaleSignal::new("tr-TR", Some("TR")))
        );
        assert_eq!(
            parse_posix_locale("es-mx"),
            Some(LocaleSignal::new("es-MX", Some("MX")))
        );
        assert_eq!(
            parse_posix_locale("de_DE@euro"),
            Some(LocaleSignal::new("de-DE", Some("DE")))
        );
        assert_eq!(
            parse_posix_locale("zh_Hant_TW"),
            Some(LocaleSignal::new("zh-TW", Some("TW")))
        );
        assert_eq!(
            parse_posix_locale("es_419"),
            Some(LocaleSignal::new("es-419", Some("419")))
        );
        assert_eq!(parse_posix_locale("ar"), Some(LocaleSignal::new("ar", None)));
        assert_eq!(parse_posix_locale("C.UTF-8"), None);
        assert_eq!(parse_posix_locale("POSIX"), None);
        assert_eq!(parse_posix_locale(""), None);
    }

    #[test]
    fn test_env_provider_order() {
        let provider = EnvLocaleProvider::from_vars([
            ("LANGUAGE", "es_MX:es"),
            ("LC_ALL", ""),
            ("LANG", "en_US.UTF-8"),
        ]);

        let locales = provider.locales().unwrap();
        assert_eq!(
            locales,
            vec![
                LocaleSignal::new("es-MX", Some("MX")),
                LocaleSignal::new("es", None),
                LocaleSignal::new("en-US", Some("US")),
            ]
        );
        assert_eq!(provider.region().as_deref(), Some("US"));
        assert_eq!(provider.locale().as_deref(), Some("en-US"));
    }

    #[test]
    fn test_env_provider_without_language() {
        let provider = EnvLocaleProvider::from_vars([("LANG", "C")]);
        assert_eq!(provider.locales(), None);
        assert_eq!(provider.region(), None);

        let signals = provider.signals();
        assert_eq!(signals.primary_region(), None);
        assert_eq!(signals.primary_tag(), None);
    }

    #[test]
    fn test_primary_region_falls_back_to_scalar() {
        let signals = LocaleSignalSet {
            locales: Some(vec![LocaleSignal::new("ar", None)]),
            region: Some("eg".to_string()),
            locale: Some("en-US".to_string()),
        };
        assert_eq!(signals.primary_region().as_deref(), Some("EG"));
        assert_eq!(signals.primary_tag().as_deref(), Some("ar"));

        let legacy = LocaleSignalSet {
            locales: None,
            region: None,
            locale: Some("TR-tr".to_string()),
        };
        assert_eq!(legacy.primary_region(), None);
        assert_eq!(legacy.primary_tag().as_deref(), Some("tr-tr"));
    }
}
