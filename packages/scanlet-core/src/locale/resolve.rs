//! Device language resolution.
//!
//! Precedence, first match wins:
//! 1. primary region is `TR` -> Turkish
//! 2. primary region in [`ARABIC_REGIONS`] -> Arabic
//! 3. primary region in [`SPANISH_REGIONS`] -> Spanish
//! 4. primary language tag contains `tr`, then `ar`, then `es`
//! 5. English
//!
//! Step 4 runs whenever no region rule matched, including when a region is
//! present but belongs to none of the sets (`US` + `es-US` is Spanish).

use super::language::LanguageCode;
use super::signals::LocaleSignalSet;

const TURKEY: &str = "TR";

/// Regions where Arabic is the display language.
pub const ARABIC_REGIONS: &[&str] = &[
    "AE", "BH", "DZ", "EG", "IQ", "JO", "KW", "LB", "LY", "MA", "MR", "OM", "PS", "QA", "SA",
    "SD", "SY", "TN", "YE",
];

/// Regions where Spanish is the display language.
pub const SPANISH_REGIONS: &[&str] = &[
    "AR", "BO", "CL", "CO", "CR", "CU", "DO", "EC", "ES", "GQ", "GT", "HN", "MX", "NI", "PA",
    "PE", "PR", "PY", "SV", "UY", "VE",
];

/// Tag fragments checked in order when no region rule applies.
const TAG_RULES: [(&str, LanguageCode); 3] = [
    ("tr", LanguageCode::Tr),
    ("ar", LanguageCode::Ar),
    ("es", LanguageCode::Es),
];

fn language_for_region(region: &str) -> Option<LanguageCode> {
    if region == TURKEY {
        Some(LanguageCode::Tr)
    } else if ARABIC_REGIONS.contains(&region) {
        Some(LanguageCode::Ar)
    } else if SPANISH_REGIONS.contains(&region) {
        Some(LanguageCode::Es)
    } else {
        None
    }
}

fn language_for_tag(tag: &str) -> Option<LanguageCode> {
    TAG_RULES
        .iter()
        .find(|(fragment, _)| tag.contains(fragment))
        .map(|(_, code)| *code)
}

/// Pick the display language for a device. Always returns a supported code.
pub fn resolve_device_language(signals: &LocaleSignalSet) -> LanguageCode {
    if let Some(code) = signals
        .primary_region()
        .as_deref()
        .and_then(language_for_region)
    {
        return code;
    }

    signals
        .primary_tag()
        .as_deref()
        .and_then(language_for_tag)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::signals::LocaleSignal;

    fn device(tag: &str, region: Option<&str>) -> LocaleSignalSet {
        LocaleSignalSet {
            locales: Some(vec![LocaleSignal::new(tag, region)]),
            region: None,
            locale: None,
        }
    }

    #[test]
    fn test_region_rules() {
        assert_eq!(resolve_device_language(&device("en-TR", Some("TR"))), LanguageCode::Tr);
        assert_eq!(resolve_device_language(&device("de", Some("tr"))), LanguageCode::Tr);
        assert_eq!(resolve_device_language(&device("en-EG", Some("EG"))), LanguageCode::Ar);
        assert_eq!(resolve_device_language(&device("en-MX", Some("MX"))), LanguageCode::Es);
    }

    #[test]
    fn test_region_beats_tag() {
        assert_eq!(resolve_device_language(&device("es-TR", Some("TR"))), LanguageCode::Tr);
        assert_eq!(resolve_device_language(&device("tr-SA", Some("SA"))), LanguageCode::Ar);
        assert_eq!(resolve_device_language(&device("ar-ES", Some("ES"))), LanguageCode::Es);
    }

    #[test]
    fn test_unmatched_region_falls_through_to_tag() {
        assert_eq!(resolve_device_language(&device("es-US", Some("US"))), LanguageCode::Es);
        assert_eq!(resolve_device_language(&device("tr-DE", Some("DE"))), LanguageCode::Tr);
        assert_eq!(resolve_device_language(&device("ar-FR", Some("FR"))), LanguageCode::Ar);
    }

    #[test]
    fn test_tag_order() {
        // Contains both "ar" and "es"; "ar" is checked first.
        assert_eq!(resolve_device_language(&device("ar-es", None)), LanguageCode::Ar);
        assert_eq!(resolve_device_language(&device("es-TR-x-ar", None)), LanguageCode::Tr);
    }

    #[test]
    fn test_defaults_to_english() {
        assert_eq!(resolve_device_language(&device("en-US", Some("US"))), LanguageCode::En);
        assert_eq!(resolve_device_language(&device("de-DE", Some("DE"))), LanguageCode::En);
        assert_eq!(resolve_device_language(&LocaleSignalSet::default()), LanguageCode::En);
        assert_eq!(
            resolve_device_language(&LocaleSignalSet {
                locales: Some(Vec::new()),
                region: None,
                locale: None,
            }),
            LanguageCode::En
        );
    }

    #[test]
    fn test_scalar_fallbacks_when_list_unavailable() {
        let region_only = LocaleSignalSet {
            locales: None,
            region: Some("eg".to_string()),
            locale: Some("en-EG".to_string()),
        };
        assert_eq!(resolve_device_language(&region_only), LanguageCode::Ar);

        let legacy_locale = LocaleSignalSet {
            locales: None,
            region: None,
            locale: Some("es_US".to_string()),
        };
        assert_eq!(resolve_device_language(&legacy_locale), LanguageCode::Es);
    }

    #[test]
    fn test_only_first_locale_counts() {
        let signals = LocaleSignalSet {
            locales: Some(vec![
                LocaleSignal::new("en-GB", Some("GB")),
                LocaleSignal::new("tr-TR", Some("TR")),
            ]),
            region: Some("TR".to_string()),
            locale: None,
        };
        assert_eq!(resolve_device_language(&signals), LanguageCode::En);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let signals = device("es-US", Some("US"));
        let first = resolve_device_language(&signals);
        for _ in 0..10 {
            assert_eq!(resolve_device_language(&signals.clone()), first);
        }
    }
}
