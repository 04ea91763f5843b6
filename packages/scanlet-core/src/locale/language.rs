use serde::{Deserialize, Serialize};

/// Languages the app ships translations for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageCode {
    #[default]
    En,
    Tr,
    Ar,
    Es,
}

/// Writing direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextDirection {
    Ltr,
    Rtl,
}

impl LanguageCode {
    pub const ALL: [LanguageCode; 4] = [
        LanguageCode::En,
        LanguageCode::Tr,
        LanguageCode::Ar,
        LanguageCode::Es,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LanguageCode::En => "en",
            LanguageCode::Tr => "tr",
            LanguageCode::Ar => "ar",
            LanguageCode::Es => "es",
        }
    }

    /// Name of the language in itself, for a language picker.
    pub fn native_name(self) -> &'static str {
        match self {
            LanguageCode::En => "English",
            LanguageCode::Tr => "Türkçe",
            LanguageCode::Ar => "العربية",
            LanguageCode::Es => "Español",
        }
    }

    /// Natural direction of the script. Layout ignores this, see
    /// [`LocaleContext::layout_direction`](super::LocaleContext::layout_direction).
    pub fn script_direction(self) -> TextDirection {
        match self {
            LanguageCode::Ar => TextDirection::Rtl,
            _ => TextDirection::Ltr,
        }
    }
}

impl std::fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Display for TextDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TextDirection::Ltr => write!(f, "ltr"),
            TextDirection::Rtl => write!(f, "rtl"),
        }
    }
}

impl std::str::FromStr for LanguageCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        LanguageCode::ALL
            .into_iter()
            .find(|code| code.as_str() == wanted)
            .ok_or_else(|| format!("unsupported language '{}'", s.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_supported_codes() {
        assert_eq!("tr".parse::<LanguageCode>(), Ok(LanguageCode::Tr));
        assert_eq!(" AR ".parse::<LanguageCode>(), Ok(LanguageCode::Ar));
        assert!("de".parse::<LanguageCode>().is_err());
        assert!("es-MX".parse::<LanguageCode>().is_err());
    }

    #[test]
    fn test_only_arabic_is_rtl() {
        assert_eq!(LanguageCode::Ar.script_direction(), TextDirection::Rtl);
        assert_eq!(LanguageCode::Tr.script_direction(), TextDirection::Ltr);
        assert_eq!(LanguageCode::default(), LanguageCode::En);
    }
}
