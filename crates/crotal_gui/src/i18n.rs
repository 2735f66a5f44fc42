//! Spanish/English UI strings.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Spanish,
    English,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LanguagePreference {
    #[default]
    System,
    Spanish,
    English,
}

impl LanguagePreference {
    pub fn resolve(self) -> Language {
        match self {
            LanguagePreference::Spanish => Language::Spanish,
            LanguagePreference::English => Language::English,
            LanguagePreference::System => from_locale(sys_locale::get_locale().as_deref()),
        }
    }
}

/// Spanish for any `es*` locale, English otherwise.
pub fn from_locale(locale: Option<&str>) -> Language {
    match locale {
        Some(tag) if tag.to_ascii_lowercase().starts_with("es") => Language::Spanish,
        _ => Language::English,
    }
}

impl Language {
    pub fn pick<'a>(self, es: &'a str, en: &'a str) -> &'a str {
        match self {
            Language::Spanish => es,
            Language::English => en,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some("es-ES"), Language::Spanish)]
    #[case(Some("ES_mx"), Language::Spanish)]
    #[case(Some("en-GB"), Language::English)]
    #[case(Some("nl-NL"), Language::English)]
    #[case(None, Language::English)]
    fn locale_maps_to_language(#[case] locale: Option<&str>, #[case] expected: Language) {
        assert_eq!(from_locale(locale), expected);
    }

    #[test]
    fn explicit_preference_wins() {
        assert_eq!(LanguagePreference::Spanish.resolve(), Language::Spanish);
        assert_eq!(Language::English.pick("Cancelar", "Cancel"), "Cancel");
    }
}
