//! # Localization Module
//!
//! User-facing strings are kept in Fluent files under `locales/<lang>/main.ftl`
//! and compiled into the binary. The language is picked from the Telegram
//! user's `language_code`; unsupported languages fall back to English.

use fluent_bundle::concurrent::FluentBundle;
use fluent_bundle::{FluentArgs, FluentResource, FluentValue};
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::error;
use unic_langid::LanguageIdentifier;

/// Language used when nothing better is known
pub const DEFAULT_LANGUAGE: &str = "en";

const RESOURCES: &[(&str, &str)] = &[
    ("en", include_str!("../locales/en/main.ftl")),
    ("ru", include_str!("../locales/ru/main.ftl")),
];

/// Localization manager for the Coffee Bot
pub struct LocalizationManager {
    bundles: HashMap<String, Arc<FluentBundle<FluentResource>>>,
}

impl LocalizationManager {
    /// Create a new localization manager with every bundled language
    pub fn new() -> anyhow::Result<Self> {
        let mut bundles = HashMap::new();

        for (language, source) in RESOURCES {
            let locale: LanguageIdentifier = language.parse()?;
            let bundle = Self::create_bundle(&locale, source)?;
            bundles.insert(language.to_string(), Arc::new(bundle));
        }

        Ok(Self { bundles })
    }

    fn empty() -> Self {
        Self {
            bundles: HashMap::new(),
        }
    }

    /// Create a fluent bundle for a specific locale
    fn create_bundle(
        locale: &LanguageIdentifier,
        source: &str,
    ) -> anyhow::Result<FluentBundle<FluentResource>> {
        let mut bundle = FluentBundle::new_concurrent(vec![locale.clone()]);
        // Telegram renders the Unicode isolation marks literally
        bundle.set_use_isolating(false);

        let resource = FluentResource::try_new(source.to_string())
            .map_err(|(_, errors)| anyhow::anyhow!("Invalid {locale} resource: {errors:?}"))?;
        bundle
            .add_resource(resource)
            .map_err(|errors| anyhow::anyhow!("Duplicate {locale} messages: {errors:?}"))?;

        Ok(bundle)
    }

    /// Check if a language is supported
    pub fn is_language_supported(&self, language: &str) -> bool {
        self.bundles.contains_key(language)
    }

    /// Get a localized message in a specific language
    pub fn get_message_in_language(
        &self,
        key: &str,
        language: &str,
        args: Option<&HashMap<&str, &str>>,
    ) -> String {
        let bundle = match self
            .bundles
            .get(language)
            .or_else(|| self.bundles.get(DEFAULT_LANGUAGE))
        {
            Some(bundle) => bundle,
            None => return format!("Missing translation: {key}"),
        };

        let Some(pattern) = bundle.get_message(key).and_then(|msg| msg.value()) else {
            return format!("Missing translation: {key}");
        };

        let fluent_args = args.map(|args| {
            args.iter()
                .map(|(k, v)| (*k, FluentValue::from(*v)))
                .collect::<FluentArgs>()
        });

        let mut errors = vec![];
        let value = bundle.format_pattern(pattern, fluent_args.as_ref(), &mut errors);
        if !errors.is_empty() {
            error!(key = %key, language = %language, errors = ?errors, "Failed to format message");
        }

        value.into_owned()
    }
}

lazy_static! {
    static ref LOCALIZATION: LocalizationManager = LocalizationManager::new().unwrap_or_else(|e| {
        error!(error = %e, "Failed to load localization resources");
        LocalizationManager::empty()
    });
}

/// Get the global localization manager
pub fn get_localization_manager() -> &'static LocalizationManager {
    &LOCALIZATION
}

/// Map a Telegram language code such as `ru-RU` to a bundled language
pub fn supported_language(language_code: &str) -> Option<&'static str> {
    let code = language_code.split(['-', '_']).next()?.to_lowercase();
    RESOURCES
        .iter()
        .map(|(language, _)| *language)
        .find(|language| *language == code)
}

/// Language for a user, English when the code is missing or unsupported
pub fn detect_language(language_code: Option<&str>) -> &'static str {
    language_code
        .and_then(supported_language)
        .unwrap_or(DEFAULT_LANGUAGE)
}

/// Localized message in the given language
pub fn t_lang(key: &str, language: &str) -> String {
    get_localization_manager().get_message_in_language(key, language, None)
}

/// Localized message with arguments in the given language
pub fn t_args_lang(key: &str, args: &[(&str, &str)], language: &str) -> String {
    let args_map: HashMap<&str, &str> = args.iter().cloned().collect();
    get_localization_manager().get_message_in_language(key, language, Some(&args_map))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_language() {
        assert_eq!(detect_language(Some("ru")), "ru");
        assert_eq!(detect_language(Some("ru-RU")), "ru");
        assert_eq!(detect_language(Some("EN_us")), "en");
        assert_eq!(detect_language(Some("de")), "en");
        assert_eq!(detect_language(None), "en");
    }

    #[test]
    fn test_supported_language() {
        assert_eq!(supported_language("ru-RU"), Some("ru"));
        assert_eq!(supported_language("pt-BR"), None);
        assert_eq!(supported_language(""), None);
    }

    #[test]
    fn test_bundles_load() {
        let manager = LocalizationManager::new().unwrap();
        assert!(manager.is_language_supported("en"));
        assert!(manager.is_language_supported("ru"));
        assert!(!manager.is_language_supported("fr"));
    }

    #[test]
    fn test_args_are_substituted_without_isolation_marks() {
        let text = t_args_lang("cart-checkout", &[("total", "300 ₽")], "en");
        assert_eq!(text, "Checkout · 300 ₽");
    }
}
