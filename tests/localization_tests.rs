//! # Localization Tests
//!
//! This module contains unit tests for the localization functionality,
//! testing message retrieval and formatting with various edge cases.

use coffee_bot::localization::{detect_language, t_args_lang, t_lang, LocalizationManager};
use coffee_bot::navigation::Notice;
use std::collections::HashMap;

/// Every key the bot renders
const KEYS: &[&str] = &[
    "back",
    "price",
    "menu-title",
    "menu-description",
    "menu-pitch",
    "menu-catalog",
    "menu-cart",
    "menu-orders",
    "menu-help",
    "catalog-title",
    "catalog-description",
    "item-price",
    "item-add-to-cart",
    "item-in-cart",
    "cart-title",
    "cart-empty",
    "cart-review",
    "cart-checkout",
    "cart-go-to-catalog",
    "cart-unavailable",
    "cart-remove-unavailable",
    "order-title",
    "order-line",
    "order-total",
    "orders-title",
    "orders-empty",
    "orders-entry",
    "help-title",
    "help-body",
];

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_localization() -> LocalizationManager {
        LocalizationManager::new().expect("Failed to create localization manager")
    }

    #[test]
    fn test_every_key_is_translated() {
        let manager = setup_localization();

        let notices = [
            Notice::OrderPlaced,
            Notice::ItemNotFound,
            Notice::ItemUnavailable,
            Notice::OrderNotFound,
            Notice::EmptyCart,
            Notice::Failure,
        ];
        let keys = KEYS
            .iter()
            .copied()
            .chain(notices.iter().map(|notice| notice.message_key()));

        for key in keys {
            for language in ["en", "ru"] {
                let message = manager.get_message_in_language(key, language, None);
                assert!(
                    !message.starts_with("Missing translation"),
                    "{key} is missing in {language}"
                );
            }
        }
    }

    #[test]
    fn test_get_message_nonexistent_key() {
        let manager = setup_localization();

        let message = manager.get_message_in_language("nonexistent-key", "en", None);
        assert!(message.starts_with("Missing translation:"));
    }

    #[test]
    fn test_get_message_unsupported_language() {
        let manager = setup_localization();

        let message = manager.get_message_in_language("menu-cart", "unsupported", None);
        // Should fall back to English
        assert_eq!(message, "Cart");
    }

    #[test]
    fn test_get_message_with_args() {
        let manager = setup_localization();

        let mut args = HashMap::new();
        args.insert("name", "Latte");
        args.insert("count", "2");
        args.insert("price", "200 ₽");

        let message = manager.get_message_in_language("order-line", "en", Some(&args));
        assert_eq!(message, "Latte · 2 pcs · 200 ₽");

        let message = manager.get_message_in_language("order-line", "ru", Some(&args));
        assert_eq!(message, "Latte · 2 шт. · 200 ₽");
    }

    #[test]
    fn test_get_message_missing_args() {
        let manager = setup_localization();

        // Formatting errors are logged, the rest of the message is kept
        let message = manager.get_message_in_language("cart-checkout", "en", None);
        assert!(message.starts_with("Checkout"));
    }

    #[test]
    fn test_russian_differs_from_english() {
        let manager = setup_localization();

        let russian = manager.get_message_in_language("help-body", "ru", None);
        let english = manager.get_message_in_language("help-body", "en", None);
        assert_ne!(russian, english);
    }

    #[test]
    fn test_language_detection() {
        assert_eq!(detect_language(Some("en")), "en");
        assert_eq!(detect_language(Some("en-US")), "en");
        assert_eq!(detect_language(Some("ru")), "ru");
        assert_eq!(detect_language(Some("ru-UA")), "ru");
        assert_eq!(detect_language(None), "en"); // Default to English
        assert_eq!(detect_language(Some("unsupported")), "en"); // Fallback to English
    }

    #[test]
    fn test_convenience_functions() {
        assert_eq!(t_lang("menu-orders", "ru"), "Мои заказы");

        let price = t_args_lang("price", &[("amount", "350")], "ru");
        assert_eq!(price, "350₽");
        let price = t_args_lang("price", &[("amount", "350")], "en");
        assert_eq!(price, "350 ₽");
    }
}
