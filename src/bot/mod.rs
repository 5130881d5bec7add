//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules:
//! - `message_handler`: Answers typed messages with the main menu
//! - `callback_handler`: Handles inline keyboard callback queries
//! - `ui_builder`: Renders screens into text and keyboards
//! - `presenter`: Sends or edits messages to show a rendered screen

pub mod callback_handler;
pub mod message_handler;
pub mod presenter;
pub mod ui_builder;

use teloxide::types::User;

use crate::config::BotConfig;
use crate::localization::supported_language;
use crate::navigation::Navigator;
use ui_builder::RenderContext;

// Re-export main handler functions for use in main.rs
pub use callback_handler::callback_handler;
pub use message_handler::message_handler;

/// UI language for a Telegram user, falling back to the configured default
pub fn user_language<'a>(user: Option<&User>, config: &'a BotConfig) -> &'a str {
    user.and_then(|user| user.language_code.as_deref())
        .and_then(supported_language)
        .unwrap_or(config.default_language.as_str())
}

fn render_context<'a>(
    navigator: &'a Navigator,
    config: &'a BotConfig,
    language: &'a str,
) -> RenderContext<'a> {
    RenderContext {
        catalog: navigator.catalog(),
        language,
        utc_offset: config.display_utc_offset,
    }
}
