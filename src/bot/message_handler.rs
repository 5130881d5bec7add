//! Message Handler module for typed messages
//!
//! The bot is driven by buttons. Any message, `/start` included, brings up a
//! fresh main menu.

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{debug, error};

use crate::config::BotConfig;
use crate::navigation::{Navigator, Screen};

use super::presenter::{present, CurrentMessage};
use super::ui_builder::render;
use super::{render_context, user_language};

pub async fn message_handler(
    bot: Bot,
    msg: Message,
    navigator: Arc<Navigator>,
    config: Arc<BotConfig>,
) -> Result<()> {
    let user_id = msg.from.as_ref().map(|user| user.id);
    debug!(chat_id = %msg.chat.id, user_id = ?user_id, "Received message");

    let language = user_language(msg.from.as_ref(), &config);
    let view = render(&Screen::Menu, &render_context(&navigator, &config, language));

    if let Err(e) = present(&bot, msg.chat.id, CurrentMessage::None, view).await {
        error!(chat_id = %msg.chat.id, error = %e, "Failed to send main menu");
        return Err(e.into());
    }

    Ok(())
}
