//! Callback Handler module for processing inline keyboard callback queries

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::ChatId;
use teloxide::RequestError;
use tracing::{debug, error, warn};

use crate::config::BotConfig;
use crate::localization::t_lang;
use crate::model::UserId;
use crate::navigation::{Navigator, Notice, Transition};
use crate::route::Route;

use super::presenter::{present, CurrentMessage};
use super::ui_builder::render;
use super::{render_context, user_language};

/// Handle callback queries from inline keyboards
pub async fn callback_handler(
    bot: Bot,
    q: CallbackQuery,
    navigator: Arc<Navigator>,
    config: Arc<BotConfig>,
) -> Result<()> {
    let user = UserId::from(q.from.id);
    let language = user_language(Some(&q.from), &config);
    let route = Route::parse_or_menu(q.data.as_deref());
    debug!(user_id = %user, data = ?q.data, route = %route, "Received callback query");

    let transition = match navigator.dispatch(user, &route).await {
        Ok(transition) => transition,
        Err(e) => {
            // Keep the current screen; the user can press the button again
            error!(user_id = %user, route = %route, error = %e, "Failed to handle callback query");
            Transition::notice(Notice::Failure)
        }
    };

    // Answer the callback query to remove the loading state
    let answer = bot.answer_callback_query(q.id.clone());
    let answered = match transition.notice {
        Some(notice) => answer.text(t_lang(notice.message_key(), language)).await,
        None => answer.await,
    };
    log_answer_failure(answered, user);

    let Some(screen) = transition.screen else {
        return Ok(());
    };
    let view = render(&screen, &render_context(&navigator, &config, language));

    let (chat_id, current) = match q.message.as_ref().and_then(|m| m.regular_message()) {
        Some(msg) => (msg.chat.id, CurrentMessage::of(msg)),
        // Too old to edit: continue in the private chat with a fresh message
        None => (ChatId::from(q.from.id), CurrentMessage::None),
    };

    if let Err(e) = present(&bot, chat_id, current, view).await {
        error!(user_id = %user, chat_id = %chat_id, error = %e, "Failed to show screen");
        return Err(e.into());
    }

    Ok(())
}

/// An expired or already answered query must not keep the screen from showing
fn log_answer_failure<T>(result: Result<T, RequestError>, user: UserId) -> bool {
    match result {
        Ok(_) => true,
        Err(e) => {
            warn!(user_id = %user, error = %e, "Failed to answer callback query");
            false
        }
    }
}
