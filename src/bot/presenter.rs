//! Presenter module for delivering rendered views to a chat
//!
//! Every screen is shown by editing the message whose button was pressed when
//! possible. Telegram cannot turn a text message into a photo (or back), so
//! those transitions delete the old message and send a new one.

use std::path::Path;
use teloxide::prelude::*;
use teloxide::types::{ChatId, InputFile, MessageId, ParseMode};
use teloxide::{ApiError, RequestError};
use tracing::{debug, warn};

use super::ui_builder::View;

/// The message a screen is about to replace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrentMessage {
    /// Nothing to replace, e.g. a reply to a typed message
    None,
    Text(MessageId),
    Photo(MessageId),
}

impl CurrentMessage {
    pub fn of(message: &Message) -> Self {
        if message.photo().is_some() {
            CurrentMessage::Photo(message.id)
        } else {
            CurrentMessage::Text(message.id)
        }
    }
}

/// How a view reaches the chat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    SendNew,
    EditText(MessageId),
    EditCaption(MessageId),
    /// Delete the message, then send a new one
    Replace(MessageId),
}

/// Pick the delivery for a view given the message it replaces
pub fn plan_delivery(current: CurrentMessage, with_image: bool) -> Delivery {
    match (current, with_image) {
        (CurrentMessage::None, _) => Delivery::SendNew,
        (CurrentMessage::Text(id), false) => Delivery::EditText(id),
        (CurrentMessage::Text(id), true) => Delivery::Replace(id),
        (CurrentMessage::Photo(id), true) => Delivery::EditCaption(id),
        (CurrentMessage::Photo(id), false) => Delivery::Replace(id),
    }
}

/// Show `view` in `chat_id`, replacing `current`
pub async fn present(
    bot: &Bot,
    chat_id: ChatId,
    current: CurrentMessage,
    view: View,
) -> Result<(), RequestError> {
    let mut image = view.image.clone();
    if let Some(path) = image.as_deref() {
        if !image_exists(path).await {
            warn!(path = %path.display(), "Item image is missing, showing text instead");
            image = None;
        }
    }

    let delivery = plan_delivery(current, image.is_some());
    debug!(chat_id = %chat_id, delivery = ?delivery, "Presenting view");

    match delivery {
        Delivery::SendNew => send(bot, chat_id, view, image.as_deref()).await,
        Delivery::EditText(message_id) => ignore_not_modified(
            bot.edit_message_text(chat_id, message_id, view.text)
                .parse_mode(ParseMode::Html)
                .reply_markup(view.keyboard)
                .await,
        ),
        Delivery::EditCaption(message_id) => ignore_not_modified(
            bot.edit_message_caption(chat_id, message_id)
                .caption(view.text)
                .parse_mode(ParseMode::Html)
                .reply_markup(view.keyboard)
                .await,
        ),
        Delivery::Replace(message_id) => {
            if let Err(e) = bot.delete_message(chat_id, message_id).await {
                // Old messages (48h+) cannot be deleted; the new one is still sent
                warn!(chat_id = %chat_id, error = %e, "Failed to delete previous message");
            }
            send(bot, chat_id, view, image.as_deref()).await
        }
    }
}

async fn send(
    bot: &Bot,
    chat_id: ChatId,
    view: View,
    image: Option<&Path>,
) -> Result<(), RequestError> {
    match image {
        Some(path) => {
            bot.send_photo(chat_id, InputFile::file(path))
                .caption(view.text)
                .parse_mode(ParseMode::Html)
                .reply_markup(view.keyboard)
                .await?;
        }
        None => {
            bot.send_message(chat_id, view.text)
                .parse_mode(ParseMode::Html)
                .reply_markup(view.keyboard)
                .await?;
        }
    }
    Ok(())
}

async fn image_exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

/// Pressing a button that re-renders the same screen is not an error
fn ignore_not_modified<T>(result: Result<T, RequestError>) -> Result<(), RequestError> {
    match result {
        Ok(_) => Ok(()),
        Err(RequestError::Api(ApiError::MessageNotModified)) => {
            debug!("Message not modified, nothing to update");
            Ok(())
        }
        Err(e) => Err(e),
    }
}
