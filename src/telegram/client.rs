//! Teloxide-backed Telegram client
//!
//! Thin adapter from the `TelegramClient` seam onto `teloxide::Bot`. Every
//! method is a single Bot API call; error classification is the only logic
//! here.

use async_trait::async_trait;
use teloxide::payloads::{SendMessageSetters, SendVideoSetters};
use teloxide::requests::Requester;
use teloxide::types::{
    ChatId as TgChatId, InlineKeyboardButton, InlineKeyboardMarkup, InputFile,
    MessageId as TgMessageId, Recipient, UserId as TgUserId,
};
use teloxide::{Bot, RequestError};
use url::Url;

use super::traits::*;

/// Production client over the Bot API.
#[derive(Clone)]
pub struct ApiTelegramClient {
    bot: Bot,
}

impl ApiTelegramClient {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

fn map_err(e: RequestError) -> TelegramError {
    match e {
        RequestError::Api(api) => TelegramError::Api(api.to_string()),
        other => TelegramError::Network(other.to_string()),
    }
}

fn receipt_of(msg: &teloxide::types::Message) -> Receipt {
    Receipt {
        chat: ChatId(msg.chat.id.0),
        message: MessageId(msg.id.0),
    }
}

fn to_markup(keyboard: &Keyboard) -> TelegramResult<InlineKeyboardMarkup> {
    let mut rows = Vec::with_capacity(keyboard.0.len());
    for row in &keyboard.0 {
        let mut buttons = Vec::with_capacity(row.len());
        for button in row {
            buttons.push(match button {
                Button::Url { label, url } => {
                    let url = Url::parse(url)
                        .map_err(|e| TelegramError::BadRequest(format!("button url: {e}")))?;
                    InlineKeyboardButton::url(label.clone(), url)
                }
                Button::Callback { label, data } => {
                    InlineKeyboardButton::callback(label.clone(), data.clone())
                }
            });
        }
        rows.push(buttons);
    }
    Ok(InlineKeyboardMarkup::new(rows))
}

#[async_trait]
impl TelegramClient for ApiTelegramClient {
    async fn send_text(&self, chat: ChatId, text: &str) -> TelegramResult<Receipt> {
        let msg = self
            .bot
            .send_message(TgChatId(chat.0), text)
            .await
            .map_err(map_err)?;
        Ok(receipt_of(&msg))
    }

    async fn send_text_with_keyboard(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: &Keyboard,
    ) -> TelegramResult<Receipt> {
        let markup = to_markup(keyboard)?;
        let msg = self
            .bot
            .send_message(TgChatId(chat.0), text)
            .reply_markup(markup)
            .await
            .map_err(map_err)?;
        Ok(receipt_of(&msg))
    }

    async fn send_video(
        &self,
        chat: ChatId,
        file: &FileHandle,
        caption: &str,
    ) -> TelegramResult<Receipt> {
        let msg = self
            .bot
            .send_video(TgChatId(chat.0), InputFile::file_id(file.0.clone()))
            .caption(caption.to_string())
            .await
            .map_err(map_err)?;
        Ok(receipt_of(&msg))
    }

    async fn edit_text(&self, chat: ChatId, message: MessageId, text: &str) -> TelegramResult<()> {
        self.bot
            .edit_message_text(TgChatId(chat.0), TgMessageId(message.0), text)
            .await
            .map_err(map_err)?;
        Ok(())
    }

    async fn delete_message(&self, chat: ChatId, message: MessageId) -> TelegramResult<()> {
        self.bot
            .delete_message(TgChatId(chat.0), TgMessageId(message.0))
            .await
            .map_err(map_err)?;
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str) -> TelegramResult<()> {
        self.bot
            .answer_callback_query(callback_id.to_string())
            .await
            .map_err(map_err)?;
        Ok(())
    }

    async fn member_status(&self, channel: &str, user: UserId) -> TelegramResult<MemberStatus> {
        let member = self
            .bot
            .get_chat_member(
                Recipient::ChannelUsername(channel.to_string()),
                TgUserId(user.0),
            )
            .await
            .map_err(map_err)?;

        let kind = &member.kind;
        Ok(if kind.is_owner() {
            MemberStatus::Owner
        } else if kind.is_administrator() {
            MemberStatus::Administrator
        } else if kind.is_member() {
            MemberStatus::Member
        } else if kind.is_restricted() {
            MemberStatus::Restricted
        } else if kind.is_left() {
            MemberStatus::Left
        } else {
            MemberStatus::Banned
        })
    }

    async fn bot_username(&self) -> TelegramResult<String> {
        let me = self.bot.get_me().await.map_err(map_err)?;
        Ok(me.username().to_string())
    }
}
