//! Telegram Client Trait Abstractions
//!
//! These traits enable full test coverage via MockTelegramClient: every
//! handler runs against this seam, never against the Bot API directly.

use async_trait::async_trait;
use std::fmt;

/// Telegram chat identifier (private chat, group, or channel)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Telegram user identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(pub u64);

/// Message identifier, unique within one chat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque reference to media previously uploaded to Telegram.
///
/// Meaningful only to the Bot API; the bot stores and forwards it, never
/// inspects it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandle(pub String);

/// Receipt for a sent message, used to address it later (deletion)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Receipt {
    pub chat: ChatId,
    pub message: MessageId,
}

/// Chat-member status as reported by the Bot API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberStatus {
    Owner,
    Administrator,
    Member,
    Restricted,
    Left,
    Banned,
}

impl MemberStatus {
    /// Statuses that count as channel membership for gating purposes.
    ///
    /// Restricted users are present in the chat but do not qualify.
    pub fn grants_access(self) -> bool {
        matches!(
            self,
            MemberStatus::Owner | MemberStatus::Administrator | MemberStatus::Member
        )
    }
}

/// Inline keyboard attached to a prompt message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyboard(pub Vec<Vec<Button>>);

/// One inline keyboard button
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Button {
    /// Opens an external URL
    Url { label: String, url: String },
    /// Sends a callback query carrying `data` back to the bot
    Callback { label: String, data: String },
}

impl Button {
    pub fn url(label: impl Into<String>, url: impl Into<String>) -> Self {
        Button::Url {
            label: label.into(),
            url: url.into(),
        }
    }

    pub fn callback(label: impl Into<String>, data: impl Into<String>) -> Self {
        Button::Callback {
            label: label.into(),
            data: data.into(),
        }
    }
}

/// Inbound update, normalized by the transport layer
#[derive(Debug, Clone)]
pub enum Event {
    /// `/start [token]` command in a private chat
    Start {
        chat: ChatId,
        user: UserId,
        token: Option<String>,
    },
    /// Video or document upload
    Upload {
        chat: ChatId,
        user: UserId,
        file: FileHandle,
        kind: UploadKind,
    },
    /// Click on the membership re-check button
    Retry {
        callback_id: String,
        chat: ChatId,
        prompt: MessageId,
        user: UserId,
        payload: String,
    },
}

/// Declared kind of an uploaded attachment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadKind {
    /// Sent as a native Telegram video
    Video,
    /// Sent as a generic document; `mime` is the declared MIME type, if any
    Document { mime: Option<String> },
}

impl UploadKind {
    /// Video-like classification: declared video kind, or a document whose
    /// MIME type starts with `video/`.
    pub fn is_video(&self) -> bool {
        match self {
            UploadKind::Video => true,
            UploadKind::Document { mime: Some(m) } => m.starts_with("video/"),
            UploadKind::Document { mime: None } => false,
        }
    }
}

/// Result type for Telegram operations
pub type TelegramResult<T> = Result<T, TelegramError>;

/// Telegram client errors
#[derive(Debug, thiserror::Error)]
pub enum TelegramError {
    #[error("network error: {0}")]
    Network(String),

    #[error("Bot API error: {0}")]
    Api(String),

    #[error("invalid request: {0}")]
    BadRequest(String),
}

/// Telegram client abstraction.
///
/// Implemented by `ApiTelegramClient` (teloxide-backed) in production and by
/// `MockTelegramClient` in tests. All methods are a single Bot API call; no
/// implementation retries.
#[async_trait]
pub trait TelegramClient: Clone + Send + Sync + 'static {
    /// Send a plain text message
    async fn send_text(&self, chat: ChatId, text: &str) -> TelegramResult<Receipt>;

    /// Send a text message with an inline keyboard
    async fn send_text_with_keyboard(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: &Keyboard,
    ) -> TelegramResult<Receipt>;

    /// Send a video by file handle with a caption
    async fn send_video(
        &self,
        chat: ChatId,
        file: &FileHandle,
        caption: &str,
    ) -> TelegramResult<Receipt>;

    /// Replace the text of an already-sent message
    async fn edit_text(&self, chat: ChatId, message: MessageId, text: &str) -> TelegramResult<()>;

    /// Delete a message
    async fn delete_message(&self, chat: ChatId, message: MessageId) -> TelegramResult<()>;

    /// Acknowledge a callback query so the client stops its spinner
    async fn answer_callback(&self, callback_id: &str) -> TelegramResult<()>;

    /// Query a user's membership status in a channel (`@username` form)
    async fn member_status(&self, channel: &str, user: UserId) -> TelegramResult<MemberStatus>;

    /// The bot's own username, for composing deep links
    async fn bot_username(&self) -> TelegramResult<String>;
}
