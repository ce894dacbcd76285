//! Mock Telegram Client for Testing
//!
//! Records every outbound side effect for assertions and lets tests script
//! membership status, gate-query failures, and deletion failures.

use super::traits::*;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Mock Telegram client. Clones share one recorded state.
#[derive(Clone)]
pub struct MockTelegramClient {
    state: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    sent_texts: Vec<SentText>,
    sent_videos: Vec<SentVideo>,
    edits: Vec<(Receipt, String)>,
    deleted: Vec<Receipt>,
    answered_callbacks: Vec<String>,
    member_status: HashMap<UserId, MemberStatus>,
    fail_member_status: bool,
    fail_deletes: bool,
    next_message_id: i32,
}

/// A recorded text message
#[derive(Debug, Clone)]
pub struct SentText {
    pub receipt: Receipt,
    pub text: String,
    pub keyboard: Option<Keyboard>,
}

/// A recorded video message
#[derive(Debug, Clone)]
pub struct SentVideo {
    pub receipt: Receipt,
    pub file: FileHandle,
    pub caption: String,
}

impl MockTelegramClient {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Script the status the channel reports for a user. Users without an
    /// entry report `Left`.
    pub fn set_member_status(&self, user: UserId, status: MemberStatus) {
        self.state.lock().unwrap().member_status.insert(user, status);
    }

    /// Make every `member_status` call fail with a network error.
    pub fn fail_member_status(&self, fail: bool) {
        self.state.lock().unwrap().fail_member_status = fail;
    }

    /// Make every `delete_message` call fail with a Bot API error.
    pub fn fail_deletes(&self, fail: bool) {
        self.state.lock().unwrap().fail_deletes = fail;
    }

    /// All text messages sent so far
    pub fn sent_texts(&self) -> Vec<SentText> {
        self.state.lock().unwrap().sent_texts.clone()
    }

    /// All videos sent so far
    pub fn sent_videos(&self) -> Vec<SentVideo> {
        self.state.lock().unwrap().sent_videos.clone()
    }

    /// All edits applied so far
    pub fn edits(&self) -> Vec<(Receipt, String)> {
        self.state.lock().unwrap().edits.clone()
    }

    /// All messages deleted so far
    pub fn deleted(&self) -> Vec<Receipt> {
        self.state.lock().unwrap().deleted.clone()
    }

    /// All callback queries answered so far
    pub fn answered_callbacks(&self) -> Vec<String> {
        self.state.lock().unwrap().answered_callbacks.clone()
    }

    /// True if no outbound call of any kind was recorded
    pub fn is_silent(&self) -> bool {
        let state = self.state.lock().unwrap();
        state.sent_texts.is_empty()
            && state.sent_videos.is_empty()
            && state.edits.is_empty()
            && state.deleted.is_empty()
    }
}

impl Default for MockTelegramClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockState {
    fn next_receipt(&mut self, chat: ChatId) -> Receipt {
        self.next_message_id += 1;
        Receipt {
            chat,
            message: MessageId(self.next_message_id),
        }
    }
}

#[async_trait]
impl TelegramClient for MockTelegramClient {
    async fn send_text(&self, chat: ChatId, text: &str) -> TelegramResult<Receipt> {
        let mut state = self.state.lock().unwrap();
        let receipt = state.next_receipt(chat);
        state.sent_texts.push(SentText {
            receipt,
            text: text.to_string(),
            keyboard: None,
        });
        Ok(receipt)
    }

    async fn send_text_with_keyboard(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: &Keyboard,
    ) -> TelegramResult<Receipt> {
        let mut state = self.state.lock().unwrap();
        let receipt = state.next_receipt(chat);
        state.sent_texts.push(SentText {
            receipt,
            text: text.to_string(),
            keyboard: Some(keyboard.clone()),
        });
        Ok(receipt)
    }

    async fn send_video(
        &self,
        chat: ChatId,
        file: &FileHandle,
        caption: &str,
    ) -> TelegramResult<Receipt> {
        let mut state = self.state.lock().unwrap();
        let receipt = state.next_receipt(chat);
        state.sent_videos.push(SentVideo {
            receipt,
            file: file.clone(),
            caption: caption.to_string(),
        });
        Ok(receipt)
    }

    async fn edit_text(&self, chat: ChatId, message: MessageId, text: &str) -> TelegramResult<()> {
        let mut state = self.state.lock().unwrap();
        state.edits.push((Receipt { chat, message }, text.to_string()));
        Ok(())
    }

    async fn delete_message(&self, chat: ChatId, message: MessageId) -> TelegramResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_deletes {
            return Err(TelegramError::Api("message to delete not found".to_string()));
        }
        state.deleted.push(Receipt { chat, message });
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str) -> TelegramResult<()> {
        let mut state = self.state.lock().unwrap();
        state.answered_callbacks.push(callback_id.to_string());
        Ok(())
    }

    async fn member_status(&self, _channel: &str, user: UserId) -> TelegramResult<MemberStatus> {
        let state = self.state.lock().unwrap();
        if state.fail_member_status {
            return Err(TelegramError::Network("connection reset".to_string()));
        }
        Ok(state
            .member_status
            .get(&user)
            .copied()
            .unwrap_or(MemberStatus::Left))
    }

    async fn bot_username(&self) -> TelegramResult<String> {
        Ok("linkgate_bot".to_string())
    }
}
