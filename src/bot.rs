//! Link Bot
//!
//! Ties the token store, membership gate, and delivery scheduler together:
//! - Issuance: admin uploads a video, gets a shareable deep link back
//! - Redemption: `/start <token>` or a retry-button click looks the token
//!   up, checks channel membership, and delivers on success
//!
//! Redemption states: AwaitingToken -> LookedUp -> {Invalid, MemberChecked};
//! MemberChecked -> {Delivered, AwaitingRetry}; AwaitingRetry re-enters
//! LookedUp on each retry click with the same token.

use tracing::{info, warn};

use crate::config::BotConfig;
use crate::delivery::DeliveryScheduler;
use crate::gate::MembershipGate;
use crate::store::{LinkStore, StoreError};
use crate::telegram::traits::{
    Button, ChatId, Event, FileHandle, Keyboard, MessageId, Receipt, TelegramClient,
    TelegramError, UploadKind, UserId,
};
use crate::token;

const MSG_NO_TOKEN: &str = "Hi! Open your personal link to receive your video.";
const MSG_INVALID_LINK: &str = "This link is invalid or has expired.";
const MSG_JOIN_FIRST: &str =
    "To receive the video, join the channel first, then tap \"I joined\".";
const MSG_STILL_NOT_MEMBER: &str =
    "Still not a member! Join the channel, then tap \"I joined\" again.";
const MSG_NOT_A_VIDEO: &str = "Please send a video file.";

const BTN_JOIN: &str = "🚀 Join the channel";
const BTN_RETRY: &str = "✅ I joined";

/// Handler errors
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("telegram error: {0}")]
    Telegram(#[from] TelegramError),
}

/// How a redemption attempt entered the flow. The retry entry carries the
/// prompt message so it can be edited or deleted in place.
enum RedeemEntry {
    Command,
    Retry { prompt: Receipt },
}

/// The gated-content bot.
pub struct LinkBot<C: TelegramClient> {
    client: C,
    store: LinkStore,
    gate: MembershipGate<C>,
    scheduler: DeliveryScheduler<C>,
    config: BotConfig,
}

impl<C: TelegramClient> LinkBot<C> {
    pub fn new(client: C, store: LinkStore, config: BotConfig) -> Self {
        let gate = MembershipGate::new(client.clone(), config.channel.clone());
        let scheduler = DeliveryScheduler::new(client.clone());
        Self {
            client,
            store,
            gate,
            scheduler,
            config,
        }
    }

    /// Dispatch one normalized update.
    pub async fn handle_event(&self, event: Event) -> Result<(), BotError> {
        match event {
            Event::Start { chat, user, token } => self.handle_start(chat, user, token).await,
            Event::Upload {
                chat,
                user,
                file,
                kind,
            } => self.handle_upload(chat, user, file, kind).await,
            Event::Retry {
                callback_id,
                chat,
                prompt,
                user,
                payload,
            } => self.handle_retry(&callback_id, chat, prompt, user, &payload).await,
        }
    }

    /// `/start [token]` entry point.
    async fn handle_start(
        &self,
        chat: ChatId,
        user: UserId,
        token: Option<String>,
    ) -> Result<(), BotError> {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            self.client.send_text(chat, MSG_NO_TOKEN).await?;
            return Ok(());
        };
        self.redeem(chat, user, &token, RedeemEntry::Command).await
    }

    /// Retry-button entry point. Each click is acknowledged, then re-runs
    /// the same lookup-and-check with the token from the button payload.
    async fn handle_retry(
        &self,
        callback_id: &str,
        chat: ChatId,
        prompt: MessageId,
        user: UserId,
        payload: &str,
    ) -> Result<(), BotError> {
        self.client.answer_callback(callback_id).await?;

        let Some(token) = token::parse_retry_payload(payload) else {
            warn!("ignoring callback with unrecognized payload");
            return Ok(());
        };

        self.redeem(
            chat,
            user,
            token,
            RedeemEntry::Retry {
                prompt: Receipt {
                    chat,
                    message: prompt,
                },
            },
        )
        .await
    }

    /// The redemption state machine, shared by both entry points.
    async fn redeem(
        &self,
        chat: ChatId,
        user: UserId,
        token: &str,
        entry: RedeemEntry,
    ) -> Result<(), BotError> {
        let Some(file) = self.store.get(token).await? else {
            // The token truly does not exist; no retry can help, so the
            // flow ends here without a retry affordance.
            match entry {
                RedeemEntry::Command => {
                    self.client.send_text(chat, MSG_INVALID_LINK).await?;
                }
                RedeemEntry::Retry { prompt } => {
                    self.client
                        .edit_text(prompt.chat, prompt.message, MSG_INVALID_LINK)
                        .await?;
                }
            }
            return Ok(());
        };

        if self.gate.is_member(user).await {
            if let RedeemEntry::Retry { prompt } = entry {
                // The join prompt is cosmetic once delivery happens; a
                // failed deletion is not worth surfacing.
                let _ = self
                    .client
                    .delete_message(prompt.chat, prompt.message)
                    .await;
            }
            self.scheduler.deliver(chat, &file).await?;
            return Ok(());
        }

        match entry {
            RedeemEntry::Command => {
                // First refusal: instruct and offer the re-check button.
                self.client
                    .send_text_with_keyboard(chat, MSG_JOIN_FIRST, &self.join_keyboard(token))
                    .await?;
            }
            RedeemEntry::Retry { .. } => {
                // Repeated refusal must be distinguishable so the user knows
                // the click registered. The original prompt (and its retry
                // button) stays on screen.
                self.client.send_text(chat, MSG_STILL_NOT_MEMBER).await?;
            }
        }
        Ok(())
    }

    /// Admin-only issuance: mint a token for the upload and reply with the
    /// shareable deep link.
    async fn handle_upload(
        &self,
        chat: ChatId,
        user: UserId,
        file: FileHandle,
        kind: UploadKind,
    ) -> Result<(), BotError> {
        if !self.config.is_admin(user) {
            // Deliberately indistinguishable from a no-op: no response and
            // no log, so the feature's existence is not revealed.
            return Ok(());
        }

        if !kind.is_video() {
            self.client.send_text(chat, MSG_NOT_A_VIDEO).await?;
            return Ok(());
        }

        let token = token::mint();
        self.store.put(&token, &file).await?;

        let username = self.client.bot_username().await?;
        let link = token::deep_link(&username, &token);
        self.client
            .send_text(chat, &format!("✅ Your shareable link:\n{link}"))
            .await?;

        info!("issued link for upload from admin {}", user);
        Ok(())
    }

    fn join_keyboard(&self, token: &str) -> Keyboard {
        let channel_url = format!(
            "https://t.me/{}",
            self.gate.channel().trim_start_matches('@')
        );
        Keyboard(vec![
            vec![Button::url(BTN_JOIN, channel_url)],
            vec![Button::callback(BTN_RETRY, token::retry_payload(token))],
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telegram::mock::MockTelegramClient;
    use crate::telegram::traits::MemberStatus;

    const ADMIN: UserId = UserId(1381422763);
    const VISITOR: UserId = UserId(777);

    async fn test_bot() -> (tempfile::TempDir, MockTelegramClient, LinkBot<MockTelegramClient>) {
        let dir = tempfile::tempdir().unwrap();
        let store = LinkStore::open(dir.path().join("links.db")).await.unwrap();
        let client = MockTelegramClient::new();
        let config = BotConfig::from_lookup(|key| match key {
            "BOT_TOKEN" => Some("123:abc".to_string()),
            "ADMIN_IDS" => Some(ADMIN.to_string()),
            "CHANNEL_USERNAME" => Some("@testchannel".to_string()),
            _ => None,
        })
        .unwrap();
        let bot = LinkBot::new(client.clone(), store, config);
        (dir, client, bot)
    }

    async fn issue(bot: &LinkBot<MockTelegramClient>, client: &MockTelegramClient) -> String {
        bot.handle_event(Event::Upload {
            chat: ChatId(1),
            user: ADMIN,
            file: FileHandle("file-1".to_string()),
            kind: UploadKind::Video,
        })
        .await
        .unwrap();

        let reply = client.sent_texts().pop().unwrap().text;
        let link = reply.lines().last().unwrap().to_string();
        link.rsplit("?start=").next().unwrap().to_string()
    }

    #[tokio::test]
    async fn start_without_token_prompts_for_a_link() {
        let (_dir, client, bot) = test_bot().await;

        bot.handle_event(Event::Start {
            chat: ChatId(5),
            user: VISITOR,
            token: None,
        })
        .await
        .unwrap();

        assert_eq!(client.sent_texts()[0].text, MSG_NO_TOKEN);
        assert!(client.sent_videos().is_empty());
    }

    #[tokio::test]
    async fn empty_token_counts_as_absent() {
        let (_dir, client, bot) = test_bot().await;

        bot.handle_event(Event::Start {
            chat: ChatId(5),
            user: VISITOR,
            token: Some(String::new()),
        })
        .await
        .unwrap();

        assert_eq!(client.sent_texts()[0].text, MSG_NO_TOKEN);
        assert!(client.sent_videos().is_empty());
    }

    #[tokio::test]
    async fn unknown_token_is_terminal_and_delivers_nothing() {
        let (_dir, client, bot) = test_bot().await;
        client.set_member_status(VISITOR, MemberStatus::Member);

        bot.handle_event(Event::Start {
            chat: ChatId(5),
            user: VISITOR,
            token: Some("never-issued".to_string()),
        })
        .await
        .unwrap();

        let sent = client.sent_texts();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].text, MSG_INVALID_LINK);
        assert!(sent[0].keyboard.is_none()); // no retry offered
        assert!(client.sent_videos().is_empty());
    }

    #[tokio::test]
    async fn member_redemption_delivers_the_issued_file() {
        let (_dir, client, bot) = test_bot().await;
        let token = issue(&bot, &client).await;
        client.set_member_status(VISITOR, MemberStatus::Member);

        bot.handle_event(Event::Start {
            chat: ChatId(5),
            user: VISITOR,
            token: Some(token),
        })
        .await
        .unwrap();

        let videos = client.sent_videos();
        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].file, FileHandle("file-1".to_string()));
        assert_eq!(videos[0].receipt.chat, ChatId(5));
    }

    #[tokio::test]
    async fn non_member_gets_join_prompt_with_retry_button() {
        let (_dir, client, bot) = test_bot().await;
        let token = issue(&bot, &client).await;

        bot.handle_event(Event::Start {
            chat: ChatId(5),
            user: VISITOR,
            token: Some(token.clone()),
        })
        .await
        .unwrap();

        let prompt = client.sent_texts().pop().unwrap();
        assert_eq!(prompt.text, MSG_JOIN_FIRST);
        let keyboard = prompt.keyboard.expect("join prompt carries a keyboard");
        assert_eq!(
            keyboard.0[0][0],
            Button::url(BTN_JOIN, "https://t.me/testchannel")
        );
        assert_eq!(
            keyboard.0[1][0],
            Button::callback(BTN_RETRY, format!("check|{token}"))
        );
        assert!(client.sent_videos().is_empty());
    }

    #[tokio::test]
    async fn gate_failure_is_treated_as_non_member() {
        let (_dir, client, bot) = test_bot().await;
        let token = issue(&bot, &client).await;
        client.set_member_status(VISITOR, MemberStatus::Member);
        client.fail_member_status(true);

        bot.handle_event(Event::Start {
            chat: ChatId(5),
            user: VISITOR,
            token: Some(token),
        })
        .await
        .unwrap();

        assert_eq!(client.sent_texts().pop().unwrap().text, MSG_JOIN_FIRST);
        assert!(client.sent_videos().is_empty());
    }

    #[tokio::test]
    async fn repeated_retry_says_still_not_a_member() {
        let (_dir, client, bot) = test_bot().await;
        let token = issue(&bot, &client).await;

        bot.handle_event(Event::Retry {
            callback_id: "cb-1".to_string(),
            chat: ChatId(5),
            prompt: MessageId(30),
            user: VISITOR,
            payload: format!("check|{token}"),
        })
        .await
        .unwrap();

        assert_eq!(client.answered_callbacks(), vec!["cb-1".to_string()]);
        let sent = client.sent_texts().pop().unwrap();
        assert_eq!(sent.text, MSG_STILL_NOT_MEMBER);
        // The original prompt stays; further clicks re-run the same check.
        assert!(client.deleted().is_empty());
        assert!(client.sent_videos().is_empty());
    }

    #[tokio::test]
    async fn retry_after_joining_deletes_prompt_and_delivers() {
        let (_dir, client, bot) = test_bot().await;
        let token = issue(&bot, &client).await;
        client.set_member_status(VISITOR, MemberStatus::Member);

        bot.handle_event(Event::Retry {
            callback_id: "cb-2".to_string(),
            chat: ChatId(5),
            prompt: MessageId(30),
            user: VISITOR,
            payload: format!("check|{token}"),
        })
        .await
        .unwrap();

        assert_eq!(
            client.deleted(),
            vec![Receipt {
                chat: ChatId(5),
                message: MessageId(30)
            }]
        );
        assert_eq!(client.sent_videos().len(), 1);
    }

    #[tokio::test]
    async fn retry_delivery_survives_prompt_deletion_failure() {
        let (_dir, client, bot) = test_bot().await;
        let token = issue(&bot, &client).await;
        client.set_member_status(VISITOR, MemberStatus::Member);
        client.fail_deletes(true);

        bot.handle_event(Event::Retry {
            callback_id: "cb-3".to_string(),
            chat: ChatId(5),
            prompt: MessageId(30),
            user: VISITOR,
            payload: format!("check|{token}"),
        })
        .await
        .unwrap();

        // Prompt deletion failed silently; delivery still happened.
        assert_eq!(client.sent_videos().len(), 1);
    }

    #[tokio::test]
    async fn retry_with_unknown_token_edits_prompt_in_place() {
        let (_dir, client, bot) = test_bot().await;

        bot.handle_event(Event::Retry {
            callback_id: "cb-4".to_string(),
            chat: ChatId(5),
            prompt: MessageId(30),
            user: VISITOR,
            payload: "check|never-issued".to_string(),
        })
        .await
        .unwrap();

        let edits = client.edits();
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].0.message, MessageId(30));
        assert_eq!(edits[0].1, MSG_INVALID_LINK);
        assert!(client.sent_videos().is_empty());
    }

    #[tokio::test]
    async fn foreign_callback_payload_is_ignored_after_ack() {
        let (_dir, client, bot) = test_bot().await;

        bot.handle_event(Event::Retry {
            callback_id: "cb-5".to_string(),
            chat: ChatId(5),
            prompt: MessageId(30),
            user: VISITOR,
            payload: "vote|something".to_string(),
        })
        .await
        .unwrap();

        assert_eq!(client.answered_callbacks().len(), 1);
        assert!(client.is_silent());
    }

    #[tokio::test]
    async fn non_admin_upload_is_a_silent_no_op() {
        let (_dir, client, bot) = test_bot().await;

        bot.handle_event(Event::Upload {
            chat: ChatId(1),
            user: VISITOR,
            file: FileHandle("file-x".to_string()),
            kind: UploadKind::Video,
        })
        .await
        .unwrap();

        assert!(client.is_silent());
    }

    #[tokio::test]
    async fn admin_non_video_upload_is_rejected_without_minting() {
        let (_dir, client, bot) = test_bot().await;

        bot.handle_event(Event::Upload {
            chat: ChatId(1),
            user: ADMIN,
            file: FileHandle("file-x".to_string()),
            kind: UploadKind::Document {
                mime: Some("application/pdf".to_string()),
            },
        })
        .await
        .unwrap();

        let sent = client.sent_texts();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].text, MSG_NOT_A_VIDEO);
    }

    #[tokio::test]
    async fn admin_video_document_upload_issues_a_link() {
        let (_dir, client, bot) = test_bot().await;

        bot.handle_event(Event::Upload {
            chat: ChatId(1),
            user: ADMIN,
            file: FileHandle("file-doc".to_string()),
            kind: UploadKind::Document {
                mime: Some("video/mp4".to_string()),
            },
        })
        .await
        .unwrap();

        let reply = client.sent_texts().pop().unwrap().text;
        assert!(reply.contains("https://t.me/linkgate_bot?start="));
    }

    #[tokio::test]
    async fn reissuance_never_invalidates_earlier_tokens() {
        let (_dir, client, bot) = test_bot().await;
        let first = issue(&bot, &client).await;

        bot.handle_event(Event::Upload {
            chat: ChatId(1),
            user: ADMIN,
            file: FileHandle("file-2".to_string()),
            kind: UploadKind::Video,
        })
        .await
        .unwrap();
        let reply = client.sent_texts().pop().unwrap().text;
        let second = reply.rsplit("?start=").next().unwrap().to_string();

        assert_ne!(first, second);

        client.set_member_status(VISITOR, MemberStatus::Member);
        bot.handle_event(Event::Start {
            chat: ChatId(5),
            user: VISITOR,
            token: Some(first),
        })
        .await
        .unwrap();

        assert_eq!(
            client.sent_videos().pop().unwrap().file,
            FileHandle("file-1".to_string())
        );
    }
}
