//! Delivery Scheduler
//!
//! Sends gated content and arms exactly one deferred deletion per delivery.
//! The deletion is a detached tokio task: best-effort, non-durable, lost if
//! the process restarts before the delay elapses.

use std::time::Duration;
use tracing::warn;

use crate::telegram::traits::{ChatId, FileHandle, Receipt, TelegramClient, TelegramResult};

/// Delay between delivery and automatic removal.
pub const DELETE_AFTER: Duration = Duration::from_secs(20);

/// Caption attached to every delivered video.
pub const SAVE_REMINDER: &str =
    "ℹ️ Please save this video now - this message will be deleted in 20 seconds.";

/// Sends content and schedules its removal.
#[derive(Clone)]
pub struct DeliveryScheduler<C: TelegramClient> {
    client: C,
    delete_after: Duration,
}

impl<C: TelegramClient> DeliveryScheduler<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            delete_after: DELETE_AFTER,
        }
    }

    /// Send the video with the save-reminder caption and arm the deferred
    /// deletion for the resulting message.
    pub async fn deliver(&self, dest: ChatId, file: &FileHandle) -> TelegramResult<Receipt> {
        let receipt = self.client.send_video(dest, file, SAVE_REMINDER).await?;

        let client = self.client.clone();
        let delay = self.delete_after;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = client.delete_message(receipt.chat, receipt.message).await {
                warn!(
                    "cannot delete message {}/{}: {}",
                    receipt.chat, receipt.message, e
                );
            }
        });

        Ok(receipt)
    }
}
