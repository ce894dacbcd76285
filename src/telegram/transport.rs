//! Update transport
//!
//! Normalizes raw Bot API updates into `Event`s and drives the two
//! deployment variants: long polling via `getUpdates`, and a webhook served
//! by axum. Per-update handler failures are logged and skipped - the service
//! must survive individual bad updates.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use std::sync::Arc;
use teloxide::payloads::GetUpdatesSetters;
use teloxide::requests::Requester;
use teloxide::types::{Update, UpdateKind};
use teloxide::Bot;
use tracing::{info, warn};
use url::Url;

use super::client::ApiTelegramClient;
use super::traits::{ChatId, Event, FileHandle, MessageId, UploadKind, UserId};
use crate::bot::LinkBot;
use crate::config::WebhookConfig;

/// Path the webhook listens on, registered with the Bot API at startup.
const WEBHOOK_PATH: &str = "/webhook";

/// Long-poll timeout passed to `getUpdates`.
const POLL_TIMEOUT_SECS: u32 = 30;

/// Normalize a raw update into an `Event`, or `None` for update kinds the
/// bot does not react to.
pub fn event_from_update(update: Update) -> Option<Event> {
    match update.kind {
        UpdateKind::Message(msg) => event_from_message(&msg),
        UpdateKind::CallbackQuery(q) => {
            let payload = q.data?;
            // Prompts older than 48h come back inaccessible, with no
            // content; those clicks cannot be tied to a token anyway.
            let msg = q.message?;
            let msg = msg.regular_message()?;
            Some(Event::Retry {
                callback_id: q.id,
                chat: ChatId(msg.chat.id.0),
                prompt: MessageId(msg.id.0),
                user: UserId(q.from.id.0),
                payload,
            })
        }
        _ => None,
    }
}

fn event_from_message(msg: &teloxide::types::Message) -> Option<Event> {
    let user = UserId(msg.from.as_ref()?.id.0);
    let chat = ChatId(msg.chat.id.0);

    if let Some(text) = msg.text() {
        let mut parts = text.split_whitespace();
        let command = parts.next()?;
        // "/start" and the "/start@botname" group form both count.
        if command == "/start" || command.starts_with("/start@") {
            return Some(Event::Start {
                chat,
                user,
                token: parts.next().map(str::to_string),
            });
        }
        return None;
    }

    if let Some(video) = msg.video() {
        return Some(Event::Upload {
            chat,
            user,
            file: FileHandle(video.file.id.clone()),
            kind: UploadKind::Video,
        });
    }

    if let Some(doc) = msg.document() {
        return Some(Event::Upload {
            chat,
            user,
            file: FileHandle(doc.file.id.clone()),
            kind: UploadKind::Document {
                mime: doc.mime_type.as_ref().map(|m| m.essence_str().to_string()),
            },
        });
    }

    None
}

/// Long-polling loop. Never returns except on a fatal startup error.
pub async fn run_polling(
    bot: Bot,
    link_bot: LinkBot<ApiTelegramClient>,
) -> Result<(), Box<dyn std::error::Error>> {
    // A webhook left over from a previous deployment blocks getUpdates.
    bot.delete_webhook().await?;
    info!("polling for updates");

    let mut offset: i32 = 0;
    loop {
        let updates = match bot
            .get_updates()
            .offset(offset)
            .timeout(POLL_TIMEOUT_SECS)
            .await
        {
            Ok(updates) => updates,
            Err(e) => {
                warn!("getUpdates failed, retrying: {}", e);
                tokio::time::sleep(std::time::Duration::from_secs(1)).await;
                continue;
            }
        };

        for update in updates {
            offset = update.id.0 as i32 + 1;
            if let Some(event) = event_from_update(update) {
                if let Err(e) = link_bot.handle_event(event).await {
                    warn!("error handling update: {}", e);
                }
            }
        }
    }
}

/// Webhook server. Registers the webhook with the Bot API, then serves the
/// update route until the process exits.
pub async fn run_webhook(
    bot: Bot,
    link_bot: LinkBot<ApiTelegramClient>,
    webhook: &WebhookConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let url = Url::parse(&format!("{}{}", webhook.public_url, WEBHOOK_PATH))?;
    bot.set_webhook(url.clone()).await?;
    info!("webhook registered at {}", url);

    let app = Router::new()
        .route(WEBHOOK_PATH, post(receive_update))
        .with_state(Arc::new(link_bot));

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", webhook.port)).await?;
    info!("listening on port {}", webhook.port);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn receive_update(
    State(link_bot): State<Arc<LinkBot<ApiTelegramClient>>>,
    Json(update): Json<Update>,
) -> StatusCode {
    if let Some(event) = event_from_update(update) {
        // Answer the Bot API immediately; handle the update detached so a
        // slow membership query never stalls webhook delivery.
        tokio::spawn(async move {
            if let Err(e) = link_bot.handle_event(event).await {
                warn!("error handling update: {}", e);
            }
        });
    }
    StatusCode::OK
}
