//! Run the bot service
//!
//! Startup order: tracing subscriber, environment configuration (fatal on
//! any error, before serving traffic), link database, then the transport
//! selected by the configuration - webhook when `PORT`/`PUBLIC_URL` are set,
//! long polling otherwise.

use std::path::PathBuf;
use teloxide::Bot;
use tracing::info;
use tracing_subscriber::EnvFilter;

use linkgate::bot::LinkBot;
use linkgate::config::BotConfig;
use linkgate::store::LinkStore;
use linkgate::telegram::transport;
use linkgate::telegram::ApiTelegramClient;

pub async fn execute(db_path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = BotConfig::from_env()?;
    info!(
        "starting linkgate: channel {}, {} admin(s), {} mode",
        config.channel,
        config.admin_ids.len(),
        if config.webhook.is_some() {
            "webhook"
        } else {
            "polling"
        }
    );

    let store = LinkStore::open(&db_path).await?;
    info!("link database: {}", db_path.display());

    let bot = Bot::new(config.bot_token.clone());
    let client = ApiTelegramClient::new(bot.clone());
    let link_bot = LinkBot::new(client, store, config.clone());

    match &config.webhook {
        Some(webhook) => transport::run_webhook(bot, link_bot, webhook).await,
        None => transport::run_polling(bot, link_bot).await,
    }
}
