//! Bot configuration
//!
//! All configuration comes from the environment, is validated once at
//! startup, and is passed into components as an immutable value - nothing
//! reads ambient state after `BotConfig` is built. A configuration error is
//! fatal: the process exits before serving any traffic.

use std::collections::HashSet;
use url::Url;

use crate::telegram::traits::UserId;

/// Channel gated by default when `CHANNEL_USERNAME` is not set.
const DEFAULT_CHANNEL: &str = "@UselessShitPosts";

/// Configuration errors (all fatal at startup)
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("BOT_TOKEN environment variable is required")]
    MissingBotToken,

    #[error("invalid admin id in ADMIN_IDS: {0:?}")]
    InvalidAdminId(String),

    #[error("PORT and PUBLIC_URL must be set together for webhook mode")]
    IncompleteWebhookConfig,

    #[error("invalid PORT: {0:?}")]
    InvalidPort(String),

    #[error("invalid PUBLIC_URL: {0:?}")]
    InvalidPublicUrl(String),
}

/// Process-wide configuration, read-only after startup.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Bot API credential
    pub bot_token: String,
    /// Identities allowed to issue links
    pub admin_ids: HashSet<UserId>,
    /// Channel whose membership gates delivery, `@username` form
    pub channel: String,
    /// Webhook deployment parameters; `None` selects long polling
    pub webhook: Option<WebhookConfig>,
}

/// Webhook deployment variant parameters
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// Local listen port
    pub port: u16,
    /// Externally reachable base URL, no trailing slash
    pub public_url: String,
}

impl BotConfig {
    /// Build configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bot_token = lookup("BOT_TOKEN")
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingBotToken)?;

        let mut admin_ids = HashSet::new();
        if let Some(raw) = lookup("ADMIN_IDS") {
            for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                let id = part
                    .parse::<u64>()
                    .map_err(|_| ConfigError::InvalidAdminId(part.to_string()))?;
                admin_ids.insert(UserId(id));
            }
        }

        let channel = match lookup("CHANNEL_USERNAME") {
            Some(raw) if !raw.is_empty() => {
                if raw.starts_with('@') {
                    raw
                } else {
                    format!("@{raw}")
                }
            }
            _ => DEFAULT_CHANNEL.to_string(),
        };

        let webhook = match (lookup("PORT"), lookup("PUBLIC_URL")) {
            (None, None) => None,
            (Some(port), Some(public_url)) => {
                let port = port
                    .parse::<u16>()
                    .map_err(|_| ConfigError::InvalidPort(port.clone()))?;
                Url::parse(&public_url)
                    .map_err(|_| ConfigError::InvalidPublicUrl(public_url.clone()))?;
                Some(WebhookConfig {
                    port,
                    public_url: public_url.trim_end_matches('/').to_string(),
                })
            }
            _ => return Err(ConfigError::IncompleteWebhookConfig),
        };

        Ok(Self {
            bot_token,
            admin_ids,
            channel,
            webhook,
        })
    }

    /// True if `user` may issue links.
    pub fn is_admin(&self, user: UserId) -> bool {
        self.admin_ids.contains(&user)
    }
}
