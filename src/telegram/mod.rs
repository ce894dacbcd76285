//! Telegram Integration Module
//!
//! Everything that touches the Bot API lives here, behind the
//! `TelegramClient` trait:
//! - `traits`: the client seam and wire-adjacent types
//! - `client`: the teloxide-backed production client
//! - `mock`: recording client for tests
//! - `transport`: update normalization plus the polling and webhook loops

pub mod client;
pub mod mock;
pub mod transport;
pub mod traits;

pub use client::ApiTelegramClient;
pub use mock::MockTelegramClient;
pub use traits::{TelegramClient, TelegramError, TelegramResult};
