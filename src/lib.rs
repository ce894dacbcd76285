//! Linkgate - Membership-Gated Video Link Bot
//!
//! A Telegram bot that turns admin-uploaded videos into shareable
//! token-based deep links. Opening a link proves channel membership before
//! the video is delivered, and every delivered message is scheduled for
//! automatic deletion.
//!
//! Key principles:
//! - Tokens are unguessable, immutable once issued, and never expire
//! - Membership verification fails closed: unverifiable means non-member
//! - Deferred deletions are best-effort and non-durable by design

pub mod bot;
pub mod config;
pub mod delivery;
pub mod gate;
pub mod store;
pub mod telegram;
pub mod token;
