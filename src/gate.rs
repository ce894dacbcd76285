//! Membership Gate
//!
//! Classifies a user as channel member or not. Fail-closed: when the status
//! query cannot be completed, the user is treated as a non-member - an
//! inability to verify membership must never leak content. One best-effort
//! query per redemption attempt, no retry, no caching of negative results.

use tracing::warn;

use crate::telegram::traits::{TelegramClient, UserId};

/// Channel membership gate bound to one configured channel.
#[derive(Clone)]
pub struct MembershipGate<C: TelegramClient> {
    client: C,
    channel: String,
}

impl<C: TelegramClient> MembershipGate<C> {
    pub fn new(client: C, channel: String) -> Self {
        Self { client, channel }
    }

    /// True iff the user's status in the channel is member, administrator,
    /// or owner. Infallible by contract: query failures take the fail-closed
    /// branch below and classify as non-member.
    pub async fn is_member(&self, user: UserId) -> bool {
        match self.client.member_status(&self.channel, user).await {
            Ok(status) => status.grants_access(),
            Err(e) => {
                // Fail closed: unverifiable membership denies access.
                warn!(
                    "membership check for user {} in {} failed, treating as non-member: {}",
                    user, self.channel, e
                );
                false
            }
        }
    }

    /// The configured channel, `@username` form.
    pub fn channel(&self) -> &str {
        &self.channel
    }
}
