use crate::error::Result;
use async_trait::async_trait;

/// Outbound messaging gateway, e.g. an SMS provider.
///
/// Delivery is fire-and-forget from the game's perspective: callers log
/// failures and move on, they never retry or roll back game state over a
/// missed text.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, recipient: &str, message: &str) -> Result<()>;
}
