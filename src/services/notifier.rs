use async_trait::async_trait;

use crate::error::Result;

/// Outbound channel for alert messages
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `message` for `symbol`; `Ok` means the channel accepted it
    async fn deliver(&self, symbol: &str, message: &str) -> Result<()>;

    /// Short name for logs
    fn name(&self) -> &'static str;
}
