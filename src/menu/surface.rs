use std::time::Duration;

use async_trait::async_trait;

use crate::{error::Result, menu::{control::Control, source::Page}};

/// The message a menu lives in, plus the channel around it.
#[async_trait]
pub trait MenuSurface: Send + Sync {
    /// Shows `page` with `controls`. The first call sends the message,
    /// later calls edit it in place.
    async fn render(&self, page: &Page, controls: &[Control]) -> Result<()>;

    /// Replaces the menu's content with plain text and drops any embed.
    async fn notice(&self, text: &str) -> Result<()>;

    /// Sends a separate message to the menu's channel.
    async fn say(&self, text: &str) -> Result<()>;

    async fn delete(&self) -> Result<()>;

    async fn clear_controls(&self) -> Result<()>;

    /// Asks the menu's author a question and waits up to `timeout` for a reply
    /// that passes `accept`. Replies that don't pass are ignored. On timeout the
    /// question is removed and `None` is returned.
    async fn prompt(
        &self,
        question: &str,
        accept: for<'a> fn(&'a str) -> bool,
        timeout: Duration,
    ) -> Result<Option<String>>;
}
