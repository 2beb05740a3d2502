// Transport boundary - whatever actually delivers messages to users
// The core only ever talks to this trait

#[cfg(feature = "console")]
pub mod console;
#[cfg(test)]
pub(crate) mod recording;

use anyhow::Result;
use async_trait::async_trait;

use crate::planner::Menu;
use crate::types::{MessageId, TrackRef, UserId};

#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a text message, optionally with a keyboard attached
    async fn send_text(&self, user: UserId, text: &str, menu: Option<&Menu>) -> Result<MessageId>;

    /// Send a stored media item by its reference
    async fn send_media(&self, user: UserId, track: &TrackRef) -> Result<MessageId>;

    /// Remove a message we sent earlier. Callers treat failure as non-fatal
    /// (the user may already have deleted it).
    async fn delete_message(&self, user: UserId, message: MessageId) -> Result<()>;
}
