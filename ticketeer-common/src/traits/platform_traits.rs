// ticketeer-common/src/traits/platform_traits.rs
//
// The seams to the messaging platform and the transcript renderer. The engine
// never talks to a chat SDK directly; lifecycle operations describe channels
// and messages with these value types and let the embedding process supply
// the real client.

use async_trait::async_trait;

use crate::error::Error;
use crate::models::{ButtonStyle, Ticket};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverwriteTarget {
    Member(String),
    Role(String),
    /// The guild-wide everyone role.
    Everyone,
}

/// One permission-overwrite entry for a channel. `allow` grants
/// view/post/read-history; `!allow` denies view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionOverwrite {
    pub target: OverwriteTarget,
    pub allow: bool,
}

#[derive(Debug, Clone)]
pub struct CreateChannelRequest {
    pub guild_id: String,
    pub name: String,
    pub parent_id: Option<String>,
    pub overwrites: Vec<PermissionOverwrite>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionButton {
    pub custom_id: String,
    pub label: String,
    pub style: ButtonStyle,
    pub disabled: bool,
    pub emoji: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default)]
pub struct OutboundEmbed {
    pub title: String,
    pub description: String,
    pub color: u32,
    pub fields: Vec<EmbedField>,
    pub footer: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Attachment {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// A message the engine wants sent or edited. `buttons` is a list of action
/// rows, each holding up to five buttons.
#[derive(Debug, Clone, Default)]
pub struct OutboundMessage {
    pub content: Option<String>,
    pub embed: Option<OutboundEmbed>,
    pub buttons: Vec<Vec<ActionButton>>,
    pub attachment: Option<Attachment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRef {
    pub channel_id: String,
    pub message_id: String,
}

#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Create a private channel; returns the new channel id.
    async fn create_channel(&self, request: &CreateChannelRequest) -> Result<String, Error>;
    async fn delete_channel(&self, channel_id: &str) -> Result<(), Error>;
    /// Send a message; returns the message id.
    async fn send_message(
        &self,
        channel_id: &str,
        message: &OutboundMessage,
    ) -> Result<String, Error>;
    /// Edit a message in place. `None` content/embed leave the existing
    /// values untouched; `buttons` always replaces the action rows.
    async fn edit_message(
        &self,
        target: &MessageRef,
        message: &OutboundMessage,
    ) -> Result<(), Error>;
    async fn delete_message(&self, target: &MessageRef) -> Result<(), Error>;
    /// Scan recent messages for the one carrying the ticket action row.
    async fn find_action_row_message(
        &self,
        channel_id: &str,
    ) -> Result<Option<MessageRef>, Error>;
    async fn send_dm(&self, user_id: &str, message: &OutboundMessage) -> Result<(), Error>;
    /// Grant or refresh a member overwrite on a channel.
    async fn set_member_overwrite(&self, channel_id: &str, user_id: &str) -> Result<(), Error>;
    async fn remove_overwrite(&self, channel_id: &str, user_id: &str) -> Result<(), Error>;
    async fn rename_channel(&self, channel_id: &str, name: &str) -> Result<(), Error>;
}

/// Renders a channel's history into an HTML transcript document.
#[async_trait]
pub trait TranscriptRenderer: Send + Sync {
    async fn render_html(&self, channel_id: &str, ticket: &Ticket) -> Result<Vec<u8>, Error>;
}
