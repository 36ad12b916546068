use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Error;
use crate::models::{
    GuildConfig, NewPanel, NewQuestion, NewTicketType, Panel, Question, ResponseDraft, Ticket,
    TicketResponse, TicketStatus, TicketType,
};

#[async_trait]
pub trait PanelRepository: Send + Sync {
    /// Insert and return the assigned panel id.
    async fn create(&self, panel: &NewPanel) -> Result<i64, Error>;
    async fn get(&self, panel_id: i64) -> Result<Option<Panel>, Error>;
    /// Case- and whitespace-insensitive title lookup within a guild.
    async fn get_by_title(&self, guild_id: &str, title: &str) -> Result<Option<Panel>, Error>;
    async fn list_for_guild(&self, guild_id: &str) -> Result<Vec<Panel>, Error>;
    async fn count_for_guild(&self, guild_id: &str) -> Result<i64, Error>;
    async fn update(&self, panel: &Panel) -> Result<(), Error>;
    async fn set_message_id(&self, panel_id: i64, message_id: Option<&str>) -> Result<(), Error>;
    async fn set_disabled(&self, panel_id: i64, disabled: bool) -> Result<(), Error>;
    /// Delete the panel and everything under it (types, questions, tickets,
    /// responses) in one transaction.
    async fn delete_cascade(&self, panel_id: i64) -> Result<(), Error>;
}

#[async_trait]
pub trait TicketTypeRepository: Send + Sync {
    async fn create(&self, ticket_type: &NewTicketType) -> Result<i64, Error>;
    async fn get(&self, ticket_type_id: i64) -> Result<Option<TicketType>, Error>;
    async fn list_for_panel(&self, panel_id: i64) -> Result<Vec<TicketType>, Error>;
    async fn count_for_panel(&self, panel_id: i64) -> Result<i64, Error>;
    async fn update(&self, ticket_type: &TicketType) -> Result<(), Error>;
    async fn delete(&self, ticket_type_id: i64) -> Result<(), Error>;
}

#[async_trait]
pub trait QuestionRepository: Send + Sync {
    async fn create(&self, question: &NewQuestion) -> Result<i64, Error>;
    async fn get(&self, question_id: i64) -> Result<Option<Question>, Error>;
    async fn list_for_type(&self, ticket_type_id: i64) -> Result<Vec<Question>, Error>;
    async fn count_for_type(&self, ticket_type_id: i64) -> Result<i64, Error>;
    async fn update(&self, question: &Question) -> Result<(), Error>;
    async fn delete(&self, question_id: i64) -> Result<(), Error>;
}

#[async_trait]
pub trait TicketRepository: Send + Sync {
    /// Insert a ticket, allocating the next per-panel sequence number
    /// atomically, and return the stored row.
    async fn create(
        &self,
        panel_id: i64,
        ticket_type_id: Option<i64>,
        channel_id: &str,
        user_id: &str,
    ) -> Result<Ticket, Error>;
    async fn get(&self, ticket_id: i64) -> Result<Option<Ticket>, Error>;
    /// The open or closing ticket bound to a channel, if any.
    async fn get_active_by_channel(&self, channel_id: &str) -> Result<Option<Ticket>, Error>;
    /// Peek at the sequence number the next ticket under this panel will get.
    async fn next_number(&self, panel_id: i64) -> Result<i64, Error>;
    async fn open_count_for_panel(&self, panel_id: i64) -> Result<i64, Error>;
    async fn has_open_for_panel(&self, panel_id: i64, user_id: &str) -> Result<bool, Error>;
    async fn has_open_for_type(&self, ticket_type_id: i64, user_id: &str) -> Result<bool, Error>;
    async fn set_status(&self, channel_id: &str, status: TicketStatus) -> Result<(), Error>;
    /// Terminal transition: status becomes closed and `closed_at` is stamped.
    /// Only applies to open/closing rows.
    async fn mark_closed(&self, channel_id: &str) -> Result<(), Error>;
    async fn set_claimed(&self, channel_id: &str, user_id: &str) -> Result<(), Error>;
    async fn clear_claimed(&self, channel_id: &str) -> Result<(), Error>;
    /// Refresh `last_message_at`; only open tickets track activity.
    async fn touch_last_message(&self, channel_id: &str) -> Result<(), Error>;
    async fn mark_reopened(&self, ticket_id: i64) -> Result<(), Error>;
    /// Open tickets whose effective inactivity threshold (type override, else
    /// panel default) is set and exceeded as of `now`.
    async fn autoclose_candidates(&self, now: DateTime<Utc>) -> Result<Vec<Ticket>, Error>;
    /// Startup recovery: flip every `closing` row back to `open`. Returns the
    /// number of rows touched.
    async fn reset_closing_tickets(&self) -> Result<u64, Error>;
    async fn insert_responses(
        &self,
        ticket_id: i64,
        responses: &[ResponseDraft],
    ) -> Result<(), Error>;
    async fn list_responses(&self, ticket_id: i64) -> Result<Vec<TicketResponse>, Error>;
}

#[async_trait]
pub trait GuildConfigRepository: Send + Sync {
    async fn get(&self, guild_id: &str) -> Result<Option<GuildConfig>, Error>;
    async fn set_default_log_channel(
        &self,
        guild_id: &str,
        channel_id: Option<&str>,
    ) -> Result<(), Error>;
}
