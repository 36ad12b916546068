// ticketeer-core/src/services/admin.rs
//
// Operator CRUD for panels, ticket types, and form questions. Anything that
// changes what the published panel message shows re-renders and edits that
// message in place.

use std::sync::Arc;

use tracing::{info, warn};

use ticketeer_common::models::{
    GuildConfig, NewPanel, NewQuestion, NewTicketType, Panel, Question, TicketType,
};
use ticketeer_common::traits::platform_traits::{ChatPlatform, MessageRef};
use ticketeer_common::traits::repository_traits::{
    GuildConfigRepository, PanelRepository, QuestionRepository, TicketRepository,
    TicketTypeRepository,
};
use ticketeer_common::{DenyReason, Error};

use crate::guard;
use crate::render;

pub struct PanelAdminService {
    panels: Arc<dyn PanelRepository>,
    types: Arc<dyn TicketTypeRepository>,
    questions: Arc<dyn QuestionRepository>,
    tickets: Arc<dyn TicketRepository>,
    guild_config: Arc<dyn GuildConfigRepository>,
    platform: Arc<dyn ChatPlatform>,
}

impl PanelAdminService {
    pub fn new(
        panels: Arc<dyn PanelRepository>,
        types: Arc<dyn TicketTypeRepository>,
        questions: Arc<dyn QuestionRepository>,
        tickets: Arc<dyn TicketRepository>,
        guild_config: Arc<dyn GuildConfigRepository>,
        platform: Arc<dyn ChatPlatform>,
    ) -> Self {
        Self {
            panels,
            types,
            questions,
            tickets,
            guild_config,
            platform,
        }
    }

    async fn panel_or_not_found(&self, panel_id: i64) -> Result<Panel, Error> {
        self.panels
            .get(panel_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("panel {panel_id}")))
    }

    /// Re-render the posted panel message from current store state. A panel
    /// that was never posted (or whose message is gone) gets a fresh post.
    pub async fn refresh_panel_message(&self, panel_id: i64) -> Result<(), Error> {
        let panel = self.panel_or_not_found(panel_id).await?;
        let types = self.types.list_for_panel(panel_id).await?;
        let message = render::panel_message(&panel, &types);

        if let Some(message_id) = &panel.message_id {
            let target = MessageRef {
                channel_id: panel.channel_id.clone(),
                message_id: message_id.clone(),
            };
            match self.platform.edit_message(&target, &message).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    warn!("panel {panel_id} message edit failed, reposting: {e}");
                }
            }
        }

        let message_id = self.platform.send_message(&panel.channel_id, &message).await?;
        self.panels
            .set_message_id(panel_id, Some(&message_id))
            .await
    }

    /// Create a panel and post its message.
    pub async fn create_panel(&self, new: &NewPanel) -> Result<Panel, Error> {
        guard::check_panel_limit(self.panels.as_ref(), &new.guild_id).await?;

        let panel_id = self.panels.create(new).await?;
        self.refresh_panel_message(panel_id).await?;

        info!("created panel {panel_id} in guild {}", new.guild_id);
        self.panel_or_not_found(panel_id).await
    }

    /// Panels with their current open-ticket counts.
    pub async fn list_panels(&self, guild_id: &str) -> Result<Vec<(Panel, i64)>, Error> {
        let panels = self.panels.list_for_guild(guild_id).await?;
        let mut out = Vec::with_capacity(panels.len());
        for panel in panels {
            let open = self.tickets.open_count_for_panel(panel.panel_id).await?;
            out.push((panel, open));
        }
        Ok(out)
    }

    pub async fn update_panel(&self, panel: &Panel) -> Result<(), Error> {
        self.panels.update(panel).await?;
        self.refresh_panel_message(panel.panel_id).await
    }

    pub async fn set_panel_disabled(&self, panel_id: i64, disabled: bool) -> Result<(), Error> {
        self.panels.set_disabled(panel_id, disabled).await?;
        self.refresh_panel_message(panel_id).await
    }

    /// Remove the posted message best-effort, then cascade-delete the panel
    /// with its types, questions, tickets, and responses.
    pub async fn delete_panel(&self, panel_id: i64) -> Result<(), Error> {
        let panel = self.panel_or_not_found(panel_id).await?;
        if let Some(message_id) = &panel.message_id {
            let target = MessageRef {
                channel_id: panel.channel_id.clone(),
                message_id: message_id.clone(),
            };
            if let Err(e) = self.platform.delete_message(&target).await {
                warn!("failed to delete panel {panel_id} message: {e}");
            }
        }
        self.panels.delete_cascade(panel_id).await?;
        info!("deleted panel {panel_id}");
        Ok(())
    }

    pub async fn create_ticket_type(&self, new: &NewTicketType) -> Result<i64, Error> {
        self.panel_or_not_found(new.panel_id).await?;
        guard::check_type_limit(self.types.as_ref(), new.panel_id).await?;

        let ticket_type_id = self.types.create(new).await?;
        self.refresh_panel_message(new.panel_id).await?;
        Ok(ticket_type_id)
    }

    pub async fn list_ticket_types(&self, panel_id: i64) -> Result<Vec<TicketType>, Error> {
        self.types.list_for_panel(panel_id).await
    }

    pub async fn update_ticket_type(&self, ticket_type: &TicketType) -> Result<(), Error> {
        self.types.update(ticket_type).await?;
        self.refresh_panel_message(ticket_type.panel_id).await
    }

    /// Delete a type; the panel always keeps at least one.
    pub async fn delete_ticket_type(&self, ticket_type_id: i64) -> Result<(), Error> {
        let ticket_type = self
            .types
            .get(ticket_type_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("ticket type {ticket_type_id}")))?;
        guard::check_not_last_type(self.types.as_ref(), ticket_type.panel_id).await?;

        self.types.delete(ticket_type_id).await?;
        self.refresh_panel_message(ticket_type.panel_id).await
    }

    pub async fn add_question(&self, new: &NewQuestion) -> Result<i64, Error> {
        if new.label.trim().is_empty() {
            return Err(DenyReason::InvalidName.into());
        }
        guard::check_question_limit(self.questions.as_ref(), new.ticket_type_id).await?;
        self.questions.create(new).await
    }

    pub async fn list_questions(&self, ticket_type_id: i64) -> Result<Vec<Question>, Error> {
        self.questions.list_for_type(ticket_type_id).await
    }

    pub async fn update_question(&self, question: &Question) -> Result<(), Error> {
        self.questions.update(question).await
    }

    pub async fn remove_question(&self, question_id: i64) -> Result<(), Error> {
        self.questions.delete(question_id).await
    }

    /// The intake form a type currently presents.
    pub async fn form_for_type(&self, ticket_type_id: i64) -> Result<render::FormSpec, Error> {
        let ticket_type = self
            .types
            .get(ticket_type_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("ticket type {ticket_type_id}")))?;
        let questions = self.questions.list_for_type(ticket_type_id).await?;
        Ok(render::form_spec(&ticket_type, &questions))
    }

    pub async fn guild_config(&self, guild_id: &str) -> Result<Option<GuildConfig>, Error> {
        self.guild_config.get(guild_id).await
    }

    pub async fn set_default_log_channel(
        &self,
        guild_id: &str,
        channel_id: Option<&str>,
    ) -> Result<(), Error> {
        self.guild_config
            .set_default_log_channel(guild_id, channel_id)
            .await
    }
}
