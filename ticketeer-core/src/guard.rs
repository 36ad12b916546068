// ticketeer-core/src/guard.rs
//
// Capacity and eligibility checks. Each guard either passes or returns
// `Error::Rejected` with a reason the caller can show to the user verbatim.

use ticketeer_common::models::{
    MAX_PANELS, MAX_QUESTIONS_PER_TYPE, MAX_TICKETS_PER_PANEL, MAX_TYPES_PER_PANEL, Panel,
    TicketType,
};
use ticketeer_common::traits::repository_traits::{
    PanelRepository, QuestionRepository, TicketRepository, TicketTypeRepository,
};
use ticketeer_common::{DenyReason, Error};

pub async fn check_panel_limit(panels: &dyn PanelRepository, guild_id: &str) -> Result<(), Error> {
    if panels.count_for_guild(guild_id).await? >= MAX_PANELS {
        return Err(DenyReason::PanelLimit.into());
    }
    Ok(())
}

pub async fn check_type_limit(
    types: &dyn TicketTypeRepository,
    panel_id: i64,
) -> Result<(), Error> {
    if types.count_for_panel(panel_id).await? >= MAX_TYPES_PER_PANEL {
        return Err(DenyReason::TicketTypeLimit.into());
    }
    Ok(())
}

pub async fn check_question_limit(
    questions: &dyn QuestionRepository,
    ticket_type_id: i64,
) -> Result<(), Error> {
    if questions.count_for_type(ticket_type_id).await? >= MAX_QUESTIONS_PER_TYPE {
        return Err(DenyReason::QuestionLimit.into());
    }
    Ok(())
}

/// A panel must keep at least one ticket type once it has any.
pub async fn check_not_last_type(
    types: &dyn TicketTypeRepository,
    panel_id: i64,
) -> Result<(), Error> {
    if types.count_for_panel(panel_id).await? <= 1 {
        return Err(DenyReason::LastTicketType.into());
    }
    Ok(())
}

/// Full open-eligibility check for one user against a panel (and the chosen
/// type, when the panel has typed intake). Re-run under the panel lock right
/// before channel creation; button clicks can race.
pub async fn check_open_allowed(
    tickets: &dyn TicketRepository,
    panel: &Panel,
    ticket_type: Option<&TicketType>,
    user_id: &str,
) -> Result<(), Error> {
    if panel.disabled {
        return Err(DenyReason::PanelDisabled.into());
    }
    if tickets.open_count_for_panel(panel.panel_id).await? >= MAX_TICKETS_PER_PANEL {
        return Err(DenyReason::PanelFull.into());
    }

    // Duplicate scope follows the intake shape: per-type when a type was
    // clicked, per-panel on the legacy single-button path.
    match ticket_type {
        Some(tt) => {
            if !tt.allow_duplicate
                && tickets.has_open_for_type(tt.ticket_type_id, user_id).await?
            {
                return Err(DenyReason::DuplicateTicket.into());
            }
        }
        None => {
            if tickets.has_open_for_panel(panel.panel_id, user_id).await? {
                return Err(DenyReason::DuplicateTicket.into());
            }
        }
    }

    Ok(())
}
