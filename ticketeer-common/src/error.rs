// ================================================================
// File: ticketeer-common/src/error.rs
// ================================================================

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Not found: {0}")]
    NotFound(String),

    /// An expected guard/invariant rejection. Surfaced to the user verbatim,
    /// never logged as an error.
    #[error("{0}")]
    Rejected(DenyReason),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failure of an external effect against the messaging platform.
    #[error("Platform error: {0}")]
    Platform(String),

    /// A persisted row is in a state the engine cannot act on.
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl Error {
    /// True for rejections the caller should show to the user as-is.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Error::Rejected(_))
    }
}

/// Reason a guard or invariant check denied an operation. Every variant has a
/// stable machine code for callers and a human-readable message for users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyReason {
    PanelLimit,
    TicketTypeLimit,
    QuestionLimit,
    LastTicketType,
    PanelDisabled,
    PanelFull,
    DuplicateTicket,
    AlreadyClaimed { by: String },
    NotClaimed,
    AlreadyClosing,
    NothingToCancel,
    CloseRequestPending,
    NoCloseRequest,
    NotRequester,
    NotClosed,
    AlreadyReopened,
    CannotRemoveRequester,
    InvalidName,
}

impl DenyReason {
    pub fn code(&self) -> &'static str {
        match self {
            DenyReason::PanelLimit => "panel_limit",
            DenyReason::TicketTypeLimit => "ticket_type_limit",
            DenyReason::QuestionLimit => "question_limit",
            DenyReason::LastTicketType => "last_ticket_type",
            DenyReason::PanelDisabled => "panel_disabled",
            DenyReason::PanelFull => "panel_full",
            DenyReason::DuplicateTicket => "duplicate_ticket",
            DenyReason::AlreadyClaimed { .. } => "already_claimed",
            DenyReason::NotClaimed => "not_claimed",
            DenyReason::AlreadyClosing => "already_closing",
            DenyReason::NothingToCancel => "nothing_to_cancel",
            DenyReason::CloseRequestPending => "close_request_pending",
            DenyReason::NoCloseRequest => "no_close_request",
            DenyReason::NotRequester => "not_requester",
            DenyReason::NotClosed => "not_closed",
            DenyReason::AlreadyReopened => "already_reopened",
            DenyReason::CannotRemoveRequester => "cannot_remove_requester",
            DenyReason::InvalidName => "invalid_name",
        }
    }
}

impl std::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DenyReason::PanelLimit => {
                write!(f, "Maximum {} panels per server.", crate::models::MAX_PANELS)
            }
            DenyReason::TicketTypeLimit => write!(
                f,
                "Maximum {} ticket types per panel.",
                crate::models::MAX_TYPES_PER_PANEL
            ),
            DenyReason::QuestionLimit => write!(
                f,
                "Maximum {} questions per ticket type.",
                crate::models::MAX_QUESTIONS_PER_TYPE
            ),
            DenyReason::LastTicketType => write!(
                f,
                "Cannot delete the last ticket type. Panels must have at least one ticket type."
            ),
            DenyReason::PanelDisabled => {
                write!(f, "Tickets are temporarily disabled for this panel.")
            }
            DenyReason::PanelFull => write!(
                f,
                "This panel has reached the maximum of {} open tickets.",
                crate::models::MAX_TICKETS_PER_PANEL
            ),
            DenyReason::DuplicateTicket => write!(
                f,
                "You already have an open ticket. Close it first to open another."
            ),
            DenyReason::AlreadyClaimed { by } => write!(f, "Already claimed by <@{by}>."),
            DenyReason::NotClaimed => write!(f, "Ticket is not claimed."),
            DenyReason::AlreadyClosing => write!(f, "This ticket is already closing."),
            DenyReason::NothingToCancel => write!(f, "No pending close to cancel."),
            DenyReason::CloseRequestPending => {
                write!(f, "A close request is already pending for this ticket.")
            }
            DenyReason::NoCloseRequest => write!(f, "This close request has expired."),
            DenyReason::NotRequester => write!(
                f,
                "Only the ticket opener can accept or deny the close request."
            ),
            DenyReason::NotClosed => write!(f, "Ticket not found or already open."),
            DenyReason::AlreadyReopened => {
                write!(f, "This ticket has already been reopened.")
            }
            DenyReason::CannotRemoveRequester => write!(f, "Cannot remove the ticket owner."),
            DenyReason::InvalidName => write!(f, "Name cannot be empty."),
        }
    }
}

impl From<DenyReason> for Error {
    fn from(reason: DenyReason) -> Self {
        Error::Rejected(reason)
    }
}
