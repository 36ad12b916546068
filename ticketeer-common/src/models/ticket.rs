use chrono::{DateTime, Utc};

/// Primary lifecycle status of a ticket.
///
/// `Closing` means a deletion countdown is (or was) pending; `Closed` is
/// terminal. The claim flag is deliberately *not* part of this enum; it is
/// an orthogonal annotation (`claimed_by`) so claim/unclaim never interact
/// with close transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketStatus {
    Open,
    Closing,
    Closed,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::Closing => "closing",
            TicketStatus::Closed => "closed",
        }
    }

    pub fn parse(s: &str) -> Option<TicketStatus> {
        match s {
            "open" => Some(TicketStatus::Open),
            "closing" => Some(TicketStatus::Closing),
            "closed" => Some(TicketStatus::Closed),
            _ => None,
        }
    }
}

/// One support conversation, active or historical. Rows are never deleted on
/// close; the channel is destroyed but the row stays for audit/transcripts.
#[derive(Debug, Clone)]
pub struct Ticket {
    pub ticket_id: i64,
    pub panel_id: i64,
    /// Non-owning lookup key; may dangle after the type is deleted.
    pub ticket_type_id: Option<i64>,
    pub channel_id: String,
    /// Requester (opener) id.
    pub user_id: String,
    /// Per-panel sequence number, strictly increasing, never reused.
    pub number: i64,
    pub status: TicketStatus,
    pub claimed_by: Option<String>,
    pub claimed_at: Option<DateTime<Utc>>,
    /// Set once the closed ticket's reopen affordance has been consumed.
    pub reopened: bool,
    pub created_at: DateTime<Utc>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
}

/// A captured form answer with the question label snapshotted at ticket
/// creation, so later question edits cannot rewrite history.
#[derive(Debug, Clone)]
pub struct TicketResponse {
    pub response_id: i64,
    pub ticket_id: i64,
    pub question_id: i64,
    pub label: String,
    pub response: String,
}

/// Answer payload handed to the store at ticket creation.
#[derive(Debug, Clone)]
pub struct ResponseDraft {
    pub question_id: i64,
    pub label: String,
    pub response: String,
}

/// The acting identity behind a lifecycle operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: String,
    pub username: String,
}

impl Actor {
    pub fn new(user_id: impl Into<String>, username: impl Into<String>) -> Actor {
        Actor {
            user_id: user_id.into(),
            username: username.into(),
        }
    }

    /// Synthetic identity recorded by the auto-close sweeper.
    pub fn auto_close() -> Actor {
        Actor::new("auto-close", "auto-close")
    }
}
