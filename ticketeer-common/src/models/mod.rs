// File: ticketeer-common/src/models/mod.rs
pub mod guild_config;
pub mod panel;
pub mod question;
pub mod ticket;
pub mod ticket_type;

pub use guild_config::GuildConfig;
pub use panel::{NewPanel, Panel};
pub use question::{NewQuestion, Question, QuestionStyle};
pub use ticket::{Actor, ResponseDraft, Ticket, TicketResponse, TicketStatus};
pub use ticket_type::{ButtonStyle, NewTicketType, TicketType};

/// Per-guild panel ceiling.
pub const MAX_PANELS: i64 = 50;
/// Open-ticket ceiling per panel.
pub const MAX_TICKETS_PER_PANEL: i64 = 50;
/// Button-row ceiling: one action row holds at most five buttons.
pub const MAX_TYPES_PER_PANEL: i64 = 5;
/// Modal-form ceiling: at most five input fields per form.
pub const MAX_QUESTIONS_PER_TYPE: i64 = 5;
