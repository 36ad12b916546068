// ticketeer-core/src/repositories/mod.rs

pub mod sqlite;

pub use sqlite::{
    GuildConfigRepository, PanelRepository, QuestionRepository, TicketRepository,
    TicketTypeRepository,
};
