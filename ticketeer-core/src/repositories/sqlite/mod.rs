// ticketeer-core/src/repositories/sqlite/mod.rs

pub mod guild_config;
pub mod panel;
pub mod question;
pub mod ticket;
pub mod ticket_type;

pub use guild_config::GuildConfigRepository;
pub use panel::PanelRepository;
pub use question::QuestionRepository;
pub use ticket::TicketRepository;
pub use ticket_type::TicketTypeRepository;
