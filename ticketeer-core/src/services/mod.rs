// ticketeer-core/src/services/mod.rs

pub mod admin;
pub mod lifecycle;

pub use admin::PanelAdminService;
pub use lifecycle::TicketLifecycleService;
