// src/lib.rs

pub mod db;
pub mod guard;
pub mod render;
pub mod repositories;
pub mod services;
pub mod state;
pub mod tasks;
pub mod test_utils;
pub mod timers;
pub mod utils;

pub use db::Database;
pub use ticketeer_common::error::{DenyReason, Error};
