//! Portrait Telegram - Telegram Bot Integration
//!
//! A small Bot API client (long polling, plain text replies) and the bot
//! loop that feeds private-chat messages into the portrait funnel.

pub mod api;
pub mod bot;
pub mod command;
pub mod error;
pub mod types;

pub use api::TelegramApi;
pub use bot::TelegramBot;
pub use command::{Command, parse_command};
pub use error::{Result, TelegramError};
