//! Telegram operator bot.
//!
//! Long-polls the Bot API and answers `/start`, `/generate`, `/ban`, `/list`
//! and `/verify`. Everything except `/start` is restricted to the configured
//! operator ids.

pub mod client;
pub mod commands;
pub mod handler;
pub mod poller;
pub mod types;


pub use client::{BotError, TelegramClient};
pub use commands::Command;
pub use handler::CommandHandler;
pub use poller::BotPoller;
