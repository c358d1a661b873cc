//! keyforge License Server Library
//!
//! Core functionality for the keyforge server:
//! - `SQLite` storage for license records
//! - License lifecycle service (create, validate, verify, ban, list)
//! - HTTP API for issuing and checking keys
//! - Telegram bot for operators

pub mod bot;
pub mod config;
pub mod http;
pub mod service;
pub mod storage;
