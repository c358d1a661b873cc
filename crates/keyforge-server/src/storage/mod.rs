//! `SQLite` storage for the keyforge license server.
//!
//! A single `licenses` table keyed by the license key.

mod db;
mod models;
mod queries;


pub use db::LicenseDatabase;
pub use keyforge_core::db::DatabaseError;
pub use models::LicenseRow;
