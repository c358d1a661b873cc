//! `keyforge` Core Library
//!
//! Shared functionality for `keyforge` components:
//! - License types and the derived-status rules (active, banned, expired)
//! - License key generation and normalization
//! - Clock abstraction for time-dependent judgments
//! - `SQLite` pool helpers and error types

pub mod clock;
pub mod db;
pub mod error;
pub mod keygen;
pub mod license;
pub mod tracing_init;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{LicenseError, Result};
pub use keygen::{KeyGenerator, RandomKeyGenerator, normalize_key};
pub use license::{InvalidReason, License, LicenseStatus, LicenseType, Validation, Verification};
