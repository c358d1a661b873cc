//! License lifecycle service shared by the HTTP and bot surfaces.

pub mod license_svc;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod license_svc_tests;

pub use license_svc::{DEFAULT_STORE_TIMEOUT, Inspection, LicenseService, MAX_CREATE_ATTEMPTS};
