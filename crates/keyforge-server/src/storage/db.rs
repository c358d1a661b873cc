//! `SQLite` database for the keyforge license server.

keyforge_core::define_database!(LicenseDatabase, "License database migrations complete");
