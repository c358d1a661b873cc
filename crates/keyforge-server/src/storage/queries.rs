//! Database queries for the keyforge license server.

use keyforge_core::License;
use keyforge_core::db::DatabaseError;

use super::db::LicenseDatabase;
use super::models::LicenseRow;

impl LicenseDatabase {
    /// Insert a new license.
    ///
    /// Fails with [`DatabaseError::Conflict`] if the key already exists.
    pub async fn insert_license(&self, license: &License) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO licenses (key, license_type, created_at, expires_at, is_active) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&license.key)
        .bind(license.license_type.as_str())
        .bind(license.created_at.timestamp())
        .bind(license.expires_at.map(|t| t.timestamp()))
        .bind(license.is_active)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Get a license by its canonical key.
    pub async fn get_license(&self, key: &str) -> Result<Option<License>, DatabaseError> {
        sqlx::query_as::<_, LicenseRow>("SELECT * FROM licenses WHERE key = ?")
            .bind(key)
            .fetch_optional(self.pool())
            .await?
            .map(License::try_from)
            .transpose()
    }

    /// Mark a license inactive. Returns `false` when no row matched.
    pub async fn deactivate_license(&self, key: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query("UPDATE licenses SET is_active = 0 WHERE key = ?")
            .bind(key)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// All licenses, newest first. Rows sharing a `created_at` come back in
    /// reverse insertion order.
    pub async fn list_licenses(&self) -> Result<Vec<License>, DatabaseError> {
        sqlx::query_as::<_, LicenseRow>("SELECT * FROM licenses ORDER BY created_at DESC, id DESC")
            .fetch_all(self.pool())
            .await?
            .into_iter()
            .map(License::try_from)
            .collect()
    }
}
