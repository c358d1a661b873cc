//! Row types for keyforge license storage.

use keyforge_core::License;
use keyforge_core::db::{DatabaseError, datetime_from_unix};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LicenseRow {
    pub id: i64,
    pub key: String,
    pub license_type: String,
    pub created_at: i64,
    pub expires_at: Option<i64>,
    pub is_active: bool,
}

impl TryFrom<LicenseRow> for License {
    type Error = DatabaseError;

    fn try_from(row: LicenseRow) -> Result<Self, Self::Error> {
        let license_type = row.license_type.parse().map_err(|_| {
            DatabaseError::InvalidData(format!(
                "license {} has unknown type '{}'",
                row.key, row.license_type
            ))
        })?;

        Ok(Self {
            license_type,
            created_at: datetime_from_unix(row.created_at)?,
            expires_at: row.expires_at.map(datetime_from_unix).transpose()?,
            is_active: row.is_active,
            key: row.key,
        })
    }
}
