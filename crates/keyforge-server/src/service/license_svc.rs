//! License lifecycle: create, validate, verify, ban, list.
//!
//! Every operation is a single read or a single write against
//! [`LicenseDatabase`], bounded by a fixed timeout. Store failures and
//! timeouts surface as [`LicenseError::Unavailable`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::SubsecRound;
use tracing::{debug, info, instrument, warn};

use keyforge_core::db::DatabaseError;
use keyforge_core::keygen::is_well_formed;
use keyforge_core::{
    Clock, KeyGenerator, License, LicenseError, LicenseStatus, LicenseType, RandomKeyGenerator,
    SystemClock, Validation, Verification, normalize_key,
};

use crate::storage::LicenseDatabase;

/// Attempts at inserting a freshly generated key before giving up.
pub const MAX_CREATE_ATTEMPTS: usize = 5;

/// Default upper bound for one store call.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// A stored license together with its status at lookup time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inspection {
    pub license: License,
    pub status: LicenseStatus,
    /// Remaining whole days for active, expiring licenses.
    pub days_left: Option<i64>,
}

#[derive(Clone)]
pub struct LicenseService {
    db: LicenseDatabase,
    keys: Arc<dyn KeyGenerator>,
    clock: Arc<dyn Clock>,
    store_timeout: Duration,
}

impl LicenseService {
    pub fn new(db: LicenseDatabase, store_timeout: Duration) -> Self {
        Self {
            db,
            keys: Arc::new(RandomKeyGenerator),
            clock: Arc::new(SystemClock),
            store_timeout,
        }
    }

    #[must_use]
    pub fn with_key_generator(mut self, keys: Arc<dyn KeyGenerator>) -> Self {
        self.keys = keys;
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Issue a new license of the named type (`month`, `year` or `lifetime`).
    pub async fn create(&self, license_type: &str) -> Result<License, LicenseError> {
        let license_type: LicenseType = license_type.parse()?;
        self.create_license(license_type).await
    }

    /// Issue a new license, regenerating the key on collision.
    #[instrument(skip(self), fields(license_type = %license_type))]
    pub async fn create_license(&self, license_type: LicenseType) -> Result<License, LicenseError> {
        // Stored timestamps have second precision.
        let now = self.clock.now().trunc_subsecs(0);

        for attempt in 1..=MAX_CREATE_ATTEMPTS {
            let license = License::new(self.keys.generate(), license_type, now);
            match self
                .store("insert_license", self.db.insert_license(&license))
                .await
            {
                Ok(()) => {
                    info!(key = %license.key, expires_at = ?license.expires_at, "License created");
                    return Ok(license);
                }
                Err(LicenseError::Conflict) => {
                    warn!(attempt, "Generated license key already exists, regenerating");
                }
                Err(e) => return Err(e),
            }
        }

        warn!(
            attempts = MAX_CREATE_ATTEMPTS,
            "Could not allocate a unique license key"
        );
        Err(LicenseError::Unavailable(format!(
            "no unique license key after {MAX_CREATE_ATTEMPTS} attempts"
        )))
    }

    /// Lenient check: returns flags and a reason instead of failing on
    /// banned or expired licenses.
    #[instrument(skip(self))]
    pub async fn validate(&self, key: &str) -> Result<Validation, LicenseError> {
        let now = self.clock.now();
        let license = self.find(key).await?;
        Ok(license.validate(now))
    }

    /// Strict check: banned and expired licenses are errors.
    #[instrument(skip(self))]
    pub async fn verify(&self, key: &str) -> Result<Verification, LicenseError> {
        let now = self.clock.now();
        let license = self.find(key).await?;
        license.verify(now)
    }

    /// The stored record and its current status, whatever that status is.
    #[instrument(skip(self))]
    pub async fn inspect(&self, key: &str) -> Result<Inspection, LicenseError> {
        let now = self.clock.now();
        let license = self.find(key).await?;
        let status = license.status(now);
        let days_left = match status {
            LicenseStatus::Active => license.days_left(now),
            LicenseStatus::Banned | LicenseStatus::Expired => None,
        };
        Ok(Inspection {
            license,
            status,
            days_left,
        })
    }

    /// Deactivate a license. Unknown keys are a no-op; the return value
    /// tells whether a record was affected.
    #[instrument(skip(self))]
    pub async fn ban(&self, key: &str) -> Result<bool, LicenseError> {
        let key = canonical(key)?;
        let affected = self
            .store("deactivate_license", self.db.deactivate_license(&key))
            .await?;
        if affected {
            info!(key = %key, "License banned");
        } else {
            info!(key = %key, "Ban requested for unknown license key");
        }
        Ok(affected)
    }

    /// All licenses, newest first.
    pub async fn list(&self) -> Result<Vec<License>, LicenseError> {
        self.store("list_licenses", self.db.list_licenses()).await
    }

    async fn find(&self, key: &str) -> Result<License, LicenseError> {
        let key = canonical(key)?;
        self.store("get_license", self.db.get_license(&key))
            .await?
            .ok_or_else(|| {
                debug!(key = %key, well_formed = is_well_formed(&key), "License not found");
                LicenseError::NotFound
            })
    }

    #[cfg(test)]
    pub(crate) const fn db_for_tests(&self) -> &LicenseDatabase {
        &self.db
    }

    /// Run one store call under the configured timeout.
    pub(crate) async fn store<T, F>(&self, op: &'static str, call: F) -> Result<T, LicenseError>
    where
        F: Future<Output = Result<T, DatabaseError>>,
    {
        match tokio::time::timeout(self.store_timeout, call).await {
            Ok(result) => result.map_err(|e| {
                if !matches!(e, DatabaseError::Conflict(_)) {
                    warn!(op, error = %e, "License store call failed");
                }
                LicenseError::from(e)
            }),
            Err(_) => {
                warn!(op, timeout = ?self.store_timeout, "License store call timed out");
                Err(LicenseError::Unavailable(format!(
                    "{op} timed out after {:?}",
                    self.store_timeout
                )))
            }
        }
    }
}

fn canonical(raw: &str) -> Result<String, LicenseError> {
    let key = normalize_key(raw);
    if key.is_empty() {
        Err(LicenseError::MissingKey)
    } else {
        Ok(key)
    }
}
