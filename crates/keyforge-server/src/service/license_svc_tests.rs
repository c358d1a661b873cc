//! Tests for the license lifecycle service.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use keyforge_core::keygen::is_well_formed;
use keyforge_core::{
    FixedClock, InvalidReason, KeyGenerator, LicenseError, LicenseStatus, LicenseType,
};

use super::license_svc::{Inspection, LicenseService};
use crate::storage::LicenseDatabase;

/// Hands out a fixed sequence of keys, then repeats the last one.
struct ScriptedKeys {
    keys: Mutex<VecDeque<String>>,
    last: String,
}

impl ScriptedKeys {
    fn new(keys: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            keys: Mutex::new(keys.iter().map(ToString::to_string).collect()),
            last: keys.last().map(ToString::to_string).unwrap_or_default(),
        })
    }
}

impl KeyGenerator for ScriptedKeys {
    fn generate(&self) -> String {
        self.keys
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.last.clone())
    }
}

fn t0() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

async fn setup() -> (LicenseService, Arc<FixedClock>) {
    let db = LicenseDatabase::open_in_memory().await.unwrap();
    let clock = Arc::new(FixedClock::new(t0()));
    let svc = LicenseService::new(db, Duration::from_secs(5)).with_clock(clock.clone());
    (svc, clock)
}

#[tokio::test]
async fn create_produces_well_formed_keys() {
    let (svc, _clock) = setup().await;

    for name in ["month", "year", "lifetime"] {
        let lic = svc.create(name).await.unwrap();
        assert!(is_well_formed(&lic.key), "malformed key: {}", lic.key);
        assert_eq!(lic.license_type.as_str(), name);
        assert_eq!(lic.created_at, t0());
        assert!(lic.is_active);
        assert_eq!(
            lic.expires_at.is_none(),
            lic.license_type == LicenseType::Lifetime
        );
    }
}

#[tokio::test]
async fn create_computes_expiry_from_type() {
    let (svc, _clock) = setup().await;

    let month = svc.create_license(LicenseType::Month).await.unwrap();
    assert_eq!(month.expires_at, Some(t0() + TimeDelta::days(30)));

    let year = svc.create_license(LicenseType::Year).await.unwrap();
    assert_eq!(year.expires_at, Some(t0() + TimeDelta::days(365)));
}

#[tokio::test]
async fn create_rejects_unknown_type() {
    let (svc, _clock) = setup().await;

    for bad in ["", "week", "MONTH", " month"] {
        let err = svc.create(bad).await.unwrap_err();
        assert!(
            matches!(err, LicenseError::InvalidArgument(_)),
            "{bad:?} gave {err}"
        );
    }
    assert!(svc.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn fresh_license_validates() {
    let (svc, _clock) = setup().await;

    for t in LicenseType::ALL {
        let lic = svc.create_license(t).await.unwrap();
        let v = svc.validate(&lic.key).await.unwrap();
        assert!(v.valid);
        assert!(!v.banned);
        assert!(!v.expired);
        assert_eq!(v.reason, None);
        assert_eq!(v.license_type, t);
    }
}

#[tokio::test]
async fn validate_normalizes_key() {
    let (svc, _clock) = setup().await;
    let svc = svc.with_key_generator(ScriptedKeys::new(&["AB-CDEFGH-IJKL-MNOP"]));
    svc.create("year").await.unwrap();

    let spaced = svc.validate(" ab-cdefgh-ijkl-mnop ").await.unwrap();
    let exact = svc.validate("AB-CDEFGH-IJKL-MNOP").await.unwrap();
    assert_eq!(spaced, exact);
    assert!(exact.valid);
}

#[tokio::test]
async fn validate_missing_key() {
    let (svc, _clock) = setup().await;
    assert_eq!(svc.validate("").await, Err(LicenseError::MissingKey));
    assert_eq!(svc.validate("  \t ").await, Err(LicenseError::MissingKey));
}

#[tokio::test]
async fn validate_unknown_key_is_not_found() {
    let (svc, _clock) = setup().await;
    assert_eq!(
        svc.validate("ZZ-ZZZZZZ-ZZZZ-ZZZZ").await,
        Err(LicenseError::NotFound)
    );
}

#[tokio::test]
async fn malformed_key_is_not_found() {
    let (svc, _clock) = setup().await;
    svc.create("month").await.unwrap();

    for garbage in ["hello", "AB-CDEFGH", "ab_cdefgh_ijkl_mnop", "AB-CDEFGH-IJKL-MNOP-QRST"] {
        assert_eq!(svc.validate(garbage).await, Err(LicenseError::NotFound), "{garbage}");
        assert_eq!(svc.verify(garbage).await, Err(LicenseError::NotFound), "{garbage}");
        assert!(!is_well_formed(&keyforge_core::normalize_key(garbage)));
    }
}

#[tokio::test]
async fn month_license_expires() {
    let (svc, clock) = setup().await;
    let lic = svc.create("month").await.unwrap();

    clock.advance(TimeDelta::days(31));
    let v = svc.validate(&lic.key).await.unwrap();
    assert!(v.expired);
    assert!(!v.valid);
    assert!(!v.banned);
    assert_eq!(v.reason, Some(InvalidReason::Expired));

    assert_eq!(svc.verify(&lic.key).await, Err(LicenseError::Expired));
}

#[tokio::test]
async fn ban_then_validate_reports_banned() {
    let (svc, _clock) = setup().await;
    let lic = svc.create("year").await.unwrap();

    assert!(svc.ban(&lic.key).await.unwrap());
    let v = svc.validate(&lic.key).await.unwrap();
    assert!(!v.valid);
    assert!(v.banned);
    assert_eq!(v.reason, Some(InvalidReason::Banned));
    assert_eq!(svc.verify(&lic.key).await, Err(LicenseError::Banned));
}

#[tokio::test]
async fn banned_precedes_expired() {
    let (svc, clock) = setup().await;
    let lic = svc.create("month").await.unwrap();
    svc.ban(&lic.key).await.unwrap();

    clock.advance(TimeDelta::days(90));
    let v = svc.validate(&lic.key).await.unwrap();
    assert!(v.banned);
    assert!(v.expired);
    assert_eq!(v.reason, Some(InvalidReason::Banned));
    assert_eq!(svc.verify(&lic.key).await, Err(LicenseError::Banned));
}

#[tokio::test]
async fn ban_normalizes_key() {
    let (svc, _clock) = setup().await;
    let svc = svc.with_key_generator(ScriptedKeys::new(&["AB-CDEFGH-IJKL-MNOP"]));
    svc.create("lifetime").await.unwrap();

    assert!(svc.ban("  ab-cdefgh-ijkl-mnop").await.unwrap());
    assert!(svc.validate("AB-CDEFGH-IJKL-MNOP").await.unwrap().banned);
}

#[tokio::test]
async fn ban_unknown_key_is_noop() {
    let (svc, _clock) = setup().await;
    assert!(!svc.ban("NO-SUCHKE-YYYY-YYYY").await.unwrap());
    assert_eq!(svc.ban(" ").await, Err(LicenseError::MissingKey));
}

#[tokio::test]
async fn verify_reports_days_left() {
    let (svc, clock) = setup().await;
    let month = svc.create("month").await.unwrap();
    let lifetime = svc.create("lifetime").await.unwrap();

    clock.advance(TimeDelta::days(10) + TimeDelta::hours(3));
    let v = svc.verify(&month.key).await.unwrap();
    assert_eq!(v.license_type, LicenseType::Month);
    assert_eq!(v.days_left, Some(19));

    let v = svc.verify(&lifetime.key).await.unwrap();
    assert_eq!(v.license_type, LicenseType::Lifetime);
    assert_eq!(v.days_left, None);
}

#[tokio::test]
async fn verify_missing_and_unknown() {
    let (svc, _clock) = setup().await;
    assert_eq!(svc.verify("").await, Err(LicenseError::MissingKey));
    assert_eq!(
        svc.verify("ZZ-ZZZZZZ-ZZZZ-ZZZZ").await,
        Err(LicenseError::NotFound)
    );
}

#[tokio::test]
async fn inspect_reports_status() {
    let (svc, clock) = setup().await;
    let month = svc.create("month").await.unwrap();
    let banned = svc.create("lifetime").await.unwrap();
    svc.ban(&banned.key).await.unwrap();

    let Inspection {
        license,
        status,
        days_left,
    } = svc.inspect(&month.key).await.unwrap();
    assert_eq!(license, month);
    assert_eq!(status, LicenseStatus::Active);
    assert_eq!(days_left, Some(30));

    let inspected = svc.inspect(&banned.key).await.unwrap();
    assert_eq!(inspected.status, LicenseStatus::Banned);
    assert_eq!(inspected.days_left, None);

    clock.advance(TimeDelta::days(45));
    let inspected = svc.inspect(&month.key).await.unwrap();
    assert_eq!(inspected.status, LicenseStatus::Expired);
    assert_eq!(inspected.days_left, None);
}

#[tokio::test]
async fn collision_regenerates_key() {
    let (svc, _clock) = setup().await;
    let svc = svc.with_key_generator(ScriptedKeys::new(&[
        "AA-AAAAAA-AAAA-AAAA",
        "AA-AAAAAA-AAAA-AAAA",
        "AA-AAAAAA-AAAA-AAAA",
        "BB-BBBBBB-BBBB-BBBB",
    ]));

    let first = svc.create("month").await.unwrap();
    assert_eq!(first.key, "AA-AAAAAA-AAAA-AAAA");

    let second = svc.create("year").await.unwrap();
    assert_eq!(second.key, "BB-BBBBBB-BBBB-BBBB");
    assert_eq!(svc.list().await.unwrap().len(), 2);
}

#[tokio::test]
async fn exhausted_collisions_are_unavailable() {
    let (svc, _clock) = setup().await;
    let svc = svc.with_key_generator(ScriptedKeys::new(&["AA-AAAAAA-AAAA-AAAA"]));
    svc.create("month").await.unwrap();

    let err = svc.create("month").await.unwrap_err();
    assert!(matches!(err, LicenseError::Unavailable(_)), "got: {err}");
    assert_eq!(svc.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn list_is_newest_first() {
    let (svc, clock) = setup().await;
    let a = svc.create("month").await.unwrap();
    clock.advance(TimeDelta::minutes(1));
    let b = svc.create("year").await.unwrap();
    clock.advance(TimeDelta::minutes(1));
    let c = svc.create("lifetime").await.unwrap();

    let listed = svc.list().await.unwrap();
    assert_eq!(listed, vec![c, b, a]);
    assert!(
        listed
            .windows(2)
            .all(|pair| pair[0].created_at >= pair[1].created_at)
    );
}

#[tokio::test]
async fn list_tolerates_equal_timestamps() {
    let (svc, _clock) = setup().await;
    for _ in 0..5 {
        svc.create("month").await.unwrap();
    }
    assert_eq!(svc.list().await.unwrap().len(), 5);
}

#[tokio::test]
async fn lifetime_scenario() {
    let (svc, _clock) = setup().await;
    let lic = svc.create("lifetime").await.unwrap();

    let v = svc.validate(&lic.key).await.unwrap();
    assert!(v.valid);
    assert_eq!(v.license_type, LicenseType::Lifetime);
    assert_eq!(v.expires_at, None);

    svc.ban(&lic.key).await.unwrap();
    let v = svc.validate(&lic.key).await.unwrap();
    assert!(!v.valid);
    assert!(v.banned);
    assert_eq!(v.reason, Some(InvalidReason::Banned));
}

#[tokio::test]
async fn slow_store_call_is_unavailable() {
    let db = LicenseDatabase::open_in_memory().await.unwrap();
    let svc = LicenseService::new(db, Duration::from_millis(20));

    let result: Result<(), LicenseError> = svc
        .store("stalled", std::future::pending::<Result<(), _>>())
        .await;
    assert!(matches!(result, Err(LicenseError::Unavailable(msg)) if msg.contains("stalled")));
}

#[tokio::test]
async fn closed_pool_is_unavailable() {
    let (svc, _clock) = setup().await;
    svc.db_for_tests().pool().close().await;

    let err = svc.validate("AB-CDEFGH-IJKL-MNOP").await.unwrap_err();
    assert!(matches!(err, LicenseError::Unavailable(_)), "got: {err}");
    let err = svc.create("month").await.unwrap_err();
    assert!(matches!(err, LicenseError::Unavailable(_)), "got: {err}");
}
