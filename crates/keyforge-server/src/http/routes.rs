//! Route handlers.
//!
//! A missing or malformed JSON body is treated as an empty object, so it
//! produces the same "missing key" / "invalid license type" answers as an
//! explicit empty request.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use keyforge_core::{InvalidReason, LicenseError, LicenseType};

use super::{ApiError, AppState, format_timestamp};

pub const LIVENESS_TEXT: &str = "License server is running.";

const REASON_MISSING_KEY: &str = "missing key";
const REASON_NOT_FOUND: &str = "not found";

#[derive(Debug, Default, Deserialize)]
pub struct GenerateRequest {
    #[serde(default, rename = "type")]
    pub license_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct KeyRequest {
    #[serde(default)]
    pub key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub key: String,
    #[serde(rename = "type")]
    pub license_type: LicenseType,
    pub expires: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub valid: bool,
    #[serde(rename = "type")]
    pub license_type: LicenseType,
    pub days_left: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct Rejection {
    pub valid: bool,
    pub reason: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub banned: bool,
    pub expired: bool,
    #[serde(rename = "type")]
    pub license_type: Option<LicenseType>,
    pub expires_at: Option<String>,
    pub reason: Option<&'static str>,
}

impl ValidateResponse {
    const fn unresolved(reason: &'static str) -> Self {
        Self {
            valid: false,
            banned: false,
            expired: false,
            license_type: None,
            expires_at: None,
            reason: Some(reason),
        }
    }
}

fn body_or_default<T: Default>(body: Result<Json<T>, JsonRejection>) -> T {
    body.map(|Json(inner)| inner).unwrap_or_default()
}

/// `GET /` and `GET /ping`
pub async fn liveness() -> &'static str {
    LIVENESS_TEXT
}

/// `POST /generate`: issue a new license.
pub async fn generate(
    State(state): State<AppState>,
    body: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let req = body_or_default(body);
    let license = state
        .service
        .create(req.license_type.as_deref().unwrap_or_default())
        .await?;

    Ok(Json(GenerateResponse {
        expires: license.expires_at.map(format_timestamp),
        license_type: license.license_type,
        key: license.key,
    }))
}

/// `POST /verify`: strict check; banned and expired keys answer 403.
pub async fn verify(
    State(state): State<AppState>,
    body: Result<Json<KeyRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let req = body_or_default(body);
    let key = req.key.unwrap_or_default();

    let (status, reason) = match state.service.verify(&key).await {
        Ok(v) => {
            return Ok(Json(VerifyResponse {
                valid: true,
                license_type: v.license_type,
                days_left: v.days_left,
            })
            .into_response());
        }
        Err(LicenseError::MissingKey) => (StatusCode::BAD_REQUEST, REASON_MISSING_KEY),
        Err(LicenseError::NotFound) => (StatusCode::NOT_FOUND, REASON_NOT_FOUND),
        Err(LicenseError::Banned) => (StatusCode::FORBIDDEN, InvalidReason::Banned.as_str()),
        Err(LicenseError::Expired) => (StatusCode::FORBIDDEN, InvalidReason::Expired.as_str()),
        Err(other) => return Err(other.into()),
    };

    Ok((
        status,
        Json(Rejection {
            valid: false,
            reason,
        }),
    )
        .into_response())
}

/// `POST /api/validate`: lenient check; banned and expired keys answer 200
/// with flags set.
pub async fn validate(
    State(state): State<AppState>,
    body: Result<Json<KeyRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let req = body_or_default(body);
    let key = req.key.unwrap_or_default();

    let (status, reason) = match state.service.validate(&key).await {
        Ok(v) => {
            return Ok(Json(ValidateResponse {
                valid: v.valid,
                banned: v.banned,
                expired: v.expired,
                license_type: Some(v.license_type),
                expires_at: v.expires_at.map(format_timestamp),
                reason: v.reason.map(InvalidReason::as_str),
            })
            .into_response());
        }
        Err(LicenseError::MissingKey) => (StatusCode::BAD_REQUEST, REASON_MISSING_KEY),
        Err(LicenseError::NotFound) => (StatusCode::NOT_FOUND, REASON_NOT_FOUND),
        Err(other) => return Err(other.into()),
    };

    Ok((status, Json(ValidateResponse::unresolved(reason))).into_response())
}
