//! Session extraction from identity-provider headers.
//!
//! The identity provider (behind the gateway) authenticates the caller and
//! forwards the verified identity as `x-user-*` headers. No `x-user-id` means
//! an anonymous caller; malformed identity headers are rejected with 400.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::session::{Session, User};
use crate::roles::permissions::Role;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_EMAIL_HEADER: &str = "x-user-email";
pub const USER_NAME_HEADER: &str = "x-user-name";
pub const USER_ROLE_HEADER: &str = "x-user-role";
pub const EMAIL_VERIFIED_HEADER: &str = "x-user-email-verified";

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        session_from_headers(&parts.headers)
    }
}

pub fn session_from_headers(headers: &HeaderMap) -> Result<Session, AppError> {
    let Some(raw_id) = header(headers, USER_ID_HEADER)? else {
        return Ok(Session::Unauthenticated);
    };

    let id = Uuid::parse_str(raw_id)
        .map_err(|_| AppError::Validation(format!("{USER_ID_HEADER} must be a UUID")))?;

    let email = header(headers, USER_EMAIL_HEADER)?
        .ok_or_else(|| AppError::Validation(format!("{USER_EMAIL_HEADER} header is required")))?
        .to_string();

    let display_name = header(headers, USER_NAME_HEADER)?.map(str::to_string);

    let email_verified = match header(headers, EMAIL_VERIFIED_HEADER)? {
        None => false,
        Some(v) => v.parse::<bool>().map_err(|_| {
            AppError::Validation(format!("{EMAIL_VERIFIED_HEADER} must be true or false"))
        })?,
    };

    let role = header(headers, USER_ROLE_HEADER)?
        .map(|r| r.parse::<Role>())
        .transpose()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    Ok(Session::new(
        User {
            id,
            email,
            display_name,
            email_verified,
        },
        role,
    ))
}

/// Present, non-empty header value.
fn header<'a>(headers: &'a HeaderMap, name: &str) -> Result<Option<&'a str>, AppError> {
    match headers.get(name) {
        None => Ok(None),
        Some(value) => {
            let value = value
                .to_str()
                .map_err(|_| AppError::Validation(format!("{name} header is not valid UTF-8")))?
                .trim();
            Ok((!value.is_empty()).then_some(value))
        }
    }
}
