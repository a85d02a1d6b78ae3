//! Outcome to HTTP response mapping.
//!
//! This is the only place board outcomes turn into status codes.

use serde::Serialize;
use serde_json::json;

use crate::error::{DenialKind, Error};

/// Status and JSON body to send back.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// HTTP status code
    pub status: u16,
    /// JSON body
    pub body: serde_json::Value,
}

impl Response {
    /// `200 OK` with `value` as the body.
    pub fn ok(value: &impl Serialize) -> Self {
        Self::json(200, value)
    }

    /// `201 Created` with `value` as the body.
    pub fn created(value: &impl Serialize) -> Self {
        Self::json(201, value)
    }

    /// `200 OK` with `{"success": true}`.
    pub fn success() -> Self {
        Self {
            status: 200,
            body: json!({ "success": true }),
        }
    }

    /// The error response for `err`.
    ///
    /// Store failures answer with a generic message; their details stay in
    /// the logs.
    pub fn from_error(err: &Error) -> Self {
        let body = match err {
            Error::Denied(denial) => json!({
                "error": denial.kind.as_str(),
                "message": denial.message,
            }),
            Error::Store(_) => internal_error_body(),
        };
        Self {
            status: status_code(err),
            body,
        }
    }

    fn json(status: u16, value: &impl Serialize) -> Self {
        match serde_json::to_value(value) {
            Ok(body) => Self { status, body },
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize response body");
                Self {
                    status: 500,
                    body: internal_error_body(),
                }
            }
        }
    }
}

fn internal_error_body() -> serde_json::Value {
    json!({ "error": "internal", "message": "Internal server error" })
}

/// Maps an error to its HTTP status code.
///
/// # Examples
///
/// ```
/// use featureboard_policy::web::status_code;
/// use featureboard_policy::{Denial, Error};
///
/// assert_eq!(status_code(&Error::from(Denial::unauthenticated())), 401);
/// assert_eq!(status_code(&Error::from(Denial::forbidden("delete"))), 403);
/// assert_eq!(status_code(&Error::from(Denial::not_found("fr-1"))), 404);
/// ```
pub fn status_code(err: &Error) -> u16 {
    match err {
        Error::Denied(denial) => match denial.kind {
            DenialKind::Unauthenticated => 401,
            DenialKind::Forbidden { .. } => 403,
            DenialKind::NotFound => 404,
            DenialKind::InvalidInput => 400,
            DenialKind::Conflict => 409,
        },
        Error::Store(_) => 500,
    }
}
