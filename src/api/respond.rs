//! Purpose: Shared JSON error convention for HTTP responses.
//! Exports: `ErrorEnvelope`, `write_error`, `write_internal_error`, `write_json_data`, `extract_error`.
//! Role: Every failure reported over HTTP uses `{"error": "<message>"}`; the inverse
//! recovers that message from a peer's response body.
//! Invariants: Writers always produce a response; encode failures degrade to an empty body.
//! Invariants: `extract_error` never fails; anything unrecognized reads as "no error".

use std::collections::HashMap;
use std::error::Error as StdError;

use axum::body::Body;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::Response;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::core::error::{Error, ErrorKind};

const CONTENT_TYPE_JSON: &str = "application/json";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: String,
}

/// Builds a response carrying `status` and `{"error": err.to_string()}`.
///
/// No content-type header is set; clients key off the status code.
pub fn write_error<E>(status: StatusCode, err: &E) -> Response
where
    E: StdError + ?Sized,
{
    let envelope = ErrorEnvelope {
        error: err.to_string(),
    };
    let body = serde_json::to_vec(&envelope).unwrap_or_else(|encode_err| {
        tracing::warn!(error = %encode_err, "failed to encode error envelope");
        Vec::new()
    });
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    response
}

pub fn write_internal_error<E>(err: &E) -> Response
where
    E: StdError + ?Sized,
{
    write_error(StatusCode::INTERNAL_SERVER_ERROR, err)
}

/// Writes already-encoded JSON as a 200 response. The bytes are not checked.
pub fn write_json_data(data: impl Into<Bytes>) -> Response {
    let mut response = Response::new(Body::from(data.into()));
    *response.status_mut() = StatusCode::OK;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(CONTENT_TYPE_JSON),
    );
    response
}

/// Recovers the message from a `{"error": "..."}` body, if there is one.
///
/// Bodies are read as a flat string-to-string map, so any non-string value
/// (e.g. `{"error":"x","code":500}`) means "no error", as the peers expect.
pub fn extract_error(content: &[u8]) -> Option<Error> {
    if content.is_empty() {
        return None;
    }
    let mut fields: HashMap<String, String> = serde_json::from_slice(content).ok()?;
    let message = fields.remove("error")?;
    Some(Error::new(ErrorKind::Remote).with_message(message))
}
