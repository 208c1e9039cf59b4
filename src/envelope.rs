//! The `{ "message": ..., "error": ... }` body every JSON endpoint speaks.

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::response::{internal_error, Response};
use crate::status::Status;

/// Response envelope. `message` carries the payload (or `null`); `error` is
/// empty unless something went wrong.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub message: Option<T>,
    pub error: String,
}

impl<T> Envelope<T> {
    pub fn message(message: T) -> Self {
        Self { message: Some(message), error: String::new() }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self { message: None, error: error.into() }
    }

    /// An envelope with neither payload nor error.
    pub fn empty() -> Self {
        Self { message: None, error: String::new() }
    }
}

impl<T: Serialize> Envelope<T> {
    /// Serializes the envelope as the body of a response with `status`.
    pub fn respond(&self, status: Status) -> Response {
        match serde_json::to_vec(self) {
            Ok(body) => Response::builder().status(status).json(body),
            Err(e) => {
                error!("envelope serialization failed: {e}");
                internal_error()
            }
        }
    }
}

/// Shorthand for an error envelope with no payload type.
pub fn error_response(status: Status, error: impl Into<String>) -> Response {
    Envelope::<()>::error(error).respond(status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_envelope_has_null_message_and_blank_error() {
        let res = Envelope::<()>::empty().respond(Status::NotFound);
        assert_eq!(res.status(), Status::NotFound);
        assert_eq!(res.body(), br#"{"message":null,"error":""}"#);
        assert_eq!(res.header("content-type"), Some("application/json"));
    }

    #[test]
    fn message_envelope_serializes_payload() {
        let res = Envelope::message("hi").respond(Status::Ok);
        assert_eq!(res.body(), br#"{"message":"hi","error":""}"#);
    }

    #[test]
    fn error_response_carries_text() {
        let res = error_response(Status::BadRequest, "nope");
        assert_eq!(res.body(), br#"{"message":null,"error":"nope"}"#);
    }
}
