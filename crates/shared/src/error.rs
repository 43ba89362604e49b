use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::protocol::ErrorPayload;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceErrorKind {
    NotFound,
    Validation,
    Server,
    Transport,
}

impl ServiceErrorKind {
    pub fn from_status(status: u16) -> Self {
        match status {
            404 => Self::NotFound,
            400 | 422 => Self::Validation,
            _ => Self::Server,
        }
    }
}

/// Normalized failure of any remote call. `message` is what the user sees.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ServiceError {
    pub kind: ServiceErrorKind,
    pub status: Option<u16>,
    pub message: String,
}

impl ServiceError {
    pub fn new(kind: ServiceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::Transport, message)
    }

    /// Builds the error for a response that arrived with a non-success status.
    ///
    /// A `detail` in the body wins; otherwise the message is synthesized from
    /// the status code and its canonical reason phrase.
    pub fn from_response(status: u16, reason: Option<&str>, body: &[u8]) -> Self {
        let detail = serde_json::from_slice::<ErrorPayload>(body)
            .ok()
            .and_then(|payload| payload.detail_message());
        let message = detail.unwrap_or_else(|| match reason {
            Some(reason) => format!("HTTP {status}: {reason}"),
            None => format!("HTTP {status}"),
        });

        Self {
            kind: ServiceErrorKind::from_status(status),
            status: Some(status),
            message,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ServiceErrorKind::NotFound
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_detail_is_surfaced_verbatim() {
        let err = ServiceError::from_response(
            400,
            Some("Bad Request"),
            br#"{"detail":"Invalid breed: Dragon"}"#,
        );
        assert_eq!(err.message, "Invalid breed: Dragon");
        assert_eq!(err.kind, ServiceErrorKind::Validation);
        assert_eq!(err.status, Some(400));
    }

    #[test]
    fn list_detail_joins_entry_messages() {
        let body = br#"{"detail":[{"loc":["body","salary"],"msg":"Input should be greater than 0","type":"greater_than"},{"loc":["body","name"],"msg":"Field required","type":"missing"}]}"#;
        let err = ServiceError::from_response(422, Some("Unprocessable Entity"), body);
        assert_eq!(
            err.message,
            "Input should be greater than 0; Field required"
        );
        assert_eq!(err.kind, ServiceErrorKind::Validation);
    }

    #[test]
    fn missing_detail_synthesizes_status_message() {
        let err = ServiceError::from_response(500, Some("Internal Server Error"), b"boom");
        assert_eq!(err.message, "HTTP 500: Internal Server Error");
        assert_eq!(err.kind, ServiceErrorKind::Server);

        let err = ServiceError::from_response(599, None, b"{}");
        assert_eq!(err.message, "HTTP 599");
    }

    #[test]
    fn not_found_status_is_distinct() {
        let err = ServiceError::from_response(404, Some("Not Found"), br#"{"detail":"Spy cat not found"}"#);
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Spy cat not found");
    }
}
