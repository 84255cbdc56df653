//! Error types for the todo API client and the sync coordinator.
//!
//! # Design
//! `ApiError` mirrors the small failure taxonomy the UI cares about:
//! bad-request, unauthorized, forbidden, not-found, server-error,
//! network-error and unknown. Payload (de)serialization failures get their own
//! variants since they are bugs or schema drift rather than transport trouble.

use thiserror::Error;

use crate::validate::ValidationErrors;

/// Errors produced while talking to the remote posts resource.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// 400.
    #[error("bad request: invalid data provided")]
    BadRequest { body: String },

    /// 401.
    #[error("unauthorized: please login again")]
    Unauthorized,

    /// 403.
    #[error("forbidden: access denied")]
    Forbidden,

    /// 404, the requested todo does not exist.
    #[error("not found: resource not found")]
    NotFound,

    /// Any 5xx.
    #[error("server error (HTTP {status}): please try again later")]
    ServerError { status: u16, body: String },

    /// Timeout, refused connection, DNS failure and friends.
    #[error("network error: {0}")]
    Network(String),

    /// A non-2xx status outside the known taxonomy.
    #[error("HTTP {status}: {body}")]
    Unknown { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl ApiError {
    /// Classify a non-2xx response.
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            400 => ApiError::BadRequest { body: body.to_string() },
            401 => ApiError::Unauthorized,
            403 => ApiError::Forbidden,
            404 => ApiError::NotFound,
            500..=599 => ApiError::ServerError { status, body: body.to_string() },
            _ => ApiError::Unknown { status, body: body.to_string() },
        }
    }

    /// HTTP status associated with the error, if there was a response at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::BadRequest { .. } => Some(400),
            ApiError::Unauthorized => Some(401),
            ApiError::Forbidden => Some(403),
            ApiError::NotFound => Some(404),
            ApiError::ServerError { status, .. } | ApiError::Unknown { status, .. } => Some(*status),
            ApiError::Network(_) | ApiError::Deserialization(_) | ApiError::Serialization(_) => None,
        }
    }
}

/// Umbrella error for store-plus-remote operations.
#[derive(Debug, Error)]
pub enum TodoError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Api(#[from] ApiError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_to_taxonomy() {
        assert!(matches!(ApiError::from_status(400, "x"), ApiError::BadRequest { .. }));
        assert_eq!(ApiError::from_status(401, ""), ApiError::Unauthorized);
        assert_eq!(ApiError::from_status(403, ""), ApiError::Forbidden);
        assert_eq!(ApiError::from_status(404, ""), ApiError::NotFound);
        assert!(matches!(ApiError::from_status(500, ""), ApiError::ServerError { status: 500, .. }));
        assert!(matches!(ApiError::from_status(503, ""), ApiError::ServerError { status: 503, .. }));
        assert!(matches!(ApiError::from_status(418, ""), ApiError::Unknown { status: 418, .. }));
    }

    #[test]
    fn status_round_trips_for_response_errors() {
        assert_eq!(ApiError::from_status(502, "").status(), Some(502));
        assert_eq!(ApiError::Network("timeout".into()).status(), None);
    }

    #[test]
    fn messages_are_user_facing() {
        assert_eq!(ApiError::NotFound.to_string(), "not found: resource not found");
        assert_eq!(
            ApiError::Network("connection refused".into()).to_string(),
            "network error: connection refused"
        );
    }
}
