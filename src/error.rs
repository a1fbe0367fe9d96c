//! Error taxonomy for catalog requests
//!
//! Every client call resolves to one of four failure kinds. Controllers store
//! the error in their state snapshot, so the type is cheap to clone and compare.

use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CatalogError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// Transport failure, timeout, 5xx or any other unexpected status
    #[error("network error: {message}")]
    Network {
        status: Option<u16>,
        message: String,
    },

    /// The catalog rejected the credential (401/403)
    #[error("authorization rejected by catalog (HTTP {status})")]
    Auth { status: u16 },

    /// Request was refused locally before reaching the network
    #[error("invalid request: {0}")]
    Validation(String),

    /// Body did not match the expected record shape
    #[error("malformed response from {endpoint}: {detail}")]
    MalformedResponse { endpoint: String, detail: String },
}

impl CatalogError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            status: None,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn malformed(endpoint: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::MalformedResponse {
            endpoint: endpoint.into(),
            detail: detail.into(),
        }
    }

    /// Classify a non-success HTTP status.
    ///
    /// 401 and 403 are always `Auth`; everything else is treated as a
    /// network-level failure carrying the status for diagnosis.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::Auth {
                status: status.as_u16(),
            },
            _ => {
                let excerpt: String = body.chars().take(200).collect();
                Self::Network {
                    status: Some(status.as_u16()),
                    message: if excerpt.is_empty() {
                        format!("unexpected status {}", status)
                    } else {
                        format!("unexpected status {}: {}", status, excerpt)
                    },
                }
            }
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }

    /// Short text suitable for an inline error message next to a retry action.
    pub fn user_message(&self) -> String {
        match self {
            Self::Auth { .. } => "Authentication expired. Please sign in again.".to_string(),
            Self::Validation(reason) => format!("Invalid request: {}", reason),
            Self::Network {
                status: Some(429), ..
            } => "Rate limited. Please wait a moment.".to_string(),
            Self::Network {
                status: Some(404), ..
            } => "The requested resource was not found.".to_string(),
            // Malformed bodies look like a network problem to the user; the
            // detail only goes to the log.
            Self::Network { .. } | Self::MalformedResponse { .. } => {
                "Could not reach the catalog. Try again.".to_string()
            }
        }
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            format!("request timed out: {}", err)
        } else if err.is_connect() {
            format!("connection failed: {}", err)
        } else {
            err.to_string()
        };
        Self::Network {
            status: err.status().map(|s| s.as_u16()),
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_and_forbidden_are_auth_errors() {
        for status in [StatusCode::UNAUTHORIZED, StatusCode::FORBIDDEN] {
            let err = CatalogError::from_status(status, "{\"error\":\"expired\"}");
            assert!(err.is_auth(), "{status} should classify as auth");
        }
    }

    #[test]
    fn server_errors_are_network_errors_with_status() {
        let err = CatalogError::from_status(StatusCode::SERVICE_UNAVAILABLE, "");
        assert_eq!(
            err,
            CatalogError::Network {
                status: Some(503),
                message: "unexpected status 503 Service Unavailable".to_string(),
            }
        );
    }

    #[test]
    fn long_bodies_are_truncated_in_messages() {
        let body = "x".repeat(1000);
        let CatalogError::Network { message, .. } =
            CatalogError::from_status(StatusCode::BAD_GATEWAY, &body)
        else {
            panic!("expected network error");
        };
        assert!(message.len() < 300);
    }

    #[test]
    fn malformed_responses_read_as_network_problems() {
        let err = CatalogError::malformed("/v1/me", "missing field `id`");
        assert_eq!(
            err.user_message(),
            CatalogError::network("reset").user_message()
        );
        assert!(err.to_string().contains("missing field `id`"));
    }

    #[test]
    fn rate_limit_has_its_own_message() {
        let err = CatalogError::from_status(StatusCode::TOO_MANY_REQUESTS, "");
        assert_eq!(err.user_message(), "Rate limited. Please wait a moment.");
    }
}
