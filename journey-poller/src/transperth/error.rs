//! Transperth client error types.

use std::fmt;

use crate::domain::ValidationError;

/// Errors from the Transperth journey planner client.
#[derive(Debug, thiserror::Error)]
pub enum TransperthError {
    /// Route is missing required fields; nothing was sent
    #[error("invalid route: {0}")]
    Validation(#[from] ValidationError),

    /// HTTP request failed (connection, TLS, body read)
    #[error("HTTP error: {0}")]
    Http(#[source] reqwest::Error),

    /// HTTP request exceeded its deadline
    #[error("request timed out")]
    Timeout,

    /// Planner returned a non-success status code
    #[error("API error {status}: {body}")]
    Status { status: u16, body: String },

    /// Planner answered but reported a failure result
    #[error("planner rejected request: {result} (payload: {payload})")]
    Rejected { result: String, payload: String },

    /// Results page was an error page
    #[error("planner error page: {message}")]
    PageError { message: String },

    /// Response body was not valid JSON
    #[error("JSON parse error: {message}{}", body_suffix(.body))]
    Json {
        message: String,
        body: Option<String>,
    },

    /// Response was valid JSON but unusable as a journey list
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
}

fn body_suffix(body: &Option<String>) -> String {
    body.as_deref()
        .map(|b| format!(" (body: {b})"))
        .unwrap_or_default()
}

impl From<reqwest::Error> for TransperthError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransperthError::Timeout
        } else {
            TransperthError::Http(err)
        }
    }
}

/// Coarse classification of a [`TransperthError`], used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Transport,
    UpstreamRejected,
    Payload,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Transport => "transport",
            ErrorKind::UpstreamRejected => "upstream_rejected",
            ErrorKind::Payload => "payload",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TransperthError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TransperthError::Validation(_) => ErrorKind::Validation,
            TransperthError::Http(_) | TransperthError::Timeout | TransperthError::Status { .. } => {
                ErrorKind::Transport
            }
            TransperthError::Rejected { .. } | TransperthError::PageError { .. } => {
                ErrorKind::UpstreamRejected
            }
            TransperthError::Json { .. } | TransperthError::Normalize(_) => ErrorKind::Payload,
        }
    }
}

/// The top-level payload cannot be read as a list of journeys.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NormalizeError {
    #[error("journey payload is not a list (found {0})")]
    NotAList(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = TransperthError::Timeout;
        assert_eq!(err.to_string(), "request timed out");

        let err = TransperthError::Status {
            status: 500,
            body: "Internal Server Error".into(),
        };
        assert_eq!(err.to_string(), "API error 500: Internal Server Error");

        let err = TransperthError::Json {
            message: "expected value".into(),
            body: Some("<html>".into()),
        };
        assert!(err.to_string().contains("JSON parse error: expected value"));
        assert!(err.to_string().contains("(body: <html>)"));

        let err = TransperthError::Json {
            message: "EOF".into(),
            body: None,
        };
        assert_eq!(err.to_string(), "JSON parse error: EOF");

        let err = TransperthError::from(ValidationError::MissingField("to_position"));
        assert_eq!(err.to_string(), "invalid route: to_position is required");
    }

    #[test]
    fn kinds_separate_transport_from_rejection() {
        assert_eq!(TransperthError::Timeout.kind(), ErrorKind::Transport);
        assert_eq!(
            TransperthError::Status {
                status: 502,
                body: String::new()
            }
            .kind(),
            ErrorKind::Transport
        );
        assert_eq!(
            TransperthError::Rejected {
                result: "error".into(),
                payload: "{}".into()
            }
            .kind(),
            ErrorKind::UpstreamRejected
        );
        assert_eq!(
            TransperthError::PageError {
                message: "Missing parameter".into()
            }
            .kind(),
            ErrorKind::UpstreamRejected
        );
        assert_eq!(
            TransperthError::from(NormalizeError::NotAList("object")).kind(),
            ErrorKind::Payload
        );
        assert_eq!(
            TransperthError::from(ValidationError::EmptyRouteName).kind(),
            ErrorKind::Validation
        );
    }
}
