use std::fmt;

use crate::validation::ValidationError;

/// Failure taxonomy shared by the intake, the gateway and the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    UnsupportedType,
    TooLarge,
    InvalidInput,
    UpstreamUnavailable,
    UpstreamError,
    Timeout,
    Cancelled,
    Internal,
}

impl FailureKind {
    /// True for failures caused by the caller's input rather than by the
    /// server or its collaborators.
    pub fn is_client_error(self) -> bool {
        matches!(
            self,
            FailureKind::UnsupportedType | FailureKind::TooLarge | FailureKind::InvalidInput
        )
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::UnsupportedType => write!(f, "unsupported type"),
            FailureKind::TooLarge => write!(f, "too large"),
            FailureKind::InvalidInput => write!(f, "invalid input"),
            FailureKind::UpstreamUnavailable => write!(f, "upstream unavailable"),
            FailureKind::UpstreamError => write!(f, "upstream error"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Cancelled => write!(f, "cancelled"),
            FailureKind::Internal => write!(f, "internal error"),
        }
    }
}

/// A typed, human-readable error held by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionError {
    pub kind: FailureKind,
    pub message: String,
}

impl SessionError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<ValidationError> for SessionError {
    fn from(err: ValidationError) -> Self {
        let kind = match err {
            ValidationError::UnsupportedType { .. } => FailureKind::UnsupportedType,
            ValidationError::TooLarge { .. } => FailureKind::TooLarge,
        };
        SessionError::new(kind, err.to_string())
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.kind)
    }
}
