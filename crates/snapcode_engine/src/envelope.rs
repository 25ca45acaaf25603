use serde::{Deserialize, Serialize};
use snapcode_core::{FailureKind, GeneratedArtifact};

/// Name of the multipart field carrying the image.
pub const IMAGE_FIELD: &str = "image";

pub const TIMEOUT_MESSAGE: &str = "Request timeout. Please try again with a smaller image.";
pub const UNAVAILABLE_MESSAGE: &str = "Upstream service unavailable. Please try again later.";
pub const UPSTREAM_ERROR_PREFIX: &str = "Upstream service error: ";
pub const CANCELLED_MESSAGE: &str = "Request cancelled.";
pub const INTERNAL_MESSAGE: &str = "Internal server error. Please try again.";

/// Recovers the failure kind from an error envelope's status and message.
/// Every 4xx is invalid input; server errors are told apart by the fixed
/// messages the gateway sends.
pub fn classify_failure(status: u16, message: &str) -> FailureKind {
    if (400..500).contains(&status) {
        return FailureKind::InvalidInput;
    }
    match message {
        TIMEOUT_MESSAGE => FailureKind::Timeout,
        UNAVAILABLE_MESSAGE => FailureKind::UpstreamUnavailable,
        CANCELLED_MESSAGE => FailureKind::Cancelled,
        _ if message.starts_with(UPSTREAM_ERROR_PREFIX) => FailureKind::UpstreamError,
        _ => FailureKind::Internal,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactPayload {
    pub html: String,
    pub css: String,
}

/// JSON body of the process-image endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessImageResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ArtifactPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProcessImageResponse {
    pub fn ok(artifact: &GeneratedArtifact) -> Self {
        Self {
            success: true,
            data: Some(ArtifactPayload {
                html: artifact.markup.clone(),
                css: artifact.style_note.clone(),
            }),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }

    /// The artifact, if this is a successful response with data.
    pub fn into_artifact(self) -> Option<GeneratedArtifact> {
        match (self.success, self.data) {
            (true, Some(data)) => Some(GeneratedArtifact {
                markup: data.html,
                style_note: data.css,
            }),
            _ => None,
        }
    }
}
