use std::time::Duration;

use futures_util::StreamExt;
use reqwest::multipart::{Form, Part};
use snapcode_core::{AttemptId, FailureKind, GeneratedArtifact, ImageFile, Milestone, SessionError};
use snapcode_logging::{snap_debug, snap_warn};

use crate::envelope::{classify_failure, ProcessImageResponse, IMAGE_FIELD};
use crate::EngineEvent;

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelProgressSink {
    tx: std::sync::mpsc::Sender<EngineEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: std::sync::mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Full URL of the process-image endpoint.
    pub endpoint: String,
    pub connect_timeout: Duration,
    /// Must outlast the server's own deadline so the server decides timeouts.
    pub request_timeout: Duration,
    pub max_response_bytes: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:3000/api/process-image".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(90),
            max_response_bytes: 10 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    #[error("could not reach the conversion server: {0}")]
    Unreachable(String),
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("the conversion server did not answer in time")]
    Timeout,
    #[error("conversion cancelled")]
    Cancelled,
    #[error("unexpected response from the conversion server: {0}")]
    Protocol(String),
}

impl ClientError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ClientError::Unreachable(_) => FailureKind::UpstreamUnavailable,
            ClientError::Rejected { status, message } => classify_failure(*status, message),
            ClientError::Timeout => FailureKind::Timeout,
            ClientError::Cancelled => FailureKind::Cancelled,
            ClientError::Protocol(_) => FailureKind::Internal,
        }
    }

    pub fn to_session_error(&self) -> SessionError {
        SessionError::new(self.kind(), self.to_string())
    }
}

/// Uploads a compressed image to the gateway endpoint.
#[derive(Debug, Clone)]
pub struct HttpArtifactClient {
    settings: ClientSettings,
    client: reqwest::Client,
}

impl HttpArtifactClient {
    pub fn new(settings: ClientSettings) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ClientError::Unreachable(err.to_string()))?;
        Ok(Self { settings, client })
    }

    pub async fn convert(
        &self,
        attempt: AttemptId,
        image: &ImageFile,
        sink: &dyn ProgressSink,
    ) -> Result<GeneratedArtifact, ClientError> {
        let part = Part::bytes(image.bytes.to_vec())
            .file_name(image.name.clone())
            .mime_str(&image.media_type)
            .map_err(|err| ClientError::Protocol(err.to_string()))?;
        let form = Form::new().part(IMAGE_FIELD, part);
        sink.emit(EngineEvent::Progress {
            attempt,
            milestone: Milestone::RequestAssembled,
        });

        let request = self.client.post(&self.settings.endpoint).multipart(form);
        sink.emit(EngineEvent::Progress {
            attempt,
            milestone: Milestone::RequestDispatched,
        });
        let response = request.send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            if (body.len() + chunk.len()) as u64 > self.settings.max_response_bytes {
                return Err(ClientError::Protocol("response too large".to_string()));
            }
            body.extend_from_slice(&chunk);
        }
        sink.emit(EngineEvent::Progress {
            attempt,
            milestone: Milestone::ResponseReceived,
        });
        snap_debug!("Attempt {} answered {} ({} bytes)", attempt, status, body.len());

        let envelope: ProcessImageResponse = serde_json::from_slice(&body).map_err(|err| {
            snap_warn!("Attempt {} returned non-envelope body: {}", attempt, err);
            ClientError::Protocol(err.to_string())
        })?;

        if !status.is_success() || !envelope.success {
            return Err(ClientError::Rejected {
                status: status.as_u16(),
                message: envelope
                    .error
                    .unwrap_or_else(|| format!("request failed with {status}")),
            });
        }

        envelope
            .into_artifact()
            .ok_or_else(|| ClientError::Protocol("success without data".to_string()))
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        return ClientError::Timeout;
    }
    ClientError::Unreachable(err.to_string())
}
