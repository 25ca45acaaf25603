//! Server-side conversion: re-validate, spool, optimize, call the
//! understanding service once under a deadline, clean the completion.
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use snapcode_core::{validate_upload, FailureKind, GeneratedArtifact, MediaType, ValidationError, MAX_UPLOAD_BYTES};
use snapcode_logging::{snap_debug, snap_error, snap_info, snap_warn};
use tempfile::NamedTempFile;
use tokio_util::sync::CancellationToken;

use crate::envelope::{CANCELLED_MESSAGE, INTERNAL_MESSAGE, TIMEOUT_MESSAGE, UNAVAILABLE_MESSAGE};
use crate::fence::{strip_code_fences, unwrap_document_shell};
use crate::optimize::{optimize_file, OptimizeSettings};
use crate::vision::{ServiceError, UnderstandingService, VisionRequest};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("{}", UNAVAILABLE_MESSAGE)]
    UpstreamUnavailable(String),
    #[error("Upstream service error: {0}")]
    UpstreamError(String),
    #[error("{}", TIMEOUT_MESSAGE)]
    Timeout,
    #[error("{}", CANCELLED_MESSAGE)]
    Cancelled,
    #[error("{}", INTERNAL_MESSAGE)]
    Internal(String),
}

impl GatewayError {
    pub fn from_validation(err: &ValidationError) -> Self {
        let message = match err {
            ValidationError::UnsupportedType { .. } => {
                "Invalid file type. Please upload PNG, JPG, or WebP files only.".to_string()
            }
            ValidationError::TooLarge { max_bytes, .. } => format!(
                "File too large. Maximum size is {}MB.",
                max_bytes / (1024 * 1024)
            ),
        };
        GatewayError::InvalidInput(message)
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            GatewayError::InvalidInput(_) => FailureKind::InvalidInput,
            GatewayError::UpstreamUnavailable(_) => FailureKind::UpstreamUnavailable,
            GatewayError::UpstreamError(_) => FailureKind::UpstreamError,
            GatewayError::Timeout => FailureKind::Timeout,
            GatewayError::Cancelled => FailureKind::Cancelled,
            GatewayError::Internal(_) => FailureKind::Internal,
        }
    }

    /// HTTP status for the response envelope.
    pub fn status_code(&self) -> u16 {
        if self.kind().is_client_error() {
            400
        } else {
            500
        }
    }
}

impl From<ServiceError> for GatewayError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unreachable(detail) => GatewayError::UpstreamUnavailable(detail),
            ServiceError::Status { message, .. } => GatewayError::UpstreamError(message),
            ServiceError::Malformed(detail) => GatewayError::UpstreamError(detail),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub max_upload_bytes: u64,
    /// Where uploads are spooled while a request is handled.
    pub upload_dir: PathBuf,
    pub optimize: OptimizeSettings,
    /// Single deadline for the understanding-service call.
    pub deadline: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: MAX_UPLOAD_BYTES,
            upload_dir: std::env::temp_dir(),
            optimize: OptimizeSettings::default(),
            deadline: Duration::from_secs(60),
        }
    }
}

/// Holds the uploaded bytes on disk for the duration of one request.
/// The file is removed when this value is dropped, on every exit path.
struct SpooledUpload {
    file: NamedTempFile,
}

impl SpooledUpload {
    fn create(dir: &Path, bytes: &[u8]) -> std::io::Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("snapcode-upload-")
            .tempfile_in(dir)?;
        file.write_all(bytes)?;
        file.flush()?;
        Ok(Self { file })
    }

    fn path(&self) -> &Path {
        self.file.path()
    }

    fn remove(self) {
        let path = self.file.path().to_path_buf();
        if let Err(err) = self.file.close() {
            snap_error!("Failed to remove spooled upload {:?}: {}", path, err);
        }
    }
}

pub struct ArtifactGateway {
    config: GatewayConfig,
    service: Arc<dyn UnderstandingService>,
}

impl ArtifactGateway {
    pub fn new(config: GatewayConfig, service: Arc<dyn UnderstandingService>) -> Self {
        Self { config, service }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub async fn process(
        &self,
        bytes: &[u8],
        media_type: &str,
    ) -> Result<GeneratedArtifact, GatewayError> {
        self.process_with_cancel(bytes, media_type, &CancellationToken::new())
            .await
    }

    /// Like [`ArtifactGateway::process`], but fails with `Cancelled` as soon
    /// as `cancel` fires, dropping the in-flight service call.
    pub async fn process_with_cancel(
        &self,
        bytes: &[u8],
        media_type: &str,
        cancel: &CancellationToken,
    ) -> Result<GeneratedArtifact, GatewayError> {
        let media = validate_upload(media_type, bytes.len() as u64, self.config.max_upload_bytes)
            .map_err(|err| {
                snap_info!("Rejected upload ({} bytes, {}): {}", bytes.len(), media_type, err);
                GatewayError::from_validation(&err)
            })?;

        let upload = SpooledUpload::create(&self.config.upload_dir, bytes).map_err(|err| {
            snap_error!("Failed to spool upload: {}", err);
            GatewayError::Internal(err.to_string())
        })?;

        let result = self.convert_spooled(&upload, media, cancel).await;
        upload.remove();
        result
    }

    async fn convert_spooled(
        &self,
        upload: &SpooledUpload,
        media: MediaType,
        cancel: &CancellationToken,
    ) -> Result<GeneratedArtifact, GatewayError> {
        let path = upload.path().to_path_buf();
        let settings = self.config.optimize;
        let optimized = tokio::task::spawn_blocking(move || optimize_file(&path, media, &settings))
            .await
            .map_err(|err| GatewayError::Internal(err.to_string()))?
            .map_err(|err| GatewayError::Internal(err.to_string()))?;

        let request = VisionRequest {
            bytes: optimized.bytes,
            media_type: optimized.media_type,
        };
        snap_debug!(
            "Calling understanding service with {} bytes (optimized: {})",
            request.bytes.len(),
            optimized.optimized
        );

        let completion = tokio::select! {
            _ = cancel.cancelled() => {
                snap_info!("Conversion cancelled by caller");
                return Err(GatewayError::Cancelled);
            }
            outcome = tokio::time::timeout(self.config.deadline, self.service.describe(&request)) => {
                match outcome {
                    Ok(Ok(text)) => text,
                    Ok(Err(err)) => {
                        snap_warn!("Understanding service failed: {}", err);
                        return Err(err.into());
                    }
                    Err(_) => {
                        snap_warn!("Understanding service exceeded {:?}", self.config.deadline);
                        return Err(GatewayError::Timeout);
                    }
                }
            }
        };

        let markup = unwrap_document_shell(&strip_code_fences(&completion));
        if markup.trim().is_empty() {
            return Err(GatewayError::UpstreamError(
                "The service returned no markup".to_string(),
            ));
        }
        Ok(GeneratedArtifact::new(markup))
    }
}
