//! Snapcode engine: image intake, the conversion gateway and its HTTP
//! client, preview isolation, export, and effect execution.
mod client;
mod engine;
mod envelope;
mod export;
mod fence;
mod gateway;
mod imaging;
mod intake;
mod optimize;
mod preview;
mod types;
mod vision;

pub use client::{ChannelProgressSink, ClientError, ClientSettings, HttpArtifactClient, ProgressSink};
pub use engine::{EngineConfig, EngineError, EngineHandle};
pub use envelope::{
    classify_failure, ArtifactPayload, ProcessImageResponse, CANCELLED_MESSAGE, IMAGE_FIELD,
    INTERNAL_MESSAGE, TIMEOUT_MESSAGE, UNAVAILABLE_MESSAGE, UPSTREAM_ERROR_PREFIX,
};
pub use export::{
    build_standalone_document, ensure_output_dir, export_standalone, write_atomically,
    write_standalone_document, ExportError, EXPORT_FILE_NAME,
};
pub use fence::{strip_code_fences, unwrap_document_shell};
pub use gateway::{ArtifactGateway, GatewayConfig, GatewayError};
pub use imaging::{fit_within, EncodedImage};
pub use intake::{compress, validate, IntakeSettings, PreviewHandles, PreviewImage};
pub use optimize::{optimize_file, optimize_image, OptimizeSettings, OptimizedImage};
pub use preview::{
    build_isolated_document, escape_attribute, parse_preview_message, render_host_page,
    PreviewMessage, PreviewRenderer, PREVIEW_FRAME_ID, SANDBOX_POLICY, UTILITY_STYLESHEET_URL,
};
pub use types::EngineEvent;
pub use vision::{
    ApiKey, OpenAiVisionClient, ServiceError, UnderstandingService, VisionRequest, VisionSettings,
    SYSTEM_PROMPT, USER_PROMPT,
};
