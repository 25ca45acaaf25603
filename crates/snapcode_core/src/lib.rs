//! Snapcode core: pure upload-session state machine, shared validation and
//! preview-frame sizing. Nothing in this crate performs I/O.
mod artifact;
mod effect;
mod failure;
mod image;
mod msg;
mod preview;
mod state;
mod update;
mod validation;
mod view_model;

pub use artifact::{GeneratedArtifact, STYLE_NOTE};
pub use effect::Effect;
pub use failure::{FailureKind, SessionError};
pub use image::ImageFile;
pub use msg::Msg;
pub use preview::{PreviewFrame, PreviewSettings, PreviewState};
pub use state::{AttemptId, Milestone, PreviewHandleId, SessionState, UploadSession};
pub use update::update;
pub use validation::{validate_upload, MediaType, ValidationError, MAX_UPLOAD_BYTES};
pub use view_model::SessionViewModel;
