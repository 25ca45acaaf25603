use crate::view_model::SessionViewModel;
use crate::{GeneratedArtifact, ImageFile, SessionError, MAX_UPLOAD_BYTES};

/// Identifies one attempt; engine messages tagged with an older attempt are stale.
pub type AttemptId = u64;
pub type PreviewHandleId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Selected,
    Compressing,
    Ready,
    Processing,
    Completed,
    Errored,
}

/// Coarse progress points of one conversion; the remote call is opaque so
/// there is no byte-level progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Milestone {
    RequestAssembled,
    RequestDispatched,
    ResponseReceived,
    ResultApplied,
}

impl Milestone {
    pub fn percent(self) -> u8 {
        match self {
            Milestone::RequestAssembled => 25,
            Milestone::RequestDispatched => 50,
            Milestone::ResponseReceived => 75,
            Milestone::ResultApplied => 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSession {
    state: SessionState,
    source: Option<ImageFile>,
    compressed: Option<ImageFile>,
    preview_handle: Option<PreviewHandleId>,
    progress: u8,
    error: Option<SessionError>,
    artifact: Option<GeneratedArtifact>,
    attempt: AttemptId,
    selection: AttemptId,
    max_upload_bytes: u64,
    dirty: bool,
}

impl Default for UploadSession {
    fn default() -> Self {
        Self::with_max_upload_bytes(MAX_UPLOAD_BYTES)
    }
}

impl UploadSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_upload_bytes(max_upload_bytes: u64) -> Self {
        Self {
            state: SessionState::Idle,
            source: None,
            compressed: None,
            preview_handle: None,
            progress: 0,
            error: None,
            artifact: None,
            attempt: 0,
            selection: 0,
            max_upload_bytes,
            dirty: false,
        }
    }

    pub fn view(&self) -> SessionViewModel {
        SessionViewModel {
            state: self.state,
            file_name: self.source.as_ref().map(|file| file.name.clone()),
            file_bytes: self.source.as_ref().map(ImageFile::byte_len),
            upload_bytes: self.compressed.as_ref().map(ImageFile::byte_len),
            progress: self.progress,
            error: self.error.as_ref().map(|err| err.message.clone()),
            markup: self.artifact.as_ref().map(|artifact| artifact.markup.clone()),
            preview_handle: self.preview_handle,
            can_generate: self.state == SessionState::Ready,
            can_remove: self.state != SessionState::Idle,
            is_processing: self.state == SessionState::Processing,
            dirty: self.dirty,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn source(&self) -> Option<&ImageFile> {
        self.source.as_ref()
    }

    pub fn compressed(&self) -> Option<&ImageFile> {
        self.compressed.as_ref()
    }

    pub fn preview_handle(&self) -> Option<PreviewHandleId> {
        self.preview_handle
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn error(&self) -> Option<&SessionError> {
        self.error.as_ref()
    }

    pub fn artifact(&self) -> Option<&GeneratedArtifact> {
        self.artifact.as_ref()
    }

    pub fn attempt(&self) -> AttemptId {
        self.attempt
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_bytes
    }

    /// Returns whether anything visible changed since the last call.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn is_current(&self, attempt: AttemptId) -> bool {
        self.attempt == attempt
    }

    /// Intake messages are tagged with the attempt that selected the file,
    /// which stays valid across later conversions of the same file.
    pub(crate) fn is_current_selection(&self, attempt: AttemptId) -> bool {
        self.source.is_some() && self.selection == attempt
    }

    /// Starts a new attempt for a freshly chosen file. Returns the handle of
    /// the previous file's preview, which the caller must revoke.
    pub(crate) fn select(&mut self, file: ImageFile) -> Option<PreviewHandleId> {
        let stale_handle = self.clear();
        self.selection = self.attempt;
        self.state = SessionState::Selected;
        self.source = Some(file);
        stale_handle
    }

    pub(crate) fn reject(&mut self, error: SessionError) {
        self.error = Some(error);
        self.dirty = true;
    }

    pub(crate) fn begin_compressing(&mut self) {
        self.state = SessionState::Compressing;
        self.dirty = true;
    }

    /// Falls back to the source when the compressed copy would exceed the
    /// ceiling; the source was validated against it.
    pub(crate) fn finish_compressing(&mut self, image: ImageFile) {
        let upload = if image.byte_len() > self.max_upload_bytes {
            self.source.clone().unwrap_or(image)
        } else {
            image
        };
        self.compressed = Some(upload);
        self.state = SessionState::Ready;
        self.dirty = true;
    }

    pub(crate) fn attach_preview(&mut self, handle: PreviewHandleId) {
        self.preview_handle = Some(handle);
        self.dirty = true;
    }

    pub(crate) fn begin_processing(&mut self) -> AttemptId {
        self.attempt += 1;
        self.state = SessionState::Processing;
        self.progress = 0;
        self.error = None;
        self.artifact = None;
        self.dirty = true;
        self.attempt
    }

    pub(crate) fn advance(&mut self, milestone: Milestone) {
        let percent = milestone.percent();
        if percent > self.progress {
            self.progress = percent;
            self.dirty = true;
        }
    }

    pub(crate) fn complete(&mut self, artifact: GeneratedArtifact) {
        self.advance(Milestone::ResultApplied);
        self.artifact = Some(artifact);
        self.error = None;
        self.state = SessionState::Completed;
        self.dirty = true;
    }

    pub(crate) fn fail(&mut self, error: SessionError) {
        self.error = Some(error);
        self.artifact = None;
        self.progress = 0;
        self.state = SessionState::Errored;
        self.dirty = true;
    }

    /// Clears the error. From `Errored` it returns to `Ready` with the
    /// compressed image kept; a file rejected at selection has nothing to
    /// retry, so the session goes back to `Idle` and the preview handle, if
    /// any, is returned for revocation.
    pub(crate) fn dismiss_error(&mut self) -> Option<PreviewHandleId> {
        if self.error.take().is_none() {
            return None;
        }
        if self.state == SessionState::Selected && self.compressed.is_none() {
            return self.clear();
        }
        if self.state == SessionState::Errored && self.compressed.is_some() {
            self.state = SessionState::Ready;
        }
        self.dirty = true;
        None
    }

    /// Back to `Idle`. Bumps the attempt so in-flight engine messages are
    /// dropped, and returns the preview handle to revoke.
    pub(crate) fn clear(&mut self) -> Option<PreviewHandleId> {
        let handle = self.preview_handle.take();
        self.state = SessionState::Idle;
        self.source = None;
        self.compressed = None;
        self.progress = 0;
        self.error = None;
        self.artifact = None;
        self.attempt += 1;
        self.dirty = true;
        handle
    }
}
