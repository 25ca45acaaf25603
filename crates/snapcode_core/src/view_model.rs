use crate::{PreviewHandleId, SessionState};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionViewModel {
    pub state: SessionState,
    pub file_name: Option<String>,
    pub file_bytes: Option<u64>,
    pub upload_bytes: Option<u64>,
    pub progress: u8,
    pub error: Option<String>,
    pub markup: Option<String>,
    pub preview_handle: Option<PreviewHandleId>,
    pub can_generate: bool,
    pub can_remove: bool,
    pub is_processing: bool,
    pub dirty: bool,
}

impl SessionViewModel {
    /// File size for display, e.g. `2.4 MB`.
    pub fn file_size_label(&self) -> Option<String> {
        self.file_bytes
            .map(|bytes| format!("{:.1} MB", bytes as f64 / 1024.0 / 1024.0))
    }
}
