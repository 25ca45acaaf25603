use std::sync::Arc;

use crate::validation::{validate_upload, MediaType, ValidationError};

/// An owned image with its declared media type and display name.
///
/// Bytes are shared so that effects can carry the image without copying it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub name: String,
    pub media_type: String,
    pub bytes: Arc<[u8]>,
}

impl ImageFile {
    pub fn new(
        name: impl Into<String>,
        media_type: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn byte_len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn validate(&self, max_bytes: u64) -> Result<MediaType, ValidationError> {
        validate_upload(&self.media_type, self.byte_len(), max_bytes)
    }
}
