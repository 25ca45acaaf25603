//! Client-side intake: validation, best-effort compression and revocable
//! preview handles for the original image.
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use snapcode_core::{ImageFile, MediaType, PreviewHandleId, ValidationError, MAX_UPLOAD_BYTES};
use snapcode_logging::{snap_debug, snap_warn};

use crate::imaging::downscale_to_jpeg;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntakeSettings {
    pub max_bytes: u64,
    /// Longest side after compression, in pixels.
    pub max_dimension: u32,
    pub jpeg_quality: u8,
}

impl Default for IntakeSettings {
    fn default() -> Self {
        Self {
            max_bytes: MAX_UPLOAD_BYTES,
            max_dimension: 1024,
            jpeg_quality: 85,
        }
    }
}

pub fn validate(file: &ImageFile, settings: &IntakeSettings) -> Result<MediaType, ValidationError> {
    file.validate(settings.max_bytes)
}

/// Downscales so the longer side fits `max_dimension` and re-encodes as JPEG.
///
/// Compression is an optional enhancement: any decode or encode failure
/// returns the original file unchanged.
pub fn compress(file: &ImageFile, settings: &IntakeSettings) -> ImageFile {
    match downscale_to_jpeg(
        &file.bytes,
        settings.max_dimension,
        settings.max_dimension,
        settings.jpeg_quality,
    ) {
        Ok(encoded) => {
            snap_debug!(
                "Compressed {} from {} to {} bytes ({}x{})",
                file.name,
                file.bytes.len(),
                encoded.bytes.len(),
                encoded.width,
                encoded.height
            );
            ImageFile::new(file.name.clone(), MediaType::Jpeg.mime(), encoded.bytes)
        }
        Err(err) => {
            snap_warn!("Compression of {} failed, sending original: {}", file.name, err);
            file.clone()
        }
    }
}

/// A full-quality view of an original image, kept alive until revoked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewImage {
    pub media_type: String,
    pub bytes: Arc<[u8]>,
}

impl PreviewImage {
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, BASE64.encode(&self.bytes))
    }
}

/// Registry of live preview handles.
#[derive(Debug, Default)]
pub struct PreviewHandles {
    next: AtomicU64,
    live: Mutex<HashMap<PreviewHandleId, PreviewImage>>,
}

impl PreviewHandles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&self, file: &ImageFile) -> PreviewHandleId {
        let handle = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        let image = PreviewImage {
            media_type: file.media_type.clone(),
            bytes: file.bytes.clone(),
        };
        self.lock().insert(handle, image);
        handle
    }

    pub fn get(&self, handle: PreviewHandleId) -> Option<PreviewImage> {
        self.lock().get(&handle).cloned()
    }

    /// Returns false if the handle was unknown or already revoked.
    pub fn revoke(&self, handle: PreviewHandleId) -> bool {
        self.lock().remove(&handle).is_some()
    }

    pub fn live_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<PreviewHandleId, PreviewImage>> {
        self.live.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
