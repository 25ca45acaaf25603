use crate::{AttemptId, ImageFile, PreviewHandleId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Allocate a preview handle for `image` and compress it for upload.
    CompressImage { attempt: AttemptId, image: ImageFile },
    /// Upload `image` to the gateway.
    ConvertImage { attempt: AttemptId, image: ImageFile },
    /// Abort the in-flight upload of `attempt`.
    CancelConversion { attempt: AttemptId },
    RevokePreview { handle: PreviewHandleId },
}
