use crate::{AttemptId, GeneratedArtifact, ImageFile, Milestone, PreviewHandleId, SessionError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User chose or dropped a file.
    FileChosen(ImageFile),
    /// Engine allocated a preview handle for the original image.
    PreviewAllocated {
        attempt: AttemptId,
        handle: PreviewHandleId,
    },
    /// Engine finished compressing (or fell back to the original).
    CompressionFinished { attempt: AttemptId, image: ImageFile },
    /// User asked to convert the ready image.
    GenerateClicked,
    /// Engine reached a coarse milestone of the conversion request.
    ConversionProgress {
        attempt: AttemptId,
        milestone: Milestone,
    },
    /// Engine completion for a conversion.
    ConversionFinished {
        attempt: AttemptId,
        result: Result<GeneratedArtifact, SessionError>,
    },
    /// User removed the selected file.
    RemoveClicked,
    /// User dismissed the inline error notice.
    ErrorDismissed,
    /// Fallback for placeholder wiring.
    NoOp,
}
