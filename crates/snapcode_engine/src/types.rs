use snapcode_core::{AttemptId, GeneratedArtifact, ImageFile, Milestone, PreviewHandleId};

use crate::client::ClientError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    PreviewAllocated {
        attempt: AttemptId,
        handle: PreviewHandleId,
    },
    Compressed {
        attempt: AttemptId,
        image: ImageFile,
    },
    Progress {
        attempt: AttemptId,
        milestone: Milestone,
    },
    ConversionCompleted {
        attempt: AttemptId,
        result: Result<GeneratedArtifact, ClientError>,
    },
}
