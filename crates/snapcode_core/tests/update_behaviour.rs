use std::sync::Once;

use pretty_assertions::assert_eq;
use snapcode_core::{
    update, Effect, FailureKind, GeneratedArtifact, ImageFile, Milestone, Msg, SessionError,
    SessionState, UploadSession, MAX_UPLOAD_BYTES,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(snapcode_logging::initialize_for_tests);
}

fn png(name: &str, len: usize) -> ImageFile {
    ImageFile::new(name, "image/png", vec![7u8; len])
}

fn compressed(name: &str) -> ImageFile {
    ImageFile::new(name, "image/jpeg", vec![1u8; 16])
}

/// Chooses a file and finishes compression; returns the selection attempt.
fn ready_session(file: ImageFile) -> (UploadSession, u64) {
    let (session, effects) = update(UploadSession::new(), Msg::FileChosen(file));
    let attempt = match effects.as_slice() {
        [Effect::CompressImage { attempt, .. }] => *attempt,
        other => panic!("unexpected effects {other:?}"),
    };
    let (session, _) = update(
        session,
        Msg::PreviewAllocated { attempt, handle: 11 },
    );
    let (session, _) = update(
        session,
        Msg::CompressionFinished {
            attempt,
            image: compressed("shot.png"),
        },
    );
    assert_eq!(session.state(), SessionState::Ready);
    (session, attempt)
}

fn processing_session() -> (UploadSession, u64) {
    let (session, _) = ready_session(png("shot.png", 64));
    let (session, effects) = update(session, Msg::GenerateClicked);
    let attempt = match effects.as_slice() {
        [Effect::ConvertImage { attempt, image }] => {
            assert_eq!(image, &compressed("shot.png"));
            *attempt
        }
        other => panic!("unexpected effects {other:?}"),
    };
    (session, attempt)
}

#[test]
fn valid_file_moves_to_compressing() {
    init_logging();
    let file = png("shot.png", 64);
    let (mut session, effects) = update(UploadSession::new(), Msg::FileChosen(file.clone()));

    assert_eq!(session.state(), SessionState::Compressing);
    assert_eq!(session.progress(), 0);
    assert!(session.error().is_none());
    assert!(session.consume_dirty());
    assert_eq!(
        effects,
        vec![Effect::CompressImage {
            attempt: session.attempt(),
            image: file,
        }]
    );
}

#[test]
fn unsupported_type_stays_selected_with_error() {
    init_logging();
    let file = ImageFile::new("anim.gif", "image/gif", vec![0u8; 8]);
    let (session, effects) = update(UploadSession::new(), Msg::FileChosen(file));

    assert_eq!(session.state(), SessionState::Selected);
    assert!(effects.is_empty());
    let error = session.error().unwrap();
    assert_eq!(error.kind, FailureKind::UnsupportedType);
    assert_eq!(error.message, "Please upload a PNG, JPG, or WebP image file.");

    // Progression is blocked.
    let (session, effects) = update(session, Msg::GenerateClicked);
    assert_eq!(session.state(), SessionState::Selected);
    assert!(effects.is_empty());
}

#[test]
fn oversized_file_is_rejected() {
    init_logging();
    let session = UploadSession::with_max_upload_bytes(32);
    let (session, effects) = update(session, Msg::FileChosen(png("big.png", 33)));

    assert_eq!(session.state(), SessionState::Selected);
    assert!(effects.is_empty());
    assert_eq!(session.error().unwrap().kind, FailureKind::TooLarge);
}

#[test]
fn dismissing_a_rejection_returns_to_idle() {
    init_logging();
    let file = ImageFile::new("anim.gif", "image/gif", vec![0u8; 8]);
    let (session, _) = update(UploadSession::new(), Msg::FileChosen(file));
    let rejected_attempt = session.attempt();

    let (session, effects) = update(session, Msg::ErrorDismissed);

    assert!(effects.is_empty());
    assert_eq!(session.state(), SessionState::Idle);
    assert!(session.error().is_none());
    assert!(session.view().file_name.is_none());
    assert!(session.attempt() > rejected_attempt);

    // A new file can be chosen straight away.
    let (session, effects) = update(session, Msg::FileChosen(png("next.png", 64)));
    assert_eq!(session.state(), SessionState::Compressing);
    assert_eq!(effects.len(), 1);
}

#[test]
fn default_ceiling_is_ten_mib() {
    assert_eq!(UploadSession::new().max_upload_bytes(), MAX_UPLOAD_BYTES);
}

#[test]
fn compression_makes_session_ready() {
    init_logging();
    let (session, _attempt) = ready_session(png("shot.png", 64));
    let view = session.view();

    assert!(view.can_generate);
    assert!(view.can_remove);
    assert_eq!(view.preview_handle, Some(11));
    assert_eq!(view.file_name.as_deref(), Some("shot.png"));
    assert_eq!(view.file_bytes, Some(64));
    assert_eq!(view.upload_bytes, Some(16));
}

#[test]
fn compressed_copy_over_ceiling_falls_back_to_source() {
    init_logging();
    let file = png("shot.png", 20);
    let session = UploadSession::with_max_upload_bytes(24);
    let (session, effects) = update(session, Msg::FileChosen(file.clone()));
    let attempt = match effects.as_slice() {
        [Effect::CompressImage { attempt, .. }] => *attempt,
        other => panic!("unexpected effects {other:?}"),
    };
    let bloated = ImageFile::new("shot.png", "image/jpeg", vec![0u8; 25]);
    let (session, _) = update(session, Msg::CompressionFinished { attempt, image: bloated });

    assert_eq!(session.compressed(), Some(&file));
}

#[test]
fn progress_is_monotonic_within_attempt() {
    init_logging();
    let (session, attempt) = processing_session();
    assert_eq!(session.state(), SessionState::Processing);
    assert!(session.view().is_processing);
    assert!(!session.view().can_generate);

    let (session, _) = update(
        session,
        Msg::ConversionProgress {
            attempt,
            milestone: Milestone::RequestDispatched,
        },
    );
    assert_eq!(session.progress(), 50);

    let (session, _) = update(
        session,
        Msg::ConversionProgress {
            attempt,
            milestone: Milestone::RequestAssembled,
        },
    );
    assert_eq!(session.progress(), 50);
}

#[test]
fn generate_is_ignored_while_processing() {
    init_logging();
    let (session, _attempt) = processing_session();
    let (session, effects) = update(session, Msg::GenerateClicked);
    assert_eq!(session.state(), SessionState::Processing);
    assert!(effects.is_empty());

    let (session, effects) = update(session, Msg::FileChosen(png("other.png", 8)));
    assert_eq!(session.state(), SessionState::Processing);
    assert!(effects.is_empty());
}

#[test]
fn success_completes_with_artifact_only() {
    init_logging();
    let (session, attempt) = processing_session();
    let artifact = GeneratedArtifact::new("<div>ok</div>");
    let (session, _) = update(
        session,
        Msg::ConversionFinished {
            attempt,
            result: Ok(artifact.clone()),
        },
    );

    assert_eq!(session.state(), SessionState::Completed);
    assert_eq!(session.artifact(), Some(&artifact));
    assert!(session.error().is_none());
    assert_eq!(session.progress(), 100);
    assert_eq!(session.view().markup.as_deref(), Some("<div>ok</div>"));
}

#[test]
fn failure_errors_with_error_only_and_clears_progress() {
    init_logging();
    let (session, attempt) = processing_session();
    let (session, _) = update(
        session,
        Msg::ConversionProgress {
            attempt,
            milestone: Milestone::ResponseReceived,
        },
    );
    let (session, _) = update(
        session,
        Msg::ConversionFinished {
            attempt,
            result: Err(SessionError::new(FailureKind::Timeout, "Request timeout")),
        },
    );

    assert_eq!(session.state(), SessionState::Errored);
    assert!(session.artifact().is_none());
    assert_eq!(session.error().unwrap().kind, FailureKind::Timeout);
    assert_eq!(session.progress(), 0);
    assert!(!session.view().is_processing);
}

#[test]
fn dismissing_error_keeps_file_for_retry() {
    init_logging();
    let (session, attempt) = processing_session();
    let (session, _) = update(
        session,
        Msg::ConversionFinished {
            attempt,
            result: Err(SessionError::new(FailureKind::UpstreamError, "boom")),
        },
    );
    let (session, effects) = update(session, Msg::ErrorDismissed);

    assert!(effects.is_empty());
    assert_eq!(session.state(), SessionState::Ready);
    assert!(session.error().is_none());
    assert_eq!(session.view().file_name.as_deref(), Some("shot.png"));

    // Retrying starts a new attempt.
    let (_session, effects) = update(session, Msg::GenerateClicked);
    match effects.as_slice() {
        [Effect::ConvertImage { attempt: retry, .. }] => assert_ne!(*retry, attempt),
        other => panic!("unexpected effects {other:?}"),
    }
}

#[test]
fn stale_completion_is_ignored() {
    init_logging();
    let (session, attempt) = processing_session();
    let (session, _) = update(
        session,
        Msg::ConversionFinished {
            attempt: attempt - 1,
            result: Ok(GeneratedArtifact::new("<p>stale</p>")),
        },
    );
    assert_eq!(session.state(), SessionState::Processing);
    assert!(session.artifact().is_none());
}

#[test]
fn remove_from_any_state_returns_to_idle() {
    init_logging();
    let (selected, _) = update(
        UploadSession::new(),
        Msg::FileChosen(ImageFile::new("x.bmp", "image/bmp", vec![1u8])),
    );
    let (compressing, _) = update(UploadSession::new(), Msg::FileChosen(png("a.png", 4)));
    let (ready, _) = ready_session(png("a.png", 4));
    let (processing, attempt) = processing_session();
    let (completed, _) = update(
        processing.clone(),
        Msg::ConversionFinished {
            attempt,
            result: Ok(GeneratedArtifact::new("<p/>")),
        },
    );
    let (errored, _) = update(
        processing.clone(),
        Msg::ConversionFinished {
            attempt,
            result: Err(SessionError::new(FailureKind::Internal, "x")),
        },
    );

    for session in [selected, compressing, ready, processing, completed, errored] {
        let (session, _effects) = update(session, Msg::RemoveClicked);
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.progress(), 0);
        assert!(session.error().is_none());
        assert!(session.artifact().is_none());
        assert!(session.source().is_none());
        assert!(!session.view().can_remove);
    }
}

#[test]
fn remove_while_processing_cancels_and_revokes() {
    init_logging();
    let (session, attempt) = processing_session();
    let (session, effects) = update(session, Msg::RemoveClicked);

    assert_eq!(
        effects,
        vec![
            Effect::CancelConversion { attempt },
            Effect::RevokePreview { handle: 11 },
        ]
    );

    // The cancelled request may still report back; it must not resurrect state.
    let (session, _) = update(
        session,
        Msg::ConversionFinished {
            attempt,
            result: Err(SessionError::new(FailureKind::Cancelled, "cancelled")),
        },
    );
    assert_eq!(session.state(), SessionState::Idle);
    assert!(session.error().is_none());
}

#[test]
fn choosing_new_file_revokes_previous_preview() {
    init_logging();
    let (session, _attempt) = ready_session(png("first.png", 4));
    let second = png("second.png", 4);
    let (session, effects) = update(session, Msg::FileChosen(second.clone()));

    assert_eq!(effects.len(), 2);
    assert_eq!(effects[0], Effect::RevokePreview { handle: 11 });
    assert!(matches!(&effects[1], Effect::CompressImage { image, .. } if image == &second));
    assert_eq!(session.progress(), 0);
    assert!(session.preview_handle().is_none());
}

#[test]
fn late_preview_handle_for_removed_file_is_revoked() {
    init_logging();
    let (session, effects) = update(UploadSession::new(), Msg::FileChosen(png("a.png", 4)));
    let attempt = match effects.as_slice() {
        [Effect::CompressImage { attempt, .. }] => *attempt,
        other => panic!("unexpected effects {other:?}"),
    };
    let (session, _) = update(session, Msg::RemoveClicked);
    let (session, effects) = update(session, Msg::PreviewAllocated { attempt, handle: 3 });

    assert_eq!(effects, vec![Effect::RevokePreview { handle: 3 }]);
    assert!(session.preview_handle().is_none());
}

#[test]
fn file_size_label_uses_megabytes() {
    let (session, _) = update(
        UploadSession::new(),
        Msg::FileChosen(png("a.png", 2 * 1024 * 1024 + 100 * 1024)),
    );
    assert_eq!(session.view().file_size_label().as_deref(), Some("2.1 MB"));
}
