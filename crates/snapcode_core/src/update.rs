use crate::{Effect, Msg, SessionError, SessionState, UploadSession};

/// Pure update function: applies a message to the session and returns any effects.
pub fn update(mut session: UploadSession, msg: Msg) -> (UploadSession, Vec<Effect>) {
    let effects = match msg {
        Msg::FileChosen(file) => {
            // The chooser is disabled while a conversion is outstanding.
            if session.state() == SessionState::Processing {
                return (session, Vec::new());
            }
            let mut effects = Vec::new();
            if let Some(handle) = session.select(file.clone()) {
                effects.push(Effect::RevokePreview { handle });
            }
            match file.validate(session.max_upload_bytes()) {
                Ok(_) => {
                    session.begin_compressing();
                    effects.push(Effect::CompressImage {
                        attempt: session.attempt(),
                        image: file,
                    });
                }
                Err(err) => session.reject(SessionError::from(err)),
            }
            effects
        }
        Msg::PreviewAllocated { attempt, handle } => {
            if session.is_current_selection(attempt) && session.preview_handle().is_none() {
                session.attach_preview(handle);
                Vec::new()
            } else {
                // The file was removed or replaced before the handle arrived.
                vec![Effect::RevokePreview { handle }]
            }
        }
        Msg::CompressionFinished { attempt, image } => {
            if session.is_current_selection(attempt)
                && session.state() == SessionState::Compressing
            {
                session.finish_compressing(image);
            }
            Vec::new()
        }
        Msg::GenerateClicked => match (session.state(), session.compressed().cloned()) {
            (SessionState::Ready, Some(image)) => {
                let attempt = session.begin_processing();
                vec![Effect::ConvertImage { attempt, image }]
            }
            _ => Vec::new(),
        },
        Msg::ConversionProgress { attempt, milestone } => {
            if session.is_current(attempt) && session.state() == SessionState::Processing {
                session.advance(milestone);
            }
            Vec::new()
        }
        Msg::ConversionFinished { attempt, result } => {
            if session.is_current(attempt) && session.state() == SessionState::Processing {
                match result {
                    Ok(artifact) => session.complete(artifact),
                    Err(error) => session.fail(error),
                }
            }
            Vec::new()
        }
        Msg::RemoveClicked => {
            if session.state() == SessionState::Idle {
                return (session, Vec::new());
            }
            let mut effects = Vec::new();
            if session.state() == SessionState::Processing {
                effects.push(Effect::CancelConversion {
                    attempt: session.attempt(),
                });
            }
            if let Some(handle) = session.clear() {
                effects.push(Effect::RevokePreview { handle });
            }
            effects
        }
        Msg::ErrorDismissed => match session.dismiss_error() {
            Some(handle) => vec![Effect::RevokePreview { handle }],
            None => Vec::new(),
        },
        Msg::NoOp => Vec::new(),
    };

    (session, effects)
}
