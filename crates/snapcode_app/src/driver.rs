use std::time::Duration;

use snapcode_core::{
    update, FailureKind, GeneratedArtifact, ImageFile, Msg, SessionError, SessionState,
    SessionViewModel, UploadSession,
};
use snapcode_logging::{snap_debug, snap_info};

use crate::effects::EffectRunner;

/// Runs one upload session to completion without a UI: selects the file,
/// generates once it is ready, and feeds engine events back into `update`.
pub struct Driver {
    session: UploadSession,
    runner: EffectRunner,
    idle_timeout: Duration,
}

impl Driver {
    /// `idle_timeout` bounds the wait for any single engine event.
    pub fn new(runner: EffectRunner, idle_timeout: Duration) -> Self {
        Self {
            session: UploadSession::new(),
            runner,
            idle_timeout,
        }
    }

    pub fn session(&self) -> &UploadSession {
        &self.session
    }

    pub fn runner(&self) -> &EffectRunner {
        &self.runner
    }

    pub fn dispatch(&mut self, msg: Msg) {
        let session = std::mem::take(&mut self.session);
        let (mut session, effects) = update(session, msg);
        if session.consume_dirty() {
            report(&session.view());
        }
        self.session = session;
        self.runner.enqueue(effects);
    }

    pub fn convert(&mut self, file: ImageFile) -> Result<GeneratedArtifact, SessionError> {
        self.dispatch(Msg::FileChosen(file));
        let mut generate_sent = false;
        loop {
            match self.session.state() {
                SessionState::Completed => {
                    return self.session.artifact().cloned().ok_or_else(|| {
                        SessionError::new(FailureKind::Internal, "completed without a result")
                    });
                }
                // A rejected file stays selected with its error shown.
                SessionState::Selected if self.session.error().is_some() => {
                    return Err(self.session.error().cloned().unwrap_or_else(|| {
                        SessionError::new(FailureKind::Internal, "rejected without an error")
                    }));
                }
                SessionState::Errored => {
                    return Err(self.session.error().cloned().unwrap_or_else(|| {
                        SessionError::new(FailureKind::Internal, "failed without an error")
                    }));
                }
                SessionState::Ready if !generate_sent => {
                    generate_sent = true;
                    self.dispatch(Msg::GenerateClicked);
                    continue;
                }
                _ => {}
            }

            match self.runner.next_msg(self.idle_timeout) {
                Some(msg) => self.dispatch(msg),
                None => {
                    return Err(SessionError::new(
                        FailureKind::Timeout,
                        "No response from the conversion engine.",
                    ))
                }
            }
        }
    }

    /// Removes the selected file, cancelling any in-flight conversion.
    pub fn remove(&mut self) {
        self.dispatch(Msg::RemoveClicked);
    }
}

fn report(view: &SessionViewModel) {
    match view.state {
        SessionState::Processing => snap_info!("Generating... {}%", view.progress),
        SessionState::Ready => snap_info!(
            "Ready: {} ({}, {} to upload)",
            view.file_name.as_deref().unwrap_or("image"),
            view.file_size_label().unwrap_or_default(),
            view.upload_bytes.unwrap_or_default()
        ),
        SessionState::Errored => {
            snap_info!("Error: {}", view.error.as_deref().unwrap_or("unknown"))
        }
        state => snap_debug!("Session {:?} ({}%)", state, view.progress),
    }
}
