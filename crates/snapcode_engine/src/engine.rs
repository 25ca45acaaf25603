use std::collections::HashMap;
use std::sync::{mpsc, Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use snapcode_core::{AttemptId, Effect, ImageFile, PreviewHandleId};
use snapcode_logging::{snap_debug, snap_info, snap_warn};
use tokio_util::sync::CancellationToken;

use crate::client::{ChannelProgressSink, ClientError, ClientSettings, HttpArtifactClient};
use crate::intake::{compress, IntakeSettings, PreviewHandles, PreviewImage};
use crate::EngineEvent;

#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub client: ClientSettings,
    pub intake: IntakeSettings,
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to start engine runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("failed to build http client: {0}")]
    Client(#[from] ClientError),
}

enum EngineCommand {
    Compress { attempt: AttemptId, image: ImageFile },
    Convert { attempt: AttemptId, image: ImageFile },
    Cancel { attempt: AttemptId },
    Revoke { handle: PreviewHandleId },
}

type InFlight = Arc<Mutex<HashMap<AttemptId, CancellationToken>>>;

/// Executes session effects on a background runtime and reports back
/// through [`EngineEvent`]s.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
    previews: Arc<PreviewHandles>,
}

struct Worker {
    client: Arc<HttpArtifactClient>,
    intake: IntakeSettings,
    previews: Arc<PreviewHandles>,
    in_flight: InFlight,
    event_tx: mpsc::Sender<EngineEvent>,
}

impl EngineHandle {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("snapcode-engine")
            .build()?;
        let previews = Arc::new(PreviewHandles::new());
        let worker = Worker {
            client: Arc::new(HttpArtifactClient::new(config.client)?),
            intake: config.intake,
            previews: previews.clone(),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            event_tx,
        };

        thread::spawn(move || {
            while let Ok(command) = cmd_rx.recv() {
                worker.dispatch(&runtime, command);
            }
            snap_debug!("Engine command channel closed");
        });

        Ok(Self {
            cmd_tx,
            event_rx,
            previews,
        })
    }

    /// Queues an effect for the worker. Returns `false` when the worker has
    /// exited and the effect was dropped.
    pub fn execute(&self, effect: Effect) -> bool {
        let command = match effect {
            Effect::CompressImage { attempt, image } => EngineCommand::Compress { attempt, image },
            Effect::ConvertImage { attempt, image } => EngineCommand::Convert { attempt, image },
            Effect::CancelConversion { attempt } => EngineCommand::Cancel { attempt },
            Effect::RevokePreview { handle } => EngineCommand::Revoke { handle },
        };
        match self.cmd_tx.send(command) {
            Ok(()) => true,
            Err(_) => {
                snap_warn!("Engine worker has exited; dropping effect");
                false
            }
        }
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    /// The original image behind a live preview handle.
    pub fn preview(&self, handle: PreviewHandleId) -> Option<PreviewImage> {
        self.previews.get(handle)
    }

    pub fn live_previews(&self) -> usize {
        self.previews.live_count()
    }
}

impl Worker {
    fn dispatch(&self, runtime: &tokio::runtime::Runtime, command: EngineCommand) {
        match command {
            EngineCommand::Compress { attempt, image } => {
                let handle = self.previews.allocate(&image);
                let _ = self
                    .event_tx
                    .send(EngineEvent::PreviewAllocated { attempt, handle });
                let settings = self.intake;
                let event_tx = self.event_tx.clone();
                runtime.spawn(async move {
                    let original = image.clone();
                    let image = tokio::task::spawn_blocking(move || compress(&image, &settings))
                        .await
                        .unwrap_or_else(|err| {
                            snap_warn!("Compression task failed: {}", err);
                            original
                        });
                    let _ = event_tx.send(EngineEvent::Compressed { attempt, image });
                });
            }
            EngineCommand::Convert { attempt, image } => {
                let token = CancellationToken::new();
                lock(&self.in_flight).insert(attempt, token.clone());
                let client = self.client.clone();
                let in_flight = self.in_flight.clone();
                let event_tx = self.event_tx.clone();
                runtime.spawn(async move {
                    let sink = ChannelProgressSink::new(event_tx.clone());
                    let result = tokio::select! {
                        _ = token.cancelled() => Err(ClientError::Cancelled),
                        result = client.convert(attempt, &image, &sink) => result,
                    };
                    lock(&in_flight).remove(&attempt);
                    match &result {
                        Ok(_) => snap_info!("Attempt {} converted", attempt),
                        Err(err) => snap_warn!("Attempt {} failed: {}", attempt, err),
                    }
                    let _ = event_tx.send(EngineEvent::ConversionCompleted { attempt, result });
                });
            }
            EngineCommand::Cancel { attempt } => {
                if let Some(token) = lock(&self.in_flight).remove(&attempt) {
                    snap_info!("Cancelling attempt {}", attempt);
                    token.cancel();
                }
            }
            EngineCommand::Revoke { handle } => {
                if !self.previews.revoke(handle) {
                    snap_debug!("Preview handle {} was already revoked", handle);
                }
            }
        }
    }
}

fn lock(in_flight: &InFlight) -> MutexGuard<'_, HashMap<AttemptId, CancellationToken>> {
    in_flight.lock().unwrap_or_else(PoisonError::into_inner)
}
