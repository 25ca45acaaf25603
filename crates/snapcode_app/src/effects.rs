use std::time::Duration;

use snapcode_core::{Effect, Msg, PreviewHandleId};
use snapcode_engine::{EngineConfig, EngineError, EngineEvent, EngineHandle, PreviewImage};
use snapcode_logging::{snap_debug, snap_info};

/// Bridges session effects to the engine and engine events back to messages.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        Ok(Self {
            engine: EngineHandle::new(config)?,
        })
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match &effect {
                Effect::CompressImage { attempt, image } => snap_info!(
                    "CompressImage attempt={} name={} bytes={}",
                    attempt,
                    image.name,
                    image.byte_len()
                ),
                Effect::ConvertImage { attempt, image } => snap_info!(
                    "ConvertImage attempt={} bytes={}",
                    attempt,
                    image.byte_len()
                ),
                Effect::CancelConversion { attempt } => {
                    snap_info!("CancelConversion attempt={}", attempt)
                }
                Effect::RevokePreview { handle } => snap_debug!("RevokePreview handle={}", handle),
            }
            self.engine.execute(effect);
        }
    }

    /// Waits up to `timeout` for the next engine event.
    pub fn next_msg(&self, timeout: Duration) -> Option<Msg> {
        self.engine.recv_timeout(timeout).map(map_event)
    }

    pub fn preview(&self, handle: PreviewHandleId) -> Option<PreviewImage> {
        self.engine.preview(handle)
    }

    pub fn live_previews(&self) -> usize {
        self.engine.live_previews()
    }
}

pub fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::PreviewAllocated { attempt, handle } => Msg::PreviewAllocated { attempt, handle },
        EngineEvent::Compressed { attempt, image } => Msg::CompressionFinished { attempt, image },
        EngineEvent::Progress { attempt, milestone } => Msg::ConversionProgress { attempt, milestone },
        EngineEvent::ConversionCompleted { attempt, result } => Msg::ConversionFinished {
            attempt,
            result: result.map_err(|err| err.to_session_error()),
        },
    }
}
