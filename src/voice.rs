//! Voice modality arbitration.
//!
//! The assistant pipeline and the realtime session both need the microphone
//! and speakers. At most one of them may run; a second request is refused,
//! never queued.

use crate::error::{DesktopError, Result};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info};

/// Which voice feature currently owns audio I/O.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VoiceModality {
    #[default]
    Idle,
    /// Assistant is capturing, thinking or speaking (wake listening does not count).
    Assistant,
    /// A realtime duplex session is open or opening.
    Realtime,
}

impl VoiceModality {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Assistant => "assistant",
            Self::Realtime => "realtime",
        }
    }
}

/// Shared arbiter. Clones observe and mutate the same value.
#[derive(Clone)]
pub struct VoiceArbiter {
    tx: watch::Sender<VoiceModality>,
}

impl Default for VoiceArbiter {
    fn default() -> Self {
        Self::new()
    }
}

impl VoiceArbiter {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(VoiceModality::Idle);
        Self { tx }
    }

    pub fn current(&self) -> VoiceModality {
        *self.tx.borrow()
    }

    /// Receiver that wakes on every ownership change.
    pub fn subscribe(&self) -> watch::Receiver<VoiceModality> {
        self.tx.subscribe()
    }

    /// Take ownership for `modality` if nobody holds it.
    ///
    /// The check and the write happen atomically. The returned lease releases
    /// ownership when dropped.
    pub fn try_acquire(&self, modality: VoiceModality) -> Result<VoiceLease> {
        if modality == VoiceModality::Idle {
            return Err(DesktopError::InvalidInput(
                "cannot acquire the idle modality".to_owned(),
            ));
        }
        let mut holder = VoiceModality::Idle;
        let acquired = self.tx.send_if_modified(|current| {
            if *current == VoiceModality::Idle {
                *current = modality;
                true
            } else {
                holder = *current;
                false
            }
        });
        if acquired {
            info!(modality = modality.as_str(), "voice modality acquired");
            Ok(VoiceLease {
                arbiter: self.clone(),
                modality,
            })
        } else {
            debug!(
                requested = modality.as_str(),
                holder = holder.as_str(),
                "voice modality busy"
            );
            Err(DesktopError::VoiceBusy(format!(
                "{} is active",
                holder.as_str()
            )))
        }
    }

    fn release(&self, modality: VoiceModality) {
        let released = self.tx.send_if_modified(|current| {
            if *current == modality {
                *current = VoiceModality::Idle;
                true
            } else {
                false
            }
        });
        if released {
            info!(modality = modality.as_str(), "voice modality released");
        }
    }
}

/// Proof of ownership. Dropping it hands audio I/O back.
pub struct VoiceLease {
    arbiter: VoiceArbiter,
    modality: VoiceModality,
}

impl VoiceLease {
    pub fn modality(&self) -> VoiceModality {
        self.modality
    }
}

impl std::fmt::Debug for VoiceLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceLease")
            .field("modality", &self.modality)
            .finish()
    }
}

impl Drop for VoiceLease {
    fn drop(&mut self) {
        self.arbiter.release(self.modality);
    }
}
