//! Realtime duplex voice sessions.
//!
//! Microphone audio is regrouped into fixed frames, encoded as base64 PCM16
//! and streamed to the gateway. Returned audio is scheduled back to back on
//! the playback clock, and transcript fragments are folded into turns.

mod chunker;
mod codec;
mod manager;
mod playback;
mod transcript;

pub use chunker::FrameChunker;
pub use codec::{decode_audio, decode_pcm16, encode_frame, encode_pcm16};
pub use manager::{RealtimeSessionManager, RealtimeStatus};
pub use playback::PlaybackScheduler;
pub use transcript::{TranscriptTurn, TurnAccumulator};
