use crate::records::Role;
use anyhow::Result;
use tokio::sync::mpsc;

/// One speech-to-text fragment from the engine
///
/// Non-final fragments are hypotheses the engine may still revise; final
/// fragments will not change again.
#[derive(Debug, Clone)]
pub struct SpeechFragment {
    pub role: Role,
    pub text: String,
    pub is_final: bool,
}

/// The fixed event set a voice engine can emit
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// The call is live; audio is flowing
    CallStart,
    /// The call ended normally
    CallEnd,
    /// A speech-to-text fragment (interim or final)
    Transcript(SpeechFragment),
    /// Unrecoverable engine failure; the call is over
    Error(String),
}

/// Voice engine capability interface
///
/// The session controller depends only on this trait, never on a concrete
/// engine, so tests drive it with a scripted stub.
#[async_trait::async_trait]
pub trait VoiceEngine: Send + Sync {
    /// Request a connection and start the call
    ///
    /// Returns a channel receiver that will deliver engine events. Dropping
    /// the sender side without a CallEnd is treated as an engine failure.
    async fn start(&mut self) -> Result<mpsc::Receiver<EngineEvent>>;

    /// End the call (or abort a pending connection)
    async fn stop(&mut self) -> Result<()>;

    /// Mute or unmute the local microphone
    async fn set_muted(&mut self, muted: bool) -> Result<()>;

    /// Get engine name for logging
    fn name(&self) -> &str;
}
