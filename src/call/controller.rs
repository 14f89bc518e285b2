use super::engine::{EngineEvent, SpeechFragment, VoiceEngine};
use super::export::{self, ExportLabels};
use crate::ids::ProvisionalIdSource;
use crate::records::Role;
use anyhow::{bail, Result};
use chrono::{DateTime, Local};
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Call lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    Idle,
    Connecting,
    Conversation,
    Ended,
}

/// One finalized utterance in the visible message log
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: Role,
    pub text: String,
}

/// Client-side call session state machine
///
/// Owns the in-memory, per-call message log; nothing here is persisted. The
/// authoritative transcript arrives at the server later via the webhook,
/// independent of this state.
///
/// The struct itself is synchronous; `drive` serializes engine events and
/// the duration tick through a single select loop, so no locking is needed.
pub struct CallSessionController {
    state: CallState,
    session_id: Option<String>,
    messages: Vec<ChatMessage>,
    speaking: Option<Role>,
    duration_secs: u64,
    started_at: Option<DateTime<Local>>,
    is_muted: bool,
    ids: ProvisionalIdSource,
    labels: ExportLabels,
}

impl CallSessionController {
    pub fn new(ids: ProvisionalIdSource, labels: ExportLabels) -> Self {
        Self {
            state: CallState::Idle,
            session_id: None,
            messages: Vec::new(),
            speaking: None,
            duration_secs: 0,
            started_at: None,
            is_muted: false,
            ids,
            labels,
        }
    }

    pub fn state(&self) -> CallState {
        self.state
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Role currently speaking, per the most recent interim fragment
    pub fn speaking(&self) -> Option<Role> {
        self.speaking
    }

    pub fn duration_secs(&self) -> u64 {
        self.duration_secs
    }

    pub fn is_muted(&self) -> bool {
        self.is_muted
    }

    /// Start a new call: generate a provisional identifier and move to
    /// `Connecting`. The identifier is local-only, used for display and
    /// export; the server allocates its own when the webhook arrives.
    pub fn begin_call(&mut self) -> Result<String> {
        if self.state != CallState::Idle {
            bail!("Cannot start a call from {:?}", self.state);
        }

        let session_id = self.ids.next()?;
        info!("Starting session {}", session_id);

        self.session_id = Some(session_id.clone());
        self.state = CallState::Connecting;
        Ok(session_id)
    }

    /// Apply one engine event
    pub fn handle_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::CallStart => {
                self.messages.clear();
                self.duration_secs = 0;
                self.speaking = None;
                self.started_at = Some(Local::now());
                self.state = CallState::Conversation;
            }
            EngineEvent::CallEnd => {
                self.speaking = None;
                self.state = CallState::Ended;
            }
            EngineEvent::Transcript(fragment) => self.merge_fragment(fragment),
            EngineEvent::Error(message) => {
                warn!("Engine error, discarding call state: {}", message);
                self.messages.clear();
                self.speaking = None;
                self.duration_secs = 0;
                self.state = CallState::Idle;
            }
        }
    }

    /// Merge one speech fragment into the log.
    ///
    /// Interim fragments only move the per-role speaking indicator; they are
    /// never appended and never overwrite anything. Final fragments append
    /// immutable entries in arrival order and clear the indicator. The
    /// exported transcript is exactly the final entries, in order, even when
    /// interim fragments for the same utterance arrived many times first.
    fn merge_fragment(&mut self, fragment: SpeechFragment) {
        if self.state != CallState::Conversation {
            debug!("Dropping transcript fragment outside conversation");
            return;
        }

        let text = fragment.text.trim();
        if text.is_empty() {
            return;
        }

        if !fragment.is_final {
            self.speaking = Some(fragment.role);
            return;
        }

        self.speaking = None;
        self.messages.push(ChatMessage {
            id: Uuid::new_v4(),
            role: fragment.role,
            text: text.to_string(),
        });
    }

    /// 1-second duration tick; counts only while the conversation is live
    pub fn tick(&mut self) {
        if self.state == CallState::Conversation {
            self.duration_secs += 1;
        }
    }

    /// Abort a pending connection: `Connecting` back to `Idle`, discarding
    /// in-progress state. An end request during connection establishment
    /// aborts rather than queueing until the call is live.
    pub fn abort(&mut self) {
        if self.state == CallState::Connecting {
            info!("Aborting connection for {:?}", self.session_id);
            self.messages.clear();
            self.speaking = None;
            self.duration_secs = 0;
            self.state = CallState::Idle;
        }
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.is_muted = muted;
    }

    /// Explicit reset back to `Idle`; the next `begin_call` draws a fresh
    /// provisional identifier
    pub fn new_session(&mut self) {
        self.state = CallState::Idle;
        self.session_id = None;
        self.messages.clear();
        self.speaking = None;
        self.duration_secs = 0;
        self.started_at = None;
    }

    /// Render the session for export
    pub fn export(&self) -> String {
        export::format_transcript(
            self.session_id.as_deref().unwrap_or(""),
            self.duration_secs,
            self.started_at,
            &self.messages,
            &self.labels,
        )
    }

    /// Suggested download file name for the export
    pub fn export_filename(&self) -> String {
        export::export_filename(self.session_id.as_deref().unwrap_or("session"))
    }
}

/// Run one call to completion: start the engine, then serialize engine
/// events and the 1-second tick through a single select loop.
///
/// Returns once the call reaches `Ended` (or `Idle` after an engine error).
/// If the engine fails to start, the controller is rolled back to `Idle`.
pub async fn drive<E: VoiceEngine + ?Sized>(
    controller: &mut CallSessionController,
    engine: &mut E,
) -> Result<()> {
    controller.begin_call()?;

    let mut events = match engine.start().await {
        Ok(rx) => rx,
        Err(e) => {
            warn!("Engine {} failed to start: {:#}", engine.name(), e);
            controller.abort();
            return Err(e);
        }
    };

    let mut tick = tokio::time::interval(Duration::from_secs(1));
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            maybe_event = events.recv() => {
                match maybe_event {
                    Some(event) => controller.handle_event(event),
                    // Sender dropped without a CallEnd: engine died
                    None => controller.handle_event(EngineEvent::Error(
                        "engine event stream closed".to_string(),
                    )),
                }
                if matches!(controller.state(), CallState::Ended | CallState::Idle) {
                    break;
                }
            }
            _ = tick.tick() => controller.tick(),
        }
    }

    Ok(())
}
