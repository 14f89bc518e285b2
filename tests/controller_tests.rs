// Integration tests for the client call session controller
//
// The load-bearing invariant: interim fragments are ephemeral UI hints,
// final fragments are durable log entries. The exported transcript contains
// exactly the final entries, in arrival order, no duplication, no loss.

use anyhow::Result;
use callscribe::call::{
    drive, CallSessionController, CallState, EngineEvent, ExportLabels, SpeechFragment,
    VoiceEngine,
};
use callscribe::ids::{DatePrefix, ProvisionalIdSource};
use callscribe::records::Role;
use chrono::NaiveDate;
use tokio::sync::mpsc;

fn controller() -> CallSessionController {
    CallSessionController::new(ProvisionalIdSource::in_memory(), ExportLabels::default())
}

fn interim(text: &str, role: Role) -> EngineEvent {
    EngineEvent::Transcript(SpeechFragment {
        role,
        text: text.to_string(),
        is_final: false,
    })
}

fn final_frag(text: &str, role: Role) -> EngineEvent {
    EngineEvent::Transcript(SpeechFragment {
        role,
        text: text.to_string(),
        is_final: true,
    })
}

fn start_conversation(ctl: &mut CallSessionController) {
    ctl.begin_call().expect("begin from idle");
    ctl.handle_event(EngineEvent::CallStart);
    assert_eq!(ctl.state(), CallState::Conversation);
}

#[test]
fn interim_fragments_never_reach_the_log() {
    let mut ctl = controller();
    start_conversation(&mut ctl);

    ctl.handle_event(interim("hel", Role::User));
    ctl.handle_event(interim("hello", Role::User));
    ctl.handle_event(final_frag("hello", Role::User));
    ctl.handle_event(interim("hi", Role::Assistant));
    ctl.handle_event(final_frag("hi there", Role::Assistant));

    let log: Vec<(Role, &str)> = ctl
        .messages()
        .iter()
        .map(|m| (m.role, m.text.as_str()))
        .collect();
    assert_eq!(
        log,
        vec![(Role::User, "hello"), (Role::Assistant, "hi there")]
    );

    // No interim text ever appears in the log or the export
    let export = ctl.export();
    assert!(!export.contains("hel\n"));
    assert!(!export.contains("** hi\n"));
}

#[test]
fn interim_fragments_move_the_speaking_indicator() {
    let mut ctl = controller();
    start_conversation(&mut ctl);

    assert_eq!(ctl.speaking(), None);

    ctl.handle_event(interim("hel", Role::User));
    assert_eq!(ctl.speaking(), Some(Role::User));

    // A newer interim from the other side takes over; nothing is destroyed
    ctl.handle_event(interim("mm", Role::Assistant));
    assert_eq!(ctl.speaking(), Some(Role::Assistant));
    assert!(ctl.messages().is_empty());

    // Finalization clears the indicator
    ctl.handle_event(final_frag("mmhm", Role::Assistant));
    assert_eq!(ctl.speaking(), None);
    assert_eq!(ctl.messages().len(), 1);
}

#[test]
fn whitespace_only_fragments_are_dropped() {
    let mut ctl = controller();
    start_conversation(&mut ctl);

    ctl.handle_event(final_frag("   ", Role::User));
    ctl.handle_event(interim("\t\n", Role::User));

    assert!(ctl.messages().is_empty());
    assert_eq!(ctl.speaking(), None);

    // Surrounding whitespace is trimmed off retained text
    ctl.handle_event(final_frag("  kept  ", Role::User));
    assert_eq!(ctl.messages()[0].text, "kept");
}

#[test]
fn export_of_an_empty_session_is_well_formed() {
    let mut ctl = controller();
    start_conversation(&mut ctl);
    ctl.handle_event(EngineEvent::CallEnd);

    let export = ctl.export();
    assert!(export.starts_with("---\n"));
    assert!(export.contains("session_id: cS_"));
    assert!(export.contains("duration: 0m 0s"));
    assert!(export.contains("start_time: T-"));
    assert!(export.contains("summary: [TO BE FILLED]"));
    // Header block closes and the body is empty
    assert!(export.trim_end().ends_with("---"));
}

#[test]
fn export_labels_messages_per_role() {
    let mut ctl = CallSessionController::new(
        ProvisionalIdSource::in_memory(),
        ExportLabels {
            user: "Jordan".to_string(),
            assistant: "eA".to_string(),
        },
    );
    start_conversation(&mut ctl);

    ctl.handle_event(final_frag("hello", Role::User));
    ctl.handle_event(final_frag("hi there", Role::Assistant));
    ctl.handle_event(EngineEvent::CallEnd);

    let export = ctl.export();
    let body: Vec<&str> = export.lines().filter(|l| l.starts_with("**")).collect();
    assert_eq!(body, vec!["**Jordan:** hello", "**eA:** hi there"]);

    assert!(ctl.export_filename().ends_with("_raw.md"));
}

#[test]
fn engine_error_returns_to_idle_and_discards_state() {
    let mut ctl = controller();
    start_conversation(&mut ctl);

    ctl.handle_event(final_frag("stale", Role::User));
    ctl.handle_event(interim("more", Role::User));
    ctl.tick();
    ctl.handle_event(EngineEvent::Error("connection lost".to_string()));

    assert_eq!(ctl.state(), CallState::Idle);
    assert_eq!(ctl.speaking(), None);
    assert!(ctl.messages().is_empty());
    assert_eq!(ctl.duration_secs(), 0);

    // The next session must not see anything from the aborted call
    ctl.new_session();
    ctl.begin_call().expect("restart after error");
    ctl.handle_event(EngineEvent::CallStart);
    assert!(ctl.messages().is_empty());
}

#[test]
fn ending_while_connecting_aborts_to_idle() {
    let mut ctl = controller();
    ctl.begin_call().expect("begin from idle");
    assert_eq!(ctl.state(), CallState::Connecting);

    ctl.abort();
    assert_eq!(ctl.state(), CallState::Idle);

    // A fresh start works afterwards
    ctl.begin_call().expect("restart after abort");
    assert_eq!(ctl.state(), CallState::Connecting);
}

#[test]
fn duration_ticks_only_during_conversation() {
    let mut ctl = controller();
    ctl.begin_call().expect("begin");
    ctl.tick();
    assert_eq!(ctl.duration_secs(), 0);

    ctl.handle_event(EngineEvent::CallStart);
    ctl.tick();
    ctl.tick();
    assert_eq!(ctl.duration_secs(), 2);

    ctl.handle_event(EngineEvent::CallEnd);
    ctl.tick();
    assert_eq!(ctl.duration_secs(), 2);
}

#[tokio::test]
async fn mute_state_follows_the_toggle() -> Result<()> {
    let mut ctl = controller();
    let mut engine = ScriptedEngine {
        events: Vec::new(),
        fail_start: false,
    };
    assert!(!ctl.is_muted());

    engine.set_muted(true).await?;
    ctl.set_muted(true);
    assert!(ctl.is_muted());

    engine.set_muted(false).await?;
    ctl.set_muted(false);
    assert!(!ctl.is_muted());

    Ok(())
}

#[test]
fn begin_call_is_rejected_outside_idle() {
    let mut ctl = controller();
    ctl.begin_call().expect("begin from idle");
    assert!(ctl.begin_call().is_err());
}

#[test]
fn new_session_draws_a_fresh_provisional_identifier() {
    let mut ctl = controller();
    let first = ctl.begin_call().expect("first session");
    ctl.handle_event(EngineEvent::CallStart);
    ctl.handle_event(EngineEvent::CallEnd);

    ctl.new_session();
    assert_eq!(ctl.state(), CallState::Idle);
    assert_eq!(ctl.session_id(), None);

    let second = ctl.begin_call().expect("second session");
    assert_ne!(first, second);
}

// ============================================================================
// Provisional identifier source
// ============================================================================

#[test]
fn provisional_counter_continues_within_a_day_and_resets_across_days() -> Result<()> {
    let mut ids = ProvisionalIdSource::in_memory();
    let day_one = DatePrefix::for_date(NaiveDate::from_ymd_opt(2026, 8, 6).unwrap());
    let day_two = DatePrefix::for_date(NaiveDate::from_ymd_opt(2026, 8, 7).unwrap());

    assert_eq!(ids.next_for(&day_one)?, "cS_6Aug26-1");
    assert_eq!(ids.next_for(&day_one)?, "cS_6Aug26-2");

    // Stored date differs from today: counter resets
    assert_eq!(ids.next_for(&day_two)?, "cS_7Aug26-1");

    Ok(())
}

#[test]
fn provisional_counter_persists_across_reloads() -> Result<()> {
    let dir = tempfile::TempDir::new()?;
    let state_path = dir.path().join("client-state.json");
    let day = DatePrefix::for_date(NaiveDate::from_ymd_opt(2026, 8, 6).unwrap());

    let mut ids = ProvisionalIdSource::with_state_file(&state_path);
    assert_eq!(ids.next_for(&day)?, "cS_6Aug26-1");
    assert_eq!(ids.next_for(&day)?, "cS_6Aug26-2");

    // Reload from the state file, as a fresh process would
    let mut ids = ProvisionalIdSource::with_state_file(&state_path);
    assert_eq!(ids.next_for(&day)?, "cS_6Aug26-3");

    Ok(())
}

#[test]
fn corrupt_counter_state_starts_fresh() -> Result<()> {
    let dir = tempfile::TempDir::new()?;
    let state_path = dir.path().join("client-state.json");
    std::fs::write(&state_path, b"not json")?;

    let day = DatePrefix::for_date(NaiveDate::from_ymd_opt(2026, 8, 6).unwrap());
    let mut ids = ProvisionalIdSource::with_state_file(&state_path);
    assert_eq!(ids.next_for(&day)?, "cS_6Aug26-1");

    Ok(())
}

// ============================================================================
// Driving a call against a scripted engine
// ============================================================================

struct ScriptedEngine {
    events: Vec<EngineEvent>,
    fail_start: bool,
}

#[async_trait::async_trait]
impl VoiceEngine for ScriptedEngine {
    async fn start(&mut self) -> Result<mpsc::Receiver<EngineEvent>> {
        if self.fail_start {
            anyhow::bail!("missing credentials");
        }
        let (tx, rx) = mpsc::channel(64);
        let events = self.events.clone();
        tokio::spawn(async move {
            for event in events {
                if tx.send(event).await.is_err() {
                    break;
                }
            }
        });
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        Ok(())
    }

    async fn set_muted(&mut self, _muted: bool) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

#[tokio::test]
async fn drive_runs_a_call_to_completion() -> Result<()> {
    let mut ctl = controller();
    let mut engine = ScriptedEngine {
        events: vec![
            EngineEvent::CallStart,
            interim("hel", Role::User),
            final_frag("hello", Role::User),
            final_frag("hi there", Role::Assistant),
            EngineEvent::CallEnd,
        ],
        fail_start: false,
    };

    drive(&mut ctl, &mut engine).await?;

    assert_eq!(ctl.state(), CallState::Ended);
    assert_eq!(ctl.messages().len(), 2);
    assert_eq!(ctl.speaking(), None);

    Ok(())
}

#[tokio::test]
async fn drive_rolls_back_to_idle_when_the_engine_fails_to_start() {
    let mut ctl = controller();
    let mut engine = ScriptedEngine {
        events: Vec::new(),
        fail_start: true,
    };

    assert!(drive(&mut ctl, &mut engine).await.is_err());
    assert_eq!(ctl.state(), CallState::Idle);
}

#[tokio::test]
async fn drive_treats_a_dropped_event_stream_as_an_engine_error() -> Result<()> {
    let mut ctl = controller();
    // Stream ends after CallStart without a CallEnd
    let mut engine = ScriptedEngine {
        events: vec![EngineEvent::CallStart, final_frag("orphan", Role::User)],
        fail_start: false,
    };

    drive(&mut ctl, &mut engine).await?;

    assert_eq!(ctl.state(), CallState::Idle);
    assert!(ctl.messages().is_empty());

    Ok(())
}
