use super::controller::ChatMessage;
use crate::records::Role;
use chrono::{DateTime, Local, Timelike};

/// Fixed per-role speaker labels used in the exported transcript
#[derive(Debug, Clone)]
pub struct ExportLabels {
    pub user: String,
    pub assistant: String,
}

impl Default for ExportLabels {
    fn default() -> Self {
        Self {
            user: "User".to_string(),
            assistant: "Agent".to_string(),
        }
    }
}

/// Render a duration as `Xm Ys`
pub fn format_duration(seconds: u64) -> String {
    format!("{}m {}s", seconds / 60, seconds % 60)
}

/// Suggested file name for a downloaded transcript
pub fn export_filename(session_id: &str) -> String {
    format!("{}_raw.md", session_id)
}

/// Render the session as a markdown document: a front-matter header block
/// followed by one line per finalized message
///
/// This is a pure projection of the message log, not a source of truth.
/// An empty log still yields a well-formed header and an empty body.
pub fn format_transcript(
    session_id: &str,
    duration_secs: u64,
    started_at: Option<DateTime<Local>>,
    messages: &[ChatMessage],
    labels: &ExportLabels,
) -> String {
    let start = started_at.unwrap_or_else(Local::now);
    let start_time = format!("T-{:02}{:02}", start.hour(), start.minute());

    let mut out = format!(
        "---\nsession_id: {}\nduration: {}\nstart_time: {}\nsummary: [TO BE FILLED]\n---\n\n",
        session_id,
        format_duration(duration_secs),
        start_time
    );

    for msg in messages {
        let label = match msg.role {
            Role::User => &labels.user,
            Role::Assistant => &labels.assistant,
        };
        out.push_str(&format!("**{}:** {}\n\n", label, msg.text));
    }

    out
}
