pub mod call;
pub mod config;
pub mod http;
pub mod ids;
pub mod ingest;
pub mod query;
pub mod records;
pub mod store;

pub use call::{
    drive, CallSessionController, CallState, ChatMessage, EngineEvent, ExportLabels,
    SpeechFragment, VoiceEngine,
};
pub use config::Config;
pub use http::{create_router, AppState};
pub use ids::{ProvisionalIdSource, SessionIdAllocator, StoreAllocator};
pub use ingest::{EndOfCallReport, IngestOutcome, IngestService};
pub use query::QueryService;
pub use records::{LatestPointer, Role, SessionSummary, TranscriptLine, TranscriptRecord};
pub use store::{FsStore, MemoryStore, StoreKey, TranscriptStore};
