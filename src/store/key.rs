/// Sentinel prefix that keeps meta keys out of the session-id namespace.
/// Durable session identifiers always start with an alphanumeric prefix,
/// so a leading underscore can never collide with one.
pub const META_SENTINEL: char = '_';

/// A typed store key: either a transcript record or a reserved meta entry
///
/// Call sites never build raw key strings; the namespace split lives here so
/// listings and scans cannot accidentally pick up meta entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StoreKey {
    /// A transcript record, named by its durable session identifier
    Record(String),

    /// The singleton latest-ingestion pointer
    Latest,

    /// Call-id index entry mapping an upstream call id to a session id
    CallIndex(String),
}

impl StoreKey {
    pub fn record(session_id: impl Into<String>) -> Self {
        StoreKey::Record(session_id.into())
    }

    pub fn call_index(call_id: impl Into<String>) -> Self {
        StoreKey::CallIndex(call_id.into())
    }

    /// Render to the backend key name. Meta keys get the sentinel prefix.
    pub fn name(&self) -> String {
        match self {
            StoreKey::Record(id) => id.clone(),
            StoreKey::Latest => format!("{}latest", META_SENTINEL),
            StoreKey::CallIndex(call_id) => {
                format!("{}call-{}", META_SENTINEL, sanitize(call_id))
            }
        }
    }

    pub fn is_meta(&self) -> bool {
        !matches!(self, StoreKey::Record(_))
    }
}

/// Upstream call ids are opaque strings; squash anything that is not safe in
/// a file name so the filesystem backend cannot be escaped.
fn sanitize(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '-' })
        .collect()
}
