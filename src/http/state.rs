use crate::ingest::IngestService;
use crate::query::QueryService;
use std::sync::Arc;

/// Shared application state for HTTP handlers
///
/// Handlers are stateless beyond this: all coordination between requests
/// goes through the store the two services wrap.
#[derive(Clone)]
pub struct AppState {
    pub ingest: Arc<IngestService>,
    pub query: Arc<QueryService>,
}

impl AppState {
    pub fn new(ingest: IngestService, query: QueryService) -> Self {
        Self {
            ingest: Arc::new(ingest),
            query: Arc::new(query),
        }
    }
}
