//! Shared application state passed to all API handlers, grounded on
//! `sa_gateway::state::AppState` — one `Arc` per shared service, `Clone`
//! derived so axum can hand a copy to every request.

use std::sync::Arc;

use alex_domain::tool::ToolCatalog;
use alex_domain::Config;
use alex_memory::{Retriever, Summarizer};
use alex_providers::ProviderRegistry;
use alex_store::PostgresStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: Arc<ProviderRegistry>,
    pub store: Arc<PostgresStore>,
    pub retriever: Arc<Retriever>,
    pub summarizer: Arc<Summarizer>,
    pub catalog: Arc<dyn ToolCatalog>,
    /// SHA-256 hash of the API bearer token, read once at startup.
    /// `None` means dev mode — no auth enforced.
    pub api_token_hash: Option<Vec<u8>>,
}
