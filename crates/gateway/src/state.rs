use std::sync::Arc;

use ch_domain::config::Config;
use ch_providers::ModelRegistry;
use ch_store::{ContentStore, DraftStore, UsageTracker};

/// Shared application state passed to all API handlers.
///
/// Built once in [`crate::bootstrap`]; every field is read-only after
/// startup and cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: Arc<ModelRegistry>,
    /// Append-only API usage sink.
    pub usage: Arc<dyn UsageTracker>,
    pub drafts: Arc<dyn DraftStore>,
    pub content: Arc<dyn ContentStore>,
}
