//! `ch-store` — persistence for usage records, newsletter drafts and
//! ingested content.
//!
//! Three narrow traits, [`UsageTracker`], [`DraftStore`] and
//! [`ContentStore`], with an
//! in-process backend ([`MemoryStore`]) and a Supabase/PostgREST backend
//! ([`PostgrestStore`]). [`create_store`] picks one from config.

pub mod analytics;
pub mod content;
pub mod drafts;
pub mod memory;
pub mod rest;
pub mod usage;

pub use content::{ContentEmbedding, ContentItem, ContentMatch, ContentStore, NewContentItem};
pub use drafts::{Draft, DraftStore, DraftVersion, NewDraft};
pub use memory::MemoryStore;
pub use rest::PostgrestStore;
pub use usage::{track, TrackOutcome, UsageQuery, UsageRecord, UsageTracker};

use std::sync::Arc;

use ch_domain::config::{StoreBackend, StoreConfig};
use ch_domain::error::Result;

/// All store handles, backed by the same backend instance.
#[derive(Clone)]
pub struct Stores {
    pub usage: Arc<dyn UsageTracker>,
    pub drafts: Arc<dyn DraftStore>,
    pub content: Arc<dyn ContentStore>,
}

impl Stores {
    pub fn memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            usage: store.clone(),
            drafts: store.clone(),
            content: store,
        }
    }
}

/// Build the configured backend.
pub fn create_store(cfg: &StoreConfig) -> Result<Stores> {
    match cfg.backend {
        StoreBackend::Memory => {
            tracing::info!("using in-memory store; nothing is persisted");
            Ok(Stores::memory())
        }
        StoreBackend::Postgrest => {
            let store = Arc::new(PostgrestStore::new(cfg)?);
            tracing::info!(url = ?cfg.url, "using postgrest store");
            Ok(Stores {
                usage: store.clone(),
                drafts: store.clone(),
                content: store,
            })
        }
    }
}
