//! In-process store. Everything is lost on restart.

use async_trait::async_trait;
use ch_domain::error::{Error, Result};
use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::content::{
    cosine_similarity, ContentEmbedding, ContentItem, ContentMatch, ContentStore, NewContentItem,
};
use crate::drafts::{Draft, DraftStore, DraftVersion, NewDraft};
use crate::usage::{UsageQuery, UsageRecord, UsageTracker};

#[derive(Default)]
pub struct MemoryStore {
    usage: RwLock<Vec<UsageRecord>>,
    /// Insertion order; newest last.
    drafts: RwLock<Vec<Draft>>,
    versions: RwLock<Vec<DraftVersion>>,
    content: RwLock<Vec<ContentItem>>,
    embeddings: RwLock<Vec<ContentEmbedding>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UsageTracker for MemoryStore {
    async fn record(&self, rec: UsageRecord) -> Result<()> {
        self.usage.write().push(rec);
        Ok(())
    }

    async fn usage(&self, query: &UsageQuery) -> Result<Vec<UsageRecord>> {
        Ok(self
            .usage
            .read()
            .iter()
            .filter(|r| query.matches(r))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl DraftStore for MemoryStore {
    async fn create_draft(&self, draft: NewDraft) -> Result<Draft> {
        let draft = draft.into_draft();
        self.drafts.write().push(draft.clone());
        Ok(draft)
    }

    async fn get_draft(&self, id: Uuid) -> Result<Option<Draft>> {
        Ok(self.drafts.read().iter().find(|d| d.id == id).cloned())
    }

    async fn list_drafts(&self, status: Option<&str>, limit: usize) -> Result<Vec<Draft>> {
        let mut out: Vec<Draft> = self
            .drafts
            .read()
            .iter()
            .rev()
            .filter(|d| status.map_or(true, |s| d.status == s))
            .cloned()
            .collect();
        // Stable: equal timestamps keep reverse insertion order.
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        out.truncate(limit);
        Ok(out)
    }

    async fn create_version(
        &self,
        draft_id: Uuid,
        content: String,
        changes_summary: Option<String>,
    ) -> Result<DraftVersion> {
        let mut drafts = self.drafts.write();
        let draft = drafts
            .iter_mut()
            .find(|d| d.id == draft_id)
            .ok_or_else(|| Error::NotFound(format!("draft {draft_id}")))?;

        let now = Utc::now();
        draft.version += 1;
        draft.content = content.clone();
        draft.updated_at = Some(now);

        let version = DraftVersion {
            id: Uuid::new_v4(),
            draft_id,
            version_number: draft.version,
            content,
            changes_summary,
            created_at: now,
        };
        // Lock order: drafts, then versions.
        self.versions.write().push(version.clone());
        Ok(version)
    }

    async fn list_versions(&self, draft_id: Uuid) -> Result<Vec<DraftVersion>> {
        let mut out: Vec<DraftVersion> = self
            .versions
            .read()
            .iter()
            .filter(|v| v.draft_id == draft_id)
            .cloned()
            .collect();
        out.sort_by_key(|v| v.version_number);
        Ok(out)
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn create_content(&self, item: NewContentItem) -> Result<ContentItem> {
        let item = item.into_item();
        self.content.write().push(item.clone());
        Ok(item)
    }

    async fn get_content(&self, id: Uuid) -> Result<Option<ContentItem>> {
        Ok(self.content.read().iter().find(|c| c.id == id).cloned())
    }

    async fn store_embedding(
        &self,
        content_id: Uuid,
        embedding: Vec<f32>,
        model_used: &str,
    ) -> Result<ContentEmbedding> {
        if !self.content.read().iter().any(|c| c.id == content_id) {
            return Err(Error::NotFound(format!("content item {content_id}")));
        }

        let mut embeddings = self.embeddings.write();
        let existing = embeddings
            .iter_mut()
            .find(|e| e.content_id == content_id && e.model_used == model_used);
        let row = match existing {
            Some(row) => {
                row.embedding = embedding;
                row.created_at = Utc::now();
                row.clone()
            }
            None => {
                let row = ContentEmbedding {
                    id: Uuid::new_v4(),
                    content_id,
                    embedding,
                    model_used: model_used.to_owned(),
                    created_at: Utc::now(),
                };
                embeddings.push(row.clone());
                row
            }
        };
        Ok(row)
    }

    async fn match_content(
        &self,
        embedding: &[f32],
        threshold: f32,
        limit: usize,
    ) -> Result<Vec<ContentMatch>> {
        // Lock order: content, then embeddings.
        let content = self.content.read();
        let mut out: Vec<ContentMatch> = self
            .embeddings
            .read()
            .iter()
            .filter_map(|e| {
                let similarity = cosine_similarity(embedding, &e.embedding);
                if similarity < threshold {
                    return None;
                }
                let item = content.iter().find(|c| c.id == e.content_id)?;
                Some(ContentMatch {
                    content_id: item.id,
                    similarity,
                    url: item.url.clone(),
                    summary: item.summary.clone(),
                    tags: item.tags.clone(),
                })
            })
            .collect();
        out.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        out.truncate(limit);
        Ok(out)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
