//! Versioned newsletter drafts.

use async_trait::async_trait;
use ch_domain::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_STATUS: &str = "draft";
pub const DEFAULT_LIST_LIMIT: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub content: String,
    pub status: String,
    /// Starts at 1; bumped by every [`DraftStore::create_version`].
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_used: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Fields a caller supplies when creating a draft.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewDraft {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_used: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl NewDraft {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    /// Materialize as version 1 with a fresh id.
    pub fn into_draft(self) -> Draft {
        Draft {
            id: Uuid::new_v4(),
            topic_id: self.topic_id,
            title: self.title.filter(|t| !t.is_empty()),
            content: self.content,
            status: self.status.unwrap_or_else(|| DEFAULT_STATUS.into()),
            version: 1,
            model_used: self.model_used,
            prompt_used: self.prompt_used,
            created_at: Utc::now(),
            updated_at: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftVersion {
    pub id: Uuid,
    pub draft_id: Uuid,
    pub version_number: u32,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changes_summary: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait DraftStore: Send + Sync {
    async fn create_draft(&self, draft: NewDraft) -> Result<Draft>;

    async fn get_draft(&self, id: Uuid) -> Result<Option<Draft>>;

    /// Newest first, optionally filtered by status.
    async fn list_drafts(&self, status: Option<&str>, limit: usize) -> Result<Vec<Draft>>;

    /// Replace the draft's content, bump its version and append a version
    /// record. Fails with `NotFound` for an unknown draft.
    async fn create_version(
        &self,
        draft_id: Uuid,
        content: String,
        changes_summary: Option<String>,
    ) -> Result<DraftVersion>;

    /// Version records for a draft, oldest first.
    async fn list_versions(&self, draft_id: Uuid) -> Result<Vec<DraftVersion>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_draft_starts_at_version_one() {
        let d = NewDraft::new("Namaste").into_draft();
        assert_eq!(d.version, 1);
        assert_eq!(d.status, "draft");
        assert!(d.title.is_none());
    }

    #[test]
    fn empty_title_is_dropped() {
        let d = NewDraft {
            title: Some(String::new()),
            ..NewDraft::new("x")
        }
        .into_draft();
        assert!(d.title.is_none());
    }
}
