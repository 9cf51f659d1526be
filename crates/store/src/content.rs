//! Ingested content items and their embeddings.

use async_trait::async_trait;
use ch_domain::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_MATCH_THRESHOLD: f32 = 0.7;
pub const DEFAULT_MATCH_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl ContentItem {
    /// The text an embedding is computed from: the summary, else the
    /// extracted text.
    pub fn embedding_text(&self) -> Option<&str> {
        self.summary
            .as_deref()
            .or(self.extracted_text.as_deref())
            .filter(|t| !t.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewContentItem {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub extracted_text: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl NewContentItem {
    /// Empty strings are stored as absent.
    pub fn into_item(self) -> ContentItem {
        let keep = |v: Option<String>| v.filter(|s| !s.is_empty());
        ContentItem {
            id: Uuid::new_v4(),
            url: keep(self.url),
            file_path: keep(self.file_path),
            extracted_text: keep(self.extracted_text),
            summary: keep(self.summary),
            tags: self.tags,
            created_at: Utc::now(),
        }
    }
}

/// One embedding per (content item, model).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentEmbedding {
    pub id: Uuid,
    pub content_id: Uuid,
    pub embedding: Vec<f32>,
    pub model_used: String,
    pub created_at: DateTime<Utc>,
}

/// A nearest-neighbour hit, most similar first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentMatch {
    pub content_id: Uuid,
    pub similarity: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn create_content(&self, item: NewContentItem) -> Result<ContentItem>;

    async fn get_content(&self, id: Uuid) -> Result<Option<ContentItem>>;

    /// Insert or replace the embedding for `(content_id, model_used)`.
    /// Fails with `NotFound` for an unknown content item.
    async fn store_embedding(
        &self,
        content_id: Uuid,
        embedding: Vec<f32>,
        model_used: &str,
    ) -> Result<ContentEmbedding>;

    /// Items whose cosine similarity to `embedding` is at least
    /// `threshold`, best first, at most `limit`.
    async fn match_content(
        &self,
        embedding: &[f32],
        threshold: f32,
        limit: usize,
    ) -> Result<Vec<ContentMatch>>;

    /// Cheap read against the content table.
    async fn ping(&self) -> Result<()>;
}

/// Cosine similarity; `0.0` for mismatched lengths or a zero vector.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let (mut dot, mut na, mut nb) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    dot / (na.sqrt() * nb.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_of_parallel_and_orthogonal() {
        assert!((cosine_similarity(&[1.0, 2.0], &[2.0, 4.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
    }

    #[test]
    fn cosine_degenerate_inputs_are_zero() {
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn embedding_text_prefers_summary() {
        let item = NewContentItem {
            extracted_text: Some("long article body".into()),
            summary: Some("short summary".into()),
            ..Default::default()
        }
        .into_item();
        assert_eq!(item.embedding_text(), Some("short summary"));

        let bare = NewContentItem {
            url: Some(String::new()),
            ..Default::default()
        }
        .into_item();
        assert!(bare.url.is_none());
        assert!(bare.embedding_text().is_none());
    }
}
