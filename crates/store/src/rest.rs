//! PostgREST (Supabase) implementation of the store traits.
//!
//! Tables: `api_usage`, `drafts`, `draft_versions`, `content_items`,
//! `content_embeddings`; similarity search goes through the
//! `match_content_embeddings` RPC. Every request carries
//! the service key as both `apikey` and bearer token, and is retried with
//! exponential back-off on 5xx and transport failures.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use ch_domain::config::StoreConfig;
use ch_domain::error::{Error, Result};
use ch_domain::trace::TraceEvent;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::content::{ContentEmbedding, ContentItem, ContentMatch, ContentStore, NewContentItem};
use crate::drafts::{Draft, DraftStore, DraftVersion, NewDraft};
use crate::usage::{UsageQuery, UsageRecord, UsageTracker};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Client
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone)]
pub struct PostgrestStore {
    http: Client,
    base_url: String,
    api_key: String,
    max_retries: u32,
}

impl PostgrestStore {
    /// Build from config; the key is read from `cfg.api_key_env`.
    pub fn new(cfg: &StoreConfig) -> Result<Self> {
        let url = cfg
            .url
            .as_deref()
            .ok_or_else(|| Error::Configuration("store.url is required for postgrest".into()))?;
        let api_key = std::env::var(&cfg.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::Configuration(format!("{} not set", cfg.api_key_env)))?;
        Self::with_key(url, api_key, Duration::from_millis(cfg.timeout_ms), cfg.max_retries)
    }

    pub fn with_key(
        base_url: &str,
        api_key: String,
        timeout: Duration,
        max_retries: u32,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
            api_key,
            max_retries,
        })
    }

    // ── request helpers ──────────────────────────────────────────────

    fn decorate(&self, rb: RequestBuilder) -> RequestBuilder {
        rb.header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=representation")
    }

    fn url(&self, table: &str) -> String {
        format!("{}/{}", self.base_url, table)
    }

    // ── retry engine ─────────────────────────────────────────────────

    /// Retries on 5xx and transport errors; 4xx is returned immediately.
    async fn execute_with_retry(
        &self,
        endpoint: &str,
        build_request: impl Fn() -> RequestBuilder,
    ) -> Result<Response> {
        let mut last_err: Option<Error> = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let backoff = Duration::from_millis(100 * 2u64.pow(attempt - 1));
                tokio::time::sleep(backoff).await;
            }

            let start = Instant::now();
            let result = self.decorate(build_request()).send().await;
            let duration_ms = start.elapsed().as_millis() as u64;

            match result {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    TraceEvent::StoreCall {
                        endpoint: endpoint.to_owned(),
                        status,
                        duration_ms,
                    }
                    .emit();

                    if resp.status().is_server_error() {
                        let body = resp.text().await.unwrap_or_default();
                        last_err = Some(Error::Store(format!("{endpoint} returned {status}: {body}")));
                        continue;
                    }
                    if resp.status().is_client_error() {
                        let body = resp.text().await.unwrap_or_default();
                        return Err(Error::Store(format!("{endpoint} returned {status}: {body}")));
                    }
                    return Ok(resp);
                }
                Err(e) => {
                    TraceEvent::StoreCall {
                        endpoint: endpoint.to_owned(),
                        status: e.status().map(|s| s.as_u16()).unwrap_or(0),
                        duration_ms,
                    }
                    .emit();
                    last_err = Some(from_reqwest(e));
                }
            }
        }

        Err(last_err.unwrap_or_else(|| Error::Store(format!("{endpoint}: all retries exhausted"))))
    }

    async fn parse<T: DeserializeOwned>(endpoint: &str, resp: Response) -> Result<T> {
        let body = resp.text().await.map_err(from_reqwest)?;
        serde_json::from_str(&body)
            .map_err(|e| Error::Store(format!("failed to parse {endpoint} response: {e}: {body}")))
    }

    /// First row of a `return=representation` insert/update.
    fn first_row<T>(endpoint: &str, rows: Vec<T>) -> Result<T> {
        rows.into_iter()
            .next()
            .ok_or_else(|| Error::Store(format!("{endpoint} returned no rows")))
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Trait implementations
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait]
impl UsageTracker for PostgrestStore {
    async fn record(&self, rec: UsageRecord) -> Result<()> {
        let url = self.url("api_usage");
        self.execute_with_retry("POST api_usage", || self.http.post(&url).json(&rec))
            .await?;
        Ok(())
    }

    async fn usage(&self, query: &UsageQuery) -> Result<Vec<UsageRecord>> {
        let url = self.url("api_usage");
        let mut params: Vec<(&str, String)> = vec![
            ("select", "*".into()),
            ("order", "created_at.asc".into()),
        ];
        if let Some(since) = query.since {
            params.push(("created_at", format!("gte.{}", since.to_rfc3339())));
        }
        if let Some(provider) = &query.provider {
            params.push(("provider", format!("eq.{provider}")));
        }
        let resp = self
            .execute_with_retry("GET api_usage", || self.http.get(&url).query(&params))
            .await?;
        Self::parse("GET api_usage", resp).await
    }
}

#[async_trait]
impl DraftStore for PostgrestStore {
    async fn create_draft(&self, draft: NewDraft) -> Result<Draft> {
        let url = self.url("drafts");
        let row = draft.into_draft();
        let resp = self
            .execute_with_retry("POST drafts", || self.http.post(&url).json(&row))
            .await?;
        let rows: Vec<Draft> = Self::parse("POST drafts", resp).await?;
        Self::first_row("POST drafts", rows)
    }

    async fn get_draft(&self, id: Uuid) -> Result<Option<Draft>> {
        let url = self.url("drafts");
        let filter = format!("eq.{id}");
        let resp = self
            .execute_with_retry("GET drafts", || {
                self.http
                    .get(&url)
                    .query(&[("select", "*"), ("id", filter.as_str())])
            })
            .await?;
        let rows: Vec<Draft> = Self::parse("GET drafts", resp).await?;
        Ok(rows.into_iter().next())
    }

    async fn list_drafts(&self, status: Option<&str>, limit: usize) -> Result<Vec<Draft>> {
        let url = self.url("drafts");
        let mut params: Vec<(&str, String)> = vec![
            ("select", "*".into()),
            ("order", "created_at.desc".into()),
            ("limit", limit.to_string()),
        ];
        if let Some(status) = status {
            params.push(("status", format!("eq.{status}")));
        }
        let resp = self
            .execute_with_retry("GET drafts", || self.http.get(&url).query(&params))
            .await?;
        Self::parse("GET drafts", resp).await
    }

    async fn create_version(
        &self,
        draft_id: Uuid,
        content: String,
        changes_summary: Option<String>,
    ) -> Result<DraftVersion> {
        let draft = self
            .get_draft(draft_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("draft {draft_id}")))?;
        let next_version = draft.version + 1;
        let now = chrono::Utc::now();

        let drafts_url = self.url("drafts");
        let filter = format!("eq.{draft_id}");
        let patch = serde_json::json!({
            "version": next_version,
            "content": content,
            "updated_at": now,
        });
        self.execute_with_retry("PATCH drafts", || {
            self.http
                .patch(&drafts_url)
                .query(&[("id", filter.as_str())])
                .json(&patch)
        })
        .await?;

        let version = DraftVersion {
            id: Uuid::new_v4(),
            draft_id,
            version_number: next_version,
            content,
            changes_summary,
            created_at: now,
        };
        let url = self.url("draft_versions");
        let resp = self
            .execute_with_retry("POST draft_versions", || self.http.post(&url).json(&version))
            .await?;
        let rows: Vec<DraftVersion> = Self::parse("POST draft_versions", resp).await?;
        Self::first_row("POST draft_versions", rows)
    }

    async fn list_versions(&self, draft_id: Uuid) -> Result<Vec<DraftVersion>> {
        let url = self.url("draft_versions");
        let filter = format!("eq.{draft_id}");
        let resp = self
            .execute_with_retry("GET draft_versions", || {
                self.http.get(&url).query(&[
                    ("select", "*"),
                    ("draft_id", filter.as_str()),
                    ("order", "version_number.asc"),
                ])
            })
            .await?;
        Self::parse("GET draft_versions", resp).await
    }
}

#[async_trait]
impl ContentStore for PostgrestStore {
    async fn create_content(&self, item: NewContentItem) -> Result<ContentItem> {
        let url = self.url("content_items");
        let row = item.into_item();
        let resp = self
            .execute_with_retry("POST content_items", || self.http.post(&url).json(&row))
            .await?;
        let rows: Vec<ContentItem> = Self::parse("POST content_items", resp).await?;
        Self::first_row("POST content_items", rows)
    }

    async fn get_content(&self, id: Uuid) -> Result<Option<ContentItem>> {
        let url = self.url("content_items");
        let filter = format!("eq.{id}");
        let resp = self
            .execute_with_retry("GET content_items", || {
                self.http
                    .get(&url)
                    .query(&[("select", "*"), ("id", filter.as_str())])
            })
            .await?;
        let rows: Vec<ContentItem> = Self::parse("GET content_items", resp).await?;
        Ok(rows.into_iter().next())
    }

    async fn store_embedding(
        &self,
        content_id: Uuid,
        embedding: Vec<f32>,
        model_used: &str,
    ) -> Result<ContentEmbedding> {
        if self.get_content(content_id).await?.is_none() {
            return Err(Error::NotFound(format!("content item {content_id}")));
        }

        let url = self.url("content_embeddings");
        let row = serde_json::json!({
            "content_id": content_id,
            "embedding": embedding,
            "model_used": model_used,
        });
        let resp = self
            .execute_with_retry("POST content_embeddings", || {
                self.http
                    .post(&url)
                    .query(&[("on_conflict", "content_id,model_used")])
                    .header("Prefer", "resolution=merge-duplicates")
                    .json(&row)
            })
            .await?;
        let rows: Vec<ContentEmbedding> = Self::parse("POST content_embeddings", resp).await?;
        Self::first_row("POST content_embeddings", rows)
    }

    async fn match_content(
        &self,
        embedding: &[f32],
        threshold: f32,
        limit: usize,
    ) -> Result<Vec<ContentMatch>> {
        let url = self.url("rpc/match_content_embeddings");
        let args = serde_json::json!({
            "query_embedding": embedding,
            "match_threshold": threshold,
            "match_count": limit,
        });
        let resp = self
            .execute_with_retry("RPC match_content_embeddings", || {
                self.http.post(&url).json(&args)
            })
            .await?;
        Self::parse("RPC match_content_embeddings", resp).await
    }

    async fn ping(&self) -> Result<()> {
        let url = self.url("content_items");
        self.execute_with_retry("GET content_items", || {
            self.http
                .get(&url)
                .query(&[("select", "id"), ("limit", "1")])
        })
        .await?;
        Ok(())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Error conversion helper
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub fn from_reqwest(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Store(format!("timeout: {e}"))
    } else {
        Error::Http(e.to_string())
    }
}
