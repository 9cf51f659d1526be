use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Persistence backend for usage records and drafts
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    /// PostgREST root, e.g. `https://xyz.supabase.co/rest/v1`.
    #[serde(default)]
    pub url: Option<String>,
    /// Env var holding the service key sent as `apikey` + bearer.
    #[serde(default = "d_key_env")]
    pub api_key_env: String,
    #[serde(default = "d_8000")]
    pub timeout_ms: u64,
    #[serde(default = "d_3")]
    pub max_retries: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            url: None,
            api_key_env: d_key_env(),
            timeout_ms: 8_000,
            max_retries: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// Process-local; lost on restart.
    #[default]
    Memory,
    /// Supabase / PostgREST tables `api_usage`, `drafts`, `draft_versions`.
    Postgrest,
}

fn d_key_env() -> String {
    "SUPABASE_KEY".into()
}
fn d_8000() -> u64 {
    8_000
}
fn d_3() -> u32 {
    3
}
