pub mod analytics;
pub mod content;
pub mod drafts;
pub mod error;
pub mod models;
pub mod service;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Build the full API router.
///
/// Every route is public; the service sits behind whatever proxy the
/// deployment puts in front of it.
pub fn router() -> Router<AppState> {
    Router::new()
        // Service
        .route("/", get(service::root))
        .route("/health", get(service::health))
        // Models
        .route("/api/models", get(models::list_models))
        .route("/api/models/", get(models::list_models))
        .route("/api/models/costs", get(models::model_costs))
        .route("/api/models/providers", get(models::list_providers))
        .route("/api/models/test", post(models::test_model))
        .route("/api/models/generate", post(models::generate_text))
        // Drafts
        .route("/api/drafts", get(drafts::list_drafts))
        .route("/api/drafts/generate", post(drafts::generate_draft))
        .route("/api/drafts/compare", post(drafts::compare_models))
        .route("/api/drafts/:id", get(drafts::get_draft))
        .route(
            "/api/drafts/:id/versions",
            get(drafts::list_versions).post(drafts::create_version),
        )
        // Content
        .route("/api/content", post(content::create_content))
        .route("/api/content/search", get(content::search_content))
        .route("/api/content/:id", get(content::get_content))
        .route("/api/db/test", get(content::test_store))
        // Analytics
        .route("/api/analytics/usage", get(analytics::usage))
        .route("/api/analytics/costs", get(analytics::costs))
}
