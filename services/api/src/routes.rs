use crate::infra::{AppState, CatalogState};
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use lehrstellen::error::AppError;
use lehrstellen::listing::view::matching_count;
use lehrstellen::listing::{
    contact_view, derive_view, total_pages, ContactView, Dataset, FilterState, LoadState,
    PostingId, ViewModel, WidgetState,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListingQuery {
    #[serde(default)]
    pub(crate) canton: Option<String>,
    #[serde(default)]
    pub(crate) profession: Option<String>,
    #[serde(default)]
    pub(crate) page: Option<usize>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CantonEntry {
    pub(crate) canton: String,
    pub(crate) zip_codes: usize,
}

pub(crate) fn listing_router(catalog: CatalogState) -> Router {
    Router::new()
        .route("/api/v1/postings", get(list_postings))
        .route("/api/v1/postings/:posting_id", get(posting_contact))
        .route("/api/v1/cantons", get(list_cantons))
        .route("/api/v1/professions", get(list_professions))
        .with_state(catalog)
}

pub(crate) fn with_listing_routes(catalog: CatalogState) -> Router {
    listing_router(catalog)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// The loaded dataset, or a 503 describing why there is none yet.
fn ready_dataset(catalog: &CatalogState) -> Result<Arc<Dataset>, Response> {
    match catalog.snapshot() {
        LoadState::Ready(dataset) => Ok(dataset),
        LoadState::Loading => Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "loading" })),
        )
            .into_response()),
        LoadState::Failed(reason) => Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "failed", "error": reason })),
        )
            .into_response()),
    }
}

pub(crate) async fn list_postings(
    State(catalog): State<CatalogState>,
    Query(query): Query<ListingQuery>,
) -> Result<Json<ViewModel>, Response> {
    let dataset = ready_dataset(&catalog)?;
    let filter = FilterState::new(query.canton, query.profession);
    let mut state = WidgetState::new(catalog.page_size).with_filter(filter);

    if let Some(page) = query.page {
        let total = total_pages(matching_count(&dataset, &state.filter), catalog.page_size);
        state = state
            .go_to_page(page, total)
            .map_err(|err| AppError::from(err).into_response())?;
    }

    Ok(Json(derive_view(&dataset, &state)))
}

pub(crate) async fn posting_contact(
    State(catalog): State<CatalogState>,
    Path(posting_id): Path<usize>,
) -> Result<Json<ContactView>, Response> {
    let dataset = ready_dataset(&catalog)?;
    contact_view(&dataset, PostingId(posting_id))
        .map(Json)
        .map_err(|err| AppError::from(err).into_response())
}

pub(crate) async fn list_cantons(
    State(catalog): State<CatalogState>,
) -> Result<Json<Vec<CantonEntry>>, Response> {
    let dataset = ready_dataset(&catalog)?;
    let entries = dataset
        .cantons()
        .summary()
        .into_iter()
        .map(|(canton, zip_codes)| CantonEntry { canton, zip_codes })
        .collect();
    Ok(Json(entries))
}

pub(crate) async fn list_professions(
    State(catalog): State<CatalogState>,
) -> Result<Json<Vec<String>>, Response> {
    let dataset = ready_dataset(&catalog)?;
    Ok(Json(dataset.profession_options().to_vec()))
}
