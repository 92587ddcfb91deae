use crate::cli::ServeArgs;
use crate::infra::{fetch_dataset, load_config, AppState, CatalogState};
use crate::routes::with_listing_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use lehrstellen::config::AppConfig;
use lehrstellen::error::AppError;
use lehrstellen::listing::LoadState;
use lehrstellen::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = load_config(&args.data)?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };
    let catalog = CatalogState::new(config.listing.page_size);

    let app = with_listing_routes(catalog.clone())
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    spawn_dataset_load(config.clone(), catalog, readiness_flag);

    info!(?config.environment, %addr, postings = %config.listing.postings, "listing service started");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Loads the dataset once in the background; readiness flips only on success.
fn spawn_dataset_load(config: AppConfig, catalog: CatalogState, readiness: Arc<AtomicBool>) {
    tokio::spawn(async move {
        let result = fetch_dataset(&config).await;
        if let Err(err) = &result {
            error!(error = %err, "dataset unavailable; listing routes stay offline");
        }
        let state = LoadState::from_result(result);
        let ready = state.is_ready();
        catalog.set(state);
        readiness.store(ready, Ordering::Release);
    });
}
