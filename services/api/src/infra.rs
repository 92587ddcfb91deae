use lehrstellen::config::AppConfig;
use lehrstellen::error::AppError;
use lehrstellen::listing::{load_dataset, Dataset, JsonSource, LoadState, SourceError};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, RwLock};

use crate::cli::DataArgs;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Shared load outcome for the listing routes.
#[derive(Clone)]
pub(crate) struct CatalogState {
    load: Arc<RwLock<LoadState>>,
    pub(crate) page_size: usize,
}

impl CatalogState {
    pub(crate) fn new(page_size: usize) -> Self {
        Self {
            load: Arc::new(RwLock::new(LoadState::Loading)),
            page_size,
        }
    }

    #[cfg(test)]
    pub(crate) fn ready(dataset: Dataset, page_size: usize) -> Self {
        let catalog = Self::new(page_size);
        catalog.set(LoadState::Ready(Arc::new(dataset)));
        catalog
    }

    pub(crate) fn set(&self, state: LoadState) {
        *self.load.write().expect("catalog lock poisoned") = state;
    }

    pub(crate) fn snapshot(&self) -> LoadState {
        self.load.read().expect("catalog lock poisoned").clone()
    }
}

/// Environment configuration with command-line data overrides applied.
pub(crate) fn load_config(data: &DataArgs) -> Result<AppConfig, AppError> {
    let mut config = AppConfig::load()?;
    data.apply(&mut config.listing);
    Ok(config)
}

pub(crate) async fn fetch_dataset(config: &AppConfig) -> Result<Dataset, SourceError> {
    let listing = &config.listing;
    let source = JsonSource::new(listing.postings.clone(), listing.cantons.clone());
    load_dataset(&source, listing.professions.clone()).await
}
