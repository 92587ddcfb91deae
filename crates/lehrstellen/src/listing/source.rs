use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::canton::CantonIndex;
use super::domain::{Dataset, Posting};

/// Where a JSON resource lives: a local file or an `http(s)://` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataLocation {
    Path(PathBuf),
    Url(String),
}

impl DataLocation {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            Self::Url(trimmed.to_owned())
        } else {
            Self::Path(PathBuf::from(trimmed))
        }
    }
}

impl fmt::Display for DataLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataLocation::Path(path) => write!(f, "{}", path.display()),
            DataLocation::Url(url) => write!(f, "{url}"),
        }
    }
}

/// Supplier of the posting list and the ZIP code to canton mapping.
pub trait DatasetSource: Send + Sync {
    fn fetch_postings(&self) -> impl Future<Output = Result<Vec<Posting>, SourceError>> + Send;

    fn fetch_zip_cantons(
        &self,
    ) -> impl Future<Output = Result<HashMap<String, String>, SourceError>> + Send;
}

/// Reads both resources as JSON from files or over HTTP.
#[derive(Debug, Clone)]
pub struct JsonSource {
    postings: DataLocation,
    cantons: DataLocation,
    client: reqwest::Client,
}

impl JsonSource {
    pub fn new(postings: DataLocation, cantons: DataLocation) -> Self {
        Self {
            postings,
            cantons,
            client: reqwest::Client::new(),
        }
    }

    async fn fetch_json<T: DeserializeOwned>(
        &self,
        location: &DataLocation,
    ) -> Result<T, SourceError> {
        debug!(%location, "fetching dataset resource");
        let bytes = match location {
            DataLocation::Path(path) => {
                tokio::fs::read(path)
                    .await
                    .map_err(|source| SourceError::Io {
                        path: path.clone(),
                        source,
                    })?
            }
            DataLocation::Url(url) => {
                let response = self
                    .client
                    .get(url)
                    .send()
                    .await
                    .map_err(|source| SourceError::Http {
                        url: url.clone(),
                        source,
                    })?;

                let status = response.status();
                if !status.is_success() {
                    return Err(SourceError::Status {
                        url: url.clone(),
                        status: status.as_u16(),
                    });
                }

                response
                    .bytes()
                    .await
                    .map_err(|source| SourceError::Http {
                        url: url.clone(),
                        source,
                    })?
                    .to_vec()
            }
        };

        serde_json::from_slice(&bytes).map_err(|source| SourceError::Json {
            origin: location.to_string(),
            source,
        })
    }
}

impl DatasetSource for JsonSource {
    async fn fetch_postings(&self) -> Result<Vec<Posting>, SourceError> {
        self.fetch_json(&self.postings).await
    }

    async fn fetch_zip_cantons(&self) -> Result<HashMap<String, String>, SourceError> {
        self.fetch_json(&self.cantons).await
    }
}

/// Serves fixed, already parsed data.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    pub postings: Vec<Posting>,
    pub zip_cantons: HashMap<String, String>,
}

impl DatasetSource for StaticSource {
    async fn fetch_postings(&self) -> Result<Vec<Posting>, SourceError> {
        Ok(self.postings.clone())
    }

    async fn fetch_zip_cantons(&self) -> Result<HashMap<String, String>, SourceError> {
        Ok(self.zip_cantons.clone())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("network response was not ok: {url} answered {status}")]
    Status { url: String, status: u16 },
    #[error("invalid JSON in {origin}: {source}")]
    Json {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Fetches postings, then the ZIP mapping, and assembles the dataset.
///
/// `professions` replaces the profession options derived from the postings when given.
pub async fn load_dataset<S>(
    source: &S,
    professions: Option<Vec<String>>,
) -> Result<Dataset, SourceError>
where
    S: DatasetSource,
{
    let postings = source.fetch_postings().await.map_err(|err| {
        warn!(error = %err, "posting fetch failed");
        err
    })?;
    let zip_cantons = source.fetch_zip_cantons().await.map_err(|err| {
        warn!(error = %err, "canton mapping fetch failed");
        err
    })?;

    let cantons = CantonIndex::from_zip_map(zip_cantons);
    let dataset = Dataset::new(postings, cantons);
    let dataset = match professions {
        Some(list) if !list.is_empty() => dataset.with_profession_options(list),
        _ => dataset,
    };

    info!(
        postings = dataset.len(),
        cantons = dataset.cantons().len(),
        professions = dataset.profession_options().len(),
        "dataset loaded"
    );

    Ok(dataset)
}

/// Outcome of the single startup load attempt.
#[derive(Debug, Clone, Default)]
pub enum LoadState {
    #[default]
    Loading,
    Ready(Arc<Dataset>),
    Failed(String),
}

impl LoadState {
    pub fn from_result(result: Result<Dataset, SourceError>) -> Self {
        match result {
            Ok(dataset) => Self::Ready(Arc::new(dataset)),
            Err(err) => Self::Failed(err.to_string()),
        }
    }

    pub fn dataset(&self) -> Option<&Arc<Dataset>> {
        match self {
            LoadState::Ready(dataset) => Some(dataset),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, LoadState::Ready(_))
    }
}
