//! Loading the posting list and canton mapping from JSON files and in-memory sources.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use axum::routing::get;
use axum::{Json, Router};
use lehrstellen::listing::{
    load_dataset, DataLocation, JsonSource, LoadState, Posting, SourceError, StaticSource,
};
use serde_json::json;
use tempfile::TempDir;
use tokio::net::TcpListener;

fn write_fixture(dir: &TempDir, name: &str, value: &serde_json::Value) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, serde_json::to_vec(value).expect("serialize fixture")).expect("write fixture");
    path
}

fn postings_fixture() -> serde_json::Value {
    json!([
        {
            "professionNameDeMf": "Metallbauer/-in (Metallbau) EFZ",
            "locationName": "Muster Metall AG",
            "locationStreet": "Industriestrasse",
            "locationHouseNumber": "4a",
            "locationZipCode": 8000,
            "locationLocalityNameDe": "Zürich",
            "apprenticeshipPlaceSchoolYears": [{ "year": 2025, "email": "lehre@muster.ch" }]
        },
        {
            "professionNameDeMf": "Metallbaupraktiker/-in EBA",
            "locationName": "Aare Stahlbau",
            "locationZipCode": "3000",
            "locationLocalityNameDe": "Bern",
            "locationEmail": "info@aare.ch"
        }
    ])
}

#[tokio::test]
async fn loads_dataset_from_json_files() {
    let dir = TempDir::new().expect("temp dir");
    let postings = write_fixture(&dir, "berufsberatung.json", &postings_fixture());
    let cantons = write_fixture(
        &dir,
        "zipToCanton.json",
        &json!({ "8000": "ZH", "8001": "ZH", "3000": "BE" }),
    );

    let source = JsonSource::new(DataLocation::Path(postings), DataLocation::Path(cantons));
    let dataset = load_dataset(&source, None).await.expect("dataset loads");

    assert_eq!(dataset.len(), 2);
    assert_eq!(dataset.cantons().canton_codes().collect::<Vec<_>>(), ["BE", "ZH"]);
    assert!(dataset.cantons().contains("ZH", &dataset.postings()[0].location.zip_code));
    assert_eq!(
        dataset.profession_options(),
        [
            "Metallbauer/-in (Metallbau) EFZ".to_string(),
            "Metallbaupraktiker/-in EBA".to_string()
        ]
    );
    assert!(dataset.postings()[0].is_open());
    assert!(!dataset.postings()[1].is_open());
}

#[tokio::test]
async fn missing_file_is_reported_as_io_error() {
    let dir = TempDir::new().expect("temp dir");
    let source = JsonSource::new(
        DataLocation::Path(dir.path().join("absent.json")),
        DataLocation::Path(dir.path().join("absent-too.json")),
    );

    let err = load_dataset(&source, None).await.expect_err("load fails");

    assert!(matches!(err, SourceError::Io { .. }));
    assert!(err.to_string().contains("absent.json"));
    assert!(matches!(LoadState::from_result(Err(err)), LoadState::Failed(_)));
}

#[tokio::test]
async fn malformed_mapping_is_reported_as_json_error() {
    let dir = TempDir::new().expect("temp dir");
    let postings = write_fixture(&dir, "berufsberatung.json", &postings_fixture());
    let cantons = dir.path().join("zipToCanton.json");
    fs::write(&cantons, b"{ not json").expect("write fixture");

    let source = JsonSource::new(DataLocation::Path(postings), DataLocation::Path(cantons));
    let err = load_dataset(&source, None).await.expect_err("load fails");

    assert!(matches!(err, SourceError::Json { .. }));
}

#[tokio::test]
async fn configured_professions_replace_derived_options() {
    let postings: Vec<Posting> =
        serde_json::from_value(postings_fixture()).expect("fixture parses");
    let source = StaticSource {
        postings,
        zip_cantons: HashMap::from([("8000".to_string(), "ZH".to_string())]),
    };
    let configured = vec![
        "Metallbauer/-in (Metallbau) EFZ".to_string(),
        "Metallbaukonstrukteur/-in EFZ".to_string(),
        "Metallbaupraktiker/-in EBA".to_string(),
    ];

    let dataset = load_dataset(&source, Some(configured.clone()))
        .await
        .expect("dataset loads");

    assert_eq!(dataset.profession_options(), configured.as_slice());
    let state = LoadState::from_result(Ok(dataset));
    assert!(state.is_ready());
    assert_eq!(state.dataset().map(|d| d.len()), Some(2));
}

/// Serves the fixtures over HTTP on an ephemeral port; any other path answers 404.
async fn serve_fixtures() -> String {
    let app = Router::new()
        .route("/berufsberatung.json", get(|| async { Json(postings_fixture()) }))
        .route(
            "/zipToCanton.json",
            get(|| async { Json(json!({ "8000": "ZH", "3000": "BE" })) }),
        );
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("fixture server runs");
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn loads_dataset_over_http() {
    let base = serve_fixtures().await;
    let source = JsonSource::new(
        DataLocation::parse(&format!("{base}/berufsberatung.json")),
        DataLocation::parse(&format!("{base}/zipToCanton.json")),
    );

    let dataset = load_dataset(&source, None).await.expect("dataset loads");

    assert_eq!(dataset.len(), 2);
    assert_eq!(dataset.cantons().canton_of("3000"), Some("BE"));
    assert_eq!(dataset.postings()[0].location.zip_code, "8000");
}

#[tokio::test]
async fn non_success_status_is_reported() {
    let base = serve_fixtures().await;
    let source = JsonSource::new(
        DataLocation::parse(&format!("{base}/berufsberatung.json")),
        DataLocation::parse(&format!("{base}/missing.json")),
    );

    let err = load_dataset(&source, None).await.expect_err("load fails");

    assert!(matches!(err, SourceError::Status { status: 404, .. }));
    assert!(err.to_string().starts_with("network response was not ok"));
}
