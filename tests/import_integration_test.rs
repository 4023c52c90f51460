use health_csv_import::adapters::file_store::JsonFileStore;
use health_csv_import::domain::ports::required_permissions;
use health_csv_import::{
    DerivedMetricEntry, HttpHealthStore, ImportEngine, ImportError, LocalStorage, MetricKind,
    TomlConfig,
};
use httpmock::prelude::*;
use std::time::Duration;
use tempfile::TempDir;

const BODY_CSV: &str = "time,weight,height,bmi,fatRate,bodyWaterRate,boneMass,metabolism,muscleRate,visceralFat
2024-04-29 12:12:32+0000,77.8,170.0,26.9,25.966814,50.786766,2.9319906,1564.0,54.66583,12.0
2024-04-29 12:21:07+0000,75.0,170.0,25.9,null,null,null,null,null,null

2024-04-30 07:02:11+0900,,170.0,25.9,20.1,50.0,2.9,1500,50.0,11.0
2024-04-30 07:05:40+0900,76.2,170.0,26.3
2024-05-01 07:10:00+0900,76.0,171.0,26.0,130.0,50.0,2.9,1500,50.0,11.0
";

fn write_input(temp_dir: &TempDir) -> String {
    let path = temp_dir.path().join("body.csv");
    std::fs::write(&path, BODY_CSV).unwrap();
    path.to_str().unwrap().to_string()
}

#[tokio::test]
async fn test_end_to_end_import_over_http() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_input(&temp_dir);

    let server = MockServer::start_async().await;
    let permissions_mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/permissions");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({ "granted": required_permissions() }));
        })
        .await;
    let insert_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/records")
                .body_contains("\"lean_body_mass\"")
                .body_contains("\"zone_offset_seconds\":0");
            then.status(200);
        })
        .await;

    let store = HttpHealthStore::new(&server.url("/api"), Some("token".to_string()), Duration::from_secs(5)).unwrap();
    let engine = ImportEngine::new(LocalStorage::new(temp_dir.path()), store);

    let outcome = engine.run(&input).await.unwrap();

    permissions_mock.assert_async().await;
    insert_mock.assert_async().await;

    // 三筆有效列：兩筆成功，一筆體脂率超出範圍
    assert!(outcome.is_success);
    assert_eq!(outcome.total_records, 3);
    assert_eq!(outcome.successful_records, 2);
    assert_eq!(outcome.failed_records, 1);
    assert_eq!(outcome.errors.len(), 1);
    assert!(outcome.errors[0].starts_with("Error processing data at 2024-05-01T07:10:00+09:00"));
}

#[tokio::test]
async fn test_rejected_batch_marks_every_record_failed() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_input(&temp_dir);

    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/permissions");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({ "granted": required_permissions() }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/records");
            then.status(503).body("maintenance");
        })
        .await;

    let store = HttpHealthStore::new(&server.base_url(), None, Duration::from_secs(5)).unwrap();
    let engine = ImportEngine::new(LocalStorage::new(temp_dir.path()), store);

    let outcome = engine.run(&input).await.unwrap();

    assert!(!outcome.is_success);
    assert_eq!(outcome.total_records, 3);
    assert_eq!(outcome.successful_records, 0);
    assert_eq!(outcome.failed_records, 3);
    assert_eq!(outcome.errors.len(), 1);
    assert!(outcome.errors[0].contains("maintenance"));
}

#[tokio::test]
async fn test_missing_permissions_stop_before_submission() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_input(&temp_dir);

    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/permissions");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({ "granted": ["WRITE_WEIGHT"] }));
        })
        .await;
    let insert_mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/records");
            then.status(200);
        })
        .await;

    let store = HttpHealthStore::new(&server.base_url(), None, Duration::from_secs(5)).unwrap();
    let engine = ImportEngine::new(LocalStorage::new(temp_dir.path()), store);

    let err = engine.run(&input).await.unwrap_err();

    assert!(matches!(err, ImportError::PermissionDenied { ref missing } if missing.len() == 11));
    assert_eq!(insert_mock.hits_async().await, 0);
}

#[tokio::test]
async fn test_end_to_end_import_to_json_file() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_input(&temp_dir);
    let output_dir = temp_dir.path().join("output");

    let store = JsonFileStore::new(LocalStorage::new(&output_dir), "health_records.json");
    let engine = ImportEngine::new(LocalStorage::new(temp_dir.path()), store);

    let outcome = engine.run(&input).await.unwrap();
    assert!(outcome.is_success);
    assert_eq!(outcome.successful_records, 2);

    let written = std::fs::read(output_dir.join("health_records.json")).unwrap();
    let entries: Vec<DerivedMetricEntry> = serde_json::from_slice(&written).unwrap();
    assert_eq!(entries.len(), 12);

    let heights: Vec<f64> = entries
        .iter()
        .filter(|e| e.kind == MetricKind::Height)
        .map(|e| e.value)
        .collect();
    assert!(heights.iter().all(|h| (h - 1.70).abs() < 1e-9));

    let lean: Vec<f64> = entries
        .iter()
        .filter(|e| e.kind == MetricKind::LeanBodyMass)
        .map(|e| e.value)
        .collect();
    assert!((lean[0] - 77.8 * 0.5466583).abs() < 1e-9);
    assert_eq!(lean[1], 0.0);
}

#[tokio::test]
async fn test_store_built_from_toml_config() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_input(&temp_dir);
    let output_dir = temp_dir.path().join("toml-output");

    let toml_content = format!(
        r#"
[source]
path = "{}"

[sink]
type = "file"
output_path = "{}"
file_name = "records.json"
"#,
        input.replace('\\', "\\\\"),
        output_dir.to_str().unwrap().replace('\\', "\\\\")
    );
    let config = TomlConfig::from_toml_str(&toml_content).unwrap();

    let store = health_csv_import::StoreBackend::from_config(&config).unwrap();
    assert_eq!(store.describe(), "file");

    let engine = ImportEngine::new(LocalStorage::new("."), store);
    let outcome = engine
        .run(health_csv_import::core::ConfigProvider::input_path(&config))
        .await
        .unwrap();

    assert_eq!(outcome.successful_records, 2);
    assert!(output_dir.join("records.json").exists());
}
