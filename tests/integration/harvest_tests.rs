//! Integration tests for the harvest loop
//!
//! These tests use wiremock to stand in for the iNaturalist and GBIF APIs
//! and for the image hosts, and check what ends up on disk.

use serde_json::json;
use specimen_harvest::config::{Config, DownloadConfig, HttpConfig, SourcesConfig, SpeciesEntry};
use specimen_harvest::harvest::{build_http_client, harvest, run_downloads, RunOptions, Target};
use specimen_harvest::{GbifSource, INaturalistSource, StopReason};
use std::io::Cursor;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client() -> reqwest::Client {
    build_http_client(&HttpConfig {
        user_agent: "TestHarvester/1.0".to_string(),
        timeout_secs: 5,
    })
    .expect("Failed to build client")
}

/// Encodes a small solid-colour PNG
fn png_bytes() -> Vec<u8> {
    let image = image::RgbImage::from_pixel(8, 6, image::Rgb([40, 140, 60]));
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, image::ImageFormat::Png)
        .expect("Failed to encode PNG");
    buffer.into_inner()
}

fn inat_page(base_url: &str, photo_ids: &[u32]) -> serde_json::Value {
    let results: Vec<_> = photo_ids
        .iter()
        .map(|id| {
            json!({
                "id": id,
                "photos": [{ "id": id, "url": format!("{}/photos/{}/square.jpg", base_url, id) }]
            })
        })
        .collect();
    let total = results.len();
    json!({ "total_results": total, "page": 1, "results": results })
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("Failed to read output dir")
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

async fn mount_images(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path_regex(r"^/photos/\d+/original\.jpg$"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png_bytes()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_single_page_reaches_target_without_second_request() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/v1/observations"))
        .and(query_param("taxon_name", "Glaux maritima"))
        .and(query_param("photos", "true"))
        .and(query_param("per_page", "100"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(inat_page(&base_url, &[1, 2, 3, 4, 5])))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/observations"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": [] })))
        .expect(0)
        .mount(&mock_server)
        .await;

    mount_images(&mock_server).await;

    let tmp = TempDir::new().unwrap();
    let target = Target::new("Glaux maritima", None, tmp.path().join("Glaux_maritima"));
    let source = INaturalistSource::new(base_url.as_str());

    let summary = harvest(&test_client(), &source, &target, 5)
        .await
        .expect("Harvest failed");

    assert_eq!(summary.persisted, 5);
    assert_eq!(summary.stop_reason, StopReason::TargetReached);
    assert_eq!(summary.pages_fetched, 1);
    assert_eq!(
        file_names(&target.output_dir),
        vec![
            "Glaux_maritima_0.jpg",
            "Glaux_maritima_1.jpg",
            "Glaux_maritima_2.jpg",
            "Glaux_maritima_3.jpg",
            "Glaux_maritima_4.jpg",
        ]
    );

    let saved = image::open(target.output_dir.join("Glaux_maritima_0.jpg")).unwrap();
    assert_eq!((saved.width(), saved.height()), (8, 6));
}

#[tokio::test]
async fn test_resume_continues_after_highest_index() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/v1/observations"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(inat_page(&base_url, &[10, 11, 12])))
        .mount(&mock_server)
        .await;

    mount_images(&mock_server).await;

    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("X_0.jpg"), b"existing zero").unwrap();
    std::fs::write(tmp.path().join("X_2.jpg"), b"existing two").unwrap();

    let target = Target::new("X", None, tmp.path());
    let source = INaturalistSource::new(base_url.as_str());

    let summary = harvest(&test_client(), &source, &target, 5)
        .await
        .expect("Harvest failed");

    assert_eq!(summary.starting_index, 3);
    assert_eq!(summary.persisted, 5);
    assert_eq!(summary.new_artifacts(), 2);
    assert_eq!(
        file_names(tmp.path()),
        vec!["X_0.jpg", "X_2.jpg", "X_3.jpg", "X_4.jpg"]
    );

    // Pre-existing files are untouched
    assert_eq!(std::fs::read(tmp.path().join("X_0.jpg")).unwrap(), b"existing zero");
    assert_eq!(std::fs::read(tmp.path().join("X_2.jpg")).unwrap(), b"existing two");
}

#[tokio::test]
async fn test_bad_artifacts_are_skipped() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/v1/occurrence/search"))
        .and(query_param("mediaType", "StillImage"))
        .and(query_param("taxonKey", "5414349"))
        .and(query_param("limit", "300"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "offset": 0,
            "limit": 300,
            "results": [
                { "key": 1, "media": [
                    { "type": "StillImage", "identifier": format!("{}/img/good-1.png", base_url) },
                    { "type": "StillImage", "identifier": format!("{}/img/garbage.png", base_url) }
                ]},
                { "key": 2, "media": [
                    { "type": "StillImage", "identifier": format!("{}/img/missing.png", base_url) }
                ]},
                { "key": 3 },
                { "key": 4, "media": [
                    { "type": "StillImage", "identifier": format!("{}/img/good-2.png", base_url) }
                ]}
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/occurrence/search"))
        .and(query_param("offset", "300"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": [] })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/img/good-\d\.png$"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png_bytes()))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/img/garbage.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"definitely not an image".to_vec()))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/img/missing.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let tmp = TempDir::new().unwrap();
    let target = Target::new("Glaux maritima", Some(5414349), tmp.path());
    let source = GbifSource::new(base_url.as_str());

    let summary = harvest(&test_client(), &source, &target, 10)
        .await
        .expect("Harvest failed");

    assert_eq!(summary.persisted, 2);
    assert_eq!(summary.skipped, 2);
    assert_eq!(summary.stop_reason, StopReason::SourceExhausted);
    assert_eq!(
        file_names(tmp.path()),
        vec!["Glaux_maritima_0.jpg", "Glaux_maritima_1.jpg"]
    );
}

#[tokio::test]
async fn test_slow_artifact_times_out_and_is_skipped() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/v1/occurrence/search"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{ "key": 1, "media": [
                { "identifier": format!("{}/img/fast-1.png", base_url) },
                { "identifier": format!("{}/img/slow.png", base_url) },
                { "identifier": format!("{}/img/fast-2.png", base_url) }
            ]}]
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/occurrence/search"))
        .and(query_param("offset", "300"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": [] })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/img/slow.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(png_bytes())
                .set_delay(Duration::from_secs(3)),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/img/fast-\d\.png$"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png_bytes()))
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = build_http_client(&HttpConfig {
        user_agent: "TestHarvester/1.0".to_string(),
        timeout_secs: 1,
    })
    .expect("Failed to build client");

    let tmp = TempDir::new().unwrap();
    let target = Target::new("X", Some(5414349), tmp.path());
    let source = GbifSource::new(base_url.as_str());

    let summary = harvest(&client, &source, &target, 10)
        .await
        .expect("Harvest failed");

    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.persisted, 2);
    assert_eq!(summary.stop_reason, StopReason::SourceExhausted);
    assert_eq!(file_names(tmp.path()), vec!["X_0.jpg", "X_1.jpg"]);
}

#[tokio::test]
async fn test_page_error_keeps_partial_results() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/v1/observations"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(inat_page(&base_url, &[1, 2])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/observations"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/observations"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(inat_page(&base_url, &[3])))
        .expect(0)
        .mount(&mock_server)
        .await;

    mount_images(&mock_server).await;

    let tmp = TempDir::new().unwrap();
    let target = Target::new("X", None, tmp.path());
    let source = INaturalistSource::new(base_url.as_str());

    let summary = harvest(&test_client(), &source, &target, 10)
        .await
        .expect("Harvest failed");

    assert_eq!(summary.persisted, 2);
    assert_eq!(summary.pages_fetched, 1);
    assert!(matches!(summary.stop_reason, StopReason::PageError(_)));
    assert_eq!(file_names(tmp.path()), vec!["X_0.jpg", "X_1.jpg"]);
}

#[tokio::test]
async fn test_unparsable_page_is_fatal() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/observations"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let tmp = TempDir::new().unwrap();
    let target = Target::new("X", None, tmp.path());
    let source = INaturalistSource::new(mock_server.uri());

    let summary = harvest(&test_client(), &source, &target, 10)
        .await
        .expect("Harvest failed");

    assert_eq!(summary.persisted, 0);
    assert!(matches!(summary.stop_reason, StopReason::PageError(_)));
    assert!(file_names(tmp.path()).is_empty());
}

#[tokio::test]
async fn test_run_downloads_sources_share_directory() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/v1/observations"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(inat_page(&base_url, &[1, 2])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/observations"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": [] })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/occurrence/search"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{ "media": [
                { "identifier": format!("{}/photos/7/original.jpg", base_url) },
                { "identifier": format!("{}/photos/8/original.jpg", base_url) }
            ]}]
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/occurrence/search"))
        .and(query_param("offset", "300"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": [] })))
        .mount(&mock_server)
        .await;

    mount_images(&mock_server).await;

    let tmp = TempDir::new().unwrap();
    let config = Config {
        http: HttpConfig {
            user_agent: "TestHarvester/1.0".to_string(),
            timeout_secs: 5,
        },
        download: DownloadConfig {
            output_root: tmp.path().to_string_lossy().into_owned(),
            max_images_per_source: 10,
        },
        sources: SourcesConfig {
            inaturalist: true,
            gbif: true,
            inaturalist_url: base_url.clone(),
            gbif_url: base_url.clone(),
        },
        species: vec![SpeciesEntry {
            name: "Spartina maritima".to_string(),
            gbif_taxon_key: Some(2704689),
        }],
    };

    let reports = run_downloads(&config, &RunOptions::default())
        .await
        .expect("Downloads failed");

    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].summary.starting_index, 0);
    assert_eq!(reports[0].summary.persisted, 2);
    assert_eq!(reports[1].summary.starting_index, 2);
    assert_eq!(reports[1].summary.persisted, 4);

    assert_eq!(
        file_names(&tmp.path().join("Spartina_maritima")),
        vec![
            "Spartina_maritima_0.jpg",
            "Spartina_maritima_1.jpg",
            "Spartina_maritima_2.jpg",
            "Spartina_maritima_3.jpg",
        ]
    );
}
