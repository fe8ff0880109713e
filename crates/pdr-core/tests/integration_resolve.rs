//! Integration test: resolve landing pages served by a local HTTP server through
//! the real libcurl fetcher and probes, with the cache in a temp dir.

mod common;

use common::landing_server::{self, LandingServer, Route};
use pdr_core::catalog;
use pdr_core::config::{PdrConfig, RetryConfig};
use pdr_core::fetch::{PageFetcher, PageSource};
use pdr_core::probe::{AssetProbe, CurlProbe, ProbeMethod, SNIFF_BYTES};
use pdr_core::report::{refresh, EntryStatus};
use pdr_core::retry::NetworkError;
use pdr_core::{
    AssetFormat, ResolutionError, ResolveOptions, Resolver, Validation, ValidationErrorCode,
};
use std::sync::Arc;
use tempfile::{tempdir, TempDir};

const XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

fn test_config(dir: &TempDir) -> PdrConfig {
    let mut cfg = PdrConfig {
        cache_path: Some(dir.path().join("resolution_cache.json")),
        retry: Some(RetryConfig {
            max_attempts: 2,
            base_delay_secs: 0.01,
            max_delay_secs: 1,
        }),
        ..PdrConfig::default()
    };
    cfg.http.timeout_secs = 5;
    cfg.http.probe_timeout_secs = 5;
    cfg.http.connect_timeout_secs = 2;
    cfg
}

fn resolver(dir: &TempDir) -> Resolver {
    Resolver::from_config(&test_config(dir)).unwrap()
}

const REPORT_PAGE: &str = r#"<!DOCTYPE html>
<html><head><title>Housing Starts | Stats Office</title></head>
<body>
  <table>
    <tr><th>Table</th><th>Download</th></tr>
    <tr><td>Housing starts report</td><td><a href="/files/report.xlsx">Excel</a></td></tr>
    <tr><td>Housing starts report</td><td><a href="/files/report.csv">CSV</a></td></tr>
  </table>
  <a href="/files/archive.zip">Archive</a>
</body></html>"#;

fn serve_report(server: &LandingServer) {
    server.route("/housing", Route::html(REPORT_PAGE));
    server.route("/files/report.xlsx", Route::file(XLSX, b"PK\x03\x04xlsx"));
    server.route("/files/report.csv", Route::file("text/csv", b"year,starts\n2024,10\n"));
    server.route("/files/archive.zip", Route::redirect("/error.html"));
    server.route(
        "/error.html",
        Route::html("<html><body>The requested file was moved.</body></html>"),
    );
}

#[tokio::test]
async fn resolves_and_excludes_zip_redirecting_to_html() {
    let server = landing_server::start();
    serve_report(&server);
    let dir = tempdir().unwrap();
    let resolver = resolver(&dir);
    let landing = server.url("/housing");

    let resolution = resolver
        .resolve_report(&landing, ResolveOptions::default())
        .await
        .unwrap();

    assert!(!resolution.from_cache);
    assert_eq!(resolution.assets.len(), 2);
    assert_eq!(resolution.assets[0].url, server.url("/files/report.xlsx"));
    assert_eq!(resolution.assets[0].rank, 1);
    assert_eq!(resolution.assets[0].format, AssetFormat::Xlsx);
    assert_eq!(resolution.assets[0].validated, Validation::Passed);
    assert_eq!(resolution.assets[0].title, "Excel");
    assert_eq!(resolution.assets[1].url, server.url("/files/report.csv"));
    assert_eq!(resolution.assets[1].rank, 2);
    assert_eq!(resolution.assets[1].validated, Validation::Passed);

    assert_eq!(resolution.rejected.len(), 1);
    assert_eq!(resolution.rejected[0].url, server.url("/files/archive.zip"));
    assert_eq!(
        resolution.rejected[0].validation_error,
        Some(ValidationErrorCode::HtmlResponse)
    );

    let raw = std::fs::read_to_string(dir.path().join("resolution_cache.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let cached = json[landing.as_str()]["assets"].as_array().unwrap();
    assert_eq!(cached.len(), 2);
    assert_eq!(cached[0]["validated"], true);
    assert!(json[landing.as_str()]["resolvedAt"].is_string());
}

#[tokio::test]
async fn cached_resolution_reprobes_only_top_asset() {
    let server = landing_server::start();
    serve_report(&server);
    let dir = tempdir().unwrap();
    let resolver = resolver(&dir);
    let landing = server.url("/housing");

    resolver.resolve(&landing, ResolveOptions::default()).await.unwrap();
    let csv_probes = server.count("HEAD", "/files/report.csv");

    let again = resolver
        .resolve_report(&landing, ResolveOptions::default())
        .await
        .unwrap();
    assert!(again.from_cache);
    assert_eq!(server.count("GET", "/housing"), 1);
    assert_eq!(server.count("HEAD", "/files/report.xlsx"), 2);
    assert_eq!(server.count("HEAD", "/files/report.csv"), csv_probes);
}

#[tokio::test]
async fn page_without_data_links_is_no_candidates() {
    let server = landing_server::start();
    server.route(
        "/moved",
        Route::html("<html><body><p>See <a href='/new-home'>our new site</a>.</p></body></html>"),
    );
    let dir = tempdir().unwrap();
    let err = resolver(&dir)
        .resolve(&server.url("/moved"), ResolveOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ResolutionError::NoCandidates { .. }));
    assert!(!dir.path().join("resolution_cache.json").exists());
}

#[tokio::test]
async fn missing_landing_page_is_network_error() {
    let server = landing_server::start();
    let dir = tempdir().unwrap();
    let err = resolver(&dir)
        .resolve(&server.url("/nope"), ResolveOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.reason_code(), "network");
    assert!(matches!(
        err,
        ResolutionError::Network {
            source: NetworkError::HttpStatus { status: 404, .. },
            ..
        }
    ));
    // 404 is not retried.
    assert_eq!(server.count("GET", "/nope"), 1);
}

#[tokio::test]
async fn server_errors_are_retried() {
    let server = landing_server::start();
    server.route("/flaky", Route::status(500));
    let dir = tempdir().unwrap();
    let err = resolver(&dir)
        .resolve(&server.url("/flaky"), ResolveOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.reason_code(), "network");
    assert_eq!(server.count("GET", "/flaky"), 2);
}

#[tokio::test]
async fn stale_top_asset_triggers_fresh_resolution() {
    let server = landing_server::start();
    server.route("/rents", Route::html(r#"<a href="/files/rents-2024.xlsx">Rents 2024</a>"#));
    server.route("/files/rents-2024.xlsx", Route::file(XLSX, b"PK"));
    let dir = tempdir().unwrap();
    let resolver = resolver(&dir);
    let landing = server.url("/rents");

    let first = resolver.resolve(&landing, ResolveOptions::default()).await.unwrap();
    assert_eq!(first[0].url, server.url("/files/rents-2024.xlsx"));

    // Publisher rotates the file: old URL now 404s, page links the new one.
    server.route("/files/rents-2024.xlsx", Route::status(404));
    server.route("/rents", Route::html(r#"<a href="/files/rents-2025.xlsx">Rents 2025</a>"#));
    server.route("/files/rents-2025.xlsx", Route::file(XLSX, b"PK"));

    let second = resolver
        .resolve_report(&landing, ResolveOptions::default())
        .await
        .unwrap();
    assert!(!second.from_cache);
    assert_eq!(second.assets[0].url, server.url("/files/rents-2025.xlsx"));
    assert_eq!(server.count("GET", "/rents"), 2);

    let cached = resolver.cache().get(&landing).await.unwrap();
    assert_eq!(cached.assets.len(), 1);
    assert_eq!(cached.assets[0].url, server.url("/files/rents-2025.xlsx"));
}

#[tokio::test]
async fn head_rejection_falls_back_to_partial_get() {
    let server = landing_server::start();
    let zip_bytes: Vec<u8> = b"PK\x03\x04".iter().copied().cycle().take(8 * 1024).collect();
    server.route(
        "/tables",
        Route::html(
            r#"<a href="/t/a.csv">A</a>
               <a href="/t/b.zip">B</a>
               <a href="/t/c.xlsx">C</a>"#,
        ),
    );
    server.route("/t/a.csv", Route::file("text/csv", b"a,b\n1,2\n").without_head());
    server.route("/t/b.zip", Route::untyped(&zip_bytes));
    server.route(
        "/t/c.xlsx",
        Route::untyped(b"<!DOCTYPE html><html><body>Login required</body></html>"),
    );
    let dir = tempdir().unwrap();
    let resolution = resolver(&dir)
        .resolve_report(&server.url("/tables"), ResolveOptions::default())
        .await
        .unwrap();

    let urls: Vec<&str> = resolution.assets.iter().map(|a| a.url.as_str()).collect();
    assert_eq!(urls, vec![server.url("/t/a.csv"), server.url("/t/b.zip")]);
    assert_eq!(resolution.rejected.len(), 1);
    assert_eq!(
        resolution.rejected[0].validation_error,
        Some(ValidationErrorCode::HtmlResponse)
    );
    assert_eq!(server.count("GET", "/t/a.csv"), 1);
    assert_eq!(server.count("GET", "/t/b.zip"), 1);
}

#[test]
fn curl_probe_reports_final_url_length_and_method() {
    let server = landing_server::start();
    server.route("/dl/latest.csv", Route::redirect("/files/report.csv"));
    server.route("/files/report.csv", Route::file("text/csv", b"year,starts\n2024,10\n"));
    let zip_bytes: Vec<u8> = b"PK\x03\x04".iter().copied().cycle().take(8 * 1024).collect();
    server.route("/files/bundle.zip", Route::untyped(&zip_bytes));
    let dir = tempdir().unwrap();
    let probe = CurlProbe::new(&test_config(&dir).http);

    let head = probe.probe(&server.url("/dl/latest.csv")).unwrap();
    assert_eq!(head.method, ProbeMethod::Head);
    assert_eq!(head.status, 200);
    assert_eq!(head.final_url.as_deref(), Some(server.url("/files/report.csv").as_str()));
    assert_eq!(head.content_type.as_deref(), Some("text/csv"));
    assert_eq!(head.content_length, Some(20));
    assert!(head.sniff.is_empty());

    let partial = probe.probe(&server.url("/files/bundle.zip")).unwrap();
    assert_eq!(partial.method, ProbeMethod::PartialGet);
    assert_eq!(partial.status, 206);
    assert_eq!(partial.content_length, Some(SNIFF_BYTES as u64));
    assert_eq!(partial.sniff.len(), SNIFF_BYTES);
    assert!(partial.sniff.starts_with(b"PK\x03\x04"));
}

#[tokio::test]
async fn no_validate_returns_full_ranked_list() {
    let server = landing_server::start();
    serve_report(&server);
    let dir = tempdir().unwrap();
    let options = ResolveOptions {
        validate: false,
        use_cache: true,
    };
    let assets = resolver(&dir)
        .resolve(&server.url("/housing"), options)
        .await
        .unwrap();
    assert_eq!(assets.len(), 3);
    assert!(assets.iter().all(|a| a.validated == Validation::Skipped));
    assert_eq!(server.count("HEAD", "/files/archive.zip"), 0);
}

#[tokio::test]
async fn page_metadata_reads_title() {
    let server = landing_server::start();
    serve_report(&server);
    let dir = tempdir().unwrap();
    let meta = resolver(&dir)
        .page_metadata(&server.url("/housing"))
        .await
        .unwrap();
    assert_eq!(meta.title.as_deref(), Some("Housing Starts | Stats Office"));
}

#[tokio::test]
async fn refresh_reports_each_dataset_in_catalog_order() {
    let server = landing_server::start();
    serve_report(&server);
    server.route("/empty", Route::html("<p>nothing here</p>"));
    let catalog_toml = format!(
        r#"
        [[dataset]]
        id = "starts_csv"
        landing_url = "{base}/housing"
        filter = "csv"

        [[dataset]]
        id = "pinned"
        direct_url = "{base}/files/report.xlsx"

        [[dataset]]
        id = "broken"
        landing_url = "{base}/empty"

        [[dataset]]
        id = "gone"
        landing_url = "{base}/gone"
        "#,
        base = server.base()
    );
    let datasets = catalog::from_toml_str(&catalog_toml).unwrap();
    let dir = tempdir().unwrap();
    let report = refresh(Arc::new(resolver(&dir)), &datasets, ResolveOptions::default(), 3).await;

    let statuses: Vec<(&str, EntryStatus)> = report
        .entries
        .iter()
        .map(|e| (e.dataset_id.as_str(), e.status))
        .collect();
    assert_eq!(
        statuses,
        vec![
            ("starts_csv", EntryStatus::Resolved),
            ("pinned", EntryStatus::Pinned),
            ("broken", EntryStatus::ManualRequired),
            ("gone", EntryStatus::Error),
        ]
    );
    assert_eq!(report.entries[0].url.as_deref(), Some(server.url("/files/report.csv").as_str()));
    assert_eq!(report.entries[0].format, Some(AssetFormat::Csv));
    assert!(report.entries[2].notes.as_deref().unwrap().contains("no data-file links"));
    assert!(report.has_failures());
}

#[test]
fn fetcher_reports_connection_refused() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let dir = tempdir().unwrap();
    let cfg = test_config(&dir);
    let fetcher = PageFetcher::new(cfg.http.clone(), cfg.retry_policy());
    let err = fetcher
        .fetch(&format!("http://127.0.0.1:{}/page", port))
        .unwrap_err();
    assert!(matches!(err, NetworkError::Connection(_)), "got {:?}", err);
}
