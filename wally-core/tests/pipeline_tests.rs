//! End-to-end pipeline runs against a mocked page and a mocked desktop.

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Local;
use tokio::sync::Notify;
use url::Url;
use wally_core::{
    Config, FetchError, HttpClient, MockBackend, MockClient, RunOutcome, RunReport, UpdateError,
    UpdatePipeline,
};

const PAGE_URL: &str = "https://apod.example/apod/astropix.html";
const IMAGE_URL: &str = "https://apod.example/apod/image/2608/veil_big.png";

const PAGE_HTML: &str = r#"<html>
<head>
<title> APOD: 2026 August 25 - The Veil Nebula  </title>
</head>
<body>
<center>
<a href="image/2608/veil_big.png">
<img src="image/2608/veil_small.png" alt="See Explanation.">
</a>
</center>
<p>
<b> Explanation: </b>
Delicate filaments of shocked gas drift through the night sky.
</p>
</body>
</html>"#;

fn config(dir: &Path) -> Config {
    Config {
        base_url: Url::parse("https://apod.example/apod/").unwrap(),
        page_url: Url::parse(PAGE_URL).unwrap(),
        download_dir: dir.to_path_buf(),
        timeout: Duration::from_secs(30),
        user_agent: "wally-test".to_string(),
        set_wallpaper: true,
    }
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]));
    let mut bytes = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut bytes, image::ImageFormat::Png)
        .unwrap();
    bytes.into_inner()
}

fn stocked_client() -> MockClient {
    MockClient::new()
        .with_html(PAGE_URL, PAGE_HTML)
        .with_bytes(IMAGE_URL, png_bytes(800, 600))
}

#[tokio::test]
async fn first_run_applies_and_records() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = UpdatePipeline::new(stocked_client(), MockBackend::new(), config(dir.path()));

    let outcome = pipeline.run(false).await.unwrap();
    let RunOutcome::Applied { path, record } = outcome else {
        panic!("expected an applied outcome");
    };
    assert_eq!(path, dir.path().join("veil_big.png"));
    assert_eq!(record.url, IMAGE_URL);
    assert_eq!(record.title.as_deref(), Some("APOD: 2026 August 25 - The Veil Nebula"));

    // Marker files reflect the applied picture.
    let last_image = std::fs::read_to_string(dir.path().join("last_image.txt")).unwrap();
    assert_eq!(last_image.trim(), IMAGE_URL);
    let last_update = std::fs::read_to_string(dir.path().join("last_update.txt")).unwrap();
    assert_eq!(
        last_update.trim(),
        Local::now().date_naive().format("%Y-%m-%d").to_string()
    );

    // Image and sidecar landed in the managed directory.
    assert!(path.exists());
    let sidecar = dir
        .path()
        .join(format!("apod_{}.txt", Local::now().date_naive().format("%Y-%m-%d")));
    let sidecar_text = std::fs::read_to_string(sidecar).unwrap();
    assert!(sidecar_text.contains("Title: APOD: 2026 August 25 - The Veil Nebula"));
    assert!(sidecar_text.contains("URL: https://apod.example/apod/astropix.html"));
}

#[tokio::test]
async fn second_run_is_a_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let backend = MockBackend::new();
    let pipeline = UpdatePipeline::new(stocked_client(), backend, config(dir.path()));

    assert!(matches!(
        pipeline.run(false).await.unwrap(),
        RunOutcome::Applied { .. }
    ));
    assert!(matches!(
        pipeline.run(false).await.unwrap(),
        RunOutcome::Skipped
    ));
}

#[tokio::test]
async fn force_reapplies_an_unchanged_picture() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = UpdatePipeline::new(stocked_client(), MockBackend::new(), config(dir.path()));

    assert!(matches!(
        pipeline.run(false).await.unwrap(),
        RunOutcome::Applied { .. }
    ));
    assert!(matches!(
        pipeline.run(true).await.unwrap(),
        RunOutcome::Applied { .. }
    ));
}

#[tokio::test]
async fn unreachable_page_leaves_no_trace() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = UpdatePipeline::new(MockClient::new(), MockBackend::new(), config(dir.path()));

    let err = pipeline.run(false).await.unwrap_err();
    assert!(matches!(err, UpdateError::Fetch(_)));
    let report = RunReport::from_result(&Err(err));
    assert!(!report.success);
    assert_eq!(report.state, "fetch_failed");

    // Nothing was written.
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn missing_image_is_a_download_failure() {
    let dir = tempfile::tempdir().unwrap();
    let client = MockClient::new()
        .with_html(PAGE_URL, PAGE_HTML)
        .with_status(IMAGE_URL, 404);
    let pipeline = UpdatePipeline::new(client, MockBackend::new(), config(dir.path()));

    let err = pipeline.run(false).await.unwrap_err();
    let report = RunReport::from_result(&Err(err));
    assert_eq!(report.state, "download_failed");
    assert!(!dir.path().join("last_image.txt").exists());
}

#[tokio::test]
async fn undersized_image_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let client = MockClient::new()
        .with_html(PAGE_URL, PAGE_HTML)
        .with_bytes(IMAGE_URL, png_bytes(799, 600));
    let pipeline = UpdatePipeline::new(client, MockBackend::new(), config(dir.path()));

    let err = pipeline.run(false).await.unwrap_err();
    let report = RunReport::from_result(&Err(err));
    assert_eq!(report.state, "validation_failed");

    // The undersized image was neither stored nor recorded.
    assert!(!dir.path().join("veil_big.png").exists());
    assert!(!dir.path().join("last_image.txt").exists());
}

#[tokio::test]
async fn failed_apply_leaves_the_marker_unset() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = UpdatePipeline::new(
        stocked_client(),
        MockBackend::failing(),
        config(dir.path()),
    );

    let err = pipeline.run(false).await.unwrap_err();
    let report = RunReport::from_result(&Err(err));
    assert_eq!(report.state, "apply_failed");

    // A failed apply must not look like a success on the next run.
    assert!(!dir.path().join("last_image.txt").exists());
}

#[tokio::test]
async fn disabled_wallpaper_still_records_the_update() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(dir.path());
    config.set_wallpaper = false;
    let backend = MockBackend::new();
    let pipeline = UpdatePipeline::new(stocked_client(), backend, config);

    assert!(matches!(
        pipeline.run(false).await.unwrap(),
        RunOutcome::Applied { .. }
    ));
    assert!(dir.path().join("last_image.txt").exists());
}

#[tokio::test]
async fn externally_changed_wallpaper_forces_a_refresh() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = UpdatePipeline::new(stocked_client(), MockBackend::new(), config(dir.path()));
    assert!(matches!(
        pipeline.run(false).await.unwrap(),
        RunOutcome::Applied { .. }
    ));

    // Same marker, but the desktop now shows something unmanaged.
    let backend = MockBackend::with_current("/home/me/vacation.jpg");
    let pipeline = UpdatePipeline::new(stocked_client(), backend, config(dir.path()));
    let outcome = pipeline.run(false).await.unwrap();
    assert!(matches!(outcome, RunOutcome::Applied { .. }));
}

/// Client whose page fetch parks until the test releases it, pinning a
/// run mid-flight.
struct GatedClient {
    inner: MockClient,
    gate: Arc<Notify>,
}

#[async_trait]
impl HttpClient for GatedClient {
    async fn fetch_html(&self, url: &str) -> Result<String, FetchError> {
        self.gate.notified().await;
        self.inner.fetch_html(url).await
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.inner.fetch_bytes(url).await
    }
}

#[tokio::test]
async fn overlapping_runs_coalesce() {
    let dir = tempfile::tempdir().unwrap();
    let gate = Arc::new(Notify::new());
    let client = GatedClient {
        inner: stocked_client(),
        gate: Arc::clone(&gate),
    };
    let pipeline = Arc::new(UpdatePipeline::new(
        client,
        MockBackend::new(),
        config(dir.path()),
    ));

    let first = tokio::spawn({
        let pipeline = Arc::clone(&pipeline);
        async move { pipeline.run(false).await }
    });
    // Let the first run claim the guard and park on the gated fetch.
    tokio::task::yield_now().await;

    // A second trigger while the run is in flight is coalesced, not queued.
    let second = pipeline.run(false).await.unwrap();
    assert!(matches!(second, RunOutcome::AlreadyRunning));
    assert_eq!(RunReport::from_result(&Ok(second)).state, "already_running");

    gate.notify_one();
    let outcome = first.await.unwrap().unwrap();
    assert!(matches!(outcome, RunOutcome::Applied { .. }));

    // The guard is released once the run finishes; the next trigger is
    // gated only by freshness.
    gate.notify_one();
    assert!(matches!(
        pipeline.run(false).await.unwrap(),
        RunOutcome::Skipped
    ));
}

#[tokio::test]
async fn page_without_an_image_link_is_a_fetch_error() {
    let dir = tempfile::tempdir().unwrap();
    let client = MockClient::new().with_html(PAGE_URL, "<html><body><p>maintenance</p></body></html>");
    let pipeline = UpdatePipeline::new(client, MockBackend::new(), config(dir.path()));

    let err = pipeline.run(false).await.unwrap_err();
    assert!(matches!(
        err,
        UpdateError::Fetch(FetchError::NoImageLink)
    ));
}
