//! Integration tests for the harvester
//!
//! These tests use wiremock to serve gallery pages and JPEG payloads and run
//! the full crawl loop end-to-end against a temporary output directory.

use image::{DynamicImage, GenericImageView, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::path::Path;
use sumi_harvest::config::Config;
use sumi_harvest::crawler::{harvest, Crawler, Termination};
use sumi_harvest::state::VisitedLedger;
use sumi_harvest::storage::{open_storage, ImageRecordStore, RunStatus};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration rooted in `dir` and starting at `start_url`
fn create_test_config(start_url: &str, dir: &Path) -> Config {
    let mut config = Config::default();
    config.crawler.start_url = start_url.to_string();
    config.crawler.concurrency_limit = 3;
    config.crawler.request_timeout = 5;
    config.output.image_directory = dir.join("images").display().to_string();
    config.output.database_path = dir.join("harvest.db").display().to_string();
    config.output.ledger_path = dir.join("visited_urls.txt").display().to_string();
    config
}

/// Solid-color JPEG; distinct shades give distinct content
fn jpeg_bytes(shade: u8, size: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(size, size, Rgb([shade, shade / 2, 255 - shade]));
    let mut cursor = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut cursor, ImageFormat::Jpeg)
        .unwrap();
    cursor.into_inner()
}

/// Listing page with the given images and numbered pager links
fn gallery_page(base: &str, images: &[&str], pager: &[(u32, &str)]) -> String {
    let imgs: String = images
        .iter()
        .map(|name| format!(r#"<li><img src="{}/img/{}" alt=""></li>"#, base, name))
        .collect();
    let links: String = pager
        .iter()
        .map(|(n, href)| format!(r#"<a class="pager__link" href="{}">{}</a>"#, href, n))
        .collect();
    format!(
        r#"<html><body><ul class="wallpapers">{}</ul><div class="pager">{}</div></body></html>"#,
        imgs, links
    )
}

async fn mount_page(server: &MockServer, route: &str, html: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

async fn mount_image(server: &MockServer, name: &str, body: Vec<u8>) {
    Mock::given(method("GET"))
        .and(path(format!("/img/{}", name)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(body)
                .insert_header("content-type", "image/jpeg"),
        )
        .mount(server)
        .await;
}

fn image_files(dir: &TempDir) -> Vec<std::path::PathBuf> {
    std::fs::read_dir(dir.path().join("images"))
        .map(|entries| entries.filter_map(Result::ok).map(|e| e.path()).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn test_quota_carries_across_pages() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        gallery_page(&base, &["a.jpg", "b.jpg", "c.jpg"], &[(1, "/"), (2, "/page2")]),
    )
    .await;
    mount_page(
        &server,
        "/page2",
        gallery_page(
            &base,
            &["d.jpg", "e.jpg", "f.jpg"],
            &[(1, "/"), (2, "/page2"), (3, "/page3")],
        ),
    )
    .await;
    for (i, name) in ["a.jpg", "b.jpg", "c.jpg", "d.jpg", "e.jpg", "f.jpg"]
        .iter()
        .enumerate()
    {
        mount_image(&server, name, jpeg_bytes(i as u8 * 40, 8)).await;
    }

    let dir = tempfile::tempdir().unwrap();
    let start_url = format!("{}/", base);
    let config = create_test_config(&start_url, dir.path());

    let report = harvest(config, 5).await.expect("harvest failed");

    assert_eq!(report.termination, Termination::QuotaSatisfied);
    assert_eq!(report.remaining_quota, 0);
    assert_eq!(report.totals.pages_processed, 2);
    assert_eq!(report.totals.links_found, 6);
    assert_eq!(report.totals.images_stored, 5);
    assert_eq!(image_files(&dir).len(), 5);

    let ledger = VisitedLedger::load(dir.path().join("visited_urls.txt")).unwrap();
    assert!(ledger.contains(&start_url));
    assert!(ledger.contains(&format!("{}/page2", base)));
    assert_eq!(ledger.len(), 2);

    let storage = open_storage(&dir.path().join("harvest.db")).unwrap();
    assert_eq!(storage.count_images().unwrap(), 5);
    let run = storage.get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.requested, 5);
    assert_eq!(run.pages_processed, 2);
    assert_eq!(run.images_stored, 5);
}

#[tokio::test]
async fn test_first_page_remainder_and_ledger() {
    let server = MockServer::start().await;
    let base = server.uri();

    // Page 1 offers 3 images and no pager: remainder 2, then the crawl stops
    mount_page(&server, "/", gallery_page(&base, &["a.jpg", "b.jpg", "c.jpg"], &[])).await;
    for (i, name) in ["a.jpg", "b.jpg", "c.jpg"].iter().enumerate() {
        mount_image(&server, name, jpeg_bytes(i as u8 * 70, 8)).await;
    }

    let dir = tempfile::tempdir().unwrap();
    let start_url = format!("{}/", base);
    let report = harvest(create_test_config(&start_url, dir.path()), 5)
        .await
        .unwrap();

    assert_eq!(report.remaining_quota, 2);
    assert_eq!(report.totals.images_stored, 3);
    assert_eq!(
        report.termination,
        Termination::NoMorePages { page_number: 2 }
    );

    let ledger = VisitedLedger::load(dir.path().join("visited_urls.txt")).unwrap();
    assert!(ledger.contains(&start_url));
}

#[tokio::test]
async fn test_visited_page_is_skipped() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        gallery_page(&base, &["old1.jpg", "old2.jpg"], &[(2, "/page2")]),
    )
    .await;
    mount_page(&server, "/page2", gallery_page(&base, &["new1.jpg", "new2.jpg"], &[])).await;

    // Images of the visited page must never be requested
    Mock::given(method("GET"))
        .and(path("/img/old1.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(jpeg_bytes(1, 8)))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/img/old2.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(jpeg_bytes(2, 8)))
        .expect(0)
        .mount(&server)
        .await;
    mount_image(&server, "new1.jpg", jpeg_bytes(100, 8)).await;
    mount_image(&server, "new2.jpg", jpeg_bytes(200, 8)).await;

    let dir = tempfile::tempdir().unwrap();
    let start_url = format!("{}/", base);
    std::fs::write(
        dir.path().join("visited_urls.txt"),
        format!("{}\n", start_url),
    )
    .unwrap();

    let report = harvest(create_test_config(&start_url, dir.path()), 2)
        .await
        .unwrap();

    assert_eq!(report.totals.pages_skipped, 1);
    assert_eq!(report.totals.pages_processed, 1);
    assert_eq!(report.totals.images_stored, 2);
    assert_eq!(report.termination, Termination::QuotaSatisfied);

    // The skipped page is not appended a second time
    let content = std::fs::read_to_string(dir.path().join("visited_urls.txt")).unwrap();
    assert_eq!(content.lines().filter(|l| *l == start_url).count(), 1);
}

#[tokio::test]
async fn test_no_pagination_link_ends_crawl() {
    let server = MockServer::start().await;
    let base = server.uri();

    // Pager only links back to page 1
    mount_page(&server, "/", gallery_page(&base, &["a.jpg"], &[(1, "/")])).await;
    mount_image(&server, "a.jpg", jpeg_bytes(5, 8)).await;

    let dir = tempfile::tempdir().unwrap();
    let report = harvest(create_test_config(&format!("{}/", base), dir.path()), 10)
        .await
        .unwrap();

    assert_eq!(
        report.termination,
        Termination::NoMorePages { page_number: 2 }
    );
    assert_eq!(report.remaining_quota, 9);
    assert_eq!(report.totals.pages_processed, 1);
}

#[tokio::test]
async fn test_dedup_across_runs() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", gallery_page(&base, &["a.jpg", "b.jpg"], &[])).await;
    mount_image(&server, "a.jpg", jpeg_bytes(30, 8)).await;
    mount_image(&server, "b.jpg", jpeg_bytes(60, 8)).await;

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&format!("{}/", base), dir.path());

    let first = harvest(config.clone(), 2).await.unwrap();
    assert_eq!(first.totals.images_stored, 2);

    // Forget the visited page so the same images are downloaded again
    std::fs::remove_file(dir.path().join("visited_urls.txt")).unwrap();

    let second = harvest(config, 2).await.unwrap();
    assert_eq!(second.totals.images_stored, 0);
    assert_eq!(second.totals.duplicates, 2);

    let storage = open_storage(&dir.path().join("harvest.db")).unwrap();
    assert_eq!(storage.count_images().unwrap(), 2);
    assert_eq!(storage.count_runs().unwrap(), 2);
    assert_eq!(image_files(&dir).len(), 2);
}

#[tokio::test]
async fn test_identical_images_from_different_urls() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        gallery_page(&base, &["one.jpg", "mirror.jpg", "other.jpg"], &[]),
    )
    .await;
    mount_image(&server, "one.jpg", jpeg_bytes(120, 8)).await;
    mount_image(&server, "mirror.jpg", jpeg_bytes(120, 8)).await;
    mount_image(&server, "other.jpg", jpeg_bytes(240, 8)).await;

    let dir = tempfile::tempdir().unwrap();
    let report = harvest(create_test_config(&format!("{}/", base), dir.path()), 3)
        .await
        .unwrap();

    assert_eq!(report.totals.images_stored, 2);
    assert_eq!(report.totals.duplicates, 1);
    assert_eq!(image_files(&dir).len(), 2);
}

#[tokio::test]
async fn test_failed_page_keeps_quota_and_is_not_recorded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let report = harvest(create_test_config(&format!("{}/", server.uri()), dir.path()), 4)
        .await
        .expect("page failures must not fail the harvest");

    assert_eq!(report.totals.pages_failed, 1);
    assert_eq!(report.totals.pages_processed, 0);
    assert_eq!(report.remaining_quota, 4);
    assert!(matches!(
        report.termination,
        Termination::PaginationFetchFailed { .. }
    ));

    let ledger = VisitedLedger::load(dir.path().join("visited_urls.txt")).unwrap();
    assert!(ledger.is_empty());
}

#[tokio::test]
async fn test_failed_images_still_consume_quota() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        gallery_page(&base, &["ok.jpg", "corrupt.jpg", "missing.jpg"], &[(2, "/page2")]),
    )
    .await;
    mount_page(&server, "/page2", gallery_page(&base, &["late.jpg"], &[])).await;
    mount_image(&server, "ok.jpg", jpeg_bytes(9, 8)).await;
    mount_image(&server, "corrupt.jpg", b"\xFF\xD8 truncated".to_vec()).await;
    mount_image(&server, "late.jpg", jpeg_bytes(90, 8)).await;
    Mock::given(method("GET"))
        .and(path("/img/missing.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let report = harvest(create_test_config(&format!("{}/", base), dir.path()), 3)
        .await
        .unwrap();

    // Three links found on page 1 satisfy the quota even though two failed
    assert_eq!(report.termination, Termination::QuotaSatisfied);
    assert_eq!(report.totals.pages_processed, 1);
    assert_eq!(report.totals.images_stored, 1);
    assert_eq!(report.totals.images_failed, 2);
}

#[tokio::test]
async fn test_oversized_images_are_recompressed() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", gallery_page(&base, &["big.jpg"], &[])).await;
    mount_image(&server, "big.jpg", jpeg_bytes(77, 40)).await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = create_test_config(&format!("{}/", base), dir.path());
    config.crawler.max_image_pixels = 400;

    let report = harvest(config, 1).await.unwrap();
    assert_eq!(report.totals.images_stored, 1);

    let files = image_files(&dir);
    assert_eq!(files.len(), 1);
    let stored = image::open(&files[0]).unwrap();
    let (w, h) = stored.dimensions();
    assert!(u64::from(w) * u64::from(h) <= 400);
}

#[tokio::test]
async fn test_crawler_exposes_ledger_after_run() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_page(&server, "/", gallery_page(&base, &["a.jpg"], &[])).await;
    mount_image(&server, "a.jpg", jpeg_bytes(3, 8)).await;

    let dir = tempfile::tempdir().unwrap();
    let start_url = format!("{}/", base);
    let mut crawler = Crawler::new(create_test_config(&start_url, dir.path())).unwrap();

    crawler.run(1).await.unwrap();
    assert!(crawler.ledger().contains(&start_url));

    // A second run starting at the same page skips it entirely
    let report = crawler.run(1).await.unwrap();
    assert_eq!(report.totals.pages_skipped, 1);
    assert_eq!(report.totals.pages_processed, 0);
    assert_eq!(report.remaining_quota, 1);
}
