//! Integration tests for the traversal
//!
//! These tests use wiremock to serve a small webcomic and run the full
//! page -> image -> document cycle end-to-end.

use image::{ImageFormat, RgbImage};
use std::io::Cursor;
use sturdywcdl::artifact::placeholder::{MISSING_LABEL, MISSING_PNG, MISSING_SIZE};
use sturdywcdl::crawler::{
    download_series, http_error_message, FetchSettings, ObservedEvent, RecordingObserver,
    WarningKind,
};
use sturdywcdl::{
    ErrorClass, HttpFetcher, ImageInspector, MemorySink, RequestContext, SeriesRequest,
    Termination, TraversalController, TraversalReport,
};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn encode_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let image = RgbImage::from_pixel(width, height, image::Rgb([200, 40, 40]));
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), format)
        .expect("Failed to encode test image");
    bytes
}

fn comic_page(image_src: Option<&str>, next_href: Option<&str>) -> String {
    let image = image_src
        .map(|src| format!(r#"<div id="comic"><img src="{}"></div>"#, src))
        .unwrap_or_default();
    let next = next_href
        .map(|href| format!(r#"<a class="next" href="{}">Next</a>"#, href))
        .unwrap_or_default();
    format!("<html><body>{}{}</body></html>", image, next)
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html")
}

fn series(server: &MockServer, first_page: &str) -> SeriesRequest {
    SeriesRequest::new(
        &format!("{}{}", server.uri(), first_page),
        "#comic img",
        "a.next",
    )
    .expect("Failed to build series request")
}

async fn traverse(
    request: &SeriesRequest,
    observer: &RecordingObserver,
) -> (MemorySink, TraversalReport) {
    let fetcher = HttpFetcher::new(&FetchSettings::default()).expect("Failed to build fetcher");
    let controller = TraversalController::new(&fetcher, &ImageInspector, observer);
    let mut sink = MemorySink::new();

    let report = controller
        .run(&mut sink, request)
        .await
        .expect("Traversal failed");
    (sink, report)
}

#[tokio::test]
async fn test_follows_series_to_the_end() {
    let mock_server = MockServer::start().await;
    let png = encode_image(40, 30, ImageFormat::Png);

    for page in 1..=3 {
        let next = (page < 3).then(|| format!("/comic/{}", page + 1));
        Mock::given(method("GET"))
            .and(path(format!("/comic/{}", page)))
            .respond_with(html(comic_page(
                Some(&format!("/img/{}.png", page)),
                next.as_deref(),
            )))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    Mock::given(method("GET"))
        .and(path("/img/1.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png.clone()))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/img/2.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png.clone()))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/img/3.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png.clone()))
        .mount(&mock_server)
        .await;

    let observer = RecordingObserver::new();
    let request = series(&mock_server, "/comic/1");
    let (sink, report) = traverse(&request, &observer).await;

    assert_eq!(report.termination, Termination::EndOfSeries);
    assert_eq!(report.pages, 3);
    assert_eq!(report.artifacts, 3);
    assert_eq!(sink.pages().len(), 3);
    assert!(observer.events().is_empty());

    for page in sink.pages() {
        assert_eq!((page.width, page.height), (40, 30));
        assert_eq!(page.images, vec![png.clone()]);
    }
}

#[tokio::test]
async fn test_max_pages_limits_output() {
    let mock_server = MockServer::start().await;
    let png = encode_image(10, 10, ImageFormat::Png);

    // Every page links back to itself, so only the limit stops the traversal
    Mock::given(method("GET"))
        .and(path("/strip"))
        .respond_with(html(comic_page(Some("/strip.png"), Some("/strip"))))
        .expect(4)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/strip.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png))
        .expect(4)
        .mount(&mock_server)
        .await;

    let observer = RecordingObserver::new();
    let request = series(&mock_server, "/strip").with_max_pages(4);
    let (sink, report) = traverse(&request, &observer).await;

    assert_eq!(report.termination, Termination::MaxPagesReached);
    assert_eq!(sink.pages().len(), 4);
}

#[tokio::test]
async fn test_missing_image_element_inserts_placeholder() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/strip"))
        .respond_with(html(comic_page(None, Some("/strip"))))
        .mount(&mock_server)
        .await;

    let observer = RecordingObserver::new();
    let request = series(&mock_server, "/strip").with_max_pages(3);
    let (sink, report) = traverse(&request, &observer).await;

    assert_eq!(report.pages, 3);
    assert_eq!(report.placeholders, 3);
    assert_eq!(
        observer.warning_kinds(),
        vec![WarningKind::CannotGetImage; 3]
    );

    for page in sink.pages() {
        assert_eq!((page.width, page.height), MISSING_SIZE);
        assert_eq!(page.texts, vec![MISSING_LABEL.to_string()]);
    }
}

#[tokio::test]
async fn test_image_fetch_exhaustion_continues_with_placeholder() {
    let mock_server = MockServer::start().await;
    let png = encode_image(12, 12, ImageFormat::Png);

    Mock::given(method("GET"))
        .and(path("/1"))
        .respond_with(html(comic_page(Some("/broken.png"), Some("/2"))))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/2"))
        .respond_with(html(comic_page(Some("/ok.png"), None)))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken.png"))
        .respond_with(ResponseTemplate::new(503))
        .expect(10)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ok.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png.clone()))
        .mount(&mock_server)
        .await;

    let observer = RecordingObserver::new();
    let request = series(&mock_server, "/1");
    let (sink, report) = traverse(&request, &observer).await;

    assert_eq!(report.termination, Termination::EndOfSeries);
    assert_eq!(report.placeholders, 1);
    assert_eq!(report.artifacts, 1);

    let warnings = observer.warnings();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].0, WarningKind::CannotGetImage);
    assert_eq!(
        warnings[0].1,
        http_error_message(503, ErrorClass::ServerIssue.helper_text())
    );

    assert!(sink.pages()[0].images.is_empty());
    assert_eq!(sink.pages()[0].texts, vec![MISSING_LABEL.to_string()]);
    assert_eq!(sink.pages()[1].images, vec![png]);
}

#[tokio::test]
async fn test_page_fetch_exhaustion_without_auth_header() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/1"))
        .and(header("authorization", "secret"))
        .respond_with(html(comic_page(None, None)))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .expect(10)
        .mount(&mock_server)
        .await;

    let observer = RecordingObserver::new();
    let request = series(&mock_server, "/1");
    let (sink, report) = traverse(&request, &observer).await;

    let expected = http_error_message(403, ErrorClass::AuthLike.helper_text());
    assert_eq!(sink.pages().len(), 0);
    assert_eq!(report.pages, 0);
    assert!(report.is_aborted());
    assert_eq!(
        report.termination,
        Termination::PageFetchExhausted {
            message: expected.clone()
        }
    );
    assert_eq!(observer.fatals(), vec![expected]);
}

#[tokio::test]
async fn test_auth_header_is_sent_with_every_request() {
    let mock_server = MockServer::start().await;
    let png = encode_image(8, 8, ImageFormat::Png);

    Mock::given(method("GET"))
        .and(path("/1"))
        .and(header("authorization", "secret"))
        .respond_with(html(comic_page(Some("/1.png"), None)))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/1.png"))
        .and(header("authorization", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .expect(0)
        .mount(&mock_server)
        .await;

    let context = RequestContext::from_pairs([("authorization", "secret")]).unwrap();
    let observer = RecordingObserver::new();
    let request = series(&mock_server, "/1").with_context(context);
    let (sink, report) = traverse(&request, &observer).await;

    assert_eq!(report.termination, Termination::EndOfSeries);
    assert_eq!(report.artifacts, 1);
    assert_eq!(sink.pages().len(), 1);
    assert!(observer.fatals().is_empty());
}

#[tokio::test]
async fn test_unsupported_format_is_reencoded() {
    let mock_server = MockServer::start().await;
    let png = encode_image(16, 9, ImageFormat::Png);
    let bmp = encode_image(16, 9, ImageFormat::Bmp);

    Mock::given(method("GET"))
        .and(path("/1"))
        .respond_with(html(comic_page(Some("/1.png"), Some("/2"))))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/2"))
        .respond_with(html(comic_page(Some("/2.bmp"), None)))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/1.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png.clone()))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/2.bmp"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(bmp.clone()))
        .mount(&mock_server)
        .await;

    let observer = RecordingObserver::new();
    let request = series(&mock_server, "/1");
    let (sink, _) = traverse(&request, &observer).await;

    let pages = sink.pages();
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].images[0], png);

    let converted = &pages[1].images[0];
    assert_ne!(converted, &bmp);
    assert_eq!(
        image::guess_format(converted).unwrap(),
        ImageFormat::Png
    );
    assert_eq!((pages[1].width, pages[1].height), (16, 9));
    assert!(observer.warnings().is_empty());
}

#[tokio::test]
async fn test_malformed_image_inserts_placeholder() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/1"))
        .respond_with(html(comic_page(Some("/1.png"), None)))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/1.png"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not an image</html>"))
        .mount(&mock_server)
        .await;

    let observer = RecordingObserver::new();
    let request = series(&mock_server, "/1");
    let (sink, report) = traverse(&request, &observer).await;

    assert_eq!(report.placeholders, 1);
    assert_eq!(sink.pages().len(), 1);
    assert_eq!(observer.warning_kinds(), vec![WarningKind::MalformedArtifact]);
}

#[tokio::test]
async fn test_progress_reported_every_fifteen_pages() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/strip"))
        .respond_with(html(comic_page(None, Some("/strip"))))
        .mount(&mock_server)
        .await;

    let observer = RecordingObserver::new();
    let request = series(&mock_server, "/strip").with_max_pages(31);
    let (_, report) = traverse(&request, &observer).await;

    assert_eq!(report.pages, 31);
    let progress: Vec<usize> = observer
        .events()
        .into_iter()
        .filter_map(|event| match event {
            ObservedEvent::Progress(pages) => Some(pages),
            _ => None,
        })
        .collect();
    assert_eq!(progress, vec![15, 30]);
}

#[tokio::test]
async fn test_links_resolve_against_first_page_origin() {
    let mock_server = MockServer::start().await;
    let png = encode_image(5, 5, ImageFormat::Png);

    // Relative links on a nested page still resolve from the site root
    Mock::given(method("GET"))
        .and(path("/archive/chapter/1"))
        .respond_with(html(comic_page(Some("img/1.png"), None)))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/img/1.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png))
        .expect(1)
        .mount(&mock_server)
        .await;

    let observer = RecordingObserver::new();
    let request = series(&mock_server, "/archive/chapter/1");
    let (_, report) = traverse(&request, &observer).await;

    assert_eq!(report.artifacts, 1);
}

#[tokio::test]
async fn test_raw_images_written_to_output_dir() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let raw_dir = dir.path().join("raw");
    let jpeg = encode_image(6, 6, ImageFormat::Jpeg);

    Mock::given(method("GET"))
        .and(path("/1"))
        .respond_with(html(comic_page(Some("/1.jpg"), Some("/2"))))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/2"))
        .respond_with(html(comic_page(None, None)))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/1.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(jpeg.clone()))
        .mount(&mock_server)
        .await;

    let observer = RecordingObserver::new();
    let request = series(&mock_server, "/1").with_image_output_dir(Some(raw_dir.clone()));
    traverse(&request, &observer).await;

    assert_eq!(std::fs::read(raw_dir.join("0.jpg")).unwrap(), jpeg);
    assert_eq!(std::fs::read(raw_dir.join("1.png")).unwrap(), MISSING_PNG);
}

#[tokio::test]
async fn test_download_series_writes_pdf() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let output_file = dir.path().join("out").join("comic.pdf");
    let png = encode_image(20, 20, ImageFormat::Png);

    Mock::given(method("GET"))
        .and(path("/1"))
        .respond_with(html(comic_page(Some("/1.png"), Some("/2"))))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/2"))
        .respond_with(html(comic_page(Some("/missing.png"), None)))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/1.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/missing.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let fetcher = HttpFetcher::new(&FetchSettings::default()).unwrap();
    let request = series(&mock_server, "/1")
        .with_name("comic")
        .with_max_attempts(2);
    let report = download_series(&fetcher, &request, &output_file)
        .await
        .expect("Download failed");

    assert_eq!(report.pages, 2);
    assert_eq!(report.placeholders, 1);

    let document = lopdf::Document::load(&output_file).expect("Failed to read PDF");
    assert_eq!(document.get_pages().len(), 2);
}

#[tokio::test]
async fn test_download_series_keeps_partial_pdf_on_abort() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let output_file = dir.path().join("comic.pdf");

    Mock::given(method("GET"))
        .and(path("/1"))
        .respond_with(html(comic_page(None, Some("/2"))))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/2"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&mock_server)
        .await;

    let fetcher = HttpFetcher::new(&FetchSettings::default()).unwrap();
    let request = series(&mock_server, "/1").with_max_attempts(2);
    let report = download_series(&fetcher, &request, &output_file)
        .await
        .expect("Download failed");

    assert!(report.is_aborted());
    assert_eq!(report.pages, 1);

    let document = lopdf::Document::load(&output_file).expect("Failed to read PDF");
    assert_eq!(document.get_pages().len(), 1);
}
