use std::io::Cursor;
use std::time::Duration;

use image::{DynamicImage, ImageFormat, RgbImage};
use pretty_assertions::assert_eq;
use serde_json::json;
use snapcode_app::{Driver, EffectRunner};
use snapcode_core::{FailureKind, ImageFile, SessionState};
use snapcode_engine::{ClientSettings, EngineConfig};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn screenshot() -> ImageFile {
    let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(1500, 900, image::Rgb([250, 250, 250])));
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, ImageFormat::Png).unwrap();
    ImageFile::new("dashboard.png", "image/png", out.into_inner())
}

fn driver(server: &MockServer) -> Driver {
    let config = EngineConfig {
        client: ClientSettings {
            endpoint: format!("{}/api/process-image", server.uri()),
            ..ClientSettings::default()
        },
        ..EngineConfig::default()
    };
    Driver::new(EffectRunner::new(config).unwrap(), Duration::from_secs(20))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn converts_and_cleans_up() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/process-image"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "html": "<section class=\"grid\">Stats</section>", "css": "" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut driver = driver(&server);
    let artifact = driver.convert(screenshot()).unwrap();
    assert_eq!(artifact.markup, "<section class=\"grid\">Stats</section>");
    assert_eq!(driver.session().state(), SessionState::Completed);
    assert_eq!(driver.session().progress(), 100);
    assert!(driver.session().error().is_none());

    let uploaded = driver.session().compressed().unwrap();
    assert_eq!(uploaded.media_type, "image/jpeg");

    driver.remove();
    assert_eq!(driver.session().state(), SessionState::Idle);
    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    while driver.runner().live_previews() > 0 && std::time::Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
    }
    assert_eq!(driver.runner().live_previews(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn server_rejection_ends_in_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "success": false,
            "error": "Request timeout. Please try again with a smaller image."
        })))
        .mount(&server)
        .await;

    let mut driver = driver(&server);
    let err = driver.convert(screenshot()).unwrap_err();
    assert_eq!(err.message, "Request timeout. Please try again with a smaller image.");
    assert_eq!(err.kind, FailureKind::Timeout);
    assert_eq!(driver.session().state(), SessionState::Errored);
    assert_eq!(driver.session().progress(), 0);
    assert!(driver.session().artifact().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unsupported_file_never_leaves_the_client() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut driver = driver(&server);
    let err = driver
        .convert(ImageFile::new("anim.gif", "image/gif", b"GIF89a".to_vec()))
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::UnsupportedType);
    assert_eq!(err.message, "Please upload a PNG, JPG, or WebP image file.");
}
