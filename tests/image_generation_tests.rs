//! Image generation and the image tools against a mock Gemini endpoint.

use base64::Engine;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_partial_json, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tinsel::config::AuthMode;
use tinsel::image_tools::prompts::PERSON_FALLBACK;
use tinsel::image_tools::{
    AspectRatio, HolidayImageTools, ImageGenerator, ImageOutcome, ImageToolStatus,
    FINAL_PHOTO_FILE, PATTERN_FILE, SCENE_FILE, SELFIE_FILE,
};
use tinsel::provider::GeminiClient;

const IMAGE_MODEL: &str = "gemini-2.5-flash-image";
const TEXT_MODEL: &str = "gemini-2.5-flash";

fn generator(server: &MockServer) -> ImageGenerator {
    let client = GeminiClient::new(AuthMode::ApiKey {
        api_key: Some("test-key".into()),
    })
    .with_base_url(server.uri());
    ImageGenerator::new(client, IMAGE_MODEL, TEXT_MODEL)
}

fn b64(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

fn image_response(images: &[&[u8]]) -> ResponseTemplate {
    let mut parts = vec![json!({"text": "Here is your festive image."})];
    parts.extend(
        images
            .iter()
            .map(|bytes| json!({"inlineData": {"mimeType": "image/png", "data": b64(bytes)}})),
    );
    ResponseTemplate::new(200).set_body_json(json!({
        "candidates": [{"content": {"role": "model", "parts": parts}, "finishReason": "STOP"}]
    }))
}

fn image_endpoint() -> String {
    format!("/models/{IMAGE_MODEL}:generateContent")
}

#[tokio::test]
async fn writes_first_inline_image_and_creates_directories() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(image_endpoint()))
        .and(body_partial_json(json!({
            "generationConfig": {
                "responseModalities": ["TEXT", "IMAGE"],
                "imageConfig": {"aspectRatio": "16:9"}
            }
        })))
        .respond_with(image_response(&[b"first", b"second"]))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("nested").join("deeper").join("scene.png");
    let outcome = generator(&server)
        .generate_image("a snowy village", AspectRatio::Landscape, &output, &[])
        .await
        .unwrap();

    assert_eq!(outcome, ImageOutcome::Written { path: output.clone() });
    assert_eq!(std::fs::read(&output).unwrap(), b"first");
}

#[tokio::test]
async fn text_only_answer_reports_no_image() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(image_endpoint()))
        .respond_with(image_response(&[]))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("pattern.png");
    let outcome = generator(&server)
        .generate_image("a pattern", AspectRatio::Square, &output, &[])
        .await
        .unwrap();

    assert_eq!(
        outcome,
        ImageOutcome::NoImage {
            text: "Here is your festive image.".into()
        }
    );
    assert!(!output.exists());
}

#[tokio::test]
async fn references_are_sent_inline_and_missing_ones_skipped() {
    let server = MockServer::start().await;
    let reference_bytes = b"pattern-bytes";
    Mock::given(method("POST"))
        .and(path(image_endpoint()))
        .and(body_string_contains(b64(reference_bytes)))
        .respond_with(image_response(&[b"selfie"]))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let reference = dir.path().join("generated_pattern.png");
    std::fs::write(&reference, reference_bytes).unwrap();
    let outcome = generator(&server)
        .generate_image(
            "wear it",
            AspectRatio::Square,
            &dir.path().join("selfie.png"),
            &[dir.path().join("missing.png"), reference],
        )
        .await
        .unwrap();
    assert!(matches!(outcome, ImageOutcome::Written { .. }));
}

#[tokio::test]
async fn person_description_comes_from_the_text_model() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/models/{TEXT_MODEL}:generateContent")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [{"text": "  a young woman with red curls  "}]}}]
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let photo = dir.path().join("me.jpg");
    std::fs::write(&photo, b"jpeg").unwrap();
    let description = generator(&server).describe_person(&photo).await;
    assert_eq!(description, "a young woman with red curls");
}

#[tokio::test]
async fn person_description_falls_back_on_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let photo = dir.path().join("me.jpg");
    std::fs::write(&photo, b"jpeg").unwrap();
    let generator = generator(&server);

    assert_eq!(generator.describe_person(&photo).await, PERSON_FALLBACK);
    assert_eq!(
        generator.describe_person(&dir.path().join("absent.jpg")).await,
        PERSON_FALLBACK
    );
}

#[tokio::test]
async fn holiday_scene_tool_writes_the_scene_artifact() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(image_endpoint()))
        .and(body_string_contains("birds"))
        .respond_with(image_response(&[b"scene"]))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let tools = HolidayImageTools::new(generator(&server), dir.path());
    let result = tools.holiday_scene("birds").await.unwrap();

    assert_eq!(result.status, ImageToolStatus::Generated);
    assert_eq!(result.artifact.as_deref(), Some(SCENE_FILE));
    assert_eq!(result.message, format!("Done! Saved at {SCENE_FILE}"));
    assert_eq!(std::fs::read(dir.path().join(SCENE_FILE)).unwrap(), b"scene");
}

#[tokio::test]
async fn wearing_sweater_without_photo_uses_fallback_person() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(image_endpoint()))
        .and(body_string_contains(PERSON_FALLBACK))
        .respond_with(image_response(&[b"selfie"]))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(PATTERN_FILE), b"pattern").unwrap();
    let tools = HolidayImageTools::new(generator(&server), dir.path());
    let result = tools.wearing_sweater(None).await.unwrap();

    assert_eq!(result.artifact.as_deref(), Some(SELFIE_FILE));
    assert!(dir.path().join(SELFIE_FILE).exists());
}

#[tokio::test]
async fn upstream_failure_is_a_tool_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"code": 400, "message": "Invalid aspect ratio"}
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let tools = HolidayImageTools::new(generator(&server), dir.path());
    let err = tools.sweater_pattern("reindeer").await.unwrap_err();
    assert!(err.to_string().contains("Invalid aspect ratio"));
}

#[tokio::test]
async fn final_photo_sends_only_existing_references() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(image_endpoint()))
        .respond_with(image_response(&[b"final"]))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(SCENE_FILE), b"scene-bytes").unwrap();
    let tools = HolidayImageTools::new(generator(&server), dir.path());
    let result = tools.final_photo().await.unwrap();

    assert_eq!(result.artifact.as_deref(), Some(FINAL_PHOTO_FILE));
    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = requests[0].body_json().unwrap();
    let inline: Vec<&str> = body["contents"][0]["parts"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|part| part["inlineData"]["data"].as_str())
        .collect();
    assert_eq!(inline, vec![b64(b"scene-bytes").as_str()]);
}
