//! txt2img / img2img clients against a mocked Stable Diffusion WebUI

use base64::Engine;
use imagent::{ImageGenError, Img2ImgClient, Img2ImgRequest, TextToImage, Txt2ImgClient};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn b64(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

#[tokio::test]
async fn test_txt2img_saves_first_image() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/sdapi/v1/txt2img"))
        .and(body_partial_json(json!({
            "prompt": "young man, formal suit",
            "override_settings": {"sd_model_checkpoint": "realisticUniversalBase_100.safetensors"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "images": [b64(b"first"), b64(b"second")],
            "parameters": {},
            "info": "{}"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = Txt2ImgClient::new(&server.uri(), dir.path(), Duration::from_secs(5)).unwrap();
    let image = client.generate("young man, formal suit").await.unwrap();

    assert_eq!(image.base64, b64(b"first"));
    assert!(image.path.is_absolute());
    assert_eq!(
        image.path.file_name().unwrap().to_str().unwrap(),
        Txt2ImgClient::file_name("young man, formal suit")
    );
    assert_eq!(std::fs::read(&image.path).unwrap(), b"first");
}

#[tokio::test]
async fn test_txt2img_http_error() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/sdapi/v1/txt2img"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"error": "OutOfMemoryError"})),
        )
        .mount(&server)
        .await;

    let client = Txt2ImgClient::new(&server.uri(), dir.path(), Duration::from_secs(5)).unwrap();
    let err = client.generate("prompt").await.unwrap_err();

    match err {
        ImageGenError::Status { status, detail } => {
            assert_eq!(status, 500);
            assert!(detail.contains("OutOfMemoryError"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_txt2img_without_images() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/sdapi/v1/txt2img"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"images": []})))
        .mount(&server)
        .await;

    let client = Txt2ImgClient::new(&server.uri(), dir.path(), Duration::from_secs(5)).unwrap();
    let err = client.generate("prompt").await.unwrap_err();
    assert!(matches!(err, ImageGenError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_img2img_writes_images_and_metadata() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/sdapi/v1/img2img"))
        .and(body_partial_json(json!({
            "init_images": ["aW5pdA=="],
            "prompt": "masterpiece",
            "sampler_index": "DPM++ 2M Karras",
            "denoising_strength": 0.65,
            "save_images": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "images": [b64(b"one"), b64(b"two")]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut request = Img2ImgRequest::new(vec!["aW5pdA==".into()], "masterpiece");
    request.denoising_strength = 0.65;
    request.output_dir = dir.path().join("result");

    let client = Img2ImgClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
    let metadata = client.generate_and_save(&request).await.unwrap();

    assert_eq!(metadata.len(), 2);
    assert_eq!(metadata[1].path_file, request.output_dir.join("img2img_1.png"));
    assert_eq!(std::fs::read(&metadata[0].path_file).unwrap(), b"one");
    assert_eq!(metadata[0].img_base64, b64(b"one"));

    let written: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(request.output_dir.join("metadata.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(written.as_array().unwrap().len(), 2);
    assert_eq!(written[0]["img_base64"], b64(b"one"));
}

#[tokio::test]
async fn test_img2img_invalid_request_is_not_sent() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/sdapi/v1/img2img"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"images": []})))
        .expect(0)
        .mount(&server)
        .await;

    let request = Img2ImgRequest::new(Vec::new(), "masterpiece");
    let client = Img2ImgClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
    let err = client.generate_and_save(&request).await.unwrap_err();
    assert!(matches!(err, ImageGenError::InvalidConfig(_)));
}

#[tokio::test]
async fn test_img2img_text_error_detail() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/sdapi/v1/img2img"))
        .respond_with(ResponseTemplate::new(422).set_body_string("bad sampler"))
        .mount(&server)
        .await;

    let mut request = Img2ImgRequest::new(vec!["aW5pdA==".into()], "p");
    request.output_dir = dir.path().to_path_buf();
    let client = Img2ImgClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
    let err = client.generate_and_save(&request).await.unwrap_err();

    assert_eq!(err.to_string(), "HTTP 422: bad sampler");
}
