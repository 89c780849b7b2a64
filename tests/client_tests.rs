use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use axum::{extract::Multipart, http::StatusCode, routing::post, Json, Router};
use brand_studio::{
    client::{GenerationClient, Transport},
    config::Config,
    error::SubmitError,
    models::{BrandingRequest, GenerationRequest, Payload, UploadedFile},
};
use bytes::Bytes;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::Mutex};

const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDRfake";

async fn spawn_api(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

fn client_for(base: &str) -> GenerationClient {
    GenerationClient::new(Config::new(format!("{base}/brand"), base.to_string()))
}

fn png_file() -> UploadedFile {
    UploadedFile::from_upload("shoe.png", Bytes::from_static(PNG)).unwrap()
}

fn branding_request() -> GenerationRequest {
    GenerationRequest::Branding(BrandingRequest {
        company_name: "Acme".into(),
        vision: "Rockets".into(),
        goals: "Ship".into(),
        brand_colors: "red".into(),
        target_audience: "Coyotes".into(),
    })
}

/// Parts as (field name, file name, text or byte length).
async fn collect_parts(mut multipart: Multipart) -> Vec<(String, Option<String>, String)> {
    let mut parts = Vec::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_owned);
        let bytes = field.bytes().await.unwrap();
        let summary = match file_name {
            Some(_) => format!("{} bytes", bytes.len()),
            None => String::from_utf8_lossy(&bytes).into_owned(),
        };
        parts.push((name, file_name, summary));
    }
    parts
}

#[tokio::test]
async fn branding_posts_json_and_returns_the_image() {
    let seen: Arc<Mutex<Option<Value>>> = Arc::default();
    let app = Router::new().route(
        "/brand",
        post({
            let seen = seen.clone();
            move |Json(body): Json<Value>| async move {
                *seen.lock().await = Some(body);
                Json(json!({ "image": "http://x/a.png" }))
            }
        }),
    );
    let base = spawn_api(app).await;

    let payload = client_for(&base).send(branding_request()).await.unwrap();

    assert_eq!(payload, Payload::Image("http://x/a.png".into()));
    assert_eq!(
        seen.lock().await.clone(),
        Some(json!({
            "companyName": "Acme",
            "vision": "Rockets",
            "goals": "Ship",
            "brandColors": "red",
            "targetAudience": "Coyotes"
        }))
    );
}

#[tokio::test]
async fn product_sends_image_and_description_parts() {
    let parts: Arc<Mutex<Vec<(String, Option<String>, String)>>> = Arc::default();
    let app = Router::new().route(
        "/api/generate-from-products",
        post({
            let parts = parts.clone();
            move |multipart: Multipart| async move {
                *parts.lock().await = collect_parts(multipart).await;
                Json(json!({ "images": ["u1", "u2"] }))
            }
        }),
    );
    let base = spawn_api(app).await;

    let request = GenerationRequest::Product {
        file: png_file(),
        company_description: "We sell shoes".into(),
    };
    let payload = client_for(&base).send(request).await.unwrap();

    assert_eq!(payload, Payload::Images(vec!["u1".into(), "u2".into()]));
    assert_eq!(
        *parts.lock().await,
        vec![
            ("image".to_string(), Some("shoe.png".to_string()), format!("{} bytes", PNG.len())),
            ("companyDescription".to_string(), None, "We sell shoes".to_string()),
        ]
    );
}

#[tokio::test]
async fn reverse_sends_only_the_image() {
    let parts: Arc<Mutex<Vec<(String, Option<String>, String)>>> = Arc::default();
    let app = Router::new().route(
        "/api/reverse-engineer",
        post({
            let parts = parts.clone();
            move |multipart: Multipart| async move {
                *parts.lock().await = collect_parts(multipart).await;
                Json(json!({ "prompt": "a red running shoe on white" }))
            }
        }),
    );
    let base = spawn_api(app).await;

    let request = GenerationRequest::Reverse { file: png_file() };
    let payload = client_for(&base).send(request).await.unwrap();

    assert_eq!(payload, Payload::Prompt("a red running shoe on white".into()));
    let parts = parts.lock().await;
    assert_eq!(parts.len(), 1);
    assert_eq!(parts[0].0, "image");
}

#[tokio::test]
async fn server_error_message_is_passed_through_once() {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = Router::new().route(
        "/api/reverse-engineer",
        post({
            let hits = hits.clone();
            move || async move {
                hits.fetch_add(1, Ordering::SeqCst);
                (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": "quota exceeded" })))
            }
        }),
    );
    let base = spawn_api(app).await;

    let request = GenerationRequest::Reverse { file: png_file() };
    let err = client_for(&base).send(request).await.unwrap_err();

    assert_eq!(err, SubmitError::Server("quota exceeded".into()));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn html_error_page_surfaces_the_parse_error() {
    let app = Router::new().route(
        "/api/generate-from-products",
        post(|| async { (StatusCode::BAD_GATEWAY, "<html>Bad Gateway</html>") }),
    );
    let base = spawn_api(app).await;

    let request =
        GenerationRequest::Product { file: png_file(), company_description: "tea".into() };
    let err = client_for(&base).send(request).await.unwrap_err();

    assert!(matches!(err, SubmitError::Transport(ref m) if m != "Image generation failed"));
}

#[tokio::test]
async fn http_success_without_image_is_a_failure() {
    let app = Router::new().route("/brand", post(|| async { Json(json!({})) }));
    let base = spawn_api(app).await;

    let err = client_for(&base).send(branding_request()).await.unwrap_err();

    assert!(matches!(err, SubmitError::PayloadShape(ref m) if !m.is_empty()));
}

#[tokio::test]
async fn unreachable_api_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client_for(&format!("http://{addr}")).send(branding_request()).await.unwrap_err();

    assert!(matches!(err, SubmitError::Transport(ref m) if !m.is_empty()));
}
