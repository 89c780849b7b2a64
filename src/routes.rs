use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use include_dir::{include_dir, Dir};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::{
    client::{GenerationClient, Transport},
    config::Config,
    controller::{Controller, Snapshot},
    download::{self, Download},
    models::{Mode, UploadedFile},
};

static STATIC_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/static");

const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub branding: Arc<Controller>,
    pub product: Arc<Controller>,
    pub reverse: Arc<Controller>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self::with_transport(Arc::new(GenerationClient::new(config)))
    }

    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self {
            branding: Arc::new(Controller::new(Mode::Branding, transport.clone())),
            product: Arc::new(Controller::new(Mode::Product, transport.clone())),
            reverse: Arc::new(Controller::new(Mode::Reverse, transport)),
        }
    }

    pub fn controller(&self, mode: Mode) -> &Arc<Controller> {
        match mode {
            Mode::Branding => &self.branding,
            Mode::Product => &self.product,
            Mode::Reverse => &self.reverse,
        }
    }

    fn lookup(&self, mode: &str) -> Result<&Arc<Controller>, ApiError> {
        let mode: Mode = mode.parse().map_err(ApiError::NotFound)?;
        Ok(self.controller(mode))
    }
}

/// Errors of the local surface, rendered as `{"error": ...}` like the generation API's.
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    UnknownFields(Vec<String>),
    UnsupportedMedia(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m),
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            ApiError::UnknownFields(fields) => {
                (StatusCode::UNPROCESSABLE_ENTITY, format!("unknown fields: {}", fields.join(", ")))
            }
            ApiError::UnsupportedMedia(m) => (StatusCode::UNSUPPORTED_MEDIA_TYPE, m),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/:mode", get(get_state))
        .route("/api/:mode/fields", post(update_fields))
        .route("/api/:mode/file", post(upload_file))
        .route("/api/:mode/submit", post(submit))
        .route("/api/:mode/reset", post(reset))
        .route("/api/:mode/download/:index", get(download_image))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .with_state(state)
}

pub async fn index() -> Response {
    match STATIC_DIR.get_file("index.html").and_then(|f| f.contents_utf8()) {
        Some(page) => Html(page).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

pub async fn get_state(
    Path(mode): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Snapshot>, ApiError> {
    Ok(Json(state.lookup(&mode)?.snapshot()))
}

pub async fn update_fields(
    Path(mode): Path<String>,
    State(state): State<AppState>,
    Json(fields): Json<HashMap<String, String>>,
) -> Result<Json<Snapshot>, ApiError> {
    let controller = state.lookup(&mode)?;
    let mut unknown: Vec<String> =
        fields.keys().filter(|k| !controller.mode().accepts_field(k)).cloned().collect();
    if !unknown.is_empty() {
        unknown.sort();
        return Err(ApiError::UnknownFields(unknown));
    }
    for (field, value) in fields {
        controller.set_field(field, value);
    }
    Ok(Json(controller.snapshot()))
}

pub async fn upload_file(
    Path(mode): Path<String>,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Snapshot>, ApiError> {
    let controller = state.lookup(&mode)?;
    if !controller.mode().requires_file() {
        return Err(ApiError::NotFound(format!("{mode} does not take a file")));
    }

    while let Some(field) =
        multipart.next_field().await.map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        let Some(name) = field.file_name().map(str::to_owned) else { continue };
        let bytes = field.bytes().await.map_err(|e| ApiError::BadRequest(e.to_string()))?;
        let file = UploadedFile::from_upload(name.clone(), bytes).ok_or_else(|| {
            warn!(%mode, file = %name, "Rejected upload, not a supported image");
            ApiError::UnsupportedMedia(format!("{name} is not a png, jpeg, gif or webp image"))
        })?;
        controller.select_file(file);
        return Ok(Json(controller.snapshot()));
    }
    Err(ApiError::BadRequest("no file in upload".into()))
}

pub async fn submit(
    Path(mode): Path<String>,
    State(state): State<AppState>,
) -> Result<Response, ApiError> {
    let controller = state.lookup(&mode)?;
    let response = match controller.submit().await {
        Some(_) => Json(controller.snapshot()).into_response(),
        None => (StatusCode::CONFLICT, Json(controller.snapshot())).into_response(),
    };
    Ok(response)
}

pub async fn reset(
    Path(mode): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Snapshot>, ApiError> {
    let controller = state.lookup(&mode)?;
    controller.reset();
    info!(%mode, "🧹 Controller reset");
    Ok(Json(controller.snapshot()))
}

pub async fn download_image(
    Path((mode, index)): Path<(String, usize)>,
    State(state): State<AppState>,
) -> Result<Response, ApiError> {
    let controller = state.lookup(&mode)?;
    let outcome = controller.outcome();
    let payload =
        outcome.payload().ok_or_else(|| ApiError::NotFound("nothing generated yet".into()))?;

    match download::resolve(controller.mode(), payload, index) {
        Ok(Download::Redirect(url)) => Ok(Redirect::to(&url).into_response()),
        Ok(Download::Attachment { file_name, content_type, bytes }) => {
            let mut headers = HeaderMap::new();
            let content_type = content_type
                .parse::<HeaderValue>()
                .map_err(|_| ApiError::BadRequest(format!("bad content type {content_type}")))?;
            headers.insert(header::CONTENT_TYPE, content_type);
            let disposition = format!("attachment; filename=\"{file_name}\"")
                .parse::<HeaderValue>()
                .map_err(|_| ApiError::BadRequest("bad file name".into()))?;
            headers.insert(header::CONTENT_DISPOSITION, disposition);
            Ok((StatusCode::OK, headers, bytes).into_response())
        }
        Err(download::DownloadError::NoSuchImage(i)) => {
            Err(ApiError::NotFound(format!("no image at index {i}")))
        }
        Err(e) => Err(ApiError::BadRequest(e.to_string())),
    }
}
