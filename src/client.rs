use async_trait::async_trait;
use reqwest::{multipart, Client, StatusCode};
use serde_json::Value;
use tracing::{error, info};

use crate::{
    config::Config,
    error::SubmitError,
    models::{GenerationRequest, Mode, Payload, UploadedFile},
};

/// Sends one request to the generation API and interprets the reply.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: GenerationRequest) -> Result<Payload, SubmitError>;
}

/// Shortens long strings (mostly `data:` URIs) for log lines.
pub fn preview(s: &str) -> String {
    const KEEP: usize = 50;
    let total = s.chars().count();
    if total <= KEEP {
        s.to_string()
    } else {
        format!("{}...[{} chars total]", s.chars().take(KEEP).collect::<String>(), total)
    }
}

pub struct GenerationClient {
    client: Client,
    config: Config,
}

impl GenerationClient {
    pub fn new(config: Config) -> Self {
        Self { client: Client::new(), config }
    }

    fn endpoint(&self, mode: Mode) -> String {
        match mode {
            Mode::Branding => self.config.branding_url.clone(),
            Mode::Product => self.config.product_url(),
            Mode::Reverse => self.config.reverse_url(),
        }
    }
}

fn image_part(file: UploadedFile) -> Result<multipart::Part, SubmitError> {
    let part = multipart::Part::bytes(file.bytes.to_vec())
        .file_name(file.name)
        .mime_str(&file.content_type)?;
    Ok(part)
}

#[async_trait]
impl Transport for GenerationClient {
    async fn send(&self, request: GenerationRequest) -> Result<Payload, SubmitError> {
        let mode = request.mode();
        let url = self.endpoint(mode);
        info!(%mode, %url, "🔗 Sending generation request");

        let builder = match request {
            GenerationRequest::Branding(body) => self.client.post(&url).json(&body),
            GenerationRequest::Product { file, company_description } => {
                let form = multipart::Form::new()
                    .part("image", image_part(file)?)
                    .text("companyDescription", company_description);
                self.client.post(&url).multipart(form)
            }
            GenerationRequest::Reverse { file } => {
                let form = multipart::Form::new().part("image", image_part(file)?);
                self.client.post(&url).multipart(form)
            }
        };

        let response = builder.send().await.map_err(|e| {
            error!(%mode, "❌ Request failed before a response: {}", e);
            SubmitError::from(e)
        })?;
        let status = response.status();
        info!(%mode, "📥 Response status: {}", status);

        let body = response.text().await?;
        let result = interpret_response(mode, status, &body);
        if let Err(e) = &result {
            error!(
                %mode,
                kind = e.kind(),
                "❌ Generation failed: {} (body: {})",
                e,
                preview(&body)
            );
        }
        result
    }
}

/// Maps an HTTP status and body onto the mode's payload.
///
/// Every body must be JSON, whatever the status; a body that is not fails
/// with the parser's message. Error bodies contribute their `error` string
/// when they have one. A success status with the expected field missing is
/// still a failure.
pub fn interpret_response(
    mode: Mode,
    status: StatusCode,
    body: &str,
) -> Result<Payload, SubmitError> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| SubmitError::Transport(e.to_string()))?;

    if !status.is_success() {
        let message = value
            .get("error")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .map(str::to_owned)
            .unwrap_or_else(|| mode.default_error().to_string());
        return Err(SubmitError::Server(message));
    }

    let shape_error = || SubmitError::PayloadShape(mode.payload_shape_error().to_string());
    match mode {
        Mode::Branding => value
            .get("image")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(|s| Payload::Image(s.to_string()))
            .ok_or_else(shape_error),
        Mode::Product => value
            .get("images")
            .and_then(Value::as_array)
            .and_then(|items| {
                items.iter().map(|i| i.as_str().map(str::to_owned)).collect::<Option<Vec<_>>>()
            })
            .map(Payload::Images)
            .ok_or_else(shape_error),
        Mode::Reverse => value
            .get("prompt")
            .and_then(Value::as_str)
            .map(|s| Payload::Prompt(s.to_string()))
            .ok_or_else(shape_error),
    }
}
