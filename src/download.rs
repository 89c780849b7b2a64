use base64::Engine;
use thiserror::Error;

use crate::models::{Mode, Payload};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DownloadError {
    #[error("no image at index {0}")]
    NoSuchImage(usize),
    #[error("malformed data URI: {0}")]
    MalformedDataUri(String),
}

/// How the browser should save a generated image.
#[derive(Debug, PartialEq, Eq)]
pub enum Download {
    /// Remote URL; the browser fetches it itself.
    Redirect(String),
    Attachment { file_name: String, content_type: String, bytes: Vec<u8> },
}

pub fn file_name(mode: Mode, index: usize) -> String {
    match mode {
        Mode::Product => format!("product-asset-{}.png", index + 1),
        _ => "brand-asset.png".to_string(),
    }
}

pub fn resolve(mode: Mode, payload: &Payload, index: usize) -> Result<Download, DownloadError> {
    let url = payload.image_urls().get(index).copied().ok_or(DownloadError::NoSuchImage(index))?;
    let Some(rest) = url.strip_prefix("data:") else {
        return Ok(Download::Redirect(url.to_string()));
    };

    let (meta, data) = rest
        .split_once(',')
        .ok_or_else(|| DownloadError::MalformedDataUri("missing ','".into()))?;
    let (content_type, is_base64) = match meta.strip_suffix(";base64") {
        Some(ct) => (ct, true),
        None => (meta, false),
    };
    let bytes = if is_base64 {
        base64::engine::general_purpose::STANDARD
            .decode(data.trim())
            .map_err(|e| DownloadError::MalformedDataUri(e.to_string()))?
    } else {
        data.as_bytes().to_vec()
    };
    let content_type =
        if content_type.is_empty() { "application/octet-stream" } else { content_type };

    Ok(Download::Attachment {
        file_name: file_name(mode, index),
        content_type: content_type.to_string(),
        bytes,
    })
}
