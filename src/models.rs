use std::{collections::BTreeMap, fmt, str::FromStr};

use bytes::Bytes;
use image::ImageFormat;
use serde::{Deserialize, Serialize};

use crate::error::SubmitError;

pub const MISSING_FILE_MESSAGE: &str = "Please upload an image";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Branding,
    Product,
    Reverse,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Branding, Mode::Product, Mode::Reverse];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Branding => "branding",
            Mode::Product => "product",
            Mode::Reverse => "reverse",
        }
    }

    /// Text fields that must be non-empty before submitting, in form order.
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            Mode::Branding => &["companyName", "vision", "goals", "brandColors", "targetAudience"],
            Mode::Product => &["companyDescription"],
            Mode::Reverse => &[],
        }
    }

    pub fn accepts_field(&self, name: &str) -> bool {
        self.required_fields().contains(&name)
    }

    pub fn requires_file(&self) -> bool {
        !matches!(self, Mode::Branding)
    }

    /// Message used when the server fails without saying why.
    pub fn default_error(&self) -> &'static str {
        match self {
            Mode::Branding => "Failed to generate brand asset",
            Mode::Product => "Image generation failed",
            Mode::Reverse => "Image processing failed",
        }
    }

    pub fn payload_shape_error(&self) -> &'static str {
        match self {
            Mode::Branding => "No image received from server",
            Mode::Product => "Invalid response format from server",
            Mode::Reverse => "No prompt received from server",
        }
    }

    /// Checks local preconditions and assembles the outgoing request.
    /// Never touches the network.
    pub fn build_request(
        &self,
        form: &FormState,
        file: Option<&UploadedFile>,
    ) -> Result<GenerationRequest, SubmitError> {
        for field in self.required_fields() {
            if form.get(field).is_empty() {
                let message = format!("Please fill out the {} field", field_label(field));
                return Err(SubmitError::LocalValidation(message));
            }
        }
        let missing_file = || SubmitError::LocalValidation(MISSING_FILE_MESSAGE.into());
        if self.requires_file() && file.is_none() {
            return Err(missing_file());
        }
        let file = file.cloned();
        Ok(match self {
            Mode::Branding => GenerationRequest::Branding(BrandingRequest {
                company_name: form.get("companyName").to_string(),
                vision: form.get("vision").to_string(),
                goals: form.get("goals").to_string(),
                brand_colors: form.get("brandColors").to_string(),
                target_audience: form.get("targetAudience").to_string(),
            }),
            Mode::Product => GenerationRequest::Product {
                file: file.ok_or_else(missing_file)?,
                company_description: form.get("companyDescription").to_string(),
            },
            Mode::Reverse => GenerationRequest::Reverse { file: file.ok_or_else(missing_file)? },
        })
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::ALL.into_iter().find(|m| m.as_str() == s).ok_or_else(|| format!("unknown mode: {s}"))
    }
}

fn field_label(field: &str) -> &str {
    match field {
        "companyName" => "Company Name",
        "vision" => "Vision",
        "goals" => "Goals",
        "brandColors" => "Brand Colors",
        "targetAudience" => "Target Audience",
        "companyDescription" => "Company Description",
        other => other,
    }
}

/// Field name → current value. Missing fields read as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormState(BTreeMap<String, String>);

impl FormState {
    pub fn get(&self, field: &str) -> &str {
        self.0.get(field).map(String::as_str).unwrap_or("")
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.0.insert(field.into(), value.into());
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormState {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// A user-selected image, kept whole until the next selection replaces it.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl UploadedFile {
    /// Accepts png, jpeg, gif and webp, sniffed from the content rather than the name.
    pub fn from_upload(name: impl Into<String>, bytes: Bytes) -> Option<Self> {
        let format = image::guess_format(&bytes).ok()?;
        let accepted = matches!(
            format,
            ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::Gif | ImageFormat::WebP
        );
        if !accepted {
            return None;
        }
        Some(Self { name: name.into(), content_type: format.to_mime_type().to_string(), bytes })
    }
}

impl fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadedFile")
            .field("name", &self.name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Successful result of a submission; serializes to the same shape the API returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Payload {
    Image(String),
    Images(Vec<String>),
    Prompt(String),
}

impl Payload {
    /// Image URLs in display order; empty for text payloads.
    pub fn image_urls(&self) -> Vec<&str> {
        match self {
            Payload::Image(url) => vec![url.as_str()],
            Payload::Images(urls) => urls.iter().map(String::as_str).collect(),
            Payload::Prompt(_) => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandingRequest {
    pub company_name: String,
    pub vision: String,
    pub goals: String,
    pub brand_colors: String,
    pub target_audience: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationRequest {
    Branding(BrandingRequest),
    Product { file: UploadedFile, company_description: String },
    Reverse { file: UploadedFile },
}

impl GenerationRequest {
    pub fn mode(&self) -> Mode {
        match self {
            GenerationRequest::Branding(_) => Mode::Branding,
            GenerationRequest::Product { .. } => Mode::Product,
            GenerationRequest::Reverse { .. } => Mode::Reverse,
        }
    }
}
