use reqwest::Url;

use crate::error::ConfigError;

pub const BRANDING_URL_VAR: &str = "BACKEND_URL";
pub const API_BASE_VAR: &str = "API_BASE_URL";
pub const PORT_VAR: &str = "PORT";

const DEFAULT_PORT: u16 = 8080;

/// Where the three workflows send their requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Full URL of the brand-asset endpoint.
    pub branding_url: String,
    /// Base URL for the product and reverse endpoints.
    pub api_base_url: String,
    pub port: u16,
}

impl Config {
    pub fn new(branding_url: impl Into<String>, api_base_url: impl Into<String>) -> Self {
        Self {
            branding_url: branding_url.into(),
            api_base_url: api_base_url.into(),
            port: DEFAULT_PORT,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a config from any variable source, so tests don't touch the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let branding_url = required(&lookup, BRANDING_URL_VAR)?;
        let api_base_url = required(&lookup, API_BASE_VAR)?;
        let port = match lookup(PORT_VAR) {
            Some(raw) => {
                raw.trim().parse().map_err(|e: std::num::ParseIntError| ConfigError::Invalid {
                    name: PORT_VAR,
                    reason: e.to_string(),
                })?
            }
            None => DEFAULT_PORT,
        };
        Ok(Self { branding_url, api_base_url, port })
    }

    pub fn product_url(&self) -> String {
        format!("{}/api/generate-from-products", self.api_base_url.trim_end_matches('/'))
    }

    pub fn reverse_url(&self) -> String {
        format!("{}/api/reverse-engineer", self.api_base_url.trim_end_matches('/'))
    }
}

fn required<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(name).filter(|v| !v.trim().is_empty()).ok_or(ConfigError::Missing(name))?;
    Url::parse(&value).map_err(|e| ConfigError::Invalid { name, reason: e.to_string() })?;
    Ok(value)
}
