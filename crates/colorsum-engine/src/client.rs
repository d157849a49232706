use std::time::Duration;

use anyhow::Context;
use colorsum_contracts::palette::{PaletteColor, PaletteResult};
use reqwest::blocking::Client as HttpClient;
use serde_json::Value;

use crate::error::SummarizeError;
use crate::non_empty_env;
use crate::request::PalettePayload;

pub const DEFAULT_API_URL: &str = "http://localhost:8000/summarize";
pub const DEFAULT_TIMEOUT_S: f64 = 120.0;
const ERROR_BODY_MAX_CHARS: usize = 512;

/// The external palette-extraction service.
pub trait PaletteService: Send + Sync {
    fn summarize(&self, payload: PalettePayload) -> Result<PaletteResult, SummarizeError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub endpoint: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs_f64(DEFAULT_TIMEOUT_S),
        }
    }
}

impl ClientConfig {
    /// Reads `COLORSUM_API_URL` and `COLORSUM_TIMEOUT_S`, keeping defaults for blanks.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(endpoint) = non_empty_env("COLORSUM_API_URL") {
            config.endpoint = endpoint;
        }
        if let Some(timeout) = non_empty_env("COLORSUM_TIMEOUT_S")
            .and_then(|value| value.parse::<f64>().ok())
            .and_then(timeout_from_secs)
        {
            config.timeout = timeout;
        }
        config
    }

    pub fn with_endpoint(mut self, endpoint: Option<&str>) -> Self {
        if let Some(endpoint) = endpoint.map(str::trim).filter(|value| !value.is_empty()) {
            self.endpoint = endpoint.to_string();
        }
        self
    }

    pub fn with_timeout_s(mut self, timeout_s: Option<f64>) -> Self {
        if let Some(timeout) = timeout_s.and_then(timeout_from_secs) {
            self.timeout = timeout;
        }
        self
    }
}

/// Positive durations that fit in a `Duration`; anything else keeps the default.
fn timeout_from_secs(seconds: f64) -> Option<Duration> {
    if seconds <= 0.0 {
        return None;
    }
    Duration::try_from_secs_f64(seconds).ok()
}

/// HTTP client for the palette service. One attempt per call, no retries.
#[derive(Debug, Clone)]
pub struct SummarizationClient {
    endpoint: String,
    http: HttpClient,
}

impl SummarizationClient {
    pub fn new(config: &ClientConfig) -> anyhow::Result<Self> {
        let http = HttpClient::builder()
            .timeout(config.timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            endpoint: config.endpoint.clone(),
            http,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl PaletteService for SummarizationClient {
    fn summarize(&self, payload: PalettePayload) -> Result<PaletteResult, SummarizeError> {
        let form = payload
            .into_form()
            .map_err(|err| SummarizeError::transport(format!("{err:#}")))?;
        let response = self
            .http
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .map_err(|err| SummarizeError::transport(error_chain_text(&err)))?;

        let status = response.status();
        let body = response.text().map_err(|err| {
            SummarizeError::transport(format!(
                "failed reading response body: {}",
                error_chain_text(&err)
            ))
        })?;
        if !status.is_success() {
            return Err(SummarizeError::status(
                status.as_u16(),
                &truncate_text(&body, ERROR_BODY_MAX_CHARS),
            ));
        }
        parse_palette_body(&body)
    }
}

/// Extracts `palette` from a JSON body. A missing or null field is an empty palette.
pub fn parse_palette_body(body: &str) -> Result<PaletteResult, SummarizeError> {
    let parsed: Value = serde_json::from_str(body)
        .map_err(|err| SummarizeError::parse(format!("response is not valid JSON: {err}")))?;
    match parsed.get("palette") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(palette) => serde_json::from_value::<Vec<PaletteColor>>(palette.clone())
            .map_err(|err| SummarizeError::parse(format!("malformed palette in response: {err}"))),
    }
}

fn error_chain_text(err: &(dyn std::error::Error + 'static)) -> String {
    let mut parts = vec![err.to_string()];
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !parts.contains(&text) {
            parts.push(text);
        }
        source = cause.source();
    }
    parts.join(" | caused by: ")
}

fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}
