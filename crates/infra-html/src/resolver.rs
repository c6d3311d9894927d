// HTTP URL Resolver - job id -> external apply URL via the platform's job API

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use jobsweep_core::error::{AppError, Result};
use jobsweep_core::port::{ResolutionError, UrlResolver};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, COOKIE};
use tracing::debug;

pub const DEFAULT_URL_ATTRIBUTE: &str = "companyApplyUrl";
const JOB_ID_PLACEHOLDER: &str = "{job_id}";

/// Resolver endpoint and session credentials
#[derive(Debug, Clone)]
pub struct ResolverSettings {
    /// Request URL with a `{job_id}` placeholder
    pub endpoint_template: String,
    pub cookie: Option<String>,
    pub csrf_token: Option<String>,
    pub url_attribute: String,
    /// Per-request limit; `None` waits for the server
    pub timeout: Option<Duration>,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            endpoint_template: "https://www.linkedin.com/voyager/api/jobs/jobPostings/{job_id}"
                .to_string(),
            cookie: None,
            csrf_token: None,
            url_attribute: DEFAULT_URL_ATTRIBUTE.to_string(),
            timeout: None,
        }
    }
}

pub struct HttpUrlResolver {
    client: reqwest::Client,
    endpoint_template: String,
    url_attribute: String,
}

impl HttpUrlResolver {
    pub fn new(settings: ResolverSettings) -> Result<Self> {
        if !settings.endpoint_template.contains(JOB_ID_PLACEHOLDER) {
            return Err(AppError::Config(format!(
                "resolver endpoint must contain {}: {}",
                JOB_ID_PLACEHOLDER, settings.endpoint_template
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(cookie) = &settings.cookie {
            headers.insert(COOKIE, header_value("cookie", cookie)?);
        }
        if let Some(token) = &settings.csrf_token {
            headers.insert("csrf-token", header_value("csrf-token", token)?);
        }

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = settings.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint_template: settings.endpoint_template,
            url_attribute: settings.url_attribute,
        })
    }

    fn endpoint(&self, job_id: &str) -> String {
        self.endpoint_template.replace(JOB_ID_PLACEHOLDER, job_id)
    }
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| AppError::Config(format!("invalid {} header: {}", name, e)))
}

#[async_trait]
impl UrlResolver for HttpUrlResolver {
    async fn resolve(&self, job_id: &str) -> std::result::Result<Option<String>, ResolutionError> {
        let response = self
            .client
            .get(self.endpoint(job_id))
            .send()
            .await
            .map_err(|e| ResolutionError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResolutionError::Status(status.as_u16()));
        }

        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| ResolutionError::Network(e.to_string()))?;
            body.extend_from_slice(&chunk);
        }

        let json: serde_json::Value =
            serde_json::from_slice(&body).map_err(|e| ResolutionError::Malformed(e.to_string()))?;

        let url = find_url_attribute(&json, &self.url_attribute);
        debug!(job_id = %job_id, bytes = body.len(), found = url.is_some(), "Job API response parsed");
        Ok(url)
    }
}

/// First string field named `attribute` holding an http(s) URL, searched
/// depth-first in document order
pub fn find_url_attribute(value: &serde_json::Value, attribute: &str) -> Option<String> {
    match value {
        serde_json::Value::Object(map) => map.iter().find_map(|(key, child)| {
            match child {
                serde_json::Value::String(s) if key == attribute && is_http_url(s) => {
                    Some(s.clone())
                }
                _ => find_url_attribute(child, attribute),
            }
        }),
        serde_json::Value::Array(items) => {
            items.iter().find_map(|item| find_url_attribute(item, attribute))
        }
        _ => None,
    }
}

fn is_http_url(s: &str) -> bool {
    s.starts_with("https://") || s.starts_with("http://")
}
