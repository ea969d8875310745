use std::time::Duration;

use fetchq_core::{decode_payload, FailureKind, FetchError};
use fetchq_logging::fetchq_debug;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde::Serialize;

use crate::backend::{RenderBackend, RenderedPage};
use crate::extract::extract_page;
use crate::reader::{build_client, map_reqwest_error, read_limited};

#[derive(Debug, Clone)]
pub struct RenderSettings {
    /// Rendering service that answers `POST {"url": ...}` with rendered HTML.
    /// `None` leaves the fallback unavailable.
    pub endpoint: Option<String>,
    pub connect_timeout: Duration,
    pub max_bytes: u64,
    pub user_agent: String,
    pub api_key: Option<String>,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            connect_timeout: Duration::from_secs(10),
            max_bytes: 10 * 1024 * 1024,
            user_agent: concat!("fetchq/", env!("CARGO_PKG_VERSION")).to_string(),
            api_key: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct RenderRequest<'a> {
    url: &'a str,
}

#[derive(Debug, Clone)]
pub struct HttpRenderBackend {
    settings: RenderSettings,
}

impl HttpRenderBackend {
    pub fn new(settings: RenderSettings) -> Self {
        Self { settings }
    }
}

#[async_trait::async_trait]
impl RenderBackend for HttpRenderBackend {
    async fn render(&self, url: &str, timeout: Duration) -> Result<RenderedPage, FetchError> {
        let endpoint = self.settings.endpoint.as_deref().ok_or_else(|| {
            FetchError::new(FailureKind::Unavailable, "no render endpoint configured")
        })?;
        let client = build_client(self.settings.connect_timeout, 5, &self.settings.user_agent)?;
        let payload = serde_json::to_vec(&RenderRequest { url })
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))?;
        fetchq_debug!("render request {} for {}", endpoint, url);

        let mut request = client
            .post(endpoint)
            .timeout(timeout)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "text/html")
            .body(payload);
        if let Some(key) = self.settings.api_key.as_deref() {
            request = request.header(AUTHORIZATION, format!("Bearer {key}"));
        }
        let response = request.send().await.map_err(map_reqwest_error)?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            return Ok(RenderedPage {
                status,
                title: None,
                extracted_text: String::new(),
            });
        }

        let bytes = read_limited(response, self.settings.max_bytes).await?;
        let html = decode_payload(&bytes)
            .map_err(|err| FetchError::new(FailureKind::EmptyExtraction, err.to_string()))?;
        let page = extract_page(&html);
        Ok(RenderedPage {
            status,
            title: page.title,
            extracted_text: page.markdown,
        })
    }
}
