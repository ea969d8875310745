use std::time::Duration;

use fetchq_core::{decode_payload, FailureKind, FetchError};
use fetchq_logging::fetchq_debug;
use futures_util::StreamExt;
use reqwest::header::{ACCEPT, AUTHORIZATION};

use crate::backend::{BackendResponse, ReaderBackend};

pub const DEFAULT_READER_ENDPOINT: &str = "https://r.jina.ai/";

#[derive(Debug, Clone)]
pub struct ReaderSettings {
    /// Prefix the target URL is appended to.
    pub endpoint: String,
    pub connect_timeout: Duration,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    pub user_agent: String,
    /// Sent as a bearer token when set.
    pub api_key: Option<String>,
}

impl Default for ReaderSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_READER_ENDPOINT.to_string(),
            connect_timeout: Duration::from_secs(10),
            redirect_limit: 5,
            max_bytes: 5 * 1024 * 1024,
            user_agent: concat!("fetchq/", env!("CARGO_PKG_VERSION")).to_string(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReqwestReader {
    settings: ReaderSettings,
}

impl ReqwestReader {
    pub fn new(settings: ReaderSettings) -> Self {
        Self { settings }
    }

    fn reader_url(&self, url: &str) -> String {
        format!("{}{}", self.settings.endpoint, url)
    }
}

#[async_trait::async_trait]
impl ReaderBackend for ReqwestReader {
    async fn request(&self, url: &str, timeout: Duration) -> Result<BackendResponse, FetchError> {
        let client = build_client(
            self.settings.connect_timeout,
            self.settings.redirect_limit,
            &self.settings.user_agent,
        )?;
        let target = self.reader_url(url);
        fetchq_debug!("reader request {}", target);

        let mut request = client.get(&target).timeout(timeout).header(ACCEPT, "text/plain");
        if let Some(key) = self.settings.api_key.as_deref() {
            request = request.header(AUTHORIZATION, format!("Bearer {key}"));
        }
        let response = request.send().await.map_err(map_reqwest_error)?;

        let status = response.status().as_u16();
        let bytes = read_limited(response, self.settings.max_bytes).await?;
        let body = decode_payload(&bytes)
            .map_err(|err| FetchError::new(FailureKind::EmptyExtraction, err.to_string()))?;
        Ok(BackendResponse { status, body })
    }
}

pub(crate) fn build_client(
    connect_timeout: Duration,
    redirect_limit: usize,
    user_agent: &str,
) -> Result<reqwest::Client, FetchError> {
    reqwest::Client::builder()
        .connect_timeout(connect_timeout)
        .redirect(reqwest::redirect::Policy::limited(redirect_limit))
        .user_agent(user_agent)
        .build()
        .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))
}

/// Stream the body, failing as soon as it exceeds `max_bytes`.
pub(crate) async fn read_limited(
    response: reqwest::Response,
    max_bytes: u64,
) -> Result<Vec<u8>, FetchError> {
    if let Some(content_len) = response.content_length() {
        if content_len > max_bytes {
            return Err(too_large(max_bytes, content_len));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(map_reqwest_error)?;
        let next_len = bytes.len() as u64 + chunk.len() as u64;
        if next_len > max_bytes {
            return Err(too_large(max_bytes, next_len));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

fn too_large(max_bytes: u64, actual: u64) -> FetchError {
    FetchError::new(
        FailureKind::TooLarge {
            max_bytes,
            actual: Some(actual),
        },
        "response too large",
    )
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}
