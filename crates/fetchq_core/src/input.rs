//! Input Parser: turns a queue payload into a [`FetchRequest`].
//!
//! Encodings are tried in order: structured JSON record, annotated plain
//! text (`<url>`, blank line, note), bare URL, and finally the first URL
//! token found anywhere in the text.

use serde::Deserialize;
use url::Url;

use crate::decode::{decode_payload, DecodeError};
use crate::FetchRequest;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("no url found in payload")]
    NoUrlFound,
    #[error("malformed structured payload: {0}")]
    MalformedStructured(String),
    #[error("undecodable payload: {0}")]
    Undecodable(#[from] DecodeError),
}

#[derive(Debug, Deserialize)]
struct StructuredPayload {
    url: Option<String>,
    #[serde(default)]
    note: Option<String>,
    #[serde(default)]
    tags: Option<Vec<String>>,
}

pub fn parse(raw_payload: &[u8]) -> Result<FetchRequest, ParseError> {
    let text = decode_payload(raw_payload)?;
    parse_text(&text)
}

pub fn parse_text(payload: &str) -> Result<FetchRequest, ParseError> {
    let normalized = payload.replace("\r\n", "\n");
    let trimmed = normalized.trim();

    if let Some(request) = parse_structured(trimmed)? {
        return Ok(request);
    }
    if let Some(request) = parse_annotated(trimmed) {
        return Ok(request);
    }
    if is_valid_url(trimmed) {
        return Ok(FetchRequest::bare(trimmed));
    }
    find_embedded_url(trimmed)
        .map(FetchRequest::bare)
        .ok_or(ParseError::NoUrlFound)
}

/// Syntactic check only: `http`/`https` scheme, non-empty host, no whitespace.
pub fn is_valid_url(candidate: &str) -> bool {
    if candidate.is_empty() || candidate.chars().any(char::is_whitespace) {
        return false;
    }
    match Url::parse(candidate) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https")
                && url.host_str().is_some_and(|host| !host.is_empty())
        }
        Err(_) => false,
    }
}

/// `Ok(None)` means the text is not JSON and the plain-text paths apply.
fn parse_structured(text: &str) -> Result<Option<FetchRequest>, ParseError> {
    if !text.starts_with('{') {
        return Ok(None);
    }
    let value: serde_json::Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(_) => return Ok(None),
    };
    let payload: StructuredPayload = serde_json::from_value(value)
        .map_err(|err| ParseError::MalformedStructured(err.to_string()))?;

    let url = payload
        .url
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
        .ok_or_else(|| ParseError::MalformedStructured("missing url field".into()))?;
    if !is_valid_url(&url) {
        return Err(ParseError::MalformedStructured(format!("invalid url {url}")));
    }

    Ok(Some(FetchRequest {
        url,
        note: payload
            .note
            .map(|note| note.trim().to_string())
            .filter(|note| !note.is_empty()),
        tags: payload.tags.unwrap_or_default(),
    }))
}

fn parse_annotated(text: &str) -> Option<FetchRequest> {
    let (first_line, rest) = text.split_once('\n')?;
    let url = first_line.trim();
    if !is_valid_url(url) {
        return None;
    }
    let (separator, note) = rest.split_once('\n')?;
    if !separator.trim().is_empty() {
        return None;
    }
    let note = note.trim();
    if note.is_empty() {
        return None;
    }
    Some(FetchRequest {
        url: url.to_string(),
        note: Some(note.to_string()),
        tags: Vec::new(),
    })
}

fn find_embedded_url(text: &str) -> Option<String> {
    text.split_whitespace()
        .filter(|token| token.contains("http://") || token.contains("https://"))
        .map(|token| {
            let start = token
                .find("http://")
                .into_iter()
                .chain(token.find("https://"))
                .min()
                .unwrap_or(0);
            token[start..].trim_end_matches(&[')', '>', ']', ',', '.', ';', '"', '\''][..])
        })
        .find(|candidate| is_valid_url(candidate))
        .map(str::to_string)
}
