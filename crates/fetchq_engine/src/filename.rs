use std::path::Path;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use url::Url;

const MAX_SLUG_CHARS: usize = 50;

/// Document key for a committed item: `{fetched_at}-{slug}--{short_hash(seed)}.md`.
///
/// `seed` is a queue id or, for single-URL dispatch, the URL itself. Queue ids
/// are slugged from their file stem; URLs from host plus last path segment.
/// The hash covers the whole seed, so ids that slug alike (`a.txt`, `a.md`)
/// still get distinct keys. The timestamp prefix keeps documents ordered and
/// gives a later run of the same seed a new key instead of an overwrite.
pub fn document_key(seed: &str, fetched_at: DateTime<Utc>) -> String {
    let label = url_label(seed).unwrap_or_else(|| {
        Path::new(seed)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(seed)
            .to_string()
    });
    let mut slug = slugify(&label);
    if slug.is_empty() {
        slug = "item".to_string();
    }
    format!(
        "{}-{slug}--{}.md",
        fetched_at.format("%Y-%m-%dT%H%M%S"),
        short_hash(seed)
    )
}

/// Lowercase, alphanumerics kept, every other run of characters becomes one `-`.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;
    for c in input.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }
    slug.chars().take(MAX_SLUG_CHARS).collect::<String>().trim_end_matches('-').to_string()
}

/// `host last-segment-stem` for http(s) URLs, `None` for anything else.
fn url_label(seed: &str) -> Option<String> {
    let url = Url::parse(seed).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    let host = url.host_str()?;
    let segment = url
        .path_segments()
        .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
        .map(|segment| {
            Path::new(segment)
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or(segment)
                .to_string()
        });
    Some(match segment {
        Some(segment) => format!("{host} {segment}"),
        None => host.to_string(),
    })
}

fn short_hash(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    let mut hex = String::with_capacity(8);
    for byte in digest.iter().take(4) {
        use std::fmt::Write;
        let _ = write!(&mut hex, "{byte:02x}");
    }
    hex
}
