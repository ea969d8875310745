//! Best-effort title extraction from extracted text.
//!
//! Never fails: content without a recognisable title yields `title: None`
//! and the whole (trimmed) content as body.

/// Lines longer than this are treated as prose, not as a heading.
pub const MAX_TITLE_CHARS: usize = 120;

const ENVELOPE_TITLE: &str = "Title:";
const ENVELOPE_CONTENT_MARKER: &str = "Markdown Content:";
const ENVELOPE_HEADERS: &[&str] = &["Title:", "URL Source:", "Published Time:", "Warning:"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitledBody {
    pub title: Option<String>,
    pub body: String,
}

/// Split extracted content into an optional title and the remaining body.
///
/// Recognised, in order:
/// - a reader-service envelope (`Title: ...` headers, then `Markdown Content:`)
/// - an ATX heading (`# Title`) or setext heading (`Title` over `===`)
/// - a short heading-like first line followed by more content
pub fn split_title(content: &str) -> TitledBody {
    let normalized = content.replace("\r\n", "\n");
    if let Some(envelope) = unwrap_envelope(&normalized) {
        if envelope.title.is_some() {
            return envelope;
        }
        return split_heading(&envelope.body);
    }
    split_heading(&normalized)
}

fn unwrap_envelope(content: &str) -> Option<TitledBody> {
    let first = content.lines().find(|line| !line.trim().is_empty())?;
    if !ENVELOPE_HEADERS
        .iter()
        .any(|header| first.trim_start().starts_with(header))
    {
        return None;
    }
    let marker_at = content
        .match_indices(ENVELOPE_CONTENT_MARKER)
        .map(|(idx, _)| idx)
        .find(|idx| *idx == 0 || content[..*idx].ends_with('\n'))?;

    let header = &content[..marker_at];
    let title = header
        .lines()
        .find_map(|line| line.trim().strip_prefix(ENVELOPE_TITLE))
        .map(str::trim)
        .filter(|title| !title.is_empty())
        .map(str::to_string);
    let body = content[marker_at + ENVELOPE_CONTENT_MARKER.len()..]
        .trim()
        .to_string();
    Some(TitledBody { title, body })
}

fn split_heading(content: &str) -> TitledBody {
    let trimmed = content.trim();
    let (first, rest) = match trimmed.split_once('\n') {
        Some((first, rest)) => (first.trim(), rest),
        None => (trimmed, ""),
    };

    if let Some(heading) = atx_heading(first) {
        let body = rest.trim();
        return TitledBody {
            title: Some(heading.to_string()),
            body: if body.is_empty() { trimmed } else { body }.to_string(),
        };
    }

    if let Some((underline, after)) = split_first_line(rest) {
        if is_setext_underline(underline) && is_heading_like(first) && !after.trim().is_empty() {
            return TitledBody {
                title: Some(first.to_string()),
                body: after.trim().to_string(),
            };
        }
    }

    let body = rest.trim();
    if is_heading_like(first) && !body.is_empty() {
        return TitledBody {
            title: Some(first.to_string()),
            body: body.to_string(),
        };
    }

    TitledBody {
        title: None,
        body: trimmed.to_string(),
    }
}

fn split_first_line(text: &str) -> Option<(&str, &str)> {
    if text.is_empty() {
        return None;
    }
    Some(text.split_once('\n').unwrap_or((text, "")))
}

fn atx_heading(line: &str) -> Option<&str> {
    let hashes = line.chars().take_while(|c| *c == '#').count();
    if hashes == 0 || hashes > 6 {
        return None;
    }
    let rest = &line[hashes..];
    if !rest.starts_with(' ') {
        return None;
    }
    let heading = rest.trim().trim_end_matches('#').trim();
    (!heading.is_empty()).then_some(heading)
}

fn is_setext_underline(line: &str) -> bool {
    let line = line.trim();
    !line.is_empty() && line.chars().all(|c| c == '=')
}

fn is_heading_like(line: &str) -> bool {
    if line.is_empty() || line.chars().count() > MAX_TITLE_CHARS {
        return false;
    }
    if line.ends_with(&['.', ',', ';', ':'][..]) {
        return false;
    }
    if line.starts_with(&['-', '*', '>', '|', '<', '`', '!', '['][..]) {
        return false;
    }
    !(line.starts_with("http://") || line.starts_with("https://"))
}
