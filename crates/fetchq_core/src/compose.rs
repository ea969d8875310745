use crate::{FetchRequest, FetchedContent, OutputDocument};

/// Document Composer: builds the terminal document for a successful fetch.
///
/// Pure. `fetched_at` is taken from the fetch result, the title falls back
/// to the URL, and a note is carried over only when the request has one.
pub fn compose(request: &FetchRequest, fetched: &FetchedContent) -> OutputDocument {
    let title = fetched
        .title
        .as_deref()
        .map(str::trim)
        .filter(|title| !title.is_empty())
        .unwrap_or(&request.url)
        .to_string();
    let body = strip_repeated_heading(&fetched.body, &title).to_string();

    OutputDocument {
        url: request.url.clone(),
        title,
        fetched_at: fetched.fetched_at,
        source_note: request.note.clone(),
        tags: request.tags.clone(),
        body,
    }
}

/// The serialised document always starts with `# {title}`; drop a leading
/// copy of that heading from the body.
fn strip_repeated_heading<'a>(body: &'a str, title: &str) -> &'a str {
    let trimmed = body.trim();
    let Some((first, rest)) = trimmed.split_once('\n') else {
        return trimmed;
    };
    let heading = first.trim().trim_start_matches('#');
    let is_same_heading = first.starts_with("# ") && heading.trim() == title;
    if is_same_heading && !rest.trim().is_empty() {
        rest.trim()
    } else {
        trimmed
    }
}
