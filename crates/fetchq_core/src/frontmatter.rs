use chrono::SecondsFormat;
use serde_json::Value;

use crate::OutputDocument;

/// Serialise a document as front-matter, a level-1 title heading and the body.
///
/// `title` and `source_note` are double-quoted scalars (JSON escaping is a
/// subset of YAML double-quoted syntax), so notes keep their line breaks.
/// `source_note` and `tags` are omitted when absent.
pub fn build_markdown_document(doc: &OutputDocument) -> String {
    let mut frontmatter = format!(
        "---\nurl: {url}\ntitle: {title}\nfetched_at: {fetched_at}\n",
        url = doc.url,
        title = quoted(&doc.title),
        fetched_at = doc.fetched_at.to_rfc3339_opts(SecondsFormat::Secs, true),
    );
    if let Some(note) = doc.source_note.as_deref() {
        frontmatter.push_str(&format!("source_note: {}\n", quoted(note)));
    }
    if !doc.tags.is_empty() {
        frontmatter.push_str(&format!("tags: {}\n", Value::from(doc.tags.clone())));
    }
    frontmatter.push_str("---\n\n");

    format!(
        "{frontmatter}# {title}\n\n{body}\n",
        frontmatter = frontmatter,
        title = single_line(&doc.title),
        body = doc.body.trim_end(),
    )
}

fn quoted(value: &str) -> String {
    Value::String(value.to_string()).to_string()
}

fn single_line(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}
