use fetchq_core::{parse, parse_text, FetchRequest, ParseError};
use pretty_assertions::assert_eq;

#[test]
fn bare_url_has_no_note_and_no_tags() {
    for payload in [
        "https://example.com/a",
        "  https://example.com/a  \n",
        "\n\nhttp://example.com/path?q=1#frag\n\n",
    ] {
        let request = parse_text(payload).unwrap();
        assert_eq!(request.note, None, "payload {payload:?}");
        assert!(request.tags.is_empty());
        assert!(request.url.starts_with("http"));
        assert_eq!(request.url, payload.trim());
    }
}

#[test]
fn annotated_text_keeps_note_line_breaks() {
    let note = "Read this later.\nSecond line\n\n- bullet";
    let payload = format!("https://example.com/post\n\n{note}");
    let request = parse_text(&payload).unwrap();
    assert_eq!(
        request,
        FetchRequest {
            url: "https://example.com/post".into(),
            note: Some(note.into()),
            tags: Vec::new(),
        }
    );
}

#[test]
fn annotated_text_accepts_crlf_line_endings() {
    let request = parse_text("https://example.com/post\r\n\r\nline one\r\nline two\r\n").unwrap();
    assert_eq!(request.note.as_deref(), Some("line one\nline two"));
}

#[test]
fn structured_record_reads_url_note_and_tags() {
    let payload = r#"{"url": "https://example.com/x", "note": "why", "tags": ["rust", "queue"]}"#;
    let request = parse_text(payload).unwrap();
    assert_eq!(request.url, "https://example.com/x");
    assert_eq!(request.note.as_deref(), Some("why"));
    assert_eq!(request.tags, vec!["rust".to_string(), "queue".to_string()]);
}

#[test]
fn structured_record_never_falls_through_to_text_paths() {
    // The note contains a URL that the plain-text paths would pick up.
    let payload = r#"{"url": "https://example.com/record", "note": "https://example.com/other"}"#;
    let request = parse_text(payload).unwrap();
    assert_eq!(request.url, "https://example.com/record");
    assert_eq!(request.note.as_deref(), Some("https://example.com/other"));
}

#[test]
fn structured_record_without_valid_url_is_malformed() {
    let missing = parse_text(r#"{"note": "see https://example.com/x"}"#).unwrap_err();
    assert!(matches!(missing, ParseError::MalformedStructured(_)));

    let invalid = parse_text(r#"{"url": "ftp://example.com/x"}"#).unwrap_err();
    assert!(matches!(invalid, ParseError::MalformedStructured(_)));

    let wrong_type = parse_text(r#"{"url": "https://example.com", "tags": "one"}"#).unwrap_err();
    assert!(matches!(wrong_type, ParseError::MalformedStructured(_)));
}

#[test]
fn invalid_json_falls_back_to_text_scanning() {
    let request = parse_text("{ not json https://example.com/x }").unwrap();
    assert_eq!(request, FetchRequest::bare("https://example.com/x"));
}

#[test]
fn url_embedded_in_prose_is_found_without_note() {
    let request = parse_text("saw this today:\n- https://example.com/found, neat").unwrap();
    assert_eq!(request, FetchRequest::bare("https://example.com/found"));
}

#[test]
fn url_line_without_blank_separator_has_no_note() {
    let request = parse_text("https://example.com/a\nnot a note").unwrap();
    assert_eq!(request, FetchRequest::bare("https://example.com/a"));
}

#[test]
fn payload_without_url_fails() {
    assert_eq!(parse_text("just some words\n\nand more").unwrap_err(), ParseError::NoUrlFound);
    assert_eq!(parse_text("").unwrap_err(), ParseError::NoUrlFound);
    assert_eq!(parse_text("ftp://example.com/file").unwrap_err(), ParseError::NoUrlFound);
}

#[test]
fn raw_bytes_are_decoded_before_parsing() {
    let request = parse(b"\xEF\xBB\xBFhttps://example.com/bom").unwrap();
    assert_eq!(request.url, "https://example.com/bom");
}
