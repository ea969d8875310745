use scraper::{Html, Selector};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPage {
    pub title: Option<String>,
    pub markdown: String,
}

/// Containers tried in order; the first match wins.
const CONTENT_SELECTORS: &[&str] = &["main", "article", ".content", "#content", "body"];

/// Conversation turns on chat-share pages, tried in order; the first
/// selector with any match wins.
const TURN_SELECTORS: &[&str] = &[
    "[data-message-author-role]",
    "[data-testid*=\"message\"]",
    "[class*=\"ConversationItem\"]",
];

/// Turns this short are UI fragments, not messages.
const MIN_TURN_CHARS: usize = 10;

const TURN_SEPARATOR: &str = "\n\n---\n\n";

/// Suffixes and prefixes that chat-share pages add to their `<title>`.
const TITLE_DECORATIONS: &[&str] = &[" - Claude", " | ChatGPT", "ChatGPT - "];

/// Pull the `<title>` and the main content of a rendered page, and convert
/// that content to markdown. Falls back to the whole document.
pub fn extract_page(html: &str) -> ExtractedPage {
    let doc = Html::parse_document(html);

    let title = Selector::parse("title")
        .ok()
        .and_then(|sel| {
            doc.select(&sel)
                .next()
                .map(|t| t.text().collect::<String>())
        })
        .map(|title| clean_title(&title))
        .filter(|title| !title.is_empty());

    if let Some(markdown) = conversation_markdown(&doc) {
        return ExtractedPage { title, markdown };
    }

    let content_html = CONTENT_SELECTORS
        .iter()
        .filter_map(|raw| Selector::parse(raw).ok())
        .find_map(|sel| doc.select(&sel).next().map(|node| node.inner_html()))
        .unwrap_or_else(|| doc.root_element().html());

    ExtractedPage {
        title,
        markdown: html2md::parse_html(&content_html).trim().to_string(),
    }
}

/// Chat-share turns as markdown, speakers labelled when the page says who
/// wrote each turn. `None` when the page has no recognisable turns.
fn conversation_markdown(doc: &Html) -> Option<String> {
    let turns = TURN_SELECTORS
        .iter()
        .filter_map(|raw| Selector::parse(raw).ok())
        .map(|sel| doc.select(&sel).collect::<Vec<_>>())
        .find(|turns| !turns.is_empty())?;

    let messages: Vec<String> = turns
        .into_iter()
        .filter_map(|turn| {
            let text = html2md::parse_html(&turn.inner_html()).trim().to_string();
            if text.chars().count() <= MIN_TURN_CHARS {
                return None;
            }
            Some(match turn.value().attr("data-message-author-role") {
                Some("user") => format!("**Human:**\n{text}"),
                Some("assistant") => format!("**Assistant:**\n{text}"),
                _ => text,
            })
        })
        .collect();

    if messages.is_empty() {
        None
    } else {
        Some(messages.join(TURN_SEPARATOR))
    }
}

fn clean_title(raw: &str) -> String {
    let mut title = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    for decoration in TITLE_DECORATIONS {
        title = title.replace(decoration, "");
    }
    title.trim().to_string()
}
