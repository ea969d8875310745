//! Fetchq core: data model and the pure stages of the materialization pipeline.
mod compose;
mod decode;
mod frontmatter;
mod input;
mod title;
mod types;

pub use compose::compose;
pub use decode::{decode_payload, DecodeError};
pub use frontmatter::build_markdown_document;
pub use input::{is_valid_url, parse, parse_text, ParseError};
pub use title::{split_title, TitledBody, MAX_TITLE_CHARS};
pub use types::{
    FailureKind, FetchError, FetchFailure, FetchRequest, FetchResult, FetchedContent,
    OutputDocument, QueueItem, Strategy,
};
