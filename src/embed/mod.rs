//! Embedding structured data inside free-form host text.
//!
//! The data travels as pretty-printed JSON between two copies of a marker
//! token, wrapped in an HTML comment so it stays invisible when GitHub
//! renders the description as markdown:
//!
//! ```text
//! <human text>\n<!-- ----<uuid>----{ ... }----<uuid>---- --><human text>
//! ```
//!
//! People edit the surrounding text freely, so parsing tolerates missing
//! comment wrappers and arbitrary content on either side. Anything that does
//! not contain a marker pair with valid JSON between them is reported as
//! "no embedded data" rather than as an error.

use std::fmt;

use serde_json::Value;
use uuid::{Uuid, uuid};

/// Token the default marker is built from.
pub const DEFAULT_TOKEN: Uuid = uuid!("cc91a745-d35c-466f-9047-3f20031fb4ae");

const COMMENT_OPEN: &str = "<!--";
const COMMENT_CLOSE: &str = "-->";

/// Delimiter placed on both sides of the embedded JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker(String);

impl Marker {
    /// Uses `delimiter` verbatim.
    #[must_use]
    pub fn new(delimiter: impl Into<String>) -> Self {
        Self(delimiter.into())
    }

    /// Builds the conventional `----<token>----` delimiter.
    #[must_use]
    pub fn from_token(token: Uuid) -> Self {
        Self(format!("----{token}----"))
    }

    /// Borrow the delimiter.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Default for Marker {
    fn default() -> Self {
        Self::from_token(DEFAULT_TOKEN)
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Host text split into its human-authored part and the embedded data.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedBlock {
    /// Text outside the embedded block, prefix followed by suffix.
    pub comment: String,
    /// Decoded JSON payload.
    pub data: Value,
}

impl EmbeddedBlock {
    /// Wraps a comment and payload.
    #[must_use]
    pub fn new(comment: impl Into<String>, data: Value) -> Self {
        Self {
            comment: comment.into(),
            data,
        }
    }
}

/// Extracts the embedded block from `host_text`.
///
/// The block starts at the first marker (optionally preceded by `<!--` and
/// whitespace) and ends at the last one (optionally followed by whitespace
/// and `-->`). A single line break between non-whitespace text and the
/// block is the separator [`render`] inserts and is dropped from the
/// comment.
///
/// Returns `None` when no marker pair is present or the enclosed body is
/// not valid JSON.
///
/// # Examples
///
/// ```
/// use storyline::embed::{Marker, parse};
///
/// let marker = Marker::new("MMM");
/// let block = parse("hello\n<!-- MMM{\"n\": 1}MMM -->", &marker).expect("block present");
/// assert_eq!(block.comment, "hello");
/// assert_eq!(block.data["n"], 1);
///
/// assert!(parse("no marker here", &marker).is_none());
/// ```
#[must_use]
pub fn parse(host_text: &str, marker: &Marker) -> Option<EmbeddedBlock> {
    let delimiter = marker.as_str();
    if delimiter.is_empty() {
        return None;
    }

    let (before_marker, rest) = host_text.split_once(delimiter)?;
    let Some((body, after_marker)) = rest.rsplit_once(delimiter) else {
        tracing::debug!("host text contains an unterminated embedded block");
        return None;
    };

    let data: Value = match serde_json::from_str(body) {
        Ok(data) => data,
        Err(error) => {
            tracing::debug!("embedded block is not valid JSON: {error}");
            return None;
        }
    };

    let before = strip_separator(strip_comment_open(before_marker));
    let after = strip_comment_close(after_marker);

    Some(EmbeddedBlock {
        comment: format!("{before}{after}"),
        data,
    })
}

/// The human-written part of `host_text`.
///
/// This is the comment of a parsable block, or the whole text when no marker
/// is present. A block that cannot be parsed is cut out (from the first
/// marker to the last, with its comment wrapper) so that rendering a fresh
/// block never leaves a stale one in front of it. A lone marker is removed.
#[must_use]
pub fn human_text(host_text: &str, marker: &Marker) -> String {
    if let Some(block) = parse(host_text, marker) {
        return block.comment;
    }

    let delimiter = marker.as_str();
    if delimiter.is_empty() {
        return host_text.to_owned();
    }
    let Some((before_marker, rest)) = host_text.split_once(delimiter) else {
        return host_text.to_owned();
    };
    let Some((_, after_marker)) = rest.rsplit_once(delimiter) else {
        tracing::warn!("dropping an unterminated embedded block marker");
        return format!("{before_marker}{rest}");
    };

    tracing::warn!("discarding an embedded block that is not valid JSON");
    let before = strip_separator(strip_comment_open(before_marker));
    let after = strip_comment_close(after_marker);
    format!("{before}{after}")
}

/// Renders `block` as host text: the comment, a newline when the comment is
/// non-empty and does not already end in whitespace, then the wrapped
/// marker block with two-space indented JSON.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use storyline::embed::{EmbeddedBlock, Marker, render};
///
/// let text = render(&EmbeddedBlock::new("hello", json!({ "n": 1 })), &Marker::new("MMM"));
/// assert_eq!(text, "hello\n<!-- MMM{\n  \"n\": 1\n}MMM -->");
/// ```
#[must_use]
pub fn render(block: &EmbeddedBlock, marker: &Marker) -> String {
    let comment = block.comment.as_str();
    if comment.contains(marker.as_str()) {
        tracing::warn!("comment text contains the embedding marker; it will not parse back cleanly");
    }

    let separator = if comment.is_empty() || comment.ends_with(char::is_whitespace) {
        ""
    } else {
        "\n"
    };

    format!(
        "{comment}{separator}{COMMENT_OPEN} {marker}{data:#}{marker} {COMMENT_CLOSE}",
        data = block.data
    )
}

fn strip_comment_open(before: &str) -> &str {
    before
        .trim_end()
        .strip_suffix(COMMENT_OPEN)
        .unwrap_or(before)
}

fn strip_comment_close(after: &str) -> &str {
    after
        .trim_start()
        .strip_prefix(COMMENT_CLOSE)
        .unwrap_or(after)
}

/// Drops the newline [`render`] inserts, which only ever follows a
/// non-whitespace character.
fn strip_separator(before: &str) -> &str {
    match before.strip_suffix('\n') {
        Some(stripped) if stripped.ends_with(|ch: char| !ch.is_whitespace()) => stripped,
        _ => before,
    }
}
