//! Annotation entities and their serialized form.
//!
//! A [`Visual`] is anchored to a [`Context`] (file and line). [`Comment`] is
//! the only variant today; the serialized form is an object keyed by the
//! variant name so that new variants can be added without changing the
//! envelope:
//!
//! ```json
//! { "comment": { "id": "1", "context": { "lineNo": 10, "file": { "filename": "a.txt" } }, "text": "x" } }
//! ```

use serde::{Deserialize, Deserializer};
use serde_json::{Value, json};

use super::error::VisualImportError;
use super::ids::{IdentityGenerator, VisualId, is_valid};

const COMMENT_VARIANT: &str = "comment";

/// Reference to a file in the pull request diff.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileRef {
    filename: String,
}

impl FileRef {
    /// Wraps a repository-relative filename.
    #[must_use]
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
        }
    }

    /// Borrow the filename.
    #[must_use]
    pub const fn filename(&self) -> &str {
        self.filename.as_str()
    }
}

/// File and line a visual is anchored to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Context {
    file: FileRef,
    line_no: u64,
}

impl Context {
    /// Creates a location reference.
    #[must_use]
    pub const fn new(file: FileRef, line_no: u64) -> Self {
        Self { file, line_no }
    }

    /// The referenced file.
    #[must_use]
    pub const fn file(&self) -> &FileRef {
        &self.file
    }

    /// The referenced line number.
    #[must_use]
    pub const fn line_no(&self) -> u64 {
        self.line_no
    }

    fn export(&self) -> Value {
        json!({
            "lineNo": self.line_no,
            "file": { "filename": self.file.filename },
        })
    }
}

/// A text annotation on a line of the diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    id: VisualId,
    context: Context,
    text: String,
}

impl Comment {
    /// Builds a comment with an explicit identity.
    #[must_use]
    pub fn new(id: VisualId, context: Context, text: impl Into<String>) -> Self {
        Self {
            id,
            context,
            text: text.into(),
        }
    }

    /// Builds a comment with a freshly issued identity and empty text.
    #[must_use]
    pub fn create(ids: &mut IdentityGenerator, context: Context) -> Self {
        Self::new(ids.next_id(), context, String::new())
    }

    /// Returns a copy with replaced text and the same identity, which is how
    /// an edit is fed back through [`Presentation::add_or_replace_visual`].
    ///
    /// [`Presentation::add_or_replace_visual`]: super::Presentation::add_or_replace_visual
    #[must_use]
    pub fn with_text(&self, text: impl Into<String>) -> Self {
        Self::new(self.id.clone(), self.context.clone(), text)
    }

    /// Identity of the comment.
    #[must_use]
    pub const fn id(&self) -> &VisualId {
        &self.id
    }

    /// Location of the comment.
    #[must_use]
    pub const fn context(&self) -> &Context {
        &self.context
    }

    /// Comment body.
    #[must_use]
    pub const fn text(&self) -> &str {
        self.text.as_str()
    }

    /// Decodes `{ "comment": { ... } }`, preserving the stored identity.
    ///
    /// # Errors
    ///
    /// Returns [`VisualImportError::Malformed`] when `id`,
    /// `context.file.filename` or `context.lineNo` is missing or mistyped,
    /// and [`VisualImportError::MissingIdentity`] when `id` is empty.
    pub fn import(data: &Value) -> Result<Self, VisualImportError> {
        let body = data
            .get(COMMENT_VARIANT)
            .ok_or(VisualImportError::MissingVariant)?;
        let record =
            CommentRecord::deserialize(body).map_err(|error| VisualImportError::Malformed {
                variant: COMMENT_VARIANT,
                message: error.to_string(),
            })?;

        if !is_valid(&record.id) {
            return Err(VisualImportError::MissingIdentity {
                variant: COMMENT_VARIANT,
            });
        }

        let context = Context::new(
            FileRef::new(record.context.file.filename),
            record.context.line_no,
        );
        Ok(Self::new(VisualId::new(record.id), context, record.text))
    }

    /// Encodes the comment in its serialized form.
    #[must_use]
    pub fn export(&self) -> Value {
        json!({
            COMMENT_VARIANT: {
                "id": self.id.as_str(),
                "context": self.context.export(),
                "text": self.text,
            }
        })
    }
}

/// An annotation entity held by a [`Presentation`].
///
/// [`Presentation`]: super::Presentation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Visual {
    /// Text comment anchored to a line.
    Comment(Comment),
}

impl Visual {
    /// Identity shared by all variants.
    #[must_use]
    pub const fn id(&self) -> &VisualId {
        match self {
            Self::Comment(comment) => comment.id(),
        }
    }

    /// Location shared by all variants.
    #[must_use]
    pub const fn context(&self) -> &Context {
        match self {
            Self::Comment(comment) => comment.context(),
        }
    }

    /// Borrow the comment when this visual is one.
    #[must_use]
    pub const fn as_comment(&self) -> Option<&Comment> {
        match self {
            Self::Comment(comment) => Some(comment),
        }
    }

    /// Decodes a serialized visual by reading its variant key.
    ///
    /// # Errors
    ///
    /// Returns [`VisualImportError::MissingVariant`] when `data` is not an
    /// object with a key, [`VisualImportError::UnknownVariant`] for keys this
    /// build does not know, and the variant importer's error otherwise.
    pub fn import(data: &Value) -> Result<Self, VisualImportError> {
        let variant = data
            .as_object()
            .and_then(|object| object.keys().next())
            .ok_or(VisualImportError::MissingVariant)?;

        match variant.as_str() {
            COMMENT_VARIANT => Comment::import(data).map(Self::Comment),
            other => Err(VisualImportError::UnknownVariant {
                variant: other.to_owned(),
            }),
        }
    }

    /// Encodes the visual in its serialized form.
    #[must_use]
    pub fn export(&self) -> Value {
        match self {
            Self::Comment(comment) => comment.export(),
        }
    }
}

impl From<Comment> for Visual {
    fn from(value: Comment) -> Self {
        Self::Comment(value)
    }
}

#[derive(Debug, Deserialize)]
struct CommentRecord {
    id: String,
    context: ContextRecord,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContextRecord {
    #[serde(deserialize_with = "deserialize_line_no")]
    line_no: u64,
    file: FileRecord,
}

#[derive(Debug, Deserialize)]
struct FileRecord {
    filename: String,
}

/// Line numbers written by older clients were scraped from DOM attributes
/// and stored as strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum LineNumberRepr {
    Number(u64),
    Text(String),
}

fn deserialize_line_no<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match LineNumberRepr::deserialize(deserializer)? {
        LineNumberRepr::Number(value) => Ok(value),
        LineNumberRepr::Text(text) => text.trim().parse().map_err(|_| {
            serde::de::Error::custom(format!("lineNo must be an integer, got {text:?}"))
        }),
    }
}

#[cfg(test)]
#[path = "visual_tests.rs"]
mod tests;
