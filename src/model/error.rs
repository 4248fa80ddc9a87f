//! Error types raised while decoding serialized visuals.

use thiserror::Error;

/// Reasons a serialized visual could not be turned back into a [`Visual`].
///
/// [`Visual`]: super::Visual
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VisualImportError {
    /// The value was not an object carrying a variant key.
    #[error("serialized visual must be an object keyed by its variant")]
    MissingVariant,

    /// The variant key is not one this build understands.
    #[error("unknown visual variant: {variant}")]
    UnknownVariant {
        /// The discriminant key found in the serialized object.
        variant: String,
    },

    /// A required field was absent or had the wrong shape.
    #[error("malformed {variant} visual: {message}")]
    Malformed {
        /// The variant being decoded.
        variant: &'static str,
        /// Decoder detail naming the offending field.
        message: String,
    },

    /// The visual carried an empty identity.
    #[error("{variant} visual has an empty id")]
    MissingIdentity {
        /// The variant being decoded.
        variant: &'static str,
    },
}
