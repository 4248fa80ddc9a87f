//! Annotation model: identities, visuals and the ordered presentation.
//!
//! Nothing in this module performs I/O. Mutations are synchronous and
//! observers are notified before the mutating call returns.

pub mod error;
pub mod ids;
pub mod presentation;
pub mod visual;

pub use error::VisualImportError;
pub use ids::{IdentityGenerator, VisualId, is_valid};
pub use presentation::{
    ChangeEvent, ChangeKind, ImportReport, Presentation, PresentationData, SubscriptionId,
};
pub use visual::{Comment, Context, FileRef, Visual};
