//! Storyline library crate: ordered review annotations stored inside a pull
//! request description.
//!
//! A reviewer attaches comments to lines of a pull request and arranges them
//! into a [`Presentation`], an ordered walkthrough of the change. The
//! presentation is serialized as JSON and embedded in a hidden, delimited
//! block of the pull request description, so any client that reads the
//! description can restore it.
//!
//! - [`model`] holds identities, visuals and the ordered presentation.
//! - [`embed`] finds and renders the hidden block inside arbitrary text.
//! - [`document`] defines the persisted envelope.
//! - [`github`] reads and writes the description through Octocrab.
//! - [`session`] ties them together with loading, autosave and
//!   single-flight saves.

pub mod config;
pub mod document;
pub mod embed;
pub mod github;
pub mod model;
pub mod session;
pub mod telemetry;

pub use config::{OperationMode, StorylineConfig};
pub use document::{Document, Metadata};
pub use embed::{EmbeddedBlock, Marker};
pub use github::{
    GithubError, HostTextGateway, OctocrabGateway, PersonalAccessToken, PullRequestLocator,
};
pub use model::{
    ChangeEvent, ChangeKind, Comment, Context, FileRef, IdentityGenerator, ImportReport,
    Presentation, PresentationData, Visual, VisualId,
};
pub use session::{AnnotationSession, PersistOutcome, SaveFrequency, SessionError, SessionOptions};
pub use telemetry::{NoopTelemetrySink, StderrJsonlTelemetrySink, TelemetryEvent, TelemetrySink};
