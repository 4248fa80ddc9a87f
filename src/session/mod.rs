//! Persistence cycle for a presentation embedded in a pull request
//! description.
//!
//! [`AnnotationSession`] owns the presentation, the identity generator and
//! the envelope metadata for one pull request. Reads and mutations are
//! synchronous; loading and saving go through a [`HostTextGateway`].
//! Saves are single-flight: a save requested while another is running is
//! coalesced into it (see [`SaveGate`]).

mod gate;

use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::document::{Document, Metadata, max_embedded_id};
use crate::embed::{self, EmbeddedBlock, Marker};
use crate::github::{GithubError, HostTextGateway};
use crate::model::{
    ChangeEvent, IdentityGenerator, ImportReport, Presentation, SubscriptionId,
};
use crate::telemetry::{NoopTelemetrySink, TelemetryEvent, TelemetrySink};

pub use gate::{SaveGate, SaveTicket};

/// When mutations are written back to the pull request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveFrequency {
    /// Every mutation that changes the presentation triggers a save.
    #[default]
    Auto,
    /// Saves happen only when requested.
    Manual,
}

/// Error returned when a save frequency name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown save frequency `{0}`; expected `auto` or `manual`")]
pub struct ParseSaveFrequencyError(String);

impl FromStr for SaveFrequency {
    type Err = ParseSaveFrequencyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "manual" => Ok(Self::Manual),
            _ => Err(ParseSaveFrequencyError(value.to_owned())),
        }
    }
}

/// Result of a [`AnnotationSession::persist`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    /// The presentation was written; `version` is the metadata version now
    /// stored in the description.
    Saved {
        /// Metadata version written by the final cycle.
        version: u64,
    },
    /// Another save was in flight. It writes this state too if it succeeds;
    /// if it fails the request is dropped and the session stays dirty (see
    /// [`AnnotationSession::has_unsaved_changes`]).
    Coalesced,
}

/// Errors raised while loading or saving a presentation.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The gateway failed to read or write the description.
    #[error(transparent)]
    Github(#[from] GithubError),

    /// The envelope could not be encoded.
    #[error("failed to encode presentation: {message}")]
    Encode {
        /// Encoder error message.
        message: String,
    },

    /// A user-supplied document did not have the envelope shape.
    #[error("invalid presentation document: {message}")]
    Document {
        /// Decoder error message.
        message: String,
    },
}

/// Settings for an [`AnnotationSession`].
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Delimiter around the embedded block.
    pub marker: Marker,
    /// When mutations are saved.
    pub save_frequency: SaveFrequency,
}

struct SessionState {
    presentation: Presentation,
    ids: IdentityGenerator,
    metadata: Metadata,
    files: Option<Vec<String>>,
    saved_revision: u64,
}

/// One pull request's presentation together with its persistence cycle.
pub struct AnnotationSession<G> {
    gateway: G,
    options: SessionOptions,
    state: Mutex<SessionState>,
    revision: Arc<AtomicU64>,
    gate: SaveGate,
    telemetry: Arc<dyn TelemetrySink>,
}

impl<G: HostTextGateway> AnnotationSession<G> {
    /// Creates an empty session backed by `gateway`.
    #[must_use]
    pub fn new(gateway: G, options: SessionOptions) -> Self {
        let revision = Arc::new(AtomicU64::new(0));
        let mut presentation = Presentation::new();
        let counter = Arc::clone(&revision);
        presentation.subscribe(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        Self {
            gateway,
            options,
            state: Mutex::new(SessionState {
                presentation,
                ids: IdentityGenerator::new(),
                metadata: Metadata::default(),
                files: None,
                saved_revision: 0,
            }),
            revision,
            gate: SaveGate::new(),
            telemetry: Arc::new(NoopTelemetrySink),
        }
    }

    /// Routes telemetry events to `sink`.
    #[must_use]
    pub fn with_telemetry(mut self, sink: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = sink;
        self
    }

    /// Settings in effect.
    #[must_use]
    pub const fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Reads the description and imports the embedded presentation, if any.
    ///
    /// A description without a block, or with a block that is not a valid
    /// envelope, counts as "no prior data" and yields `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Github`] when the description cannot be read.
    pub async fn load(&self) -> Result<Option<ImportReport>, SessionError> {
        let host_text = self.gateway.fetch_host_text().await?;
        let Some(block) = embed::parse(&host_text, &self.options.marker) else {
            tracing::debug!("no embedded presentation in pull request description");
            return Ok(None);
        };

        match Document::from_value(block.data) {
            Ok(document) => {
                let report = self.import_document(document);
                self.mark_saved();
                Ok(Some(report))
            }
            Err(error) => {
                tracing::warn!("ignoring embedded presentation with unexpected shape: {error}");
                Ok(None)
            }
        }
    }

    /// Replaces the session contents with `document`.
    ///
    /// The identity generator is reseeded past every numeric identity the
    /// document carries, so later visuals never collide with imported ones.
    #[must_use]
    pub fn import_document(&self, document: Document) -> ImportReport {
        let report = {
            let mut state = self.lock_state();
            let seen = document
                .presentation
                .visuals
                .iter()
                .filter_map(max_embedded_id)
                .max()
                .unwrap_or(0);
            let floor = seen.max(state.ids.last_issued());
            state.ids.init_id(floor);

            let report = state.presentation.import(&document.presentation);
            state.metadata = document.metadata;
            state.files = document.files;
            report
        };

        self.telemetry.record(TelemetryEvent::PresentationImported {
            imported: report.imported,
            skipped: report.skipped,
            duplicates: report.duplicates,
        });
        report
    }

    /// Decodes `value` as an envelope and imports it.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Document`] when `value` does not have the
    /// envelope shape.
    pub fn import_value(&self, value: Value) -> Result<ImportReport, SessionError> {
        let document = Document::from_value(value).map_err(|error| SessionError::Document {
            message: error.to_string(),
        })?;
        Ok(self.import_document(document))
    }

    /// Snapshot of the current envelope.
    #[must_use]
    pub fn export(&self) -> Document {
        let state = self.lock_state();
        Document {
            metadata: state.metadata.clone(),
            files: state.files.clone(),
            presentation: state.presentation.export(),
        }
    }

    /// Runs `read` against the presentation.
    #[must_use]
    pub fn with_presentation<R>(&self, read: impl FnOnce(&Presentation) -> R) -> R {
        read(&self.lock_state().presentation)
    }

    /// Registers a change observer on the presentation.
    ///
    /// Observers run while the session is locked and must not call back
    /// into the session.
    #[must_use]
    pub fn subscribe<F>(&self, observer: F) -> SubscriptionId
    where
        F: FnMut(&ChangeEvent, &Presentation) + Send + 'static,
    {
        self.lock_state().presentation.subscribe(observer)
    }

    /// Removes an observer registered through [`Self::subscribe`].
    #[must_use]
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.lock_state().presentation.unsubscribe(id)
    }

    /// Applies `change` to the presentation without saving.
    #[must_use]
    pub fn edit<R>(
        &self,
        change: impl FnOnce(&mut Presentation, &mut IdentityGenerator) -> R,
    ) -> R {
        let mut guard = self.lock_state();
        let state = &mut *guard;
        change(&mut state.presentation, &mut state.ids)
    }

    /// Applies `change`, then saves when the session is in
    /// [`SaveFrequency::Auto`] mode and the presentation changed.
    ///
    /// # Errors
    ///
    /// Returns the save error; the change itself stays applied.
    pub async fn apply<R>(
        &self,
        change: impl FnOnce(&mut Presentation, &mut IdentityGenerator) -> R,
    ) -> Result<R, SessionError> {
        let result = self.edit(change);
        self.autosave().await?;
        Ok(result)
    }

    /// Saves when in [`SaveFrequency::Auto`] mode and there are unsaved
    /// changes. Returns `None` when nothing was attempted.
    ///
    /// # Errors
    ///
    /// Propagates [`Self::persist`] failures.
    pub async fn autosave(&self) -> Result<Option<PersistOutcome>, SessionError> {
        if self.options.save_frequency == SaveFrequency::Manual || !self.has_unsaved_changes() {
            return Ok(None);
        }
        self.persist().await.map(Some)
    }

    /// Whether the presentation changed since the last load or save.
    #[must_use]
    pub fn has_unsaved_changes(&self) -> bool {
        self.revision.load(Ordering::SeqCst) != self.lock_state().saved_revision
    }

    /// Writes the presentation into the pull request description.
    ///
    /// The description is re-read first so that edits made to the human
    /// readable part since loading are kept. If a save is already running
    /// this returns [`PersistOutcome::Coalesced`] at once and the running
    /// save writes once more with the latest state, provided its own write
    /// succeeds. Only the caller that started the running save sees its
    /// error.
    ///
    /// # Errors
    ///
    /// Returns gateway failures and [`SessionError::Encode`].
    pub async fn persist(&self) -> Result<PersistOutcome, SessionError> {
        let Some(mut ticket) = self.gate.try_acquire() else {
            tracing::info!("save already in flight; coalescing request");
            self.telemetry.record(TelemetryEvent::PersistCoalesced);
            return Ok(PersistOutcome::Coalesced);
        };

        loop {
            let version = self.persist_once().await?;
            match ticket.finish_or_rerun() {
                Some(next) => ticket = next,
                None => return Ok(PersistOutcome::Saved { version }),
            }
        }
    }

    async fn persist_once(&self) -> Result<u64, SessionError> {
        let host_text = self.gateway.fetch_host_text().await?;
        let comment = embed::human_text(&host_text, &self.options.marker);

        let (document, revision) = {
            let state = self.lock_state();
            let mut metadata = state.metadata.clone();
            metadata.record_save(Utc::now());
            let document = Document {
                metadata,
                files: state.files.clone(),
                presentation: state.presentation.export(),
            };
            (document, self.revision.load(Ordering::SeqCst))
        };

        let data = document.to_value().map_err(|error| SessionError::Encode {
            message: error.to_string(),
        })?;
        let rendered = embed::render(&EmbeddedBlock::new(comment, data), &self.options.marker);
        self.gateway.write_host_text(&rendered).await?;

        let version = document.metadata.version;
        {
            let mut state = self.lock_state();
            state.metadata = document.metadata;
            state.saved_revision = revision;
        }
        tracing::debug!(version, "presentation saved");
        self.telemetry.record(TelemetryEvent::PresentationPersisted {
            version,
            visual_count: document.presentation.visuals.len(),
        });
        Ok(version)
    }

    fn mark_saved(&self) {
        let revision = self.revision.load(Ordering::SeqCst);
        self.lock_state().saved_revision = revision;
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<G> std::fmt::Debug for AnnotationSession<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnnotationSession")
            .field("options", &self.options)
            .field("gate", &self.gate)
            .finish_non_exhaustive()
    }
}
