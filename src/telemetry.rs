//! Telemetry events and sinks.
//!
//! Storyline records a handful of structured events around persistence so
//! that save behaviour (how often descriptions are rewritten, how often
//! saves are coalesced) can be inspected locally. Nothing is transmitted.

use std::io;

use serde::{Deserialize, Serialize};

/// A structured telemetry event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TelemetryEvent {
    /// The presentation was written to the pull request description.
    PresentationPersisted {
        /// Metadata version written.
        version: u64,
        /// Visuals contained in the written presentation.
        visual_count: usize,
    },
    /// A save request arrived while another save was in flight and was
    /// folded into it.
    PersistCoalesced,
    /// A presentation was imported.
    PresentationImported {
        /// Visuals present after the import.
        imported: usize,
        /// Elements that could not be decoded.
        skipped: usize,
        /// Elements whose identity repeated an earlier one.
        duplicates: usize,
    },
}

/// A sink that can record telemetry events.
pub trait TelemetrySink: Send + Sync {
    /// Records a telemetry event.
    fn record(&self, event: TelemetryEvent);
}

/// Telemetry sink that drops all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTelemetrySink;

impl TelemetrySink for NoopTelemetrySink {
    fn record(&self, _event: TelemetryEvent) {}
}

/// Writes events to stderr as JSON lines.
#[derive(Debug, Default)]
pub struct StderrJsonlTelemetrySink;

impl TelemetrySink for StderrJsonlTelemetrySink {
    fn record(&self, event: TelemetryEvent) {
        let Ok(serialised) = serde_json::to_string(&event) else {
            return;
        };

        let _ignored = writeln_stderr(&serialised);
    }
}

fn writeln_stderr(message: &str) -> io::Result<()> {
    use io::Write;

    let mut stderr = io::stderr().lock();
    writeln!(stderr, "{message}")
}

/// Sinks for tests in this crate and its integration suites.
#[cfg(any(test, feature = "test-support"))]
pub mod test_support {
    use std::sync::{Mutex, PoisonError};

    use super::{TelemetryEvent, TelemetrySink};

    /// Keeps every recorded event in memory.
    #[derive(Debug, Default)]
    pub struct RecordingTelemetrySink {
        events: Mutex<Vec<TelemetryEvent>>,
    }

    impl RecordingTelemetrySink {
        /// Returns a copy of the recorded events.
        #[must_use]
        pub fn events(&self) -> Vec<TelemetryEvent> {
            self.events
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }
    }

    impl TelemetrySink for RecordingTelemetrySink {
        fn record(&self, event: TelemetryEvent) {
            self.events
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TelemetryEvent;
    use super::test_support::RecordingTelemetrySink;
    use super::TelemetrySink;

    #[test]
    fn recording_sink_captures_events() {
        let sink = RecordingTelemetrySink::default();
        sink.record(TelemetryEvent::PersistCoalesced);
        sink.record(TelemetryEvent::PresentationPersisted {
            version: 3,
            visual_count: 2,
        });

        assert_eq!(
            sink.events(),
            vec![
                TelemetryEvent::PersistCoalesced,
                TelemetryEvent::PresentationPersisted {
                    version: 3,
                    visual_count: 2,
                },
            ]
        );
    }

    #[test]
    fn events_serialise_with_snake_case_tag() {
        let json = serde_json::to_string(&TelemetryEvent::PresentationImported {
            imported: 2,
            skipped: 1,
            duplicates: 0,
        })
        .expect("event serialises");

        assert_eq!(
            json,
            r#"{"type":"presentation_imported","imported":2,"skipped":1,"duplicates":0}"#
        );
    }
}
