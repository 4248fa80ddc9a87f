//! Ordered, identity-unique collection of visuals.
//!
//! Insertion order is display and navigation order. Every structural
//! operation emits exactly one [`ChangeEvent`] to the subscribed observers
//! before it returns. Observers receive a shared reference to the
//! presentation, so they can read it but cannot mutate it re-entrantly.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ids::VisualId;
use super::visual::Visual;

/// What kind of operation produced a [`ChangeEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// A visual with a new identity was inserted.
    Added,
    /// A visual replaced an existing one with the same identity.
    Replaced,
    /// A single visual was removed.
    Removed,
    /// Every visual was removed at once.
    Cleared,
    /// A visual changed position; it appears in both `added` and `removed`.
    Moved,
    /// The whole sequence was replaced by an import.
    Imported,
}

/// Notification describing exactly what one operation added and removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Operation that produced the event.
    pub kind: ChangeKind,
    /// Visuals now present that were not before (or were relocated).
    pub added: Vec<Visual>,
    /// Visuals no longer present (or relocated), in their prior order.
    pub removed: Vec<Visual>,
}

/// Handle returned by [`Presentation::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Observer = Box<dyn FnMut(&ChangeEvent, &Presentation) + Send>;

/// Serialized presentation: `{ "visuals": [ ... ] }`.
///
/// Elements stay as raw JSON so that a single unreadable element can be
/// dropped without rejecting the whole payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PresentationData {
    /// Serialized visuals in display order.
    #[serde(default)]
    pub visuals: Vec<Value>,
}

/// Outcome of [`Presentation::import`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Visuals present after the import.
    pub imported: usize,
    /// Elements dropped because they could not be decoded.
    pub skipped: usize,
    /// Elements that shared an identity with an earlier one and replaced it.
    pub duplicates: usize,
}

/// The ordered list of visuals for one pull request.
#[derive(Default)]
pub struct Presentation {
    visuals: Vec<Visual>,
    observers: Vec<(SubscriptionId, Observer)>,
    next_subscription: u64,
}

impl fmt::Debug for Presentation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Presentation")
            .field("visuals", &self.visuals)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl Presentation {
    /// Creates an empty presentation with no observers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an observer called synchronously after each change.
    pub fn subscribe<F>(&mut self, observer: F) -> SubscriptionId
    where
        F: FnMut(&ChangeEvent, &Self) + Send + 'static,
    {
        self.next_subscription = self.next_subscription.saturating_add(1);
        let id = SubscriptionId(self.next_subscription);
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Removes an observer. Returns false when the handle was unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(existing, _)| *existing != id);
        self.observers.len() != before
    }

    /// Inserts `visual`, first removing any element with the same identity.
    ///
    /// `position` of `None` appends; a position past the end also appends.
    /// An edit therefore lands at the end unless its position is supplied.
    /// Returns the index the visual ended up at.
    pub fn add_or_replace_visual(&mut self, visual: Visual, position: Option<usize>) -> usize {
        let removed: Vec<Visual> = self
            .index_of(visual.id())
            .map(|existing| self.visuals.remove(existing))
            .into_iter()
            .collect();

        let index = position.map_or(self.visuals.len(), |requested| {
            requested.min(self.visuals.len())
        });
        self.visuals.insert(index, visual.clone());

        let kind = if removed.is_empty() {
            ChangeKind::Added
        } else {
            ChangeKind::Replaced
        };
        self.notify(ChangeEvent {
            kind,
            added: vec![visual],
            removed,
        });
        index
    }

    /// Removes the visual with `id`. Absent identities are a silent no-op.
    pub fn remove_visual(&mut self, id: &VisualId) -> Option<Visual> {
        let index = self.index_of(id)?;
        let removed = self.visuals.remove(index);

        self.notify(ChangeEvent {
            kind: ChangeKind::Removed,
            added: Vec::new(),
            removed: vec![removed.clone()],
        });
        Some(removed)
    }

    /// Removes every visual in a single step and returns how many there were.
    pub fn remove_all_visuals(&mut self) -> usize {
        let removed = std::mem::take(&mut self.visuals);
        let count = removed.len();

        self.notify(ChangeEvent {
            kind: ChangeKind::Cleared,
            added: Vec::new(),
            removed,
        });
        count
    }

    /// Moves the visual with `id` to `position`, clamping past-the-end
    /// positions to the last slot. Returns the final index, or `None` without
    /// emitting anything when `id` is absent.
    pub fn move_visual(&mut self, id: &VisualId, position: usize) -> Option<usize> {
        let current = self.index_of(id)?;
        let visual = self.visuals.remove(current);

        let index = position.min(self.visuals.len());
        self.visuals.insert(index, visual.clone());

        self.notify(ChangeEvent {
            kind: ChangeKind::Moved,
            added: vec![visual.clone()],
            removed: vec![visual],
        });
        Some(index)
    }

    /// First visual anchored at `filename`:`line_no`.
    #[must_use]
    pub fn find_by_line_no(&self, filename: &str, line_no: u64) -> Option<&Visual> {
        self.visuals.iter().find(|visual| {
            let context = visual.context();
            context.file().filename() == filename && context.line_no() == line_no
        })
    }

    /// Visual at `index` in display order.
    #[must_use]
    pub fn find_by_index(&self, index: usize) -> Option<&Visual> {
        self.visuals.get(index)
    }

    /// Visual with identity `id`.
    #[must_use]
    pub fn find_by_id(&self, id: &VisualId) -> Option<&Visual> {
        self.visuals.iter().find(|visual| visual.id() == id)
    }

    /// Position of the visual with identity `id`.
    #[must_use]
    pub fn index_of(&self, id: &VisualId) -> Option<usize> {
        self.visuals.iter().position(|visual| visual.id() == id)
    }

    /// Number of visuals.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.visuals.len()
    }

    /// Whether the presentation holds no visuals.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.visuals.is_empty()
    }

    /// Visuals in display order.
    #[must_use]
    pub fn visuals(&self) -> &[Visual] {
        &self.visuals
    }

    /// Iterates visuals in display order.
    pub fn iter(&self) -> std::slice::Iter<'_, Visual> {
        self.visuals.iter()
    }

    /// Replaces the whole sequence with the decoded contents of `data`.
    ///
    /// Emits one event carrying the previous sequence as `removed` and the new
    /// one as `added`. Elements that fail to decode are skipped with a
    /// warning. When two elements share an identity the later one wins and
    /// takes the later position.
    pub fn import(&mut self, data: &PresentationData) -> ImportReport {
        let mut report = ImportReport::default();
        let mut decoded: Vec<Visual> = Vec::with_capacity(data.visuals.len());

        for (position, raw) in data.visuals.iter().enumerate() {
            let visual = match Visual::import(raw) {
                Ok(visual) => visual,
                Err(error) => {
                    tracing::warn!("skipping visual at position {position}: {error}");
                    report.skipped += 1;
                    continue;
                }
            };

            if let Some(existing) = decoded.iter().position(|kept| kept.id() == visual.id()) {
                tracing::warn!(
                    "visual id {id} appears more than once; keeping the later record",
                    id = visual.id()
                );
                decoded.remove(existing);
                report.duplicates += 1;
            }
            decoded.push(visual);
        }

        report.imported = decoded.len();
        let removed = std::mem::replace(&mut self.visuals, decoded.clone());

        self.notify(ChangeEvent {
            kind: ChangeKind::Imported,
            added: decoded,
            removed,
        });
        report
    }

    /// Serializes the sequence in display order.
    #[must_use]
    pub fn export(&self) -> PresentationData {
        PresentationData {
            visuals: self.visuals.iter().map(Visual::export).collect(),
        }
    }

    fn notify(&mut self, event: ChangeEvent) {
        let mut observers = std::mem::take(&mut self.observers);
        for (_, observer) in &mut observers {
            observer(&event, self);
        }
        self.observers = observers;
    }
}

impl<'a> IntoIterator for &'a Presentation {
    type Item = &'a Visual;
    type IntoIter = std::slice::Iter<'a, Visual>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
