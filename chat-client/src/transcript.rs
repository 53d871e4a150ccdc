//! Transcript store
//!
//! Ordered list of conversation entries. Entries are either tentative
//! (inserted by the client before the service confirmed them) or confirmed
//! (part of the last snapshot the service returned). Reconciliation never
//! merges: the service snapshot replaces everything.

use shared_types::{Message, Role};

use crate::format::{format_message, Fragment};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// Optimistic, awaiting the service
    Tentative,
    /// From the last authoritative snapshot
    Confirmed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub message: Message,
    pub provenance: Provenance,
}

/// Position of an optimistic entry, used to roll it back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptimisticHandle {
    position: usize,
}

impl OptimisticHandle {
    pub fn position(&self) -> usize {
        self.position
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranscriptError {
    #[error("An unconfirmed message is already awaiting the service")]
    TentativeInFlight,
}

/// Display form of a transcript entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub role: Role,
    pub pending: bool,
    pub fragments: Vec<Fragment>,
}

#[derive(Debug, Clone, Default)]
pub struct TranscriptStore {
    entries: Vec<TranscriptEntry>,
}

impl TranscriptStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message ahead of confirmation.
    ///
    /// At most one tentative entry may exist, and it is always the last one.
    pub fn insert_optimistic(
        &mut self,
        message: Message,
    ) -> Result<OptimisticHandle, TranscriptError> {
        if self.pending().is_some() {
            return Err(TranscriptError::TentativeInFlight);
        }
        self.entries.push(TranscriptEntry {
            message,
            provenance: Provenance::Tentative,
        });
        Ok(OptimisticHandle {
            position: self.entries.len() - 1,
        })
    }

    /// Remove the tentative entry `handle` points at, if it is still there
    pub fn rollback(&mut self, handle: OptimisticHandle) -> Option<Message> {
        let is_tentative = self
            .entries
            .get(handle.position)
            .is_some_and(|entry| entry.provenance == Provenance::Tentative);
        if !is_tentative {
            return None;
        }
        Some(self.entries.remove(handle.position).message)
    }

    /// Replace the whole transcript with the service's history, in order
    pub fn reconcile(&mut self, history: Vec<Message>) {
        self.entries = history
            .into_iter()
            .map(|message| TranscriptEntry {
                message,
                provenance: Provenance::Confirmed,
            })
            .collect();
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn messages(&self) -> Vec<Message> {
        self.entries.iter().map(|e| e.message.clone()).collect()
    }

    /// The trailing unconfirmed message, if any
    pub fn pending(&self) -> Option<&Message> {
        self.entries
            .last()
            .filter(|entry| entry.provenance == Provenance::Tentative)
            .map(|entry| &entry.message)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn render(&self) -> Vec<RenderedMessage> {
        self.entries
            .iter()
            .map(|entry| RenderedMessage {
                role: entry.message.role,
                pending: entry.provenance == Provenance::Tentative,
                fragments: format_message(entry.message.role, &entry.message.content),
            })
            .collect()
    }
}
