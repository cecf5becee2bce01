//! Append-only transcript with live subscribers.

use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::broadcast;

use crate::classifier::TranscriptEntry;
use crate::messages::Flow;

/// Live-subscriber buffer; lagging receivers skip ahead, appends never block.
const LIVE_CAPACITY: usize = 1024;

/// Ordered, append-only log of classified entries.
///
/// Cloning yields another handle to the same log, so a view can render while
/// the session appends.
#[derive(Debug, Clone)]
pub struct Transcript {
    entries: Arc<RwLock<Vec<TranscriptEntry>>>,
    sender: broadcast::Sender<TranscriptEntry>,
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

impl Transcript {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(LIVE_CAPACITY);
        Self {
            entries: Arc::new(RwLock::new(Vec::new())),
            sender,
        }
    }

    /// Initial transcript for a flow. A deploy view starts with one empty
    /// Command line as placeholder; a redeploy view starts empty.
    pub fn for_flow(flow: Flow) -> Self {
        let transcript = Self::new();
        if flow == Flow::Deploy {
            transcript.append(TranscriptEntry::command(""));
        }
        transcript
    }

    pub fn append(&self, entry: TranscriptEntry) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.push(entry.clone());
        // Sent under the write lock so live order matches snapshot order.
        let _ = self.sender.send(entry);
    }

    /// All entries appended so far, in arrival order.
    pub fn snapshot(&self) -> Vec<TranscriptEntry> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Entries from index `start` on; empty when `start` is past the end.
    pub fn entries_since(&self, start: usize) -> Vec<TranscriptEntry> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(start..).map(<[_]>::to_vec).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Receive entries appended after this call. A receiver that falls more
    /// than the buffer behind gets `Lagged`; catch up with `entries_since`.
    pub fn subscribe(&self) -> broadcast::Receiver<TranscriptEntry> {
        self.sender.subscribe()
    }
}
