//! Undo/redo history: a bounded log of full-collection snapshots.
//!
//! Every entry is a deep copy of the collection plus the frame that was
//! active when it was taken, so later in-place painting can never
//! retroactively alter a stored state. The log holds the invariant that
//! the entry at the cursor mirrors the committed live state; entry 0 is
//! always the collection as loaded.

use serde::{Deserialize, Serialize};

use crate::collection::SpriteCollection;

/// Default number of snapshots kept before the oldest is evicted.
pub const DEFAULT_CAPACITY: usize = 50;

/// One captured state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryState {
    pub collection: SpriteCollection,
    pub active_frame: usize,
    /// Human-readable action label, e.g. "Brush stroke".
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Recording,
    Replaying,
}

/// Ordered snapshot log with a cursor.
#[derive(Debug)]
pub struct HistoryLog {
    entries: Vec<HistoryState>,
    cursor: usize,
    capacity: usize,
    mode: Mode,
}

impl HistoryLog {
    /// Seed the log with entry 0: the collection as loaded, before any
    /// edit, so a single undo after the first edit restores the
    /// unmodified file.
    pub fn seeded(collection: &SpriteCollection, active_frame: usize) -> Self {
        Self::with_capacity(collection, active_frame, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(
        collection: &SpriteCollection,
        active_frame: usize,
        capacity: usize,
    ) -> Self {
        let seed = HistoryState {
            collection: collection.clone(),
            active_frame,
            label: "Opened".to_string(),
        };
        Self {
            entries: vec![seed],
            cursor: 0,
            capacity: capacity.max(1),
            mode: Mode::Recording,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current(&self) -> &HistoryState {
        &self.entries[self.cursor]
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    /// Record a new state after a committed mutation.
    ///
    /// Entries past the cursor (the redo branch) are discarded first,
    /// then the new entry is appended and the cursor advanced. Once the
    /// capacity is exceeded the oldest entry is evicted and the cursor
    /// shifts down with it. Ignored while a replay is in progress.
    pub fn snapshot(&mut self, collection: &SpriteCollection, active_frame: usize, label: &str) {
        if self.mode == Mode::Replaying {
            return;
        }
        self.entries.truncate(self.cursor + 1);
        self.entries.push(HistoryState {
            collection: collection.clone(),
            active_frame,
            label: label.to_string(),
        });
        self.cursor = self.entries.len() - 1;
        if self.entries.len() > self.capacity {
            self.entries.remove(0);
            self.cursor -= 1;
        }
    }

    /// Step back one entry and return a deep copy for the caller to
    /// install as the live collection. `None` at the oldest entry.
    pub fn undo(&mut self) -> Option<HistoryState> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        Some(self.entries[self.cursor].clone())
    }

    /// Step forward one entry. `None` at the newest entry.
    pub fn redo(&mut self) -> Option<HistoryState> {
        if self.cursor + 1 >= self.entries.len() {
            return None;
        }
        self.cursor += 1;
        Some(self.entries[self.cursor].clone())
    }

    /// Enter the replaying state while an undo/redo result is being
    /// installed, so the installation cannot re-enter the log.
    pub fn begin_replay(&mut self) {
        self.mode = Mode::Replaying;
    }

    pub fn end_replay(&mut self) {
        self.mode = Mode::Recording;
    }

    pub fn is_replaying(&self) -> bool {
        self.mode == Mode::Replaying
    }
}
