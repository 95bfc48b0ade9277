use std::sync::Arc;

use futures::future::{AbortHandle, AbortRegistration};
use parking_lot::Mutex;
use uuid::Uuid;

use crate::codec::{encode_png, EncodedImage};
use crate::error::{PaintError, PaintResult};
use crate::layer::LayerStack;
use crate::util::time::timestamp_secs;

/// Encoded pixels plus metadata of one layer at snapshot time.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSnapshot {
    pub id: Uuid,
    pub data: EncodedImage,
    pub name: String,
    pub visible: bool,
    pub opacity: f32,
    pub locked: bool,
}

/// Full snapshot of the document. Entries are immutable once committed.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub layers: Vec<LayerSnapshot>,
    pub current_layer_index: usize,
    pub width: u32,
    pub height: u32,
    pub timestamp: u64,
}

impl HistoryEntry {
    /// Encode every layer of `stack`.
    pub fn capture(stack: &LayerStack) -> PaintResult<Self> {
        let layers = stack
            .layers()
            .iter()
            .map(|layer| {
                Ok(LayerSnapshot {
                    id: layer.id,
                    data: encode_png(&layer.buffer)?,
                    name: layer.name.clone(),
                    visible: layer.visible,
                    opacity: layer.opacity,
                    locked: layer.locked,
                })
            })
            .collect::<PaintResult<Vec<_>>>()?;
        Ok(Self {
            layers,
            current_layer_index: stack.current_index(),
            width: stack.width(),
            height: stack.height(),
            timestamp: timestamp_secs(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreDirection {
    Undo,
    Redo,
    /// Replacing the document wholesale (project load)
    Load,
}

/// Cursor state shared between the log and the restore in flight.
#[derive(Debug)]
struct Cursor {
    step: isize,
    /// Step to return to if the restore in flight fails or is abandoned
    rollback: Option<isize>,
}

/// A restore that has moved the history step but not yet touched the document.
///
/// Hand it back to [`HistoryManager::finish_restore`] when the document has
/// been updated, or when the restore failed. Dropping it unfinished behaves
/// like a failed restore.
#[derive(Debug)]
pub struct PendingRestore {
    pub(crate) entry: Option<Arc<HistoryEntry>>,
    pub(crate) direction: RestoreDirection,
    cursor: Arc<Mutex<Cursor>>,
    settled: bool,
    abort: AbortHandle,
    pub(crate) registration: Option<AbortRegistration>,
}

impl PendingRestore {
    fn new(entry: Option<Arc<HistoryEntry>>, direction: RestoreDirection, cursor: Arc<Mutex<Cursor>>) -> Self {
        let (abort, registration) = AbortHandle::new_pair();
        Self {
            entry,
            direction,
            cursor,
            settled: false,
            abort,
            registration: Some(registration),
        }
    }

    pub fn direction(&self) -> RestoreDirection {
        self.direction
    }

    pub fn entry(&self) -> Option<&HistoryEntry> {
        self.entry.as_deref()
    }

    /// Handle that cancels the in-flight decode of this restore.
    pub fn canceller(&self) -> AbortHandle {
        self.abort.clone()
    }

    fn settle(&mut self, succeeded: bool) {
        if self.settled {
            return;
        }
        self.settled = true;
        let mut cursor = self.cursor.lock();
        if let Some(previous) = cursor.rollback.take() {
            if !succeeded {
                cursor.step = previous;
            }
        }
    }
}

impl Drop for PendingRestore {
    fn drop(&mut self) {
        if !self.settled {
            log::warn!("⚠️ {:?} restore dropped before it finished, rolling back", self.direction);
            self.abort.abort();
            self.settle(false);
        }
    }
}

/// Bounded linear log of document snapshots with a cursor (`step`).
///
/// `entries[step]` is the current state. Committing after an undo drops
/// everything past the cursor. While a restore is in progress, commits are
/// suppressed and further undo/redo requests are rejected.
#[derive(Debug)]
pub struct HistoryManager {
    entries: Vec<Arc<HistoryEntry>>,
    cursor: Arc<Mutex<Cursor>>,
    limit: usize,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(50)
    }
}

impl HistoryManager {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            cursor: Arc::new(Mutex::new(Cursor {
                step: -1,
                rollback: None,
            })),
            limit: limit.max(1),
        }
    }

    /// Record a new state. Returns false if it was suppressed by a restore.
    pub fn commit(&mut self, entry: HistoryEntry) -> bool {
        let mut cursor = self.cursor.lock();
        if cursor.rollback.is_some() {
            log::debug!("History commit suppressed during restore");
            return false;
        }
        self.entries.truncate((cursor.step + 1) as usize);
        self.entries.push(Arc::new(entry));
        if self.entries.len() > self.limit {
            let excess = self.entries.len() - self.limit;
            self.entries.drain(..excess);
        }
        cursor.step = self.entries.len() as isize - 1;
        true
    }

    pub fn can_undo(&self) -> bool {
        self.step() > 0
    }

    pub fn can_redo(&self) -> bool {
        self.step() < self.entries.len() as isize - 1
    }

    pub fn step(&self) -> isize {
        self.cursor.lock().step
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn is_restoring(&self) -> bool {
        self.cursor.lock().rollback.is_some()
    }

    pub fn entries(&self) -> &[Arc<HistoryEntry>] {
        &self.entries
    }

    pub fn current(&self) -> Option<&HistoryEntry> {
        usize::try_from(self.step())
            .ok()
            .and_then(|step| self.entries.get(step))
            .map(|entry| entry.as_ref())
    }

    /// Move the cursor back one entry and start restoring it.
    pub fn begin_undo(&mut self) -> PaintResult<PendingRestore> {
        if self.is_restoring() {
            return Err(PaintError::RestoreInProgress);
        }
        if !self.can_undo() {
            return Err(PaintError::NothingToUndo);
        }
        self.begin_step(self.step() - 1, RestoreDirection::Undo)
    }

    /// Move the cursor forward one entry and start restoring it.
    pub fn begin_redo(&mut self) -> PaintResult<PendingRestore> {
        if self.is_restoring() {
            return Err(PaintError::RestoreInProgress);
        }
        if !self.can_redo() {
            return Err(PaintError::NothingToRedo);
        }
        self.begin_step(self.step() + 1, RestoreDirection::Redo)
    }

    /// Mark the start of a restore that is not driven by the log.
    pub fn begin_external(&mut self) -> PaintResult<PendingRestore> {
        let mut cursor = self.cursor.lock();
        if cursor.rollback.is_some() {
            return Err(PaintError::RestoreInProgress);
        }
        cursor.rollback = Some(cursor.step);
        drop(cursor);
        Ok(PendingRestore::new(None, RestoreDirection::Load, Arc::clone(&self.cursor)))
    }

    fn begin_step(&mut self, target: isize, direction: RestoreDirection) -> PaintResult<PendingRestore> {
        let entry = self
            .entries
            .get(target as usize)
            .cloned()
            .ok_or_else(|| PaintError::InvalidInput(format!("history step {target}")))?;
        let mut cursor = self.cursor.lock();
        cursor.rollback = Some(cursor.step);
        cursor.step = target;
        drop(cursor);
        Ok(PendingRestore::new(Some(entry), direction, Arc::clone(&self.cursor)))
    }

    /// End a restore. On failure the cursor moves back to where it was.
    pub fn finish_restore(&mut self, mut pending: PendingRestore, succeeded: bool) {
        pending.settle(succeeded);
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor.lock().step = -1;
    }
}
