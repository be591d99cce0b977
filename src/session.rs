//! Editing session: translates user intents into collection mutations,
//! history snapshots, selection updates and staged reorders.
//!
//! The session owns the authoritative [`SpriteCollection`] and the
//! policies around it: stroke batching (one history entry per completed
//! paint gesture), structural edits that validate before mutating,
//! staged reorders that leave the collection untouched until committed,
//! and a single-flight save path through the external codec.

use std::path::Path;

use image::Rgb;
use thiserror::Error;

use crate::buffer::PixelFormat;
use crate::collection::{CollectionError, SpriteCollection};
use crate::history::{HistoryLog, HistoryState};
use crate::painter::{self, BrushColor, PaintOutcome, Tool};
use crate::selection::SelectionController;
use crate::service::{DecodedSprite, SaveGate, ServiceError, SpriteCodec};
use crate::staging::{ReorderStagingEngine, StagingError};

/// Error type for session-level operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Collection(#[from] CollectionError),
    #[error(transparent)]
    Staging(#[from] StagingError),
    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// One sprite file under active edit.
pub struct EditSession {
    collection: SpriteCollection,
    history: HistoryLog,
    selection: SelectionController,
    staging: ReorderStagingEngine,
    save_gate: SaveGate,
    active_frame: usize,
    tool: Tool,
    brush: BrushColor,
    stroke_dirty: bool,
}

impl EditSession {
    /// Start a session over a decoded collection. The as-loaded state
    /// becomes history entry 0.
    pub fn new(collection: SpriteCollection) -> Self {
        let brush = match collection.mode().pixel_format() {
            // Slot 0 is the background; start on the first drawable one.
            PixelFormat::Indexed => BrushColor::Index(1),
            PixelFormat::Rgb565 => BrushColor::Rgb(Rgb([255, 255, 255])),
        };
        let history = HistoryLog::seeded(&collection, 0);
        let staging = ReorderStagingEngine::new(collection.frame_count());
        Self {
            collection,
            history,
            selection: SelectionController::new(),
            staging,
            save_gate: SaveGate::new(),
            active_frame: 0,
            tool: Tool::default(),
            brush,
            stroke_dirty: false,
        }
    }

    /// Start a session from the codec's `enter_edit` payload.
    pub fn from_decoded(decoded: DecodedSprite) -> Self {
        Self::new(decoded.collection)
    }

    pub fn collection(&self) -> &SpriteCollection {
        &self.collection
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }

    pub fn staging(&self) -> &ReorderStagingEngine {
        &self.staging
    }

    pub fn active_frame(&self) -> usize {
        self.active_frame
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn brush(&self) -> BrushColor {
        self.brush
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.tool = tool;
    }

    pub fn set_brush(&mut self, brush: BrushColor) {
        self.brush = brush;
    }

    pub fn set_active_frame(&mut self, index: usize) -> Result<(), SessionError> {
        if index >= self.collection.frame_count() {
            return Err(CollectionError::FrameOutOfBounds {
                index,
                frame_count: self.collection.frame_count(),
            }
            .into());
        }
        self.active_frame = index;
        Ok(())
    }

    // ----- painting -----

    /// Mark the start of a paint gesture (pointer down).
    pub fn begin_stroke(&mut self) {
        self.stroke_dirty = false;
    }

    /// Apply the active tool at `(x, y)` on the active frame.
    ///
    /// Out-of-range coordinates are silent no-ops. An eyedropper pickup
    /// replaces the brush color. Individual applications never snapshot;
    /// the whole gesture records once at [`end_stroke`].
    ///
    /// [`end_stroke`]: EditSession::end_stroke
    pub fn paint_at(&mut self, x: i32, y: i32) -> PaintOutcome {
        let tool = self.tool;
        let brush = self.brush;
        let Some(frame) = self.collection.frame_mut(self.active_frame) else {
            return PaintOutcome::Ignored;
        };
        let outcome = painter::paint(frame, tool, x, y, brush);
        match outcome {
            PaintOutcome::Painted => self.stroke_dirty = true,
            PaintOutcome::Sampled(color) => self.brush = color,
            PaintOutcome::Ignored => {}
        }
        outcome
    }

    /// Complete the paint gesture (pointer up). Records exactly one
    /// history entry for the cumulative stroke, and none when the
    /// gesture never touched a sample.
    pub fn end_stroke(&mut self) {
        if !self.stroke_dirty {
            return;
        }
        self.stroke_dirty = false;
        let label = match self.tool {
            Tool::Eraser => "Erase stroke",
            _ => "Brush stroke",
        };
        self.history
            .snapshot(&self.collection, self.active_frame, label);
    }

    // ----- structural edits -----

    /// Append a new frame filled with `fill`. Selection and staged
    /// order reset; the new frame becomes active.
    pub fn add_frame(&mut self, width: u16, height: u16, fill: u8) -> usize {
        let index = self.collection.add_frame(width, height, fill);
        self.active_frame = index;
        self.after_structural_edit("Add frame");
        index
    }

    /// Remove the named frames in one atomic step. Rejected when the
    /// set covers every frame or names an out-of-bounds index; on
    /// rejection nothing changes, including history.
    pub fn remove_frames(&mut self, indices: &[usize]) -> Result<usize, SessionError> {
        let removed = self.collection.remove_frames(indices)?;
        if removed == 0 {
            return Ok(0);
        }
        self.active_frame = self
            .active_frame
            .min(self.collection.frame_count().saturating_sub(1));
        self.after_structural_edit("Remove frames");
        Ok(removed)
    }

    /// Remove every currently selected frame.
    pub fn remove_selected(&mut self) -> Result<usize, SessionError> {
        let doomed = self.selection.indices();
        if doomed.is_empty() {
            return Ok(0);
        }
        self.remove_frames(&doomed)
    }

    /// A committed structural edit invalidates the selection, discards
    /// any staged reorder, and records the post-edit state.
    fn after_structural_edit(&mut self, label: &str) {
        let frame_count = self.collection.frame_count();
        self.selection.clear();
        self.selection.reset_anchor();
        self.staging.reset(frame_count);
        self.history
            .snapshot(&self.collection, self.active_frame, label);
    }

    // ----- selection -----

    pub fn select_frame(&mut self, index: usize) {
        if index < self.collection.frame_count() {
            self.selection.select(index);
        }
    }

    pub fn toggle_frame(&mut self, index: usize) {
        if index < self.collection.frame_count() {
            self.selection.toggle(index);
        }
    }

    /// Range-select from the anchor to `index`, resolved through the
    /// staged display order so visual adjacency wins.
    pub fn select_range_to(&mut self, index: usize) {
        self.selection.select_range(index, self.staging.order());
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    // ----- staged reorder -----

    pub fn stage_order(&mut self, order: Vec<usize>) -> Result<(), SessionError> {
        self.staging.stage(order)?;
        Ok(())
    }

    pub fn move_frame_up(&mut self, original_index: usize) -> bool {
        self.staging.move_up(original_index)
    }

    pub fn move_frame_down(&mut self, original_index: usize) -> bool {
        self.staging.move_down(original_index)
    }

    /// The order frames are currently displayed in.
    pub fn display_order(&self) -> &[usize] {
        self.staging.order()
    }

    /// Apply the staged order to the authoritative collection. Returns
    /// `false` without recording anything when the staged order is
    /// clean. Selection and active frame follow their frames to the new
    /// positions.
    pub fn commit_reorder(&mut self) -> Result<bool, SessionError> {
        let Some(order) = self.staging.commit() else {
            return Ok(false);
        };
        self.collection.apply_order(&order)?;
        self.selection
            .remap(|i| order.iter().position(|&o| o == i));
        self.active_frame = order
            .iter()
            .position(|&o| o == self.active_frame)
            .unwrap_or(0);
        self.history
            .snapshot(&self.collection, self.active_frame, "Reorder frames");
        Ok(true)
    }

    /// Discard the staged order; the authoritative collection is
    /// untouched.
    pub fn cancel_reorder(&mut self) {
        self.staging.cancel();
    }

    // ----- history -----

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Step back one history entry and install it as the live state.
    /// Returns `false` at the oldest entry.
    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(state) => {
                self.install(state);
                true
            }
            None => false,
        }
    }

    /// Step forward one history entry. Returns `false` at the newest.
    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(state) => {
                self.install(state);
                true
            }
            None => false,
        }
    }

    /// Install a snapshot as the live collection. Runs under the replay
    /// guard so nothing triggered here can re-enter the log, then
    /// re-normalizes everything keyed on the frame count.
    fn install(&mut self, state: HistoryState) {
        self.history.begin_replay();
        let HistoryState {
            collection,
            active_frame,
            ..
        } = state;
        self.collection = collection;
        let frame_count = self.collection.frame_count();
        self.active_frame = active_frame.min(frame_count.saturating_sub(1));
        self.selection.purge_from(frame_count);
        self.staging.reset(frame_count);
        self.stroke_dirty = false;
        self.history.end_replay();
    }

    // ----- persistence -----

    /// Whether a save round trip is outstanding. The session must not
    /// be discarded while this holds.
    pub fn is_saving(&self) -> bool {
        self.save_gate.is_busy()
    }

    /// Persist the collection through the codec, single-flight: a
    /// second save while one is outstanding is rejected with
    /// [`ServiceError::SaveInFlight`]. On success the codec's cache is
    /// invalidated so the next decode observes fresh data.
    pub fn save_with(
        &mut self,
        codec: &dyn SpriteCodec,
        path: &Path,
    ) -> Result<(), SessionError> {
        self.save_gate.acquire()?;
        let result = codec.encode(path, &self.collection);
        self.save_gate.release();
        result?;
        codec.invalidate_cache();
        Ok(())
    }
}
