//! Frame selection tracking with single, toggle and range semantics.
//!
//! Membership is a set of frame indices; a separate last-touched index
//! anchors range selection. Range selection resolves through the order
//! the frames are currently *displayed* in (which may be a staged
//! reorder), so visual adjacency wins over raw index adjacency.

use std::collections::BTreeSet;

/// Tracks which frames are selected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionController {
    selected: BTreeSet<usize>,
    anchor: Option<usize>,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-select: clears the set and selects only `index`.
    pub fn select(&mut self, index: usize) {
        self.selected.clear();
        self.selected.insert(index);
        self.anchor = Some(index);
    }

    /// Flip membership of `index`.
    pub fn toggle(&mut self, index: usize) {
        if !self.selected.remove(&index) {
            self.selected.insert(index);
        }
        self.anchor = Some(index);
    }

    /// Add every frame between the anchor and `index` (inclusive), both
    /// resolved to positions in `display_order`. Never removes indices
    /// selected outside the span. No-op without an anchor or when either
    /// end is missing from the displayed order.
    pub fn select_range(&mut self, index: usize, display_order: &[usize]) {
        let Some(anchor) = self.anchor else {
            return;
        };
        let anchor_pos = display_order.iter().position(|&i| i == anchor);
        let end_pos = display_order.iter().position(|&i| i == index);
        let (Some(a), Some(b)) = (anchor_pos, end_pos) else {
            return;
        };
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        for &frame in &display_order[lo..=hi] {
            self.selected.insert(frame);
        }
    }

    /// Empty the set. The range anchor is retained so a subsequent
    /// range-select still has a starting point; use [`reset_anchor`]
    /// to drop it explicitly.
    ///
    /// [`reset_anchor`]: SelectionController::reset_anchor
    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn reset_anchor(&mut self) {
        self.anchor = None;
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.selected.contains(&index)
    }

    /// Selected indices in ascending order.
    pub fn indices(&self) -> Vec<usize> {
        self.selected.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn anchor(&self) -> Option<usize> {
        self.anchor
    }

    /// Drop every selected index at or above `cut`, along with the
    /// anchor if it falls there too. Called when frames are removed or
    /// the frame count shrinks: removed indices are gone and shifted
    /// ones no longer name the same frame.
    pub fn purge_from(&mut self, cut: usize) {
        self.selected.retain(|&i| i < cut);
        if self.anchor.is_some_and(|a| a >= cut) {
            self.anchor = None;
        }
    }

    /// Remap every selected index (and the anchor) through `map`,
    /// dropping entries the map has no slot for. Used when a committed
    /// reorder moves the selected frames to new positions.
    pub fn remap(&mut self, map: impl Fn(usize) -> Option<usize>) {
        let old = std::mem::take(&mut self.selected);
        self.selected = old.into_iter().filter_map(&map).collect();
        self.anchor = self.anchor.and_then(map);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_is_exclusive() {
        let mut selection = SelectionController::new();
        selection.select(2);
        selection.select(5);
        assert_eq!(selection.indices(), vec![5]);
        assert_eq!(selection.anchor(), Some(5));
    }

    #[test]
    fn test_toggle_flips_membership() {
        let mut selection = SelectionController::new();
        selection.toggle(3);
        assert!(selection.is_selected(3));
        selection.toggle(3);
        assert!(!selection.is_selected(3));
        assert_eq!(selection.anchor(), Some(3));
    }

    #[test]
    fn test_range_resolves_through_display_order() {
        // Staged order: frame 3 is shown first, then 1, 0, 2.
        let display = [3, 1, 0, 2];
        let mut selection = SelectionController::new();
        selection.select(1); // anchor at display position 1
        selection.select_range(2, &display); // display position 3

        // Positions 1..=3 hold frames 1, 0, 2.
        assert_eq!(selection.indices(), vec![0, 1, 2]);
        assert!(!selection.is_selected(3));
    }

    #[test]
    fn test_range_is_additive() {
        let display = [0, 1, 2, 3, 4];
        let mut selection = SelectionController::new();
        selection.toggle(0);
        selection.toggle(4); // selection {0, 4}, anchor 4
        selection.select_range(3, &display);
        // The span 3..=4 is added; 0 stays selected outside it.
        assert_eq!(selection.indices(), vec![0, 3, 4]);
    }

    #[test]
    fn test_range_without_anchor_is_noop() {
        let mut selection = SelectionController::new();
        selection.select_range(3, &[0, 1, 2, 3]);
        assert!(selection.is_empty());
    }

    #[test]
    fn test_clear_keeps_anchor() {
        let mut selection = SelectionController::new();
        selection.select(2);
        selection.clear();
        assert!(selection.is_empty());
        assert_eq!(selection.anchor(), Some(2));

        selection.select_range(0, &[0, 1, 2]);
        assert_eq!(selection.indices(), vec![0, 1, 2]);

        selection.reset_anchor();
        assert_eq!(selection.anchor(), None);
    }

    #[test]
    fn test_purge_from_drops_invalid_indices() {
        let mut selection = SelectionController::new();
        for i in [0, 2, 4] {
            selection.toggle(i);
        }
        selection.purge_from(3);
        assert_eq!(selection.indices(), vec![0, 2]);
        // Anchor was 4, which is gone.
        assert_eq!(selection.anchor(), None);
    }

    #[test]
    fn test_remap_follows_reorder() {
        let mut selection = SelectionController::new();
        selection.toggle(0);
        selection.toggle(3);
        // Order [3, 1, 0, 2]: frame 3 moves to position 0, frame 0 to 2.
        let order = [3usize, 1, 0, 2];
        selection.remap(|i| order.iter().position(|&o| o == i));
        assert_eq!(selection.indices(), vec![0, 2]);
        assert_eq!(selection.anchor(), Some(0));
    }
}
