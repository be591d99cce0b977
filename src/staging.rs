//! Staged (uncommitted) reordering of the frame sequence.
//!
//! The engine holds a tentative permutation of the committed frame
//! order. Nothing touches the authoritative collection until the staged
//! order is committed; cancelling simply falls back to the last
//! committed order. Structural edits (add/remove) outside the staging
//! flow reset the staged order to identity.

use thiserror::Error;

/// Error type for staging a reorder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StagingError {
    /// The supplied order is not a bijection over `0..frame_count`.
    #[error("staged order is not a permutation of 0..{frame_count}")]
    InvalidPermutation { frame_count: usize },
}

/// Check that `order` contains each of `0..n` exactly once.
pub(crate) fn is_permutation(order: &[usize], n: usize) -> bool {
    if order.len() != n {
        return false;
    }
    let mut seen = vec![false; n];
    for &index in order {
        if index >= n || seen[index] {
            return false;
        }
        seen[index] = true;
    }
    true
}

/// Staged frame permutation over the committed order.
///
/// `order()[position]` names the original frame displayed at `position`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReorderStagingEngine {
    staged: Vec<usize>,
}

impl ReorderStagingEngine {
    /// Start a staging session over `frame_count` frames, staged at
    /// identity (nothing to commit).
    pub fn new(frame_count: usize) -> Self {
        Self {
            staged: (0..frame_count).collect(),
        }
    }

    /// Reset to identity over a (possibly new) frame count. Called
    /// whenever the committed frame set changes under the staging flow.
    pub fn reset(&mut self, frame_count: usize) {
        self.staged = (0..frame_count).collect();
    }

    pub fn frame_count(&self) -> usize {
        self.staged.len()
    }

    /// The staged display order.
    pub fn order(&self) -> &[usize] {
        &self.staged
    }

    /// Whether the staged order differs from the committed one.
    pub fn is_dirty(&self) -> bool {
        self.staged.iter().enumerate().any(|(pos, &i)| pos != i)
    }

    /// Replace the staged order wholesale.
    pub fn stage(&mut self, order: Vec<usize>) -> Result<(), StagingError> {
        if !is_permutation(&order, self.staged.len()) {
            return Err(StagingError::InvalidPermutation {
                frame_count: self.staged.len(),
            });
        }
        self.staged = order;
        Ok(())
    }

    /// Staged display position of an original frame index.
    pub fn position_of(&self, original_index: usize) -> Option<usize> {
        self.staged.iter().position(|&i| i == original_index)
    }

    /// Swap the staged position of `original_index` with its upper
    /// neighbor. Returns `false` (no-op) at the first position or for an
    /// unknown index.
    pub fn move_up(&mut self, original_index: usize) -> bool {
        match self.position_of(original_index) {
            Some(position) if position > 0 => {
                self.staged.swap(position, position - 1);
                true
            }
            _ => false,
        }
    }

    /// Swap with the lower neighbor. Returns `false` at the last
    /// position or for an unknown index.
    pub fn move_down(&mut self, original_index: usize) -> bool {
        match self.position_of(original_index) {
            Some(position) if position + 1 < self.staged.len() => {
                self.staged.swap(position, position + 1);
                true
            }
            _ => false,
        }
    }

    /// Hand the staged order to the caller for application to the
    /// authoritative collection, then reset to identity over the new
    /// order. Returns `None` when there is nothing to commit.
    pub fn commit(&mut self) -> Option<Vec<usize>> {
        if !self.is_dirty() {
            return None;
        }
        let frame_count = self.staged.len();
        let order = std::mem::replace(&mut self.staged, (0..frame_count).collect());
        Some(order)
    }

    /// Discard the staged order, falling back to the last committed one.
    pub fn cancel(&mut self) {
        let frame_count = self.staged.len();
        self.reset(frame_count);
    }
}
