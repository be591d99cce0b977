//! Shared color palette for indexed-mode sprite collections.
//!
//! An indexed frame stores one palette index byte per pixel; the palette
//! maps those indices to RGB triples. Index 0 is conventionally the
//! transparent/background slot.

use image::Rgba;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum number of colors a palette can hold.
pub const MAX_COLORS: usize = 256;

/// Magenta fallback for indices past the end of the palette.
pub const MAGENTA_FALLBACK: [u8; 3] = [255, 0, 255];

/// Error type for palette construction failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaletteError {
    /// More than [`MAX_COLORS`] entries were supplied.
    #[error("palette has {0} colors, maximum is {MAX_COLORS}")]
    TooManyColors(usize),
}

/// Ordered list of RGB color triples shared by all frames of an
/// indexed-mode collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaletteTable {
    colors: Vec<[u8; 3]>,
}

impl PaletteTable {
    /// Create an empty palette.
    pub fn new() -> Self {
        Self { colors: Vec::new() }
    }

    /// Build a palette from raw triples.
    ///
    /// Returns an error if more than [`MAX_COLORS`] entries are supplied.
    pub fn from_colors(colors: Vec<[u8; 3]>) -> Result<Self, PaletteError> {
        if colors.len() > MAX_COLORS {
            return Err(PaletteError::TooManyColors(colors.len()));
        }
        Ok(Self { colors })
    }

    /// Full 256-entry grayscale ramp, the default palette for new files.
    pub fn grayscale() -> Self {
        let colors = (0..MAX_COLORS).map(|i| [i as u8; 3]).collect();
        Self { colors }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Get the triple at `index`, or `None` past the end of the palette.
    pub fn color(&self, index: u8) -> Option<[u8; 3]> {
        self.colors.get(index as usize).copied()
    }

    /// Replace the triple at `index`. Returns `false` if the slot does
    /// not exist.
    pub fn set_color(&mut self, index: u8, color: [u8; 3]) -> bool {
        match self.colors.get_mut(index as usize) {
            Some(slot) => {
                *slot = color;
                true
            }
            None => false,
        }
    }

    pub fn colors(&self) -> &[[u8; 3]] {
        &self.colors
    }

    /// Resolve an index to RGBA for display.
    ///
    /// The transparent slot (when given) resolves with alpha 0; indices
    /// past the end of the palette resolve to the magenta fallback so a
    /// malformed file is visible rather than invisible.
    pub fn rgba(&self, index: u8, transparent_index: Option<u8>) -> Rgba<u8> {
        let [r, g, b] = self.color(index).unwrap_or(MAGENTA_FALLBACK);
        let alpha = if transparent_index == Some(index) { 0 } else { 255 };
        Rgba([r, g, b, alpha])
    }
}
