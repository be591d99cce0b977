//! The editable sprite aggregate: color mode, palette, flags, frames and
//! animation aux data.
//!
//! A collection is constructed once when edit mode is entered, mutated by
//! the painter and the structural operations, and discarded or reloaded
//! when the session ends. It always holds at least one frame, and every
//! frame's storage format matches the collection's color mode.

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::buffer::{PixelBuffer, PixelFormat};
use crate::palette::PaletteTable;

/// Error type for structural operations on a collection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollectionError {
    /// A removal would leave the collection with zero frames.
    #[error("a collection must keep at least one frame")]
    LastFrameRemoval,
    /// A frame index was at or past the frame count.
    #[error("frame index {index} is out of bounds ({frame_count} frames)")]
    FrameOutOfBounds { index: usize, frame_count: usize },
    /// A frame's storage format does not match the collection's mode.
    #[error("frame {index} storage format does not match the collection's color mode")]
    FormatMismatch { index: usize },
    /// The animation data block does not line up one record per frame.
    #[error("animation data has {records} records for {frame_count} frames")]
    AuxMismatch { records: usize, frame_count: usize },
    /// A frame order was not a permutation of the current frame indices.
    #[error("order is not a permutation of 0..{frame_count}")]
    InvalidOrder { frame_count: usize },
    /// A collection cannot be built without frames.
    #[error("a collection needs at least one frame")]
    NoFrames,
}

/// Format flag bits from the file header, round-tripped as a packed u32.
///
/// The rgb/indexed bits (0x04/0x08) are derived from the color mode and
/// are not stored here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpriteFlags {
    pub transparent: bool,
    pub alpha: bool,
    pub zlib_compressed: bool,
    pub etrle_compressed: bool,
}

impl SpriteFlags {
    pub fn from_bits(bits: u32) -> Self {
        Self {
            transparent: (bits & 0x01) != 0,
            alpha: (bits & 0x02) != 0,
            zlib_compressed: (bits & 0x10) != 0,
            etrle_compressed: (bits & 0x20) != 0,
        }
    }

    /// Pack back to the header layout, filling in the mode bit.
    pub fn bits(&self, mode: &ColorMode) -> u32 {
        let mut bits = 0u32;
        if self.transparent {
            bits |= 0x01;
        }
        if self.alpha {
            bits |= 0x02;
        }
        bits |= match mode {
            ColorMode::Indexed { .. } => 0x08,
            ColorMode::Rgb565 => 0x04,
        };
        if self.zlib_compressed {
            bits |= 0x10;
        }
        if self.etrle_compressed {
            bits |= 0x20;
        }
        bits
    }

    pub fn is_compressed(&self) -> bool {
        self.zlib_compressed || self.etrle_compressed
    }
}

/// Color-depth mode of a collection.
///
/// The palette lives inside the indexed variant so a collection can never
/// hold both a palette and packed samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    Indexed {
        palette: PaletteTable,
        transparent_index: u8,
    },
    Rgb565,
}

impl ColorMode {
    pub fn pixel_format(&self) -> PixelFormat {
        match self {
            ColorMode::Indexed { .. } => PixelFormat::Indexed,
            ColorMode::Rgb565 => PixelFormat::Rgb565,
        }
    }

    pub fn is_indexed(&self) -> bool {
        matches!(self, ColorMode::Indexed { .. })
    }
}

/// Per-frame animation record from the file's app data block.
///
/// `frame_count` is non-zero only on the first frame of a facing
/// direction and gives the number of frames in that direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuxFrameData {
    pub frame_count: u8,
}

/// Summary payload handed to the host application.
///
/// `file_size` is not derivable from the in-memory model; the caller that
/// decoded the file fills it in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpriteSummary {
    pub width: u16,
    pub height: u16,
    pub frame_count: usize,
    pub indexed: bool,
    pub animated: bool,
    pub compressed: bool,
    pub file_size: u64,
}

/// The editable sprite collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpriteCollection {
    mode: ColorMode,
    flags: SpriteFlags,
    frames: Vec<PixelBuffer>,
    /// One record per frame when present.
    aux: Option<Vec<AuxFrameData>>,
}

impl SpriteCollection {
    /// Build a collection, validating the aggregate invariants: at least
    /// one frame, every frame in the mode's storage format, and aux data
    /// (when present) lining up one record per frame.
    pub fn new(
        mode: ColorMode,
        flags: SpriteFlags,
        frames: Vec<PixelBuffer>,
        aux: Option<Vec<AuxFrameData>>,
    ) -> Result<Self, CollectionError> {
        if frames.is_empty() {
            return Err(CollectionError::NoFrames);
        }
        let format = mode.pixel_format();
        for (index, frame) in frames.iter().enumerate() {
            if frame.format() != format {
                return Err(CollectionError::FormatMismatch { index });
            }
        }
        if let Some(records) = &aux {
            if records.len() != frames.len() {
                return Err(CollectionError::AuxMismatch {
                    records: records.len(),
                    frame_count: frames.len(),
                });
            }
        }
        Ok(Self {
            mode,
            flags,
            frames,
            aux,
        })
    }

    pub fn mode(&self) -> &ColorMode {
        &self.mode
    }

    pub fn flags(&self) -> SpriteFlags {
        self.flags
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn frames(&self) -> &[PixelBuffer] {
        &self.frames
    }

    pub fn frame(&self, index: usize) -> Option<&PixelBuffer> {
        self.frames.get(index)
    }

    pub fn frame_mut(&mut self, index: usize) -> Option<&mut PixelBuffer> {
        self.frames.get_mut(index)
    }

    pub fn palette(&self) -> Option<&PaletteTable> {
        match &self.mode {
            ColorMode::Indexed { palette, .. } => Some(palette),
            ColorMode::Rgb565 => None,
        }
    }

    pub fn transparent_index(&self) -> Option<u8> {
        match &self.mode {
            ColorMode::Indexed {
                transparent_index, ..
            } => Some(*transparent_index),
            ColorMode::Rgb565 => None,
        }
    }

    pub fn aux(&self) -> Option<&[AuxFrameData]> {
        self.aux.as_deref()
    }

    pub fn is_animated(&self) -> bool {
        self.frames.len() > 1
    }

    /// Append a new frame filled uniformly with `fill` (a palette index;
    /// packed-mode frames start black). Returns the new frame's index.
    pub fn add_frame(&mut self, width: u16, height: u16, fill: u8) -> usize {
        let frame = match self.mode.pixel_format() {
            PixelFormat::Indexed => PixelBuffer::filled_index(width, height, fill),
            PixelFormat::Rgb565 => {
                PixelBuffer::filled_rgb565(width, height, image::Rgb([0, 0, 0]))
            }
        };
        self.frames.push(frame);
        if let Some(records) = &mut self.aux {
            records.push(AuxFrameData::default());
        }
        self.frames.len() - 1
    }

    /// Remove the named frames in one atomic step, keeping aux data in
    /// lockstep. Duplicate indices are tolerated. Rejected without any
    /// mutation when an index is out of bounds or the removal would
    /// cover every frame.
    pub fn remove_frames(&mut self, indices: &[usize]) -> Result<usize, CollectionError> {
        let frame_count = self.frames.len();
        let mut doomed = vec![false; frame_count];
        for &index in indices {
            if index >= frame_count {
                return Err(CollectionError::FrameOutOfBounds { index, frame_count });
            }
            doomed[index] = true;
        }
        let removed = doomed.iter().filter(|&&d| d).count();
        if removed == frame_count {
            return Err(CollectionError::LastFrameRemoval);
        }
        if removed == 0 {
            return Ok(0);
        }

        let mut keep = doomed.iter().map(|&d| !d);
        self.frames.retain(|_| keep.next().unwrap_or(true));
        if let Some(records) = &mut self.aux {
            let mut keep = doomed.iter().map(|&d| !d);
            records.retain(|_| keep.next().unwrap_or(true));
        }
        Ok(removed)
    }

    /// Reorder frames (and aux data) by `order`, where `order[position]`
    /// names the frame that moves to `position`.
    pub fn apply_order(&mut self, order: &[usize]) -> Result<(), CollectionError> {
        let frame_count = self.frames.len();
        if !crate::staging::is_permutation(order, frame_count) {
            return Err(CollectionError::InvalidOrder { frame_count });
        }
        let frames = std::mem::take(&mut self.frames);
        self.frames = order.iter().map(|&i| frames[i].clone()).collect();
        if let Some(records) = self.aux.take() {
            self.aux = Some(order.iter().map(|&i| records[i]).collect());
        }
        Ok(())
    }

    /// Compose one frame to RGBA through the collection's palette and
    /// transparency settings.
    pub fn frame_rgba(&self, index: usize) -> Option<RgbaImage> {
        let frame = self.frame(index)?;
        let transparent = if self.flags.transparent {
            self.transparent_index()
        } else {
            None
        };
        Some(frame.to_rgba(self.palette(), transparent))
    }

    /// Host summary: dimensions of the lead frame, frame count, mode and
    /// compression bits.
    pub fn summary(&self) -> SpriteSummary {
        let lead = &self.frames[0];
        SpriteSummary {
            width: lead.width(),
            height: lead.height(),
            frame_count: self.frames.len(),
            indexed: self.mode.is_indexed(),
            animated: self.is_animated(),
            compressed: self.flags.is_compressed(),
            file_size: 0,
        }
    }

    /// Untyped metadata payload for the host, mirroring the summary.
    pub fn metadata(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self.summary())
    }
}
