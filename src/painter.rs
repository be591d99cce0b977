//! Stateless paint policy applied to a single frame.
//!
//! Translates a tool, a coordinate and a color into a buffer mutation.
//! Coordinates are signed: pointer drags routinely report positions off
//! the canvas (including negative ones) during fast motion, and those
//! land as silent no-ops rather than errors.

use image::Rgb;
use serde::{Deserialize, Serialize};

use crate::buffer::{pack_rgb565, unpack_rgb565, PixelBuffer, PixelFormat};

/// Editing tool selected in the host UI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    #[default]
    Brush,
    Eraser,
    Eyedropper,
    /// Viewport drag; never touches pixels.
    Pan,
    /// Reserved: declared by the surrounding tooling but not implemented.
    Fill,
}

/// Color payload for brush strokes, matching the collection's mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrushColor {
    /// Palette index, for indexed-mode frames.
    Index(u8),
    /// RGB triple, packed to 5-6-5 on write, for packed-mode frames.
    Rgb(Rgb<u8>),
}

/// What a single paint application did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaintOutcome {
    /// A sample was written.
    Painted,
    /// Nothing happened: out of bounds, wrong mode for the color, or a
    /// non-painting tool.
    Ignored,
    /// Eyedropper pickup; the value becomes the next brush color.
    Sampled(BrushColor),
}

/// Apply one tool application at `(x, y)`.
pub fn paint(
    buffer: &mut PixelBuffer,
    tool: Tool,
    x: i32,
    y: i32,
    color: BrushColor,
) -> PaintOutcome {
    if !buffer.contains(x, y) {
        return PaintOutcome::Ignored;
    }
    match tool {
        Tool::Brush => match (buffer.format(), color) {
            (PixelFormat::Indexed, BrushColor::Index(index)) => {
                buffer.set_index(x, y, index);
                PaintOutcome::Painted
            }
            (PixelFormat::Rgb565, BrushColor::Rgb(rgb)) => {
                buffer.set_rgb565(x, y, pack_rgb565(rgb));
                PaintOutcome::Painted
            }
            _ => PaintOutcome::Ignored,
        },
        // The eraser always writes the background slot, whatever color
        // is selected. There is no erase in packed mode.
        Tool::Eraser => match buffer.format() {
            PixelFormat::Indexed => {
                buffer.set_index(x, y, 0);
                PaintOutcome::Painted
            }
            PixelFormat::Rgb565 => PaintOutcome::Ignored,
        },
        Tool::Eyedropper => match buffer.format() {
            PixelFormat::Indexed => match buffer.index_at(x, y) {
                Some(index) => PaintOutcome::Sampled(BrushColor::Index(index)),
                None => PaintOutcome::Ignored,
            },
            PixelFormat::Rgb565 => match buffer.rgb565_at(x, y) {
                Some(raw) => PaintOutcome::Sampled(BrushColor::Rgb(unpack_rgb565(raw))),
                None => PaintOutcome::Ignored,
            },
        },
        Tool::Pan | Tool::Fill => PaintOutcome::Ignored,
    }
}
