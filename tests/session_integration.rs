//! End-to-end tests for the editing session.
//!
//! These drive the full stack the way a host application would: decode
//! payload in, user intents (paint, select, reorder, undo) against the
//! session, encoded collection out through a codec double.

use std::cell::{Cell, RefCell};
use std::path::Path;

use image::Rgb;
use spritepad::buffer::PixelBuffer;
use spritepad::collection::{AuxFrameData, ColorMode, SpriteCollection, SpriteFlags};
use spritepad::painter::{BrushColor, PaintOutcome, Tool};
use spritepad::palette::PaletteTable;
use spritepad::service::{DecodedSprite, ServiceError, SpriteCodec};
use spritepad::session::EditSession;

/// A 4-frame indexed collection with a 4-color palette; frame `i` is
/// filled with index `i` so frames stay identifiable after reordering.
fn four_frame_session() -> EditSession {
    let mode = ColorMode::Indexed {
        palette: PaletteTable::from_colors(vec![
            [0, 0, 0],
            [255, 0, 0],
            [0, 255, 0],
            [0, 0, 255],
        ])
        .unwrap(),
        transparent_index: 0,
    };
    let frames = (0..4)
        .map(|i| PixelBuffer::filled_index(8, 8, i as u8))
        .collect();
    let aux = Some((0..4).map(|i| AuxFrameData { frame_count: i }).collect());
    let collection = SpriteCollection::new(mode, SpriteFlags::default(), frames, aux).unwrap();
    EditSession::new(collection)
}

fn first_pixels(session: &EditSession) -> Vec<u8> {
    session
        .collection()
        .frames()
        .iter()
        .map(|f| f.index_at(0, 0).unwrap())
        .collect()
}

/// In-memory codec double recording encode/invalidate calls.
#[derive(Default)]
struct RecordingCodec {
    encoded: RefCell<Vec<SpriteCollection>>,
    invalidations: Cell<usize>,
    fail_writes: Cell<bool>,
}

impl SpriteCodec for RecordingCodec {
    fn decode(&self, _path: &Path) -> Result<DecodedSprite, ServiceError> {
        match self.encoded.borrow().last() {
            Some(collection) => Ok(DecodedSprite {
                collection: collection.clone(),
                file_size: 0,
            }),
            None => Err(ServiceError::Unreadable("nothing encoded yet".into())),
        }
    }

    fn encode(&self, _path: &Path, collection: &SpriteCollection) -> Result<(), ServiceError> {
        if self.fail_writes.get() {
            return Err(ServiceError::WriteFailed("disk full".into()));
        }
        self.encoded.borrow_mut().push(collection.clone());
        Ok(())
    }

    fn invalidate_cache(&self) {
        self.invalidations.set(self.invalidations.get() + 1);
    }
}

#[test]
fn test_paint_stroke_undo_reorder_scenario() {
    let mut session = four_frame_session();

    // Paint index 1 at (0,0) on frame 0 and commit the stroke.
    session.set_tool(Tool::Brush);
    session.set_brush(BrushColor::Index(1));
    session.begin_stroke();
    assert_eq!(session.paint_at(0, 0), PaintOutcome::Painted);
    session.end_stroke();
    assert_eq!(session.history().len(), 2);
    assert_eq!(
        session.collection().frame(0).unwrap().index_at(0, 0),
        Some(1)
    );

    // Undo returns pixel (0,0) to its original value.
    assert!(session.undo());
    assert_eq!(
        session.collection().frame(0).unwrap().index_at(0, 0),
        Some(0)
    );

    // Cancel before commit leaves the authoritative order unchanged.
    session.stage_order(vec![3, 1, 0, 2]).unwrap();
    session.cancel_reorder();
    assert_eq!(first_pixels(&session), vec![0, 1, 2, 3]);

    // Stage and commit: the frame previously at index 3 is now first.
    session.stage_order(vec![3, 1, 0, 2]).unwrap();
    assert!(session.commit_reorder().unwrap());
    assert_eq!(first_pixels(&session), vec![3, 1, 0, 2]);

    // Animation aux data followed its frames.
    let aux: Vec<u8> = session
        .collection()
        .aux()
        .unwrap()
        .iter()
        .map(|a| a.frame_count)
        .collect();
    assert_eq!(aux, vec![3, 1, 0, 2]);
}

#[test]
fn test_paint_then_eyedropper_reads_back_painted_value() {
    let mut session = four_frame_session();
    session.set_brush(BrushColor::Index(2));
    session.begin_stroke();
    for (x, y) in [(0, 0), (7, 7), (3, 5)] {
        session.paint_at(x, y);
    }
    session.end_stroke();

    session.set_tool(Tool::Eyedropper);
    for (x, y) in [(0, 0), (7, 7), (3, 5)] {
        assert_eq!(
            session.paint_at(x, y),
            PaintOutcome::Sampled(BrushColor::Index(2))
        );
    }
}

#[test]
fn test_range_select_follows_display_positions() {
    let mut session = four_frame_session();
    session.stage_order(vec![3, 1, 0, 2]).unwrap();

    // Anchor on the frame at display position 1, extend to position 3.
    session.select_frame(1);
    session.select_range_to(2);

    // Display positions 1..=3 hold original frames 1, 0, 2.
    assert_eq!(session.selection().indices(), vec![0, 1, 2]);
    assert!(!session.selection().is_selected(3));
}

#[test]
fn test_remove_rejects_covering_set_any_size() {
    let mut session = four_frame_session();
    assert!(session.remove_frames(&[0, 1, 2, 3]).is_err());
    assert_eq!(session.collection().frame_count(), 4);

    // Proper subset succeeds and shrinks the count by exactly that many.
    assert_eq!(session.remove_frames(&[1, 3]).unwrap(), 2);
    assert_eq!(session.collection().frame_count(), 2);
    assert_eq!(first_pixels(&session), vec![0, 2]);

    // Down to one frame: removing it is always rejected.
    session.remove_frames(&[1]).unwrap();
    assert!(session.remove_frames(&[0]).is_err());
    assert_eq!(session.collection().frame_count(), 1);
}

#[test]
fn test_undo_after_redo_after_undo_round_trip() {
    let mut session = four_frame_session();
    session.set_brush(BrushColor::Index(3));
    session.begin_stroke();
    session.paint_at(2, 2);
    session.end_stroke();

    assert!(session.undo());
    let after_undo = session.collection().clone();
    assert!(session.redo());
    assert!(session.undo());
    assert_eq!(session.collection(), &after_undo);
}

#[test]
fn test_new_edit_after_undo_discards_redo_branch() {
    let mut session = four_frame_session();
    session.set_brush(BrushColor::Index(1));
    for _ in 0..2 {
        session.begin_stroke();
        session.paint_at(0, 0);
        session.paint_at(1, 0);
        session.end_stroke();
    }
    assert_eq!(session.history().len(), 3);

    assert!(session.undo());
    assert!(session.can_redo());

    session.begin_stroke();
    session.paint_at(5, 5);
    session.end_stroke();
    assert_eq!(session.history().len(), 3);
    assert!(!session.can_redo());
}

#[test]
fn test_packed_mode_paint_and_sample() {
    let frames = vec![PixelBuffer::filled_rgb565(8, 8, Rgb([0, 0, 0]))];
    let collection =
        SpriteCollection::new(ColorMode::Rgb565, SpriteFlags::default(), frames, None).unwrap();
    let mut session = EditSession::new(collection);

    session.set_brush(BrushColor::Rgb(Rgb([200, 100, 50])));
    session.begin_stroke();
    assert_eq!(session.paint_at(4, 4), PaintOutcome::Painted);
    session.end_stroke();

    // Eyedropper returns the 5-6-5 quantized color.
    session.set_tool(Tool::Eyedropper);
    assert_eq!(
        session.paint_at(4, 4),
        PaintOutcome::Sampled(BrushColor::Rgb(Rgb([200, 100, 48])))
    );

    // Eraser is undefined in packed mode: nothing changes.
    session.set_tool(Tool::Eraser);
    session.begin_stroke();
    assert_eq!(session.paint_at(4, 4), PaintOutcome::Ignored);
    session.end_stroke();
    assert_eq!(session.history().len(), 2);
}

#[test]
fn test_save_round_trip_through_codec() {
    let mut session = four_frame_session();
    let codec = RecordingCodec::default();
    let path = Path::new("unit.sti");

    session.set_brush(BrushColor::Index(1));
    session.begin_stroke();
    session.paint_at(0, 0);
    session.end_stroke();

    session.save_with(&codec, path).unwrap();
    assert_eq!(codec.encoded.borrow().len(), 1);
    assert_eq!(codec.invalidations.get(), 1);
    assert!(!session.is_saving());

    // A fresh decode of what was saved reproduces the edited state.
    let reloaded = codec.decode(path).unwrap();
    assert_eq!(&reloaded.collection, session.collection());
}

#[test]
fn test_failed_save_reports_and_releases_gate() {
    let mut session = four_frame_session();
    let codec = RecordingCodec::default();
    codec.fail_writes.set(true);

    let err = session.save_with(&codec, Path::new("unit.sti")).unwrap_err();
    assert!(matches!(
        err,
        spritepad::session::SessionError::Service(ServiceError::WriteFailed(_))
    ));
    // No cache invalidation for a failed write, and the gate is free
    // again for the retry.
    assert_eq!(codec.invalidations.get(), 0);
    assert!(!session.is_saving());

    codec.fail_writes.set(false);
    session.save_with(&codec, Path::new("unit.sti")).unwrap();
}
