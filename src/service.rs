//! Contract for the external sprite persistence/codec service.
//!
//! The engine never touches the disk itself: decoding, encoding,
//! compression and export conversion all live behind [`SpriteCodec`].
//! Calls that cross this seam are long-running round trips with no
//! defined timeout; [`SaveGate`] keeps them single-flight per
//! collection so a second save can never interleave with one that is
//! still outstanding.

use std::path::Path;

use thiserror::Error;

use crate::collection::SpriteCollection;

/// Error type for codec service round trips.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The path could not be read at all.
    #[error("cannot read sprite file: {0}")]
    Unreadable(String),
    /// The payload failed structural validation (bad signature,
    /// truncated data).
    #[error("invalid sprite file: {0}")]
    InvalidFormat(String),
    /// The file decodes but uses a format the service cannot handle.
    #[error("unsupported sprite format: {0}")]
    UnsupportedFormat(String),
    /// Encode failed; the contract requires the file to be untouched.
    #[error("failed to write sprite file: {0}")]
    WriteFailed(String),
    /// A save round trip is already outstanding for this collection.
    #[error("a save is already in flight for this collection")]
    SaveInFlight,
}

/// Decoded payload: the editable collection plus the on-disk byte size
/// the host displays.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedSprite {
    pub collection: SpriteCollection,
    pub file_size: u64,
}

/// The opaque persistence/codec service the engine consumes.
///
/// `encode` must be atomic: either the file is fully rewritten or left
/// untouched, since the engine has no way to detect a half-written file
/// on the next decode. The incremental operations are optional mirrors
/// for services that maintain on-disk state frame by frame; their
/// default implementations fall back to a full encode, which is
/// equivalent in effect.
pub trait SpriteCodec {
    fn decode(&self, path: &Path) -> Result<DecodedSprite, ServiceError>;

    fn encode(&self, path: &Path, collection: &SpriteCollection) -> Result<(), ServiceError>;

    /// Decode pre-shaped for mutation; the result seeds the session's
    /// initial history entry.
    fn enter_edit(&self, path: &Path) -> Result<DecodedSprite, ServiceError> {
        self.decode(path)
    }

    fn update_frame(
        &self,
        path: &Path,
        collection: &SpriteCollection,
        frame_index: usize,
    ) -> Result<(), ServiceError> {
        let _ = frame_index;
        self.encode(path, collection)
    }

    fn add_frame(
        &self,
        path: &Path,
        collection: &SpriteCollection,
        frame_index: usize,
    ) -> Result<(), ServiceError> {
        let _ = frame_index;
        self.encode(path, collection)
    }

    fn reorder_frames(
        &self,
        path: &Path,
        collection: &SpriteCollection,
        order: &[usize],
    ) -> Result<(), ServiceError> {
        let _ = order;
        self.encode(path, collection)
    }

    fn delete_frames(
        &self,
        path: &Path,
        collection: &SpriteCollection,
        removed: &[usize],
    ) -> Result<(), ServiceError> {
        let _ = removed;
        self.encode(path, collection)
    }

    /// Drop any cached decoded representation. Required after every
    /// structural save so a subsequent decode observes fresh data.
    fn invalidate_cache(&self);
}

/// Single-flight guard for save round trips.
///
/// Policy for a second save intent while one is outstanding: rejected
/// with [`ServiceError::SaveInFlight`], not queued — rejecting is the
/// one option that can never persist a stale snapshot behind a newer
/// one, and the host can always retry. The gate is explicit so an
/// asynchronous host can hold it across an await point.
#[derive(Debug, Clone, Copy, Default)]
pub struct SaveGate {
    busy: bool,
}

impl SaveGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the gate for one save round trip.
    pub fn acquire(&mut self) -> Result<(), ServiceError> {
        if self.busy {
            return Err(ServiceError::SaveInFlight);
        }
        self.busy = true;
        Ok(())
    }

    /// Release after the round trip resolves, success or failure.
    pub fn release(&mut self) {
        self.busy = false;
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::PixelBuffer;
    use crate::collection::{ColorMode, SpriteFlags};
    use crate::palette::PaletteTable;
    use std::cell::Cell;

    fn collection() -> SpriteCollection {
        let mode = ColorMode::Indexed {
            palette: PaletteTable::grayscale(),
            transparent_index: 0,
        };
        let frames = vec![PixelBuffer::filled_index(2, 2, 0)];
        SpriteCollection::new(mode, SpriteFlags::default(), frames, None).unwrap()
    }

    /// Codec double that counts encode calls.
    struct CountingCodec {
        encodes: Cell<usize>,
    }

    impl SpriteCodec for CountingCodec {
        fn decode(&self, _path: &Path) -> Result<DecodedSprite, ServiceError> {
            Ok(DecodedSprite {
                collection: collection(),
                file_size: 64,
            })
        }

        fn encode(
            &self,
            _path: &Path,
            _collection: &SpriteCollection,
        ) -> Result<(), ServiceError> {
            self.encodes.set(self.encodes.get() + 1);
            Ok(())
        }

        fn invalidate_cache(&self) {}
    }

    #[test]
    fn test_save_gate_rejects_second_acquire() {
        let mut gate = SaveGate::new();
        gate.acquire().unwrap();
        assert_eq!(gate.acquire(), Err(ServiceError::SaveInFlight));
        gate.release();
        gate.acquire().unwrap();
    }

    #[test]
    fn test_enter_edit_defaults_to_decode() {
        let codec = CountingCodec {
            encodes: Cell::new(0),
        };
        let decoded = codec.enter_edit(Path::new("unit.sti")).unwrap();
        assert_eq!(decoded.file_size, 64);
        assert_eq!(decoded.collection.frame_count(), 1);
    }

    #[test]
    fn test_incremental_mirrors_fall_back_to_full_encode() {
        let codec = CountingCodec {
            encodes: Cell::new(0),
        };
        let collection = collection();
        let path = Path::new("unit.sti");

        codec.update_frame(path, &collection, 0).unwrap();
        codec.add_frame(path, &collection, 0).unwrap();
        codec.reorder_frames(path, &collection, &[0]).unwrap();
        codec.delete_frames(path, &collection, &[0]).unwrap();
        assert_eq!(codec.encodes.get(), 4);
    }
}
