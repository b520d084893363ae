use bevy::math::UVec2;
use bevy::render::render_resource::TextureFormat;
use thiserror::Error;

use crate::bitmap::BitmapSlot;

/// Reasons a source bitmap could not be copied into the tile atlas.
/// These never reach the caller of `prepare`; the slot is skipped and logged.
#[derive(Debug, Error, PartialEq)]
pub enum AtlasError {
    #[error("bitmap for slot {slot:?} has unsupported format {format:?} (expected RGBA8)")]
    UnsupportedFormat {
        slot: BitmapSlot,
        format: TextureFormat,
    },

    #[error("bitmap for slot {slot:?} holds {actual} bytes, {expected} expected for {size:?}")]
    TruncatedData {
        slot: BitmapSlot,
        size: UVec2,
        expected: usize,
        actual: usize,
    },
}
