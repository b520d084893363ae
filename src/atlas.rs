//! Tile atlas composition and tile code lookup.
//!
//! All tileset sheets of a map are copied into one texture so the whole map can be
//! drawn with a single texture binding. Every sheet has a fixed, reserved area:
//!
//! ```text
//!  x:  0      512    1024   1536   2048  2304
//!      +------+------+------+------+----+
//!      |  A1  |  A2  |  A3  |  A4  | A5 |   y: 0
//!      +------+------+------+------+----+
//!      |  B   |  C   |  D   |  E   |          y: 512
//!      +------+------+------+------+
//! ```
//!
//! The layout is part of the vertex data contract: tile codes resolve to fixed pixel
//! rectangles of this atlas.

use bevy::log::{debug, warn};
use bevy::math::{Rect, UVec2, Vec2};
use bevy::render::render_resource::TextureFormat;
use bevy::render::texture::Image;

use crate::autotile::{autotile_block, SHAPES_PER_KIND};
use crate::bitmap::{image_size, rgba_image, BitmapSlot};
use crate::error::AtlasError;
use crate::region::CELL_SIZE;

pub const ATLAS_SIZE: UVec2 = UVec2::new(2560, 1024);

const BYTES_PER_PIXEL: usize = 4;

/// Tile code ranges of the VX tile code space.
pub mod codes {
    pub const B: i16 = 0;
    pub const C: i16 = 256;
    pub const D: i16 = 512;
    pub const E: i16 = 768;
    pub const A5: i16 = 1536;
    pub const A1: i16 = 2048;
    pub const A2: i16 = 2816;
    pub const A3: i16 = 4352;
    pub const A4: i16 = 5888;
    pub const MAX: i16 = 8192;
}

/// Reserved area of `slot` in the atlas, in pixels: (origin, size).
pub fn slot_area(slot: BitmapSlot) -> (UVec2, UVec2) {
    let (origin, size) = match slot {
        BitmapSlot::A1 => ([0, 0], [512, 384]),
        BitmapSlot::A2 => ([512, 0], [512, 384]),
        BitmapSlot::A3 => ([1024, 0], [512, 256]),
        BitmapSlot::A4 => ([1536, 0], [512, 480]),
        BitmapSlot::A5 => ([2048, 0], [256, 512]),
        BitmapSlot::B => ([0, 512], [512, 512]),
        BitmapSlot::C => ([512, 512], [512, 512]),
        BitmapSlot::D => ([1024, 512], [512, 512]),
        BitmapSlot::E => ([1536, 512], [512, 512]),
    };
    (UVec2::from_array(origin), UVec2::from_array(size))
}

pub fn new_atlas_image() -> Image {
    let data = vec![0u8; (ATLAS_SIZE.x * ATLAS_SIZE.y) as usize * BYTES_PER_PIXEL];
    rgba_image(ATLAS_SIZE, data)
}

/// Copy every loaded source image into its reserved atlas area.
///
/// Every slot area is cleared first, so absent, unloaded and rejected sources leave
/// their area transparent. Returns the number of slots copied.
pub fn build_atlas(atlas: &mut Image, sources: &[Option<&Image>; BitmapSlot::COUNT]) -> usize {
    let mut copied = 0;
    for slot in BitmapSlot::ALL {
        clear_slot(atlas, slot);
        let Some(image) = sources[slot.index()] else {
            continue;
        };
        match blit_slot(atlas, slot, image) {
            Ok(()) => copied += 1,
            Err(err) => warn!("skipping tileset: {}", err),
        }
    }
    debug!("tile atlas rebuilt from {} source(s)", copied);
    copied
}

fn clear_slot(atlas: &mut Image, slot: BitmapSlot) {
    let (origin, area) = slot_area(slot);
    let row_bytes = area.x as usize * BYTES_PER_PIXEL;
    for y in origin.y..origin.y + area.y {
        let dst = (y as usize * ATLAS_SIZE.x as usize + origin.x as usize) * BYTES_PER_PIXEL;
        atlas.data[dst..dst + row_bytes].fill(0);
    }
}

fn blit_slot(atlas: &mut Image, slot: BitmapSlot, source: &Image) -> Result<(), AtlasError> {
    let format = source.texture_descriptor.format;
    if !matches!(
        format,
        TextureFormat::Rgba8UnormSrgb | TextureFormat::Rgba8Unorm
    ) {
        return Err(AtlasError::UnsupportedFormat { slot, format });
    }

    let src_size = image_size(source);
    let expected = (src_size.x * src_size.y) as usize * BYTES_PER_PIXEL;
    if source.data.len() < expected {
        return Err(AtlasError::TruncatedData {
            slot,
            size: src_size,
            expected,
            actual: source.data.len(),
        });
    }

    let (origin, area) = slot_area(slot);
    let copy = src_size.min(area);
    let row_bytes = copy.x as usize * BYTES_PER_PIXEL;

    for y in 0..copy.y as usize {
        let src = y * src_size.x as usize * BYTES_PER_PIXEL;
        let dst = ((origin.y as usize + y) * ATLAS_SIZE.x as usize + origin.x as usize)
            * BYTES_PER_PIXEL;
        atlas.data[dst..dst + row_bytes].copy_from_slice(&source.data[src..src + row_bytes]);
    }
    Ok(())
}

/// Atlas rectangles making up one tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TileSprite {
    /// A full 32x32 tile.
    Whole(Rect),
    /// Four 16x16 quarters: top-left, top-right, bottom-left, bottom-right.
    Quarters([Rect; 4]),
}

fn tile_rect(slot: BitmapSlot, column: u32, row: u32) -> Rect {
    let (origin, _) = slot_area(slot);
    let min = (origin + UVec2::new(column, row) * CELL_SIZE as u32).as_vec2();
    Rect::from_corners(min, min + Vec2::splat(CELL_SIZE as f32))
}

/// Resolve a tile code to its atlas rectangles.
///
/// Returns `None` for the empty tile, negative sentinels, codes in unused ranges and
/// autotile shapes outside their table.
pub fn tile_sprite(code: i16) -> Option<TileSprite> {
    match code {
        c if (codes::B + 1..codes::E + 256).contains(&c) => {
            let slot = [BitmapSlot::B, BitmapSlot::C, BitmapSlot::D, BitmapSlot::E]
                [(c / 256) as usize];
            let t = (c % 256) as u32;
            Some(TileSprite::Whole(tile_rect(
                slot,
                t % 8 + (t / 128) * 8,
                (t % 128) / 8,
            )))
        }
        c if (codes::A5..codes::A5 + 128).contains(&c) => {
            let t = (c - codes::A5) as u32;
            Some(TileSprite::Whole(tile_rect(BitmapSlot::A5, t % 8, t / 8)))
        }
        c if (codes::A1..codes::MAX).contains(&c) => {
            let id = (c - codes::A1) as u16;
            autotile_sprite(id / SHAPES_PER_KIND, id % SHAPES_PER_KIND)
        }
        _ => None,
    }
}

fn autotile_sprite(kind: u16, shape: u16) -> Option<TileSprite> {
    let block = autotile_block(kind)?;
    let quarters = block.table.quarters(shape)?;

    let half = CELL_SIZE as u32 / 2;
    let (slot_origin, _) = slot_area(block.slot);
    let block_origin = slot_origin + block.origin * CELL_SIZE as u32;

    let rects = (*quarters).map(|[qx, qy]| {
        let min = (block_origin + UVec2::new(u32::from(qx), u32::from(qy)) * half).as_vec2();
        Rect::from_corners(min, min + Vec2::splat(half as f32))
    });
    Some(TileSprite::Quarters(rects))
}
