use bevy::math::UVec2;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};
use bevy::render::texture::Image;

/// The tileset sheets feeding one tilemap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BitmapSlot {
    /// Animated autotiles (water, waterfalls).
    A1,
    /// Ground autotiles.
    A2,
    /// Building autotiles.
    A3,
    /// Wall autotiles.
    A4,
    /// Plain ground tiles.
    A5,
    B,
    C,
    D,
    E,
}

impl BitmapSlot {
    pub const COUNT: usize = 9;

    pub const ALL: [BitmapSlot; Self::COUNT] = [
        BitmapSlot::A1,
        BitmapSlot::A2,
        BitmapSlot::A3,
        BitmapSlot::A4,
        BitmapSlot::A5,
        BitmapSlot::B,
        BitmapSlot::C,
        BitmapSlot::D,
        BitmapSlot::E,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(i: usize) -> Option<Self> {
        Self::ALL.get(i).copied()
    }
}

/// Transparent RGBA8 tileset image.
pub fn new_bitmap(size: UVec2) -> Image {
    let data = vec![0u8; (size.x * size.y) as usize * 4];
    rgba_image(size, data)
}

/// Tileset image filled with a single RGBA color.
pub fn solid_bitmap(size: UVec2, rgba: [u8; 4]) -> Image {
    let data = rgba.repeat((size.x * size.y) as usize);
    rgba_image(size, data)
}

pub(crate) fn rgba_image(size: UVec2, data: Vec<u8>) -> Image {
    Image::new(
        Extent3d {
            width: size.x,
            height: size.y,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        data,
        TextureFormat::Rgba8UnormSrgb,
    )
}

pub(crate) fn image_size(image: &Image) -> UVec2 {
    let size = image.texture_descriptor.size;
    UVec2::new(size.width, size.height)
}
