use bevy::asset::Handle;
use bevy::math::IVec2;
use bevy::render::texture::Image;

use crate::bitmap::BitmapSlot;
use crate::gpu::GpuBackend;
use crate::region::SceneGeometry;
use crate::renderer::TilemapVx;
use crate::table::Table;

/// Collects the initial state of a [`TilemapVx`].
/// Handles are stored weak; the caller keeps the assets alive.
///
/// ```ignore
/// let tilemap = TilemapVxBuilder::new(SceneGeometry::from_size(IVec2::new(544, 416)))
///     .with_map_data(&tables.add(map))
///     .with_bitmap(BitmapSlot::A1, &asset_server.load("Tilesets/World_A1.png"))
///     .with_offset(IVec2::new(0, 64))
///     .build(&mut gpu);
/// ```
pub struct TilemapVxBuilder {
    geometry: SceneGeometry,
    map_data: Option<Handle<Table>>,
    flags: Option<Handle<Table>>,
    flash_data: Option<Handle<Table>>,
    bitmaps: Vec<(BitmapSlot, Handle<Image>)>,
    offset: IVec2,
    visible: bool,
}

impl TilemapVxBuilder {
    pub fn new(geometry: SceneGeometry) -> Self {
        Self {
            geometry,
            map_data: None,
            flags: None,
            flash_data: None,
            bitmaps: Vec::new(),
            offset: IVec2::ZERO,
            visible: true,
        }
    } // fn new

    pub fn with_map_data(mut self, map_data: &Handle<Table>) -> Self {
        self.map_data = Some(map_data.clone_weak());
        self
    }

    pub fn with_flags(mut self, flags: &Handle<Table>) -> Self {
        self.flags = Some(flags.clone_weak());
        self
    }

    pub fn with_flash_data(mut self, flash_data: &Handle<Table>) -> Self {
        self.flash_data = Some(flash_data.clone_weak());
        self
    }

    /// Later calls for the same slot win.
    pub fn with_bitmap(mut self, slot: BitmapSlot, bitmap: &Handle<Image>) -> Self {
        self.bitmaps.retain(|(s, _)| *s != slot);
        self.bitmaps.push((slot, bitmap.clone_weak()));
        self
    }

    pub fn with_offset(mut self, offset: IVec2) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn build(self, gpu: &mut impl GpuBackend) -> TilemapVx {
        let mut tilemap = TilemapVx::new(gpu, self.geometry);
        tilemap.set_map_data(self.map_data.as_ref());
        tilemap.set_flags(self.flags.as_ref());
        tilemap.set_flash_data(self.flash_data.as_ref());
        for (slot, bitmap) in &self.bitmaps {
            tilemap.set_bitmap(*slot, Some(bitmap));
        }
        tilemap.set_ox(self.offset.x);
        tilemap.set_oy(self.offset.y);
        tilemap.set_visible(self.visible);
        tilemap
    } // fn build
}
