use bevy::asset::{AssetEvent, Handle};
use bevy::ecs::component::Component;
use bevy::log::{debug, trace};
use bevy::math::{IVec2, UVec2, Vec2};
use bevy::render::texture::Image;

use crate::animation::AnimationClock;
use crate::atlas::{build_atlas, new_atlas_image, ATLAS_SIZE};
use crate::bitmap::BitmapSlot;
use crate::dirty::DirtyFlags;
use crate::flash::FlashMap;
use crate::geometry::TileGeometry;
use crate::gpu::{BlendMode, BufferId, DrawCall, GpuBackend, ShaderKind, TextureId, VertexLayout};
use crate::region::{CellRect, RegionTracker, SceneGeometry};
use crate::sources::{affects, SourceAssets};
use crate::table::Table;
use crate::vertex::SVertex;

/// Scene z of the ground layer.
pub const GROUND_Z: i32 = 0;
/// Scene z of the above-player layer; characters are expected in between.
pub const ABOVE_Z: i32 = 200;

/// Counters of the work done by `prepare`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub atlas_rebuilds: usize,
    pub region_updates: usize,
    pub buffer_rebuilds: usize,
    /// Times the vertex buffer storage had to grow.
    pub buffer_allocations: usize,
}

struct TilemapState {
    bitmaps: [Option<Handle<Image>>; BitmapSlot::COUNT],
    map_data: Option<Handle<Table>>,
    flags: Option<Handle<Table>>,
    offset: IVec2,
    visible: bool,

    dirty: DirtyFlags,
    region: RegionTracker,

    geometry: TileGeometry,
    atlas_image: Image,
    atlas: TextureId,
    /// Whether the A1 sheet made it into the atlas at the last rebuild.
    animated: bool,
    vbo: BufferId,
    alloc_quads: usize,
    ground_quads: usize,
    above_quads: usize,

    clock: AnimationClock,
    flash: FlashMap,
    stats: RenderStats,
}

/// VX style tilemap: ground layer, above-player layer and flash overlay.
///
/// Tables and tilesets are assets owned by the caller. The tilemap keeps weak handles
/// to them and learns about edits through [`TilemapVx::on_image_event`] and
/// [`TilemapVx::on_table_event`]; atlas and vertex data are re-derived lazily in
/// [`TilemapVx::prepare`]. An asset that is missing from its storage reads as empty.
/// Once [`TilemapVx::dispose`]d, every method except `is_disposed` panics.
#[derive(Component)]
pub struct TilemapVx {
    state: Option<Box<TilemapState>>,
}

impl TilemapVx {
    pub fn new(gpu: &mut impl GpuBackend, geometry: SceneGeometry) -> Self {
        let atlas = gpu.request_atlas_texture(ATLAS_SIZE);
        let vbo = gpu.create_vertex_buffer();
        let flash = FlashMap::new(gpu);

        let mut state = TilemapState {
            bitmaps: Default::default(),
            map_data: None,
            flags: None,
            offset: IVec2::ZERO,
            visible: true,
            dirty: DirtyFlags::ATLAS,
            region: RegionTracker::default(),
            geometry: TileGeometry::default(),
            atlas_image: new_atlas_image(),
            atlas,
            animated: false,
            vbo,
            alloc_quads: 0,
            ground_quads: 0,
            above_quads: 0,
            clock: AnimationClock::default(),
            flash,
            stats: RenderStats::default(),
        };
        state.dirty |= state.region.on_geometry_change(&geometry);

        Self {
            state: Some(Box::new(state)),
        }
    }

    fn state(&self) -> &TilemapState {
        match &self.state {
            Some(state) => state,
            None => panic!("TilemapVx used after dispose"),
        }
    }

    fn state_mut(&mut self) -> &mut TilemapState {
        match &mut self.state {
            Some(state) => state,
            None => panic!("TilemapVx used after dispose"),
        }
    }

    fn guard_disposed(&self) {
        self.state();
    }

    pub fn is_disposed(&self) -> bool {
        self.state.is_none()
    }

    /// Release GPU resources and forget all source handles.
    pub fn dispose(&mut self, gpu: &mut impl GpuBackend) {
        let Some(mut state) = self.state.take() else {
            return;
        };
        state.flash.release(gpu);
        gpu.delete_vertex_buffer(state.vbo);
        gpu.release_atlas_texture(state.atlas);
        debug!("tilemap disposed");
    }

    // --- data ---

    pub fn map_data(&self) -> Option<&Handle<Table>> {
        self.state().map_data.as_ref()
    }

    pub fn set_map_data(&mut self, value: Option<&Handle<Table>>) {
        let state = self.state_mut();
        if replace_handle(&mut state.map_data, value) {
            state.dirty |= DirtyFlags::BUFFERS;
            debug!("tilemap map data replaced");
        }
    }

    pub fn flags(&self) -> Option<&Handle<Table>> {
        self.state().flags.as_ref()
    }

    pub fn set_flags(&mut self, value: Option<&Handle<Table>>) {
        let state = self.state_mut();
        if replace_handle(&mut state.flags, value) {
            state.dirty |= DirtyFlags::BUFFERS;
        }
    }

    pub fn flash_data(&self) -> Option<&Handle<Table>> {
        self.state().flash.data()
    }

    pub fn set_flash_data(&mut self, value: Option<&Handle<Table>>) {
        self.state_mut().flash.set_data(value);
    }

    pub fn bitmap(&self, slot: BitmapSlot) -> Option<&Handle<Image>> {
        self.state().bitmaps[slot.index()].as_ref()
    }

    pub fn set_bitmap(&mut self, slot: BitmapSlot, value: Option<&Handle<Image>>) {
        let state = self.state_mut();
        if replace_handle(&mut state.bitmaps[slot.index()], value) {
            state.dirty |= DirtyFlags::ATLAS;
            debug!("tileset {:?} replaced", slot);
        }
    }

    /// Index based variant of `bitmap`; out of range indices yield `None`.
    pub fn bitmap_index(&self, i: usize) -> Option<&Handle<Image>> {
        self.guard_disposed();
        BitmapSlot::from_index(i).and_then(|slot| self.bitmap(slot))
    }

    /// Index based variant of `set_bitmap`; out of range indices are ignored.
    pub fn set_bitmap_index(&mut self, i: usize, value: Option<&Handle<Image>>) {
        self.guard_disposed();
        if let Some(slot) = BitmapSlot::from_index(i) {
            self.set_bitmap(slot, value);
        }
    }

    /// React to a change of an image asset; only tilesets of this tilemap matter.
    pub fn on_image_event(&mut self, event: &AssetEvent<Image>) {
        let state = self.state_mut();
        if state.bitmaps.iter().any(|b| affects(event, b.as_ref())) {
            state.dirty |= DirtyFlags::ATLAS;
        }
    }

    /// React to a change of a table asset (map data, flags or flash data).
    pub fn on_table_event(&mut self, event: &AssetEvent<Table>) {
        let state = self.state_mut();
        if affects(event, state.map_data.as_ref()) || affects(event, state.flags.as_ref()) {
            state.dirty |= DirtyFlags::BUFFERS;
        }
        state.flash.on_table_event(event);
    }

    // --- scrolling & visibility ---

    pub fn ox(&self) -> i32 {
        self.state().offset.x
    }

    pub fn oy(&self) -> i32 {
        self.state().offset.y
    }

    pub fn set_ox(&mut self, value: i32) {
        let state = self.state_mut();
        if state.offset.x == value {
            return;
        }
        state.offset.x = value;
        state.dirty |= DirtyFlags::REGION;
    }

    pub fn set_oy(&mut self, value: i32) {
        let state = self.state_mut();
        if state.offset.y == value {
            return;
        }
        state.offset.y = value;
        state.dirty |= DirtyFlags::REGION;
    }

    pub fn visible(&self) -> bool {
        self.state().visible
    }

    pub fn set_visible(&mut self, value: bool) {
        self.state_mut().visible = value;
    }

    /// The viewport was moved or resized.
    pub fn on_geometry_change(&mut self, geometry: &SceneGeometry) {
        let state = self.state_mut();
        state.dirty |= state.region.on_geometry_change(geometry);
    }

    // --- per frame ---

    /// Advance tile animation and flash pulse by one tick.
    pub fn update(&mut self) {
        self.state_mut().clock.tick();
    }

    /// Bring atlas, visible region and vertex buffers up to date.
    /// Must run before drawing in the same frame.
    pub fn prepare(&mut self, gpu: &mut impl GpuBackend, sources: SourceAssets) {
        let state = self.state_mut();

        if state.dirty.take(DirtyFlags::ATLAS) {
            state.rebuild_atlas(gpu, sources);
        }

        if state.dirty.take(DirtyFlags::REGION) {
            state.update_region();
        }

        if state.dirty.take(DirtyFlags::BUFFERS) {
            state.rebuild_buffers(gpu, sources);
        }

        state.flash.prepare(gpu, sources.tables);
    }

    /// Ground layer, followed by the flash overlay at half strength.
    pub fn draw_ground(&self, gpu: &mut impl GpuBackend) {
        let state = self.state();
        if !state.visible {
            return;
        }
        state.draw_ground(gpu);
        state.draw_flash(gpu, GROUND_Z);
    }

    /// Above-player layer, followed by the second half of the flash overlay.
    pub fn draw_above(&self, gpu: &mut impl GpuBackend) {
        let state = self.state();
        if !state.visible {
            return;
        }
        state.draw_above(gpu);
        state.draw_flash(gpu, ABOVE_Z);
    }

    // --- introspection ---

    pub fn visible_region(&self) -> CellRect {
        self.state().region.region()
    }

    pub fn display_position(&self) -> IVec2 {
        self.state().region.display_position()
    }

    pub fn ground_quads(&self) -> usize {
        self.state().ground_quads
    }

    pub fn above_quads(&self) -> usize {
        self.state().above_quads
    }

    pub fn ground_vertices(&self) -> &[SVertex] {
        &self.state().geometry.ground
    }

    pub fn above_vertices(&self) -> &[SVertex] {
        &self.state().geometry.above
    }

    pub fn ani_offset(&self) -> Vec2 {
        self.state().clock.ani_offset()
    }

    pub fn flash_alpha(&self) -> f32 {
        self.state().clock.flash_alpha()
    }

    pub fn flash_quads(&self) -> usize {
        self.state().flash.quad_count()
    }

    pub fn pending(&self) -> DirtyFlags {
        self.state().dirty
    }

    pub fn stats(&self) -> RenderStats {
        self.state().stats
    }

    pub fn atlas_texture(&self) -> TextureId {
        self.state().atlas
    }

    pub fn vertex_buffer(&self) -> BufferId {
        self.state().vbo
    }
} // impl TilemapVx

/// Point `slot` at `value` without keeping the asset alive.
/// Returns false if it already pointed there.
fn replace_handle<T: bevy::asset::Asset>(
    slot: &mut Option<Handle<T>>,
    value: Option<&Handle<T>>,
) -> bool {
    if slot.as_ref() == value {
        return false;
    }
    *slot = value.map(Handle::clone_weak);
    true
}

impl TilemapState {
    fn rebuild_atlas(&mut self, gpu: &mut impl GpuBackend, sources: SourceAssets) {
        let images: [Option<&Image>; BitmapSlot::COUNT] =
            std::array::from_fn(|i| sources.image(self.bitmaps[i].as_ref()));
        self.animated = images[BitmapSlot::A1.index()].is_some();
        build_atlas(&mut self.atlas_image, &images);
        gpu.upload_texture(self.atlas, &self.atlas_image);
        self.stats.atlas_rebuilds += 1;
    }

    fn update_region(&mut self) {
        if self.region.update(self.offset) {
            trace!("visible region moved to {:?}", self.region.region().origin);
            self.dirty |= DirtyFlags::BUFFERS;
        }
        self.flash.set_viewport(self.region.region());
        self.stats.region_updates += 1;
    }

    fn rebuild_buffers(&mut self, gpu: &mut impl GpuBackend, sources: SourceAssets) {
        match sources.table(self.map_data.as_ref()) {
            Some(map) => {
                let flags = sources.table(self.flags.as_ref());
                self.geometry.rebuild(map, flags, self.region.region());
            }
            None => self.geometry.clear(),
        }

        self.ground_quads = self.geometry.ground_quads();
        self.above_quads = self.geometry.above_quads();
        let total = self.ground_quads + self.above_quads;
        self.stats.buffer_rebuilds += 1;
        debug!(
            "tilemap buffers rebuilt: {} ground + {} above quads",
            self.ground_quads, self.above_quads
        );

        if total > self.alloc_quads {
            gpu.alloc_vertex_buffer(self.vbo, quad_bytes(total));
            self.alloc_quads = total;
            self.stats.buffer_allocations += 1;
        }

        let ground: &[u8] = bytemuck::cast_slice(&self.geometry.ground);
        let above: &[u8] = bytemuck::cast_slice(&self.geometry.above);
        if !ground.is_empty() {
            gpu.upload_vertex_data(self.vbo, 0, ground);
        }
        if !above.is_empty() {
            gpu.upload_vertex_data(self.vbo, ground.len(), above);
        }

        gpu.ensure_quad_indices(total);
    }

    fn viewport_size(&self) -> UVec2 {
        self.region.scene().size.max(IVec2::ZERO).as_uvec2()
    }

    fn tile_draw(&self, shader: ShaderKind, z: i32, first_quad: usize, quads: usize) -> DrawCall {
        DrawCall {
            buffer: self.vbo,
            layout: VertexLayout::Textured,
            texture: Some(self.atlas),
            shader,
            tex_size: ATLAS_SIZE,
            translation: self.region.display_position(),
            viewport: self.viewport_size(),
            blend: BlendMode::Normal,
            z,
            first_quad,
            quads,
        }
    }

    fn draw_ground(&self, gpu: &mut impl GpuBackend) {
        if self.ground_quads == 0 {
            return;
        }

        let shader = if self.animated {
            ShaderKind::TilemapVx {
                ani_offset: self.clock.ani_offset(),
            }
        } else {
            ShaderKind::Simple
        };
        gpu.draw_quads(&self.tile_draw(shader, GROUND_Z, 0, self.ground_quads));
    }

    fn draw_above(&self, gpu: &mut impl GpuBackend) {
        if self.above_quads == 0 {
            return;
        }
        gpu.draw_quads(&self.tile_draw(
            ShaderKind::Simple,
            ABOVE_Z,
            self.ground_quads,
            self.above_quads,
        ));
    }

    fn draw_flash(&self, gpu: &mut impl GpuBackend, z: i32) {
        self.flash.draw(
            gpu,
            self.clock.flash_alpha(),
            self.region.display_position(),
            self.viewport_size(),
            z,
        );
    }
}

fn quad_bytes(quads: usize) -> usize {
    quads * 4 * std::mem::size_of::<SVertex>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::solid_bitmap;
    use crate::headless::HeadlessBackend;
    use crate::testing::{add_image, add_table, asset_app, filled_table, sources};
    use bevy::asset::Assets;
    use pretty_assertions::assert_eq;

    fn tilemap(gpu: &mut HeadlessBackend) -> TilemapVx {
        TilemapVx::new(gpu, SceneGeometry::from_size(IVec2::new(128, 128)))
    }

    fn modified<T: bevy::asset::Asset>(handle: &Handle<T>) -> AssetEvent<T> {
        AssetEvent::Modified {
            handle: handle.clone_weak(),
        }
    }

    fn removed<T: bevy::asset::Asset>(handle: &Handle<T>) -> AssetEvent<T> {
        AssetEvent::Removed {
            handle: handle.clone_weak(),
        }
    }

    #[test]
    fn prepare_twice_does_no_extra_work() {
        let mut app = asset_app();
        let mut gpu = HeadlessBackend::new();
        let mut map = tilemap(&mut gpu);
        let data = add_table(&mut app, filled_table(10, 10, 1));
        map.set_map_data(Some(&data));

        map.prepare(&mut gpu, sources(&app));
        let stats = map.stats();
        let vertices = map.ground_vertices().to_vec();
        let bytes = gpu.buffer(map.vertex_buffer()).unwrap().data.clone();

        map.prepare(&mut gpu, sources(&app));
        assert_eq!(map.stats(), stats);
        assert_eq!(map.ground_vertices(), &vertices[..]);
        assert!(gpu.buffer(map.vertex_buffer()).unwrap().data == bytes);
        assert_eq!(map.pending(), DirtyFlags::empty());
    }

    #[test]
    fn sub_cell_scroll_only_moves_display_position() {
        let mut app = asset_app();
        let mut gpu = HeadlessBackend::new();
        let mut map = tilemap(&mut gpu);
        let data = add_table(&mut app, filled_table(10, 10, 1));
        map.set_map_data(Some(&data));
        map.prepare(&mut gpu, sources(&app));
        let rebuilds = map.stats().buffer_rebuilds;

        map.set_ox(17);
        map.set_oy(31);
        map.prepare(&mut gpu, sources(&app));
        assert_eq!(map.stats().buffer_rebuilds, rebuilds);
        assert_eq!(map.display_position(), IVec2::new(-17, -31));

        map.set_oy(32);
        map.prepare(&mut gpu, sources(&app));
        assert_eq!(map.stats().buffer_rebuilds, rebuilds + 1);
        assert_eq!(map.visible_region().origin, IVec2::new(0, 1));
    }

    #[test]
    fn same_table_assignment_does_not_churn() {
        let mut app = asset_app();
        let mut gpu = HeadlessBackend::new();
        let mut map = tilemap(&mut gpu);
        let data = add_table(&mut app, filled_table(4, 4, 1));

        map.set_map_data(Some(&data));
        map.prepare(&mut gpu, sources(&app));

        map.set_map_data(Some(&data));
        map.set_map_data(Some(&data.clone_weak()));
        assert_eq!(map.pending(), DirtyFlags::empty());

        let other = add_table(&mut app, filled_table(4, 4, 2));
        map.set_map_data(Some(&other));
        assert!(map.pending().contains(DirtyFlags::BUFFERS));
        assert_eq!(map.map_data(), Some(&other));

        // the old table is no longer watched
        map.prepare(&mut gpu, sources(&app));
        map.on_table_event(&modified(&data));
        assert_eq!(map.pending(), DirtyFlags::empty());
    }

    #[test]
    fn tilemap_does_not_keep_sources_alive() {
        let mut app = asset_app();
        let mut gpu = HeadlessBackend::new();
        let mut map = tilemap(&mut gpu);
        let data = add_table(&mut app, filled_table(4, 4, 1));
        map.set_map_data(Some(&data));
        assert!(map.map_data().unwrap().is_weak());
        assert!(data.is_strong());
    }

    #[test]
    fn table_edits_trigger_rebuild_with_matching_uvs() {
        let mut app = asset_app();
        let mut gpu = HeadlessBackend::new();
        let mut map = tilemap(&mut gpu);
        let data = add_table(&mut app, Table::new_2d(10, 10));
        map.set_map_data(Some(&data));
        map.prepare(&mut gpu, sources(&app));
        assert_eq!(map.ground_quads(), 0);

        if let Some(table) = app.world.resource_mut::<Assets<Table>>().get_mut(&data) {
            table.set(2, 1, 0, 9);
        }
        map.on_table_event(&modified(&data));
        assert!(map.pending().contains(DirtyFlags::BUFFERS));
        map.prepare(&mut gpu, sources(&app));

        assert_eq!(map.ground_quads(), 1);
        let quad = &map.ground_vertices()[..4];
        // tile 9 of sheet B: column 1, row 1
        assert_eq!(quad[0].tex_pos, [32., 544.]);
        assert_eq!(quad[2].tex_pos, [64., 576.]);
        assert_eq!(quad[0].pos, [64., 32.]);
    }

    #[test]
    fn removed_tileset_marks_atlas_dirty_and_reads_as_empty() {
        let mut app = asset_app();
        let mut gpu = HeadlessBackend::new();
        let mut map = tilemap(&mut gpu);
        let a1 = add_image(&mut app, solid_bitmap(UVec2::new(512, 384), [0, 0, 255, 255]));
        let data = add_table(&mut app, filled_table(10, 10, 1));
        map.set_bitmap(BitmapSlot::A1, Some(&a1));
        map.set_map_data(Some(&data));
        map.prepare(&mut gpu, sources(&app));
        assert_eq!(map.stats().atlas_rebuilds, 1);

        map.draw_ground(&mut gpu);
        assert!(matches!(
            gpu.take_draws()[0].shader,
            ShaderKind::TilemapVx { .. }
        ));

        app.world.resource_mut::<Assets<Image>>().remove(&a1);
        map.on_image_event(&removed(&a1));
        assert!(map.pending().contains(DirtyFlags::ATLAS));
        map.prepare(&mut gpu, sources(&app));
        assert_eq!(map.stats().atlas_rebuilds, 2);

        map.draw_ground(&mut gpu);
        assert_eq!(gpu.take_draws()[0].shader, ShaderKind::Simple);
    }

    #[test]
    fn image_events_for_foreign_images_are_ignored() {
        let mut app = asset_app();
        let mut gpu = HeadlessBackend::new();
        let mut map = tilemap(&mut gpu);
        let b = add_image(&mut app, solid_bitmap(UVec2::new(8, 8), [1; 4]));
        let unrelated = add_image(&mut app, solid_bitmap(UVec2::new(8, 8), [2; 4]));
        map.set_bitmap(BitmapSlot::B, Some(&b));
        map.prepare(&mut gpu, sources(&app));

        map.on_image_event(&modified(&unrelated));
        assert_eq!(map.pending(), DirtyFlags::empty());
        map.on_image_event(&modified(&b));
        assert_eq!(map.pending(), DirtyFlags::ATLAS);
    }

    #[test]
    fn vertex_storage_only_grows() {
        let mut app = asset_app();
        let mut gpu = HeadlessBackend::new();
        let mut map = tilemap(&mut gpu);
        let data = add_table(&mut app, filled_table(10, 10, 1));
        map.set_map_data(Some(&data));
        map.prepare(&mut gpu, sources(&app));
        assert_eq!(map.stats().buffer_allocations, 1);
        let capacity = gpu.buffer(map.vertex_buffer()).unwrap().data.len();

        for code in [0, 1] {
            if let Some(table) = app.world.resource_mut::<Assets<Table>>().get_mut(&data) {
                table.fill(code);
            }
            map.on_table_event(&modified(&data));
            map.prepare(&mut gpu, sources(&app));
            assert_eq!(gpu.buffer(map.vertex_buffer()).unwrap().data.len(), capacity);
        }
        assert_eq!(map.ground_quads(), 25);
        assert_eq!(map.stats().buffer_allocations, 1);
    }

    #[test]
    fn above_layer_draws_after_ground_quads() {
        let mut app = asset_app();
        let mut gpu = HeadlessBackend::new();
        let mut map = tilemap(&mut gpu);

        let mut table = Table::new(2, 1, 3);
        table.set(0, 0, 0, 1);
        table.set(1, 0, 0, 1);
        table.set(1, 0, 2, 2);
        let data = add_table(&mut app, table);
        let mut flags = Table::new_2d(8192, 1);
        flags.set(2, 0, 0, 0x10);
        let flags = add_table(&mut app, flags);

        map.set_map_data(Some(&data));
        map.set_flags(Some(&flags));
        map.prepare(&mut gpu, sources(&app));
        assert_eq!((map.ground_quads(), map.above_quads()), (2, 1));

        map.draw_ground(&mut gpu);
        map.draw_above(&mut gpu);
        let draws = gpu.take_draws();
        assert_eq!(draws.len(), 2);
        assert_eq!((draws[0].first_quad, draws[0].quads, draws[0].z), (0, 2, GROUND_Z));
        assert_eq!((draws[1].first_quad, draws[1].quads, draws[1].z), (2, 1, ABOVE_Z));

        // above bytes follow ground bytes in the shared buffer
        let buffer = &gpu.buffer(map.vertex_buffer()).unwrap().data;
        let above: &[u8] = bytemuck::cast_slice(map.above_vertices());
        assert!(&buffer[quad_bytes(2)..quad_bytes(3)] == above);
    }

    #[test]
    fn flash_drawn_with_both_layers_at_half_alpha() {
        let mut app = asset_app();
        let mut gpu = HeadlessBackend::new();
        let mut map = tilemap(&mut gpu);
        let data = add_table(&mut app, filled_table(10, 10, 1));
        map.set_map_data(Some(&data));
        let mut flash = Table::new_2d(10, 10);
        flash.set(0, 0, 0, 0xF00);
        let flash = add_table(&mut app, flash);
        map.set_flash_data(Some(&flash));

        map.prepare(&mut gpu, sources(&app));
        map.draw_ground(&mut gpu);
        map.draw_above(&mut gpu);

        let flash_draws: Vec<_> = gpu
            .take_draws()
            .into_iter()
            .filter(|d| matches!(d.shader, ShaderKind::Flash { .. }))
            .collect();
        assert_eq!(flash_draws.len(), 2);
        let expected = f32::from(0x78u8) / 255. / 2.;
        for draw in &flash_draws {
            assert_eq!(draw.shader, ShaderKind::Flash { alpha: expected });
            assert_eq!(draw.blend, BlendMode::Additive);
        }
        assert_eq!((flash_draws[0].z, flash_draws[1].z), (GROUND_Z, ABOVE_Z));
    }

    #[test]
    fn invisible_tilemap_draws_nothing() {
        let mut app = asset_app();
        let mut gpu = HeadlessBackend::new();
        let mut map = tilemap(&mut gpu);
        let data = add_table(&mut app, filled_table(10, 10, 1));
        map.set_map_data(Some(&data));
        map.prepare(&mut gpu, sources(&app));
        map.set_visible(false);
        map.draw_ground(&mut gpu);
        map.draw_above(&mut gpu);
        assert!(gpu.draws().is_empty());
    }

    #[test]
    fn dispose_releases_gpu_resources() {
        let mut gpu = HeadlessBackend::new();
        let mut map = tilemap(&mut gpu);
        assert_eq!(gpu.texture_count(), 1);
        assert_eq!(gpu.buffer_count(), 2);

        map.dispose(&mut gpu);
        assert!(map.is_disposed());
        assert_eq!(gpu.texture_count(), 0);
        assert_eq!(gpu.buffer_count(), 0);
    }

    #[test]
    #[should_panic(expected = "used after dispose")]
    fn use_after_dispose_panics() {
        let mut gpu = HeadlessBackend::new();
        let mut map = tilemap(&mut gpu);
        map.dispose(&mut gpu);
        map.set_ox(3);
    }

    #[test]
    #[should_panic(expected = "used after dispose")]
    fn out_of_range_bitmap_index_after_dispose_panics() {
        let mut gpu = HeadlessBackend::new();
        let mut map = tilemap(&mut gpu);
        map.dispose(&mut gpu);
        map.set_bitmap_index(BitmapSlot::COUNT, None);
    }

    #[test]
    fn bitmap_index_out_of_range_is_ignored() {
        let mut app = asset_app();
        let mut gpu = HeadlessBackend::new();
        let mut map = tilemap(&mut gpu);
        map.prepare(&mut gpu, sources(&app));
        let bm = add_image(&mut app, solid_bitmap(UVec2::new(4, 4), [0; 4]));

        map.set_bitmap_index(BitmapSlot::COUNT, Some(&bm));
        assert_eq!(map.pending(), DirtyFlags::empty());
        assert!(map.bitmap_index(BitmapSlot::COUNT).is_none());

        map.set_bitmap_index(5, Some(&bm));
        assert_eq!(map.bitmap(BitmapSlot::B), Some(&bm));
    }

    #[test]
    fn removed_map_data_clears_geometry() {
        let mut app = asset_app();
        let mut gpu = HeadlessBackend::new();
        let mut map = tilemap(&mut gpu);
        let data = add_table(&mut app, filled_table(10, 10, 1));
        map.set_map_data(Some(&data));
        map.prepare(&mut gpu, sources(&app));
        assert_eq!(map.ground_quads(), 25);

        app.world.resource_mut::<Assets<Table>>().remove(&data);
        map.on_table_event(&removed(&data));
        assert!(map.pending().contains(DirtyFlags::BUFFERS));
        map.prepare(&mut gpu, sources(&app));
        assert_eq!(map.ground_quads(), 0);
    }
}
