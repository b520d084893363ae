use bevy::asset::{AssetEvent, Assets, Handle};
use bevy::log::trace;
use bevy::math::{IVec2, Rect, UVec2, Vec2, Vec4};

use crate::gpu::{BlendMode, BufferId, DrawCall, GpuBackend, ShaderKind, VertexLayout};
use crate::region::{CellRect, CELL_SIZE};
use crate::sources::affects;
use crate::table::Table;
use crate::vertex::{colored_quad, CVertex};

/// Color of a packed `0xRGB` flash value (4 bits per channel), `None` if not flashing.
pub fn flash_color(packed: i16) -> Option<Vec4> {
    if packed == 0 {
        return None;
    }
    let max = 15.;
    let r = f32::from((packed >> 8) as u8 & 0xF) / max;
    let g = f32::from((packed >> 4) as u8 & 0xF) / max;
    let b = f32::from(packed as u8 & 0xF) / max;
    Some(Vec4::new(r, g, b, 1.))
}

/// Highlight pass over the cells marked in a flash data table.
///
/// Owns its own vertex buffer and dirty state; it is rebuilt when its table changes or
/// the visible region moves, independently of the tile geometry.
pub struct FlashMap {
    data: Option<Handle<Table>>,
    dirty: bool,

    viewport: CellRect,
    vertices: Vec<CVertex>,
    quads: usize,
    alloc_quads: usize,
    vbo: BufferId,
    rebuilds: usize,
}

impl FlashMap {
    pub fn new(gpu: &mut impl GpuBackend) -> Self {
        Self {
            data: None,
            dirty: false,
            viewport: CellRect::default(),
            vertices: Vec::new(),
            quads: 0,
            alloc_quads: 0,
            vbo: gpu.create_vertex_buffer(),
            rebuilds: 0,
        }
    }

    pub fn data(&self) -> Option<&Handle<Table>> {
        self.data.as_ref()
    }

    pub fn set_data(&mut self, value: Option<&Handle<Table>>) {
        if self.data.as_ref() == value {
            return;
        }
        self.data = value.map(Handle::clone_weak);
        self.dirty = true;
    }

    pub fn on_table_event(&mut self, event: &AssetEvent<Table>) {
        if affects(event, self.data.as_ref()) {
            self.dirty = true;
        }
    }

    pub fn set_viewport(&mut self, viewport: CellRect) {
        if viewport == self.viewport {
            return;
        }
        self.viewport = viewport;
        self.dirty = true;
    }

    pub fn quad_count(&self) -> usize {
        self.quads
    }

    pub fn vertices(&self) -> &[CVertex] {
        &self.vertices
    }

    pub fn rebuild_count(&self) -> usize {
        self.rebuilds
    }

    pub fn prepare(&mut self, gpu: &mut impl GpuBackend, tables: &Assets<Table>) {
        if !std::mem::take(&mut self.dirty) {
            return;
        }
        self.rebuild(gpu, tables);
    }

    fn rebuild(&mut self, gpu: &mut impl GpuBackend, tables: &Assets<Table>) {
        self.vertices.clear();

        if let Some(data) = self.data.as_ref().and_then(|h| tables.get(h)) {
            self.collect_quads(data);
        }

        self.quads = self.vertices.len() / 4;
        self.rebuilds += 1;
        trace!("flash overlay rebuilt: {} quads", self.quads);

        if self.quads == 0 {
            return;
        }

        let bytes: &[u8] = bytemuck::cast_slice(&self.vertices);
        if self.quads > self.alloc_quads {
            gpu.alloc_vertex_buffer(self.vbo, bytes.len());
            self.alloc_quads = self.quads;
        }
        gpu.upload_vertex_data(self.vbo, 0, bytes);
        gpu.ensure_quad_indices(self.quads);
    }

    fn collect_quads(&mut self, data: &Table) {
        let cell = CELL_SIZE as f32;
        let size = self.viewport.size;
        for y in 0..size.y {
            for x in 0..size.x {
                let map = self.viewport.origin + IVec2::new(x, y);
                let Some(color) = data.get(map.x, map.y, 0).and_then(flash_color) else {
                    continue;
                };
                let min = Vec2::new(x as f32, y as f32) * cell;
                let pos = Rect::from_corners(min, min + Vec2::splat(cell));
                self.vertices.extend_from_slice(&colored_quad(pos, color));
            }
        }
    }

    pub fn draw(
        &self,
        gpu: &mut impl GpuBackend,
        alpha: f32,
        translation: IVec2,
        viewport: UVec2,
        z: i32,
    ) {
        if self.quads == 0 {
            return;
        }
        gpu.draw_quads(&DrawCall {
            buffer: self.vbo,
            layout: VertexLayout::Colored,
            texture: None,
            shader: ShaderKind::Flash { alpha },
            tex_size: UVec2::ONE,
            translation,
            viewport,
            blend: BlendMode::Additive,
            z,
            first_quad: 0,
            quads: self.quads,
        });
    }

    pub fn release(&mut self, gpu: &mut impl GpuBackend) {
        self.data = None;
        gpu.delete_vertex_buffer(self.vbo);
    }
}
