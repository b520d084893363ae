use bevy::ecs::system::Resource;
use bevy::log::trace;
use bevy::math::UVec2;
use bevy::render::texture::Image;
use slotmap::SlotMap;

use crate::gpu::{BufferId, DrawCall, GpuBackend, QuadIndexBuffer, TextureId};

#[derive(Debug, Default, Clone)]
pub struct HeadlessTexture {
    pub size: UVec2,
    pub data: Vec<u8>,
    pub uploads: usize,
}

#[derive(Debug, Default, Clone)]
pub struct HeadlessBuffer {
    pub data: Vec<u8>,
    pub allocations: usize,
}

/// [`GpuBackend`] that keeps every resource in host memory and records draw calls.
///
/// Useful for servers, tooling and tests: all bytes the tilemap would send to a GPU
/// can be inspected afterwards. The draw log only covers the current frame.
#[derive(Debug, Default, Resource)]
pub struct HeadlessBackend {
    textures: SlotMap<TextureId, HeadlessTexture>,
    buffers: SlotMap<BufferId, HeadlessBuffer>,
    quad_indices: QuadIndexBuffer,
    draws: Vec<DrawCall>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn texture(&self, id: TextureId) -> Option<&HeadlessTexture> {
        self.textures.get(id)
    }

    pub fn buffer(&self, id: BufferId) -> Option<&HeadlessBuffer> {
        self.buffers.get(id)
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    pub fn quad_indices(&self) -> &QuadIndexBuffer {
        &self.quad_indices
    }

    pub fn draws(&self) -> &[DrawCall] {
        &self.draws
    }

    /// Hand out and forget the draw calls recorded since the frame began.
    pub fn take_draws(&mut self) -> Vec<DrawCall> {
        std::mem::take(&mut self.draws)
    }
}

impl GpuBackend for HeadlessBackend {
    fn begin_frame(&mut self) {
        self.draws.clear();
    }

    fn request_atlas_texture(&mut self, size: UVec2) -> TextureId {
        self.textures.insert(HeadlessTexture {
            size,
            data: vec![0; (size.x * size.y) as usize * 4],
            uploads: 0,
        })
    }

    fn release_atlas_texture(&mut self, texture: TextureId) {
        self.textures.remove(texture);
    }

    fn upload_texture(&mut self, texture: TextureId, image: &Image) {
        if let Some(tex) = self.textures.get_mut(texture) {
            tex.data.clear();
            tex.data.extend_from_slice(&image.data);
            tex.uploads += 1;
        }
    }

    fn create_vertex_buffer(&mut self) -> BufferId {
        self.buffers.insert(HeadlessBuffer::default())
    }

    fn delete_vertex_buffer(&mut self, buffer: BufferId) {
        self.buffers.remove(buffer);
    }

    fn alloc_vertex_buffer(&mut self, buffer: BufferId, bytes: usize) {
        if let Some(buf) = self.buffers.get_mut(buffer) {
            buf.data = vec![0; bytes];
            buf.allocations += 1;
        }
    }

    fn upload_vertex_data(&mut self, buffer: BufferId, offset: usize, data: &[u8]) {
        let Some(buf) = self.buffers.get_mut(buffer) else {
            return;
        };
        let end = offset + data.len();
        if end > buf.data.len() {
            panic!(
                "vertex upload of {}..{} exceeds buffer size {}",
                offset,
                end,
                buf.data.len()
            );
        }
        buf.data[offset..end].copy_from_slice(data);
    }

    fn ensure_quad_indices(&mut self, quads: usize) {
        if self.quad_indices.ensure(quads) {
            trace!("quad index buffer grown to {} quads", quads);
        }
    }

    fn quad_index_capacity(&self) -> usize {
        self.quad_indices.quad_capacity()
    }

    fn draw_quads(&mut self, call: &DrawCall) {
        if call.first_quad + call.quads > self.quad_indices.quad_capacity() {
            panic!(
                "draw of quads {}..{} before the index buffer covers them ({} quads)",
                call.first_quad,
                call.first_quad + call.quads,
                self.quad_indices.quad_capacity()
            );
        }
        self.draws.push(call.clone());
    }
}
