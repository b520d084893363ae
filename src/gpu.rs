//! Contract of the graphics-resource service the tilemap renders through.
//!
//! The tilemap never talks to a graphics API directly. It asks a [`GpuBackend`] for a
//! fixed-size atlas texture and vertex buffers, uploads bytes into them, and describes
//! each draw as a [`DrawCall`]. Allocation failures are the backend's business: a
//! backend that cannot satisfy a request is expected to abort, not to report back.

use bevy::math::{IVec2, UVec2, Vec2};
use bevy::render::texture::Image;
use slotmap::new_key_type;

new_key_type! {
    /// Atlas texture owned by the backend.
    pub struct TextureId;

    /// Vertex buffer owned by the backend.
    pub struct BufferId;
}

/// Layout of the vertices stored in a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexLayout {
    /// [`crate::vertex::SVertex`]
    Textured,
    /// [`crate::vertex::CVertex`]
    Colored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    Normal,
    Additive,
}

/// Shader strategy plus its strategy-specific uniforms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShaderKind {
    /// Plain textured quads.
    Simple,
    /// Textured quads whose atlas coordinates inside the A1 area are shifted by
    /// `ani_offset` to select the current animation frame.
    TilemapVx { ani_offset: Vec2 },
    /// Vertex colored quads with a global opacity multiplier.
    Flash { alpha: f32 },
}

/// Everything needed to issue one indexed draw of `quads` quads starting at `first_quad`
/// in `buffer`, using the shared quad index buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub buffer: BufferId,
    pub layout: VertexLayout,
    pub texture: Option<TextureId>,
    pub shader: ShaderKind,
    /// Texture size in pixels; vertex texture coordinates are in pixels.
    pub tex_size: UVec2,
    pub translation: IVec2,
    /// Viewport size in pixels, for the projection.
    pub viewport: UVec2,
    pub blend: BlendMode,
    /// Scene depth; draws are composited with the scene's other objects by this value.
    pub z: i32,
    pub first_quad: usize,
    pub quads: usize,
}

pub trait GpuBackend {
    /// A new frame starts; per-frame state (command lists, statistics) may be reset.
    fn begin_frame(&mut self) {}

    fn request_atlas_texture(&mut self, size: UVec2) -> TextureId;
    fn release_atlas_texture(&mut self, texture: TextureId);
    fn upload_texture(&mut self, texture: TextureId, image: &Image);

    fn create_vertex_buffer(&mut self) -> BufferId;
    fn delete_vertex_buffer(&mut self, buffer: BufferId);
    /// (Re)allocate `buffer` with `bytes` of uninitialized storage.
    fn alloc_vertex_buffer(&mut self, buffer: BufferId, bytes: usize);
    fn upload_vertex_data(&mut self, buffer: BufferId, offset: usize, data: &[u8]);

    /// Grow the shared quad index buffer so it covers at least `quads` quads.
    /// Never shrinks. Must be called before drawing that many quads.
    fn ensure_quad_indices(&mut self, quads: usize);
    fn quad_index_capacity(&self) -> usize;

    fn draw_quads(&mut self, call: &DrawCall);
}

/// Index data shared by every quad draw: quad `q` uses vertices `4q..4q+4`
/// as the two triangles `(0, 1, 2)` and `(2, 3, 0)`.
#[derive(Debug, Default, Clone)]
pub struct QuadIndexBuffer {
    indices: Vec<u32>,
}

impl QuadIndexBuffer {
    pub const INDICES_PER_QUAD: usize = 6;

    /// Returns true if the buffer grew (and needs to be re-uploaded).
    pub fn ensure(&mut self, quads: usize) -> bool {
        let current = self.quad_capacity();
        if quads <= current {
            return false;
        }

        self.indices.reserve((quads - current) * Self::INDICES_PER_QUAD);
        for q in current..quads {
            let base = (q * 4) as u32;
            self.indices
                .extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
        }
        true
    }

    pub fn quad_capacity(&self) -> usize {
        self.indices.len() / Self::INDICES_PER_QUAD
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }
}
