use bevy::math::{Rect, Vec2, Vec4};
use bytemuck::{Pod, Zeroable};

/// Textured vertex: map-space position and atlas pixel coordinate.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct SVertex {
    pub pos: [f32; 2],
    pub tex_pos: [f32; 2],
}

/// Colored vertex used by the flash overlay.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct CVertex {
    pub pos: [f32; 2],
    pub color: [f32; 4],
}

/// Corners in quad winding order: top-left, top-right, bottom-right, bottom-left.
fn corners(rect: Rect) -> [Vec2; 4] {
    [
        rect.min,
        Vec2::new(rect.max.x, rect.min.y),
        rect.max,
        Vec2::new(rect.min.x, rect.max.y),
    ]
}

pub fn textured_quad(tex: Rect, pos: Rect) -> [SVertex; 4] {
    let t = corners(tex);
    let p = corners(pos);
    std::array::from_fn(|i| SVertex {
        pos: p[i].to_array(),
        tex_pos: t[i].to_array(),
    })
}

pub fn colored_quad(pos: Rect, color: Vec4) -> [CVertex; 4] {
    let p = corners(pos);
    std::array::from_fn(|i| CVertex {
        pos: p[i].to_array(),
        color: color.to_array(),
    })
}
