//! Which map cells are on screen.
//!
//! The tracked region is the viewport plus one trailing cell per axis, so sub-cell
//! scrolling never exposes an unrendered edge. Sub-cell motion only moves the
//! display position; the region (and with it the vertex data) changes only when the
//! scroll offset crosses into a different origin cell.

use bevy::math::IVec2;
use num::Integer;

use crate::dirty::DirtyFlags;

/// Edge length of a map cell, in pixels.
pub const CELL_SIZE: i32 = 32;

/// Cell containing pixel coordinate `px`, rounding towards negative infinity.
pub fn cell_floor(px: i32) -> i32 {
    Integer::div_floor(&px, &CELL_SIZE)
}

/// Rectangle of map cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CellRect {
    pub origin: IVec2,
    pub size: IVec2,
}

impl CellRect {
    pub fn new(origin: IVec2, size: IVec2) -> Self {
        Self { origin, size }
    }

    /// Cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = IVec2> + '_ {
        (0..self.size.y).flat_map(move |y| {
            (0..self.size.x).map(move |x| self.origin + IVec2::new(x, y))
        })
    }

    pub fn area(&self) -> i32 {
        self.size.x.max(0) * self.size.y.max(0)
    }
}

/// Placement of the drawing area inside the scene, as reported by the scene's
/// geometry-change event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SceneGeometry {
    /// Top-left of the viewport rectangle, in pixels.
    pub position: IVec2,
    /// Viewport size, in pixels.
    pub size: IVec2,
    /// Scroll origin of the viewport.
    pub origin: IVec2,
}

impl SceneGeometry {
    pub fn from_size(size: IVec2) -> Self {
        Self {
            size,
            ..Default::default()
        }
    }
}

fn cells_covering(px: i32) -> i32 {
    px / CELL_SIZE + i32::from(px % CELL_SIZE != 0) + 1
}

#[derive(Debug, Clone, Default)]
pub struct RegionTracker {
    region: CellRect,
    scene_offset: IVec2,
    scene: SceneGeometry,
    display_position: IVec2,
}

impl RegionTracker {
    pub fn new(geometry: &SceneGeometry) -> Self {
        let mut tracker = Self::default();
        tracker.on_geometry_change(geometry);
        tracker
    }

    /// Resize the region to the new viewport. The origin is left for `update`.
    pub fn on_geometry_change(&mut self, geometry: &SceneGeometry) -> DirtyFlags {
        self.region.size = IVec2::new(cells_covering(geometry.size.x), cells_covering(geometry.size.y));
        self.scene_offset = geometry.position - geometry.origin;
        self.scene = *geometry;

        DirtyFlags::REGION | DirtyFlags::BUFFERS
    }

    /// Recompute the origin cell for scroll `offset`.
    /// Returns true iff the origin cell changed, i.e. vertex data must be rebuilt.
    pub fn update(&mut self, offset: IVec2) -> bool {
        let offs = offset - self.scene_offset;
        let origin = IVec2::new(cell_floor(offs.x), cell_floor(offs.y));

        let changed = origin != self.region.origin;
        self.region.origin = origin;

        self.display_position = -(offset - self.region.origin * CELL_SIZE) + self.scene_offset;
        changed
    }

    pub fn region(&self) -> CellRect {
        self.region
    }

    pub fn scene(&self) -> &SceneGeometry {
        &self.scene
    }

    /// Translation applied to the region's vertex data when drawing.
    pub fn display_position(&self) -> IVec2 {
        self.display_position
    }
}
