use bevy::math::{Rect, Vec2};

use crate::atlas::{tile_sprite, TileSprite};
use crate::region::{CellRect, CELL_SIZE};
use crate::table::Table;
use crate::vertex::{textured_quad, SVertex};

/// Tile layers of the map data table (a fourth layer, if present, holds shadow and
/// region data and is not drawn).
pub const TILE_LAYERS: usize = 3;

/// Flag bit: tile is drawn over characters.
pub const FLAG_ABOVE_PLAYER: i16 = 0x10;

/// Receiver of the quads produced by [`read_tiles`].
pub trait QuadSink {
    /// `tex[i]` (atlas pixels) is drawn at `pos[i]` (pixels relative to the region origin).
    fn on_quads(&mut self, tex: &[Rect], pos: &[Rect], above: bool);
}

fn is_above(flags: Option<&Table>, code: i16) -> bool {
    flags
        .and_then(|f| f.get(i32::from(code), 0, 0))
        .map_or(false, |bits| bits & FLAG_ABOVE_PLAYER != 0)
}

/// Emit the quads of every tile inside `region`.
///
/// Cells outside `map`, sentinel codes and codes without a sprite produce nothing.
/// `flags` is indexed by tile code; without it every tile is ground level.
pub fn read_tiles(sink: &mut impl QuadSink, map: &Table, flags: Option<&Table>, region: CellRect) {
    let layers = map.zsize().min(TILE_LAYERS) as i32;
    let cell = CELL_SIZE as f32;
    let half = cell / 2.;

    for (i, cell_pos) in region.cells().enumerate() {
        let x = i as i32 % region.size.x;
        let y = i as i32 / region.size.x;
        let base = Vec2::new(x as f32, y as f32) * cell;

        for z in 0..layers {
            let Some(code) = map.get(cell_pos.x, cell_pos.y, z) else {
                continue;
            };
            let above = is_above(flags, code);

            match tile_sprite(code) {
                Some(TileSprite::Whole(tex)) => {
                    let dest = Rect::from_corners(base, base + Vec2::splat(cell));
                    sink.on_quads(&[tex], &[dest], above);
                }
                Some(TileSprite::Quarters(tex)) => {
                    let dest = [
                        Vec2::new(0., 0.),
                        Vec2::new(half, 0.),
                        Vec2::new(0., half),
                        Vec2::new(half, half),
                    ]
                    .map(|o| Rect::from_corners(base + o, base + o + Vec2::splat(half)));
                    sink.on_quads(&tex, &dest, above);
                }
                None => {}
            }
        }
    }
}

/// Vertex streams of the visible region: ground level and above-player quads.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TileGeometry {
    pub ground: Vec<SVertex>,
    pub above: Vec<SVertex>,
}

impl TileGeometry {
    /// Replace both streams with the tiles of `region`.
    pub fn rebuild(&mut self, map: &Table, flags: Option<&Table>, region: CellRect) {
        self.clear();
        read_tiles(self, map, flags, region);
    }

    pub fn clear(&mut self) {
        self.ground.clear();
        self.above.clear();
    }

    pub fn ground_quads(&self) -> usize {
        self.ground.len() / 4
    }

    pub fn above_quads(&self) -> usize {
        self.above.len() / 4
    }
}

impl QuadSink for TileGeometry {
    fn on_quads(&mut self, tex: &[Rect], pos: &[Rect], above: bool) {
        let stream = if above { &mut self.above } else { &mut self.ground };
        stream.reserve(tex.len() * 4);
        for (t, p) in tex.iter().zip(pos) {
            stream.extend_from_slice(&textured_quad(*t, *p));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::codes;
    use bevy::math::IVec2;

    fn region(x: i32, y: i32, w: i32, h: i32) -> CellRect {
        CellRect::new(IVec2::new(x, y), IVec2::new(w, h))
    }

    #[test]
    fn filled_map_yields_one_quad_per_cell() {
        let mut map = Table::new_2d(10, 10);
        map.fill(1);

        let mut geometry = TileGeometry::default();
        geometry.rebuild(&map, None, region(0, 0, 5, 5));
        assert_eq!(geometry.ground_quads(), 25);
        assert_eq!(geometry.above_quads(), 0);

        // last quad sits at cell (4, 4) of the region
        let last = &geometry.ground[geometry.ground.len() - 4..];
        assert_eq!(last[0].pos, [128., 128.]);
        assert_eq!(last[2].pos, [160., 160.]);
    }

    #[test]
    fn cells_outside_map_are_skipped() {
        let mut map = Table::new_2d(4, 4);
        map.fill(1);

        let mut geometry = TileGeometry::default();
        geometry.rebuild(&map, None, region(-2, 2, 4, 4));
        // only x in 0..2 and y in 2..4 are inside
        assert_eq!(geometry.ground_quads(), 4);
    }

    #[test]
    fn sentinel_and_unknown_codes_are_skipped() {
        let mut map = Table::new_2d(4, 1);
        map.set(0, 0, 0, -1);
        map.set(1, 0, 0, 0);
        map.set(2, 0, 0, 1200);
        map.set(3, 0, 0, 9000);

        let mut geometry = TileGeometry::default();
        geometry.rebuild(&map, None, region(0, 0, 4, 1));
        assert_eq!(geometry, TileGeometry::default());
    }

    #[test]
    fn above_flag_routes_quads_to_above_stream() {
        let mut map = Table::new(2, 1, 3);
        map.set(0, 0, 0, codes::A2);
        map.set(0, 0, 2, 5);
        map.set(1, 0, 0, 6);

        let mut flags = Table::new_2d(codes::MAX as usize, 1);
        flags.set(5, 0, 0, FLAG_ABOVE_PLAYER);

        let mut geometry = TileGeometry::default();
        geometry.rebuild(&map, Some(&flags), region(0, 0, 2, 1));
        // autotile = 4 quarters, plus tile 6
        assert_eq!(geometry.ground_quads(), 5);
        assert_eq!(geometry.above_quads(), 1);
        assert_eq!(geometry.above[0].pos, [0., 0.]);
    }

    #[test]
    fn autotile_quarters_cover_the_cell() {
        let mut map = Table::new_2d(1, 1);
        map.set(0, 0, 0, codes::A2);

        let mut geometry = TileGeometry::default();
        geometry.rebuild(&map, None, region(0, 0, 1, 1));
        let positions: Vec<[f32; 2]> = geometry.ground.iter().step_by(4).map(|v| v.pos).collect();
        assert_eq!(positions, vec![[0., 0.], [16., 0.], [0., 16.], [16., 16.]]);
    }
}
