//! Autotile shape tables.
//!
//! An autotile code selects a *kind* (which block of the source sheet) and a *shape*
//! (which neighbour configuration). Every shape is drawn as four 16x16 quarters, listed
//! top-left, top-right, bottom-left, bottom-right; each entry is the quarter's
//! `[column, row]` inside the kind's block, in 16 pixel units.

use bevy::math::UVec2;

use crate::bitmap::BitmapSlot;

pub type Quarters = [[u8; 2]; 4];

/// Ground-like autotiles, 2x3 tile blocks.
pub const FLOOR: [Quarters; 48] = [
    [[2, 4], [1, 4], [2, 3], [1, 3]],
    [[2, 0], [1, 4], [2, 3], [1, 3]],
    [[2, 4], [3, 0], [2, 3], [1, 3]],
    [[2, 0], [3, 0], [2, 3], [1, 3]],
    [[2, 4], [1, 4], [2, 3], [3, 1]],
    [[2, 0], [1, 4], [2, 3], [3, 1]],
    [[2, 4], [3, 0], [2, 3], [3, 1]],
    [[2, 0], [3, 0], [2, 3], [3, 1]],
    [[2, 4], [1, 4], [2, 1], [1, 3]],
    [[2, 0], [1, 4], [2, 1], [1, 3]],
    [[2, 4], [3, 0], [2, 1], [1, 3]],
    [[2, 0], [3, 0], [2, 1], [1, 3]],
    [[2, 4], [1, 4], [2, 1], [3, 1]],
    [[2, 0], [1, 4], [2, 1], [3, 1]],
    [[2, 4], [3, 0], [2, 1], [3, 1]],
    [[2, 0], [3, 0], [2, 1], [3, 1]],
    [[0, 4], [1, 4], [0, 3], [1, 3]],
    [[0, 4], [3, 0], [0, 3], [1, 3]],
    [[0, 4], [1, 4], [0, 3], [3, 1]],
    [[0, 4], [3, 0], [0, 3], [3, 1]],
    [[2, 2], [1, 2], [2, 3], [1, 3]],
    [[2, 2], [1, 2], [2, 3], [3, 1]],
    [[2, 2], [1, 2], [2, 1], [1, 3]],
    [[2, 2], [1, 2], [2, 1], [3, 1]],
    [[2, 4], [3, 4], [2, 3], [3, 3]],
    [[2, 4], [3, 4], [2, 1], [3, 3]],
    [[2, 0], [3, 4], [2, 3], [3, 3]],
    [[2, 0], [3, 4], [2, 1], [3, 3]],
    [[2, 4], [1, 4], [2, 5], [1, 5]],
    [[2, 0], [1, 4], [2, 5], [1, 5]],
    [[2, 4], [3, 0], [2, 5], [1, 5]],
    [[2, 0], [3, 0], [2, 5], [1, 5]],
    [[0, 4], [3, 4], [0, 3], [3, 3]],
    [[2, 2], [1, 2], [2, 5], [1, 5]],
    [[0, 2], [1, 2], [0, 3], [1, 3]],
    [[0, 2], [1, 2], [0, 3], [3, 1]],
    [[2, 2], [3, 2], [2, 3], [3, 3]],
    [[2, 2], [3, 2], [2, 1], [3, 3]],
    [[2, 4], [3, 4], [2, 5], [3, 5]],
    [[2, 0], [3, 4], [2, 5], [3, 5]],
    [[0, 4], [1, 4], [0, 5], [1, 5]],
    [[0, 4], [3, 0], [0, 5], [1, 5]],
    [[0, 2], [3, 2], [0, 3], [3, 3]],
    [[0, 2], [1, 2], [0, 5], [1, 5]],
    [[0, 4], [3, 4], [0, 5], [3, 5]],
    [[2, 2], [3, 2], [2, 5], [3, 5]],
    [[0, 2], [3, 2], [0, 5], [3, 5]],
    [[0, 0], [1, 0], [0, 1], [1, 1]],
];

/// Wall and roof autotiles, 2x2 tile blocks.
pub const WALL: [Quarters; 16] = [
    [[2, 2], [1, 2], [2, 1], [1, 1]],
    [[0, 2], [1, 2], [0, 1], [1, 1]],
    [[2, 0], [1, 0], [2, 1], [1, 1]],
    [[0, 0], [1, 0], [0, 1], [1, 1]],
    [[2, 2], [3, 2], [2, 1], [3, 1]],
    [[0, 2], [3, 2], [0, 1], [3, 1]],
    [[2, 0], [3, 0], [2, 1], [3, 1]],
    [[0, 0], [3, 0], [0, 1], [3, 1]],
    [[2, 2], [1, 2], [2, 3], [1, 3]],
    [[0, 2], [1, 2], [0, 3], [1, 3]],
    [[2, 0], [1, 0], [2, 3], [1, 3]],
    [[0, 0], [1, 0], [0, 3], [1, 3]],
    [[2, 2], [3, 2], [2, 3], [3, 3]],
    [[0, 2], [3, 2], [0, 3], [3, 3]],
    [[2, 0], [3, 0], [2, 3], [3, 3]],
    [[0, 0], [3, 0], [0, 3], [3, 3]],
];

/// Waterfalls, 2x1 tile blocks (frames stacked vertically).
pub const WATERFALL: [Quarters; 4] = [
    [[2, 0], [1, 0], [2, 1], [1, 1]],
    [[0, 0], [1, 0], [0, 1], [1, 1]],
    [[2, 0], [3, 0], [2, 1], [3, 1]],
    [[0, 0], [3, 0], [0, 1], [3, 1]],
];

/// Shapes per autotile kind in the tile code space.
pub const SHAPES_PER_KIND: u16 = 48;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeTable {
    Floor,
    Wall,
    Waterfall,
}

impl ShapeTable {
    pub fn quarters(self, shape: u16) -> Option<&'static Quarters> {
        let table: &'static [Quarters] = match self {
            ShapeTable::Floor => &FLOOR,
            ShapeTable::Wall => &WALL,
            ShapeTable::Waterfall => &WATERFALL,
        };
        table.get(shape as usize)
    }
}

/// Where an autotile kind lives in its source sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutotileBlock {
    pub slot: BitmapSlot,
    /// Top-left of the block, in 32 pixel tiles.
    pub origin: UVec2,
    pub table: ShapeTable,
}

/// Block origins of the 16 A1 kinds.
const A1_BLOCKS: [[u32; 2]; 16] = [
    [0, 0], [0, 3], [6, 0], [6, 3],
    [8, 0], [14, 0], [8, 3], [14, 3],
    [0, 6], [6, 6], [0, 9], [6, 9],
    [8, 6], [14, 6], [8, 9], [14, 9],
];

pub fn autotile_block(kind: u16) -> Option<AutotileBlock> {
    let block = match kind {
        0..=15 => {
            let [x, y] = A1_BLOCKS[kind as usize];
            let waterfall = kind >= 5 && kind % 2 == 1;
            AutotileBlock {
                slot: BitmapSlot::A1,
                origin: UVec2::new(x, y),
                table: if waterfall {
                    ShapeTable::Waterfall
                } else {
                    ShapeTable::Floor
                },
            }
        }
        16..=47 => {
            let k = u32::from(kind - 16);
            AutotileBlock {
                slot: BitmapSlot::A2,
                origin: UVec2::new((k % 8) * 2, (k / 8) * 3),
                table: ShapeTable::Floor,
            }
        }
        48..=79 => {
            let k = u32::from(kind - 48);
            AutotileBlock {
                slot: BitmapSlot::A3,
                origin: UVec2::new((k % 8) * 2, (k / 8) * 2),
                table: ShapeTable::Wall,
            }
        }
        80..=127 => {
            // Rows alternate between 3 tile high roof tops and 2 tile high walls.
            let k = u32::from(kind - 80);
            let row = k / 8;
            let is_wall = row % 2 == 1;
            AutotileBlock {
                slot: BitmapSlot::A4,
                origin: UVec2::new((k % 8) * 2, (row / 2) * 5 + (row % 2) * 3),
                table: if is_wall {
                    ShapeTable::Wall
                } else {
                    ShapeTable::Floor
                },
            }
        }
        _ => return None,
    };
    Some(block)
}
