use bevy::math::IVec3;
use bevy::reflect::{TypePath, TypeUuid};

/// Up to three dimensional grid of `i16` values (map tile codes, flags, flash colors).
///
/// Values are stored x-fastest, then y, then z. Tables are assets: game logic owns
/// them in `Assets<Table>` and edits them through `Assets::get_mut`, which is what
/// tilemaps react to.
#[derive(Debug, Clone, PartialEq, Eq, TypeUuid, TypePath)]
#[uuid = "5b0f7a3e-2c41-4d8e-9a57-61c2e3f0b9d4"]
pub struct Table {
    xsize: usize,
    ysize: usize,
    zsize: usize,
    data: Vec<i16>,
}

impl Table {
    pub fn new(xsize: usize, ysize: usize, zsize: usize) -> Self {
        Self {
            xsize,
            ysize,
            zsize,
            data: vec![0; xsize * ysize * zsize],
        }
    }

    pub fn new_2d(xsize: usize, ysize: usize) -> Self {
        Self::new(xsize, ysize, 1)
    }

    pub fn xsize(&self) -> usize {
        self.xsize
    }

    pub fn ysize(&self) -> usize {
        self.ysize
    }

    pub fn zsize(&self) -> usize {
        self.zsize
    }

    fn offset(&self, x: i32, y: i32, z: i32) -> Option<usize> {
        let (x, y, z) = (
            usize::try_from(x).ok()?,
            usize::try_from(y).ok()?,
            usize::try_from(z).ok()?,
        );
        if x >= self.xsize || y >= self.ysize || z >= self.zsize {
            return None;
        }
        Some(x + self.xsize * (y + self.ysize * z))
    }

    /// Element at `(x, y, z)`, `None` outside the table.
    pub fn get(&self, x: i32, y: i32, z: i32) -> Option<i16> {
        self.offset(x, y, z).map(|i| self.data[i])
    }

    pub fn get_at(&self, pos: IVec3) -> Option<i16> {
        self.get(pos.x, pos.y, pos.z)
    }

    /// Writes outside the table are ignored.
    pub fn set(&mut self, x: i32, y: i32, z: i32, value: i16) {
        if let Some(i) = self.offset(x, y, z) {
            self.data[i] = value;
        }
    }

    pub fn fill(&mut self, value: i16) {
        self.data.fill(value);
    }

    /// Change dimensions, keeping the overlapping part.
    pub fn resize(&mut self, xsize: usize, ysize: usize, zsize: usize) {
        let mut resized = Table::new(xsize, ysize, zsize);
        for z in 0..zsize.min(self.zsize) {
            for y in 0..ysize.min(self.ysize) {
                for x in 0..xsize.min(self.xsize) {
                    resized.data[x + xsize * (y + ysize * z)] =
                        self.data[x + self.xsize * (y + self.ysize * z)];
                }
            }
        }
        *self = resized;
    }
}
