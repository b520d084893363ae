use bevy::math::Vec2;

use crate::region::CELL_SIZE;

/// Ticks each animation frame is held.
pub const FRAME_HOLD: u16 = 30;

/// Ticks until the tile animation repeats: 3 rows x 4 columns of held frames.
pub const ANIMATION_PERIOD: u16 = FRAME_HOLD * 3 * 4;

/// Water frames ping-pong horizontally.
const HORIZONTAL_FRAMES: [u8; 12] = [0, 1, 2, 1, 0, 1, 2, 1, 0, 1, 2, 1];
/// Waterfall frames cycle vertically.
const VERTICAL_FRAMES: [u8; 12] = [0, 1, 2, 0, 1, 2, 0, 1, 2, 0, 1, 2];

/// Flash overlay opacity per tick: fade in, then fade out.
pub const FLASH_ALPHA: [u8; 32] = [
    0x78, 0x78, 0x78, 0x78, 0x96, 0x96, 0x96, 0x96,
    0xB4, 0xB4, 0xB4, 0xB4, 0xD2, 0xD2, 0xD2, 0xD2,
    0xF0, 0xF0, 0xF0, 0xF0, 0xD2, 0xD2, 0xD2, 0xD2,
    0xB4, 0xB4, 0xB4, 0xB4, 0x96, 0x96, 0x96, 0x96,
];

/// Per-tilemap animation counters, advanced once per logical update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnimationClock {
    frame: u16,
    ani_offset: Vec2,
    flash_idx: u8,
}

impl AnimationClock {
    pub fn tick(&mut self) {
        self.frame += 1;
        if self.frame >= ANIMATION_PERIOD {
            self.frame = 0;
        }

        let step = (self.frame / FRAME_HOLD) as usize;
        let a = f32::from(HORIZONTAL_FRAMES[step]);
        let c = f32::from(VERTICAL_FRAMES[step]);
        let cell = CELL_SIZE as f32;
        // water autotiles are two cells wide per frame
        self.ani_offset = Vec2::new(a * 2. * cell, c * cell);

        self.flash_idx += 1;
        if self.flash_idx as usize >= FLASH_ALPHA.len() {
            self.flash_idx = 0;
        }
    }

    pub fn frame(&self) -> u16 {
        self.frame
    }

    /// Atlas offset selecting the current frame of animated autotiles.
    pub fn ani_offset(&self) -> Vec2 {
        self.ani_offset
    }

    pub fn flash_index(&self) -> usize {
        self.flash_idx as usize
    }

    /// Opacity of one flash pass. The overlay is drawn twice (over the ground and
    /// over the above layer), so each pass gets half of the table value.
    pub fn flash_alpha(&self) -> f32 {
        f32::from(FLASH_ALPHA[self.flash_idx as usize]) / 255. / 2.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn tile_animation_repeats_after_period() {
        let mut clock = AnimationClock::default();
        let initial = clock.ani_offset();

        let mut seen = Vec::new();
        for _ in 0..ANIMATION_PERIOD {
            clock.tick();
            seen.push(clock.ani_offset());
        }
        assert_eq!(clock.frame(), 0);
        assert_eq!(clock.ani_offset(), initial);
        assert!(seen[..ANIMATION_PERIOD as usize - 1]
            .iter()
            .any(|o| *o != initial));
    }

    #[test]
    fn frames_hold_for_thirty_ticks() {
        let mut clock = AnimationClock::default();
        for _ in 0..29 {
            clock.tick();
            assert_eq!(clock.ani_offset(), Vec2::ZERO);
        }
        clock.tick();
        assert_eq!(clock.ani_offset(), Vec2::new(64., 32.));

        for _ in 0..30 {
            clock.tick();
        }
        assert_eq!(clock.ani_offset(), Vec2::new(128., 64.));

        for _ in 0..30 {
            clock.tick();
        }
        // horizontal ping-pongs back, vertical wraps around
        assert_eq!(clock.ani_offset(), Vec2::new(64., 0.));
    }

    #[test]
    fn flash_cycles_every_32_ticks() {
        let mut clock = AnimationClock::default();
        let start = clock.flash_alpha();
        for i in 1..=32 {
            clock.tick();
            assert_eq!(clock.flash_index(), i % 32);
        }
        assert_eq!(clock.flash_alpha(), start);
        assert_eq!(start, f32::from(0x78u8) / 255. / 2.);
    }

    #[test]
    fn flash_fade_is_symmetric_around_peak() {
        let peak = FLASH_ALPHA.iter().copied().max().unwrap();
        assert_eq!(FLASH_ALPHA[16], peak);

        // group g (4 ticks each) mirrors group 8 - g
        for t in 0..32 {
            let group = t / 4;
            let mirrored = ((8 - group) % 8) * 4 + t % 4;
            assert_eq!(FLASH_ALPHA[t], FLASH_ALPHA[mirrored], "tick {}", t);
        }

        // strictly rising into the peak
        for g in 0..4 {
            assert!(FLASH_ALPHA[g * 4] < FLASH_ALPHA[(g + 1) * 4]);
        }
    }
}
