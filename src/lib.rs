//! VX style tilemap rendering for bevy.
//! Draws a cell-based tile map in two passes (ground level and above characters) plus a
//! pulsing flash overlay, and only re-derives what changed since the last frame.
//!
//! ## Features
//!
//! - Nine source tilesets composed into a single atlas texture.
//! - Animated water and waterfall autotiles, selected by a per-frame atlas offset.
//! - Only the visible cells (plus a one-cell margin) are turned into vertices.
//! - Sub-cell scrolling never touches vertex data.
//!
//! ## How it works
//!
//! Map data, flags and flash data are [`Table`] assets, tilesets are `Image` assets,
//! both owned by the caller. A [`TilemapVx`] component holds weak handles to them and
//! turns their `AssetEvent`s into [`DirtyFlags`]. Once per frame,
//! [`TilemapVx::prepare`] rebuilds the atlas, the visible region and the vertex
//! buffers as far as they are dirty, after which [`TilemapVx::draw_ground`] and
//! [`TilemapVx::draw_above`] issue their draws through a [`GpuBackend`].
//! [`TilemapVxPlugin`] runs those phases from a bevy `App`.
//!
//! ## Backends
//!
//! The crate does not talk to a graphics API itself. Drawing goes through a
//! [`GpuBackend`] resource the application supplies. [`HeadlessBackend`] keeps all
//! textures and buffers in memory and records draw calls without putting pixels on
//! screen; it serves servers, tooling and tests.

pub mod animation;
pub mod atlas;
pub mod autotile;
pub mod bitmap;
pub mod builder;
pub mod dirty;
pub mod error;
pub mod flash;
pub mod geometry;
pub mod gpu;
pub mod headless;
pub mod plugin;
pub mod region;
pub mod renderer;
pub mod sources;
pub mod table;
pub mod vertex;

#[cfg(test)]
mod testing;

pub mod prelude {
    pub use crate::bitmap::{new_bitmap, solid_bitmap, BitmapSlot};
    pub use crate::builder::TilemapVxBuilder;
    pub use crate::gpu::GpuBackend;
    pub use crate::headless::HeadlessBackend;
    pub use crate::plugin::{TilemapVxPlugin, TilemapVxSet};
    pub use crate::region::SceneGeometry;
    pub use crate::renderer::TilemapVx;
    pub use crate::sources::SourceAssets;
    pub use crate::table::Table;
}

pub use crate::bitmap::BitmapSlot;
pub use crate::builder::TilemapVxBuilder;
pub use crate::dirty::DirtyFlags;
pub use crate::error::AtlasError;
pub use crate::gpu::{DrawCall, GpuBackend, ShaderKind};
pub use crate::headless::HeadlessBackend;
pub use crate::plugin::{TilemapVxPlugin, TilemapVxSet};
pub use crate::region::{CellRect, SceneGeometry};
pub use crate::renderer::{RenderStats, TilemapVx, ABOVE_Z, GROUND_Z};
pub use crate::sources::SourceAssets;
pub use crate::table::Table;
