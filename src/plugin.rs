use std::marker::PhantomData;

use bevy::prelude::*;

use crate::gpu::GpuBackend;
use crate::renderer::TilemapVx;
use crate::sources::SourceAssets;
use crate::table::Table;

/// Per-frame phases, chained in `PostUpdate`. Scene systems drawing characters belong
/// between `DrawGround` and `DrawAbove`.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum TilemapVxSet {
    TrackAssets,
    Prepare,
    DrawGround,
    DrawAbove,
}

/// Plugin for VX tilemaps rendered through the backend resource `B`.
///
/// Needs [`AssetPlugin`] to be added first. Spawn entities holding a [`TilemapVx`]
/// built with [`crate::builder::TilemapVxBuilder`]; tilesets are `Assets<Image>`, map
/// data, flags and flash data are `Assets<Table>`. Call [`TilemapVx::dispose`] before
/// despawning a tilemap to release its backend resources.
pub struct TilemapVxPlugin<B> {
    _backend: PhantomData<fn() -> B>,
}

impl<B> Default for TilemapVxPlugin<B> {
    fn default() -> Self {
        Self {
            _backend: PhantomData,
        }
    }
}

impl<B: GpuBackend + Resource + Default> Plugin for TilemapVxPlugin<B> {
    fn build(&self, app: &mut App) {
        app.add_asset::<Image>()
            .add_asset::<Table>()
            .init_resource::<B>();

        app.configure_sets(
            PostUpdate,
            (
                TilemapVxSet::TrackAssets,
                TilemapVxSet::Prepare,
                TilemapVxSet::DrawGround,
                TilemapVxSet::DrawAbove,
            )
                .chain(),
        );

        app.add_systems(Update, animate_tilemaps).add_systems(
            PostUpdate,
            (
                track_asset_events.in_set(TilemapVxSet::TrackAssets),
                prepare_tilemaps::<B>.in_set(TilemapVxSet::Prepare),
                draw_ground_layers::<B>.in_set(TilemapVxSet::DrawGround),
                draw_above_layers::<B>.in_set(TilemapVxSet::DrawAbove),
            ),
        );
    }
}

pub fn animate_tilemaps(mut tilemaps: Query<&mut TilemapVx>) {
    for mut tilemap in tilemaps.iter_mut() {
        if !tilemap.is_disposed() {
            tilemap.update();
        }
    }
}

/// Forward tileset and table changes to the tilemaps referencing them.
pub fn track_asset_events(
    mut image_events: EventReader<AssetEvent<Image>>,
    mut table_events: EventReader<AssetEvent<Table>>,
    mut tilemaps: Query<&mut TilemapVx>,
) {
    for ev in image_events.iter() {
        for mut tilemap in tilemaps.iter_mut() {
            if !tilemap.is_disposed() {
                tilemap.on_image_event(ev);
            }
        }
    }

    for ev in table_events.iter() {
        for mut tilemap in tilemaps.iter_mut() {
            if !tilemap.is_disposed() {
                tilemap.on_table_event(ev);
            }
        }
    }
}

/// Starts the backend frame and brings every tilemap up to date.
pub fn prepare_tilemaps<B: GpuBackend + Resource>(
    mut gpu: ResMut<B>,
    images: Res<Assets<Image>>,
    tables: Res<Assets<Table>>,
    mut tilemaps: Query<&mut TilemapVx>,
) {
    let gpu = &mut *gpu;
    gpu.begin_frame();

    let sources = SourceAssets::new(&images, &tables);
    for mut tilemap in tilemaps.iter_mut() {
        if !tilemap.is_disposed() {
            tilemap.prepare(gpu, sources);
        }
    }
}

pub fn draw_ground_layers<B: GpuBackend + Resource>(
    mut gpu: ResMut<B>,
    tilemaps: Query<&TilemapVx>,
) {
    let gpu = &mut *gpu;
    for tilemap in tilemaps.iter().filter(|t| !t.is_disposed()) {
        tilemap.draw_ground(gpu);
    }
}

pub fn draw_above_layers<B: GpuBackend + Resource>(
    mut gpu: ResMut<B>,
    tilemaps: Query<&TilemapVx>,
) {
    let gpu = &mut *gpu;
    for tilemap in tilemaps.iter().filter(|t| !t.is_disposed()) {
        tilemap.draw_above(gpu);
    }
}
