use bevy::asset::{Asset, AssetEvent, Assets, Handle};
use bevy::render::texture::Image;

use crate::table::Table;

/// The asset storages tilemaps read their tilesets and tables from.
///
/// A handle whose asset is missing (not loaded yet, or removed) reads as empty.
#[derive(Clone, Copy)]
pub struct SourceAssets<'a> {
    pub images: &'a Assets<Image>,
    pub tables: &'a Assets<Table>,
}

impl<'a> SourceAssets<'a> {
    pub fn new(images: &'a Assets<Image>, tables: &'a Assets<Table>) -> Self {
        Self { images, tables }
    }

    pub fn image(&self, handle: Option<&Handle<Image>>) -> Option<&'a Image> {
        handle.and_then(|h| self.images.get(h))
    }

    pub fn table(&self, handle: Option<&Handle<Table>>) -> Option<&'a Table> {
        handle.and_then(|h| self.tables.get(h))
    }
}

/// Handle an asset event is about. Creation, modification and removal all change
/// what a tilemap reads through that handle.
pub fn event_handle<T: Asset>(event: &AssetEvent<T>) -> &Handle<T> {
    match event {
        AssetEvent::Created { handle }
        | AssetEvent::Modified { handle }
        | AssetEvent::Removed { handle } => handle,
    }
}

/// Whether `event` concerns the asset behind `held`.
pub fn affects<T: Asset>(event: &AssetEvent<T>, held: Option<&Handle<T>>) -> bool {
    held.map_or(false, |h| h == event_handle(event))
}
