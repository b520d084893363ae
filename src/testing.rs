use bevy::app::App;
use bevy::asset::{AddAsset, AssetPlugin, Assets, Handle};
use bevy::core::TaskPoolPlugin;
use bevy::render::texture::Image;

use crate::sources::SourceAssets;
use crate::table::Table;

/// App holding the image and table asset storages.
pub(crate) fn asset_app() -> App {
    let mut app = App::new();
    app.add_plugins((TaskPoolPlugin::default(), AssetPlugin::default()))
        .add_asset::<Image>()
        .add_asset::<Table>();
    app
}

pub(crate) fn sources(app: &App) -> SourceAssets<'_> {
    SourceAssets::new(
        app.world.resource::<Assets<Image>>(),
        app.world.resource::<Assets<Table>>(),
    )
}

pub(crate) fn add_table(app: &mut App, table: Table) -> Handle<Table> {
    app.world.resource_mut::<Assets<Table>>().add(table)
}

pub(crate) fn add_image(app: &mut App, image: Image) -> Handle<Image> {
    app.world.resource_mut::<Assets<Image>>().add(image)
}

pub(crate) fn filled_table(w: usize, h: usize, code: i16) -> Table {
    let mut table = Table::new_2d(w, h);
    table.fill(code);
    table
}
