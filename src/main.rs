use bevy::prelude::*;

use dark_matter::config::{ASSET_DIR, WINDOW_HEIGHT, WINDOW_TITLE, WINDOW_WIDTH};
use dark_matter::DarkMatterPlugin;

fn main() {
    App::new()
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: WINDOW_TITLE.to_string(),
                        resolution: (WINDOW_WIDTH, WINDOW_HEIGHT).into(),
                        resizable: false,
                        ..default()
                    }),
                    ..default()
                })
                .set(AssetPlugin {
                    file_path: ASSET_DIR.to_string(),
                    ..default()
                })
                // Pixel art: no smoothing between texels
                .set(ImagePlugin::default_nearest()),
        )
        .insert_resource(ClearColor(Color::BLACK))
        .add_plugins(DarkMatterPlugin)
        .run();
}
