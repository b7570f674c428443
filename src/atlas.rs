// atlas.rs - Symbolic sprite regions backed by Bevy's AssetServer
//
// Gameplay code never deals with file paths or pixel coordinates. It asks the
// GraphicsAtlas for a region by name ("ship_base", "fire", "orb_blue"...) and
// gets back the image handle plus the rectangle inside that image.
//
// The names and rectangles come from a RON manifest loaded through the
// AssetServer, like every other asset:
//
//   (
//       image: "graphics/game.png",
//       regions: {
//           "ship_base": [(x: 0, y: 0, width: 9, height: 10)],
//           "fire": [(x: 0, y: 16, width: 4, height: 4), ...],
//       },
//   )
//
// A key with several rectangles is an animation: one rectangle per frame.

use std::collections::HashMap;

use bevy::asset::{LoadState, UntypedHandle};
use bevy::prelude::*;
use bevy_common_assets::ron::RonAssetPlugin;
use serde::Deserialize;
use thiserror::Error;

pub struct AtlasPlugin;

impl Plugin for AtlasPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(RonAssetPlugin::<AtlasManifest>::new(&["atlas.ron"]))
            .init_resource::<GraphicsAtlas>()
            .init_resource::<PendingAssets>()
            .add_systems(Startup, request_atlas_manifest)
            .add_systems(
                Update,
                build_graphics_atlas
                    .in_set(AtlasLoading)
                    .run_if(resource_exists::<AtlasManifestHandle>),
            );
    }
}

/// Turns the loaded manifest into the GraphicsAtlas. Anything waiting on
/// `PendingAssets` should run after it.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AtlasLoading;

/// Manifest path, relative to the asset root.
pub const ATLAS_MANIFEST: &str = "graphics.atlas.ron";

/// Region every missing animation falls back to.
pub const ERROR_REGION: &str = "error";

/// One rectangle of a sprite sheet.
#[derive(Clone, Debug, PartialEq)]
pub struct AtlasRegion {
    pub image: Handle<Image>,
    /// Pixel rectangle inside `image`.
    pub rect: Rect,
}

/// Resource mapping region names to their frames.
#[derive(Resource, Default, Debug)]
pub struct GraphicsAtlas {
    regions: HashMap<String, Vec<AtlasRegion>>,
}

impl GraphicsAtlas {
    pub fn insert_regions(&mut self, key: impl Into<String>, regions: Vec<AtlasRegion>) {
        self.regions.insert(key.into(), regions);
    }

    /// All frames registered under `key`, in manifest order. Empty if unknown.
    pub fn find_regions(&self, key: &str) -> &[AtlasRegion] {
        self.regions.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First frame registered under `key`.
    pub fn find_region(&self, key: &str) -> Option<&AtlasRegion> {
        self.find_regions(key).first()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

#[derive(Error, Debug)]
pub enum AtlasError {
    #[error("could not load atlas manifest `{path}`: {reason}")]
    ManifestUnavailable { path: String, reason: String },

    #[error("atlas has no `{key}` region")]
    MissingRegion { key: String },

    /// Fatal: without an error region there is nothing sane left to draw.
    #[error("atlas has no regions for `{key}` and no `error` fallback region")]
    MissingFallback { key: String },
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct RegionRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl RegionRect {
    // f32 math: a bogus manifest entry must not overflow.
    fn to_rect(self) -> Rect {
        let (x, y) = (self.x as f32, self.y as f32);
        Rect::new(x, y, x + self.width as f32, y + self.height as f32)
    }
}

/// Deserialized form of the manifest file, loaded by `RonAssetPlugin`.
#[derive(Asset, TypePath, Deserialize, Debug)]
pub struct AtlasManifest {
    /// Image path, relative to the asset root.
    pub image: String,
    #[serde(default)]
    pub regions: HashMap<String, Vec<RegionRect>>,
}

impl AtlasManifest {
    /// Build an atlas whose regions all point at `image`.
    pub fn to_atlas(&self, image: &Handle<Image>) -> GraphicsAtlas {
        let mut atlas = GraphicsAtlas::default();
        for (key, rects) in &self.regions {
            let frames = rects
                .iter()
                .map(|rect| AtlasRegion {
                    image: image.clone(),
                    rect: rect.to_rect(),
                })
                .collect();
            atlas.insert_regions(key.clone(), frames);
        }
        atlas
    }
}

/// The manifest while it is loading. Removed once the atlas is built.
#[derive(Resource, Debug)]
pub struct AtlasManifestHandle(pub Handle<AtlasManifest>);

/// Handles the loading screen waits on before gameplay starts.
#[derive(Resource, Default)]
pub struct PendingAssets(pub Vec<UntypedHandle>);

impl PendingAssets {
    /// True once every handle finished loading, successfully or not.
    pub fn all_resolved(&self, asset_server: &AssetServer) -> bool {
        self.0.iter().all(|handle| {
            matches!(
                asset_server.load_state(handle.id()),
                LoadState::Loaded | LoadState::Failed(_)
            )
        })
    }
}

fn request_atlas_manifest(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    mut pending: ResMut<PendingAssets>,
) {
    let manifest: Handle<AtlasManifest> = asset_server.load(ATLAS_MANIFEST);
    pending.0.push(manifest.clone().untyped());
    commands.insert_resource(AtlasManifestHandle(manifest));
}

/// Once the manifest is in, request the sheet image and build the atlas.
///
/// The image handle joins `PendingAssets` in the same frame, so the loading
/// screen keeps waiting for it. A manifest that failed to load is fatal.
pub fn build_graphics_atlas(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    manifests: Res<Assets<AtlasManifest>>,
    manifest_handle: Res<AtlasManifestHandle>,
    mut pending: ResMut<PendingAssets>,
) -> Result {
    if let LoadState::Failed(e) = asset_server.load_state(manifest_handle.0.id()) {
        return Err(AtlasError::ManifestUnavailable {
            path: ATLAS_MANIFEST.to_string(),
            reason: e.to_string(),
        }
        .into());
    }
    let Some(manifest) = manifests.get(manifest_handle.0.id()) else {
        return Ok(());
    };

    let image: Handle<Image> = asset_server.load(manifest.image.clone());
    pending.0.push(image.clone().untyped());

    let atlas = manifest.to_atlas(&image);
    info!(
        "Loaded atlas manifest {} with {} region keys",
        ATLAS_MANIFEST,
        atlas.len()
    );
    commands.insert_resource(atlas);
    commands.remove_resource::<AtlasManifestHandle>();
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    const MANIFEST: &str = r#"(
        image: "graphics/game.png",
        regions: {
            "ship_base": [(x: 0, y: 0, width: 9, height: 10)],
            "fire": [
                (x: 0, y: 16, width: 4, height: 4),
                (x: 4, y: 16, width: 4, height: 4),
            ],
        },
    )"#;

    #[test]
    fn manifest_regions_keep_frame_order() {
        let manifest: AtlasManifest = ron::from_str(MANIFEST).unwrap();
        assert_eq!(manifest.image, "graphics/game.png");

        let atlas = manifest.to_atlas(&Handle::default());
        let fire = atlas.find_regions("fire");
        assert_eq!(fire.len(), 2);
        assert_eq!(fire[0].rect, Rect::new(0.0, 16.0, 4.0, 20.0));
        assert_eq!(fire[1].rect, Rect::new(4.0, 16.0, 8.0, 20.0));
        assert_eq!(
            atlas.find_region("ship_base").map(|r| r.rect),
            Some(Rect::new(0.0, 0.0, 9.0, 10.0))
        );
    }

    #[test]
    fn unknown_keys_have_no_regions() {
        let atlas = GraphicsAtlas::default();
        assert!(atlas.find_regions("nope").is_empty());
        assert!(atlas.find_region("nope").is_none());
    }

    #[test]
    fn huge_rect_does_not_overflow() {
        let rect = RegionRect {
            x: u32::MAX,
            y: u32::MAX - 1,
            width: 16,
            height: u32::MAX,
        }
        .to_rect();

        assert!(rect.max.x > rect.min.x);
        assert!(rect.max.y >= rect.min.y);
        assert!(rect.max.is_finite());
    }

    #[test]
    fn manifest_is_loaded_from_the_asset_root() {
        // The asset root comes from AssetPlugin (BEVY_ASSET_ROOT or the
        // manifest directory), never from the process working directory.
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, AssetPlugin::default()))
            .init_asset::<Image>()
            .add_plugins(AtlasPlugin);

        for _ in 0..500 {
            app.update();
            if !app.world().contains_resource::<AtlasManifestHandle>() {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }

        assert!(!app.world().contains_resource::<AtlasManifestHandle>());
        let atlas = app.world().resource::<GraphicsAtlas>();
        assert!(atlas.find_region(ERROR_REGION).is_some());
        assert!(atlas.find_region("ship_base").is_some());
        // Manifest first, then the sheet it points at.
        assert_eq!(app.world().resource::<PendingAssets>().0.len(), 2);
    }
}
