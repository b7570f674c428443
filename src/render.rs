use bevy::prelude::*;

use crate::components::{GameTransform, Graphic};
use crate::config::{V_HEIGHT, V_WIDTH, WINDOW_ZOOM};
use crate::screen::GameSystems;

pub struct RenderPlugin;

impl Plugin for RenderPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_game_camera)
            .add_systems(Update, sync_sprites_system.in_set(GameSystems::Render));
    }
}

/// Depth between two neighbouring sprites in draw order.
pub const DRAW_LAYER_STEP: f32 = 0.001;

/// The camera looking at the playfield. Camera shake moves this one.
#[derive(Component, Debug, Default)]
pub struct GameCamera;

fn spawn_game_camera(mut commands: Commands) {
    // Default 2D projection is one world unit per screen pixel; zoom out so
    // the V_WIDTH x V_HEIGHT world fills the window.
    commands.spawn((
        Camera2d,
        GameCamera,
        Projection::Orthographic(OrthographicProjection {
            scale: 1.0 / (16.0 * WINDOW_ZOOM as f32),
            ..OrthographicProjection::default_2d()
        }),
        Transform::from_xyz(V_WIDTH as f32 / 2.0, V_HEIGHT as f32 / 2.0, 0.0),
    ));
}

/// Copies every GameTransform + Graphic into Bevy's Transform and Sprite.
///
/// Entities are re-sorted every frame (things move all the time) and their
/// position in the sorted list becomes their depth, so the list order is
/// the paint order. Only interpolated positions are drawn.
pub fn sync_sprites_system(
    mut sprites: Query<(&GameTransform, &Graphic, &mut Transform, &mut Sprite, &mut Visibility)>,
) {
    let mut ordered: Vec<_> = sprites.iter_mut().collect();
    ordered.sort_by(|a, b| a.0.draw_order(b.0));

    for (index, (game_transform, graphic, mut transform, mut sprite, mut visibility)) in
        ordered.into_iter().enumerate()
    {
        let Some(region) = &graphic.region else {
            visibility.set_if_neq(Visibility::Hidden);
            continue;
        };
        visibility.set_if_neq(Visibility::Inherited);

        // Bevy positions sprites by their center, the game by the bottom-left corner
        let corner = game_transform.interpolated_position.truncate();
        let center = corner + game_transform.size / 2.0;
        transform.translation = center.extend(index as f32 * DRAW_LAYER_STEP);
        transform.rotation = Quat::from_rotation_z(game_transform.rotation.to_radians());

        sprite.image = region.image.clone();
        sprite.rect = Some(region.rect);
        sprite.custom_size = Some(game_transform.size);
        sprite.color = Color::WHITE.with_alpha(graphic.alpha);
    }
}
