// lib.rs - Dark Matter game crate
//
// Every gameplay concern is its own Plugin; DarkMatterPlugin wires them
// together. main.rs only adds Bevy's DefaultPlugins (window, renderer,
// input, logging) on top.

pub mod animation;
pub mod atlas;
pub mod attach;
pub mod camera_shake;
pub mod components;
pub mod config;
pub mod damage;
pub mod debug;
pub mod event;
pub mod input;
pub mod movement;
pub mod power_up;
pub mod removal;
pub mod render;
pub mod save_load;
pub mod screen;

use bevy::prelude::*;

pub use components::*;
pub use event::{GameEvent, GameEventKind, GameEventManager, PublishGameEvent};
pub use screen::{GameSystems, Screen};

pub struct DarkMatterPlugin;

impl Plugin for DarkMatterPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((
            screen::ScreenPlugin,
            event::EventPlugin,
            atlas::AtlasPlugin,
            save_load::SaveLoadPlugin,
            input::InputPlugin,
            movement::MovementPlugin,
            power_up::PowerUpPlugin,
            damage::DamagePlugin,
            camera_shake::CameraShakePlugin,
            animation::SpriteAnimationPlugin,
            attach::AttachPlugin,
            render::RenderPlugin,
            removal::RemovalPlugin,
        ));

        #[cfg(debug_assertions)]
        app.add_plugins(debug::DebugPlugin);
    }
}
