// screen.rs - Game flow: loading, then the endless descent
//
// Loading: wait for every requested asset to finish (or fail), then go on.
// Game:    spawn the ship and the dark matter zone, run the gameplay sets
//          every frame, and respawn the ship each time it dies.
//
// Gameplay systems all live in one of the GameSystems sets. The sets are
// chained, so a frame always runs input -> movement -> power-ups -> damage ->
// camera shake -> animation -> attach -> render -> removal -> debug. Commands
// queued by one set (including published events) are applied before the
// next set starts.

use std::time::Duration;

use bevy::prelude::*;

use crate::animation::{AnimationType, SpriteAnimation};
use crate::atlas::{AtlasLoading, PendingAssets};
use crate::components::{Attach, Facing, GameTransform, Graphic, Move, Player};
use crate::config::{MAX_DELTA_TIME, UNIT_SCALE, V_WIDTH};
use crate::damage::DAMAGE_AREA_HEIGHT;
use crate::event::{GameEvent, GameEventKind, GameEventListener, GameEventManager};
use crate::save_load::{save_to_disk, SaveData, SaveFile};

#[derive(States, Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    #[default]
    Loading,
    Game,
}

#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameSystems {
    Input,
    Move,
    PowerUp,
    Damage,
    CameraShake,
    Animation,
    Attach,
    Render,
    Remove,
    Debug,
}

pub struct ScreenPlugin;

impl Plugin for ScreenPlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<Screen>()
            .init_resource::<ScreenListeners>()
            .configure_sets(
                Update,
                (
                    GameSystems::Input,
                    GameSystems::Move,
                    GameSystems::PowerUp,
                    GameSystems::Damage,
                    GameSystems::CameraShake,
                    GameSystems::Animation,
                    GameSystems::Attach,
                    GameSystems::Render,
                    GameSystems::Remove,
                    GameSystems::Debug,
                )
                    .chain()
                    .run_if(in_state(Screen::Game)),
            )
            .add_systems(Startup, clamp_frame_time)
            .add_systems(
                Update,
                wait_for_assets
                    .after(AtlasLoading)
                    .run_if(in_state(Screen::Loading)),
            )
            .add_systems(
                OnEnter(Screen::Game),
                (subscribe_screen_listeners, spawn_game_world),
            )
            .add_systems(OnExit(Screen::Game), unsubscribe_screen_listeners);
    }
}

/// Slow frames (window drags, breakpoints) get simulated as a 1/20 s frame.
fn clamp_frame_time(mut time: ResMut<Time<Virtual>>) {
    time.set_max_delta(Duration::from_secs_f32(MAX_DELTA_TIME));
}

fn wait_for_assets(
    asset_server: Res<AssetServer>,
    pending: Res<PendingAssets>,
    real_time: Res<Time<Real>>,
    mut next_screen: ResMut<NextState<Screen>>,
) {
    if pending.all_resolved(&asset_server) {
        info!(
            "Loaded {} assets in {:.2?}",
            pending.0.len(),
            real_time.elapsed()
        );
        next_screen.set(Screen::Game);
    }
}

/// The ship and its engine flame. Returns the ship.
pub fn spawn_player(commands: &mut Commands) -> Entity {
    let ship = commands
        .spawn((
            GameTransform::at(4.5, 8.0, -1.0),
            Move::default(),
            Graphic::default(),
            Player::default(),
            Facing::default(),
        ))
        .id();

    commands.spawn((
        GameTransform::default(),
        Attach {
            target: ship,
            offset: Vec2::new(1.0 * UNIT_SCALE, -6.0 * UNIT_SCALE),
        },
        Graphic::default(),
        SpriteAnimation::new(AnimationType::Fire),
    ));

    info!("Spawned player {:?}", ship);
    ship
}

fn spawn_game_world(mut commands: Commands, save_data: Res<SaveData>) {
    info!("Game started, highscore {:.1}", save_data.highscore);
    spawn_player(&mut commands);

    // The dark matter itself, along the bottom edge.
    commands.spawn((
        GameTransform::default().with_size(V_WIDTH as f32, DAMAGE_AREA_HEIGHT),
        Graphic::default(),
        SpriteAnimation::new(AnimationType::DarkMatter),
    ));
}

/// Listener ids owned by the game screen.
#[derive(Resource, Default, Debug)]
pub struct ScreenListeners {
    death: Option<GameEventListener>,
}

fn subscribe_screen_listeners(world: &mut World) {
    let listener = match world.resource::<ScreenListeners>().death {
        Some(listener) => listener,
        None => {
            let listener = world.register_system(on_player_death);
            world.resource_mut::<ScreenListeners>().death = Some(listener);
            listener
        }
    };
    world
        .resource_mut::<GameEventManager>()
        .subscribe(GameEventKind::PlayerDeath, listener);
}

fn unsubscribe_screen_listeners(world: &mut World) {
    if let Some(listener) = world.resource::<ScreenListeners>().death {
        world.resource_mut::<GameEventManager>().unsubscribe(listener);
    }
}

/// Records the run's distance and sends the next ship in.
pub fn on_player_death(
    In(event): In<GameEvent>,
    mut commands: Commands,
    mut save_data: ResMut<SaveData>,
    save_file: Res<SaveFile>,
) {
    let GameEvent::PlayerDeath { distance } = event else {
        return;
    };

    debug!("Player died with a distance of {:.1}", distance);
    if save_data.record_distance(distance) {
        info!("New highscore: {:.1}", distance);
        save_to_disk(&save_file, &save_data);
    }
    spawn_player(&mut commands);
}
