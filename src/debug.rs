// debug.rs - Developer keys and periodic player stats
//
// 1: put the player right at the edge of death (bottom, 1 life, no shield)
// 2: +25 shield
// 3: freeze all movement
// 4: unfreeze

use bevy::prelude::*;

use crate::components::{GameTransform, MarkedForRemoval, Move, Player};
use crate::movement::MovementPaused;
use crate::screen::GameSystems;

pub struct DebugPlugin;

impl Plugin for DebugPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(StatsTimer(Timer::from_seconds(
            STATS_INTERVAL,
            TimerMode::Repeating,
        )))
        .add_systems(
            Update,
            (debug_keys_system, log_player_stats_system).in_set(GameSystems::Debug),
        );
    }
}

const STATS_INTERVAL: f32 = 0.25;
const DEBUG_SHIELD_GAIN: f32 = 25.0;

#[derive(Resource)]
struct StatsTimer(Timer);

fn log_player_stats_system(
    time: Res<Time>,
    mut timer: ResMut<StatsTimer>,
    players: Query<(Entity, &Player, &GameTransform, &Move), Without<MarkedForRemoval>>,
) {
    if !timer.0.tick(time.delta()).just_finished() {
        return;
    }
    for (entity, player, transform, movement) in players.iter() {
        debug!(
            "Player {:?}: life {:.1}/{:.1} shield {:.1}/{:.1} distance {:.1} pos {:?} speed {:?}",
            entity,
            player.life,
            player.max_life,
            player.shield,
            player.max_shield,
            player.distance,
            transform.position,
            movement.speed,
        );
    }
}

pub fn debug_keys_system(
    mut commands: Commands,
    keys: Res<ButtonInput<KeyCode>>,
    mut players: Query<(&mut Player, &mut GameTransform), Without<MarkedForRemoval>>,
) {
    if keys.just_pressed(KeyCode::Digit1) {
        for (mut player, mut transform) in players.iter_mut() {
            transform.position.y = 1.0;
            player.life = 1.0;
            player.shield = 0.0;
        }
    }
    if keys.just_pressed(KeyCode::Digit2) {
        for (mut player, _) in players.iter_mut() {
            player.shield = (player.shield + DEBUG_SHIELD_GAIN).min(player.max_shield);
        }
    }
    if keys.just_pressed(KeyCode::Digit3) {
        info!("Movement paused");
        commands.insert_resource(MovementPaused);
    }
    if keys.just_pressed(KeyCode::Digit4) {
        info!("Movement resumed");
        commands.remove_resource::<MovementPaused>();
    }
}
