use bevy::prelude::*;

use crate::components::{Facing, MarkedForRemoval, Player};
use crate::screen::GameSystems;

pub struct InputPlugin;

impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, player_input_system.in_set(GameSystems::Input));
    }
}

/// Which way the keyboard is asking the ship to turn.
pub fn facing_from_keys(keys: &ButtonInput<KeyCode>) -> Facing {
    let left = keys.any_pressed([KeyCode::ArrowLeft, KeyCode::KeyA]);
    let right = keys.any_pressed([KeyCode::ArrowRight, KeyCode::KeyD]);
    match (left, right) {
        (true, false) => Facing::Left,
        (false, true) => Facing::Right,
        _ => Facing::Forward,
    }
}

pub fn player_input_system(
    keys: Res<ButtonInput<KeyCode>>,
    mut players: Query<&mut Facing, (With<Player>, Without<MarkedForRemoval>)>,
) {
    let wanted = facing_from_keys(&keys);
    for mut facing in players.iter_mut() {
        // set_if_neq keeps Changed<Facing> quiet while the keys stay the same
        facing.set_if_neq(wanted);
    }
}
