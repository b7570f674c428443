use bevy::prelude::*;

use crate::components::{Facing, GameTransform, MarkedForRemoval, Move, Player};
use crate::config::{MOVE_UPDATE_RATE, V_HEIGHT, V_WIDTH};
use crate::screen::GameSystems;

pub struct MovementPlugin;

impl Plugin for MovementPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<MoveClock>().add_systems(
            Update,
            move_system
                .in_set(GameSystems::Move)
                .run_if(not(resource_exists::<MovementPaused>)),
        );
    }
}

// Player steering, all in world units per second (squared).
pub const HORIZONTAL_ACCELERATION: f32 = 16.5;
pub const MAX_HORIZONTAL_SPEED: f32 = 5.5;
pub const VERTICAL_ACCELERATION: f32 = 2.25;
pub const MIN_VERTICAL_SPEED: f32 = -0.75;
pub const MAX_VERTICAL_SPEED: f32 = 5.0;

/// Leftover frame time that hasn't been simulated yet.
///
/// Frames don't line up with MOVE_UPDATE_RATE, so each frame runs as many
/// whole steps as fit and carries the remainder to the next frame. The
/// remainder is also how far we are between the last two steps, which is
/// what the renderer blends with.
#[derive(Resource, Default, Debug)]
pub struct MoveClock {
    pub accumulator: f32,
}

impl MoveClock {
    /// Add `delta` and return how many whole steps are due.
    pub fn advance(&mut self, delta: f32) -> u32 {
        self.accumulator += delta;
        let mut steps = 0;
        while self.accumulator >= MOVE_UPDATE_RATE {
            self.accumulator -= MOVE_UPDATE_RATE;
            steps += 1;
        }
        steps
    }

    pub fn alpha(&self) -> f32 {
        self.accumulator / MOVE_UPDATE_RATE
    }
}

/// While present, nothing moves. Inserted by the debug keys.
#[derive(Resource, Default, Debug)]
pub struct MovementPaused;

pub fn move_system(
    time: Res<Time>,
    mut clock: ResMut<MoveClock>,
    mut movers: Query<
        (&mut GameTransform, &mut Move, Option<(&mut Player, &Facing)>),
        Without<MarkedForRemoval>,
    >,
) {
    let steps = clock.advance(time.delta_secs());
    let alpha = clock.alpha();

    for (mut transform, mut movement, mut player) in movers.iter_mut() {
        for _ in 0..steps {
            if let Some((player, facing)) = player.as_mut() {
                steer(&mut movement.speed, **facing, MOVE_UPDATE_RATE);
                player.distance += (movement.speed.y * MOVE_UPDATE_RATE).abs();
            }

            transform.previous_position = transform.position;
            transform.position += (movement.speed * MOVE_UPDATE_RATE).extend(0.0);

            if player.is_some() {
                keep_in_playfield(&mut transform);
            }
        }
        transform.interpolate(alpha);
    }
}

/// Horizontal speed follows the facing; vertical speed slowly bleeds off
/// (speed power-ups push it back up).
fn steer(speed: &mut Vec2, facing: Facing, step: f32) {
    speed.x = match facing {
        Facing::Left => {
            (speed.x.min(0.0) - HORIZONTAL_ACCELERATION * step).max(-MAX_HORIZONTAL_SPEED)
        }
        Facing::Right => {
            (speed.x.max(0.0) + HORIZONTAL_ACCELERATION * step).min(MAX_HORIZONTAL_SPEED)
        }
        Facing::Forward => 0.0,
    };
    speed.y = (speed.y - VERTICAL_ACCELERATION * step)
        .clamp(MIN_VERTICAL_SPEED, MAX_VERTICAL_SPEED);
}

fn keep_in_playfield(transform: &mut GameTransform) {
    let max_x = V_WIDTH as f32 - transform.size.x;
    let max_y = V_HEIGHT as f32 + 1.0 - transform.size.y;
    transform.position.x = transform.position.x.clamp(0.0, max_x);
    transform.position.y = transform.position.y.clamp(1.0, max_y);
}
