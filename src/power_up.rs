use std::collections::VecDeque;

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::animation::SpriteAnimation;
use crate::components::{
    GameTransform, Graphic, MarkedForRemoval, Move, Player, PowerUp, PowerUpType,
};
use crate::config::{V_HEIGHT, V_WIDTH};
use crate::event::{GameEvent, PublishGameEvent};
use crate::screen::GameSystems;

pub struct PowerUpPlugin;

impl Plugin for PowerUpPlugin {
    fn build(&self, app: &mut App) {
        // Pickups are resolved before anything new is spawned this tick.
        app.init_resource::<PowerUpSpawner>().add_systems(
            Update,
            (power_up_pickup_system, power_up_spawn_system)
                .chain()
                .in_set(GameSystems::PowerUp),
        );
    }
}

pub const MIN_SPAWN_INTERVAL: f32 = 0.9;
pub const MAX_SPAWN_INTERVAL: f32 = 1.5;
/// Falling speed of every power-up (world units per second).
pub const POWER_UP_SPEED: f32 = -8.75;
/// Power-ups at or below this height fell off the screen.
pub const POWER_UP_FLOOR: f32 = 1.0;

/// One spawn slot per interval. `None` slots spawn nothing.
pub type SpawnPattern = [PowerUpType; 5];

pub const SPAWN_PATTERNS: [SpawnPattern; 2] = [
    [
        PowerUpType::Speed1,
        PowerUpType::Speed2,
        PowerUpType::None,
        PowerUpType::None,
        PowerUpType::Life,
    ],
    [
        PowerUpType::None,
        PowerUpType::Life,
        PowerUpType::Shield,
        PowerUpType::Speed2,
        PowerUpType::None,
    ],
];

/// Decides when and what to spawn.
///
/// A countdown picks a random interval each time it runs out. Every time
/// it runs out the next slot of the current pattern is used; an empty queue
/// draws a whole new pattern first.
#[derive(Resource, Debug)]
pub struct PowerUpSpawner {
    rng: StdRng,
    /// Seconds until the next slot. Starts at zero, so the first slot is
    /// used on the first tick.
    pub spawn_time: f32,
    pattern: VecDeque<PowerUpType>,
}

impl Default for PowerUpSpawner {
    fn default() -> Self {
        PowerUpSpawner::with_rng(StdRng::from_entropy())
    }
}

impl PowerUpSpawner {
    pub fn seeded(seed: u64) -> Self {
        PowerUpSpawner::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        PowerUpSpawner {
            rng,
            spawn_time: 0.0,
            pattern: VecDeque::with_capacity(5),
        }
    }

    /// Slots left in the current pattern.
    pub fn queued(&self) -> &VecDeque<PowerUpType> {
        &self.pattern
    }

    /// Count down by `delta`. When the interval has elapsed, returns the
    /// slot that is due (possibly `PowerUpType::None`).
    pub fn tick(&mut self, delta: f32) -> Option<PowerUpType> {
        self.spawn_time -= delta;
        if self.spawn_time > 0.0 {
            return None;
        }

        self.spawn_time = self.rng.gen_range(MIN_SPAWN_INTERVAL..=MAX_SPAWN_INTERVAL);
        Some(self.next_slot())
    }

    pub fn next_slot(&mut self) -> PowerUpType {
        if self.pattern.is_empty() {
            let pattern = SPAWN_PATTERNS[self.rng.gen_range(0..SPAWN_PATTERNS.len())];
            debug!("Next power-up pattern: {:?}", pattern);
            self.pattern.extend(pattern);
        }
        self.pattern.pop_front().unwrap_or_default()
    }

    /// Left edge of a random column.
    pub fn random_column(&mut self) -> f32 {
        self.rng.gen_range(0..V_WIDTH) as f32
    }
}

pub fn power_up_spawn_system(
    mut commands: Commands,
    time: Res<Time>,
    mut spawner: ResMut<PowerUpSpawner>,
) {
    let kind = match spawner.tick(time.delta_secs()) {
        Some(PowerUpType::None) | None => return,
        Some(kind) => kind,
    };

    let x = spawner.random_column();
    commands.spawn(power_up_bundle(kind, x, V_HEIGHT as f32));
}

pub fn power_up_bundle(kind: PowerUpType, x: f32, y: f32) -> impl Bundle {
    (
        GameTransform::at(x, y, 0.0),
        PowerUp { kind },
        SpriteAnimation::new(kind.animation_type()),
        Graphic::default(),
        Move::falling(POWER_UP_SPEED),
    )
}

/// Removes power-ups that fell off the screen and hands out the ones that
/// touch a player. Every touching player gets the full effect.
pub fn power_up_pickup_system(
    mut commands: Commands,
    power_ups: Query<(Entity, &PowerUp, &GameTransform), Without<MarkedForRemoval>>,
    mut players: Query<(Entity, &mut Player, &mut Move, &GameTransform), Without<MarkedForRemoval>>,
) {
    for (power_up_entity, power_up, transform) in power_ups.iter() {
        if transform.position.y <= POWER_UP_FLOOR {
            commands.entity(power_up_entity).insert(MarkedForRemoval::now());
            continue;
        }

        let bounds = transform.bounds();
        let mut collected = false;
        for (player_entity, mut player, mut movement, player_transform) in players.iter_mut() {
            if player_transform.bounds().intersect(bounds).is_empty() {
                continue;
            }

            debug!("Player {:?} picked up {:?}", player_entity, power_up.kind);
            movement.speed.y += power_up.kind.speed_gain();
            player.collect(power_up.kind);
            commands.publish_game_event(GameEvent::CollectPowerUp {
                player: player_entity,
                kind: power_up.kind,
            });
            collected = true;
        }

        if collected {
            commands.entity(power_up_entity).insert(MarkedForRemoval::now());
        }
    }
}
