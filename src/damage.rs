// damage.rs - The dark matter zone at the bottom of the screen
//
// A player whose position is inside the zone loses life every tick; the
// shield soaks damage first. Every time life actually goes down a PlayerHit
// event goes out (that's what shakes the camera). When life runs out the
// player also gets a PlayerDeath event, a delayed removal and an explosion.

use bevy::prelude::*;

use crate::animation::{AnimationType, SpriteAnimation};
use crate::components::{DamageOutcome, GameTransform, Graphic, MarkedForRemoval, Player};
use crate::event::{GameEvent, PublishGameEvent};
use crate::screen::GameSystems;

pub struct DamagePlugin;

impl Plugin for DamagePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, damage_system.in_set(GameSystems::Damage));
    }
}

/// Height of the damage zone, measured from the bottom of the world.
pub const DAMAGE_AREA_HEIGHT: f32 = 2.0;
pub const DAMAGE_PER_SECOND: f32 = 25.0;
/// How long a dead player (and its explosion) stays on screen.
pub const DEATH_EXPLOSION_DURATION: f32 = 0.9;

pub fn damage_system(
    mut commands: Commands,
    time: Res<Time>,
    mut players: Query<(Entity, &mut Player, &GameTransform), Without<MarkedForRemoval>>,
) {
    let damage = DAMAGE_PER_SECOND * time.delta_secs();

    for (entity, mut player, transform) in players.iter_mut() {
        if transform.position.y > DAMAGE_AREA_HEIGHT {
            continue;
        }

        let outcome = player.take_damage(damage);
        if outcome == DamageOutcome::Blocked {
            continue;
        }

        commands.publish_game_event(GameEvent::PlayerHit {
            player: entity,
            life: player.life,
            max_life: player.max_life,
        });

        if outcome == DamageOutcome::Killed {
            info!(
                "Player {:?} died after travelling {:.1} units",
                entity, player.distance
            );
            commands.publish_game_event(GameEvent::PlayerDeath {
                distance: player.distance,
            });
            commands
                .entity(entity)
                .insert(MarkedForRemoval::after(DEATH_EXPLOSION_DURATION));
            spawn_explosion(&mut commands, transform);
        }
    }
}

fn spawn_explosion(commands: &mut Commands, at: &GameTransform) {
    let position = at.position;
    let mut transform = GameTransform::at(position.x, position.y, position.z);
    transform.size = at.size;

    commands.spawn((
        transform,
        Graphic::default(),
        SpriteAnimation::new(AnimationType::Explosion),
        MarkedForRemoval::after(DEATH_EXPLOSION_DURATION),
    ));
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::event::{GameEventKind, GameEventManager};
    use crate::test_support::{record_events, Published};

    fn setup() -> World {
        let mut world = World::new();
        world.insert_resource(Time::<()>::default());
        world.init_resource::<GameEventManager>();
        world.init_resource::<Published>();
        let recorder = world.register_system(record_events);
        {
            let mut manager = world.resource_mut::<GameEventManager>();
            manager.subscribe(GameEventKind::PlayerHit, recorder);
            manager.subscribe(GameEventKind::PlayerDeath, recorder);
        }
        world
    }

    fn tick(world: &mut World, seconds: f32) {
        world
            .resource_mut::<Time>()
            .advance_by(Duration::from_secs_f32(seconds));
        let mut schedule = Schedule::default();
        schedule.add_systems(damage_system);
        schedule.run(world);
    }

    fn spawn_player(world: &mut World, y: f32, player: Player) -> Entity {
        world.spawn((GameTransform::at(4.0, y, -1.0), player)).id()
    }

    #[test]
    fn shield_soaks_part_of_the_hit() {
        let mut world = setup();
        let entity = spawn_player(
            &mut world,
            1.5,
            Player {
                shield: 10.0,
                life: 50.0,
                max_shield: 50.0,
                max_life: 50.0,
                ..default()
            },
        );

        tick(&mut world, 1.0);

        let player = world.get::<Player>(entity).unwrap();
        assert_eq!(player.shield, 0.0);
        assert_eq!(player.life, 35.0);
        assert_eq!(
            world.resource::<Published>().0,
            vec![GameEvent::PlayerHit {
                player: entity,
                life: 35.0,
                max_life: 50.0,
            }]
        );
        assert!(world.get::<MarkedForRemoval>(entity).is_none());
    }

    #[test]
    fn fully_blocked_damage_publishes_nothing() {
        let mut world = setup();
        let entity = spawn_player(
            &mut world,
            2.0,
            Player {
                shield: 30.0,
                ..default()
            },
        );

        tick(&mut world, 1.0);

        assert_eq!(world.get::<Player>(entity).unwrap().shield, 5.0);
        assert!(world.resource::<Published>().0.is_empty());
    }

    #[test]
    fn lethal_hit_publishes_hit_then_death_and_marks_for_removal() {
        let mut world = setup();
        let entity = spawn_player(
            &mut world,
            1.0,
            Player {
                life: 10.0,
                distance: 42.0,
                ..default()
            },
        );

        tick(&mut world, 1.0);

        assert_eq!(
            world.resource::<Published>().0,
            vec![
                GameEvent::PlayerHit {
                    player: entity,
                    life: -15.0,
                    max_life: 100.0,
                },
                GameEvent::PlayerDeath { distance: 42.0 },
            ]
        );
        assert_eq!(
            world.get::<MarkedForRemoval>(entity),
            Some(&MarkedForRemoval::after(DEATH_EXPLOSION_DURATION))
        );

        let mut explosions = world.query::<&SpriteAnimation>();
        let kinds: Vec<AnimationType> = explosions.iter(&world).map(|a| a.kind).collect();
        assert_eq!(kinds, vec![AnimationType::Explosion]);
    }

    #[test]
    fn players_above_the_zone_and_dying_players_are_ignored() {
        let mut world = setup();
        let safe = spawn_player(&mut world, 2.5, Player::default());
        let dying = spawn_player(&mut world, 1.0, Player::default());
        world
            .entity_mut(dying)
            .insert(MarkedForRemoval::after(DEATH_EXPLOSION_DURATION));

        tick(&mut world, 1.0);

        assert_eq!(world.get::<Player>(safe).unwrap().life, 100.0);
        assert_eq!(world.get::<Player>(dying).unwrap().life, 100.0);
        assert!(world.resource::<Published>().0.is_empty());
    }
}
