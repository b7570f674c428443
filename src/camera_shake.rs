// camera_shake.rs - Short camera jitter whenever the player takes damage
//
// PlayerHit fires every tick the player sits in the dark matter, so shakes
// are capped: at most MAX_ACTIVE_SHAKES wait in line and only the oldest one
// plays. A shake remembers where the camera was when it started and puts it
// back exactly when it ends.

use std::collections::VecDeque;

use bevy::ecs::system::SystemId;
use bevy::prelude::*;
use rand::Rng;

use crate::event::{GameEvent, GameEventKind, GameEventManager};
use crate::render::GameCamera;
use crate::screen::{GameSystems, Screen};

pub struct CameraShakePlugin;

impl Plugin for CameraShakePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CameraShakes>()
            .add_systems(OnEnter(Screen::Game), subscribe_camera_shake)
            .add_systems(OnExit(Screen::Game), unsubscribe_camera_shake)
            .add_systems(Update, camera_shake_system.in_set(GameSystems::CameraShake));
    }
}

pub const MAX_ACTIVE_SHAKES: usize = 4;
pub const SHAKE_DURATION: f32 = 0.25;
/// Largest offset (world units) at the very start of a shake.
pub const SHAKE_MAX_DISTORTION: f32 = 0.25;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct CameraShake {
    pub duration: f32,
    pub max_distortion: f32,
    elapsed: f32,
    /// Captured on the first update.
    origin: Option<Vec3>,
}

impl CameraShake {
    /// Move `camera` for one tick. Returns true once the shake is over and
    /// the camera is back where it started.
    pub fn update(&mut self, camera: &mut Vec3, delta: f32, rng: &mut impl Rng) -> bool {
        let origin = *self.origin.get_or_insert(*camera);

        if self.elapsed < self.duration {
            let power = self.max_distortion * ((self.duration - self.elapsed) / self.duration);
            camera.x = origin.x + rng.gen_range(-1.0..=1.0) * power;
            camera.y = origin.y + rng.gen_range(-1.0..=1.0) * power;
            self.elapsed += delta;
            return false;
        }

        *camera = origin;
        true
    }

    pub fn reset(&mut self) {
        *self = CameraShake::default();
    }
}

/// Queued shakes plus the finished ones kept around for reuse.
#[derive(Resource, Default, Debug)]
pub struct CameraShakes {
    active: VecDeque<CameraShake>,
    pool: Vec<CameraShake>,
    listener: Option<SystemId<In<GameEvent>>>,
}

impl CameraShakes {
    /// Queue a shake unless the line is already full.
    pub fn push(&mut self) {
        if self.active.len() >= MAX_ACTIVE_SHAKES {
            return;
        }
        let mut shake = self.pool.pop().unwrap_or_default();
        shake.duration = SHAKE_DURATION;
        shake.max_distortion = SHAKE_MAX_DISTORTION;
        self.active.push_back(shake);
    }

    pub fn active(&self) -> usize {
        self.active.len()
    }

    pub fn pooled(&self) -> usize {
        self.pool.len()
    }

    /// Advance the oldest shake. The rest wait their turn.
    pub fn update(&mut self, camera: &mut Vec3, delta: f32, rng: &mut impl Rng) {
        let Some(shake) = self.active.front_mut() else {
            return;
        };
        if shake.update(camera, delta, rng) {
            if let Some(mut done) = self.active.pop_front() {
                done.reset();
                self.pool.push(done);
            }
        }
    }
}

/// PlayerHit listener.
pub fn queue_camera_shake(In(_event): In<GameEvent>, mut shakes: ResMut<CameraShakes>) {
    shakes.push();
}

fn subscribe_camera_shake(world: &mut World) {
    let listener = match world.resource::<CameraShakes>().listener {
        Some(listener) => listener,
        None => {
            let listener = world.register_system(queue_camera_shake);
            world.resource_mut::<CameraShakes>().listener = Some(listener);
            listener
        }
    };
    world
        .resource_mut::<GameEventManager>()
        .subscribe(GameEventKind::PlayerHit, listener);
}

fn unsubscribe_camera_shake(world: &mut World) {
    if let Some(listener) = world.resource::<CameraShakes>().listener {
        world.resource_mut::<GameEventManager>().unsubscribe(listener);
    }
}

pub fn camera_shake_system(
    time: Res<Time>,
    mut shakes: ResMut<CameraShakes>,
    mut cameras: Query<&mut Transform, With<GameCamera>>,
) {
    if shakes.active() == 0 {
        return;
    }
    let Ok(mut camera) = cameras.single_mut() else {
        return;
    };
    shakes.update(&mut camera.translation, time.delta_secs(), &mut rand::thread_rng());
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::event::publish;

    #[test]
    fn shake_restores_the_camera_and_returns_to_the_pool() {
        let mut shakes = CameraShakes::default();
        let mut rng = StdRng::seed_from_u64(9);
        let start = Vec3::new(4.5, 8.0, 0.0);
        let mut camera = start;

        shakes.push();
        shakes.update(&mut camera, 0.05, &mut rng);
        assert!(camera.truncate().distance(start.truncate()) <= SHAKE_MAX_DISTORTION * 2f32.sqrt());

        for _ in 0..7 {
            shakes.update(&mut camera, 0.05, &mut rng);
        }

        assert_eq!(camera, start);
        assert_eq!(shakes.active(), 0);
        assert_eq!(shakes.pooled(), 1);
    }

    #[test]
    fn jitter_decays_over_the_shake() {
        let mut shake = CameraShake {
            duration: 1.0,
            max_distortion: 1.0,
            ..default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        let mut camera = Vec3::ZERO;
        shake.update(&mut camera, 0.9, &mut rng);

        shake.update(&mut camera, 0.05, &mut rng);
        assert!(camera.x.abs() <= 0.1 + 1e-5);
        assert!(camera.y.abs() <= 0.1 + 1e-5);
    }

    #[test]
    fn at_most_four_shakes_wait_in_line() {
        let mut shakes = CameraShakes::default();
        for _ in 0..10 {
            shakes.push();
        }
        assert_eq!(shakes.active(), MAX_ACTIVE_SHAKES);
    }

    #[test]
    fn only_the_oldest_shake_advances() {
        let mut shakes = CameraShakes::default();
        let mut rng = StdRng::seed_from_u64(2);
        let mut camera = Vec3::ZERO;
        shakes.push();
        shakes.push();

        for _ in 0..8 {
            shakes.update(&mut camera, 0.05, &mut rng);
        }
        assert_eq!(shakes.active(), 1);
        assert_eq!(shakes.pooled(), 1);

        // A new hit reuses the pooled instance.
        shakes.push();
        assert_eq!(shakes.pooled(), 0);
    }

    #[test]
    fn player_hit_queues_a_shake_while_subscribed() {
        let mut world = World::new();
        world.init_resource::<GameEventManager>();
        world.init_resource::<CameraShakes>();
        world.insert_resource(Time::<()>::default());
        let camera = world
            .spawn((GameCamera, Transform::from_xyz(4.5, 8.0, 0.0)))
            .id();
        let player = world.spawn_empty().id();
        let hit = GameEvent::PlayerHit {
            player,
            life: 90.0,
            max_life: 100.0,
        };

        subscribe_camera_shake(&mut world);
        publish(&mut world, hit.clone());
        assert_eq!(world.resource::<CameraShakes>().active(), 1);

        let mut schedule = Schedule::default();
        schedule.add_systems(camera_shake_system);
        for _ in 0..8 {
            world
                .resource_mut::<Time>()
                .advance_by(Duration::from_secs_f32(0.05));
            schedule.run(&mut world);
        }
        assert_eq!(
            world.get::<Transform>(camera).unwrap().translation,
            Vec3::new(4.5, 8.0, 0.0)
        );

        unsubscribe_camera_shake(&mut world);
        publish(&mut world, hit);
        assert_eq!(world.resource::<CameraShakes>().active(), 0);
    }
}
