// components.rs - All component definitions for our game
// Components are the data containers in our ECS architecture.
// Each entity is made up of multiple components, and systems pick the
// entities they care about by filtering on which components are present.

use std::cmp::Ordering;

use bevy::prelude::*;

use crate::animation::AnimationType;
use crate::atlas::AtlasRegion;

// =============================================================================
// TRANSFORM
// =============================================================================

/// Where an entity is in the game world, measured in world units.
///
/// This is NOT Bevy's `Transform`. The simulation keeps three positions:
/// - `position`: where the entity really is (authoritative)
/// - `previous_position`: where it was before the last movement step
/// - `interpolated_position`: what gets drawn, blended between the two
///
/// The render module copies `interpolated_position` into Bevy's `Transform`
/// every frame, so the simulation never has to care about pixels.
///
/// `position.z` is a layer, not a height: see [`GameTransform::draw_order`].
#[derive(Component, Debug, Clone, PartialEq)]
pub struct GameTransform {
    pub position: Vec3,
    pub previous_position: Vec3,
    pub interpolated_position: Vec3,
    pub size: Vec2,
    /// Degrees, counter-clockwise.
    pub rotation: f32,
}

impl Default for GameTransform {
    fn default() -> Self {
        GameTransform {
            position: Vec3::ZERO,
            previous_position: Vec3::ZERO,
            interpolated_position: Vec3::ZERO,
            size: Vec2::ONE,
            rotation: 0.0,
        }
    }
}

impl GameTransform {
    /// A transform that starts (and is drawn) at the given point.
    pub fn at(x: f32, y: f32, z: f32) -> Self {
        let mut transform = GameTransform::default();
        transform.set_initial_position(x, y, z);
        transform
    }

    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.size = Vec2::new(width, height);
        self
    }

    /// Back to a freshly constructed state, including the 1x1 size.
    pub fn reset(&mut self) {
        *self = GameTransform::default();
    }

    /// Seeds all three positions so the first rendered frame doesn't blend
    /// from the origin.
    pub fn set_initial_position(&mut self, x: f32, y: f32, z: f32) {
        let start = Vec3::new(x, y, z);
        self.position = start;
        self.previous_position = start;
        self.interpolated_position = start;
    }

    /// Blend previous -> current. `alpha` 0.0 = previous, 1.0 = current.
    pub fn interpolate(&mut self, alpha: f32) {
        self.interpolated_position = self.previous_position.lerp(self.position, alpha);
    }

    /// Axis-aligned bounding box of the simulated position.
    pub fn bounds(&self) -> Rect {
        let min = self.position.truncate();
        Rect::from_corners(min, min + self.size)
    }

    /// Draw/processing order: higher z first, then higher y first.
    ///
    /// Sorting with this puts far-away layers at the front of the list so
    /// they get painted first (back-to-front).
    pub fn draw_order(&self, other: &GameTransform) -> Ordering {
        other
            .position
            .z
            .total_cmp(&self.position.z)
            .then_with(|| other.position.y.total_cmp(&self.position.y))
    }
}

// =============================================================================
// MOVEMENT
// =============================================================================

/// Velocity in world units per second.
#[derive(Component, Debug, Clone, Default, PartialEq)]
pub struct Move {
    pub speed: Vec2,
}

impl Move {
    pub fn falling(speed: f32) -> Self {
        Move {
            speed: Vec2::new(0.0, speed),
        }
    }
}

/// Which way the ship is steering. Set by input, read by movement and by the
/// player sprite selection.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Facing {
    Left,
    #[default]
    Forward,
    Right,
}

// =============================================================================
// GRAPHICS
// =============================================================================

/// What to draw for this entity.
///
/// The animation and attach systems write here; the render module turns it
/// into a Bevy `Sprite`. Requiring `Sprite` means every entity with a
/// Graphic automatically becomes renderable.
#[derive(Component, Debug, Clone, PartialEq)]
#[require(Sprite)]
pub struct Graphic {
    /// Region currently bound. `None` until an animation or the player
    /// sprite system picks one; such entities are not drawn.
    pub region: Option<AtlasRegion>,
    /// 0.0 (invisible) to 1.0 (opaque).
    pub alpha: f32,
}

impl Default for Graphic {
    fn default() -> Self {
        Graphic {
            region: None,
            alpha: 1.0,
        }
    }
}

// =============================================================================
// PLAYER
// =============================================================================

/// How a single dose of damage played out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Shield soaked everything (or there was nothing to soak).
    Blocked,
    /// Life went down but is still above zero.
    Hit,
    /// Life reached zero or below.
    Killed,
}

/// Player stats. Life and shield share the same 0..=100 scale by default.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct Player {
    pub life: f32,
    pub max_life: f32,
    pub shield: f32,
    pub max_shield: f32,
    /// Total vertical distance travelled. This is the score.
    pub distance: f32,
}

impl Default for Player {
    fn default() -> Self {
        Player {
            life: 100.0,
            max_life: 100.0,
            shield: 0.0,
            max_shield: 100.0,
            distance: 0.0,
        }
    }
}

impl Player {
    /// Apply damage, shield first.
    ///
    /// Life is NOT clamped at zero: the PlayerHit/PlayerDeath payloads carry
    /// the raw (possibly negative) value for the tick the player died.
    pub fn take_damage(&mut self, damage: f32) -> DamageOutcome {
        let mut damage = damage;
        if self.shield > 0.0 {
            let blocked = self.shield;
            self.shield = (self.shield - damage).max(0.0);
            damage -= blocked;
        }
        if damage <= 0.0 {
            return DamageOutcome::Blocked;
        }

        self.life -= damage;
        if self.life <= 0.0 {
            DamageOutcome::Killed
        } else {
            DamageOutcome::Hit
        }
    }

    /// Add a power-up's life and shield gains, each clamped to its own cap.
    pub fn collect(&mut self, power_up: PowerUpType) {
        self.life = (self.life + power_up.life_gain()).min(self.max_life);
        self.shield = (self.shield + power_up.shield_gain()).min(self.max_shield);
    }
}

// =============================================================================
// POWER-UPS
// =============================================================================

/// Every kind of power-up, plus `None` for "empty slot" in spawn patterns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PowerUpType {
    #[default]
    None,
    Speed1,
    Speed2,
    Life,
    Shield,
}

impl PowerUpType {
    /// Added to the collecting player's vertical speed.
    pub fn speed_gain(self) -> f32 {
        match self {
            PowerUpType::Speed1 => 3.0,
            PowerUpType::Speed2 => 3.75,
            _ => 0.0,
        }
    }

    pub fn life_gain(self) -> f32 {
        match self {
            PowerUpType::Life => 25.0,
            _ => 0.0,
        }
    }

    pub fn shield_gain(self) -> f32 {
        match self {
            PowerUpType::Shield => 25.0,
            _ => 0.0,
        }
    }

    pub fn animation_type(self) -> AnimationType {
        match self {
            PowerUpType::None => AnimationType::None,
            PowerUpType::Speed1 => AnimationType::Speed1,
            PowerUpType::Speed2 => AnimationType::Speed2,
            PowerUpType::Life => AnimationType::Life,
            PowerUpType::Shield => AnimationType::Shield,
        }
    }
}

/// Marks a falling pickup.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerUp {
    pub kind: PowerUpType,
}

// =============================================================================
// ATTACHMENT & REMOVAL
// =============================================================================

/// Makes a decorative entity follow another one (the ship's engine flame).
///
/// `target` is a plain Entity id, not ownership. It may point at an entity
/// that no longer exists; the attach system checks it every time it is used.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Attach {
    pub target: Entity,
    /// Added to the target's drawn position, in world units.
    pub offset: Vec2,
}

/// Deferred destruction.
///
/// The removal system counts `delay` down once per tick and despawns the
/// entity only when it reaches zero, so a dying entity stays visible (and
/// animated) for `delay` seconds. Most systems skip entities carrying it via
/// `Without<MarkedForRemoval>`.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct MarkedForRemoval {
    pub delay: f32,
}

impl MarkedForRemoval {
    /// Despawn at the end of the current tick.
    pub fn now() -> Self {
        MarkedForRemoval { delay: 0.0 }
    }

    pub fn after(delay: f32) -> Self {
        MarkedForRemoval { delay }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_then_initial_position_seeds_every_position() {
        let mut transform = GameTransform::at(3.0, 4.0, 5.0).with_size(2.0, 7.0);
        transform.position.x = 10.0;
        transform.rotation = 45.0;

        transform.reset();
        assert_eq!(transform, GameTransform::default());
        assert_eq!(transform.size, Vec2::ONE);

        transform.set_initial_position(1.5, 2.5, -1.0);
        let expected = Vec3::new(1.5, 2.5, -1.0);
        assert_eq!(transform.position, expected);
        assert_eq!(transform.previous_position, expected);
        assert_eq!(transform.interpolated_position, expected);
    }

    #[test]
    fn draw_order_is_descending_z_then_descending_y() {
        let back_low = GameTransform::at(0.0, 1.0, 0.0);
        let back_high = GameTransform::at(0.0, 5.0, 0.0);
        let front = GameTransform::at(0.0, 9.0, -1.0);

        let mut sorted = vec![front.clone(), back_low.clone(), back_high.clone()];
        sorted.sort_by(|a, b| a.draw_order(b));

        assert_eq!(sorted, vec![back_high, back_low, front]);
    }

    #[test]
    fn interpolate_blends_previous_and_current() {
        let mut transform = GameTransform::at(0.0, 0.0, 0.0);
        transform.position = Vec3::new(2.0, 4.0, 0.0);

        transform.interpolate(0.5);
        assert_eq!(transform.interpolated_position, Vec3::new(1.0, 2.0, 0.0));
        transform.interpolate(1.0);
        assert_eq!(transform.interpolated_position, transform.position);
    }

    #[test]
    fn shield_absorbs_before_life() {
        let mut player = Player {
            shield: 10.0,
            life: 50.0,
            max_shield: 50.0,
            max_life: 50.0,
            ..default()
        };

        assert_eq!(player.take_damage(25.0), DamageOutcome::Hit);
        assert_eq!(player.shield, 0.0);
        assert_eq!(player.life, 35.0);
    }

    #[test]
    fn damage_fully_blocked_by_shield_leaves_life_alone() {
        let mut player = Player {
            shield: 30.0,
            ..default()
        };

        assert_eq!(player.take_damage(25.0), DamageOutcome::Blocked);
        assert_eq!(player.shield, 5.0);
        assert_eq!(player.life, 100.0);
    }

    #[test]
    fn lethal_damage_leaves_life_negative() {
        let mut player = Player {
            life: 10.0,
            ..default()
        };

        assert_eq!(player.take_damage(25.0), DamageOutcome::Killed);
        assert_eq!(player.life, -15.0);
    }

    #[test]
    fn zero_damage_is_blocked() {
        let mut player = Player::default();
        assert_eq!(player.take_damage(0.0), DamageOutcome::Blocked);
        assert_eq!(player.life, 100.0);
    }

    #[test]
    fn life_power_up_is_capped_by_max_life() {
        // max_shield is deliberately larger than max_life: the life cap must
        // come from max_life.
        let mut player = Player {
            life: 60.0,
            max_life: 70.0,
            max_shield: 200.0,
            ..default()
        };

        player.collect(PowerUpType::Life);
        assert_eq!(player.life, 70.0);
        assert_eq!(player.shield, 0.0);
    }

    #[test]
    fn shield_power_up_is_capped_by_max_shield() {
        let mut player = Player {
            shield: 90.0,
            ..default()
        };

        player.collect(PowerUpType::Shield);
        assert_eq!(player.shield, 100.0);
        assert_eq!(player.life, 100.0);
    }

    #[test]
    fn power_up_gains() {
        assert_eq!(PowerUpType::Speed1.speed_gain(), 3.0);
        assert_eq!(PowerUpType::Speed2.speed_gain(), 3.75);
        assert_eq!(PowerUpType::None.speed_gain(), 0.0);
        assert_eq!(PowerUpType::Life.life_gain(), 25.0);
        assert_eq!(PowerUpType::Shield.shield_gain(), 25.0);
        assert_eq!(PowerUpType::None.animation_type(), AnimationType::None);
    }
}
