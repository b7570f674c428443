use std::sync::Arc;

use bevy::prelude::*;

use crate::atlas::{AtlasError, AtlasRegion, GraphicsAtlas, ERROR_REGION};
use crate::components::{Facing, Graphic, Player};
use crate::screen::{GameSystems, Screen};

pub struct SpriteAnimationPlugin;

impl Plugin for SpriteAnimationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<AnimationCache>()
            .add_systems(OnEnter(Screen::Game), preload_animations)
            .add_systems(
                Update,
                (animation_system, player_animation_system).in_set(GameSystems::Animation),
            );
    }
}

/// Base speed: 20 frames per second at a speed rate of 1.
pub const DEFAULT_FRAME_DURATION: f32 = 1.0 / 20.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PlayMode {
    #[default]
    Loop,
    /// Play once and hold the last frame.
    Normal,
}

/// Every animation the game knows about.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AnimationType {
    /// Not an animation. Entities carrying it are reported and left alone.
    #[default]
    None,
    DarkMatter,
    Fire,
    Speed1,
    Speed2,
    Life,
    Shield,
    Explosion,
}

impl AnimationType {
    pub const COUNT: usize = 8;

    pub const ALL: [AnimationType; AnimationType::COUNT] = [
        AnimationType::None,
        AnimationType::DarkMatter,
        AnimationType::Fire,
        AnimationType::Speed1,
        AnimationType::Speed2,
        AnimationType::Life,
        AnimationType::Shield,
        AnimationType::Explosion,
    ];

    /// Region name in the graphics atlas.
    pub fn atlas_key(self) -> &'static str {
        match self {
            AnimationType::None => "",
            AnimationType::DarkMatter => "dark_matter",
            AnimationType::Fire => "fire",
            AnimationType::Speed1 => "orb_blue",
            AnimationType::Speed2 => "orb_yellow",
            AnimationType::Life => "life",
            AnimationType::Shield => "shield",
            AnimationType::Explosion => "explosion",
        }
    }

    pub fn play_mode(self) -> PlayMode {
        match self {
            AnimationType::Explosion => PlayMode::Normal,
            _ => PlayMode::Loop,
        }
    }

    /// Multiplier on the base frame rate.
    pub fn speed_rate(self) -> f32 {
        match self {
            AnimationType::DarkMatter => 3.0,
            AnimationType::Speed1 | AnimationType::Speed2 => 0.5,
            AnimationType::Shield => 0.75,
            AnimationType::Explosion => 0.5,
            _ => 1.0,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// A resolved frame sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Animation2D {
    /// The kind this was built for, even when the frames are the fallback.
    pub kind: AnimationType,
    frames: Vec<AtlasRegion>,
    pub frame_duration: f32,
    pub play_mode: PlayMode,
    fallback: bool,
}

impl Animation2D {
    /// `None` when `frames` is empty.
    pub fn new(kind: AnimationType, frames: Vec<AtlasRegion>) -> Option<Self> {
        if frames.is_empty() {
            return None;
        }
        Some(Animation2D {
            kind,
            frames,
            frame_duration: DEFAULT_FRAME_DURATION / kind.speed_rate(),
            play_mode: kind.play_mode(),
            fallback: false,
        })
    }

    /// True when these are the `error` frames standing in for `kind`.
    pub fn is_fallback(&self) -> bool {
        self.fallback
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn key_frame_index(&self, state_time: f32) -> usize {
        let index = (state_time.max(0.0) / self.frame_duration) as usize;
        match self.play_mode {
            PlayMode::Loop => index % self.frames.len(),
            PlayMode::Normal => index.min(self.frames.len() - 1),
        }
    }

    pub fn key_frame(&self, state_time: f32) -> &AtlasRegion {
        &self.frames[self.key_frame_index(state_time)]
    }
}

/// One slot per AnimationType, filled the first time that kind is asked for.
#[derive(Resource, Default, Debug)]
pub struct AnimationCache {
    animations: [Option<Arc<Animation2D>>; AnimationType::COUNT],
}

impl AnimationCache {
    /// Cached animation for `kind`, building it from the atlas on first use.
    ///
    /// A kind without frames in the atlas gets the `error` frames instead.
    /// Without those there is nothing left to fall back on.
    pub fn get(
        &mut self,
        kind: AnimationType,
        atlas: &GraphicsAtlas,
    ) -> Result<Arc<Animation2D>, AtlasError> {
        if let Some(animation) = &self.animations[kind.index()] {
            return Ok(animation.clone());
        }

        let frames = atlas.find_regions(kind.atlas_key()).to_vec();
        let animation = match Animation2D::new(kind, frames) {
            Some(animation) => {
                debug!(
                    "Adding animation {:?} with {} frames",
                    kind,
                    animation.frame_count()
                );
                animation
            }
            None => {
                error!("No regions found for {:?} (`{}`)", kind, kind.atlas_key());
                let mut fallback = Animation2D::new(kind, atlas.find_regions(ERROR_REGION).to_vec())
                    .ok_or_else(|| AtlasError::MissingFallback {
                        key: kind.atlas_key().to_string(),
                    })?;
                fallback.fallback = true;
                fallback
            }
        };

        let animation = Arc::new(animation);
        self.animations[kind.index()] = Some(animation.clone());
        Ok(animation)
    }

    pub fn is_cached(&self, kind: AnimationType) -> bool {
        self.animations[kind.index()].is_some()
    }
}

/// Plays a looping or one-shot animation into the entity's Graphic.
#[derive(Component, Debug, Clone, Default)]
#[require(Graphic)]
pub struct SpriteAnimation {
    /// What should be playing. Change it and the next tick switches over.
    pub kind: AnimationType,
    /// Seconds into the bound animation.
    pub state_time: f32,
    bound: Option<Arc<Animation2D>>,
}

impl SpriteAnimation {
    pub fn new(kind: AnimationType) -> Self {
        SpriteAnimation {
            kind,
            ..default()
        }
    }

    pub fn bound_kind(&self) -> Option<AnimationType> {
        self.bound.as_ref().map(|animation| animation.kind)
    }
}

/// Resolve everything once when the game starts so a broken atlas fails
/// right away instead of the first time some power-up shows up.
fn preload_animations(atlas: Res<GraphicsAtlas>, mut cache: ResMut<AnimationCache>) -> Result {
    if atlas.find_region(ERROR_REGION).is_none() {
        return Err(AtlasError::MissingRegion {
            key: ERROR_REGION.to_string(),
        }
        .into());
    }
    for kind in AnimationType::ALL {
        if kind != AnimationType::None {
            cache.get(kind, &atlas)?;
        }
    }
    for facing in [Facing::Left, Facing::Forward, Facing::Right] {
        ship_region(&atlas, facing)?;
    }
    Ok(())
}

/// Bind `kind` for `entity`, reporting which entity ended up with the
/// `error` frames.
fn bind(
    entity: Entity,
    kind: AnimationType,
    cache: &mut AnimationCache,
    atlas: &GraphicsAtlas,
) -> Result<Arc<Animation2D>, AtlasError> {
    let animation = cache
        .get(kind, atlas)
        .inspect_err(|e| error!("Entity {:?} cannot play {:?}: {}", entity, kind, e))?;
    if animation.is_fallback() {
        error!("Entity {:?} plays the `error` frames for {:?}", entity, kind);
    }
    Ok(animation)
}

pub fn animation_system(
    time: Res<Time>,
    atlas: Res<GraphicsAtlas>,
    mut cache: ResMut<AnimationCache>,
    mut query: Query<(Entity, &mut SpriteAnimation, &mut Graphic)>,
) -> Result {
    let delta = time.delta_secs();

    for (entity, mut animation, mut graphic) in query.iter_mut() {
        if animation.kind == AnimationType::None {
            error!("Entity {:?} has an animation without a type", entity);
            continue;
        }

        match animation.bound_kind() {
            // New entity: bind and show the first frame, no time passes yet
            None => {
                animation.bound = Some(bind(entity, animation.kind, &mut cache, &atlas)?);
            }
            Some(kind) if kind == animation.kind => {
                animation.state_time += delta;
            }
            Some(_) => {
                animation.bound = Some(bind(entity, animation.kind, &mut cache, &atlas)?);
                animation.state_time = 0.0;
            }
        }

        if let Some(bound) = &animation.bound {
            let frame = bound.key_frame(animation.state_time);
            if graphic.region.as_ref() != Some(frame) {
                graphic.region = Some(frame.clone());
            }
        }
    }
    Ok(())
}

/// Region names for each way the ship can lean.
pub fn ship_region_key(facing: Facing) -> &'static str {
    match facing {
        Facing::Left => "ship_left",
        Facing::Forward => "ship_base",
        Facing::Right => "ship_right",
    }
}

/// Ship frame for `facing`, or the `error` region when the atlas lacks it.
pub fn ship_region(atlas: &GraphicsAtlas, facing: Facing) -> Result<&AtlasRegion, AtlasError> {
    let key = ship_region_key(facing);
    if let Some(region) = atlas.find_region(key) {
        return Ok(region);
    }
    error!("No regions found for ship facing {:?} (`{}`)", facing, key);
    atlas
        .find_region(ERROR_REGION)
        .ok_or_else(|| AtlasError::MissingFallback {
            key: key.to_string(),
        })
}

/// The ship isn't animated; it just swaps between three still frames.
pub fn player_animation_system(
    atlas: Res<GraphicsAtlas>,
    mut players: Query<(Entity, &Facing, &mut Graphic), (With<Player>, Changed<Facing>)>,
) -> Result {
    for (entity, facing, mut graphic) in players.iter_mut() {
        let region = ship_region(&atlas, *facing)
            .inspect_err(|e| error!("Player {:?} has no ship frame: {}", entity, e))?;
        graphic.region = Some(region.clone());
    }
    Ok(())
}
