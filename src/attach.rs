use bevy::prelude::*;

use crate::components::{Attach, GameTransform, Graphic, MarkedForRemoval};
use crate::screen::GameSystems;

pub struct AttachPlugin;

impl Plugin for AttachPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, attach_system.in_set(GameSystems::Attach));
    }
}

/// Snaps followers onto their target's drawn position and copies its alpha.
///
/// Only the follower's *interpolated* position is written; its own
/// simulated position and z are left alone. A follower whose target is gone
/// is marked for removal right away.
pub fn attach_system(
    mut commands: Commands,
    mut params: ParamSet<(
        Query<(Entity, &Attach, Has<MarkedForRemoval>)>,
        Query<(&GameTransform, &Graphic)>,
        Query<(&mut GameTransform, &mut Graphic), With<Attach>>,
    )>,
) {
    // Phase 1: who follows whom. Copy it out so the other queries can run.
    let followers: Vec<(Entity, Attach, bool)> = params
        .p0()
        .iter()
        .map(|(entity, attach, marked)| (entity, *attach, marked))
        .collect();

    // Phase 2: read where each target is drawn.
    let mut updates: Vec<(Entity, Vec2, f32)> = Vec::with_capacity(followers.len());
    for (follower, attach, marked) in followers {
        match params.p1().get(attach.target) {
            Ok((target_transform, target_graphic)) => updates.push((
                follower,
                target_transform.interpolated_position.truncate() + attach.offset,
                target_graphic.alpha,
            )),
            Err(_) if !marked => {
                commands.entity(follower).insert(MarkedForRemoval::now());
            }
            Err(_) => {}
        }
    }

    // Phase 3: move the followers.
    for (follower, position, alpha) in updates {
        if let Ok((mut transform, mut graphic)) = params.p2().get_mut(follower) {
            let z = transform.position.z;
            transform.interpolated_position = position.extend(z);
            graphic.alpha = alpha;
        }
    }
}
