use std::collections::HashSet;

use bevy::prelude::*;

use crate::components::{Attach, MarkedForRemoval};
use crate::screen::GameSystems;

pub struct RemovalPlugin;

impl Plugin for RemovalPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, remove_system.in_set(GameSystems::Remove));
    }
}

/// Counts every removal delay down and despawns what ran out.
///
/// Anything attached to a despawned entity goes with it in the same tick,
/// and so does anything attached to *that*.
pub fn remove_system(
    mut commands: Commands,
    time: Res<Time>,
    mut marked: Query<(Entity, &mut MarkedForRemoval)>,
    followers: Query<(Entity, &Attach)>,
) {
    let delta = time.delta_secs();
    let mut doomed: Vec<Entity> = Vec::new();
    for (entity, mut marker) in marked.iter_mut() {
        marker.delay -= delta;
        if marker.delay <= 0.0 {
            doomed.push(entity);
        }
    }

    let mut despawned: HashSet<Entity> = HashSet::new();
    while let Some(entity) = doomed.pop() {
        if !despawned.insert(entity) {
            continue;
        }
        commands.entity(entity).despawn();
        doomed.extend(
            followers
                .iter()
                .filter(|(_, attach)| attach.target == entity)
                .map(|(follower, _)| follower),
        );
    }

    if !despawned.is_empty() {
        debug!("Despawned {} entities", despawned.len());
    }
}
