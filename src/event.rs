// event.rs - Synchronous game event bus
//
// Gameplay systems announce things that happened (the player got hit, picked
// something up, died) and other parts of the game react: the camera shakes,
// the high score gets saved, the player respawns.
//
// This looks a lot like Bevy's observers (commands.trigger + On<T>), but the
// game needs a few things observers don't give us directly:
// - listeners subscribe and unsubscribe at runtime (when a screen starts/stops)
// - listeners run in the order they subscribed
// - a listener is subscribed to an event *kind*, matched exactly
//
// So a listener is a registered one-shot system taking `In<GameEvent>`, and
// the GameEventManager resource keeps an ordered list of them per kind.

use std::collections::HashMap;

use bevy::ecs::system::SystemId;
use bevy::prelude::*;

use crate::components::PowerUpType;

pub struct EventPlugin;

impl Plugin for EventPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<GameEventManager>();
    }
}

/// Something that happened during a game tick.
///
/// Every publish builds a fresh value; listeners get their own copy.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    PlayerDeath {
        distance: f32,
    },
    CollectPowerUp {
        player: Entity,
        kind: PowerUpType,
    },
    /// `life` is the value right after the hit and may be negative.
    PlayerHit {
        player: Entity,
        life: f32,
        max_life: f32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameEventKind {
    PlayerDeath,
    CollectPowerUp,
    PlayerHit,
}

impl GameEvent {
    pub fn kind(&self) -> GameEventKind {
        match self {
            GameEvent::PlayerDeath { .. } => GameEventKind::PlayerDeath,
            GameEvent::CollectPowerUp { .. } => GameEventKind::CollectPowerUp,
            GameEvent::PlayerHit { .. } => GameEventKind::PlayerHit,
        }
    }
}

/// A registered one-shot system that receives events.
pub type GameEventListener = SystemId<In<GameEvent>>;

/// Who listens to what, in subscription order.
#[derive(Resource, Default, Debug)]
pub struct GameEventManager {
    listeners: HashMap<GameEventKind, Vec<GameEventListener>>,
}

impl GameEventManager {
    /// Subscribing the same listener twice to one kind is a no-op.
    pub fn subscribe(&mut self, kind: GameEventKind, listener: GameEventListener) {
        let listeners = self.listeners.entry(kind).or_default();
        if !listeners.contains(&listener) {
            listeners.push(listener);
        }
    }

    /// Remove `listener` from every kind.
    pub fn unsubscribe(&mut self, listener: GameEventListener) {
        for listeners in self.listeners.values_mut() {
            listeners.retain(|l| *l != listener);
        }
    }

    pub fn unsubscribe_from(&mut self, kind: GameEventKind, listener: GameEventListener) {
        if let Some(listeners) = self.listeners.get_mut(&kind) {
            listeners.retain(|l| *l != listener);
        }
    }

    pub fn listeners(&self, kind: GameEventKind) -> &[GameEventListener] {
        self.listeners.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Run every listener of `event`'s kind right now, in subscription order.
///
/// The listener list is copied first. Listeners are free to subscribe,
/// unsubscribe or publish again; those changes apply to the next publish.
pub fn publish(world: &mut World, event: GameEvent) {
    let kind = event.kind();
    let listeners: Vec<GameEventListener> = match world.get_resource::<GameEventManager>() {
        Some(manager) => manager.listeners(kind).to_vec(),
        None => return,
    };

    for listener in listeners {
        if let Err(e) = world.run_system_with(listener, event.clone()) {
            warn!("Listener {:?} for {:?} did not run: {}", listener, kind, e);
        }
    }
}

/// Lets systems publish through `Commands`.
///
/// The publish happens when the command queue is applied (the sync point at
/// the end of the system's set), in the order the calls were made.
pub trait PublishGameEvent {
    fn publish_game_event(&mut self, event: GameEvent);
}

impl PublishGameEvent for Commands<'_, '_> {
    fn publish_game_event(&mut self, event: GameEvent) {
        self.queue(move |world: &mut World| publish(world, event));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{record_events, Published};

    fn world_with_manager() -> World {
        let mut world = World::new();
        world.init_resource::<GameEventManager>();
        world.init_resource::<Published>();
        world
    }

    fn death(distance: f32) -> GameEvent {
        GameEvent::PlayerDeath { distance }
    }

    #[derive(Resource, Default)]
    struct Order(Vec<&'static str>);

    fn first(In(_): In<GameEvent>, mut order: ResMut<Order>) {
        order.0.push("first");
    }

    fn second(In(_): In<GameEvent>, mut order: ResMut<Order>) {
        order.0.push("second");
    }

    #[test]
    fn publish_without_listeners_is_a_no_op() {
        let mut world = world_with_manager();
        publish(&mut world, death(3.0));
        assert!(world.resource::<Published>().0.is_empty());
    }

    #[test]
    fn listeners_only_receive_their_kind() {
        let mut world = world_with_manager();
        let recorder = world.register_system(record_events);
        world
            .resource_mut::<GameEventManager>()
            .subscribe(GameEventKind::PlayerDeath, recorder);

        let player = world.spawn_empty().id();
        publish(
            &mut world,
            GameEvent::PlayerHit {
                player,
                life: 10.0,
                max_life: 100.0,
            },
        );
        publish(&mut world, death(7.5));

        assert_eq!(world.resource::<Published>().0, vec![death(7.5)]);
    }

    #[test]
    fn listeners_run_in_subscription_order() {
        let mut world = world_with_manager();
        world.init_resource::<Order>();
        let second_id = world.register_system(second);
        let first_id = world.register_system(first);
        {
            let mut manager = world.resource_mut::<GameEventManager>();
            manager.subscribe(GameEventKind::PlayerDeath, second_id);
            manager.subscribe(GameEventKind::PlayerDeath, first_id);
            // Duplicate is ignored.
            manager.subscribe(GameEventKind::PlayerDeath, second_id);
        }

        publish(&mut world, death(1.0));
        assert_eq!(world.resource::<Order>().0, vec!["second", "first"]);
    }

    #[test]
    fn unsubscribe_removes_listener_from_every_kind() {
        let mut world = world_with_manager();
        let recorder = world.register_system(record_events);
        let mut manager = world.resource_mut::<GameEventManager>();
        manager.subscribe(GameEventKind::PlayerDeath, recorder);
        manager.subscribe(GameEventKind::PlayerHit, recorder);

        manager.unsubscribe_from(GameEventKind::PlayerHit, recorder);
        assert!(manager.listeners(GameEventKind::PlayerHit).is_empty());
        assert_eq!(manager.listeners(GameEventKind::PlayerDeath), &[recorder]);

        manager.subscribe(GameEventKind::PlayerHit, recorder);
        manager.unsubscribe(recorder);
        assert!(manager.listeners(GameEventKind::PlayerDeath).is_empty());
        assert!(manager.listeners(GameEventKind::PlayerHit).is_empty());
    }

    #[derive(Resource)]
    struct Ids {
        leaver: GameEventListener,
    }

    // Unsubscribes the second listener while the first publish is running.
    fn unsubscribe_leaver(
        In(_): In<GameEvent>,
        ids: Res<Ids>,
        mut manager: ResMut<GameEventManager>,
    ) {
        manager.unsubscribe(ids.leaver);
    }

    #[test]
    fn unsubscribing_during_publish_applies_to_the_next_publish() {
        let mut world = world_with_manager();
        let first_id = world.register_system(unsubscribe_leaver);
        let leaver = world.register_system(record_events);
        world.insert_resource(Ids { leaver });
        {
            let mut manager = world.resource_mut::<GameEventManager>();
            manager.subscribe(GameEventKind::PlayerDeath, first_id);
            manager.subscribe(GameEventKind::PlayerDeath, leaver);
        }

        publish(&mut world, death(1.0));
        publish(&mut world, death(2.0));

        // The snapshot still delivered the first event to the leaver.
        assert_eq!(world.resource::<Published>().0, vec![death(1.0)]);
    }

    #[test]
    fn commands_publish_in_call_order() {
        let mut world = world_with_manager();
        let recorder = world.register_system(record_events);
        {
            let mut manager = world.resource_mut::<GameEventManager>();
            manager.subscribe(GameEventKind::PlayerDeath, recorder);
        }

        let mut schedule = Schedule::default();
        schedule.add_systems(|mut commands: Commands| {
            commands.publish_game_event(death(1.0));
            commands.publish_game_event(death(2.0));
        });
        schedule.run(&mut world);

        assert_eq!(world.resource::<Published>().0, vec![death(1.0), death(2.0)]);
    }

    #[test]
    fn removed_listener_is_skipped_with_a_warning() {
        let mut world = world_with_manager();
        let recorder = world.register_system(record_events);
        world
            .resource_mut::<GameEventManager>()
            .subscribe(GameEventKind::PlayerDeath, recorder);
        world.unregister_system(recorder).unwrap();

        publish(&mut world, death(1.0));
        assert!(world.resource::<Published>().0.is_empty());
    }
}
