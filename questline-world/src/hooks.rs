//! Integration hooks for the host game's systems.
//!
//! Inbound: small constructors the host's movement, pickup, interaction and
//! dialogue systems call to build [`GameEvent`]s. Outbound: [`apply_commands`]
//! routes the spawner's [`WorldCommand`]s to the host's world-object layer
//! and inventory.

use questline_core::inventory::QuestInventory;
use questline_core::types::{Location, QuestId, TargetId};
use questline_core::world::{WorldCommand, WorldTarget};
use tracing::debug;

use crate::events::GameEvent;

/// Create a movement event from the host's movement system.
#[must_use]
pub fn on_player_moved(location: Location) -> GameEvent {
    GameEvent::PlayerMoved { location }
}

/// Create a pickup event from the host's item system.
#[must_use]
pub fn on_pickup(target: TargetId) -> GameEvent {
    GameEvent::TargetCollected { target }
}

/// Create an interaction event from the host's use/activate system.
#[must_use]
pub fn on_use(target: TargetId) -> GameEvent {
    GameEvent::TargetUsed { target }
}

/// Create a dialogue event from the host's conversation system.
#[must_use]
pub fn on_dialogue(character: impl Into<String>) -> GameEvent {
    GameEvent::DialogueOpened {
        character: character.into(),
    }
}

/// The host's world-object layer.
pub trait WorldHost {
    /// Place a prop in the world.
    fn spawn(&mut self, target: &WorldTarget);

    /// Remove a prop from the world.
    fn despawn(&mut self, target: TargetId, quest: QuestId);
}

/// Route queued commands: props go to `host`, granted items to `inventory`.
pub fn apply_commands(
    commands: Vec<WorldCommand>,
    host: &mut dyn WorldHost,
    inventory: &mut dyn QuestInventory,
) {
    for command in commands {
        match command {
            WorldCommand::Spawn(target) => host.spawn(&target),
            WorldCommand::Despawn { target, quest } => host.despawn(target, quest),
            WorldCommand::GrantItem {
                quest,
                item,
                quantity,
            } => {
                debug!(quest = %quest, item = %item, quantity, "Granting quest item");
                inventory.add(&item, quantity, Some(quest));
            }
        }
    }
}
