//! Quest spawner. Turns accepted tokens into live quests.
//!
//! Acceptance validates the token against the [`WorldMap`], records the quest
//! in the [`QuestJournal`] and places whatever props the goal needs. Props are
//! owned by the spawner's [`TargetArena`]; the host learns about them through
//! the queued [`WorldCommand`]s.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::config::QuestConfig;
use crate::directive::QuestToken;
use crate::error::{QuestError, Result};
use crate::goal::{QuestGoal, QuestType, TargetKind};
use crate::journal::{JournalQuest, QuestJournal};
use crate::types::{GameTimestamp, Location, QuestId, TargetId, ZoneBounds};
use crate::world::{TargetArena, TargetState, WorldCommand, WorldMap, WorldTarget};

/// Live view of an accepted quest.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveQuest {
    /// Quest identity.
    pub id: QuestId,
    /// Quest type.
    pub quest_type: QuestType,
    /// Giver name.
    pub giver: String,
    /// Display description.
    pub description: String,
    /// Progress so far.
    pub current_progress: u32,
    /// Progress needed.
    pub max_progress: u32,
    /// Props spawned for the quest that are still in the arena.
    pub targets: Vec<TargetId>,
    /// Whether the quest has been handed in.
    pub completed: bool,
}

/// A collectible picked up by the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collected {
    /// Quest the item is tagged for.
    pub quest: QuestId,
    /// Item to add to the inventory.
    pub item: String,
}

/// Creates quests and owns their world targets.
#[derive(Debug)]
pub struct QuestSpawner {
    world: WorldMap,
    arena: TargetArena,
    commands: Vec<WorldCommand>,
    rng: StdRng,
    max_fetch_quantity: u32,
}

impl QuestSpawner {
    /// Create a spawner over `world`. A `seed` makes target placement
    /// reproducible.
    #[must_use]
    pub fn new(world: WorldMap, max_fetch_quantity: u32, seed: Option<u64>) -> Self {
        let rng = seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        Self {
            world,
            arena: TargetArena::new(),
            commands: Vec::new(),
            rng,
            max_fetch_quantity,
        }
    }

    /// Create a spawner from configuration.
    #[must_use]
    pub fn from_config(config: &QuestConfig) -> Self {
        Self::new(
            WorldMap::from_config(&config.world),
            config.directives.max_fetch_quantity,
            config.world.spawn_seed,
        )
    }

    /// Zones and characters known to the spawner.
    #[must_use]
    pub fn world(&self) -> &WorldMap {
        &self.world
    }

    /// Mutable access to the world map, e.g. to register characters.
    pub fn world_mut(&mut self) -> &mut WorldMap {
        &mut self.world
    }

    /// Targets owned by the spawner.
    #[must_use]
    pub fn targets(&self) -> &TargetArena {
        &self.arena
    }

    /// Accept a parsed token on behalf of `giver`.
    ///
    /// Nothing is recorded or spawned unless every check passes.
    ///
    /// # Errors
    /// - [`QuestError::GiverBusy`] if the giver has a quest in progress.
    /// - [`QuestError::UnknownZone`] / [`QuestError::UnknownCharacter`] if a
    ///   world anchor cannot be resolved.
    /// - [`QuestError::QuantityTooLarge`] for oversized FETCH quantities.
    pub fn accept_token(
        &mut self,
        journal: &mut QuestJournal,
        token: &QuestToken,
        giver: &str,
        now: GameTimestamp,
    ) -> Result<ActiveQuest> {
        if let Some(active) = journal.find_by_giver(giver) {
            debug!(giver = %giver, active = %active.id, "Giver busy, token suppressed");
            return Err(QuestError::GiverBusy {
                giver: giver.to_string(),
                active: active.id,
            });
        }

        let goal = self.resolve_goal(token.goal.clone())?;
        let canonical = QuestToken {
            goal,
            directive: token.directive.clone(),
        };
        let quest = journal.add(&canonical, giver, now)?.clone();

        self.spawn_targets(&quest, quest.max_progress);
        if let QuestGoal::Delivery { item, .. } = &quest.goal {
            self.commands.push(WorldCommand::GrantItem {
                quest: quest.id,
                item: item.clone(),
                quantity: 1,
            });
        }

        info!(
            quest = %quest.id,
            giver = %giver,
            quest_type = %quest.quest_type(),
            zone = %quest.goal.zone(),
            "Quest accepted"
        );
        Ok(self.view(&quest))
    }

    /// Check a goal against the world and return it with its zone replaced
    /// by the canonical name.
    ///
    /// # Errors
    /// Same anchor and quantity errors as [`Self::accept_token`].
    pub fn resolve_goal(&self, mut goal: QuestGoal) -> Result<QuestGoal> {
        let zone = self
            .world
            .resolve_zone(goal.zone())
            .ok_or_else(|| QuestError::UnknownZone(goal.zone().to_string()))?
            .name
            .clone();

        if let Some(character) = goal.character() {
            if self.world.resolve_character(character).is_none() {
                return Err(QuestError::UnknownCharacter(character.to_string()));
            }
        }

        if let QuestGoal::Fetch { quantity, .. } = goal {
            if quantity > self.max_fetch_quantity {
                return Err(QuestError::QuantityTooLarge {
                    requested: quantity,
                    limit: self.max_fetch_quantity,
                });
            }
        }

        goal.set_zone(&zone);
        Ok(goal)
    }

    /// Re-create the props of a quest rebuilt from a snapshot. Only the
    /// remaining FETCH items are placed; nothing is granted.
    pub fn restore_quest(&mut self, quest: &JournalQuest) -> Vec<TargetId> {
        if !quest.is_active() {
            return Vec::new();
        }
        let remaining = quest.max_progress.saturating_sub(quest.current_progress);
        self.spawn_targets(quest, remaining)
    }

    /// Place up to `budget` props for `quest`.
    fn spawn_targets(&mut self, quest: &JournalQuest, budget: u32) -> Vec<TargetId> {
        let Some((kind, wanted)) = quest.goal.spawn_plan() else {
            return Vec::new();
        };
        let Some(bounds) = self.world.resolve_zone(quest.goal.zone()).map(|z| z.bounds) else {
            warn!(quest = %quest.id, zone = %quest.goal.zone(), "No bounds to place targets in");
            return Vec::new();
        };

        let count = wanted.min(budget);
        let mut ids = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let target = WorldTarget {
                id: TargetId::new(),
                quest: quest.id,
                kind: kind.clone(),
                zone: quest.goal.zone().to_string(),
                location: self.random_point(&bounds),
                state: TargetState::Placed,
            };
            ids.push(target.id);
            self.commands.push(WorldCommand::Spawn(target.clone()));
            self.arena.insert(target);
        }
        debug!(quest = %quest.id, count, "Spawned quest targets");
        ids
    }

    fn random_point(&mut self, bounds: &ZoneBounds) -> Location {
        Location::new(
            self.rng.gen_range(bounds.min.x..=bounds.max.x),
            self.rng.gen_range(bounds.min.y..=bounds.max.y),
            bounds.min.z,
        )
    }

    /// The player picked up a collectible. Returns the quest-tagged item to
    /// add to the inventory, or `None` if the target is not a placed
    /// collectible.
    pub fn collect(&mut self, target: TargetId) -> Option<Collected> {
        let TargetKind::Collectible { item } = &self.arena.get(target)?.kind else {
            return None;
        };
        let item = item.clone();
        let quest = self.arena.transition(target, TargetState::Collected)?.quest;
        self.commands.push(WorldCommand::Despawn { target, quest });
        debug!(quest = %quest, target = %target, item = %item, "Target collected");
        Some(Collected { quest, item })
    }

    /// The player used an interactable. Returns its quest and object name.
    pub fn interact(&mut self, target: TargetId) -> Option<(QuestId, String)> {
        let TargetKind::Interactable { object } = &self.arena.get(target)?.kind else {
            return None;
        };
        let object = object.clone();
        let quest = self.arena.transition(target, TargetState::Used)?.quest;
        self.commands.push(WorldCommand::Despawn { target, quest });
        debug!(quest = %quest, target = %target, object = %object, "Target used");
        Some((quest, object))
    }

    /// Drop every target of `quest`, despawning those still in the world.
    /// Returns how many were despawned.
    pub fn release(&mut self, quest: QuestId) -> usize {
        let removed = self.arena.remove_quest(quest);
        let despawned = self.despawn_all(removed);
        if despawned > 0 {
            debug!(quest = %quest, despawned, "Released quest targets");
        }
        despawned
    }

    /// Drop every target of every quest.
    pub fn reset(&mut self) -> usize {
        let targets = self.arena.clear();
        self.despawn_all(targets)
    }

    fn despawn_all(&mut self, targets: Vec<WorldTarget>) -> usize {
        let before = self.commands.len();
        self.commands.extend(
            targets
                .into_iter()
                .filter(|t| t.state == TargetState::Placed)
                .map(|t| WorldCommand::Despawn {
                    target: t.id,
                    quest: t.quest,
                }),
        );
        self.commands.len() - before
    }

    /// Take the queued world commands.
    pub fn drain_commands(&mut self) -> Vec<WorldCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Live view of a quest in `journal`.
    #[must_use]
    pub fn active_quest(&self, journal: &QuestJournal, id: QuestId) -> Option<ActiveQuest> {
        journal.get(id).map(|q| self.view(q))
    }

    fn view(&self, quest: &JournalQuest) -> ActiveQuest {
        ActiveQuest {
            id: quest.id,
            quest_type: quest.quest_type(),
            giver: quest.giver.clone(),
            description: quest.description.clone(),
            current_progress: quest.current_progress,
            max_progress: quest.max_progress,
            targets: self.arena.for_quest(quest.id).iter().map(|t| t.id).collect(),
            completed: !quest.is_active(),
        }
    }
}
