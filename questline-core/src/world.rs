//! World anchors and the arena of quest-owned world targets.
//!
//! [`WorldMap`] answers "does this zone / character exist and where is it".
//! [`TargetArena`] owns every prop spawned on behalf of a quest, indexed by
//! quest id, until the quest releases it. The host's world-object layer never
//! sees the arena directly; it receives [`WorldCommand`]s instead.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::WorldConfig;
use crate::goal::TargetKind;
use crate::types::{name_key, Location, QuestId, TargetId, ZoneBounds};

// ---------------------------------------------------------------------------
// Anchors
// ---------------------------------------------------------------------------

/// A named world region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    /// Canonical name.
    pub name: String,
    /// Spatial extent.
    pub bounds: ZoneBounds,
}

/// A character quests can refer to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterAnchor {
    /// Name as registered by the host.
    pub name: String,
    /// Canonical name of the zone the character lives in.
    pub zone: String,
}

/// Zones and characters known to the quest engine.
#[derive(Debug, Clone, Default)]
pub struct WorldMap {
    zones: Vec<Zone>,
    /// Canonical names and aliases → index into `zones`.
    zone_index: HashMap<String, usize>,
    characters: HashMap<String, CharacterAnchor>,
}

impl WorldMap {
    /// Build the map from configuration. Characters naming an unknown zone
    /// are skipped with a warning.
    #[must_use]
    pub fn from_config(config: &WorldConfig) -> Self {
        let mut map = Self::default();
        for zone in &config.zones {
            map.add_zone(&zone.name, zone.bounds, &zone.aliases);
        }
        for character in &config.characters {
            if !map.register_character(&character.name, &character.zone) {
                tracing::warn!(
                    character = %character.name,
                    zone = %character.zone,
                    "Configured character references an unknown zone"
                );
            }
        }
        map
    }

    /// Add (or replace) a zone and its aliases. Corners are normalised, so
    /// bounds written by hand with `min` above `max` still describe the zone.
    pub fn add_zone(&mut self, name: &str, bounds: ZoneBounds, aliases: &[String]) {
        let bounds = ZoneBounds::new(bounds.min, bounds.max);
        let idx = if let Some(&idx) = self.zone_index.get(&name_key(name)) {
            self.zones[idx].bounds = bounds;
            idx
        } else {
            self.zones.push(Zone {
                name: name.trim().to_string(),
                bounds,
            });
            self.zones.len() - 1
        };
        self.zone_index.insert(name_key(name), idx);
        for alias in aliases {
            self.zone_index.insert(name_key(alias), idx);
        }
    }

    /// Look a zone up by canonical name or alias, ignoring case.
    #[must_use]
    pub fn resolve_zone(&self, name: &str) -> Option<&Zone> {
        self.zone_index.get(&name_key(name)).map(|&i| &self.zones[i])
    }

    /// First zone whose bounds contain `location`.
    #[must_use]
    pub fn zone_at(&self, location: &Location) -> Option<&Zone> {
        self.zones.iter().find(|z| z.bounds.contains(location))
    }

    /// All zones, in registration order.
    pub fn zones(&self) -> impl Iterator<Item = &Zone> {
        self.zones.iter()
    }

    /// Register a character living in `zone`. Returns `false` (and registers
    /// nothing) when the zone is unknown.
    pub fn register_character(&mut self, name: &str, zone: &str) -> bool {
        let Some(zone) = self.resolve_zone(zone) else {
            return false;
        };
        let anchor = CharacterAnchor {
            name: name.trim().to_string(),
            zone: zone.name.clone(),
        };
        self.characters.insert(name_key(name), anchor);
        true
    }

    /// Look a character up by name, ignoring case.
    #[must_use]
    pub fn resolve_character(&self, name: &str) -> Option<&CharacterAnchor> {
        self.characters.get(&name_key(name))
    }
}

// ---------------------------------------------------------------------------
// Targets
// ---------------------------------------------------------------------------

/// Lifecycle of a spawned target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetState {
    /// In the world, waiting for the player.
    Placed,
    /// Picked up by the player.
    Collected,
    /// Used by the player.
    Used,
}

/// A prop placed in the world on behalf of a quest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldTarget {
    /// Target identity.
    pub id: TargetId,
    /// Quest that owns the target.
    pub quest: QuestId,
    /// What the prop is.
    pub kind: TargetKind,
    /// Canonical zone the prop sits in.
    pub zone: String,
    /// Exact placement.
    pub location: Location,
    /// Current state.
    pub state: TargetState,
}

/// Requests for the host's world-object and inventory layers.
#[derive(Debug, Clone, PartialEq)]
pub enum WorldCommand {
    /// Place a prop.
    Spawn(WorldTarget),
    /// Remove a prop.
    Despawn {
        /// Prop to remove.
        target: TargetId,
        /// Quest that owned it.
        quest: QuestId,
    },
    /// Hand the player a quest-tagged item (the parcel of a DELIVERY quest).
    GrantItem {
        /// Quest the item is tagged for.
        quest: QuestId,
        /// Item name.
        item: String,
        /// How many.
        quantity: u32,
    },
}

/// Arena of quest-owned targets.
#[derive(Debug, Clone, Default)]
pub struct TargetArena {
    targets: HashMap<TargetId, WorldTarget>,
    by_quest: HashMap<QuestId, Vec<TargetId>>,
}

impl TargetArena {
    /// Create an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of a target.
    pub fn insert(&mut self, target: WorldTarget) {
        self.by_quest.entry(target.quest).or_default().push(target.id);
        self.targets.insert(target.id, target);
    }

    /// Look a target up.
    #[must_use]
    pub fn get(&self, id: TargetId) -> Option<&WorldTarget> {
        self.targets.get(&id)
    }

    /// Targets owned by `quest`, in spawn order.
    #[must_use]
    pub fn for_quest(&self, quest: QuestId) -> Vec<&WorldTarget> {
        self.by_quest
            .get(&quest)
            .map(|ids| ids.iter().filter_map(|id| self.targets.get(id)).collect())
            .unwrap_or_default()
    }

    /// Number of targets of `quest` still waiting in the world.
    #[must_use]
    pub fn placed_count(&self, quest: QuestId) -> usize {
        self.for_quest(quest)
            .iter()
            .filter(|t| t.state == TargetState::Placed)
            .count()
    }

    /// Move a placed target to `state`. Returns the updated target, or `None`
    /// if it is unknown or no longer placed.
    pub fn transition(&mut self, id: TargetId, state: TargetState) -> Option<&WorldTarget> {
        let target = self.targets.get_mut(&id)?;
        if target.state != TargetState::Placed {
            return None;
        }
        target.state = state;
        Some(target)
    }

    /// Drop every target owned by `quest` and return them.
    pub fn remove_quest(&mut self, quest: QuestId) -> Vec<WorldTarget> {
        self.by_quest
            .remove(&quest)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|id| self.targets.remove(&id))
            .collect()
    }

    /// Drop everything.
    pub fn clear(&mut self) -> Vec<WorldTarget> {
        self.by_quest.clear();
        self.targets.drain().map(|(_, t)| t).collect()
    }

    /// Total targets owned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Whether the arena is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}
