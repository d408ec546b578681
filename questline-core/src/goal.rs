//! Quest types and the `QuestGoal` sum type.
//!
//! Every quest-type-specific decision in the crate (how much progress a quest
//! needs, whether items change hands at turn-in, what gets spawned, how the
//! quest is described) is answered here, once, by matching on [`QuestGoal`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of quest kinds a directive can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestType {
    /// Collect a number of items found in a zone.
    Fetch,
    /// Carry an item to a recipient.
    Delivery,
    /// Visit a zone.
    Explore,
    /// Speak to a character.
    Talk,
    /// Use an object placed in a zone.
    Interact,
    /// Accompany a character. Reserved: no directive layout exists for it.
    Escort,
}

impl QuestType {
    /// Names of the directive fields that follow the type name, or `None`
    /// for types without a directive layout.
    #[must_use]
    pub fn field_layout(self) -> Option<&'static [&'static str]> {
        match self {
            Self::Fetch => Some(&["item", "zone", "quantity"]),
            Self::Delivery => Some(&["item", "recipient", "zone"]),
            Self::Explore => Some(&["zone"]),
            Self::Talk => Some(&["character", "zone"]),
            Self::Interact => Some(&["object", "zone"]),
            Self::Escort => None,
        }
    }

    /// The literal name used inside directives.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fetch => "FETCH",
            Self::Delivery => "DELIVERY",
            Self::Explore => "EXPLORE",
            Self::Talk => "TALK",
            Self::Interact => "INTERACT",
            Self::Escort => "ESCORT",
        }
    }
}

impl fmt::Display for QuestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FETCH" => Ok(Self::Fetch),
            "DELIVERY" => Ok(Self::Delivery),
            "EXPLORE" => Ok(Self::Explore),
            "TALK" => Ok(Self::Talk),
            "INTERACT" => Ok(Self::Interact),
            "ESCORT" => Ok(Self::Escort),
            _ => Err(format!("unknown quest type: '{s}'")),
        }
    }
}

/// What a quest asks of the player, with the parameters of its kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestGoal {
    /// Collect `quantity` of `item` found in `zone`.
    Fetch {
        /// Item to collect.
        item: String,
        /// Zone the items are placed in.
        zone: String,
        /// How many to collect.
        quantity: u32,
    },
    /// Carry `item` to `recipient` located in `zone`.
    Delivery {
        /// Item to carry.
        item: String,
        /// Character receiving the item.
        recipient: String,
        /// Zone the recipient is found in.
        zone: String,
    },
    /// Visit `zone`.
    Explore {
        /// Zone to visit.
        zone: String,
    },
    /// Speak to `character` in `zone`.
    Talk {
        /// Character to speak to.
        character: String,
        /// Zone the character is found in.
        zone: String,
    },
    /// Interact with `object` in `zone`.
    Interact {
        /// Object to use.
        object: String,
        /// Zone the object is placed in.
        zone: String,
    },
}

/// What kind of prop a goal asks the world to spawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetKind {
    /// A pickup that becomes a quest-tagged inventory item.
    Collectible {
        /// Item granted on pickup.
        item: String,
    },
    /// A fixed object the player can use.
    Interactable {
        /// Object name.
        object: String,
    },
}

impl QuestGoal {
    /// The quest type this goal belongs to.
    #[must_use]
    pub fn quest_type(&self) -> QuestType {
        match self {
            Self::Fetch { .. } => QuestType::Fetch,
            Self::Delivery { .. } => QuestType::Delivery,
            Self::Explore { .. } => QuestType::Explore,
            Self::Talk { .. } => QuestType::Talk,
            Self::Interact { .. } => QuestType::Interact,
        }
    }

    /// The zone the goal is anchored to.
    #[must_use]
    pub fn zone(&self) -> &str {
        match self {
            Self::Fetch { zone, .. }
            | Self::Delivery { zone, .. }
            | Self::Explore { zone }
            | Self::Talk { zone, .. }
            | Self::Interact { zone, .. } => zone,
        }
    }

    /// Replace the zone with its canonical name.
    pub fn set_zone(&mut self, canonical: &str) {
        match self {
            Self::Fetch { zone, .. }
            | Self::Delivery { zone, .. }
            | Self::Explore { zone }
            | Self::Talk { zone, .. }
            | Self::Interact { zone, .. } => *zone = canonical.to_string(),
        }
    }

    /// Progress value at which the goal is met.
    #[must_use]
    pub fn max_progress(&self) -> u32 {
        match self {
            Self::Fetch { quantity, .. } => *quantity,
            _ => 1,
        }
    }

    /// Whether the turn-in takes items from the player.
    #[must_use]
    pub fn requires_hand_in(&self) -> bool {
        matches!(self, Self::Fetch { .. } | Self::Delivery { .. })
    }

    /// Item and quantity removed from the inventory at turn-in.
    #[must_use]
    pub fn hand_in_items(&self) -> Option<(&str, u32)> {
        match self {
            Self::Fetch { item, quantity, .. } => Some((item, *quantity)),
            Self::Delivery { item, .. } => Some((item, 1)),
            _ => None,
        }
    }

    /// Props to spawn for the goal and how many.
    #[must_use]
    pub fn spawn_plan(&self) -> Option<(TargetKind, u32)> {
        match self {
            Self::Fetch { item, quantity, .. } => Some((
                TargetKind::Collectible { item: item.clone() },
                *quantity,
            )),
            Self::Interact { object, .. } => Some((
                TargetKind::Interactable {
                    object: object.clone(),
                },
                1,
            )),
            _ => None,
        }
    }

    /// Character named by the goal, if any.
    #[must_use]
    pub fn character(&self) -> Option<&str> {
        match self {
            Self::Delivery { recipient, .. } => Some(recipient),
            Self::Talk { character, .. } => Some(character),
            _ => None,
        }
    }

    /// Character the quest is turned in to. DELIVERY quests end at the
    /// recipient; every other kind returns to the giver.
    #[must_use]
    pub fn turn_in_character<'a>(&'a self, giver: &'a str) -> &'a str {
        match self {
            Self::Delivery { recipient, .. } => recipient,
            _ => giver,
        }
    }

    /// Human-readable description.
    ///
    /// The wording is a fixed sentence template per type; the persistence
    /// fallback path scans it back by token position, so changes here must
    /// be mirrored in `persistence::derive_hints`.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Fetch {
                item,
                zone,
                quantity,
            } => format!("Find {quantity} {item} in {zone}"),
            Self::Delivery {
                item,
                recipient,
                zone,
            } => format!("Deliver {item} to {recipient} in {zone}"),
            Self::Explore { zone } => format!("Explore {zone}"),
            Self::Talk { character, zone } => format!("Talk to {character} in {zone}"),
            Self::Interact { object, zone } => format!("Interact with {object} in {zone}"),
        }
    }

    /// Short journal title.
    #[must_use]
    pub fn title(&self) -> String {
        match self {
            Self::Fetch { item, .. } => format!("Collect {item}"),
            Self::Delivery { item, .. } => format!("Deliver {item}"),
            Self::Explore { zone } => format!("Explore {zone}"),
            Self::Talk { character, .. } => format!("Speak with {character}"),
            Self::Interact { object, .. } => format!("Investigate {object}"),
        }
    }

    /// Closing line spoken by the turn-in character.
    #[must_use]
    pub fn completion_line(&self, speaker: &str) -> String {
        match self {
            Self::Fetch { item, quantity, .. } => {
                format!("{speaker}: All {quantity} {item}, exactly what I needed. Thank you!")
            }
            Self::Delivery { item, .. } => {
                format!("{speaker}: So this is the {item}. I'll take it from here.")
            }
            Self::Explore { zone } => {
                format!("{speaker}: You made it through {zone}? Tell me everything.")
            }
            Self::Talk { character, .. } => {
                format!("{speaker}: Good, you spoke with {character}. That settles it.")
            }
            Self::Interact { object, .. } => {
                format!("{speaker}: The {object} is taken care of. Well done.")
            }
        }
    }
}
