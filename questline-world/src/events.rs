//! Host game events the quest engine reacts to.

use questline_core::types::{Location, TargetId};
use serde::{Deserialize, Serialize};

/// Something happened in the host game that may move a quest forward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    /// The player's position changed.
    PlayerMoved {
        /// New position.
        location: Location,
    },

    /// The player picked up a quest collectible.
    TargetCollected {
        /// The collectible.
        target: TargetId,
    },

    /// The player used a quest interactable.
    TargetUsed {
        /// The interactable.
        target: TargetId,
    },

    /// The player opened a conversation.
    DialogueOpened {
        /// Character spoken to.
        character: String,
    },
}

impl GameEvent {
    /// Short name for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PlayerMoved { .. } => "player_moved",
            Self::TargetCollected { .. } => "target_collected",
            Self::TargetUsed { .. } => "target_used",
            Self::DialogueOpened { .. } => "dialogue_opened",
        }
    }
}
