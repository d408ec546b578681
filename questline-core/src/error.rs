//! Error types for the questline core library.

use thiserror::Error;

use crate::types::QuestId;

/// Top-level error type for all quest lifecycle operations.
///
/// None of these are fatal: every failure path leaves the journal, the
/// target arena and the inventory exactly as they were before the call.
#[derive(Error, Debug)]
pub enum QuestError {
    /// The giver already has a quest in progress.
    #[error("Giver '{giver}' already has an active quest: {active}")]
    GiverBusy {
        /// Name of the giver.
        giver: String,
        /// The quest currently in progress for that giver.
        active: QuestId,
    },

    /// A zone named by a directive is not part of the world.
    #[error("Unknown zone: '{0}'")]
    UnknownZone(String),

    /// A character named by a directive is not part of the world.
    #[error("Unknown character: '{0}'")]
    UnknownCharacter(String),

    /// A FETCH quantity exceeds the configured maximum.
    #[error("Quantity {requested} exceeds the limit of {limit}")]
    QuantityTooLarge {
        /// Quantity named in the directive.
        requested: u32,
        /// Configured ceiling.
        limit: u32,
    },

    /// A quest with the given ID was not found.
    #[error("Quest not found: {0}")]
    QuestNotFound(QuestId),

    /// A quest with the given ID already exists in the journal.
    #[error("Duplicate quest id: {0}")]
    DuplicateQuest(QuestId),

    /// The quest cannot be handed in yet.
    #[error("Quest {0} is not completable")]
    NotCompletable(QuestId),

    /// There is nothing to hand in at this character right now.
    #[error("No hand-in available at '{0}'")]
    NoHandIn(String),

    /// Removing the required items from the inventory failed.
    #[error("Hand-in of quest {quest} failed: {source}")]
    HandInFailed {
        /// The quest being handed in.
        quest: QuestId,
        /// Why the inventory refused the debit.
        #[source]
        source: crate::inventory::InventoryError,
    },

    /// The quest is already completed and cannot take the requested change.
    #[error("Quest {0} is already completed")]
    AlreadyCompleted(QuestId),

    /// A persisted record could not be turned back into a quest.
    #[error("Cannot reconstruct quest {id}: {reason}")]
    Reconstruction {
        /// Quest id stored in the record.
        id: QuestId,
        /// What was missing or malformed.
        reason: String,
    },

    /// Serialization or deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, QuestError>;
