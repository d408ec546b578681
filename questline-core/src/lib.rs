//! # Questline Core Library
//!
//! Game-agnostic quest lifecycle engine for worlds whose characters speak
//! through a generative text service.
//!
//! Generated dialogue may carry quest directives such as
//! `[QUEST:FETCH:crystal:laboratory:3]`. This crate takes it from there:
//!
//! - **Parse** directives out of text and strip them from what the player sees
//!   ([`directive`])
//! - **Spawn** accepted quests into the world, with props where the goal needs
//!   them ([`spawner`], [`world`])
//! - **Record** every quest in a single ledger ([`journal`])
//! - **Evaluate** per-type completion rules ([`evaluator`], [`goal`])
//! - **Hand in** through per-character coordinators ([`coordinator`])
//! - **Persist** the ledger across sessions ([`persistence`])
//!
//! ## Threading
//!
//! Everything here is single-threaded and tick-driven: services are plain
//! values passed by reference, and no call blocks.

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod context;
pub mod coordinator;
pub mod directive;
pub mod error;
pub mod evaluator;
pub mod goal;
pub mod inventory;
pub mod journal;
pub mod metrics;
pub mod persistence;
pub mod spawner;
pub mod types;
pub mod world;

pub use config::QuestConfig;
pub use coordinator::{QuestSignal, TurnInCoordinator, TurnInOutcome, TurnInState};
pub use directive::{parse_directives, strip_directives, ParsedText, QuestToken};
pub use error::{QuestError, Result};
pub use evaluator::CompletionEvaluator;
pub use goal::{QuestGoal, QuestType};
pub use inventory::{Inventory, QuestInventory};
pub use journal::{JournalQuest, QuestJournal, QuestStatus};
pub use spawner::{ActiveQuest, QuestSpawner};
pub use types::*;
