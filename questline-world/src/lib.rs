//! # questline-world: game integration for questline
//!
//! This crate sits between a host game and the game-agnostic
//! `questline-core` services.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │                Host game                 │
//! │   events ──▶ ┌──────────────────┐ ──▶ world commands
//! │              │   QuestSession   │        │
//! │   text   ──▶ │  (systems.rs)    │ ──▶ dialogue lines
//! │              └────────┬─────────┘        │
//! │                       ▼                  │
//! │      ┌─────────────────────────────┐     │
//! │      │ questline-core │ questline-llm │  │
//! │      └─────────────────────────────┘     │
//! └──────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `events`: host events that move quests forward
//! - `hooks`: event constructors and world-command routing
//! - `systems`: the tick-driven [`QuestSession`]
//! - `dialogue`: rule-based quest lines
//! - `logging`: tracing subscriber setup

pub mod dialogue;
pub mod events;
pub mod hooks;
pub mod logging;
pub mod systems;

pub use events::GameEvent;
pub use systems::{DialogueResult, QuestSession, TickReport};
